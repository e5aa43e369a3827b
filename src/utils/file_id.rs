use ulid::Ulid;

const MAX_SANITIZED_LEN: usize = 200;

/// Builds a new object key for `file_name`.
///
/// The ULID prefix carries the creation time in milliseconds plus 80 random
/// bits, so two uploads of the same name never collide.
pub fn generate_file_id(file_name: &str) -> String {
    format!("{}-{}", Ulid::new(), sanitize_file_name(file_name))
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .take(MAX_SANITIZED_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_file_name("a.txt"), "a.txt");
        assert_eq!(sanitize_file_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_file_name("résumé.doc"), "r_sum_.doc");
    }

    #[test]
    fn truncates_long_names() {
        let name = "x".repeat(500);
        assert_eq!(sanitize_file_name(&name).len(), MAX_SANITIZED_LEN);
    }

    #[test]
    fn ids_are_unique_for_identical_names() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_file_id("a.txt")).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.ends_with("-a.txt")));
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..200)
                        .map(|_| generate_file_id("same.bin"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1600);
    }
}
