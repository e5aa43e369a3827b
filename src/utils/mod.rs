pub mod disposition;
pub mod file_id;
