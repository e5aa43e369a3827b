use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use nanodrop::{config::Config, configure_app, cors, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::new()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nanodrop=info,actix_web=info")),
        )
        .init();

    let state = web::Data::new(AppState::from_config(&config).await);

    tracing::info!(
        address = %config.app_url,
        bucket = %config.aws_s3_bucket_name,
        table = %config.aws_dynamodb_table_name,
        "server starting"
    );

    let allowed_origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .wrap(Logger::default())
            .configure(configure_app(state.clone()))
    })
    .bind(config.app_url.as_str())?
    .workers(config.workers)
    .run()
    .await
}
