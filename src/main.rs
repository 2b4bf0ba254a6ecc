use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use account_service::auth::{AuthService, BcryptHasher, TokenService};
use account_service::blob_store::CloudinaryClient;
use account_service::configuration::get_configuration;
use account_service::credential_store::PgCredentialStore;
use account_service::startup::run;
use account_service::telemetry::init_telemetry;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(startup_error(std::io::ErrorKind::InvalidInput, "Configuration error"));
        }
    };
    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(startup_error(std::io::ErrorKind::InvalidInput, "Configuration error"));
    }
    tracing::info!("Configuration loaded successfully");

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    let store = PgCredentialStore::new(pool);
    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to migrate database: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    let blobs = CloudinaryClient::new(&configuration.blob_store).map_err(|e| {
        tracing::error!("Failed to build blob store client: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Blob store configuration error")
    })?;

    let auth_service = AuthService::new(
        Arc::new(store),
        Arc::new(blobs),
        Arc::new(BcryptHasher::new(configuration.password.bcrypt_cost)),
        TokenService::new(&configuration.jwt),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, auth_service, configuration.application.max_upload_bytes)?.await
}
