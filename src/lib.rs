pub mod auth;
pub mod blob_store;
pub mod configuration;
pub mod cookies;
pub mod credential_store;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod upload;
pub mod user;
pub mod validators;
