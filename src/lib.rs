#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logger;
pub mod query;
pub mod schema;
pub mod setup_rocket;
pub mod slug;
pub mod timestamp;

/// Startup failures. Request-time errors go through `api::v1::ApiError`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Keys(#[from] auth::KeyError),
    #[error("could not build database pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("could not initialize logging: {0}")]
    Logging(#[from] fern::InitError),
    #[error("rocket failed: {0}")]
    Launch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
