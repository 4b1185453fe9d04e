use crate::{
    api::v1::{articles, catchers, comments, health, profiles, tags, users},
    auth::{Keys, MemoryRevocationStore, RevocationStore, SystemClock, Tokens},
    config::{Config, RevocationBackend},
    db::{self, token_issuances::PgRevocationStore, DbConn},
    Result,
};
use rocket::{Build, Rocket};
use std::sync::Arc;

/// Loads the signing keys and picks the revocation backend. Any failure
/// here is fatal to startup.
pub fn setup_tokens(config: &Config) -> Result<Tokens> {
    let keys = Keys::from_pem_files(&config.private_key_path, &config.public_key_path)?;
    let store: Arc<dyn RevocationStore> = match config.revocation {
        RevocationBackend::Memory => Arc::new(MemoryRevocationStore::new()),
        RevocationBackend::Postgres => {
            let pool = db::init_pool(&config.database_url, config.pool_size)?;
            Arc::new(PgRevocationStore::new(pool))
        }
    };
    log::info!("Using {:?} revocation store", config.revocation);
    Ok(Tokens::new(
        keys,
        &config.jwt_audience,
        &config.jwt_issuer,
        store,
        Arc::new(SystemClock),
    ))
}

pub fn setup_rocket(config: &Config, tokens: Tokens) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("databases.conduit.url", config.database_url.as_str()))
        .merge(("databases.conduit.pool_size", config.pool_size));

    rocket::custom(figment)
        .attach(DbConn::fairing())
        .manage(tokens)
        .mount(
            "/api",
            routes![
                health::check,
                users::register,
                users::login,
                users::current,
                users::update,
                profiles::get,
                profiles::follow,
                profiles::unfollow,
                articles::list,
                articles::feed,
                articles::get,
                articles::create,
                articles::update,
                articles::delete,
                articles::favorite,
                articles::unfavorite,
                comments::list,
                comments::add,
                comments::delete,
                tags::list,
            ],
        )
        .register("/", catchers())
}
