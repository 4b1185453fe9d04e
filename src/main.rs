use conduit::{
    config::Config,
    logger,
    setup_rocket::{setup_rocket, setup_tokens},
    Error,
};

#[rocket::main]
async fn main() -> conduit::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logger::setup_logging(config.log_level)?;

    let tokens = setup_tokens(&config)?;
    if let Err(e) = setup_rocket(&config, tokens).launch().await {
        log::error!("Rocket failed: {}", e);
        return Err(Error::Launch(e.to_string()));
    }
    Ok(())
}
