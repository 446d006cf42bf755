use greenspace_geofence::command;
use greenspace_geofence::conf::Conf;
use greenspace_geofence::{Error, Result};
use std::env;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    init_logging();

    let conf = Conf::from_env()?;

    let args: Vec<String> = env::args().collect();

    let command = match args.get(1) {
        Some(some) => some,
        None => Err(Error::Cli("No actions passed".into()))?,
    };

    match command.as_str() {
        "server" => command::server::run(conf).await?,
        "fetch-zones" => command::zones::fetch(conf).await?,
        "check" => command::zones::check(&args[2..], conf).await?,
        "clear-cache" => command::zones::clear_cache(conf).await?,
        "db" => command::db::run(&args[2..], conf)?,
        first_arg => Err(Error::Cli(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg!(debug_assertions) {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    }
}
