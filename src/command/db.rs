use crate::conf::Conf;
use crate::{db, Error, Result};
use std::fs::remove_file;
use tracing::info;

pub fn run(args: &[String], conf: Conf) -> Result<()> {
    let first_arg = match args.first() {
        Some(some) => some,
        None => Err(Error::Cli("No DB actions passed".into()))?,
    };

    match first_arg.as_str() {
        "migrate" => db::migration::run(&mut db::open_conn(&conf)?)?,
        "drop" => drop(conf)?,
        _ => Err(Error::Cli(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn drop(conf: Conf) -> Result<()> {
    let path = conf.data_dir_file_path(db::DB_FILE_NAME)?;
    if path.exists() {
        remove_file(&path)?;
        info!(path = %path.display(), "Database file removed");
    }
    Ok(())
}
