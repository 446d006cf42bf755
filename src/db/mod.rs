pub mod cache_entry;
pub mod migration;

use crate::conf::Conf;
use crate::Result;
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;

pub const DB_FILE_NAME: &str = "cache.db";

pub fn open_conn(conf: &Conf) -> Result<Connection> {
    let conn = Connection::open(conf.data_dir_file_path(DB_FILE_NAME)?)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

/// Migrates the database file and wraps it into an async pool. WAL mode is
/// persistent so pooled connections inherit it.
pub fn pool(conf: &Conf) -> Result<Pool> {
    let mut conn = open_conn(conf)?;
    migration::run(&mut conn)?;
    drop(conn);
    let pool = Config::new(conf.data_dir_file_path(DB_FILE_NAME)?)
        .builder(Runtime::Tokio1)?
        .build()?;
    Ok(pool)
}
