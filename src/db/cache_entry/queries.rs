use super::blocking_queries;
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn select_value(key: impl Into<String>, pool: &Pool) -> Result<Option<String>> {
    let key = key.into();
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_value(&key, conn))
        .await?
}

pub async fn select_values(keys: Vec<String>, pool: &Pool) -> Result<Vec<Option<String>>> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_values(&keys, conn))
        .await?
}

pub async fn upsert_all(entries: Vec<(String, String)>, pool: &Pool) -> Result<()> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::upsert_all(&entries, conn))
        .await?
}

pub async fn delete_all(keys: Vec<String>, pool: &Pool) -> Result<()> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::delete_all(&keys, conn))
        .await?
}
