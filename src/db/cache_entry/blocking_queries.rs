use super::schema::{self, Columns};
use crate::Result;
use rusqlite::{named_params, Connection, OptionalExtension};

pub fn select_value(key: &str, conn: &Connection) -> Result<Option<String>> {
    let sql = format!(
        r#"
            SELECT {value}
            FROM {table}
            WHERE {key} = :key
        "#,
        value = Columns::Value.as_str(),
        table = schema::TABLE_NAME,
        key = Columns::Key.as_str(),
    );
    conn.prepare(&sql)?
        .query_row(named_params! { ":key": key }, |row| row.get(0))
        .optional()
        .map_err(Into::into)
}

/// Reads every key from the same snapshot, values come back in key order.
pub fn select_values(keys: &[String], conn: &mut Connection) -> Result<Vec<Option<String>>> {
    let tx = conn.transaction()?;
    let values = keys
        .iter()
        .map(|key| select_value(key, &tx))
        .collect::<Result<Vec<_>>>()?;
    tx.commit()?;
    Ok(values)
}

/// Upserts all entries in one transaction, readers never see half of them.
pub fn upsert_all(entries: &[(String, String)], conn: &mut Connection) -> Result<()> {
    let sql = format!(
        r#"
            INSERT INTO {table} ({key}, {value})
            VALUES (:key, :value)
            ON CONFLICT ({key}) DO UPDATE SET
                {value} = excluded.{value},
                {updated_at} = strftime('%Y-%m-%dT%H:%M:%fZ')
        "#,
        table = schema::TABLE_NAME,
        key = Columns::Key.as_str(),
        value = Columns::Value.as_str(),
        updated_at = Columns::UpdatedAt.as_str(),
    );
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for (key, value) in entries {
            stmt.execute(named_params! { ":key": key, ":value": value })?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn delete_all(keys: &[String], conn: &mut Connection) -> Result<()> {
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {key} = :key
        "#,
        table = schema::TABLE_NAME,
        key = Columns::Key.as_str(),
    );
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for key in keys {
            stmt.execute(named_params! { ":key": key })?;
        }
    }
    tx.commit()?;
    Ok(())
}
