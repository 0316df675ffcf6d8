use crate::dlog;
use crate::storage::BlobStore;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const TABLE: &str = "kv_store";

/// Key-value table in a SQLite file; one row per key, the blob in `value`.
pub struct SqliteStore {
    conn: Connection,
    key: String,
}

impl SqliteStore {
    pub fn open(db_path: &Path, key: &str) -> Result<Self> {
        let display = db_path.display();
        let conn =
            Connection::open(db_path).with_context(|| format!("Opening SQLite DB: {display}"))?;
        Self::with_connection(conn, key)
    }

    pub fn in_memory(key: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite DB")?;
        Self::with_connection(conn, key)
    }

    fn with_connection(conn: Connection, key: &str) -> Result<Self> {
        if !table_exists(&conn, TABLE)? {
            dlog!("creating table {TABLE}");
            conn.execute_batch(
                r"
                CREATE TABLE kv_store (
                    key   TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL
                )
                ",
            )
            .context("Creating kv_store table")?;
        }

        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }
}

impl BlobStore for SqliteStore {
    fn load(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Reading key {:?}", self.key))
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        self.conn
            .execute(
                r"
                INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
                params![self.key, blob],
            )
            .with_context(|| format!("Writing key {:?}", self.key))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [&self.key])
            .with_context(|| format!("Removing key {:?}", self.key))?;
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_blob() {
        let mut store = SqliteStore::in_memory("workouts").unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.save("[1]").unwrap();
        store.save("[2]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("[2]"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn keys_are_independent_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("trailmark.db");

        let mut a = SqliteStore::open(&db, "workouts").unwrap();
        a.save("[]").unwrap();
        drop(a);

        let mut b = SqliteStore::open(&db, "other").unwrap();
        assert_eq!(b.load().unwrap(), None);
        b.save("null").unwrap();
        drop(b);

        let a = SqliteStore::open(&db, "workouts").unwrap();
        assert_eq!(a.load().unwrap().as_deref(), Some("[]"));
    }
}
