use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension};

use crate::config::AppConfig;
use crate::storage::KeyValueStore;

/// SQLite-backed key-value store living in the data directory.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to configure SQLite WAL mode")?;

        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                 );",
            )
            .context("Failed to apply database migrations")?;
        Ok(())
    }
}

const UPSERT_SQL: &str = "INSERT INTO kv (key, value, updated_at) VALUES (:key, :value, :updated_at)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE key = :key",
                named_params![":key": key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                UPSERT_SQL,
                named_params![":key": key, ":value": value, ":updated_at": now],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin write transaction")?;
        for (key, value) in entries {
            tx.execute(
                UPSERT_SQL,
                named_params![":key": key, ":value": value, ":updated_at": &now],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        }
        tx.commit().context("Failed to commit write transaction")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ACTIVE_LIST_KEY, LISTS_KEY, TASKS_KEY};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_config() -> (AppConfig, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let data_dir = dir.path().to_path_buf();
        std::fs::create_dir_all(&data_dir).expect("create data dir");
        let config = AppConfig::from_data_dir(data_dir).expect("config");
        (config, dir)
    }

    #[test]
    fn missing_key_reads_as_none() {
        let db = Database::open_in_memory().expect("open db");
        assert_eq!(db.get(LISTS_KEY).expect("read"), None);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut db = Database::open_in_memory().expect("open db");
        db.set(ACTIVE_LIST_KEY, "default").expect("first write");
        db.set(ACTIVE_LIST_KEY, "work").expect("second write");
        assert_eq!(db.get(ACTIVE_LIST_KEY).expect("read").as_deref(), Some("work"));
        assert_eq!(db.keys().expect("keys"), vec![ACTIVE_LIST_KEY.to_string()]);
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let (config, _dir) = temp_config();
        {
            let mut db = Database::initialize(&config).expect("initialize db");
            db.set_many(&[(LISTS_KEY, "[]"), (TASKS_KEY, "[]"), (ACTIVE_LIST_KEY, "work")])
                .expect("write batch");
        }

        let db = Database::initialize(&config).expect("reopen db");
        assert_eq!(
            db.keys().expect("keys"),
            vec![
                ACTIVE_LIST_KEY.to_string(),
                LISTS_KEY.to_string(),
                TASKS_KEY.to_string()
            ]
        );
        assert_eq!(db.get(ACTIVE_LIST_KEY).expect("read").as_deref(), Some("work"));
    }
}
