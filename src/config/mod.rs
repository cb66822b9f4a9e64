//! Key-value configuration storage backed by SQLite.
//!
//! Shares a database with [`AuthStorage`](crate::auth::AuthStorage), pass
//! the same path to both. Holds the user's last model, mode and creativity
//! so the next session starts where this one left off.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

pub const MODEL_KEY: &str = "model";
pub const MODE_KEY: &str = "mode";
pub const CREATIVITY_KEY: &str = "creativity";

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("config database lock poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Get and parse a value. Unparseable values are logged and ignored.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match raw.parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, value = %raw, "ignoring stored config value: {e}");
                Ok(None)
            }
        }
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Create the database's parent directory if it is a real file path.
pub fn ensure_db_dir(path: &str) -> Result<()> {
    if path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{Creativity, Mode};

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let config = mem_config();
        config.set(MODEL_KEY, "gemini-2.5-flash-image").unwrap();
        assert_eq!(
            config.get(MODEL_KEY).unwrap().unwrap(),
            "gemini-2.5-flash-image"
        );
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(MODE_KEY, "character").unwrap();
        config.set(MODE_KEY, "style").unwrap();
        assert_eq!(config.get(MODE_KEY).unwrap().unwrap(), "style");
    }

    #[test]
    fn remove_deletes_key() {
        let config = mem_config();
        config.set(MODEL_KEY, "test").unwrap();
        config.remove(MODEL_KEY).unwrap();
        assert!(config.get(MODEL_KEY).unwrap().is_none());
    }

    #[test]
    fn parsed_values() {
        let config = mem_config();
        config.set(MODE_KEY, "style").unwrap();
        config.set(CREATIVITY_KEY, "0.8").unwrap();

        assert_eq!(config.get_parsed::<Mode>(MODE_KEY).unwrap(), Some(Mode::Style));
        let creativity = config
            .get_parsed::<Creativity>(CREATIVITY_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(creativity.percent(), 80);
    }

    #[test]
    fn unparseable_value_is_ignored() {
        let config = mem_config();
        config.set(CREATIVITY_KEY, "very").unwrap();
        assert!(
            config
                .get_parsed::<Creativity>(CREATIVITY_KEY)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set(MODEL_KEY, "persisted").unwrap();
        }

        {
            let config = Config::open(path_str).unwrap();
            assert_eq!(config.get(MODEL_KEY).unwrap().unwrap(), "persisted");
        }
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("morph.db");
        ensure_db_dir(path.to_str().unwrap()).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        ensure_db_dir(":memory:").unwrap();
    }
}
