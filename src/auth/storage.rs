use std::fmt;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// A stored API key for one provider.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    pub key: String,
}

impl Credential {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// First and last four characters, for display.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

// Never print the key itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.masked())
            .finish()
    }
}

/// Where a resolved API key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Stored,
    Env(&'static str),
}

/// Manages credential storage in SQLite.
///
/// Shares a database with [`Config`](crate::config::Config), pass the same path.
pub struct AuthStorage {
    conn: Mutex<Connection>,
}

impl AuthStorage {
    /// Open or create a credentials table in the given database path.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open credentials database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                provider TEXT PRIMARY KEY,
                data     TEXT NOT NULL
            )",
        )
        .context("failed to create credentials table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("credentials database lock poisoned"))
    }

    /// Get credential for a provider.
    pub fn get(&self, provider: &str) -> Result<Option<Credential>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM credentials WHERE provider = ?1")?;
        let mut rows = stmt.query([provider])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                let cred: Credential = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt credential for {provider}"))?;
                Ok(Some(cred))
            }
            None => Ok(None),
        }
    }

    /// Store credential for a provider (upsert).
    pub fn set(&self, provider: &str, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string(credential)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO credentials (provider, data) VALUES (?1, ?2)
             ON CONFLICT(provider) DO UPDATE SET data = excluded.data",
            [provider, &json],
        )?;
        Ok(())
    }

    /// Remove credential for a provider.
    pub fn remove(&self, provider: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM credentials WHERE provider = ?1", [provider])?;
        Ok(())
    }

    /// Resolve the API key at call time.
    /// Priority: stored key → each environment variable in order.
    /// Empty values count as absent.
    pub fn resolve_api_key(
        &self,
        provider: &str,
        env_vars: &[&'static str],
    ) -> Result<Option<(String, KeySource)>> {
        if let Some(cred) = self.get(provider)?
            && !cred.key.trim().is_empty()
        {
            return Ok(Some((cred.key.trim().to_string(), KeySource::Stored)));
        }

        for var in env_vars {
            if let Ok(key) = std::env::var(var)
                && !key.trim().is_empty()
            {
                return Ok(Some((key.trim().to_string(), KeySource::Env(var))));
            }
        }

        Ok(None)
    }
}
