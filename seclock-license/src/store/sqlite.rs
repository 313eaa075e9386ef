//! SQLite storage backend.
//!
//! One file holds the key pair, the license and the cycle cache. Key pair and
//! license live in single-slot tables so the database itself refuses a
//! second record.

use super::backend::{CycleCache, GrantStore, KeyStore};
use crate::error::{LicenseError, LicenseResult};
use crate::grant::{EncryptedGrant, KeyPair, RecordTag};
use crate::verdict::CachedCycleResult;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Persistent store backed by SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| LicenseError::Storage(format!("failed to open license store: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> LicenseResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            LicenseError::Storage(format!("failed to open in-memory license store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> LicenseResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS license_keys (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                public_key TEXT NOT NULL,
                private_key TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS licenses (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                id TEXT NOT NULL,
                license TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cycle_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| LicenseError::Storage(format!("failed to init license schema: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn call<T, F>(&self, f: F) -> LicenseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| LicenseError::Storage("license store lock poisoned".to_string()))?;
            f(&*guard).map_err(|e| LicenseError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| LicenseError::Storage(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl KeyStore for SqliteStore {
    async fn load_keys(&self) -> LicenseResult<Option<KeyPair>> {
        let row = self
            .call(|conn| {
                conn.query_row(
                    "SELECT public_key, private_key FROM license_keys WHERE slot = 1",
                    [],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
            })
            .await?;

        Ok(row.map(|(public_key, private_key)| KeyPair {
            public_key,
            private_key,
            tag_name: RecordTag::Key,
        }))
    }

    async fn add_keys(&self, keys: KeyPair) -> LicenseResult<()> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO license_keys (slot, public_key, private_key) VALUES (1, ?1, ?2)",
                params![keys.public_key, keys.private_key],
            )
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GrantStore for SqliteStore {
    async fn load_grant(&self) -> LicenseResult<Option<EncryptedGrant>> {
        let row = self
            .call(|conn| {
                conn.query_row(
                    "SELECT id, license FROM licenses WHERE slot = 1",
                    [],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
            })
            .await?;

        row.map(|(id, ciphertext)| {
            let id = Uuid::parse_str(&id)
                .map_err(|e| LicenseError::Storage(format!("corrupt license id {id}: {e}")))?;
            Ok(EncryptedGrant {
                id,
                ciphertext,
                tag_name: RecordTag::License,
            })
        })
        .transpose()
    }

    async fn add_grant(&self, grant: EncryptedGrant) -> LicenseResult<Option<EncryptedGrant>> {
        let id = grant.id.to_string();
        let ciphertext = grant.ciphertext.clone();
        let inserted = self
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO licenses (slot, id, license) VALUES (1, ?1, ?2)",
                    params![id, ciphertext],
                )
            })
            .await?;

        Ok((inserted == 1).then_some(grant))
    }

    async fn remove_grant(&self) -> LicenseResult<bool> {
        let deleted = self
            .call(|conn| conn.execute("DELETE FROM licenses", []))
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CycleCache for SqliteStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<CachedCycleResult>> {
        let key = key.to_string();
        let value = self
            .call(move |conn| {
                conn.query_row(
                    "SELECT value FROM cycle_cache WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await?;

        value
            .map(|json| serde_json::from_str(&json).map_err(LicenseError::from))
            .transpose()
    }

    async fn set(&self, key: &str, value: &CachedCycleResult) -> LicenseResult<()> {
        let key = key.to_string();
        let json = serde_json::to_string(value)?;
        self.call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cycle_cache (key, value) VALUES (?1, ?2)",
                params![key, json],
            )
        })
        .await?;
        Ok(())
    }
}
