//! SQLite-backed key store.
//!
//! Uses a single-connection pool so every statement is serialized, and
//! `synchronous=FULL` so an insert is on disk when it returns.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::{KeyServiceError, Result};
use crate::storage::{KeyStore, SigningKey};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS keys(
    kid INTEGER PRIMARY KEY AUTOINCREMENT,
    key BLOB NOT NULL,
    exp INTEGER NOT NULL
)";

const INSERT_KEY: &str = "INSERT INTO keys(key, exp) VALUES(?, ?)";
const SELECT_VALID: &str =
    "SELECT kid, key, exp FROM keys WHERE exp > ? ORDER BY exp ASC, kid ASC LIMIT 1";
const SELECT_EXPIRED: &str =
    "SELECT kid, key, exp FROM keys WHERE exp <= ? ORDER BY exp DESC, kid DESC LIMIT 1";
const SELECT_ALL_VALID: &str =
    "SELECT kid, key, exp FROM keys WHERE exp > ? ORDER BY exp ASC, kid ASC";

/// Key store persisted in a SQLite database file.
pub struct SqliteKeyStore {
    pool: SqlitePool,
}

impl SqliteKeyStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be opened or the schema cannot be
    /// created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let store = Self::connect(options).await?;
        info!(path = %path.display(), "Opened SQLite key store");
        Ok(store)
    }

    /// Open a private in-memory database. Contents vanish on close.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if SQLite cannot be initialised.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One long-lived connection: serializes access and keeps an in-memory
        // database alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    fn row_to_key(row: &SqliteRow) -> Result<SigningKey> {
        Ok(SigningKey {
            id: row.try_get("kid")?,
            material: row.try_get("key")?,
            expires_at: row.try_get("exp")?,
        })
    }
}

#[async_trait]
impl KeyStore for SqliteKeyStore {
    async fn insert(&self, material: &[u8], expires_at: i64) -> Result<i64> {
        let id = sqlx::query(INSERT_KEY)
            .bind(material)
            .bind(expires_at)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!(kid = id, expires_at, "Inserted signing key");
        Ok(id)
    }

    async fn insert_many(&self, keys: &[(&[u8], i64)]) -> Result<Vec<i64>> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(keys.len());
        for &(material, expires_at) in keys {
            let id = sqlx::query(INSERT_KEY)
                .bind(material)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
            ids.push(id);
        }
        tx.commit().await?;

        debug!(kids = ?ids, "Inserted signing keys");
        Ok(ids)
    }

    async fn select_valid_at(&self, now: i64) -> Result<Option<SigningKey>> {
        let row = sqlx::query(SELECT_VALID)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_key).transpose()
    }

    async fn select_expired_at(&self, now: i64) -> Result<Option<SigningKey>> {
        let row = sqlx::query(SELECT_EXPIRED)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_key).transpose()
    }

    async fn select_all_valid_at(&self, now: i64) -> Result<Vec<SigningKey>> {
        let rows = sqlx::query(SELECT_ALL_VALID)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_key).collect()
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM keys")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;
        usize::try_from(count).map_err(|e| KeyServiceError::storage(e.to_string()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
