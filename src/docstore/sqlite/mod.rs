
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use super::{Chunk, Docstore, conflicting_chunk};
use crate::Result;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone, FromRow)]
struct ChunkRow {
    id: String,
    text: String,
    ref_doc_id: Option<String>,
}

impl From<ChunkRow> for Chunk {
    #[inline]
    fn from(row: ChunkRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            ref_doc_id: row.ref_doc_id,
        }
    }
}

/// Docstore persisted in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteDocstore {
    pool: DbPool,
}

impl SqliteDocstore {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create docstore connection pool")?;

        let docstore = Self { pool };
        docstore.run_migrations().await?;

        Ok(docstore)
    }

    /// Open `docstore.db` inside the given directory, creating it if needed
    #[inline]
    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(config_dir.join("docstore.db")).await
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running docstore migrations");

        sqlx::migrate!("src/docstore/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run docstore schema migration")?;

        debug!("Docstore migrations completed successfully");
        Ok(())
    }

    /// Number of stored chunks
    #[inline]
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count chunks")?;
        Ok(count)
    }

    async fn get(&self, id: &str) -> Result<Option<Chunk>> {
        let row = sqlx::query_as::<_, ChunkRow>(
            "SELECT id, text, ref_doc_id FROM chunks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to get chunk {}", id))?;

        Ok(row.map(Chunk::from))
    }
}

#[async_trait]
impl Docstore for SqliteDocstore {
    async fn add(&self, chunk: &Chunk) -> Result<String> {
        let inserted = sqlx::query(
            "INSERT INTO chunks (id, text, ref_doc_id, created_date) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&chunk.id)
        .bind(&chunk.text)
        .bind(&chunk.ref_doc_id)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert chunk {}", chunk.id))?
        .rows_affected();

        if inserted == 0 {
            match self.get(&chunk.id).await? {
                Some(existing) if existing == *chunk => {
                    debug!("Chunk {} already stored", chunk.id);
                }
                _ => return Err(conflicting_chunk(&chunk.id)),
            }
        }

        Ok(chunk.id.clone())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(chunk) = self.get(id).await? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chunks WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to look up chunk {}", id))?;
        Ok(exists)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM chunks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete chunk {}", id))?
            .rows_affected();
        Ok(deleted > 0)
    }
}
