//! Optional durable backing (spec.md §6 "Persisted state"): a single table
//! `text_contexts(id, content, embedding vector(dim))` in a vector-capable
//! Postgres, queried with `pgvector`'s `<=>` cosine-distance operator.
//!
//! An async-trait `VectorStore` impl over a pooled `sqlx` client, with the
//! schema brought up to date on first connect via `sqlx::migrate!` embedded
//! migrations rather than hand-written inline DDL.

use crate::error::{VectorDataError, VectorDataResult};
use crate::store::VectorStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coderag_parsing::{Chunk, SearchResult};
use pgvector::Vector;
use sqlx::PgPool;

/// `VectorStore` backed by a Postgres `text_contexts` table with a
/// `pgvector` `embedding` column.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run any pending embedded migrations.
    ///
    /// # Errors
    /// Returns an error if the connection or migration run fails.
    pub async fn connect(database_url: &str) -> VectorDataResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| VectorDataError::Unavailable(e.to_string()))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl VectorStore for PostgresStore {
    async fn upsert(&self, chunks: Vec<Chunk>) -> VectorDataResult<()> {
        for chunk in chunks {
            let embedding = chunk.embedding.clone().map(Vector::from);
            sqlx::query(
                "INSERT INTO text_contexts
                    (id, file_path, file_name, content, start_line, end_line,
                     last_modified, language, function_name, class_name, tags, embedding)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
                 ON CONFLICT (id) DO UPDATE SET
                    file_path = EXCLUDED.file_path,
                    file_name = EXCLUDED.file_name,
                    content = EXCLUDED.content,
                    start_line = EXCLUDED.start_line,
                    end_line = EXCLUDED.end_line,
                    last_modified = EXCLUDED.last_modified,
                    language = EXCLUDED.language,
                    function_name = EXCLUDED.function_name,
                    class_name = EXCLUDED.class_name,
                    tags = EXCLUDED.tags,
                    embedding = EXCLUDED.embedding",
            )
            .bind(&chunk.id)
            .bind(&chunk.file_path)
            .bind(&chunk.file_name)
            .bind(&chunk.content)
            .bind(chunk.start_line as i64)
            .bind(chunk.end_line as i64)
            .bind(chunk.last_modified)
            .bind(&chunk.language)
            .bind(&chunk.function_name)
            .bind(&chunk.class_name)
            .bind(&chunk.tags)
            .bind(embedding)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: usize) -> VectorDataResult<Vec<SearchResult>> {
        // `embedding <=> $1` is pgvector's cosine-distance operator
        // (`1 - cosine_similarity`); ordering and the LIMIT both happen in
        // Postgres rather than by pulling every row into Rust.
        let query_vector = Vector::from(query.to_vec());
        let rows: Vec<(
            String,
            String,
            String,
            String,
            i64,
            i64,
            DateTime<Utc>,
            String,
            Option<String>,
            Option<String>,
            Vec<String>,
            Option<Vector>,
            f64,
        )> = sqlx::query_as(
            "SELECT id, file_path, file_name, content, start_line, end_line,
                    last_modified, language, function_name, class_name, tags, embedding,
                    (embedding <=> $1) AS distance
             FROM text_contexts
             WHERE embedding IS NOT NULL
             ORDER BY embedding <=> $1
             LIMIT $2",
        )
        .bind(&query_vector)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| VectorDataError::Backend(e.to_string()))?;

        let results: Vec<SearchResult> = rows
            .into_iter()
            .map(|row| {
                let similarity = 1.0 - row.12 as f32;
                let chunk = Chunk {
                    id: row.0,
                    file_path: row.1,
                    file_name: row.2,
                    content: row.3,
                    start_line: row.4 as usize,
                    end_line: row.5 as usize,
                    last_modified: row.6,
                    embedding: row.11.map(Vector::to_vec),
                    language: row.7,
                    function_name: row.8,
                    class_name: row.9,
                    tags: row.10,
                };
                SearchResult { chunk, similarity }
            })
            .collect();
        Ok(results)
    }

    async fn count(&self) -> VectorDataResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM text_contexts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> VectorDataResult<()> {
        sqlx::query("TRUNCATE text_contexts")
            .execute(&self.pool)
            .await
            .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn all_files(&self) -> VectorDataResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT file_path FROM text_contexts ORDER BY file_path")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(rows.into_iter().map(|(path,)| path).collect())
    }

    async fn last_modified(&self, file_path: &str) -> VectorDataResult<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT last_modified FROM text_contexts WHERE file_path = $1 LIMIT 1",
        )
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(row.map(|(ts,)| ts))
    }

    async fn delete_file_chunks(&self, file_path: &str) -> VectorDataResult<()> {
        sqlx::query("DELETE FROM text_contexts WHERE file_path = $1")
            .bind(file_path)
            .execute(&self.pool)
            .await
            .map_err(|e| VectorDataError::Backend(e.to_string()))?;
        Ok(())
    }
}
