//! Durable, append-only store of finalized submissions.
//!
//! One row per submit-flagged evaluation that reached a terminal verdict.
//! Rows are never updated.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger database error")]
    Db(#[from] sqlx::Error),
}

/// A finalized submission as persisted in the ledger.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    pub problem_id: String,
    pub user_id: String,
    pub code: String,
    pub language: String,
    pub problem_title: String,
    pub status: String,
    pub time: String,
    pub memory: f64,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS submissions (
    id TEXT PRIMARY KEY,
    problem_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    code TEXT NOT NULL,
    language TEXT NOT NULL,
    problem_title TEXT NOT NULL,
    status TEXT NOT NULL,
    time TEXT NOT NULL,
    memory REAL NOT NULL,
    created_at TEXT NOT NULL
)";

pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Opens (creating if needed) the ledger database at `path`.
    pub async fn open(path: &Path) -> Result<Ledger, LedgerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// In-memory ledger, used by tests. A single connection keeps every
    /// query on the same in-memory database.
    pub async fn open_in_memory() -> Result<Ledger, LedgerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Ledger, LedgerError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Ledger { pool })
    }

    /// Appends one finalized submission.
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    pub async fn record(&self, record: &SubmissionRecord) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO submissions \
             (id, problem_id, user_id, code, language, problem_title, status, time, memory, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&record.id)
        .bind(&record.problem_id)
        .bind(&record.user_id)
        .bind(&record.code)
        .bind(&record.language)
        .bind(&record.problem_title)
        .bind(&record.status)
        .bind(&record.time)
        .bind(record.memory)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All submissions by one user, newest first.
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<SubmissionRecord>, LedgerError> {
        let records = sqlx::query_as::<_, SubmissionRecord>(
            "SELECT * FROM submissions WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, status: &str, created_at: &str) -> SubmissionRecord {
        SubmissionRecord {
            id: id.to_string(),
            problem_id: "p1".to_string(),
            user_id: "u1".to_string(),
            code: "print(1)".to_string(),
            language: "python".to_string(),
            problem_title: "two-sum".to_string(),
            status: status.to_string(),
            time: "0.002".to_string(),
            memory: 2048.0,
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn records_and_reads_back_a_submission() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        ledger
            .record(&record("a", "Accepted", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        let rows = ledger.for_user("u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "Accepted");
        assert_eq!(rows[0].problem_title, "two-sum");
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        ledger
            .record(&record("a", "Wrong Answer", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        ledger
            .record(&record("b", "Accepted", "2026-01-02T00:00:00Z"))
            .await
            .unwrap();
        let rows = ledger.for_user("u1").await.unwrap();
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[1].id, "a");
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let rec = record("a", "Accepted", "2026-01-01T00:00:00Z");
        ledger.record(&rec).await.unwrap();
        assert!(ledger.record(&rec).await.is_err());
    }
}
