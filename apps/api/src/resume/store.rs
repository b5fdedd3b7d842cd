//! SQLite-backed resume store plus the append-only chat log.
//!
//! Each top-level category of the resume is one row holding its JSON blob.
//! The seed file doubles as a read fallback while the table is empty.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::models::chat::Role;
use crate::models::resume::{ResumeDocument, ResumeRow};
use crate::resume::ResumeProvider;

#[derive(Clone)]
pub struct ResumeStore {
    pool: SqlitePool,
    resume_path: PathBuf,
}

impl ResumeStore {
    pub fn new(pool: SqlitePool, resume_path: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            resume_path: resume_path.into(),
        }
    }

    /// Seeds `resume_data` from the seed file when the table has no rows.
    /// Returns the number of categories written.
    pub async fn seed_if_empty(&self) -> Result<usize, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resume_data")
            .fetch_one(&mut *conn)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        let Some(resume) = read_resume_file(&self.resume_path) else {
            warn!(
                "Resume seed {} unavailable, starting with empty resume data",
                self.resume_path.display()
            );
            return Ok(0);
        };

        let mut tx = sqlx::Connection::begin(&mut *conn).await?;
        let mut seeded = 0;
        for (category, data) in resume.categories() {
            sqlx::query("INSERT OR REPLACE INTO resume_data (category, data_json) VALUES (?, ?)")
                .bind(category)
                .bind(data.to_string())
                .execute(&mut *tx)
                .await?;
            seeded += 1;
        }
        tx.commit().await?;

        info!("Resume data seeded into database ({seeded} categories)");
        Ok(seeded)
    }

    /// Merges every stored category into one document.
    /// A corrupt blob reads back as an empty object for its category.
    pub async fn load_from_db(&self) -> Result<ResumeDocument, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<ResumeRow> = sqlx::query_as("SELECT category, data_json FROM resume_data")
            .fetch_all(&mut *conn)
            .await?;

        let mut resume = ResumeDocument::default();
        for row in rows {
            let data = serde_json::from_str(&row.data_json).unwrap_or_else(|e| {
                warn!("Corrupt resume blob for category '{}': {e}", row.category);
                Value::Object(Default::default())
            });
            resume.insert(row.category, data);
        }
        Ok(resume)
    }

    /// Appends one message to the chat log. The log is never read back by the chat flow.
    pub async fn append_chat_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO chat_history (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(Utc::now().naive_utc())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ResumeProvider for ResumeStore {
    /// Database first, seed file second, empty document last.
    async fn get_resume(&self) -> Result<ResumeDocument, sqlx::Error> {
        let resume = self.load_from_db().await?;
        if !resume.is_empty() {
            return Ok(resume);
        }
        Ok(read_resume_file(&self.resume_path).unwrap_or_default())
    }
}

fn read_resume_file(path: &Path) -> Option<ResumeDocument> {
    let raw = std::fs::read_to_string(path).ok()?;
    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid JSON in {}: {e}", path.display());
            return None;
        }
    };
    match ResumeDocument::try_from(value) {
        Ok(resume) => Some(resume),
        Err(_) => {
            warn!("{} is not a JSON object", path.display());
            None
        }
    }
}
