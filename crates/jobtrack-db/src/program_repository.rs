use jobtrack_core::error::AppError;
use jobtrack_core::program::Program;
use sqlx::{PgPool, Pool, Postgres};

/// Repository for academic-program JSONB documents in PostgreSQL.
///
/// Program codes are small sequential integers assigned at creation time;
/// titles are unique case-insensitively. The careers array inside each
/// document is GIN-indexed so lookups by occupation code stay cheap.
#[derive(Clone)]
pub struct ProgramRepository {
    pool: Pool<Postgres>,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a program by its code.
    pub async fn get(&self, code: u32) -> Result<Option<Program>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM academic_programs
            WHERE code = $1
            "#,
        )
        .bind(code as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(|(document,)| serde_json::from_value(document))
            .transpose()
            .map_err(AppError::from)
    }

    /// Load a program by title, matched case-insensitively.
    pub async fn get_by_title(&self, title: &str) -> Result<Option<Program>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM academic_programs
            WHERE LOWER(document->>'title') = LOWER($1)
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(|(document,)| serde_json::from_value(document))
            .transpose()
            .map_err(AppError::from)
    }

    /// Next free program code in the sequence.
    pub async fn next_code(&self) -> Result<u32, AppError> {
        let (code,): (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(code), 0) + 1 FROM academic_programs")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(code as u32)
    }

    /// Insert or replace the whole document for a program code.
    pub async fn upsert(&self, program: &Program) -> Result<(), AppError> {
        let document = serde_json::to_value(program)?;
        sqlx::query(
            r#"
            INSERT INTO academic_programs (code, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (code)
            DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(program.code as i32)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(code = program.code, title = %program.title, "Upserted program document");
        Ok(())
    }

    /// All programs as (code, title) pairs, sorted by title.
    pub async fn list_summaries(&self) -> Result<Vec<(u32, String)>, AppError> {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            r#"
            SELECT code, document->>'title'
            FROM academic_programs
            ORDER BY LOWER(document->>'title')
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(code, title)| (code as u32, title))
            .collect())
    }

    /// All programs whose career list contains an occupation code, sorted
    /// by title.
    pub async fn find_by_career(&self, code: &str) -> Result<Vec<Program>, AppError> {
        let needle = serde_json::json!([{ "code": code }]);
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM academic_programs
            WHERE document->'careers' @> $1
            ORDER BY LOWER(document->>'title')
            "#,
        )
        .bind(needle)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|(document,)| serde_json::from_value(document).map_err(AppError::from))
            .collect()
    }

    /// Remove a program document. Deleting an unknown code is a no-op.
    pub async fn delete(&self, code: u32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM academic_programs WHERE code = $1")
            .bind(code as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
