use jobtrack_core::error::AppError;
use jobtrack_core::model::{AreaEntry, OccupationRecord};
use jobtrack_core::traits::OccupationStore;
use sqlx::{PgPool, Pool, Postgres};

/// Repository for per-occupation JSONB documents in PostgreSQL.
///
/// Each occupation code maps to a single row holding the full
/// [`OccupationRecord`] as a JSONB document. Whole-document writes go
/// through [`upsert`](Self::upsert); appending a month to one area uses
/// [`update_area`](Self::update_area), which patches the matching element
/// of the document's `areas` array in place.
#[derive(Clone)]
pub struct OccupationRepository {
    pool: Pool<Postgres>,
}

impl OccupationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Load the document for an occupation code.
    pub async fn get(&self, code: &str) -> Result<Option<OccupationRecord>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM occupation_records
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(|(document,)| serde_json::from_value(document))
            .transpose()
            .map_err(AppError::from)
    }

    /// Insert or replace the whole document for a code.
    pub async fn upsert(&self, record: &OccupationRecord) -> Result<(), AppError> {
        let document = serde_json::to_value(record)?;
        sqlx::query(
            r#"
            INSERT INTO occupation_records (code, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (code)
            DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(&record.code)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(code = %record.code, "Upserted occupation document");
        Ok(())
    }

    /// Replace one element of the document's `areas` array, located by area
    /// name, without rewriting the rest of the document.
    pub async fn update_area(&self, code: &str, entry: &AreaEntry) -> Result<(), AppError> {
        let element = serde_json::to_value(entry)?;
        let result = sqlx::query(
            r#"
            WITH target AS (
                SELECT o.code, (a.ord - 1)::int AS idx
                FROM occupation_records o,
                     jsonb_array_elements(o.document->'areas') WITH ORDINALITY AS a(area, ord)
                WHERE o.code = $1
                  AND a.area->'area'->>'name' = $2
            )
            UPDATE occupation_records o
            SET document = jsonb_set(o.document, ARRAY['areas', target.idx::text], $3),
                updated_at = NOW()
            FROM target
            WHERE o.code = target.code
            "#,
        )
        .bind(code)
        .bind(&entry.area.name)
        .bind(element)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "area {} for occupation {code}",
                entry.area.name
            )));
        }
        Ok(())
    }

    /// All tracked occupation codes, sorted.
    pub async fn list_codes(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT code
            FROM occupation_records
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(|(code,)| code).collect())
    }

    /// Remove an occupation document. Deleting an unknown code is a no-op.
    pub async fn delete(&self, code: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM occupation_records WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl OccupationStore for OccupationRepository {
    async fn get(&self, code: &str) -> Result<Option<OccupationRecord>, AppError> {
        OccupationRepository::get(self, code).await
    }

    async fn upsert(&self, record: &OccupationRecord) -> Result<(), AppError> {
        OccupationRepository::upsert(self, record).await
    }

    async fn update_area(&self, code: &str, entry: &AreaEntry) -> Result<(), AppError> {
        OccupationRepository::update_area(self, code, entry).await
    }

    async fn list_codes(&self) -> Result<Vec<String>, AppError> {
        OccupationRepository::list_codes(self).await
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        OccupationRepository::delete(self, code).await
    }
}
