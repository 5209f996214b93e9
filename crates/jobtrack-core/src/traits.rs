use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::OccupationRecord;

/// One component of a geocoded address hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub short_name: String,
    /// Provider type markers, e.g. `["postal_code"]` or
    /// `["administrative_area_level_2", "political"]`.
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(short_name: impl Into<String>, types: &[&str]) -> Self {
        Self {
            short_name: short_name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_type(&self, t: &str) -> bool {
        self.types.iter().any(|x| x == t)
    }
}

/// One employer row as returned by the job-search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyPosting {
    pub name: String,
    pub job_count: u64,
}

/// Raw job-search result for one (code, area, radius, lookback) query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobPostings {
    pub job_count: u64,
    pub companies: Vec<CompanyPosting>,
}

/// Resolves a free-text or postal-code keyword to address components.
pub trait Geocoder: Send + Sync + Clone {
    fn geocode(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<AddressComponent>, AppError>> + Send;
}

/// Fetches job-posting counts and employer lists from the external
/// job-search provider.
///
/// Implementations return [`AppError::NotFound`] when the provider has no
/// record for the query; the fetcher's fallback ladder depends on that
/// distinction.
pub trait JobSearch: Send + Sync + Clone {
    fn job_search(
        &self,
        code: &str,
        area_name: &str,
        radius_miles: u32,
        lookback_days: u32,
    ) -> impl Future<Output = Result<JobPostings, AppError>> + Send;
}

/// Persists and retrieves per-occupation documents.
///
/// The typed face of the backing document store. Upserts are atomic at the
/// single-document level; no operation spans multiple documents.
pub trait OccupationStore: Send + Sync + Clone {
    /// Load the document for an occupation code.
    fn get(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<OccupationRecord>, AppError>> + Send;

    /// Insert or fully replace the document keyed by its occupation code.
    fn upsert(
        &self,
        record: &OccupationRecord,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Positionally replace a single area entry inside an existing
    /// document, leaving the rest of the document untouched.
    fn update_area(
        &self,
        code: &str,
        entry: &crate::model::AreaEntry,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// All persisted occupation codes, sorted.
    fn list_codes(&self) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    /// Delete the document for a code. Missing documents are a no-op.
    fn delete(&self, code: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}
