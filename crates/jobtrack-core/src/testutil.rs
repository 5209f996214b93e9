//! Test utilities: mock implementations of the collaborator traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::model::{AreaEntry, OccupationRecord};
use crate::traits::{AddressComponent, CompanyPosting, Geocoder, JobPostings, JobSearch, OccupationStore};

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Mock geocoder with per-keyword responses.
///
/// Unknown keywords return [`AppError::NotFound`]. Errors are consumed on
/// first use; component lists are served repeatedly.
#[derive(Clone, Default)]
pub struct MockGeocoder {
    components: Arc<Mutex<HashMap<String, Vec<AddressComponent>>>>,
    errors: Arc<Mutex<HashMap<String, AppError>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(keyword: &str, components: Vec<AddressComponent>) -> Self {
        let mock = Self::new();
        mock.insert(keyword, components);
        mock
    }

    pub fn with_error(keyword: &str, error: AppError) -> Self {
        let mock = Self::new();
        mock.errors.lock().unwrap().insert(keyword.to_string(), error);
        mock
    }

    pub fn insert(&self, keyword: &str, components: Vec<AddressComponent>) {
        self.components
            .lock()
            .unwrap()
            .insert(keyword.to_string(), components);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Geocoder for MockGeocoder {
    async fn geocode(&self, keyword: &str) -> Result<Vec<AddressComponent>, AppError> {
        self.calls.lock().unwrap().push(keyword.to_string());

        if let Some(err) = self.errors.lock().unwrap().remove(keyword) {
            return Err(err);
        }
        match self.components.lock().unwrap().get(keyword) {
            Some(components) => Ok(components.clone()),
            None => Err(AppError::NotFound(format!("no geocode results for {keyword}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockJobSearch
// ---------------------------------------------------------------------------

/// Recorded job-search call: (code, area name, radius).
pub type SearchCall = (String, String, u32);

/// Mock job-search provider.
///
/// Responses are queued per area name and consumed in order; when an
/// area's queue is empty the default response (if any) is served, else
/// [`AppError::NotFound`].
#[derive(Clone, Default)]
pub struct MockJobSearch {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<JobPostings, AppError>>>>>,
    default_postings: Arc<Mutex<Option<JobPostings>>>,
    calls: Arc<Mutex<Vec<SearchCall>>>,
}

impl MockJobSearch {
    /// Every query answers `NotFound`.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Every query (not otherwise scripted) answers with the same postings.
    pub fn with_default(postings: JobPostings) -> Self {
        let mock = Self::default();
        *mock.default_postings.lock().unwrap() = Some(postings);
        mock
    }

    /// Queue a response for the given area name.
    pub fn enqueue(&self, area: &str, response: Result<JobPostings, AppError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(area.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl JobSearch for MockJobSearch {
    async fn job_search(
        &self,
        code: &str,
        area_name: &str,
        radius_miles: u32,
        _lookback_days: u32,
    ) -> Result<JobPostings, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((code.to_string(), area_name.to_string(), radius_miles));

        if let Some(queued) = self
            .responses
            .lock()
            .unwrap()
            .get_mut(area_name)
            .and_then(VecDeque::pop_front)
        {
            return queued;
        }
        if let Some(postings) = self.default_postings.lock().unwrap().clone() {
            return Ok(postings);
        }
        Err(AppError::NotFound(format!("{code} in {area_name}")))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory occupation store recording write counts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, OccupationRecord>>>,
    upsert_calls: Arc<Mutex<usize>>,
    update_area_calls: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: OccupationRecord) -> Self {
        let store = Self::new();
        store
            .records
            .lock()
            .unwrap()
            .insert(record.code.clone(), record);
        store
    }

    /// Persisted record for a code, for assertions.
    pub fn record(&self, code: &str) -> Option<OccupationRecord> {
        self.records.lock().unwrap().get(code).cloned()
    }

    pub fn upsert_count(&self) -> usize {
        *self.upsert_calls.lock().unwrap()
    }

    pub fn update_area_count(&self) -> usize {
        *self.update_area_calls.lock().unwrap()
    }

    /// Total writes of any kind.
    pub fn write_count(&self) -> usize {
        self.upsert_count() + self.update_area_count()
    }
}

impl OccupationStore for MemoryStore {
    async fn get(&self, code: &str) -> Result<Option<OccupationRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(code).cloned())
    }

    async fn upsert(&self, record: &OccupationRecord) -> Result<(), AppError> {
        *self.upsert_calls.lock().unwrap() += 1;
        self.records
            .lock()
            .unwrap()
            .insert(record.code.clone(), record.clone());
        Ok(())
    }

    async fn update_area(&self, code: &str, entry: &AreaEntry) -> Result<(), AppError> {
        *self.update_area_calls.lock().unwrap() += 1;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(code)
            .ok_or_else(|| AppError::NotFound(format!("no record for {code}")))?;
        let slot = record
            .area_mut(&entry.area.name)
            .ok_or_else(|| AppError::NotFound(format!("no area {} for {code}", entry.area.name)))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn list_codes(&self) -> Result<Vec<String>, AppError> {
        let mut codes: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        self.records.lock().unwrap().remove(code);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Geocode components for zip 94123 (San Francisco).
pub fn zip_components() -> Vec<AddressComponent> {
    vec![
        AddressComponent::new("94123", &["postal_code"]),
        AddressComponent::new("San Francisco", &["locality", "political"]),
        AddressComponent::new(
            "San Francisco County",
            &["administrative_area_level_2", "political"],
        ),
        AddressComponent::new("CA", &["administrative_area_level_1", "political"]),
        AddressComponent::new("US", &["country", "political"]),
    ]
}

/// Build postings with the given total and (name, per-company count) rows.
pub fn make_postings(job_count: u64, companies: &[(&str, u64)]) -> JobPostings {
    JobPostings {
        job_count,
        companies: companies
            .iter()
            .map(|(name, count)| CompanyPosting {
                name: name.to_string(),
                job_count: *count,
            })
            .collect(),
    }
}
