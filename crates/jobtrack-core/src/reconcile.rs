//! Refresh orchestration.
//!
//! A refresh loads (or creates) the per-occupation document, folds any newly
//! requested location into the tracked area set, fetches figures for every
//! area whose latest record is older than the current month, and persists
//! the result. Refreshes for the same occupation code serialize on a keyed
//! lock; fetch work goes through the [`Throttler`] to respect provider rate
//! limits.
//!
//! Write policy: a refresh that adds areas (or creates the document) writes
//! the whole document once; a refresh that only appends records updates each
//! touched area in place; a refresh that finds nothing stale writes nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::fetch::{JobCountFetcher, JobFigures};
use crate::model::{
    latest_period, Area, AreaEntry, AreaJobs, AreaKind, JobRecord, OccupationRecord, Period,
    DEFAULT_RADIUS,
};
use crate::resolver::AreaResolver;
use crate::throttle::Throttler;
use crate::traits::{Geocoder, JobSearch, OccupationStore};

/// Tuning for a [`ReconcileEngine`].
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Fetch units dispatched per throttler batch.
    pub batch_size: usize,
    /// Pause between throttler batches.
    pub batch_delay: Duration,
    /// Posting-age window passed to the job-search provider.
    pub lookback_days: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(1000),
            lookback_days: 30,
        }
    }
}

/// Summary of one occupation refresh.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub code: String,
    /// Area names added to the document by this refresh.
    pub new_areas: Vec<String>,
    /// Stale areas scheduled for fetching.
    pub units_planned: usize,
    /// Job records appended across all areas and radius buckets.
    pub records_written: usize,
    /// True when the whole document was rewritten (new document or new
    /// areas), false when only touched areas were updated in place.
    pub full_upsert: bool,
}

/// Outcome of a bulk refresh over every stored occupation.
#[derive(Debug, Clone)]
pub struct RefreshAllReport {
    pub reports: Vec<ReconcileReport>,
    /// Codes that failed both the initial pass and the retry pass.
    pub failed: Vec<String>,
}

/// One throttled fetch unit. A county is a single unit covering all of its
/// stale radius buckets so that its per-radius fetches land in one batch.
enum WorkItem {
    Primitive {
        area_name: String,
    },
    County {
        area_name: String,
        zip: String,
        radii: Vec<u32>,
    },
}

struct UnitOutcome {
    area_name: String,
    /// (radius bucket, figures). `None` figures mean a terminal no-data
    /// outcome and produce a zero record for the period.
    results: Vec<(Option<u32>, Option<JobFigures>)>,
}

/// Drives refreshes: resolve, plan, throttled fetch, merge, persist.
#[derive(Clone)]
pub struct ReconcileEngine<G: Geocoder, J: JobSearch, S: OccupationStore> {
    resolver: AreaResolver<G>,
    fetcher: JobCountFetcher<J>,
    store: S,
    throttler: Throttler,
    lookback_days: u32,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<G: Geocoder, J: JobSearch, S: OccupationStore> ReconcileEngine<G, J, S> {
    pub fn new(geocoder: G, search: J, store: S, config: ReconcileConfig) -> Self {
        Self {
            resolver: AreaResolver::new(geocoder),
            fetcher: JobCountFetcher::new(search),
            store,
            throttler: Throttler::new(config.batch_size, config.batch_delay),
            lookback_days: config.lookback_days,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Refresh one occupation, optionally folding `location` into its
    /// tracked areas first. Concurrent refreshes for the same code queue up
    /// behind each other.
    pub async fn refresh(
        &self,
        code: &str,
        location: Option<&str>,
    ) -> Result<ReconcileReport, AppError> {
        let _guard = self.lock_code(code).await;

        let existing = self.store.get(code).await?;
        let is_new_record = existing.is_none();
        let mut record = existing.unwrap_or_else(|| OccupationRecord::new(code));

        let mut new_areas: Vec<String> = Vec::new();
        let mut touched: Vec<String> = Vec::new();
        if let Some(keyword) = location {
            self.fold_location(keyword, &mut record, &mut new_areas, &mut touched)
                .await?;
        }

        let now = Period::current();
        let items = plan_items(&record, now, entropy_seed());
        let units_planned = items.len();
        debug!(code, units_planned, new_areas = new_areas.len(), "planned refresh");

        let state = record.state_name().map(str::to_string);
        let units: Vec<_> = items
            .into_iter()
            .map(|item| self.run_unit(code, state.clone(), item))
            .collect();
        let outcomes = self.throttler.execute(units).await;

        let mut records_written = 0;
        for outcome in outcomes {
            let Some(entry) = record.area_mut(&outcome.area_name) else {
                continue;
            };
            let mut wrote = false;
            for (radius, figures) in outcome.results {
                let job_record = match &figures {
                    Some(f) => JobRecord::new(now, f.job_count, f.company_count),
                    None => JobRecord::empty(now),
                };
                if entry.push_record(radius, job_record) {
                    wrote = true;
                    records_written += 1;
                }
                if let Some(f) = figures {
                    if !f.top_employers.is_empty() {
                        entry.top_employers = f.top_employers;
                    }
                }
            }
            if wrote && !touched.contains(&outcome.area_name) {
                touched.push(outcome.area_name);
            }
        }

        let full_upsert = is_new_record || !new_areas.is_empty();
        if full_upsert {
            if !new_areas.is_empty() || records_written > 0 || !touched.is_empty() {
                record.last_updated = Utc::now();
                self.store.upsert(&record).await?;
            }
        } else {
            for name in &touched {
                if let Some(entry) = record.area(name) {
                    self.store.update_area(code, entry).await?;
                }
            }
        }

        info!(code, records_written, full_upsert, "refresh complete");
        Ok(ReconcileReport {
            code: code.to_string(),
            new_areas,
            units_planned,
            records_written,
            full_upsert,
        })
    }

    /// Refresh every stored occupation, one code at a time. Codes whose
    /// refresh fails are retried once in a second pass.
    ///
    /// Each refresh already batches its fetches through the throttler, so
    /// the walk stays sequential; running codes concurrently would multiply
    /// the in-flight provider calls past the configured batch size.
    pub async fn refresh_all(&self) -> Result<RefreshAllReport, AppError> {
        let codes = self.store.list_codes().await?;
        info!(count = codes.len(), "bulk refresh starting");

        let (mut reports, failed) = self.refresh_batch(&codes).await;
        let mut failed_twice = Vec::new();
        if !failed.is_empty() {
            warn!(count = failed.len(), "retrying failed refreshes");
            let (retried, still_failed) = self.refresh_batch(&failed).await;
            reports.extend(retried);
            failed_twice = still_failed;
        }
        Ok(RefreshAllReport {
            reports,
            failed: failed_twice,
        })
    }

    async fn refresh_batch(&self, codes: &[String]) -> (Vec<ReconcileReport>, Vec<String>) {
        let mut reports = Vec::new();
        let mut failed = Vec::new();
        for code in codes {
            match self.refresh(code, None).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(code, error = %err, "refresh failed");
                    failed.push(code.clone());
                }
            }
        }
        (reports, failed)
    }

    /// Resolve a location keyword and merge the resulting areas into the
    /// record. Zip codes collapse into their county's entry; a zip with no
    /// resolvable county is tracked flat under its own name.
    async fn fold_location(
        &self,
        keyword: &str,
        record: &mut OccupationRecord,
        new_areas: &mut Vec<String>,
        touched: &mut Vec<String>,
    ) -> Result<(), AppError> {
        let known: Vec<Area> = record.areas.iter().map(|e| e.area.clone()).collect();
        let resolved = self.resolver.resolve(keyword, &known).await?;

        for area in resolved {
            if area.kind != AreaKind::PostalCode {
                new_areas.push(area.name.clone());
                record.areas.push(AreaEntry::primitive(area));
                continue;
            }
            match self.resolver.county_of(keyword).await? {
                Some(county) => {
                    if let Some(entry) = record.area_mut(&county.name) {
                        if entry.add_zip_alias(&area.name) && !touched.contains(&county.name) {
                            touched.push(county.name);
                        }
                    } else {
                        new_areas.push(county.name.clone());
                        record
                            .areas
                            .push(AreaEntry::county(county, vec![area.name]));
                    }
                }
                None => {
                    new_areas.push(area.name.clone());
                    record.areas.push(AreaEntry::primitive(area));
                }
            }
        }
        Ok(())
    }

    async fn run_unit(
        &self,
        code: &str,
        state: Option<String>,
        item: WorkItem,
    ) -> Option<UnitOutcome> {
        match item {
            WorkItem::Primitive { area_name } => {
                match self
                    .fetcher
                    .fetch(code, &area_name, state.as_deref(), DEFAULT_RADIUS, self.lookback_days)
                    .await
                {
                    Ok(figures) => Some(UnitOutcome {
                        area_name,
                        results: vec![(None, figures)],
                    }),
                    Err(err) => {
                        warn!(code, area = %area_name, error = %err, "fetch failed, leaving area stale");
                        None
                    }
                }
            }
            WorkItem::County {
                area_name,
                zip,
                radii,
            } => {
                let mut results = Vec::with_capacity(radii.len());
                for radius in radii {
                    match self
                        .fetcher
                        .fetch(code, &zip, state.as_deref(), radius, self.lookback_days)
                        .await
                    {
                        Ok(figures) => results.push((Some(radius), figures)),
                        Err(err) => {
                            warn!(code, area = %area_name, radius, error = %err, "fetch failed, leaving bucket stale");
                        }
                    }
                }
                if results.is_empty() {
                    None
                } else {
                    Some(UnitOutcome { area_name, results })
                }
            }
        }
    }

    async fn lock_code(&self, code: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries referenced only by the map belong to finished
            // refreshes and can go.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(code.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Collect the stale areas of a record into fetch units. An area is stale
/// when its latest record (per radius bucket, for counties) predates `now`.
fn plan_items(record: &OccupationRecord, now: Period, seed: u64) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for entry in &record.areas {
        match &entry.jobs {
            AreaJobs::Primitive { records } => {
                if latest_period(records) < Some(now) {
                    items.push(WorkItem::Primitive {
                        area_name: entry.area.name.clone(),
                    });
                }
            }
            AreaJobs::County {
                zip_aliases,
                buckets,
            } => {
                let radii: Vec<u32> = buckets
                    .iter()
                    .filter(|b| latest_period(&b.records) < Some(now))
                    .map(|b| b.radius_miles)
                    .collect();
                if radii.is_empty() {
                    continue;
                }
                let Some(zip) = choose_zip(zip_aliases, seed) else {
                    warn!(area = %entry.area.name, "county has no zip aliases, skipping");
                    continue;
                };
                items.push(WorkItem::County {
                    area_name: entry.area.name.clone(),
                    zip: zip.to_string(),
                    radii,
                });
            }
        }
    }
    items
}

/// Pick one zip alias to anchor a county query. The pick varies between
/// runs so a persistently bad zip cannot starve a county of data.
fn choose_zip(aliases: &[String], seed: u64) -> Option<&str> {
    if aliases.is_empty() {
        return None;
    }
    let idx = (xorshift(seed.max(1)) as usize) % aliases.len();
    aliases.get(idx).map(String::as_str)
}

fn xorshift(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

fn entropy_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9)
}
