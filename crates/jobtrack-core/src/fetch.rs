//! Job-count fetching with geographic fallback.
//!
//! A fetch for an occupation in an area walks a fallback ladder of widening
//! scopes (area, then its state, then national) until a scope reports
//! postings. Transient provider failures are retried once at the same scope;
//! a second failure counts that scope as empty and the ladder keeps
//! widening.

use tracing::{debug, warn};

use crate::error::AppError;
use crate::model::{Employer, NATIONAL_AREA};
use crate::traits::{CompanyPosting, JobPostings, JobSearch};

/// Employers retained per area after ranking.
pub const TOP_EMPLOYER_LIMIT: usize = 10;

/// Aggregated figures for one occupation/area fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFigures {
    pub job_count: u64,
    /// Distinct employers with open postings (before truncation).
    pub company_count: u64,
    /// Top employers ranked by posting count, at most [`TOP_EMPLOYER_LIMIT`].
    pub top_employers: Vec<Employer>,
}

enum ScopeOutcome {
    Found(JobFigures),
    NoData,
}

/// Fetches job figures from a [`JobSearch`] provider, widening the search
/// scope when narrower scopes come back empty.
#[derive(Debug, Clone)]
pub struct JobCountFetcher<J> {
    search: J,
}

impl<J: JobSearch> JobCountFetcher<J> {
    pub fn new(search: J) -> Self {
        Self { search }
    }

    /// Fetch figures for `code` around `area_name`, falling back to
    /// `state_name` and then the national scope.
    ///
    /// Returns `Ok(None)` when every scope reports no postings.
    /// Data-integrity violations and non-retryable provider errors
    /// propagate as `Err`.
    pub async fn fetch(
        &self,
        code: &str,
        area_name: &str,
        state_name: Option<&str>,
        radius_miles: u32,
        lookback_days: u32,
    ) -> Result<Option<JobFigures>, AppError> {
        let mut ladder: Vec<&str> = vec![area_name];
        if area_name != NATIONAL_AREA {
            if let Some(state) = state_name {
                if state != area_name {
                    ladder.push(state);
                }
            }
            ladder.push(NATIONAL_AREA);
        }

        for scope in ladder {
            match self.fetch_scope(code, scope, radius_miles, lookback_days).await? {
                ScopeOutcome::Found(figures) => {
                    debug!(code, scope, job_count = figures.job_count, "postings found");
                    return Ok(Some(figures));
                }
                ScopeOutcome::NoData => {
                    debug!(code, scope, "no postings, widening scope");
                }
            }
        }
        Ok(None)
    }

    async fn fetch_scope(
        &self,
        code: &str,
        scope: &str,
        radius_miles: u32,
        lookback_days: u32,
    ) -> Result<ScopeOutcome, AppError> {
        let mut retried = false;
        loop {
            match self.search.job_search(code, scope, radius_miles, lookback_days).await {
                Ok(postings) => {
                    if postings.job_count == 0 && postings.companies.is_empty() {
                        return Ok(ScopeOutcome::NoData);
                    }
                    return build_figures(code, scope, postings).map(ScopeOutcome::Found);
                }
                Err(err) if err.is_not_found() => return Ok(ScopeOutcome::NoData),
                Err(err) if err.is_retryable() && !retried => {
                    warn!(code, scope, error = %err, "transient failure, retrying");
                    retried = true;
                }
                Err(err) if err.is_retryable() => {
                    warn!(code, scope, error = %err, "retry failed, treating scope as empty");
                    return Ok(ScopeOutcome::NoData);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn build_figures(code: &str, scope: &str, postings: JobPostings) -> Result<JobFigures, AppError> {
    if postings.job_count > 0 && postings.companies.is_empty() {
        return Err(AppError::DataIntegrity {
            code: code.to_string(),
            area: scope.to_string(),
            job_count: postings.job_count,
        });
    }

    let ranked = rank_employers(&postings.companies);
    let company_count = ranked.len() as u64;
    let mut top_employers = ranked;
    top_employers.truncate(TOP_EMPLOYER_LIMIT);

    Ok(JobFigures {
        job_count: postings.job_count,
        company_count,
        top_employers,
    })
}

/// Deduplicate employers by name (first occurrence wins) and rank them by
/// posting count, descending. Ties keep their input order.
pub fn rank_employers(companies: &[CompanyPosting]) -> Vec<Employer> {
    let mut employers: Vec<Employer> = Vec::with_capacity(companies.len());
    for company in companies {
        if employers.iter().any(|e| e.name == company.name) {
            continue;
        }
        employers.push(Employer {
            name: company.name.clone(),
            job_count: company.job_count,
        });
    }
    employers.sort_by(|a, b| b.job_count.cmp(&a.job_count));
    employers
}
