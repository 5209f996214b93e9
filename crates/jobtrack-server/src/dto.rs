use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobtrack_client::OccupationProfile;
use jobtrack_core::model::{AreaEntry, Employer, JobRecord};
use jobtrack_core::program::Program;

// ---------------------------------------------------------------------------
// Careers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CareerListResponse {
    pub codes: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CareerDetailResponse {
    pub code: String,
    pub title: String,
    pub description: String,
    pub tasks: Vec<String>,
    pub education: Vec<String>,
    /// Annual wage percentiles by scope (national, state, BLS area).
    #[schema(value_type = Object)]
    pub wages: serde_json::Value,
    pub video_url: Option<String>,
    pub technical_skills: Vec<String>,
}

impl CareerDetailResponse {
    pub fn new(
        profile: OccupationProfile,
        technical_skills: Vec<String>,
        wages: serde_json::Value,
    ) -> Self {
        Self {
            code: profile.code,
            title: profile.title,
            description: profile.description,
            tasks: profile.tasks,
            education: profile.education,
            wages,
            video_url: profile.video_url,
            technical_skills,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted job data
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct JobDataQuery {
    /// Area name or one of a county's zip aliases.
    pub location: String,
    /// Radius bucket in miles; only meaningful for county areas.
    pub radius: Option<u32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CareerDetailQuery {
    /// Location passed to the occupation-detail provider (defaults to "US").
    pub location: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobRecordResponse {
    pub month: u32,
    pub year: i32,
    pub job_count: u64,
    pub company_count: u64,
}

impl From<&JobRecord> for JobRecordResponse {
    fn from(record: &JobRecord) -> Self {
        Self {
            month: record.month,
            year: record.year,
            job_count: record.job_count,
            company_count: record.company_count,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EmployerResponse {
    pub name: String,
    pub job_count: u64,
}

impl From<&Employer> for EmployerResponse {
    fn from(employer: &Employer) -> Self {
        Self {
            name: employer.name.clone(),
            job_count: employer.job_count,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobDataResponse {
    pub code: String,
    pub area: String,
    pub kind: String,
    /// Set for county areas, absent for flat areas.
    pub radius_miles: Option<u32>,
    pub records: Vec<JobRecordResponse>,
    pub top_employers: Vec<EmployerResponse>,
    pub last_updated: DateTime<Utc>,
}

impl JobDataResponse {
    pub fn from_entry(
        code: &str,
        entry: &AreaEntry,
        radius_miles: Option<u32>,
        records: &[JobRecord],
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.to_string(),
            area: entry.area.name.clone(),
            kind: entry.area.kind.as_str().to_string(),
            radius_miles,
            records: records.iter().map(JobRecordResponse::from).collect(),
            top_employers: entry
                .top_employers
                .iter()
                .map(EmployerResponse::from)
                .collect(),
            last_updated,
        }
    }
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgramSummary {
    pub code: u32,
    pub title: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgramListResponse {
    pub programs: Vec<ProgramSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgramCareerResponse {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgramDetailResponse {
    pub code: u32,
    pub title: String,
    pub degree_types: Vec<String>,
    pub careers: Vec<ProgramCareerResponse>,
    pub last_updated: DateTime<Utc>,
}

impl From<Program> for ProgramDetailResponse {
    fn from(program: Program) -> Self {
        Self {
            code: program.code,
            title: program.title,
            degree_types: program.degree_types,
            careers: program
                .careers
                .into_iter()
                .map(|c| ProgramCareerResponse {
                    code: c.code,
                    title: c.title,
                })
                .collect(),
            last_updated: program.last_updated,
        }
    }
}

/// One program linked to a career, as returned by the careers-side lookup.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RelatedProgramResponse {
    pub code: u32,
    pub title: String,
    pub degree_types: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RelatedProgramsResponse {
    pub code: String,
    pub programs: Vec<RelatedProgramResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProgramRequest {
    pub title: String,
    #[serde(default)]
    pub degree_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    /// Location keyword to fold into the tracked areas before refreshing.
    pub location: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RefreshAcceptedResponse {
    pub code: String,
    pub status: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkRefreshAcceptedResponse {
    pub status: String,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
