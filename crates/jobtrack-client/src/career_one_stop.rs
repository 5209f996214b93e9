use std::time::Duration;

use jobtrack_core::error::AppError;
use jobtrack_core::traits::{CompanyPosting, JobPostings, JobSearch};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const BASE_URI: &str = "https://api.careeronestop.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// CareerOneStop API client.
///
/// Serves two endpoints: job-posting searches (the [`JobSearch`]
/// implementation) and occupation details (title, tasks, wages, education).
/// The API reports counts inconsistently as numbers or strings, so all
/// counts go through lenient coercion.
#[derive(Clone)]
pub struct CareerOneStopClient {
    client: Client,
    user_id: String,
    token: String,
    base_url: String,
    timeout_secs: u64,
}

impl CareerOneStopClient {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Result<Self, AppError> {
        Self::with_base_url(user_id, token, BASE_URI)
    }

    /// Point the client at a different endpoint, e.g. a local stub.
    pub fn with_base_url(
        user_id: impl Into<String>,
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            user_id: user_id.into(),
            token: token.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("invalid CareerOneStop URL: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::ConfigError("CareerOneStop URL cannot be a base".into()))?;
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        not_found_context: &str,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(not_found_context.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} from CareerOneStop",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse CareerOneStop response: {e}")))
    }

    /// Occupation detail (title, description, tasks, annual wages,
    /// education levels, video) for a code at a location.
    pub async fn occupation_detail(
        &self,
        code: &str,
        location: &str,
    ) -> Result<OccupationProfile, AppError> {
        let mut url = self.endpoint(&["v1", "occupation", &self.user_id, code, location])?;
        url.query_pairs_mut()
            .append_pair("training", "true")
            .append_pair("videos", "true")
            .append_pair("tasks", "true")
            .append_pair("wages", "true")
            .append_pair("projectedEmployment", "true");

        let body: DetailResponse = self
            .get_json(url, &format!("occupation {code}"))
            .await?;
        let detail = body
            .occupation_detail
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("occupation {code}")))?;

        Ok(OccupationProfile::from_detail(code, detail))
    }
}

impl JobSearch for CareerOneStopClient {
    async fn job_search(
        &self,
        code: &str,
        area_name: &str,
        radius_miles: u32,
        lookback_days: u32,
    ) -> Result<JobPostings, AppError> {
        let radius = radius_miles.to_string();
        let days = lookback_days.to_string();
        let url = self.endpoint(&[
            "v1", "jobsearch", &self.user_id, code, area_name, &radius, &days,
        ])?;

        let body: JobSearchResponse = self
            .get_json(url, &format!("{code} in {area_name}"))
            .await?;

        let postings = JobPostings {
            job_count: body.job_count.map(|c| c.as_u64()).unwrap_or(0),
            companies: body
                .companies
                .into_iter()
                .map(|c| CompanyPosting {
                    name: c.name,
                    job_count: c.job_count.map(|n| n.as_u64()).unwrap_or(0),
                })
                .collect(),
        };
        tracing::debug!(
            code,
            area = area_name,
            radius_miles,
            job_count = postings.job_count,
            "Fetched job postings"
        );
        Ok(postings)
    }
}

/// Occupation detail trimmed to the fields the service surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct OccupationProfile {
    pub code: String,
    pub title: String,
    pub description: String,
    pub tasks: Vec<String>,
    /// Annual wage percentiles by scope; hourly rates are dropped.
    pub wages: WageSummary,
    pub education: Vec<String>,
    pub video_url: Option<String>,
}

impl OccupationProfile {
    fn from_detail(code: &str, detail: DetailBody) -> Self {
        Self {
            code: code.to_string(),
            title: detail.title,
            description: detail.description,
            tasks: detail
                .tasks
                .into_iter()
                .filter_map(|t| t.description)
                .collect(),
            wages: detail.wages.map(WageSummary::from_lists).unwrap_or_default(),
            education: detail
                .education
                .map(|e| e.education_type.into_iter().map(|t| t.level).collect())
                .unwrap_or_default(),
            video_url: detail.video_url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WageSummary {
    pub national: Option<WagePercentiles>,
    pub state: Option<WagePercentiles>,
    pub area: Option<WagePercentiles>,
}

impl WageSummary {
    fn from_lists(lists: WageLists) -> Self {
        Self {
            national: annual_percentiles(lists.national),
            state: annual_percentiles(lists.state),
            area: annual_percentiles(lists.area),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WagePercentiles {
    pub pct_10: Option<f64>,
    pub pct_25: Option<f64>,
    pub median: Option<f64>,
    pub pct_75: Option<f64>,
    pub pct_90: Option<f64>,
}

/// The first annual-rate row of a wage list, if any.
fn annual_percentiles(rows: Vec<WageRow>) -> Option<WagePercentiles> {
    rows.into_iter()
        .find(|row| row.rate_type == "Annual")
        .map(|row| WagePercentiles {
            pct_10: row.pct_10.and_then(|v| v.as_f64()),
            pct_25: row.pct_25.and_then(|v| v.as_f64()),
            median: row.median.and_then(|v| v.as_f64()),
            pct_75: row.pct_75.and_then(|v| v.as_f64()),
            pct_90: row.pct_90.and_then(|v| v.as_f64()),
        })
}

/// A count the API may encode as a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flexible {
    Number(f64),
    Text(String),
}

impl Flexible {
    fn as_u64(&self) -> u64 {
        match self {
            Flexible::Number(n) if *n >= 0.0 => *n as u64,
            Flexible::Number(_) => 0,
            Flexible::Text(t) => t.trim().parse().unwrap_or(0),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Flexible::Number(n) => Some(*n),
            Flexible::Text(t) => t.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobSearchResponse {
    #[serde(rename = "Jobcount")]
    job_count: Option<Flexible>,
    #[serde(rename = "Companies", default)]
    companies: Vec<CompanyRow>,
}

#[derive(Debug, Deserialize)]
struct CompanyRow {
    #[serde(rename = "CompanyName", default)]
    name: String,
    #[serde(rename = "JobCount")]
    job_count: Option<Flexible>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(rename = "OccupationDetail", default)]
    occupation_detail: Vec<DetailBody>,
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    #[serde(rename = "OnetTitle", default)]
    title: String,
    #[serde(rename = "OnetDescription", default)]
    description: String,
    #[serde(rename = "Tasks", default)]
    tasks: Vec<TaskRow>,
    #[serde(rename = "Wages")]
    wages: Option<WageLists>,
    #[serde(rename = "EducationTraining")]
    education: Option<EducationTraining>,
    #[serde(rename = "COSVideoURL")]
    video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(rename = "TaskDescription")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WageLists {
    #[serde(rename = "NationalWagesList", default)]
    national: Vec<WageRow>,
    #[serde(rename = "StateWagesList", default)]
    state: Vec<WageRow>,
    #[serde(rename = "BLSAreaWagesList", default)]
    area: Vec<WageRow>,
}

#[derive(Debug, Deserialize)]
struct WageRow {
    #[serde(rename = "RateType", default)]
    rate_type: String,
    #[serde(rename = "Pct10")]
    pct_10: Option<Flexible>,
    #[serde(rename = "Pct25")]
    pct_25: Option<Flexible>,
    #[serde(rename = "Median")]
    median: Option<Flexible>,
    #[serde(rename = "Pct75")]
    pct_75: Option<Flexible>,
    #[serde(rename = "Pct90")]
    pct_90: Option<Flexible>,
}

#[derive(Debug, Deserialize)]
struct EducationTraining {
    #[serde(rename = "EducationType", default)]
    education_type: Vec<EducationType>,
}

#[derive(Debug, Deserialize)]
struct EducationType {
    #[serde(rename = "EducationLevel", default)]
    level: String,
}
