use std::time::Duration;

use jobtrack_core::error::AppError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

const BASE_URI: &str = "https://services.onetcenter.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Keyword search hits below this relevance score are discarded.
const RELEVANCE_SCORE_CAP: f64 = 50.0;

/// O*NET Web Services client.
///
/// Fetches the technical skills associated with an occupation code, and
/// searches occupations by keyword (used to link academic programs to the
/// careers they feed into).
#[derive(Clone)]
pub struct OnetClient {
    client: Client,
    /// Full `Authorization` header value (the service uses HTTP Basic).
    authorization: String,
    base_url: String,
    timeout_secs: u64,
}

/// One occupation hit from a keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupationMatch {
    pub code: String,
    pub title: String,
}

impl OnetClient {
    pub fn new(authorization: impl Into<String>) -> Result<Self, AppError> {
        Self::with_base_url(authorization, BASE_URI)
    }

    pub fn with_base_url(
        authorization: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            authorization: authorization.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        })
    }

    /// Flattened technical-skill names for an occupation code. An
    /// occupation without a technology listing yields an empty vec.
    pub async fn technical_skills(&self, code: &str) -> Result<Vec<String>, AppError> {
        let url = self.endpoint(&["ws", "mnm", "careers", code, "technology"])?;
        let body: TechnologyResponse = self.get_json(url).await?;

        let skills: Vec<String> = body
            .category
            .into_iter()
            .flat_map(|c| c.example)
            .map(|e| e.name)
            .collect();
        tracing::debug!(code, count = skills.len(), "Fetched technical skills");
        Ok(skills)
    }

    /// Occupations matching a keyword, filtered to relevant hits.
    ///
    /// The search endpoint pages its results; when the first page reports
    /// more hits than it carries, the query is re-issued for the full range.
    pub async fn search_occupations(
        &self,
        keyword: &str,
    ) -> Result<Vec<OccupationMatch>, AppError> {
        let mut url = self.endpoint(&["ws", "online", "search"])?;
        url.query_pairs_mut().append_pair("keyword", keyword);

        let mut body: SearchResponse = self.get_json(url.clone()).await?;
        if body.total as usize > body.occupation.len() {
            url.query_pairs_mut()
                .append_pair("start", "1")
                .append_pair("end", &body.total.to_string());
            body = self.get_json(url).await?;
        }

        let matches = relevant_matches(body);
        tracing::debug!(keyword, count = matches.len(), "Occupation search complete");
        Ok(matches)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("invalid O*NET URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError("O*NET URL cannot be a base".into()))?
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, AppError> {
        let path = url.path().to_string();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .header(reqwest::header::ACCEPT, "application/json")
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
            return Err(AppError::NotFound(format!("{path} on O*NET")));
        }
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} from O*NET",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse O*NET response: {e}")))
    }
}

fn relevant_matches(body: SearchResponse) -> Vec<OccupationMatch> {
    body.occupation
        .into_iter()
        .filter(|hit| hit.relevance_score > RELEVANCE_SCORE_CAP)
        .map(|hit| OccupationMatch {
            code: hit.code,
            title: hit.title,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct TechnologyResponse {
    #[serde(default)]
    category: Vec<TechnologyCategory>,
}

#[derive(Debug, Deserialize)]
struct TechnologyCategory {
    #[serde(default)]
    example: Vec<TechnologyExample>,
}

#[derive(Debug, Deserialize)]
struct TechnologyExample {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    occupation: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    code: String,
    title: String,
    #[serde(default)]
    relevance_score: f64,
}
