use std::time::Duration;

use jobtrack_core::error::AppError;
use jobtrack_core::traits::{AddressComponent, Geocoder};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const GEOCODE_URI: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Geocoder backed by the Google Maps Geocoding API.
///
/// Exposes the address components of the best (first) match for a keyword.
/// `ZERO_RESULTS` maps to [`AppError::NotFound`] so callers can distinguish
/// an unknown location from a provider outage.
#[derive(Clone)]
pub struct GoogleMapsGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl GoogleMapsGeocoder {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        Self::with_base_url(api_key, GEOCODE_URI)
    }

    /// Point the client at a different endpoint, e.g. a local stub.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        })
    }

    fn request_url(&self, keyword: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("invalid geocode URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("address", keyword)
            .append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl Geocoder for GoogleMapsGeocoder {
    async fn geocode(&self, keyword: &str) -> Result<Vec<AddressComponent>, AppError> {
        let url = self.request_url(keyword)?;
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} from geocoding API",
                status.as_u16()
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse geocode response: {e}")))?;

        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => {
                return Err(AppError::NotFound(format!("no geocode results for {keyword}")));
            }
            other => {
                return Err(AppError::HttpError(format!("geocoding API status {other}")));
            }
        }

        let components = body
            .results
            .into_iter()
            .next()
            .map(|r| r.address_components)
            .unwrap_or_default();
        tracing::debug!(keyword, count = components.len(), "Geocoded keyword");

        Ok(components
            .into_iter()
            .map(|c| AddressComponent {
                short_name: c.short_name,
                types: c.types,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<GeocodeComponent>,
}

#[derive(Debug, Deserialize)]
struct GeocodeComponent {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}
