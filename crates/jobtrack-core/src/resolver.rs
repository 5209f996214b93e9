//! Resolves location keywords to the administrative hierarchy of areas
//! tracked for an occupation.
//!
//! A keyword (zip code, city, state name) is geocoded once and expanded to
//! its postal-code/state/country components; the county level is derived
//! separately via [`AreaResolver::county_of`] since counties are tracked as
//! their own entry with zip aliases. Geocode responses are cached, so
//! repeated reconciliations of nearby occupations don't re-query the
//! provider for the same keyword.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::AppError;
use crate::model::{Area, AreaKind};
use crate::traits::{AddressComponent, Geocoder};

/// Component types excluded from top-level resolution: too fine-grained to
/// track (locality, neighborhood), or handled separately (county).
const EXCLUDED_TYPES: [&str; 3] = [
    "locality",
    "neighborhood",
    "administrative_area_level_2",
];

const CACHE_CAPACITY: u64 = 1024;
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Keyword-to-area resolution over a [`Geocoder`] collaborator.
#[derive(Clone)]
pub struct AreaResolver<G: Geocoder> {
    geocoder: G,
    cache: Cache<String, Arc<Vec<AddressComponent>>>,
}

impl<G: Geocoder> AreaResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Geocode a keyword, serving repeats from the cache. Errors are not
    /// cached.
    async fn components(&self, keyword: &str) -> Result<Arc<Vec<AddressComponent>>, AppError> {
        let geocoder = self.geocoder.clone();
        let key = keyword.to_string();
        self.cache
            .try_get_with(key.clone(), async move {
                geocoder.geocode(&key).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<AppError>| match e.as_ref() {
                AppError::NotFound(msg) => AppError::NotFound(msg.clone()),
                other => AppError::Generic(other.to_string()),
            })
    }

    /// Expand a keyword to its trackable hierarchy components, excluding
    /// locality/neighborhood granularity and bare county components, and
    /// deduplicating by short name against `known` areas.
    pub async fn resolve(&self, keyword: &str, known: &[Area]) -> Result<Vec<Area>, AppError> {
        let components = self.components(keyword).await?;

        let mut resolved: Vec<Area> = Vec::new();
        for component in components.iter() {
            if EXCLUDED_TYPES.iter().any(|t| component.has_type(t)) {
                continue;
            }
            let Some(kind) = AreaKind::from_component_types(&component.types) else {
                continue;
            };
            let name = component.short_name.as_str();
            if known.iter().any(|a| a.name == name)
                || resolved.iter().any(|a| a.name == name)
            {
                continue;
            }
            resolved.push(Area::new(name, kind));
        }

        tracing::debug!(keyword, count = resolved.len(), "Resolved areas");
        Ok(resolved)
    }

    /// The county component for a keyword, or `None` when the provider has
    /// no county at that location. Callers fall back to treating the raw
    /// keyword as the area name.
    pub async fn county_of(&self, keyword: &str) -> Result<Option<Area>, AppError> {
        self.component_of(keyword, "administrative_area_level_2", AreaKind::County)
            .await
    }

    /// The state component for a keyword, or `None` when the provider has
    /// no state at that location.
    pub async fn state_of(&self, keyword: &str) -> Result<Option<Area>, AppError> {
        self.component_of(keyword, "administrative_area_level_1", AreaKind::State)
            .await
    }

    async fn component_of(
        &self,
        keyword: &str,
        component_type: &str,
        kind: AreaKind,
    ) -> Result<Option<Area>, AppError> {
        let components = match self.components(keyword).await {
            Ok(c) => c,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(components
            .iter()
            .find(|c| c.has_type(component_type))
            .map(|c| Area::new(c.short_name.clone(), kind)))
    }
}
