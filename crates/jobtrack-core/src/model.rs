use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Search radii (miles) tracked for every county area.
pub const RADIUS_BUCKETS: [u32; 4] = [25, 50, 75, 100];

/// Name of the national fallback area.
pub const NATIONAL_AREA: &str = "US";

/// Radius used when querying a primitive (non-county) area.
pub const DEFAULT_RADIUS: u32 = 25;

/// A calendar month used for staleness checks.
///
/// Ordering is chronological: year first, then month. Job data is refreshed
/// at most once per `Period` per area/radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The current calendar month in UTC.
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

/// Administrative level of a tracked area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    PostalCode,
    County,
    State,
    Country,
}

impl AreaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaKind::PostalCode => "postal_code",
            AreaKind::County => "county",
            AreaKind::State => "state",
            AreaKind::Country => "country",
        }
    }

    /// Map a geocoder address-component type list to an area kind.
    ///
    /// Component lists carry extra markers (e.g. "political") that are
    /// ignored; only the first recognized level wins.
    pub fn from_component_types(types: &[String]) -> Option<Self> {
        for t in types {
            match t.as_str() {
                "postal_code" => return Some(AreaKind::PostalCode),
                "administrative_area_level_2" => return Some(AreaKind::County),
                "administrative_area_level_1" => return Some(AreaKind::State),
                "country" => return Some(AreaKind::Country),
                _ => {}
            }
        }
        None
    }
}

/// A named geographic scope for which job-posting data is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Case-sensitive short name ("94123", "San Diego County", "CA", "US").
    pub name: String,
    pub kind: AreaKind,
}

impl Area {
    pub fn new(name: impl Into<String>, kind: AreaKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One employer on an area's top-10 list, from the latest fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    pub name: String,
    pub job_count: u64,
}

/// One month's job-posting measurement for an area (or area+radius).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// 1-12.
    pub month: u32,
    pub year: i32,
    pub job_count: u64,
    /// Distinct employers contributing postings.
    pub company_count: u64,
}

impl JobRecord {
    pub fn new(period: Period, job_count: u64, company_count: u64) -> Self {
        Self {
            month: period.month,
            year: period.year,
            job_count,
            company_count,
        }
    }

    /// A zero-count record for a period where the provider had no data.
    pub fn empty(period: Period) -> Self {
        Self::new(period, 0, 0)
    }

    pub fn period(&self) -> Period {
        Period::new(self.year, self.month)
    }
}

/// Job records scoped to a search radius around a county anchor point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusBucket {
    pub radius_miles: u32,
    pub records: Vec<JobRecord>,
}

impl RadiusBucket {
    pub fn new(radius_miles: u32) -> Self {
        Self {
            radius_miles,
            records: Vec::new(),
        }
    }
}

/// Appends `record` unless a record for its (month, year) already exists.
///
/// Returns true if the record was appended. Records are append-only and
/// retained indefinitely for trend reporting.
fn push_unique(records: &mut Vec<JobRecord>, record: JobRecord) -> bool {
    let period = record.period();
    if records.iter().any(|r| r.period() == period) {
        return false;
    }
    records.push(record);
    true
}

/// The latest (month, year) present in a record list.
pub fn latest_period(records: &[JobRecord]) -> Option<Period> {
    records.iter().map(JobRecord::period).max()
}

/// Job data attached to an area.
///
/// Counties track a fixed set of radius buckets plus the zip codes that all
/// map into the county (the job-search provider only accepts a zip anchor,
/// so the query zip is sampled from the aliases). Everything else holds a
/// single flat record list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaJobs {
    Primitive {
        records: Vec<JobRecord>,
    },
    County {
        zip_aliases: Vec<String>,
        buckets: Vec<RadiusBucket>,
    },
}

/// One geographic area tracked for an occupation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub area: Area,
    pub jobs: AreaJobs,
    /// Up to 10 employers, latest fetch only (not historized per month).
    pub top_employers: Vec<Employer>,
}

impl AreaEntry {
    /// A flat area (state, country, or a zip with no resolvable county).
    pub fn primitive(area: Area) -> Self {
        Self {
            area,
            jobs: AreaJobs::Primitive {
                records: Vec::new(),
            },
            top_employers: Vec::new(),
        }
    }

    /// A county area seeded with the zip codes that resolved to it.
    pub fn county(area: Area, zip_aliases: Vec<String>) -> Self {
        Self {
            area,
            jobs: AreaJobs::County {
                zip_aliases,
                buckets: RADIUS_BUCKETS.iter().map(|r| RadiusBucket::new(*r)).collect(),
            },
            top_employers: Vec::new(),
        }
    }

    /// Register another zip code that maps to this county. Returns true if
    /// the alias was not already known.
    pub fn add_zip_alias(&mut self, zip: impl Into<String>) -> bool {
        if let AreaJobs::County { zip_aliases, .. } = &mut self.jobs {
            let zip = zip.into();
            if !zip_aliases.contains(&zip) {
                zip_aliases.push(zip);
                return true;
            }
        }
        false
    }

    /// Append a record to the flat list (`radius` None) or to the matching
    /// radius bucket. Returns false if no record was written (duplicate
    /// period, unknown radius, or a radius applied to a flat area).
    pub fn push_record(&mut self, radius: Option<u32>, record: JobRecord) -> bool {
        match (&mut self.jobs, radius) {
            (AreaJobs::Primitive { records }, None) => push_unique(records, record),
            (AreaJobs::County { buckets, .. }, Some(r)) => buckets
                .iter_mut()
                .find(|b| b.radius_miles == r)
                .is_some_and(|b| push_unique(&mut b.records, record)),
            _ => false,
        }
    }
}

/// The persisted per-occupation document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationRecord {
    /// Stable occupation code (O*NET/SOC), e.g. "15-1134.00".
    pub code: String,
    /// Unique by area name.
    pub areas: Vec<AreaEntry>,
    pub last_updated: DateTime<Utc>,
}

impl OccupationRecord {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            areas: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn area(&self, name: &str) -> Option<&AreaEntry> {
        self.areas.iter().find(|e| e.area.name == name)
    }

    pub fn area_mut(&mut self, name: &str) -> Option<&mut AreaEntry> {
        self.areas.iter_mut().find(|e| e.area.name == name)
    }

    pub fn has_area(&self, name: &str) -> bool {
        self.area(name).is_some()
    }

    /// The state-level area name, if one is tracked (used as the fetch
    /// fallback scope).
    pub fn state_name(&self) -> Option<&str> {
        self.areas
            .iter()
            .find(|e| e.area.kind == AreaKind::State)
            .map(|e| e.area.name.as_str())
    }
}
