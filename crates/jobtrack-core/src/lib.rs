pub mod error;
pub mod fetch;
pub mod model;
pub mod program;
pub mod reconcile;
pub mod resolver;
pub mod testutil;
pub mod throttle;
pub mod traits;

pub use error::AppError;
pub use fetch::{JobCountFetcher, JobFigures};
pub use model::{Area, AreaEntry, AreaKind, JobRecord, OccupationRecord, Period};
pub use program::{Program, ProgramCareer};
pub use reconcile::{ReconcileConfig, ReconcileEngine, ReconcileReport};
pub use resolver::AreaResolver;
pub use throttle::Throttler;
pub use traits::{Geocoder, JobSearch, OccupationStore};
