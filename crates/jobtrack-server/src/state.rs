use jobtrack_client::{CareerOneStopClient, GoogleMapsGeocoder, OnetClient};
use jobtrack_core::ReconcileEngine;
use jobtrack_db::{Database, OccupationRepository};

/// The reconciliation engine wired to the production collaborators.
pub type AppEngine = ReconcileEngine<GoogleMapsGeocoder, CareerOneStopClient, OccupationRepository>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub engine: AppEngine,
    /// Occupation-detail client, used by the career detail route.
    pub careers: CareerOneStopClient,
    pub onet: OnetClient,
    /// API key protecting the mutating endpoints.
    pub api_key: String,
}
