pub mod career_one_stop;
pub mod google_maps;
pub mod onet;

pub use career_one_stop::{CareerOneStopClient, OccupationProfile, WagePercentiles, WageSummary};
pub use google_maps::GoogleMapsGeocoder;
pub use onet::{OccupationMatch, OnetClient};
