pub mod config;
pub mod database;
pub mod occupation_repository;
pub mod program_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use occupation_repository::OccupationRepository;
pub use program_repository::ProgramRepository;
