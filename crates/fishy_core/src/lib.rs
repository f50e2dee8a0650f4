//! Core data access for the fish species catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CatalogConfig;
pub use db::{ensure_schema, open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::fish::{
    validate_fish_data, FieldValue, Fish, FishData, FishField, FishFieldError,
    FishFieldErrorKind, FishId, FishPayload, FishValidationError,
};
pub use model::species::{
    validate_species, Species, SpeciesKey, SpeciesSummary, SpeciesValidationError,
    SpeciesWithFish,
};
pub use repo::fish_repo::{FishRepository, SqliteFishRepository};
pub use repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
pub use repo::{ConstraintViolation, RepoError, RepoResult};
pub use service::catalog_service::{
    CatalogResult, CatalogService, CatalogServiceError, EditFishForm, FishChangeOutcome,
    NewFishOutcome, RejectedFish,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
