//! Species domain model.
//!
//! # Responsibility
//! - Define species records and their list/detail projections.
//! - Validate new species input before it reaches storage.
//!
//! # Invariants
//! - `id` is the external, URL-safe identifier; it is unique and immutable.
//! - `species_id` is storage-assigned and only used for relationships.
//! - Species are never updated or deleted by this crate.

use crate::model::fish::{text_length, Fish, FishId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned surrogate key of a species row.
pub type SpeciesKey = i64;

pub const SPECIES_ID_MAX_CHARS: usize = 64;
pub const SPECIES_NAME_MAX_CHARS: usize = 500;

static SPECIES_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid species id regex"));

/// Persisted species row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub species_id: SpeciesKey,
    pub id: String,
    pub name: String,
}

/// List projection used by the species index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub id: String,
    pub name: String,
}

/// Detail projection: one species and every fish it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesWithFish {
    pub species_id: SpeciesKey,
    pub id: String,
    pub name: String,
    pub fishes: Vec<Fish>,
}

impl SpeciesWithFish {
    /// Returns the owned fish with the given key, if any.
    pub fn fish(&self, fish_id: FishId) -> Option<&Fish> {
        self.fishes.iter().find(|fish| fish.id == fish_id)
    }
}

/// Validation failure for new species input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesValidationError {
    EmptyId,
    IdTooLong { max: usize },
    InvalidId(String),
    EmptyName,
    NameTooLong { max: usize },
}

impl Display for SpeciesValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "species id must not be empty"),
            Self::IdTooLong { max } => write!(f, "species id must be at most {max} characters"),
            Self::InvalidId(value) => write!(
                f,
                "species id `{value}` may only contain letters, digits, `-` and `_`"
            ),
            Self::EmptyName => write!(f, "species name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "species name must be at most {max} characters")
            }
        }
    }
}

impl Error for SpeciesValidationError {}

/// Checks a new species' external id and display name.
///
/// # Errors
/// Returns the first violated rule, id before name.
pub fn validate_species(id: &str, name: &str) -> Result<(), SpeciesValidationError> {
    if id.is_empty() {
        return Err(SpeciesValidationError::EmptyId);
    }
    if id.chars().count() > SPECIES_ID_MAX_CHARS {
        return Err(SpeciesValidationError::IdTooLong {
            max: SPECIES_ID_MAX_CHARS,
        });
    }
    if !SPECIES_ID_RE.is_match(id) {
        return Err(SpeciesValidationError::InvalidId(id.to_string()));
    }

    if name.is_empty() {
        return Err(SpeciesValidationError::EmptyName);
    }
    if text_length(name) > SPECIES_NAME_MAX_CHARS {
        return Err(SpeciesValidationError::NameTooLong {
            max: SPECIES_NAME_MAX_CHARS,
        });
    }

    Ok(())
}
