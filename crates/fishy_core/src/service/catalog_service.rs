//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide the species index/page and the fish create, edit and delete
//!   workflows as plain use-case calls.
//! - Return typed outcomes so front ends pick their own presentation.
//!
//! # Invariants
//! - An unknown species short-circuits every workflow before validation.
//! - Invalid payloads are rejected with per-field messages before any write.
//! - A fish addressed through a species must belong to that species.

use crate::model::fish::{Fish, FishData, FishId, FishPayload};
use crate::model::species::{Species, SpeciesSummary, SpeciesWithFish};
use crate::repo::fish_repo::FishRepository;
use crate::repo::species_repo::SpeciesRepository;
use crate::repo::{ConstraintViolation, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogServiceError>;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogServiceError {
    /// Species external id is already taken.
    DuplicateSpecies(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSpecies(id) => write!(f, "species already exists: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::DuplicateSpecies(_) => None,
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Constraint(ConstraintViolation::DuplicateSpeciesId(id)) => {
                Self::DuplicateSpecies(id)
            }
            other => Self::Repo(other),
        }
    }
}

/// Invalid submission echoed back to the caller for re-display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFish {
    /// Messages in field order.
    pub errors: Vec<String>,
    /// Payload exactly as submitted.
    pub payload: FishPayload,
}

/// Result of submitting the new-fish form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewFishOutcome {
    SpeciesNotFound,
    Rejected(RejectedFish),
    Created(Fish),
}

/// Result of editing or deleting an existing fish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FishChangeOutcome {
    SpeciesNotFound,
    FishNotFound,
    Rejected(RejectedFish),
    /// Rows affected by the write.
    Applied(usize),
}

/// Data needed to render an edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFishForm {
    pub species: SpeciesWithFish,
    pub fish: Fish,
}

/// Catalog service facade over species and fish repositories.
pub struct CatalogService<S: SpeciesRepository, F: FishRepository> {
    species: S,
    fish: F,
}

impl<S: SpeciesRepository, F: FishRepository> CatalogService<S, F> {
    /// Creates a service using the provided repository implementations.
    pub fn new(species: S, fish: F) -> Self {
        Self { species, fish }
    }

    /// Lists every species for the index page.
    pub fn species_index(&self) -> CatalogResult<Vec<SpeciesSummary>> {
        Ok(self.species.list_species_summaries()?)
    }

    /// Loads one species with its fish; `None` when unknown.
    pub fn species_page(&self, species_id: &str) -> CatalogResult<Option<SpeciesWithFish>> {
        Ok(self.species.get_species_with_fish(species_id)?)
    }

    /// Registers a new species.
    pub fn add_species(&self, species_id: &str, name: &str) -> CatalogResult<Species> {
        let species = self.species.add_species(species_id, name)?;
        info!(
            "event=species_add module=service status=ok species_id={} key={}",
            species.id, species.species_id
        );
        Ok(species)
    }

    /// Handles a new-fish submission.
    ///
    /// # Contract
    /// - Unknown species -> `SpeciesNotFound`, payload is not validated.
    /// - Invalid payload -> `Rejected` with messages, nothing is written.
    /// - Otherwise the fish is inserted and returned.
    pub fn submit_new_fish(
        &self,
        species_id: &str,
        payload: FishPayload,
    ) -> CatalogResult<NewFishOutcome> {
        if !self.species.species_exists(species_id)? {
            warn!("event=fish_submit module=service status=species_not_found species_id={species_id}");
            return Ok(NewFishOutcome::SpeciesNotFound);
        }

        let data = match checked_data(payload) {
            Ok(data) => data,
            Err(rejected) => {
                info!(
                    "event=fish_submit module=service status=rejected species_id={} error_count={}",
                    species_id,
                    rejected.errors.len()
                );
                return Ok(NewFishOutcome::Rejected(rejected));
            }
        };

        match self.fish.add_fish(species_id, &data) {
            Ok(fish) => {
                info!(
                    "event=fish_submit module=service status=created species_id={} fish_id={}",
                    species_id, fish.id
                );
                Ok(NewFishOutcome::Created(fish))
            }
            Err(RepoError::Constraint(ConstraintViolation::UnknownSpecies(_))) => {
                warn!("event=fish_submit module=service status=species_not_found species_id={species_id}");
                Ok(NewFishOutcome::SpeciesNotFound)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Loads the species and fish shown on the edit form.
    ///
    /// Returns `None` when the species is unknown or the fish is not one of
    /// its fish.
    pub fn edit_fish_form(
        &self,
        species_id: &str,
        fish_id: FishId,
    ) -> CatalogResult<Option<EditFishForm>> {
        let Some(species) = self.species.get_species_with_fish(species_id)? else {
            return Ok(None);
        };
        let Some(fish) = species.fish(fish_id).cloned() else {
            return Ok(None);
        };
        Ok(Some(EditFishForm { species, fish }))
    }

    /// Handles an edit submission; all three fields are replaced together.
    pub fn submit_fish_edit(
        &self,
        species_id: &str,
        fish_id: FishId,
        payload: FishPayload,
    ) -> CatalogResult<FishChangeOutcome> {
        if let Some(outcome) = self.check_ownership(species_id, fish_id)? {
            return Ok(outcome);
        }

        let data = match checked_data(payload) {
            Ok(data) => data,
            Err(rejected) => {
                info!(
                    "event=fish_edit module=service status=rejected fish_id={} error_count={}",
                    fish_id,
                    rejected.errors.len()
                );
                return Ok(FishChangeOutcome::Rejected(rejected));
            }
        };

        let rows = self.fish.update_fish(fish_id, &data)?;
        info!("event=fish_edit module=service status=ok fish_id={fish_id} rows={rows}");
        Ok(FishChangeOutcome::Applied(rows))
    }

    /// Deletes one fish of the given species.
    pub fn delete_fish(&self, species_id: &str, fish_id: FishId) -> CatalogResult<FishChangeOutcome> {
        if let Some(outcome) = self.check_ownership(species_id, fish_id)? {
            return Ok(outcome);
        }

        let rows = self.fish.delete_fish(fish_id)?;
        info!("event=fish_delete module=service status=ok fish_id={fish_id} rows={rows}");
        Ok(FishChangeOutcome::Applied(rows))
    }

    /// Returns an early outcome unless `fish_id` is a fish of `species_id`.
    fn check_ownership(
        &self,
        species_id: &str,
        fish_id: FishId,
    ) -> CatalogResult<Option<FishChangeOutcome>> {
        let Some(species) = self.species.get_species(species_id)? else {
            warn!("event=fish_lookup module=service status=species_not_found species_id={species_id}");
            return Ok(Some(FishChangeOutcome::SpeciesNotFound));
        };

        match self.fish.get_fish(fish_id)? {
            Some(fish) if fish.species_id == species.species_id => Ok(None),
            _ => {
                warn!(
                    "event=fish_lookup module=service status=fish_not_found species_id={species_id} fish_id={fish_id}"
                );
                Ok(Some(FishChangeOutcome::FishNotFound))
            }
        }
    }
}

fn checked_data(payload: FishPayload) -> Result<FishData, RejectedFish> {
    payload.clone().into_fish_data().map_err(|err| RejectedFish {
        errors: err.messages(),
        payload,
    })
}
