//! Fish repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, read, fully replace and delete fish rows.
//!
//! # Invariants
//! - `add_fish` resolves the species key inside the insert statement, so the
//!   existence check and the write are one atomic step.
//! - Write paths call `FishData::validate()` before any SQL mutation.
//! - Update/delete of an unknown id is not an error; callers read the
//!   returned row count.

use super::{ensure_catalog_connection_ready, is_reference_violation};
use super::{ConstraintViolation, RepoError, RepoResult};
use crate::model::fish::{Fish, FishData, FishId};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for fish CRUD operations.
pub trait FishRepository {
    /// Inserts a fish under the species with external id `species_id`.
    fn add_fish(&self, species_id: &str, data: &FishData) -> RepoResult<Fish>;
    /// Loads one fish by surrogate key.
    fn get_fish(&self, fish_id: FishId) -> RepoResult<Option<Fish>>;
    /// Overwrites all three text fields; returns rows affected.
    fn update_fish(&self, fish_id: FishId, data: &FishData) -> RepoResult<usize>;
    /// Deletes one fish; returns rows affected.
    fn delete_fish(&self, fish_id: FishId) -> RepoResult<usize>;
}

/// SQLite-backed fish repository.
pub struct SqliteFishRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFishRepository<'conn> {
    /// Constructs a repository from a connection prepared by `open_db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FishRepository for SqliteFishRepository<'_> {
    fn add_fish(&self, species_id: &str, data: &FishData) -> RepoResult<Fish> {
        data.validate()?;

        // Unknown species -> subquery yields NULL -> NOT NULL constraint fails.
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO fishes (species_id, name, description, habitat)
             VALUES (
                (SELECT species_id FROM fish_species WHERE id = ?1),
                ?2, ?3, ?4
             )
             RETURNING id, species_id, name, description, habitat;",
        )?;

        match stmt.query_row(
            params![
                species_id,
                data.name.as_str(),
                data.description.as_str(),
                data.habitat.as_str(),
            ],
            parse_fish_row,
        ) {
            Ok(fish) => Ok(fish),
            Err(err) if is_reference_violation(&err) => Err(RepoError::Constraint(
                ConstraintViolation::UnknownSpecies(species_id.to_string()),
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn get_fish(&self, fish_id: FishId) -> RepoResult<Option<Fish>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, species_id, name, description, habitat
             FROM fishes
             WHERE id = ?1;",
        )?;
        let fish = stmt.query_row([fish_id], parse_fish_row).optional()?;
        Ok(fish)
    }

    fn update_fish(&self, fish_id: FishId, data: &FishData) -> RepoResult<usize> {
        data.validate()?;

        let changed = self.conn.execute(
            "UPDATE fishes
             SET
                name = ?1,
                description = ?2,
                habitat = ?3
             WHERE id = ?4;",
            params![
                data.name.as_str(),
                data.description.as_str(),
                data.habitat.as_str(),
                fish_id,
            ],
        )?;
        Ok(changed)
    }

    fn delete_fish(&self, fish_id: FishId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM fishes WHERE id = ?1;", [fish_id])?;
        Ok(changed)
    }
}

pub(super) fn parse_fish_row(row: &Row<'_>) -> rusqlite::Result<Fish> {
    Ok(Fish {
        id: row.get("id")?,
        species_id: row.get("species_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        habitat: row.get("habitat")?,
    })
}
