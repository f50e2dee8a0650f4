//! Species repository contract and SQLite implementation.
//!
//! # Responsibility
//! - List species, load one species with its fish, check existence.
//! - Create species addressed by a unique external id.
//!
//! # Invariants
//! - External ids are unique; duplicates surface as
//!   `ConstraintViolation::DuplicateSpeciesId`.
//! - No update or delete path exists, so a species with fish can never be
//!   removed through this crate.

use super::{ensure_catalog_connection_ready, is_unique_violation};
use super::{ConstraintViolation, RepoError, RepoResult};
use crate::model::fish::Fish;
use crate::model::species::{
    validate_species, Species, SpeciesKey, SpeciesSummary, SpeciesWithFish,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for species read/create operations.
pub trait SpeciesRepository {
    /// Lists `{id, name}` for every species, oldest first.
    fn list_species_summaries(&self) -> RepoResult<Vec<SpeciesSummary>>;
    /// Loads one species row; `None` when the id is unknown.
    fn get_species(&self, id: &str) -> RepoResult<Option<Species>>;
    /// Loads one species and all of its fish; `None` when the id is unknown.
    fn get_species_with_fish(&self, id: &str) -> RepoResult<Option<SpeciesWithFish>>;
    /// Read-only existence check by external id.
    fn species_exists(&self, id: &str) -> RepoResult<bool>;
    /// Creates a species and returns the stored row.
    fn add_species(&self, id: &str, name: &str) -> RepoResult<Species>;
}

/// SQLite-backed species repository.
pub struct SqliteSpeciesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSpeciesRepository<'conn> {
    /// Constructs a repository from a connection prepared by `open_db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SpeciesRepository for SqliteSpeciesRepository<'_> {
    fn list_species_summaries(&self) -> RepoResult<Vec<SpeciesSummary>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM fish_species ORDER BY species_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(SpeciesSummary {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(summaries)
    }

    fn get_species(&self, id: &str) -> RepoResult<Option<Species>> {
        find_species(self.conn, id)
    }

    fn get_species_with_fish(&self, id: &str) -> RepoResult<Option<SpeciesWithFish>> {
        let Some(species) = find_species(self.conn, id)? else {
            return Ok(None);
        };

        let fishes = load_fishes_for_species(self.conn, species.species_id)?;
        Ok(Some(SpeciesWithFish {
            species_id: species.species_id,
            id: species.id,
            name: species.name,
            fishes,
        }))
    }

    fn species_exists(&self, id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM fish_species
                WHERE id = ?1
            );",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn add_species(&self, id: &str, name: &str) -> RepoResult<Species> {
        validate_species(id, name)?;

        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO fish_species (id, name)
             VALUES (?1, ?2)
             RETURNING species_id, id, name;",
        )?;

        match stmt.query_row(params![id, name], parse_species_row) {
            Ok(species) => Ok(species),
            Err(err) if is_unique_violation(&err) => Err(RepoError::Constraint(
                ConstraintViolation::DuplicateSpeciesId(id.to_string()),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

fn find_species(conn: &Connection, id: &str) -> RepoResult<Option<Species>> {
    let mut stmt = conn.prepare_cached(
        "SELECT species_id, id, name
         FROM fish_species
         WHERE id = ?1;",
    )?;
    let species = stmt.query_row([id], parse_species_row).optional()?;
    Ok(species)
}

fn load_fishes_for_species(conn: &Connection, species_id: SpeciesKey) -> RepoResult<Vec<Fish>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, species_id, name, description, habitat
         FROM fishes
         WHERE species_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([species_id])?;
    let mut fishes = Vec::new();
    while let Some(row) = rows.next()? {
        fishes.push(super::fish_repo::parse_fish_row(row)?);
    }
    Ok(fishes)
}

fn parse_species_row(row: &Row<'_>) -> rusqlite::Result<Species> {
    Ok(Species {
        species_id: row.get("species_id")?,
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
