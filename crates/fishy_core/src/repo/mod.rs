//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define species/fish data access contracts.
//! - Isolate SQL details from service orchestration.
//! - Translate SQLite constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Lookups report absence as `None`, never as an error.
//! - Repositories only accept connections whose schema is ensured.

use crate::db::schema::latest_version;
use crate::db::DbError;
use crate::model::fish::FishValidationError;
use crate::model::species::SpeciesValidationError;
use rusqlite::{ffi, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod fish_repo;
pub mod species_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level constraint rejection surfaced to callers as a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Another species already uses this external id.
    DuplicateSpeciesId(String),
    /// No species has this external id, so a fish cannot reference it.
    UnknownSpecies(String),
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSpeciesId(id) => write!(f, "species id already exists: {id}"),
            Self::UnknownSpecies(id) => write!(f, "species not found: {id}"),
        }
    }
}

/// Error for species/fish persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Constraint(ConstraintViolation),
    Validation(FishValidationError),
    InvalidSpecies(SpeciesValidationError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Whether storage refused the write because of a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(violation) => write!(f, "constraint violation: {violation}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSpecies(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidSpecies(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<FishValidationError> for RepoError {
    fn from(value: FishValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SpeciesValidationError> for RepoError {
    fn from(value: SpeciesValidationError) -> Self {
        Self::InvalidSpecies(value)
    }
}

/// Returns the extended result code when `err` is a constraint failure.
fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(failure.extended_code)
        }
        _ => None,
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_code(err),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

fn is_reference_violation(err: &rusqlite::Error) -> bool {
    matches!(
        constraint_code(err),
        Some(ffi::SQLITE_CONSTRAINT_NOTNULL) | Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
    )
}

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("fish_species", &["species_id", "id", "name"]),
    (
        "fishes",
        &["id", "species_id", "name", "description", "habitat"],
    ),
];

/// Verifies the connection went through schema setup and has catalog tables.
fn ensure_catalog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{is_reference_violation, is_unique_violation, ConstraintViolation, RepoError};
    use rusqlite::Connection;

    fn constraint_error(sql: &str) -> rusqlite::Error {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY, code TEXT UNIQUE NOT NULL);
             INSERT INTO parent (code) VALUES ('a');",
        )
        .unwrap();
        conn.execute_batch(sql).unwrap_err()
    }

    #[test]
    fn classifies_unique_and_not_null_failures() {
        let unique = constraint_error("INSERT INTO parent (code) VALUES ('a');");
        assert!(is_unique_violation(&unique));
        assert!(!is_reference_violation(&unique));

        let not_null = constraint_error("INSERT INTO parent (code) VALUES (NULL);");
        assert!(is_reference_violation(&not_null));
        assert!(!is_unique_violation(&not_null));
    }

    #[test]
    fn constraint_errors_render_readable_messages() {
        let err = RepoError::Constraint(ConstraintViolation::UnknownSpecies("pike".to_string()));
        assert!(err.is_constraint_violation());
        assert_eq!(err.to_string(), "constraint violation: species not found: pike");
    }
}
