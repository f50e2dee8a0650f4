//! Catalog domain model.
//!
//! # Responsibility
//! - Define species and fish records shared by repositories and services.
//! - Own input validation rules for both record kinds.
//!
//! # Invariants
//! - Every record has a storage-assigned integer key.
//! - Species additionally carry a unique external string id.

pub mod fish;
pub mod species;
