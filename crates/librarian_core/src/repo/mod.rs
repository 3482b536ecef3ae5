//! Repository layer over the SQLite library store.
//!
//! # Responsibility
//! - Define the persistence contract for a whole [`crate::Library`].
//! - Keep SQL details out of the aggregate and service code.
//!
//! # Invariants
//! - Loaded entities go through their validating constructors.
//! - A loaded library passes `Library::check_integrity` or the load fails.

use crate::db::DbError;
use crate::library::IntegrityError;
use crate::model::EntityValidationError;
use crate::register::RegisterError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod library_repo;

pub use library_repo::{LibraryRepository, SqliteLibraryRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for library persistence.
#[derive(Debug)]
pub enum RepoError {
    /// A stored row no longer satisfies entity validation.
    Validation(EntityValidationError),
    /// Stored rows collide inside a register.
    Register(RegisterError),
    /// Stored registers disagree with each other.
    Integrity(IntegrityError),
    Db(DbError),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid stored entity: {err}"),
            Self::Register(err) => write!(f, "{err}"),
            Self::Integrity(err) => write!(f, "inconsistent library store: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "library store is missing table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted library data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Register(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<EntityValidationError> for RepoError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RegisterError> for RepoError {
    fn from(value: RegisterError) -> Self {
        Self::Register(value)
    }
}

impl From<IntegrityError> for RepoError {
    fn from(value: IntegrityError) -> Self {
        Self::Integrity(value)
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
