//! Save/load orchestration for the library aggregate.
//!
//! # Invariants
//! - The service never bypasses repository validation.
//! - Every save/load emits one `library_save`/`library_load` event.

use crate::db::{open_db, open_existing_db};
use crate::library::Library;
use crate::register::Register;
use crate::repo::{LibraryRepository, RepoResult, SqliteLibraryRepository};
use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Use-case wrapper around a [`LibraryRepository`].
pub struct LibraryService<R: LibraryRepository> {
    repo: R,
}

impl<R: LibraryRepository> LibraryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists the whole library, replacing the stored snapshot.
    pub fn save(&mut self, library: &Library) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.save_library(library);
        match &result {
            Ok(()) => info!(
                "event=library_save module=service status=ok books={} students={} loans={} duration_ms={}",
                library.books().len(),
                library.students().len(),
                library.loans().len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=library_save module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Loads the stored library; the change journal starts empty.
    pub fn load(&self) -> RepoResult<Library> {
        let started_at = Instant::now();
        let result = self.repo.load_library();
        match &result {
            Ok(library) => info!(
                "event=library_load module=service status=ok books={} students={} loans={} duration_ms={}",
                library.books().len(),
                library.students().len(),
                library.loans().len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=library_load module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

/// Opens (creating if needed) the store at `path` and saves `library` into it.
pub fn save_library_to_path(path: impl AsRef<Path>, library: &Library) -> RepoResult<()> {
    let mut conn = open_db(path)?;
    let repo = SqliteLibraryRepository::try_new(&mut conn)?;
    LibraryService::new(repo).save(library)
}

/// Opens the existing store at `path` and loads its library.
///
/// # Errors
/// - `RepoError::Db(DbError::StoreNotFound)` when no store exists at `path`.
pub fn load_library_from_path(path: impl AsRef<Path>) -> RepoResult<Library> {
    let mut conn = open_existing_db(path)?;
    let repo = SqliteLibraryRepository::try_new(&mut conn)?;
    LibraryService::new(repo).load()
}
