//! Core domain logic for the university library registry.
//! This crate is the single source of truth for lending invariants.

pub mod db;
pub mod library;
pub mod logging;
pub mod model;
pub mod register;
pub mod repo;
pub mod search;
pub mod service;

pub use library::{ChangeAction, IntegrityError, Library, LibraryChange};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::book::{Book, BookId, BOOK_ID_LEN};
pub use model::loan::{Loan, LoanId, LoanState, LoanStateError, DEFAULT_LOAN_TERM_MONTHS};
pub use model::student::{
    Student, StudentId, INSTITUTIONAL_EMAIL_SUFFIX, MAX_ACTIVE_LOANS, STUDENT_ID_LEN,
};
pub use model::EntityValidationError;
pub use register::{
    BookRegister, EntityKey, LoanLedger, LoanRegister, Register, RegisterError, RegisterResult,
    StudentRegister,
};
pub use repo::{LibraryRepository, RepoError, RepoResult, SqliteLibraryRepository};
pub use search::filter::{
    loanable_books, loanable_students, search_books, search_loans, search_students, LoanQuery,
    LoanStatusFilter,
};
pub use service::library_service::{load_library_from_path, save_library_to_path, LibraryService};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
