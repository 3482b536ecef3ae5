//! Construction-time validation errors shared by all entities.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raised when an entity constructor rejects its raw field values.
///
/// Every variant is a fail-fast rejection: no entity is ever built in a
/// partially valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// `bookId` must be exactly 13 characters.
    InvalidBookId { length: usize },
    /// `studentId` must be exactly 10 characters.
    InvalidStudentId { length: usize },
    NegativePublishmentYear(i64),
    NegativeAvailableCopies(i64),
    /// A book needs at least one author.
    MissingAuthors,
    /// Author at `position` is empty or whitespace only.
    BlankAuthor { position: usize },
    /// Email does not end with the institutional suffix.
    InvalidEmail { suffix: &'static str },
    /// Active-loan list exceeds the per-student capacity.
    TooManyActiveLoans { count: usize, max: usize },
    /// The same loan id appears twice in an active-loan list.
    DuplicateActiveLoan(String),
    /// Nil UUID is reserved and never identifies a loan.
    NilLoanId,
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBookId { length } => {
                write!(f, "book id must be exactly 13 characters, got {length}")
            }
            Self::InvalidStudentId { length } => {
                write!(f, "student id must be exactly 10 characters, got {length}")
            }
            Self::NegativePublishmentYear(year) => {
                write!(f, "publishment year must be >= 0, got {year}")
            }
            Self::NegativeAvailableCopies(copies) => {
                write!(f, "available copies must be >= 0, got {copies}")
            }
            Self::MissingAuthors => write!(f, "book must have at least one author"),
            Self::BlankAuthor { position } => {
                write!(f, "author at position {position} must not be blank")
            }
            Self::InvalidEmail { suffix } => write!(f, "email must end with `{suffix}`"),
            Self::TooManyActiveLoans { count, max } => {
                write!(f, "student holds {count} active loans, at most {max} allowed")
            }
            Self::DuplicateActiveLoan(loan_id) => {
                write!(f, "loan {loan_id} listed twice among active loans")
            }
            Self::NilLoanId => write!(f, "loan id must not be nil"),
        }
    }
}

impl Error for EntityValidationError {}
