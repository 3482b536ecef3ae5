//! Uniqueness-keyed registers over the library entities.
//!
//! # Responsibility
//! - Define the [`Register`] contract shared by books, students and loans.
//! - Keep one member per identity key and project sorted snapshots.
//!
//! # Invariants
//! - `modify` writes through the stored member; the member is never swapped
//!   for a new object, so every handle keeps resolving to updated values.
//! - Precondition violations surface as [`RegisterError`] values instead of
//!   silent no-ops or panics.
//! - `list` returns a fresh snapshot sorted by the entity's listing order.

pub mod book_register;
pub mod loan_register;
pub mod student_register;

use crate::model::book::BookId;
use crate::model::loan::{LoanId, LoanStateError};
use crate::model::student::StudentId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use book_register::BookRegister;
pub use loan_register::{LoanLedger, LoanRegister};
pub use student_register::StudentRegister;

pub type RegisterResult<T> = Result<T, RegisterError>;

/// Identity key of any registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "register", content = "key", rename_all = "snake_case")]
pub enum EntityKey {
    Book(BookId),
    Student(StudentId),
    Loan(LoanId),
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book(id) => write!(f, "book:{id}"),
            Self::Student(id) => write!(f, "student:{id}"),
            Self::Loan(id) => write!(f, "loan:{id}"),
        }
    }
}

/// Rejected register operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// `add` called with an item that is not unique.
    Duplicate(EntityKey),
    /// `modify`/`remove` called with a key that is not a member.
    NotFound(EntityKey),
    /// Removal blocked while active loans still reference the entity.
    InUse {
        key: EntityKey,
        active_loans: usize,
    },
    /// A loan points to a book or student that is not registered.
    UnknownParty(EntityKey),
    /// A new student already lists active loans; only activation may add them.
    PreloadedLoans {
        key: EntityKey,
        active_loans: usize,
    },
    /// The loan lifecycle refused the transition.
    Transition(LoanStateError),
}

impl Display for RegisterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(key) => write!(f, "{key} is already registered"),
            Self::NotFound(key) => write!(f, "{key} is not registered"),
            Self::InUse { key, active_loans } => {
                write!(f, "{key} is referenced by {active_loans} active loan(s)")
            }
            Self::UnknownParty(key) => write!(f, "loan references unregistered {key}"),
            Self::PreloadedLoans { key, active_loans } => write!(
                f,
                "{key} arrives with {active_loans} active loan(s) no register tracks"
            ),
            Self::Transition(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegisterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transition(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoanStateError> for RegisterError {
    fn from(value: LoanStateError) -> Self {
        Self::Transition(value)
    }
}

/// Register contract implemented once per entity type.
///
/// Callers are expected to check [`Register::is_unique`] before
/// [`Register::add`]; `add` still re-checks and returns
/// [`RegisterError::Duplicate`] rather than asserting.
pub trait Register {
    type Key: Ord + Clone;
    type Item: Clone;

    /// Inserts a unique item.
    fn add(&mut self, item: Self::Item) -> RegisterResult<()>;

    /// Copies the modifiable fields of `replacement` into the member at `key`.
    ///
    /// The member keeps its identity key and stays the same stored object.
    fn modify(&mut self, key: &Self::Key, replacement: &Self::Item) -> RegisterResult<()>;

    /// Removes the member at `key` and hands it back.
    fn remove(&mut self, key: &Self::Key) -> RegisterResult<Self::Item>;

    /// Whether `candidate` could be added without violating uniqueness.
    fn is_unique(&self, candidate: &Self::Item) -> bool;

    fn get(&self, key: &Self::Key) -> Option<&Self::Item>;

    /// Sorted snapshot; later mutations are not reflected.
    fn list(&self) -> Vec<Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }
}
