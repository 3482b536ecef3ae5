//! Loan entity and its lifecycle.
//!
//! # Responsibility
//! - Link one student to one book until a due date.
//! - Drive the counters owned by [`Book`] and [`Student`] on activation/return.
//!
//! # Invariants
//! - `loan_id` is generated at construction, never nil, never reused.
//! - The loan holds handles (`StudentId`, `BookId`), never owned entities.
//! - States only move `Created -> Active -> Returned`; construction never
//!   activates.
//! - A failed transition performs no mutation.

use super::book::{Book, BookId};
use super::student::{Student, StudentId};
use super::validation::EntityValidationError;
use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier of a loan.
pub type LoanId = Uuid;

/// Due-date offset used by [`Loan::with_default_term`].
pub const DEFAULT_LOAN_TERM_MONTHS: u32 = 1;

/// Lifecycle position of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanState {
    /// Constructed, not counted against any book or student.
    Created,
    /// Counted: listed by the student, one copy taken from the book.
    Active,
    /// Terminal: counters released.
    Returned,
}

impl LoanState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Returned => "returned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "active" => Some(Self::Active),
            "returned" => Some(Self::Returned),
            _ => None,
        }
    }
}

/// Invalid state transition on a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanStateError {
    AlreadyActive(LoanId),
    AlreadyReturned(LoanId),
    /// Return requested on a loan that was never activated.
    NotActive(LoanId),
    BookUnavailable(BookId),
    StudentUnavailable(StudentId),
    /// The entities passed in are not the ones the loan points to.
    PartyMismatch(LoanId),
    /// The student does not list this active loan.
    NotTracked(LoanId),
}

impl Display for LoanStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive(id) => write!(f, "loan {id} is already active"),
            Self::AlreadyReturned(id) => write!(f, "loan {id} is already returned"),
            Self::NotActive(id) => write!(f, "loan {id} was never activated"),
            Self::BookUnavailable(id) => write!(f, "book {id} has no available copies"),
            Self::StudentUnavailable(id) => {
                write!(f, "student {id} has reached the active loan limit")
            }
            Self::PartyMismatch(id) => {
                write!(f, "book or student does not belong to loan {id}")
            }
            Self::NotTracked(id) => write!(f, "loan {id} is not tracked by its student"),
        }
    }
}

impl Error for LoanStateError {}

/// A lending of one book to one student.
///
/// Equality, hashing and identity use `loan_id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LoanRecord")]
pub struct Loan {
    loan_id: LoanId,
    student_id: StudentId,
    book_id: BookId,
    loan_start: NaiveDate,
    loan_end: NaiveDate,
    state: LoanState,
}

#[derive(Deserialize)]
struct LoanRecord {
    loan_id: LoanId,
    student_id: StudentId,
    book_id: BookId,
    loan_start: NaiveDate,
    loan_end: NaiveDate,
    state: LoanState,
}

impl TryFrom<LoanRecord> for Loan {
    type Error = EntityValidationError;

    fn try_from(value: LoanRecord) -> Result<Self, Self::Error> {
        Self::restore(
            value.loan_id,
            value.student_id,
            value.book_id,
            value.loan_start,
            value.loan_end,
            value.state,
        )
    }
}

impl Loan {
    /// Creates a loan starting today and due on `loan_end`.
    pub fn new(student_id: StudentId, book_id: BookId, loan_end: NaiveDate) -> Self {
        Self::with_dates(student_id, book_id, today(), loan_end)
    }

    /// Creates a loan starting today and due [`DEFAULT_LOAN_TERM_MONTHS`] later.
    pub fn with_default_term(student_id: StudentId, book_id: BookId) -> Self {
        let start = today();
        let end = start
            .checked_add_months(Months::new(DEFAULT_LOAN_TERM_MONTHS))
            .unwrap_or(NaiveDate::MAX);
        Self::with_dates(student_id, book_id, start, end)
    }

    /// Creates a loan with explicit start and due dates.
    pub fn with_dates(
        student_id: StudentId,
        book_id: BookId,
        loan_start: NaiveDate,
        loan_end: NaiveDate,
    ) -> Self {
        Self {
            loan_id: Uuid::new_v4(),
            student_id,
            book_id,
            loan_start,
            loan_end,
            state: LoanState::Created,
        }
    }

    /// Rebuilds a persisted loan with its stored id and state.
    ///
    /// Counters of the referenced entities are not touched.
    pub fn restore(
        loan_id: LoanId,
        student_id: StudentId,
        book_id: BookId,
        loan_start: NaiveDate,
        loan_end: NaiveDate,
        state: LoanState,
    ) -> Result<Self, EntityValidationError> {
        if loan_id.is_nil() {
            return Err(EntityValidationError::NilLoanId);
        }
        Ok(Self {
            loan_id,
            student_id,
            book_id,
            loan_start,
            loan_end,
            state,
        })
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn loan_start(&self) -> NaiveDate {
        self.loan_start
    }

    pub fn loan_end(&self) -> NaiveDate {
        self.loan_end
    }

    pub fn state(&self) -> LoanState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LoanState::Active
    }

    pub fn is_returned(&self) -> bool {
        self.state == LoanState::Returned
    }

    /// True when today is strictly after the due date.
    pub fn is_delay(&self) -> bool {
        self.is_delay_on(today())
    }

    /// True when `date` is strictly after the due date and the loan is still out.
    pub fn is_delay_on(&self, date: NaiveDate) -> bool {
        !self.is_returned() && date > self.loan_end
    }

    /// Whether [`Self::activate`] would succeed with these entities.
    pub fn is_activable(&self, book: &Book, student: &Student) -> bool {
        self.state == LoanState::Created
            && self.owns(book, student)
            && book.is_available_for_loan()
            && student.is_available_for_loan()
    }

    /// Moves `Created -> Active`: lists the loan on the student and takes one
    /// copy from the book.
    ///
    /// # Errors
    /// - `PartyMismatch` when `book`/`student` are not this loan's parties.
    /// - `AlreadyActive` / `AlreadyReturned` outside the `Created` state.
    /// - `BookUnavailable` / `StudentUnavailable` when either side is exhausted.
    pub fn activate(
        &mut self,
        book: &mut Book,
        student: &mut Student,
    ) -> Result<(), LoanStateError> {
        if !self.owns(book, student) {
            return Err(LoanStateError::PartyMismatch(self.loan_id));
        }
        match self.state {
            LoanState::Created => {}
            LoanState::Active => return Err(LoanStateError::AlreadyActive(self.loan_id)),
            LoanState::Returned => return Err(LoanStateError::AlreadyReturned(self.loan_id)),
        }
        if !book.is_available_for_loan() {
            return Err(LoanStateError::BookUnavailable(book.book_id().clone()));
        }
        if !student.is_available_for_loan() {
            return Err(LoanStateError::StudentUnavailable(
                student.student_id().clone(),
            ));
        }

        student.attach_loan(self.loan_id);
        book.take_copy();
        self.state = LoanState::Active;
        Ok(())
    }

    /// Moves `Active -> Returned`: releases the student slot and puts the copy
    /// back on the shelf.
    ///
    /// Returning twice is rejected, so the book counter is incremented at most
    /// once per loan.
    pub fn return_loan(
        &mut self,
        book: &mut Book,
        student: &mut Student,
    ) -> Result<(), LoanStateError> {
        if !self.owns(book, student) {
            return Err(LoanStateError::PartyMismatch(self.loan_id));
        }
        match self.state {
            LoanState::Active => {}
            LoanState::Created => return Err(LoanStateError::NotActive(self.loan_id)),
            LoanState::Returned => return Err(LoanStateError::AlreadyReturned(self.loan_id)),
        }
        if !student.has_active_loan(self.loan_id) {
            return Err(LoanStateError::NotTracked(self.loan_id));
        }

        student.detach_loan(self.loan_id);
        book.restore_copy();
        self.state = LoanState::Returned;
        Ok(())
    }

    /// Listing order: due date ascending, id as tie-break.
    pub fn listing_order(a: &Loan, b: &Loan) -> Ordering {
        a.loan_end
            .cmp(&b.loan_end)
            .then_with(|| a.loan_id.cmp(&b.loan_id))
    }

    pub(crate) fn set_loan_end(&mut self, loan_end: NaiveDate) {
        self.loan_end = loan_end;
    }

    fn owns(&self, book: &Book, student: &Student) -> bool {
        &self.book_id == book.book_id() && &self.student_id == student.student_id()
    }
}

impl PartialEq for Loan {
    fn eq(&self, other: &Self) -> bool {
        self.loan_id == other.loan_id
    }
}

impl Eq for Loan {}

impl Hash for Loan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.loan_id.hash(state);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
