//! Student entity.
//!
//! # Responsibility
//! - Hold borrower identity and contact data.
//! - Track the loans currently counted against the borrower's quota.
//!
//! # Invariants
//! - `student_id` is exactly [`STUDENT_ID_LEN`] characters and never changes.
//! - `email` ends with [`INSTITUTIONAL_EMAIL_SUFFIX`].
//! - `active_loans.len() <= MAX_ACTIVE_LOANS`; only loan activation/return
//!   touches the list.

use super::loan::LoanId;
use super::validation::EntityValidationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Required length of a student identity key.
pub const STUDENT_ID_LEN: usize = 10;
/// Every student email must end with this suffix.
pub const INSTITUTIONAL_EMAIL_SUFFIX: &str = "@studenti.unisa.it";
/// Loan quota per student.
pub const MAX_ACTIVE_LOANS: usize = 3;

/// Immutable identity key of a [`Student`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    /// Parses a student id, rejecting anything that is not exactly 10 characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, EntityValidationError> {
        let value = value.into();
        let length = value.chars().count();
        if length != STUDENT_ID_LEN {
            return Err(EntityValidationError::InvalidStudentId { length });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StudentId {
    type Error = EntityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StudentId> for String {
    fn from(value: StudentId) -> Self {
        value.0
    }
}

impl Display for StudentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered borrower.
///
/// Equality and hashing use `student_id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StudentRecord")]
pub struct Student {
    name: String,
    surname: String,
    student_id: StudentId,
    email: String,
    active_loans: Vec<LoanId>,
}

#[derive(Deserialize)]
struct StudentRecord {
    name: String,
    surname: String,
    student_id: String,
    email: String,
    #[serde(default)]
    active_loans: Vec<LoanId>,
}

impl TryFrom<StudentRecord> for Student {
    type Error = EntityValidationError;

    fn try_from(value: StudentRecord) -> Result<Self, Self::Error> {
        let mut student = Self::new(value.name, value.surname, value.student_id, value.email)?;
        student.restore_active_loans(value.active_loans)?;
        Ok(student)
    }
}

impl Student {
    /// Builds a fully validated student with no active loans.
    ///
    /// # Errors
    /// - `InvalidStudentId` when `student_id` is not 10 characters.
    /// - `InvalidEmail` when `email` lacks the institutional suffix.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        student_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, EntityValidationError> {
        let student_id = StudentId::parse(student_id)?;
        let email = email.into();
        if !email.ends_with(INSTITUTIONAL_EMAIL_SUFFIX) {
            return Err(EntityValidationError::InvalidEmail {
                suffix: INSTITUTIONAL_EMAIL_SUFFIX,
            });
        }

        Ok(Self {
            name: name.into(),
            surname: surname.into(),
            student_id,
            email,
            active_loans: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Loans counted against this student, in activation order.
    pub fn active_loans(&self) -> &[LoanId] {
        &self.active_loans
    }

    pub fn has_active_loan(&self, loan_id: LoanId) -> bool {
        self.active_loans.contains(&loan_id)
    }

    /// A student can borrow while under the [`MAX_ACTIVE_LOANS`] quota.
    pub fn is_available_for_loan(&self) -> bool {
        self.active_loans.len() < MAX_ACTIVE_LOANS
    }

    /// Copies name, surname and email from `other`.
    ///
    /// The id and the active-loan list are never copied.
    pub fn copy_from(&mut self, other: &Student) {
        self.name.clone_from(&other.name);
        self.surname.clone_from(&other.surname);
        self.email.clone_from(&other.email);
    }

    /// Listing order: surname, then name, then id.
    pub fn listing_order(a: &Student, b: &Student) -> Ordering {
        a.surname
            .cmp(&b.surname)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.student_id.cmp(&b.student_id))
    }

    /// Caller must have checked [`Self::is_available_for_loan`].
    pub(crate) fn attach_loan(&mut self, loan_id: LoanId) {
        debug_assert!(self.is_available_for_loan());
        self.active_loans.push(loan_id);
    }

    pub(crate) fn detach_loan(&mut self, loan_id: LoanId) -> bool {
        let before = self.active_loans.len();
        self.active_loans.retain(|id| *id != loan_id);
        self.active_loans.len() != before
    }

    /// Replaces the active-loan list with persisted state.
    pub(crate) fn restore_active_loans(
        &mut self,
        loans: Vec<LoanId>,
    ) -> Result<(), EntityValidationError> {
        if loans.len() > MAX_ACTIVE_LOANS {
            return Err(EntityValidationError::TooManyActiveLoans {
                count: loans.len(),
                max: MAX_ACTIVE_LOANS,
            });
        }
        for (index, loan_id) in loans.iter().enumerate() {
            if loans[..index].contains(loan_id) {
                return Err(EntityValidationError::DuplicateActiveLoan(
                    loan_id.to_string(),
                ));
            }
        }
        self.active_loans = loans;
        Ok(())
    }
}

impl PartialEq for Student {
    fn eq(&self, other: &Self) -> bool {
        self.student_id == other.student_id
    }
}

impl Eq for Student {}

impl Hash for Student {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.student_id.hash(state);
    }
}
