//! Loan register and the ledger view that drives the loan lifecycle.
//!
//! # Responsibility
//! - Store loans by `LoanId` and answer the pair-uniqueness question.
//! - Couple add/modify/remove with activation/return through [`LoanLedger`].
//!
//! # Invariants
//! - A loan registered through the ledger is never in the `Created` state.
//! - At most one non-returned loan exists per (student, book) pair.
//! - Removing an active loan returns it first, so counters stay conserved.

use super::{
    BookRegister, EntityKey, Register, RegisterError, RegisterResult, StudentRegister,
};
use crate::model::book::{Book, BookId};
use crate::model::loan::{Loan, LoanId, LoanState, LoanStateError};
use crate::model::student::{Student, StudentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every loan ever registered, active or returned.
///
/// Read-only on its own; mutations go through [`LoanLedger`], which also
/// borrows the book and student registers whose counters loans move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Loan>", try_from = "Vec<Loan>")]
pub struct LoanRegister {
    loans: BTreeMap<LoanId, Loan>,
}

impl LoanRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &LoanId) -> Option<&Loan> {
        self.loans.get(key)
    }

    pub fn contains(&self, key: &LoanId) -> bool {
        self.loans.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    /// True when no non-returned loan exists for the candidate's
    /// (student, book) pair and its id is not taken.
    ///
    /// A returned loan for the same pair does not block a new one.
    pub fn is_unique(&self, candidate: &Loan) -> bool {
        !self.loans.contains_key(&candidate.loan_id())
            && !self.loans.values().any(|loan| {
                !loan.is_returned()
                    && loan.student_id() == candidate.student_id()
                    && loan.book_id() == candidate.book_id()
            })
    }

    /// Snapshot sorted by due date.
    pub fn list(&self) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self.loans.values().cloned().collect();
        loans.sort_by(Loan::listing_order);
        loans
    }

    pub fn active_loans_for_book<'a>(
        &'a self,
        book_id: &'a BookId,
    ) -> impl Iterator<Item = &'a Loan> + 'a {
        self.loans
            .values()
            .filter(move |loan| loan.is_active() && loan.book_id() == book_id)
    }

    pub fn active_loans_for_student<'a>(
        &'a self,
        student_id: &'a StudentId,
    ) -> impl Iterator<Item = &'a Loan> + 'a {
        self.loans
            .values()
            .filter(move |loan| loan.is_active() && loan.student_id() == student_id)
    }

    /// Loans still out whose due date is before `date`, sorted by due date.
    pub fn overdue_on(&self, date: NaiveDate) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self
            .loans
            .values()
            .filter(|loan| loan.is_delay_on(date))
            .cloned()
            .collect();
        loans.sort_by(Loan::listing_order);
        loans
    }

    /// Stores a loan without running any transition.
    ///
    /// Used when rebuilding persisted state whose counters are already
    /// accounted for; the caller verifies integrity afterwards.
    pub(crate) fn insert_record(&mut self, loan: Loan) -> RegisterResult<()> {
        if self.loans.contains_key(&loan.loan_id()) {
            return Err(RegisterError::Duplicate(EntityKey::Loan(loan.loan_id())));
        }
        self.loans.insert(loan.loan_id(), loan);
        Ok(())
    }
}

impl From<LoanRegister> for Vec<Loan> {
    fn from(value: LoanRegister) -> Self {
        value.loans.into_values().collect()
    }
}

impl TryFrom<Vec<Loan>> for LoanRegister {
    type Error = RegisterError;

    fn try_from(value: Vec<Loan>) -> Result<Self, Self::Error> {
        let mut register = Self::new();
        for loan in value {
            register.insert_record(loan)?;
        }
        Ok(register)
    }
}

/// Mutable view over the loan register plus the registers its loans point to.
///
/// This is where the register drives the loan lifecycle: `add` activates,
/// `remove` returns first, `modify` may return.
pub struct LoanLedger<'a> {
    loans: &'a mut LoanRegister,
    books: &'a mut BookRegister,
    students: &'a mut StudentRegister,
}

impl<'a> LoanLedger<'a> {
    pub fn new(
        loans: &'a mut LoanRegister,
        books: &'a mut BookRegister,
        students: &'a mut StudentRegister,
    ) -> Self {
        Self {
            loans,
            books,
            students,
        }
    }

    /// Returns an active loan, releasing its book copy and student slot.
    pub fn return_loan(&mut self, key: &LoanId) -> RegisterResult<()> {
        let loan = self
            .loans
            .loans
            .get_mut(key)
            .ok_or(RegisterError::NotFound(EntityKey::Loan(*key)))?;
        let (book, student) = parties_mut(
            &mut *self.books,
            &mut *self.students,
            &loan.book_id().clone(),
            &loan.student_id().clone(),
        )?;
        loan.return_loan(book, student)?;
        Ok(())
    }
}

impl Register for LoanLedger<'_> {
    type Key = LoanId;
    type Item = Loan;

    /// Registers a `Created` loan and activates it.
    ///
    /// # Errors
    /// - `Duplicate` when the pair already has a non-returned loan.
    /// - `UnknownParty` when the book or student is not registered.
    /// - `Transition` when the loan is not `Created` or a party is unavailable.
    fn add(&mut self, mut item: Loan) -> RegisterResult<()> {
        if !self.loans.is_unique(&item) {
            return Err(RegisterError::Duplicate(EntityKey::Loan(item.loan_id())));
        }
        match item.state() {
            LoanState::Created => {}
            LoanState::Active => {
                return Err(LoanStateError::AlreadyActive(item.loan_id()).into());
            }
            LoanState::Returned => {
                return Err(LoanStateError::AlreadyReturned(item.loan_id()).into());
            }
        }

        let book_id = item.book_id().clone();
        let student_id = item.student_id().clone();
        let (book, student) =
            parties_mut(&mut *self.books, &mut *self.students, &book_id, &student_id)?;
        item.activate(book, student)?;
        self.loans.loans.insert(item.loan_id(), item);
        Ok(())
    }

    /// Copies the due date; returns the member when `replacement` is returned.
    ///
    /// Returned loans are terminal and reject any modification.
    fn modify(&mut self, key: &LoanId, replacement: &Loan) -> RegisterResult<()> {
        let member = self
            .loans
            .loans
            .get_mut(key)
            .ok_or(RegisterError::NotFound(EntityKey::Loan(*key)))?;
        if member.is_returned() {
            return Err(LoanStateError::AlreadyReturned(*key).into());
        }

        if replacement.is_returned() {
            let book_id = member.book_id().clone();
            let student_id = member.student_id().clone();
            let (book, student) =
                parties_mut(&mut *self.books, &mut *self.students, &book_id, &student_id)?;
            member.return_loan(book, student)?;
        }
        member.set_loan_end(replacement.loan_end());
        Ok(())
    }

    fn remove(&mut self, key: &LoanId) -> RegisterResult<Loan> {
        let member = self
            .loans
            .loans
            .get_mut(key)
            .ok_or(RegisterError::NotFound(EntityKey::Loan(*key)))?;
        if member.is_active() {
            let book_id = member.book_id().clone();
            let student_id = member.student_id().clone();
            let (book, student) =
                parties_mut(&mut *self.books, &mut *self.students, &book_id, &student_id)?;
            member.return_loan(book, student)?;
        }
        self.loans
            .loans
            .remove(key)
            .ok_or(RegisterError::NotFound(EntityKey::Loan(*key)))
    }

    fn is_unique(&self, candidate: &Loan) -> bool {
        self.loans.is_unique(candidate)
    }

    fn get(&self, key: &LoanId) -> Option<&Loan> {
        self.loans.get(key)
    }

    fn list(&self) -> Vec<Loan> {
        self.loans.list()
    }

    fn len(&self) -> usize {
        self.loans.len()
    }
}

fn parties_mut<'r>(
    books: &'r mut BookRegister,
    students: &'r mut StudentRegister,
    book_id: &BookId,
    student_id: &StudentId,
) -> RegisterResult<(&'r mut Book, &'r mut Student)> {
    let book = books
        .get_mut(book_id)
        .ok_or_else(|| RegisterError::UnknownParty(EntityKey::Book(book_id.clone())))?;
    let student = students
        .get_mut(student_id)
        .ok_or_else(|| RegisterError::UnknownParty(EntityKey::Student(student_id.clone())))?;
    Ok((book, student))
}
