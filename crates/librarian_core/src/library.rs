//! Library aggregate root.
//!
//! # Responsibility
//! - Own exactly one book, student and loan register.
//! - Route every mutation so cross-register invariants hold.
//! - Journal successful mutations for the UI to drain.
//!
//! # Invariants
//! - Books and students referenced by an active loan cannot be removed.
//! - Every active loan resolves to a registered book and student, and is
//!   listed by that student; see [`Library::check_integrity`].
//! - There is no global instance; callers pass the aggregate explicitly.

use crate::model::book::{Book, BookId};
use crate::model::loan::{Loan, LoanId, LoanState};
use crate::model::student::{Student, StudentId};
use crate::register::{
    BookRegister, EntityKey, LoanLedger, LoanRegister, Register, RegisterError, RegisterResult,
    StudentRegister,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What happened to a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Added,
    Modified,
    Removed,
    Returned,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Returned => "returned",
        }
    }
}

/// One journaled mutation; the UI refreshes the matching view on drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryChange {
    pub action: ChangeAction,
    pub key: EntityKey,
}

/// Broken cross-register invariant found by [`Library::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    MissingBook { loan_id: LoanId, book_id: BookId },
    MissingStudent { loan_id: LoanId, student_id: StudentId },
    /// An active loan is not listed by its student.
    UntrackedLoan { loan_id: LoanId, student_id: StudentId },
    /// A student lists a loan that is not one of their active loans.
    StaleStudentLoan { student_id: StudentId, loan_id: LoanId },
    /// Only activated loans may be registered.
    UnactivatedLoan(LoanId),
    /// Two non-returned loans share a (student, book) pair.
    DuplicateActivePair { loan_id: LoanId },
    /// Register-level rejection while rebuilding.
    Register(RegisterError),
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBook { loan_id, book_id } => {
                write!(f, "active loan {loan_id} references missing book {book_id}")
            }
            Self::MissingStudent {
                loan_id,
                student_id,
            } => write!(
                f,
                "active loan {loan_id} references missing student {student_id}"
            ),
            Self::UntrackedLoan {
                loan_id,
                student_id,
            } => write!(
                f,
                "active loan {loan_id} is not listed by student {student_id}"
            ),
            Self::StaleStudentLoan {
                student_id,
                loan_id,
            } => write!(
                f,
                "student {student_id} lists loan {loan_id} which is not active for them"
            ),
            Self::UnactivatedLoan(loan_id) => {
                write!(f, "loan {loan_id} is registered without being activated")
            }
            Self::DuplicateActivePair { loan_id } => write!(
                f,
                "loan {loan_id} duplicates an active loan for the same student and book"
            ),
            Self::Register(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IntegrityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Register(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegisterError> for IntegrityError {
    fn from(value: RegisterError) -> Self {
        Self::Register(value)
    }
}

/// Aggregate holding the three registers of one library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "LibrarySnapshot", try_from = "LibrarySnapshot")]
pub struct Library {
    books: BookRegister,
    students: StudentRegister,
    loans: LoanRegister,
    changes: Vec<LibraryChange>,
}

/// Serialized shape of a [`Library`]; the change journal is not persisted.
#[derive(Serialize, Deserialize)]
struct LibrarySnapshot {
    books: BookRegister,
    students: StudentRegister,
    loans: LoanRegister,
}

impl From<Library> for LibrarySnapshot {
    fn from(value: Library) -> Self {
        Self {
            books: value.books,
            students: value.students,
            loans: value.loans,
        }
    }
}

impl TryFrom<LibrarySnapshot> for Library {
    type Error = IntegrityError;

    fn try_from(value: LibrarySnapshot) -> Result<Self, Self::Error> {
        Self::from_registers(value.books, value.students, value.loans)
    }
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a library from already-populated registers.
    ///
    /// # Errors
    /// Returns the first broken invariant reported by [`Self::check_integrity`].
    pub fn from_registers(
        books: BookRegister,
        students: StudentRegister,
        loans: LoanRegister,
    ) -> Result<Self, IntegrityError> {
        let library = Self {
            books,
            students,
            loans,
            changes: Vec::new(),
        };
        library.check_integrity()?;
        Ok(library)
    }

    pub fn books(&self) -> &BookRegister {
        &self.books
    }

    pub fn students(&self) -> &StudentRegister {
        &self.students
    }

    pub fn loans(&self) -> &LoanRegister {
        &self.loans
    }

    /// Direct [`Register`] access to loans; bypasses the change journal.
    pub fn loan_ledger(&mut self) -> LoanLedger<'_> {
        LoanLedger::new(&mut self.loans, &mut self.books, &mut self.students)
    }

    /// Resolves the book handle of `loan`; `None` once the book was removed.
    pub fn book_of(&self, loan: &Loan) -> Option<&Book> {
        self.books.get(loan.book_id())
    }

    pub fn student_of(&self, loan: &Loan) -> Option<&Student> {
        self.students.get(loan.student_id())
    }

    pub fn add_book(&mut self, book: Book) -> RegisterResult<()> {
        let key = EntityKey::Book(book.book_id().clone());
        let result = self.books.add(book);
        self.record(ChangeAction::Added, key, result)
    }

    pub fn modify_book(&mut self, key: &BookId, replacement: &Book) -> RegisterResult<()> {
        let result = self.books.modify(key, replacement);
        self.record(ChangeAction::Modified, EntityKey::Book(key.clone()), result)
    }

    /// Removes a book that no active loan references.
    pub fn remove_book(&mut self, key: &BookId) -> RegisterResult<Book> {
        let active_loans = self.loans.active_loans_for_book(key).count();
        let result = if active_loans > 0 {
            Err(RegisterError::InUse {
                key: EntityKey::Book(key.clone()),
                active_loans,
            })
        } else {
            self.books.remove(key)
        };
        self.record(ChangeAction::Removed, EntityKey::Book(key.clone()), result)
    }

    pub fn add_student(&mut self, student: Student) -> RegisterResult<()> {
        let key = EntityKey::Student(student.student_id().clone());
        let result = self.students.add(student);
        self.record(ChangeAction::Added, key, result)
    }

    pub fn modify_student(
        &mut self,
        key: &StudentId,
        replacement: &Student,
    ) -> RegisterResult<()> {
        let result = self.students.modify(key, replacement);
        self.record(
            ChangeAction::Modified,
            EntityKey::Student(key.clone()),
            result,
        )
    }

    /// Removes a student with no active loans.
    pub fn remove_student(&mut self, key: &StudentId) -> RegisterResult<Student> {
        let active_loans = self.loans.active_loans_for_student(key).count();
        let result = if active_loans > 0 {
            Err(RegisterError::InUse {
                key: EntityKey::Student(key.clone()),
                active_loans,
            })
        } else {
            self.students.remove(key)
        };
        self.record(
            ChangeAction::Removed,
            EntityKey::Student(key.clone()),
            result,
        )
    }

    /// Registers and activates a new loan.
    pub fn add_loan(&mut self, loan: Loan) -> RegisterResult<()> {
        let key = EntityKey::Loan(loan.loan_id());
        let result = self.loan_ledger().add(loan);
        self.record(ChangeAction::Added, key, result)
    }

    pub fn modify_loan(&mut self, key: &LoanId, replacement: &Loan) -> RegisterResult<()> {
        let result = self.loan_ledger().modify(key, replacement);
        self.record(ChangeAction::Modified, EntityKey::Loan(*key), result)
    }

    /// Removes a loan, returning it first when still active.
    pub fn remove_loan(&mut self, key: &LoanId) -> RegisterResult<Loan> {
        let result = self.loan_ledger().remove(key);
        self.record(ChangeAction::Removed, EntityKey::Loan(*key), result)
    }

    pub fn return_loan(&mut self, key: &LoanId) -> RegisterResult<()> {
        let result = self.loan_ledger().return_loan(key);
        self.record(ChangeAction::Returned, EntityKey::Loan(*key), result)
    }

    /// Hands pending change notifications to the caller and clears the journal.
    pub fn drain_changes(&mut self) -> Vec<LibraryChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn pending_changes(&self) -> &[LibraryChange] {
        &self.changes
    }

    /// Verifies the invariants that span registers.
    ///
    /// Returned loans may reference removed books or students; active ones
    /// may not.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        for loan in self.loans.iter() {
            let loan_id = loan.loan_id();
            match loan.state() {
                LoanState::Created => return Err(IntegrityError::UnactivatedLoan(loan_id)),
                LoanState::Returned => continue,
                LoanState::Active => {}
            }

            if !self.books.contains(loan.book_id()) {
                return Err(IntegrityError::MissingBook {
                    loan_id,
                    book_id: loan.book_id().clone(),
                });
            }
            let student = self.students.get(loan.student_id()).ok_or_else(|| {
                IntegrityError::MissingStudent {
                    loan_id,
                    student_id: loan.student_id().clone(),
                }
            })?;
            if !student.has_active_loan(loan_id) {
                return Err(IntegrityError::UntrackedLoan {
                    loan_id,
                    student_id: student.student_id().clone(),
                });
            }
            let pair_count = self
                .loans
                .active_loans_for_student(loan.student_id())
                .filter(|other| other.book_id() == loan.book_id())
                .count();
            if pair_count > 1 {
                return Err(IntegrityError::DuplicateActivePair { loan_id });
            }
        }

        for student in self.students.iter() {
            for loan_id in student.active_loans() {
                let tracked = self.loans.get(loan_id).is_some_and(|loan| {
                    loan.is_active() && loan.student_id() == student.student_id()
                });
                if !tracked {
                    return Err(IntegrityError::StaleStudentLoan {
                        student_id: student.student_id().clone(),
                        loan_id: *loan_id,
                    });
                }
            }
        }

        Ok(())
    }

    fn record<T>(
        &mut self,
        action: ChangeAction,
        key: EntityKey,
        result: RegisterResult<T>,
    ) -> RegisterResult<T> {
        match &result {
            Ok(_) => {
                info!(
                    "event=register_change module=library status=ok action={} key={}",
                    action.as_str(),
                    key
                );
                self.changes.push(LibraryChange { action, key });
            }
            Err(err) => {
                warn!(
                    "event=register_change module=library status=rejected action={} key={} error={}",
                    action.as_str(),
                    key,
                    err
                );
            }
        }
        result
    }
}
