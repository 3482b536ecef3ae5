//! Case-insensitive substring filters over register snapshots.
//!
//! # Responsibility
//! - Back the search boxes of the book, student and loan views.
//! - Offer the loanable-candidate pickers used when opening a loan.
//!
//! # Invariants
//! - Blank text matches everything.
//! - Results keep the register's `list()` order.

use crate::library::Library;
use crate::model::book::Book;
use crate::model::loan::Loan;
use crate::model::student::Student;
use crate::register::{BookRegister, Register, StudentRegister};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Lifecycle filter of the loan view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoanStatusFilter {
    #[default]
    All,
    /// Loans not yet returned.
    Active,
    /// Loans already returned.
    Returned,
}

impl LoanStatusFilter {
    fn accepts(self, loan: &Loan) -> bool {
        match self {
            Self::All => true,
            Self::Active => !loan.is_returned(),
            Self::Returned => loan.is_returned(),
        }
    }
}

/// Loan view query: free text plus lifecycle filter.
#[derive(Debug, Clone, Default)]
pub struct LoanQuery {
    pub text: String,
    pub status: LoanStatusFilter,
}

impl LoanQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: LoanStatusFilter::All,
        }
    }

    pub fn with_status(mut self, status: LoanStatusFilter) -> Self {
        self.status = status;
        self
    }
}

/// Normalizes user search text: trim, lowercase, collapse whitespace runs.
pub fn normalize_search_text(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Books whose title, joined authors or id contain `text`.
pub fn search_books(register: &BookRegister, text: &str) -> Vec<Book> {
    let needle = normalize_search_text(text);
    register
        .list()
        .into_iter()
        .filter(|book| needle.is_empty() || book_matches(book, &needle))
        .collect()
}

/// Students whose name, surname or id contain `text`.
pub fn search_students(register: &StudentRegister, text: &str) -> Vec<Student> {
    let needle = normalize_search_text(text);
    register
        .list()
        .into_iter()
        .filter(|student| needle.is_empty() || student_matches(student, &needle))
        .collect()
}

/// Loans passing the status filter whose student or book matches the text.
///
/// Student text is matched as "name surname" and "surname name". Loans whose
/// book or student has been removed still match on the ids they carry.
pub fn search_loans(library: &Library, query: &LoanQuery) -> Vec<Loan> {
    let needle = normalize_search_text(&query.text);
    library
        .loans()
        .list()
        .into_iter()
        .filter(|loan| query.status.accepts(loan))
        .filter(|loan| needle.is_empty() || loan_matches(library, loan, &needle))
        .collect()
}

/// Books that can be lent right now, filtered by title or id.
pub fn loanable_books(register: &BookRegister, text: &str) -> Vec<Book> {
    let needle = normalize_search_text(text);
    register
        .list()
        .into_iter()
        .filter(Book::is_available_for_loan)
        .filter(|book| {
            needle.is_empty()
                || contains(book.title(), &needle)
                || contains(book.book_id().as_str(), &needle)
        })
        .collect()
}

/// Students under their loan quota, filtered by name, surname or id.
pub fn loanable_students(register: &StudentRegister, text: &str) -> Vec<Student> {
    let needle = normalize_search_text(text);
    register
        .list()
        .into_iter()
        .filter(Student::is_available_for_loan)
        .filter(|student| needle.is_empty() || student_matches(student, &needle))
        .collect()
}

fn book_matches(book: &Book, needle: &str) -> bool {
    contains(book.title(), needle)
        || contains(&book.joined_authors(), needle)
        || contains(book.book_id().as_str(), needle)
}

fn student_matches(student: &Student, needle: &str) -> bool {
    contains(student.name(), needle)
        || contains(student.surname(), needle)
        || contains(student.student_id().as_str(), needle)
}

fn loan_matches(library: &Library, loan: &Loan, needle: &str) -> bool {
    if contains(loan.student_id().as_str(), needle) || contains(loan.book_id().as_str(), needle)
    {
        return true;
    }

    let student_hit = library.student_of(loan).is_some_and(|student| {
        let full_name = format!("{} {}", student.name(), student.surname());
        let reversed = format!("{} {}", student.surname(), student.name());
        contains(&full_name, needle) || contains(&reversed, needle)
    });
    let book_hit = library.book_of(loan).is_some_and(|book| {
        contains(book.title(), needle) || contains(&book.joined_authors(), needle)
    });
    student_hit || book_hit
}

/// `needle` must already be normalized; the haystack is normalized the same way.
fn contains(haystack: &str, needle: &str) -> bool {
    normalize_search_text(haystack).contains(needle)
}
