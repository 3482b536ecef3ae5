//! Book entity.
//!
//! # Responsibility
//! - Hold catalog data for one title and its loanable copy counter.
//! - Validate every field at construction time.
//!
//! # Invariants
//! - `book_id` is exactly [`BOOK_ID_LEN`] characters and never changes.
//! - `authors` is non-empty and keeps insertion order.
//! - `available_copies` only moves through loan activation/return or an
//!   explicit register modify.

use super::validation::EntityValidationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Required length of a book identity key (ISBN-13 shaped).
pub const BOOK_ID_LEN: usize = 13;

/// Immutable identity key of a [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(String);

impl BookId {
    /// Parses a book id, rejecting anything that is not exactly 13 characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, EntityValidationError> {
        let value = value.into();
        let length = value.chars().count();
        if length != BOOK_ID_LEN {
            return Err(EntityValidationError::InvalidBookId { length });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookId {
    type Error = EntityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BookId> for String {
    fn from(value: BookId) -> Self {
        value.0
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog title with a count of copies currently on the shelf.
///
/// Equality and hashing use `book_id` only; two books with the same id are the
/// same book regardless of their other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BookRecord")]
pub struct Book {
    title: String,
    authors: Vec<String>,
    book_id: BookId,
    publishment_year: u64,
    available_copies: u64,
}

/// Unvalidated wire shape; decoded books are rebuilt through [`Book::new`].
#[derive(Deserialize)]
struct BookRecord {
    title: String,
    authors: Vec<String>,
    book_id: String,
    publishment_year: i64,
    available_copies: i64,
}

impl TryFrom<BookRecord> for Book {
    type Error = EntityValidationError;

    fn try_from(value: BookRecord) -> Result<Self, Self::Error> {
        Self::new(
            value.title,
            value.authors,
            value.book_id,
            value.publishment_year,
            value.available_copies,
        )
    }
}

impl Book {
    /// Builds a fully validated book.
    ///
    /// # Errors
    /// - `InvalidBookId` when `book_id` is not 13 characters.
    /// - `MissingAuthors` / `BlankAuthor` for an empty or blank author list.
    /// - `NegativePublishmentYear` / `NegativeAvailableCopies` for values < 0.
    pub fn new<A, S>(
        title: impl Into<String>,
        authors: A,
        book_id: impl Into<String>,
        publishment_year: i64,
        available_copies: i64,
    ) -> Result<Self, EntityValidationError>
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let book_id = BookId::parse(book_id)?;
        let authors = validate_authors(authors)?;
        let publishment_year = u64::try_from(publishment_year)
            .map_err(|_| EntityValidationError::NegativePublishmentYear(publishment_year))?;
        let available_copies = u64::try_from(available_copies)
            .map_err(|_| EntityValidationError::NegativeAvailableCopies(available_copies))?;

        Ok(Self {
            title: title.into(),
            authors,
            book_id,
            publishment_year,
            available_copies,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// Authors joined in insertion order, as shown in listings and searched.
    pub fn joined_authors(&self) -> String {
        self.authors.join(", ")
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn publishment_year(&self) -> u64 {
        self.publishment_year
    }

    pub fn available_copies(&self) -> u64 {
        self.available_copies
    }

    /// A book can be lent while at least one copy is on the shelf.
    pub fn is_available_for_loan(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies every modifiable field from `other`, keeping this book's id.
    pub fn copy_from(&mut self, other: &Book) {
        self.title.clone_from(&other.title);
        self.authors.clone_from(&other.authors);
        self.publishment_year = other.publishment_year;
        self.available_copies = other.available_copies;
    }

    /// Listing order: title, then authors joined in insertion order, then id.
    ///
    /// The trailing id comparison only breaks exact title/author ties so the
    /// order stays total.
    pub fn listing_order(a: &Book, b: &Book) -> Ordering {
        a.title
            .cmp(&b.title)
            .then_with(|| a.joined_authors().cmp(&b.joined_authors()))
            .then_with(|| a.book_id.cmp(&b.book_id))
    }

    pub(crate) fn take_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_sub(1);
    }

    pub(crate) fn restore_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1);
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.book_id == other.book_id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.book_id.hash(state);
    }
}

fn validate_authors<A, S>(authors: A) -> Result<Vec<String>, EntityValidationError>
where
    A: IntoIterator<Item = S>,
    S: Into<String>,
{
    let authors: Vec<String> = authors.into_iter().map(Into::into).collect();
    if authors.is_empty() {
        return Err(EntityValidationError::MissingAuthors);
    }
    if let Some(position) = authors.iter().position(|name| name.trim().is_empty()) {
        return Err(EntityValidationError::BlankAuthor { position });
    }
    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::{Book, BookId, EntityValidationError};

    #[test]
    fn book_id_counts_characters_not_bytes() {
        assert!(BookId::parse("978000000000è").is_ok());
        assert_eq!(
            BookId::parse("97800000000").unwrap_err(),
            EntityValidationError::InvalidBookId { length: 11 }
        );
    }

    #[test]
    fn copy_counters_never_underflow() {
        let mut book = Book::new("T", ["A"], "1234567890123", 2020, 0).unwrap();
        book.take_copy();
        assert_eq!(book.available_copies(), 0);
        book.restore_copy();
        assert_eq!(book.available_copies(), 1);
    }

    #[test]
    fn large_non_negative_numbers_are_accepted() {
        let book = Book::new("T", ["A"], "1234567890123", 5_000_000_000, 5_000_000_000).unwrap();
        assert_eq!(book.publishment_year(), 5_000_000_000);
        assert_eq!(book.available_copies(), 5_000_000_000);
        assert_eq!(
            Book::new("T", ["A"], "1234567890123", -1, 1).unwrap_err(),
            EntityValidationError::NegativePublishmentYear(-1)
        );
    }

    #[test]
    fn blank_author_reports_position() {
        let err = Book::new("T", ["Verga", "  "], "1234567890123", 1880, 1).unwrap_err();
        assert_eq!(err, EntityValidationError::BlankAuthor { position: 1 });
    }
}
