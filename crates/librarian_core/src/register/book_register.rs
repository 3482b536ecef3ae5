//! Book register keyed by `BookId`.

use super::{EntityKey, Register, RegisterError, RegisterResult};
use crate::model::book::{Book, BookId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog of books, one per `BookId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Book>", try_from = "Vec<Book>")]
pub struct BookRegister {
    books: BTreeMap<BookId, Book>,
}

impl BookRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub(crate) fn get_mut(&mut self, key: &BookId) -> Option<&mut Book> {
        self.books.get_mut(key)
    }
}

impl Register for BookRegister {
    type Key = BookId;
    type Item = Book;

    fn add(&mut self, item: Book) -> RegisterResult<()> {
        if !self.is_unique(&item) {
            return Err(RegisterError::Duplicate(EntityKey::Book(
                item.book_id().clone(),
            )));
        }
        self.books.insert(item.book_id().clone(), item);
        Ok(())
    }

    fn modify(&mut self, key: &BookId, replacement: &Book) -> RegisterResult<()> {
        let member = self
            .books
            .get_mut(key)
            .ok_or_else(|| RegisterError::NotFound(EntityKey::Book(key.clone())))?;
        member.copy_from(replacement);
        Ok(())
    }

    fn remove(&mut self, key: &BookId) -> RegisterResult<Book> {
        self.books
            .remove(key)
            .ok_or_else(|| RegisterError::NotFound(EntityKey::Book(key.clone())))
    }

    fn is_unique(&self, candidate: &Book) -> bool {
        !self.books.contains_key(candidate.book_id())
    }

    fn get(&self, key: &BookId) -> Option<&Book> {
        self.books.get(key)
    }

    fn list(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.values().cloned().collect();
        books.sort_by(Book::listing_order);
        books
    }

    fn len(&self) -> usize {
        self.books.len()
    }
}

impl From<BookRegister> for Vec<Book> {
    fn from(value: BookRegister) -> Self {
        value.books.into_values().collect()
    }
}

impl TryFrom<Vec<Book>> for BookRegister {
    type Error = RegisterError;

    fn try_from(value: Vec<Book>) -> Result<Self, Self::Error> {
        let mut register = Self::new();
        for book in value {
            register.add(book)?;
        }
        Ok(register)
    }
}
