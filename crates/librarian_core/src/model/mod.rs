//! Library domain model.
//!
//! # Responsibility
//! - Define the three entities (`Book`, `Student`, `Loan`) and their keys.
//! - Reject invalid field values at construction time.
//!
//! # Invariants
//! - Identity keys (`BookId`, `StudentId`, `LoanId`) never change after creation.
//! - Cross-entity references are handles (identity keys), never owned copies.

pub mod book;
pub mod loan;
pub mod student;
mod validation;

pub use validation::EntityValidationError;
