//! In-memory search over the registers.
//!
//! # Responsibility
//! - Filter sorted register snapshots for the book, student and loan views.
//! - Keep result shaping inside core so every UI filters the same way.

pub mod filter;
