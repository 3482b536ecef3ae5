//! Library use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into save/load use cases.
//! - Keep callers decoupled from SQLite details.

pub mod library_service;
