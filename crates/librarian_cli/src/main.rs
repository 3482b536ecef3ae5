//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `librarian_core` linkage with a deterministic probe.
//! - Optionally summarize an existing library store given as first argument.

use librarian_core::{load_library_from_path, Register};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("librarian_core ping={}", librarian_core::ping());
    println!("librarian_core version={}", librarian_core::core_version());

    let Some(store) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match load_library_from_path(&store) {
        Ok(library) => {
            let loans = library.loans();
            let active = loans.iter().filter(|loan| loan.is_active()).count();
            let overdue = loans.iter().filter(|loan| loan.is_delay()).count();
            println!("books={}", library.books().len());
            println!("students={}", library.students().len());
            println!("loans={} active={active} overdue={overdue}", loans.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to load `{store}`: {err}");
            ExitCode::FAILURE
        }
    }
}
