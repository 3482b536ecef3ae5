//! SQLite snapshot storage for the library aggregate.
//!
//! # Responsibility
//! - Write all three registers in one transaction.
//! - Rebuild a library from stored rows, keeping loan handles intact.
//!
//! # Invariants
//! - `save_library` replaces the previous snapshot atomically.
//! - Author and active-loan order survive a round trip via `position`.
//! - Dates are stored as ISO `YYYY-MM-DD` text.

use super::{RepoError, RepoResult};
use crate::library::Library;
use crate::model::book::{Book, BookId};
use crate::model::loan::{Loan, LoanId, LoanState};
use crate::model::student::{Student, StudentId};
use crate::register::{BookRegister, LoanRegister, Register, StudentRegister};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const REQUIRED_TABLES: [&str; 5] = [
    "books",
    "book_authors",
    "students",
    "student_active_loans",
    "loans",
];

/// Persistence contract for a whole library.
pub trait LibraryRepository {
    /// Replaces the stored snapshot with `library`.
    fn save_library(&mut self, library: &Library) -> RepoResult<()>;
    /// Loads the stored snapshot; an empty store yields an empty library.
    fn load_library(&self) -> RepoResult<Library>;
}

/// SQLite-backed library repository.
pub struct SqliteLibraryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteLibraryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the schema has not been applied.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl LibraryRepository for SqliteLibraryRepository<'_> {
    fn save_library(&mut self, library: &Library) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        clear_tables(&tx)?;
        insert_books(&tx, library.books())?;
        insert_students(&tx, library.students())?;
        insert_loans(&tx, library.loans())?;
        insert_student_active_loans(&tx, library.students())?;
        tx.commit()?;
        Ok(())
    }

    fn load_library(&self) -> RepoResult<Library> {
        let books = load_books(self.conn)?;
        let students = load_students(self.conn)?;
        let loans = load_loans(self.conn)?;
        Ok(Library::from_registers(books, students, loans)?)
    }
}

fn clear_tables(tx: &Transaction<'_>) -> RepoResult<()> {
    tx.execute_batch(
        "DELETE FROM student_active_loans;
         DELETE FROM book_authors;
         DELETE FROM loans;
         DELETE FROM students;
         DELETE FROM books;",
    )?;
    Ok(())
}

fn insert_books(tx: &Transaction<'_>, books: &BookRegister) -> RepoResult<()> {
    let mut book_stmt = tx.prepare(
        "INSERT INTO books (book_id, title, publishment_year, available_copies)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    let mut author_stmt = tx.prepare(
        "INSERT INTO book_authors (book_id, position, name)
         VALUES (?1, ?2, ?3);",
    )?;

    for book in books.iter() {
        book_stmt.execute(params![
            book.book_id().as_str(),
            book.title(),
            to_sql_integer(book.publishment_year(), "books.publishment_year")?,
            to_sql_integer(book.available_copies(), "books.available_copies")?,
        ])?;
        for (position, author) in book.authors().iter().enumerate() {
            author_stmt.execute(params![book.book_id().as_str(), position as i64, author])?;
        }
    }
    Ok(())
}

fn insert_students(tx: &Transaction<'_>, students: &StudentRegister) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO students (student_id, name, surname, email)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for student in students.iter() {
        stmt.execute(params![
            student.student_id().as_str(),
            student.name(),
            student.surname(),
            student.email(),
        ])?;
    }
    Ok(())
}

fn insert_loans(tx: &Transaction<'_>, loans: &LoanRegister) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO loans (loan_id, student_id, book_id, loan_start, loan_end, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
    )?;
    for loan in loans.iter() {
        stmt.execute(params![
            loan.loan_id().to_string(),
            loan.student_id().as_str(),
            loan.book_id().as_str(),
            format_date(loan.loan_start()),
            format_date(loan.loan_end()),
            loan.state().as_str(),
        ])?;
    }
    Ok(())
}

fn insert_student_active_loans(
    tx: &Transaction<'_>,
    students: &StudentRegister,
) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO student_active_loans (student_id, position, loan_id)
         VALUES (?1, ?2, ?3);",
    )?;
    for student in students.iter() {
        for (position, loan_id) in student.active_loans().iter().enumerate() {
            stmt.execute(params![
                student.student_id().as_str(),
                position as i64,
                loan_id.to_string(),
            ])?;
        }
    }
    Ok(())
}

fn load_books(conn: &Connection) -> RepoResult<BookRegister> {
    let mut authors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT book_id, name
             FROM book_authors
             ORDER BY book_id ASC, position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let book_id: String = row.get("book_id")?;
            let name: String = row.get("name")?;
            authors.entry(book_id).or_default().push(name);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT book_id, title, publishment_year, available_copies
         FROM books
         ORDER BY book_id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut register = BookRegister::new();
    while let Some(row) = rows.next()? {
        let book_id: String = row.get("book_id")?;
        let book_authors = authors.remove(&book_id).unwrap_or_default();
        let book = Book::new(
            row.get::<_, String>("title")?,
            book_authors,
            book_id,
            row.get::<_, i64>("publishment_year")?,
            row.get::<_, i64>("available_copies")?,
        )?;
        register.add(book)?;
    }
    Ok(register)
}

fn load_students(conn: &Connection) -> RepoResult<StudentRegister> {
    let mut active_loans: BTreeMap<String, Vec<LoanId>> = BTreeMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT student_id, loan_id
             FROM student_active_loans
             ORDER BY student_id ASC, position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let student_id: String = row.get("student_id")?;
            let loan_id = parse_uuid(&row.get::<_, String>("loan_id")?, "student_active_loans")?;
            active_loans.entry(student_id).or_default().push(loan_id);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT student_id, name, surname, email
         FROM students
         ORDER BY student_id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut register = StudentRegister::new();
    while let Some(row) = rows.next()? {
        let student_id: String = row.get("student_id")?;
        let loans = active_loans.remove(&student_id).unwrap_or_default();
        let mut student = Student::new(
            row.get::<_, String>("name")?,
            row.get::<_, String>("surname")?,
            student_id,
            row.get::<_, String>("email")?,
        )?;
        student.restore_active_loans(loans)?;
        register.insert_record(student)?;
    }
    Ok(register)
}

fn load_loans(conn: &Connection) -> RepoResult<LoanRegister> {
    let mut stmt = conn.prepare(
        "SELECT loan_id, student_id, book_id, loan_start, loan_end, state
         FROM loans
         ORDER BY loan_id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut register = LoanRegister::new();
    while let Some(row) = rows.next()? {
        register.insert_record(parse_loan_row(row)?)?;
    }
    Ok(register)
}

fn parse_loan_row(row: &Row<'_>) -> RepoResult<Loan> {
    let loan_id = parse_uuid(&row.get::<_, String>("loan_id")?, "loans")?;
    let state_text: String = row.get("state")?;
    let state = LoanState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid loan state `{state_text}` in loans.state"))
    })?;

    let loan = Loan::restore(
        loan_id,
        StudentId::parse(row.get::<_, String>("student_id")?)?,
        BookId::parse(row.get::<_, String>("book_id")?)?,
        parse_date(&row.get::<_, String>("loan_start")?, "loans.loan_start")?,
        parse_date(&row.get::<_, String>("loan_end")?, "loans.loan_end")?,
        state,
    )?;
    Ok(loan)
}

fn to_sql_integer(value: u64, column: &'static str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value {value} does not fit {column}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn parse_uuid(value: &str, table: &'static str) -> RepoResult<LoanId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid loan id `{value}` in {table}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{parse_date, LibraryRepository, SqliteLibraryRepository};
    use crate::db::open_db_in_memory;
    use crate::register::Register;
    use crate::repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = SqliteLibraryRepository::try_new(&mut conn);
        assert!(matches!(result, Err(RepoError::MissingRequiredTable("books"))));
    }

    #[test]
    fn empty_store_loads_empty_library() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqliteLibraryRepository::try_new(&mut conn).unwrap();
        let library = repo.load_library().unwrap();
        assert!(library.books().is_empty());
        assert!(library.students().is_empty());
        assert!(library.loans().is_empty());
    }

    #[test]
    fn parse_date_reports_column() {
        let err = parse_date("01/02/2030", "loans.loan_end").unwrap_err();
        assert!(err.to_string().contains("loans.loan_end"));
    }
}
