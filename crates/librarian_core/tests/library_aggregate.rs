use chrono::NaiveDate;
use librarian_core::{
    Book, BookId, ChangeAction, EntityKey, Library, LibraryChange, Loan, LoanState, Register,
    RegisterError, Student,
};
use serde_json::json;

struct Fixture {
    library: Library,
    book: Book,
    student: Student,
}

fn fixture(copies: i64) -> Fixture {
    let mut library = Library::new();
    let book = Book::new("I Malavoglia", ["Giovanni Verga"], "9788807900112", 1881, copies).unwrap();
    let student =
        Student::new("Lucia", "Mondella", "0512109876", "l.mondella@studenti.unisa.it").unwrap();
    library.add_book(book.clone()).unwrap();
    library.add_student(student.clone()).unwrap();
    library.drain_changes();
    Fixture {
        library,
        book,
        student,
    }
}

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 1).unwrap()
}

#[test]
fn book_with_active_loan_cannot_be_removed() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(1);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());
    library.add_loan(loan).unwrap();

    assert_eq!(
        library.remove_book(book.book_id()).unwrap_err(),
        RegisterError::InUse {
            key: EntityKey::Book(book.book_id().clone()),
            active_loans: 1
        }
    );
    assert_eq!(
        library.remove_student(student.student_id()).unwrap_err(),
        RegisterError::InUse {
            key: EntityKey::Student(student.student_id().clone()),
            active_loans: 1
        }
    );
    assert!(library.books().contains(book.book_id()));
}

#[test]
fn returned_loans_survive_removal_of_their_parties() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(1);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());
    let loan_id = loan.loan_id();
    library.add_loan(loan).unwrap();
    library.return_loan(&loan_id).unwrap();

    library.remove_book(book.book_id()).unwrap();
    library.remove_student(student.student_id()).unwrap();

    let history = library.loans().get(&loan_id).unwrap();
    assert!(history.is_returned());
    assert!(library.book_of(history).is_none());
    assert!(library.student_of(history).is_none());
    library.check_integrity().unwrap();
}

#[test]
fn modified_book_is_seen_through_loan_handle() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(4);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());
    let loan_id = loan.loan_id();
    library.add_loan(loan).unwrap();

    let retitled = Book::new("I Malavoglia (ed. critica)", ["G. Verga"], "0000000000000", 1881, 10)
        .unwrap();
    library.modify_book(book.book_id(), &retitled).unwrap();

    let loan = library.loans().get(&loan_id).unwrap();
    let seen = library.book_of(loan).unwrap();
    assert_eq!(seen.title(), "I Malavoglia (ed. critica)");
    assert_eq!(seen.available_copies(), 10);
}

#[test]
fn journal_records_successful_mutations_in_order() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(1);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());
    let loan_id = loan.loan_id();

    library.add_loan(loan).unwrap();
    library.return_loan(&loan_id).unwrap();
    assert!(library.return_loan(&loan_id).is_err());
    library.remove_loan(&loan_id).unwrap();

    let changes = library.drain_changes();
    assert_eq!(
        changes,
        vec![
            LibraryChange {
                action: ChangeAction::Added,
                key: EntityKey::Loan(loan_id)
            },
            LibraryChange {
                action: ChangeAction::Returned,
                key: EntityKey::Loan(loan_id)
            },
            LibraryChange {
                action: ChangeAction::Removed,
                key: EntityKey::Loan(loan_id)
            },
        ]
    );
    assert!(library.drain_changes().is_empty());
}

#[test]
fn ledger_view_skips_the_journal() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(1);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());

    library.loan_ledger().add(loan).unwrap();
    assert_eq!(library.loans().len(), 1);
    assert!(library.pending_changes().is_empty());
    library.check_integrity().unwrap();
}

#[test]
fn overdue_loans_are_listed_by_due_date() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(3);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let early = Loan::with_dates(
        student.student_id().clone(),
        book.book_id().clone(),
        start,
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    );
    let early_id = early.loan_id();
    library.add_loan(early).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let overdue = library.loans().overdue_on(today);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].loan_id(), early_id);

    library.return_loan(&early_id).unwrap();
    assert!(library.loans().overdue_on(today).is_empty());
}

#[test]
fn student_with_preexisting_active_loans_is_rejected() {
    let Fixture { mut library, .. } = fixture(1);
    let student: Student = serde_json::from_value(json!({
        "name": "Renzo",
        "surname": "Tramaglino",
        "student_id": "0512100001",
        "email": "r.tramaglino@studenti.unisa.it",
        "active_loans": [
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4()
        ]
    }))
    .unwrap();
    let student_id = student.student_id().clone();

    assert_eq!(
        library.add_student(student).unwrap_err(),
        RegisterError::PreloadedLoans {
            key: EntityKey::Student(student_id.clone()),
            active_loans: 3
        }
    );
    assert!(!library.students().contains(&student_id));
    assert!(library.pending_changes().is_empty());
    library.check_integrity().unwrap();
}

#[test]
fn borrower_copied_from_another_library_is_rejected() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(1);
    let loan = Loan::new(student.student_id().clone(), book.book_id().clone(), due());
    library.add_loan(loan).unwrap();
    let borrower = library.students().get(student.student_id()).unwrap().clone();

    let mut other = Library::new();
    assert!(matches!(
        other.add_student(borrower),
        Err(RegisterError::PreloadedLoans { active_loans: 1, .. })
    ));
    assert!(other.students().is_empty());
    other.check_integrity().unwrap();
}

fn assert_copies_conserved(library: &Library, book_id: &BookId, initial: u64) {
    let available = library.books().get(book_id).unwrap().available_copies();
    let out = library.loans().active_loans_for_book(book_id).count() as u64;
    assert_eq!(initial, available + out, "available={available} out={out}");
}

#[test]
fn book_copies_are_conserved_across_lending_operations() {
    let Fixture {
        mut library, book, ..
    } = fixture(3);
    let book_id = book.book_id().clone();
    let initial = 3;
    let borrowers: Vec<Student> = [
        ("Renzo", "Tramaglino", "0512100001", "r.tramaglino@studenti.unisa.it"),
        ("Agnese", "Mondella", "0512100002", "a.mondella@studenti.unisa.it"),
        ("Federigo", "Borromeo", "0512100003", "f.borromeo@studenti.unisa.it"),
    ]
    .into_iter()
    .map(|(name, surname, id, email)| Student::new(name, surname, id, email).unwrap())
    .collect();
    for student in &borrowers {
        library.add_student(student.clone()).unwrap();
    }
    assert_copies_conserved(&library, &book_id, initial);

    let mut loan_ids = Vec::new();
    for student in &borrowers {
        let loan = Loan::new(student.student_id().clone(), book_id.clone(), due());
        loan_ids.push(loan.loan_id());
        library.add_loan(loan).unwrap();
        assert_copies_conserved(&library, &book_id, initial);
    }
    assert_eq!(library.books().get(&book_id).unwrap().available_copies(), 0);

    library.return_loan(&loan_ids[0]).unwrap();
    assert_copies_conserved(&library, &book_id, initial);

    library.remove_loan(&loan_ids[1]).unwrap();
    assert_copies_conserved(&library, &book_id, initial);

    library.remove_loan(&loan_ids[0]).unwrap();
    assert_copies_conserved(&library, &book_id, initial);

    let current = library.loans().get(&loan_ids[2]).unwrap().clone();
    let returned = Loan::restore(
        current.loan_id(),
        current.student_id().clone(),
        current.book_id().clone(),
        current.loan_start(),
        current.loan_end(),
        LoanState::Returned,
    )
    .unwrap();
    library.modify_loan(&loan_ids[2], &returned).unwrap();
    assert_copies_conserved(&library, &book_id, initial);

    let again = Loan::new(
        borrowers[1].student_id().clone(),
        book_id.clone(),
        due(),
    );
    library.add_loan(again).unwrap();
    assert_copies_conserved(&library, &book_id, initial);
    assert!(library.return_loan(&loan_ids[2]).is_err());
    assert_copies_conserved(&library, &book_id, initial);
    library.check_integrity().unwrap();
}

#[test]
fn list_is_stable_without_mutation() {
    let Fixture {
        mut library,
        book,
        student,
    } = fixture(2);
    library
        .add_book(Book::new("Fosca", ["Igino Ugo Tarchetti"], "9788807900334", 1869, 1).unwrap())
        .unwrap();
    library
        .add_student(
            Student::new("Gertrude", "Manzoni", "0512100004", "g.manzoni@studenti.unisa.it")
                .unwrap(),
        )
        .unwrap();
    for due_day in [5, 2] {
        let loan = Loan::new(
            student.student_id().clone(),
            book.book_id().clone(),
            NaiveDate::from_ymd_opt(2030, 4, due_day).unwrap(),
        );
        let id = loan.loan_id();
        library.add_loan(loan).unwrap();
        library.return_loan(&id).unwrap();
    }

    let book_ids = |library: &Library| -> Vec<BookId> {
        library.books().list().iter().map(|b| b.book_id().clone()).collect()
    };
    let student_ids = |library: &Library| -> Vec<String> {
        library
            .students()
            .list()
            .iter()
            .map(|s| s.student_id().as_str().to_string())
            .collect()
    };
    let loan_ids = |library: &Library| -> Vec<uuid::Uuid> {
        library.loans().list().iter().map(Loan::loan_id).collect()
    };

    assert_eq!(book_ids(&library), book_ids(&library));
    assert_eq!(student_ids(&library), student_ids(&library));
    assert_eq!(loan_ids(&library), loan_ids(&library));
    assert_eq!(loan_ids(&library).len(), 2);
}
