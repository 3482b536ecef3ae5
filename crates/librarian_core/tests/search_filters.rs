use chrono::NaiveDate;
use librarian_core::{
    loanable_books, loanable_students, search_books, search_loans, search_students, Book,
    Library, Loan, LoanQuery, LoanStatusFilter, Student,
};

fn catalog() -> Library {
    let mut library = Library::new();
    for book in [
        Book::new("Il barone rampante", ["Italo Calvino"], "9788804667926", 1957, 2).unwrap(),
        Book::new("Le città invisibili", ["Italo Calvino"], "9788804668022", 1972, 0).unwrap(),
        Book::new("Il nome della rosa", ["Umberto Eco"], "9788845292613", 1980, 1).unwrap(),
    ] {
        library.add_book(book).unwrap();
    }
    for student in [
        Student::new("Mario", "Rossi", "0612700001", "m.rossi@studenti.unisa.it").unwrap(),
        Student::new("Giulia", "Bianchi", "0612700002", "g.bianchi@studenti.unisa.it").unwrap(),
    ] {
        library.add_student(student).unwrap();
    }
    library
}

fn lend(library: &mut Library, student_id: &str, book_id: &str) -> uuid::Uuid {
    let student = library
        .students()
        .iter()
        .find(|s| s.student_id().as_str() == student_id)
        .unwrap()
        .student_id()
        .clone();
    let book = library
        .books()
        .iter()
        .find(|b| b.book_id().as_str() == book_id)
        .unwrap()
        .book_id()
        .clone();
    let loan = Loan::new(student, book, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
    let id = loan.loan_id();
    library.add_loan(loan).unwrap();
    id
}

#[test]
fn book_search_matches_title_author_and_id_case_insensitively() {
    let library = catalog();

    let calvino = search_books(library.books(), "  CALVINO ");
    assert_eq!(calvino.len(), 2);
    assert_eq!(calvino[0].title(), "Il barone rampante");

    let by_id = search_books(library.books(), "845292");
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].title(), "Il nome della rosa");

    assert_eq!(search_books(library.books(), "").len(), 3);
    assert!(search_books(library.books(), "manzoni").is_empty());
}

#[test]
fn student_search_matches_name_surname_and_id() {
    let library = catalog();
    assert_eq!(search_students(library.students(), "ross").len(), 1);
    assert_eq!(search_students(library.students(), "GIULIA").len(), 1);
    assert_eq!(search_students(library.students(), "061270000").len(), 2);
}

#[test]
fn loanable_pickers_skip_exhausted_entities() {
    let mut library = catalog();
    let books = loanable_books(library.books(), "calvino");
    assert!(books.is_empty(), "author text is not a picker criterion");

    let books = loanable_books(library.books(), "");
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(Book::is_available_for_loan));

    lend(&mut library, "0612700001", "9788804667926");
    lend(&mut library, "0612700001", "9788845292613");
    assert_eq!(loanable_books(library.books(), "rosa").len(), 0);
    assert_eq!(loanable_students(library.students(), "").len(), 2);
}

#[test]
fn loan_search_matches_full_name_in_either_order_and_book_fields() {
    let mut library = catalog();
    let mario_loan = lend(&mut library, "0612700001", "9788804667926");
    let giulia_loan = lend(&mut library, "0612700002", "9788845292613");

    let hits = search_loans(&library, &LoanQuery::new("mario rossi"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].loan_id(), mario_loan);

    let hits = search_loans(&library, &LoanQuery::new("Bianchi   Giulia"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].loan_id(), giulia_loan);

    let hits = search_loans(&library, &LoanQuery::new("eco"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].loan_id(), giulia_loan);

    assert_eq!(search_loans(&library, &LoanQuery::default()).len(), 2);
}

#[test]
fn loan_search_filters_by_status() {
    let mut library = catalog();
    let returned = lend(&mut library, "0612700001", "9788804667926");
    let active = lend(&mut library, "0612700002", "9788845292613");
    library.return_loan(&returned).unwrap();

    let only_active = search_loans(
        &library,
        &LoanQuery::new("").with_status(LoanStatusFilter::Active),
    );
    assert_eq!(only_active.len(), 1);
    assert_eq!(only_active[0].loan_id(), active);

    let only_returned = search_loans(
        &library,
        &LoanQuery::new("").with_status(LoanStatusFilter::Returned),
    );
    assert_eq!(only_returned.len(), 1);
    assert_eq!(only_returned[0].loan_id(), returned);
}

#[test]
fn loan_search_falls_back_to_ids_after_party_removal() {
    let mut library = catalog();
    let loan_id = lend(&mut library, "0612700001", "9788804667926");
    library.return_loan(&loan_id).unwrap();
    let book_id = library.loans().get(&loan_id).unwrap().book_id().clone();
    library.remove_book(&book_id).unwrap();

    assert!(search_loans(&library, &LoanQuery::new("barone")).is_empty());
    let hits = search_loans(&library, &LoanQuery::new("9788804667926"));
    assert_eq!(hits.len(), 1);
    let hits = search_loans(&library, &LoanQuery::new("rossi"));
    assert_eq!(hits.len(), 1);
}

#[test]
fn stored_text_with_irregular_spacing_still_matches() {
    let mut library = catalog();
    library
        .add_book(Book::new("I  Malavoglia", ["Giovanni\tVerga"], "9788807900112", 1881, 1).unwrap())
        .unwrap();

    for text in ["i malavoglia", "I  MALAVOGLIA", "giovanni verga"] {
        let hits = search_books(library.books(), text);
        assert_eq!(hits.len(), 1, "query `{text}`");
        assert_eq!(hits[0].book_id().as_str(), "9788807900112");
    }
    assert_eq!(loanable_books(library.books(), "i malavoglia").len(), 1);
}
