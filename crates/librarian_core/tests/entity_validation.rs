use librarian_core::{
    Book, EntityValidationError, Student, INSTITUTIONAL_EMAIL_SUFFIX, MAX_ACTIVE_LOANS,
};

#[test]
fn book_accepts_valid_fields() {
    let book = Book::new("La roba", ["Verga"], "1234567890123", 1880, 1).unwrap();
    assert_eq!(book.title(), "La roba");
    assert_eq!(book.authors(), ["Verga".to_string()]);
    assert_eq!(book.book_id().as_str(), "1234567890123");
    assert_eq!(book.publishment_year(), 1880);
    assert_eq!(book.available_copies(), 1);
    assert!(book.is_available_for_loan());
}

#[test]
fn book_rejects_wrong_id_length() {
    let err = Book::new("T", ["A"], "123", 2000, 1).unwrap_err();
    assert_eq!(err, EntityValidationError::InvalidBookId { length: 3 });

    let err = Book::new("T", ["A"], "12345678901234", 2000, 1).unwrap_err();
    assert_eq!(err, EntityValidationError::InvalidBookId { length: 14 });
}

#[test]
fn book_rejects_negative_numbers() {
    assert_eq!(
        Book::new("T", ["A"], "1234567890123", -1, 1).unwrap_err(),
        EntityValidationError::NegativePublishmentYear(-1)
    );
    assert_eq!(
        Book::new("T", ["A"], "1234567890123", 2000, -5).unwrap_err(),
        EntityValidationError::NegativeAvailableCopies(-5)
    );
}

#[test]
fn book_rejects_missing_or_blank_authors() {
    let none: [&str; 0] = [];
    assert_eq!(
        Book::new("T", none, "1234567890123", 2000, 1).unwrap_err(),
        EntityValidationError::MissingAuthors
    );
    assert_eq!(
        Book::new("T", ["A", "  "], "1234567890123", 2000, 1).unwrap_err(),
        EntityValidationError::BlankAuthor { position: 1 }
    );
}

#[test]
fn book_with_zero_copies_is_not_available() {
    let book = Book::new("T", ["A"], "1234567890123", 2000, 0).unwrap();
    assert!(!book.is_available_for_loan());
}

#[test]
fn book_equality_follows_id() {
    let a = Book::new("Libro", ["A"], "1234567890123", 2000, 1).unwrap();
    let b = Book::new("Altro", ["B"], "1234567890123", 1999, 9).unwrap();
    let c = Book::new("Libro", ["A"], "3210987654321", 2000, 1).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn student_accepts_institutional_email() {
    let student =
        Student::new("Mario", "Rossi", "0612701234", "m.rossi@studenti.unisa.it").unwrap();
    assert_eq!(student.name(), "Mario");
    assert_eq!(student.surname(), "Rossi");
    assert_eq!(student.student_id().as_str(), "0612701234");
    assert!(student.active_loans().is_empty());
    assert!(student.is_available_for_loan());
}

#[test]
fn student_rejects_foreign_email_and_bad_id() {
    assert_eq!(
        Student::new("Mario", "Rossi", "0612701234", "m.rossi@gmail.com").unwrap_err(),
        EntityValidationError::InvalidEmail {
            suffix: INSTITUTIONAL_EMAIL_SUFFIX
        }
    );
    assert_eq!(
        Student::new("Mario", "Rossi", "06127", "m.rossi@studenti.unisa.it").unwrap_err(),
        EntityValidationError::InvalidStudentId { length: 5 }
    );
}

#[test]
fn student_email_check_is_suffix_only() {
    assert!(Student::new("A", "B", "0000000000", "@studenti.unisa.it").is_ok());
    assert!(Student::new("A", "B", "0000000000", "x@studenti.unisa.it.com").is_err());
}

#[test]
fn capacity_constant_matches_lending_policy() {
    assert_eq!(MAX_ACTIVE_LOANS, 3);
}
