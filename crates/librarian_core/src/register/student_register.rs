//! Student register keyed by `StudentId`.

use super::{EntityKey, Register, RegisterError, RegisterResult};
use crate::model::student::{Student, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Borrower roll, one entry per `StudentId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Student>", try_from = "Vec<Student>")]
pub struct StudentRegister {
    students: BTreeMap<StudentId, Student>,
}

impl StudentRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub(crate) fn get_mut(&mut self, key: &StudentId) -> Option<&mut Student> {
        self.students.get_mut(key)
    }

    /// Stores a student together with its persisted active-loan list.
    ///
    /// Used when rebuilding saved state; the caller verifies integrity afterwards.
    pub(crate) fn insert_record(&mut self, student: Student) -> RegisterResult<()> {
        if !self.is_unique(&student) {
            return Err(RegisterError::Duplicate(EntityKey::Student(
                student.student_id().clone(),
            )));
        }
        self.students.insert(student.student_id().clone(), student);
        Ok(())
    }
}

impl Register for StudentRegister {
    type Key = StudentId;
    type Item = Student;

    /// Registers a student with no active loans.
    ///
    /// # Errors
    /// - `Duplicate` when the id is taken.
    /// - `PreloadedLoans` when the student already lists active loans.
    fn add(&mut self, item: Student) -> RegisterResult<()> {
        if !item.active_loans().is_empty() {
            return Err(RegisterError::PreloadedLoans {
                key: EntityKey::Student(item.student_id().clone()),
                active_loans: item.active_loans().len(),
            });
        }
        self.insert_record(item)
    }

    /// Copies name, surname and email; active loans stay with the member.
    fn modify(&mut self, key: &StudentId, replacement: &Student) -> RegisterResult<()> {
        let member = self
            .students
            .get_mut(key)
            .ok_or_else(|| RegisterError::NotFound(EntityKey::Student(key.clone())))?;
        member.copy_from(replacement);
        Ok(())
    }

    fn remove(&mut self, key: &StudentId) -> RegisterResult<Student> {
        self.students
            .remove(key)
            .ok_or_else(|| RegisterError::NotFound(EntityKey::Student(key.clone())))
    }

    fn is_unique(&self, candidate: &Student) -> bool {
        !self.students.contains_key(candidate.student_id())
    }

    fn get(&self, key: &StudentId) -> Option<&Student> {
        self.students.get(key)
    }

    fn list(&self) -> Vec<Student> {
        let mut students: Vec<Student> = self.students.values().cloned().collect();
        students.sort_by(Student::listing_order);
        students
    }

    fn len(&self) -> usize {
        self.students.len()
    }
}

impl From<StudentRegister> for Vec<Student> {
    fn from(value: StudentRegister) -> Self {
        value.students.into_values().collect()
    }
}

impl TryFrom<Vec<Student>> for StudentRegister {
    type Error = RegisterError;

    fn try_from(value: Vec<Student>) -> Result<Self, Self::Error> {
        let mut register = Self::new();
        for student in value {
            register.insert_record(student)?;
        }
        Ok(register)
    }
}
