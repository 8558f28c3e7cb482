//! Teacher/subject catalog and the client ↔ backend id table.
//!
//! Client-side records use string ids ("kor", "t1"); the backend uses
//! integer keys. [`IdMap`] records the pairing explicitly instead of
//! deriving one from the other.

use std::collections::HashMap;

use crate::models::{SlicingOption, SubjectInfo, Teacher};

#[derive(Debug, Clone, Default)]
struct BiMap {
    to_backend: HashMap<String, i64>,
    to_client: HashMap<i64, String>,
}

impl BiMap {
    fn insert(&mut self, client: String, backend: i64) {
        if let Some(old) = self.to_backend.insert(client.clone(), backend) {
            self.to_client.remove(&old);
        }
        if let Some(old) = self.to_client.insert(backend, client) {
            if self.to_backend.get(&old) == Some(&backend) {
                self.to_backend.remove(&old);
            }
        }
    }

    fn backend(&self, client: &str) -> Option<i64> {
        self.to_backend.get(client).copied()
    }

    fn client(&self, backend: i64) -> Option<&str> {
        self.to_client.get(&backend).map(String::as_str)
    }
}

/// Bidirectional id table for subjects, teachers and rooms.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    subjects: BiMap,
    teachers: BiMap,
    rooms: BiMap,
}

impl IdMap {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs a subject id with its backend id.
    pub fn with_subject(mut self, client: impl Into<String>, backend: i64) -> Self {
        self.subjects.insert(client.into(), backend);
        self
    }

    /// Pairs a teacher id with its backend id.
    pub fn with_teacher(mut self, client: impl Into<String>, backend: i64) -> Self {
        self.teachers.insert(client.into(), backend);
        self
    }

    /// Pairs a room label with its backend facility id.
    pub fn with_room(mut self, client: impl Into<String>, backend: i64) -> Self {
        self.rooms.insert(client.into(), backend);
        self
    }

    pub fn subject_backend_id(&self, client: &str) -> Option<i64> {
        self.subjects.backend(client)
    }

    pub fn subject_client_id(&self, backend: i64) -> Option<&str> {
        self.subjects.client(backend)
    }

    pub fn teacher_backend_id(&self, client: &str) -> Option<i64> {
        self.teachers.backend(client)
    }

    pub fn teacher_client_id(&self, backend: i64) -> Option<&str> {
        self.teachers.client(backend)
    }

    pub fn room_backend_id(&self, client: &str) -> Option<i64> {
        self.rooms.backend(client)
    }

    pub fn room_client_id(&self, backend: i64) -> Option<&str> {
        self.rooms.client(backend)
    }
}

/// Where the active catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Fetched from the catalog repository.
    Remote,
    /// Built-in sample catalog, installed after a failed or empty fetch.
    Fallback,
}

/// Teachers and subjects of a school.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<SubjectInfo>,
    pub ids: IdMap,
}

impl Catalog {
    /// Whether the catalog has neither teachers nor subjects.
    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty() && self.subjects.is_empty()
    }
}

/// Built-in sample catalog used when the backend has no data.
pub fn sample_catalog() -> Catalog {
    let subjects = vec![
        SubjectInfo::new("kor", "Korean")
            .with_category("Korean")
            .with_credits(1, 4)
            .with_slicing(SlicingOption::TwoTwo),
        SubjectInfo::new("math", "Math")
            .with_category("Math")
            .with_credits(1, 4)
            .with_slicing(SlicingOption::ThreeOne),
        SubjectInfo::new("eng", "English")
            .with_category("English")
            .with_credits(1, 4),
        SubjectInfo::new("sci", "Science")
            .with_category("Inquiry")
            .with_credits(1, 3)
            .with_required_room("Science Lab"),
    ];
    let teachers = vec![
        Teacher::new("t1", "Kim").with_subject("kor").with_homeroom("1-1"),
        Teacher::new("t2", "Lee").with_subject("math").with_homeroom("1-2"),
        Teacher::new("t3", "Park").with_subject("eng").with_homeroom("2-1"),
        Teacher::new("t4", "Choi").with_subject("sci"),
        Teacher::new("t5", "Jung").with_subject("sci"),
    ];

    let mut ids = IdMap::new().with_room("Science Lab", 1);
    for (i, s) in subjects.iter().enumerate() {
        ids = ids.with_subject(s.id.clone(), i as i64 + 1);
    }
    for (i, t) in teachers.iter().enumerate() {
        ids = ids.with_teacher(t.id.clone(), i as i64 + 1);
    }

    Catalog {
        teachers,
        subjects,
        ids,
    }
}
