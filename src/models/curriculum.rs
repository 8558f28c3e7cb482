//! Curriculum model.
//!
//! The curriculum is the school's configuration for one scheduling session:
//! grades and their class counts, departments with their teachers, subjects
//! with per-grade weekly credits, facility labels, and block-group cohorts.
//! It is treated as immutable while a timetable is being edited.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Teacher;

/// Number of classes in one grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeConfig {
    /// Grade number (1-based).
    pub grade: u8,
    /// Number of classes in the grade. Must be at least 1.
    pub class_count: u8,
}

impl GradeConfig {
    /// Creates a grade configuration.
    pub fn new(grade: u8, class_count: u8) -> Self {
        Self { grade, class_count }
    }
}

/// How a 4-credit subject is cut into separately placed units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlicingOption {
    /// Two 2-credit units.
    #[serde(rename = "2+2")]
    TwoTwo,
    /// A 3-credit unit and a 1-credit unit.
    #[serde(rename = "3+1")]
    ThreeOne,
    /// One undivided 4-credit unit.
    #[serde(rename = "4")]
    Whole,
}

impl SlicingOption {
    /// Credit weights of the units, in placement order.
    pub fn split(&self) -> &'static [u8] {
        match self {
            SlicingOption::TwoTwo => &[2, 2],
            SlicingOption::ThreeOne => &[3, 1],
            SlicingOption::Whole => &[4],
        }
    }

    /// Wire label (`"2+2"`, `"3+1"`, `"4"`).
    pub fn label(&self) -> &'static str {
        match self {
            SlicingOption::TwoTwo => "2+2",
            SlicingOption::ThreeOne => "3+1",
            SlicingOption::Whole => "4",
        }
    }
}

impl fmt::Display for SlicingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SlicingOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2+2" => Ok(SlicingOption::TwoTwo),
            "3+1" => Ok(SlicingOption::ThreeOne),
            "4" => Ok(SlicingOption::Whole),
            other => Err(format!("Unknown slicing option: {other}")),
        }
    }
}

/// Weekly credits of a subject in one grade (0 = not offered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCredit {
    pub grade: u8,
    pub credits: u8,
}

/// A subject offered by the school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// Unique subject identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Department category the subject belongs to.
    pub category: String,
    /// Weekly credits per grade.
    pub grade_credits: Vec<GradeCredit>,
    /// Slicing option. Only meaningful for grades where credits == 4.
    pub slicing: Option<SlicingOption>,
    /// Facility label the subject must be taught in.
    pub required_room: Option<String>,
}

impl SubjectInfo {
    /// Creates a subject with no credits.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            grade_credits: Vec::new(),
            slicing: None,
            required_room: None,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the weekly credits for a grade, replacing any previous entry.
    pub fn with_credits(mut self, grade: u8, credits: u8) -> Self {
        self.grade_credits.retain(|gc| gc.grade != grade);
        self.grade_credits.push(GradeCredit { grade, credits });
        self
    }

    /// Sets the slicing option.
    pub fn with_slicing(mut self, slicing: SlicingOption) -> Self {
        self.slicing = Some(slicing);
        self
    }

    /// Sets the required facility.
    pub fn with_required_room(mut self, room: impl Into<String>) -> Self {
        self.required_room = Some(room.into());
        self
    }

    /// Weekly credits for a grade (0 if not offered).
    pub fn credits_for(&self, grade: u8) -> u8 {
        self.grade_credits
            .iter()
            .find(|gc| gc.grade == grade)
            .map(|gc| gc.credits)
            .unwrap_or(0)
    }
}

/// A teaching department and its staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentInfo {
    pub id: String,
    pub name: String,
    pub category: String,
    pub teachers: Vec<Teacher>,
    /// Reference weekly teaching hours for the department.
    pub default_hours: u8,
}

impl DepartmentInfo {
    /// Creates an empty department.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            teachers: Vec::new(),
            default_hours: 0,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }
}

/// A named timing cohort ("A-time") used to align parallel elective blocks.
///
/// Declared only; the conflict validator does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGroupDefinition {
    pub id: String,
    pub name: String,
    pub target_grades: Vec<u8>,
}

/// The complete curriculum configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Curriculum {
    pub grades: Vec<GradeConfig>,
    /// Special room labels ("Music Room", "Lab 1").
    pub facilities: Vec<String>,
    pub departments: Vec<DepartmentInfo>,
    pub subjects: Vec<SubjectInfo>,
    pub block_groups: Vec<BlockGroupDefinition>,
}

impl Curriculum {
    /// Creates an empty curriculum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grade.
    pub fn with_grade(mut self, grade: u8, class_count: u8) -> Self {
        self.grades.push(GradeConfig::new(grade, class_count));
        self
    }

    /// Adds a facility label.
    pub fn with_facility(mut self, label: impl Into<String>) -> Self {
        self.facilities.push(label.into());
        self
    }

    /// Adds a department.
    pub fn with_department(mut self, department: DepartmentInfo) -> Self {
        self.departments.push(department);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: SubjectInfo) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a block-group definition.
    pub fn with_block_group(mut self, group: BlockGroupDefinition) -> Self {
        self.block_groups.push(group);
        self
    }

    /// Class count for a grade, if the grade is configured.
    pub fn class_count(&self, grade: u8) -> Option<u8> {
        self.grades
            .iter()
            .find(|g| g.grade == grade)
            .map(|g| g.class_count)
    }

    /// All teachers across departments.
    pub fn teachers(&self) -> Vec<Teacher> {
        self.departments
            .iter()
            .flat_map(|d| d.teachers.iter().cloned())
            .collect()
    }

    /// Finds a subject by ID.
    pub fn subject(&self, id: &str) -> Option<&SubjectInfo> {
        self.subjects.iter().find(|s| s.id == id)
    }
}
