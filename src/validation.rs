//! Input validation for curricula.
//!
//! Checks structural integrity of a curriculum before cards are generated.
//! Detects:
//! - Duplicate IDs (subjects, teachers, block groups)
//! - Grades with fewer than one class
//! - Credits declared for a grade that is not configured
//! - Slicing options on subjects that never carry 4 credits
//! - Required rooms missing from the facility list
//! - Block groups targeting unknown grades

use crate::models::Curriculum;
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A grade is configured with zero classes.
    EmptyGrade,
    /// A subject declares credits for a grade that is not configured.
    UnknownGrade,
    /// A slicing option is set but no grade has exactly 4 credits.
    IneffectiveSlicing,
    /// A subject requires a room that is not a known facility.
    UnknownRoom,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a curriculum.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_curriculum(curriculum: &Curriculum) -> ValidationResult {
    let mut errors = Vec::new();

    let mut grades = HashSet::new();
    for g in &curriculum.grades {
        if !grades.insert(g.grade) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate grade: {}", g.grade),
            ));
        }
        if g.class_count < 1 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyGrade,
                format!("Grade {} has no classes", g.grade),
            ));
        }
    }

    let mut subject_ids = HashSet::new();
    for subject in &curriculum.subjects {
        if !subject_ids.insert(subject.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate subject ID: {}", subject.id),
            ));
        }

        for gc in &subject.grade_credits {
            if gc.credits > 0 && !grades.contains(&gc.grade) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownGrade,
                    format!(
                        "Subject '{}' has {} credits in unconfigured grade {}",
                        subject.id, gc.credits, gc.grade
                    ),
                ));
            }
        }

        if let Some(slicing) = subject.slicing {
            if !subject.grade_credits.iter().any(|gc| gc.credits == 4) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::IneffectiveSlicing,
                    format!(
                        "Subject '{}' has slicing '{}' but no grade with 4 credits",
                        subject.id, slicing
                    ),
                ));
            }
        }

        if let Some(room) = &subject.required_room {
            if !curriculum.facilities.iter().any(|f| f == room) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownRoom,
                    format!("Subject '{}' requires unknown room '{}'", subject.id, room),
                ));
            }
        }
    }

    let mut teacher_ids = HashSet::new();
    for dept in &curriculum.departments {
        for t in &dept.teachers {
            if !teacher_ids.insert(t.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate teacher ID: {}", t.id),
                ));
            }
        }
    }

    let mut group_ids = HashSet::new();
    for bg in &curriculum.block_groups {
        if !group_ids.insert(bg.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate block group ID: {}", bg.id),
            ));
        }
        for grade in &bg.target_grades {
            if !grades.contains(grade) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownGrade,
                    format!("Block group '{}' targets unconfigured grade {}", bg.name, grade),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
