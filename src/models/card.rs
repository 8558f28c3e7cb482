//! Unassigned card model.
//!
//! A card is a teaching unit that has not been placed on the grid yet:
//! all or part of one subject's weekly credits for one class. Cards come
//! from the card generator, from returning a block to the pool, or from
//! a backend resync (a group's remaining credits).

use serde::{Deserialize, Serialize};

use super::{GroupId, SlicingOption};

/// A not-yet-placed teaching unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedCard {
    /// Unique card identifier.
    pub id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Credit weight of this unit (1..=4).
    pub credits: u8,
    pub grade: u8,
    pub class_num: u8,
    /// Position within the subject's split list (0 when unsplit).
    pub slice_index: usize,
    /// Slicing option the unit was cut with.
    pub slicing: Option<SlicingOption>,
    /// Set only when this card is one slice of a split subject.
    pub original_subject_id: Option<String>,
    /// Teacher intended for this unit, if already known.
    pub teacher_id: Option<String>,
    /// Backend lecture group, absent until created.
    pub group_id: Option<GroupId>,
}

impl UnassignedCard {
    /// Creates a card for one class.
    pub fn new(
        id: impl Into<String>,
        subject_id: impl Into<String>,
        credits: u8,
        grade: u8,
        class_num: u8,
    ) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            credits,
            grade,
            class_num,
            slice_index: 0,
            slicing: None,
            original_subject_id: None,
            teacher_id: None,
            group_id: None,
        }
    }

    /// Sets the slice position.
    pub fn with_slice(mut self, index: usize, slicing: Option<SlicingOption>) -> Self {
        self.slice_index = index;
        self.slicing = slicing;
        self
    }

    /// Links back to the subject this card was split from.
    pub fn with_original_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.original_subject_id = Some(subject_id.into());
        self
    }

    /// Sets the intended teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Sets the backend group.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Whether this card was produced by slicing.
    pub fn is_slice(&self) -> bool {
        self.original_subject_id.is_some()
    }
}
