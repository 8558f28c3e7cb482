//! Placed block model.
//!
//! A block is a teaching unit occupying one `(day, period)` slot for one
//! class. Under normal operation at most one block occupies a given
//! `(day, period, grade, class)` cell, but the model tolerates several so
//! that inconsistent states surface as conflicts instead of being dropped.

use serde::{Deserialize, Serialize};

use super::{Day, GroupId, Slot};

/// A block placed on the timetable grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBlock {
    /// Unique block identifier.
    pub id: String,
    pub subject_id: String,
    pub teacher_id: Option<String>,
    pub day: Day,
    pub period: u8,
    pub grade: u8,
    pub class_num: u8,
    pub room_id: Option<String>,
    /// Backend lecture group this block belongs to.
    pub group_id: Option<GroupId>,
    /// Card the block was placed from, if any.
    pub source_card_id: Option<String>,
    /// Advisory messages, recomputed on every revalidation.
    pub warnings: Vec<String>,
}

impl ClassBlock {
    /// Creates a block with no teacher, room or group.
    pub fn new(
        id: impl Into<String>,
        subject_id: impl Into<String>,
        slot: Slot,
        grade: u8,
        class_num: u8,
    ) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            teacher_id: None,
            day: slot.day,
            period: slot.period,
            grade,
            class_num,
            room_id: None,
            group_id: None,
            source_card_id: None,
            warnings: Vec::new(),
        }
    }

    /// Sets the teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Sets the room.
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Sets the backend group.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Records the card this block was placed from.
    pub fn with_source_card(mut self, card_id: impl Into<String>) -> Self {
        self.source_card_id = Some(card_id.into());
        self
    }

    /// The `(day, period)` slot.
    #[inline]
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_builder_and_slot() {
        let b = ClassBlock::new("b1", "kor", Slot::new(Day::Mon, 3), 1, 2)
            .with_teacher("t1")
            .with_room("lab")
            .with_group(GroupId(9));
        assert_eq!(b.slot(), Slot::new(Day::Mon, 3));
        assert_eq!(b.teacher_id.as_deref(), Some("t1"));
        assert_eq!(b.group_id, Some(GroupId(9)));
        assert!(b.warnings.is_empty());
    }
}
