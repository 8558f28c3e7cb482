//! Conflict model.
//!
//! Conflicts are derived data: they are recomputed in full from the current
//! block set after every mutation and are never patched or persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Slot;

/// Classification of scheduling conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    /// One teacher assigned to several blocks in the same slot.
    TeacherDoubleBook,
    /// More blocks of a subject in one slot than teachers for it.
    TeacherOverflow,
    /// One room assigned to several blocks in the same slot.
    RoomDoubleBook,
    /// Block placed on one of its teacher's time-off slots.
    TeacherTimeOff,
}

impl ConflictType {
    /// Kebab-case tag (`"teacher-double-book"`).
    pub fn tag(&self) -> &'static str {
        match self {
            ConflictType::TeacherDoubleBook => "teacher-double-book",
            ConflictType::TeacherOverflow => "teacher-overflow",
            ConflictType::RoomDoubleBook => "room-double-book",
            ConflictType::TeacherTimeOff => "teacher-time-off",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Identifier derived from type, slot and offending key.
    pub id: String,
    pub conflict_type: ConflictType,
    /// Human-readable description.
    pub message: String,
    /// Offending blocks, in block-set order.
    pub block_ids: Vec<String>,
}

impl Conflict {
    fn new(
        conflict_type: ConflictType,
        slot: Slot,
        key: &str,
        message: String,
        block_ids: Vec<String>,
    ) -> Self {
        Self {
            id: format!("{}:{}:{}", conflict_type.tag(), slot, key),
            conflict_type,
            message,
            block_ids,
        }
    }

    /// Creates a teacher double-booking conflict.
    pub fn teacher_double_book(
        slot: Slot,
        teacher_id: &str,
        teacher_name: &str,
        block_ids: Vec<String>,
    ) -> Self {
        let message = format!(
            "Teacher double booking: {} is assigned to {} classes at {}",
            teacher_name,
            block_ids.len(),
            slot
        );
        Self::new(ConflictType::TeacherDoubleBook, slot, teacher_id, message, block_ids)
    }

    /// Creates a teacher overflow conflict.
    pub fn teacher_overflow(
        slot: Slot,
        subject_id: &str,
        subject_name: &str,
        available: usize,
        block_ids: Vec<String>,
    ) -> Self {
        let message = format!(
            "Not enough {} teachers at {}: {} needed, {} available",
            subject_name,
            slot,
            block_ids.len(),
            available
        );
        Self::new(ConflictType::TeacherOverflow, slot, subject_id, message, block_ids)
    }

    /// Creates a room double-booking conflict.
    pub fn room_double_book(slot: Slot, room_id: &str, block_ids: Vec<String>) -> Self {
        let message = format!("Room double booking: {room_id} is already in use at {slot}");
        Self::new(ConflictType::RoomDoubleBook, slot, room_id, message, block_ids)
    }

    /// Creates a time-off violation.
    pub fn teacher_time_off(
        slot: Slot,
        teacher_id: &str,
        teacher_name: &str,
        reason: Option<&str>,
        block_ids: Vec<String>,
    ) -> Self {
        let message = match reason {
            Some(r) => format!("{teacher_name} is unavailable at {slot} ({r})"),
            None => format!("{teacher_name} is unavailable at {slot}"),
        };
        Self::new(ConflictType::TeacherTimeOff, slot, teacher_id, message, block_ids)
    }
}
