//! Backend-persisted records.
//!
//! The backend owns the persistence format; these types mirror the subset
//! of its records the timetable core reads and writes. Backend identifiers
//! are integers and are wrapped in newtypes so they cannot be confused with
//! each other or with client-generated string ids.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Day, SlicingOption, Slot};

macro_rules! backend_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

backend_id!(ScheduleId);
backend_id!(GroupId);
backend_id!(RemoteBlockId);

/// A timetable version on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub id: ScheduleId,
    pub name: String,
    pub is_active: bool,
}

/// Request body for creating a lecture group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLectureGroup {
    pub subject_id: i64,
    /// `None` = unassigned placeholder.
    pub teacher_id: Option<i64>,
    pub grade: u8,
    pub class_num: u8,
    pub total_credits: u8,
    pub slicing_option: Option<SlicingOption>,
}

/// A lecture group: one subject taught by one teacher to one class,
/// with a total weekly credit weight that its blocks fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureGroup {
    pub id: GroupId,
    pub schedule_id: ScheduleId,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub grade: u8,
    pub class_num: u8,
    pub total_credits: u8,
    pub slicing_option: Option<SlicingOption>,
}

impl LectureGroup {
    /// Creates a group record from a request.
    pub fn from_request(id: GroupId, schedule_id: ScheduleId, req: &NewLectureGroup) -> Self {
        Self {
            id,
            schedule_id,
            subject_id: req.subject_id,
            teacher_id: req.teacher_id,
            grade: req.grade,
            class_num: req.class_num,
            total_credits: req.total_credits,
            slicing_option: req.slicing_option,
        }
    }
}

/// Request body for creating a block under a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLectureBlock {
    pub group_id: GroupId,
    pub day: Day,
    pub period: u8,
    pub room_id: Option<i64>,
    pub is_fixed: bool,
}

/// A persisted block: one period of a group placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureBlock {
    pub id: RemoteBlockId,
    pub group_id: GroupId,
    pub day: Day,
    pub period: u8,
    pub room_id: Option<i64>,
    pub is_fixed: bool,
}

impl LectureBlock {
    /// The slot this block occupies.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }
}
