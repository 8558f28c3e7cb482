//! Timetable domain models.
//!
//! Plain data types shared by the card generator, conflict validator,
//! assignment engine and synchronization layer.
//!
//! # Domain Mappings
//!
//! | u-timetable | Scheduling term | Backend record |
//! |-------------|-----------------|----------------|
//! | UnassignedCard | Unscheduled activity | (remaining credits of) LectureGroup |
//! | ClassBlock | Assignment | LectureBlock |
//! | Teacher | Human resource | Teacher |
//! | Slot | Time bucket | (day, period) |

mod block;
mod card;
mod conflict;
mod curriculum;
mod grid;
mod remote;
mod teacher;

pub use block::ClassBlock;
pub use card::UnassignedCard;
pub use conflict::{Conflict, ConflictType};
pub use curriculum::{
    BlockGroupDefinition, Curriculum, DepartmentInfo, GradeConfig, GradeCredit, SlicingOption,
    SubjectInfo,
};
pub use grid::{Day, Slot};
pub use remote::{
    GroupId, LectureBlock, LectureGroup, NewLectureBlock, NewLectureGroup, RemoteBlockId,
    ScheduleId, ScheduleMetadata,
};
pub use teacher::{Teacher, TimeOffSlot};
