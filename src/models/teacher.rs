//! Teacher model.
//!
//! Teachers are the scarce resource of a timetable: a teacher can be in
//! at most one classroom per slot. Affinity (`subject_id`) and weekly load
//! (`max_hours_per_week`) are advisory and not enforced on assignment.

use serde::{Deserialize, Serialize};

use super::{Day, Slot};

/// A slot in which a teacher cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffSlot {
    pub day: Day,
    pub period: u8,
    /// Free-text reason ("childcare", "admin duty").
    pub reason: Option<String>,
}

impl TimeOffSlot {
    /// Creates a time-off slot without a reason.
    pub fn new(day: Day, period: u8) -> Self {
        Self {
            day,
            period,
            reason: None,
        }
    }

    /// Sets the reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The slot this entry blocks.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }
}

/// A teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Display name, embedded in conflict messages.
    pub name: String,
    /// Primary subject (or department) reference.
    pub subject_id: String,
    /// Homeroom class, e.g. `"1-1"`.
    pub homeroom_class: Option<String>,
    /// Recommended weekly teaching hours.
    pub max_hours_per_week: Option<u8>,
    pub is_assistant_homeroom: bool,
    pub is_department_head: bool,
    /// Slots the teacher is unavailable.
    pub time_off: Vec<TimeOffSlot>,
}

impl Teacher {
    /// Creates a teacher with no subject.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subject_id: String::new(),
            homeroom_class: None,
            max_hours_per_week: None,
            is_assistant_homeroom: false,
            is_department_head: false,
            time_off: Vec::new(),
        }
    }

    /// Sets the primary subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = subject_id.into();
        self
    }

    /// Sets the homeroom class.
    pub fn with_homeroom(mut self, class: impl Into<String>) -> Self {
        self.homeroom_class = Some(class.into());
        self
    }

    /// Sets the recommended weekly hours.
    pub fn with_max_hours(mut self, hours: u8) -> Self {
        self.max_hours_per_week = Some(hours);
        self
    }

    /// Marks the teacher as assistant homeroom teacher.
    pub fn assistant_homeroom(mut self) -> Self {
        self.is_assistant_homeroom = true;
        self
    }

    /// Marks the teacher as department head.
    pub fn department_head(mut self) -> Self {
        self.is_department_head = true;
        self
    }

    /// Adds a time-off slot.
    pub fn with_time_off(mut self, slot: TimeOffSlot) -> Self {
        self.time_off.push(slot);
        self
    }

    /// Time-off entry covering `slot`, if any.
    pub fn time_off_at(&self, slot: Slot) -> Option<&TimeOffSlot> {
        self.time_off.iter().find(|t| t.slot() == slot)
    }
}
