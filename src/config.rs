//! Timetable configuration file support.
//!
//! Reads service settings from a TOML file. Every key is optional and falls
//! back to its default:
//!
//! ```toml
//! school_id = 12
//! schedule_name = "2025 Spring"
//! days = ["MON", "TUE", "WED", "THU", "FRI"]
//! periods_per_day = 7
//! unassigned_teacher_id = 0
//! fixed_blocks = false
//! daily_load_warning = 4
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::DEFAULT_DAILY_LOAD_WARNING;
use crate::error::TimetableError;
use crate::models::{Day, Slot};

/// Timetable service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableConfig {
    /// School whose teacher/subject catalog is loaded.
    pub school_id: i64,
    /// Name given to the active schedule when one has to be created.
    pub schedule_name: String,
    /// Teaching days.
    pub days: Vec<Day>,
    /// Periods per day (1-based, inclusive).
    pub periods_per_day: u8,
    /// Backend teacher id used for lecture groups created before a
    /// teacher is chosen. `None` sends no teacher.
    pub unassigned_teacher_id: Option<i64>,
    /// `is_fixed` flag sent with every block creation.
    pub fixed_blocks: bool,
    /// Blocks per teacher per day above which a warning is attached.
    pub daily_load_warning: usize,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            school_id: 1,
            schedule_name: "Timetable".to_string(),
            days: Day::WEEKDAYS.to_vec(),
            periods_per_day: 7,
            unassigned_teacher_id: None,
            fixed_blocks: false,
            daily_load_warning: DEFAULT_DAILY_LOAD_WARNING,
        }
    }
}

impl TimetableConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(TimetableConfig)` if the file is readable, parses and is valid
    /// * `Err(TimetableError::Config)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TimetableError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TimetableError::Config(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, TimetableError> {
        let config: TimetableConfig = toml::from_str(content).map_err(|e| {
            TimetableError::Config(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the grid is non-empty.
    pub fn validate(&self) -> Result<(), TimetableError> {
        if self.days.is_empty() {
            return Err(TimetableError::Config("At least one day is required".into()));
        }
        if self.periods_per_day == 0 {
            return Err(TimetableError::Config("periods_per_day must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether a slot lies inside the configured grid. Placement and local
    /// edits refuse slots outside it.
    pub fn contains(&self, slot: Slot) -> bool {
        self.days.contains(&slot.day) && (1..=self.periods_per_day).contains(&slot.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = TimetableConfig::default();
        assert_eq!(c.days.len(), 5);
        assert_eq!(c.periods_per_day, 7);
        assert!(c.contains(Slot::new(Day::Fri, 7)));
        assert!(!c.contains(Slot::new(Day::Fri, 0)));
        assert!(c.unassigned_teacher_id.is_none());
    }

    #[test]
    fn test_partial_toml_falls_back() {
        let c = TimetableConfig::from_toml_str(
            r#"
            school_id = 12
            days = ["MON", "WED"]
            periods_per_day = 6
            unassigned_teacher_id = 0
            "#,
        )
        .unwrap();
        assert_eq!(c.school_id, 12);
        assert_eq!(c.days, vec![Day::Mon, Day::Wed]);
        assert_eq!(c.unassigned_teacher_id, Some(0));
        assert_eq!(c.daily_load_warning, DEFAULT_DAILY_LOAD_WARNING);
        assert!(c.contains(Slot::new(Day::Wed, 6)));
        assert!(!c.contains(Slot::new(Day::Tue, 1)));
        assert!(!c.contains(Slot::new(Day::Mon, 7)));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            TimetableConfig::from_toml_str("periods_per_day = 0"),
            Err(TimetableError::Config(_))
        ));
        assert!(matches!(
            TimetableConfig::from_toml_str("days = []"),
            Err(TimetableError::Config(_))
        ));
        assert!(matches!(
            TimetableConfig::from_toml_str("days = [\"SUN\"]"),
            Err(TimetableError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("u-timetable-{}.toml", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "schedule_name = \"Spring\"").unwrap();
        drop(f);

        let c = TimetableConfig::from_file(&path).unwrap();
        assert_eq!(c.schedule_name, "Spring");
        fs::remove_file(&path).unwrap();

        assert!(TimetableConfig::from_file(&path).is_err());
    }
}
