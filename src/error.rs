//! Service-level error type.

use crate::gateway::GatewayError;

/// Result type for timetable service operations.
pub type TimetableResult<T> = Result<T, TimetableError>;

/// Errors surfaced by the timetable service.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    #[error("No active schedule; call ensure_active_schedule first")]
    NoActiveSchedule,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
