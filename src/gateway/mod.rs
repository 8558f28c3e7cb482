//! Backend contract.
//!
//! The timetable core talks to its authoritative store through two traits,
//! so that different backends (HTTP client, in-memory fake) can be swapped
//! via dependency injection:
//!
//! - [`CatalogRepository`]: read-only teacher/subject catalog for a school.
//! - [`ScheduleGateway`]: schedules, lecture groups, blocks, the block
//!   validator and the bulk auto-scheduler.
//!
//! # Error Taxonomy
//! [`GatewayError::Rejected`] is a hard validation rejection: the backend
//! examined the request and refused it with human-readable reasons. Every
//! other variant is a soft failure (transport, parse, missing record,
//! solver failure) that callers may degrade around.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync` so a service can share them
//! across tasks.

use async_trait::async_trait;

use crate::models::{
    LectureBlock, LectureGroup, NewLectureBlock, NewLectureGroup, ScheduleId, ScheduleMetadata,
};

mod catalog;
mod memory;
pub mod wire;

pub use catalog::{sample_catalog, Catalog, CatalogSource, IdMap};
pub use memory::{Endpoint, InMemoryBackend};

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error type for gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Validation rejected: {}", .errors.join("; "))]
    Rejected { errors: Vec<String> },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scheduling failed: {0}")]
    Solver(String),
}

/// Read-only catalog source.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Fetch teachers and subjects for a school, with their backend ids.
    ///
    /// An empty catalog is a valid answer; the caller decides whether to
    /// fall back.
    async fn fetch_catalog(&self, school_id: i64) -> GatewayResult<Catalog>;
}

/// Schedule, group and block operations.
#[async_trait]
pub trait ScheduleGateway: Send + Sync {
    // ==================== Schedules ====================

    /// The active schedule, if one exists.
    async fn get_active_schedule(&self) -> GatewayResult<Option<ScheduleMetadata>>;

    /// Create a schedule and make it the active one.
    async fn create_schedule(&self, name: &str) -> GatewayResult<ScheduleMetadata>;

    // ==================== Reads ====================

    /// All lecture groups of a schedule.
    async fn list_groups(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureGroup>>;

    /// All blocks of a schedule.
    async fn list_blocks(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureBlock>>;

    // ==================== Writes ====================

    /// Create one lecture group.
    async fn create_group(
        &self,
        schedule_id: ScheduleId,
        group: &NewLectureGroup,
    ) -> GatewayResult<LectureGroup>;

    /// Create several lecture groups. The result is in request order.
    async fn create_groups_batch(
        &self,
        schedule_id: ScheduleId,
        groups: &[NewLectureGroup],
    ) -> GatewayResult<Vec<LectureGroup>>;

    /// Create a block under a group.
    ///
    /// # Returns
    /// * `Err(GatewayError::Rejected)` - the backend's validator refused the
    ///   placement; `errors` holds its messages verbatim
    async fn create_block(&self, block: &NewLectureBlock) -> GatewayResult<LectureBlock>;

    // ==================== Validation ====================

    /// Run the block validator without storing anything.
    ///
    /// Returns the messages `create_block` would reject with; empty means
    /// the block would be accepted.
    async fn check_block(&self, block: &NewLectureBlock) -> GatewayResult<Vec<String>>;

    /// Validate every stored block of a schedule. Empty means valid.
    async fn validate_schedule(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<String>>;

    // ==================== Auto-scheduling ====================

    /// Ask the backend solver to place every remaining credit of the
    /// schedule. Returns the blocks it created.
    async fn auto_schedule(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureBlock>>;
}
