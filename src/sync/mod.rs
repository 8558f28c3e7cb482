//! Group synchronization layer.
//!
//! Moves cards onto the grid while keeping the backend's lecture groups
//! and blocks in step with local state.
//!
//! # Placement State Machine
//!
//! | State | Transition |
//! |-------|------------|
//! | Unassigned | card in the pool, possibly without a group id |
//! | GroupResolution | create a lecture group if the card has none; failure degrades to LocalOnly |
//! | RemoteValidation | create the block; a structured rejection aborts, any other failure proceeds |
//! | Assigned | card leaves the pool and the block appears, in one step |
//!
//! A card is marked in-flight the moment a placement begins; further
//! attempts on the same card fail with [`PlacementError::InFlight`] until
//! the first settles.
//!
//! A group created for a card outlives a rejected placement. The service
//! remembers it per card id, so a retry reuses it instead of leaving an
//! orphan group on the backend.
//!
//! # Resync
//! Bulk operations never merge remote deltas. After auto-scheduling, the
//! service discards its blocks and pool and rebuilds both from the
//! backend's groups and blocks (see [`hydrate`]).

use serde::{Deserialize, Serialize};

use crate::models::{GroupId, RemoteBlockId, Slot};

mod hydrate;
mod placement;
mod resolver;
mod service;

pub use hydrate::{hydrate, remaining_card_id, remote_block_key, Hydrated};
pub use resolver::GroupResolver;
pub use service::{AutoScheduleReport, TimetableService};

/// Backend linkage of a placed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SyncState {
    /// The backend confirmed the block.
    Synced { remote_block_id: RemoteBlockId },
    /// No backend record: group resolution failed, the block was created
    /// by a local edit, or it was changed locally after syncing.
    LocalOnly,
    /// Block creation was attempted but its outcome is unknown.
    Unconfirmed,
}

impl SyncState {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncState::Synced { .. })
    }
}

/// Outcome of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Id of the new block.
    pub block_id: String,
    /// Group the block belongs to, if one was resolved.
    pub group_id: Option<GroupId>,
    pub sync: SyncState,
}

/// Reasons a placement did not happen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The backend validator refused the block. Messages are verbatim.
    #[error("Placement rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("Card {0} already has a placement in progress")]
    InFlight(String),

    #[error("Card {0} is not in the unassigned pool")]
    UnknownCard(String),

    #[error("Slot {0} is outside the timetable grid")]
    OutOfGrid(Slot),

    /// A preview could not be checked against the backend.
    #[error("Placement not checked: {0}")]
    Unchecked(String),
}
