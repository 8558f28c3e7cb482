//! Card placement as a command with a pre-mutation snapshot.
//!
//! `begin` validates the card and marks it in-flight; `commit` turns it into
//! a block in one step; `abort` restores the snapshot. All three run under
//! the service lock, never across a network call.
//!
//! `abort` leaves `resolved_groups` alone: a group created for the card
//! still exists on the backend.

use super::service::SessionState;
use super::{Placement, PlacementError, SyncState};
use crate::ids::local_id;
use crate::models::{ClassBlock, GroupId, Slot, UnassignedCard};

use super::hydrate::remote_block_key;

pub(super) struct PlacementCommand {
    snapshot: UnassignedCard,
    slot: Slot,
    room: Option<String>,
}

impl PlacementCommand {
    /// Marks the card in-flight and captures it.
    pub(super) fn begin(
        state: &mut SessionState,
        card_id: &str,
        slot: Slot,
    ) -> Result<Self, PlacementError> {
        if state.in_flight.contains(card_id) {
            return Err(PlacementError::InFlight(card_id.to_string()));
        }
        let card = state
            .unassigned
            .iter()
            .find(|c| c.id == card_id)
            .cloned()
            .ok_or_else(|| PlacementError::UnknownCard(card_id.to_string()))?;
        let room = state
            .engine
            .subject(&card.subject_id)
            .and_then(|s| s.required_room.clone());

        state.in_flight.insert(card.id.clone());
        log::debug!("Placing card {} at {}", card.id, slot);
        Ok(Self {
            snapshot: card,
            slot,
            room,
        })
    }

    pub(super) fn card(&self) -> &UnassignedCard {
        &self.snapshot
    }

    /// Room label the block will occupy.
    pub(super) fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub(super) fn slot(&self) -> Slot {
        self.slot
    }

    /// Puts the card back exactly as it was captured.
    pub(super) fn abort(self, state: &mut SessionState) {
        state.in_flight.remove(&self.snapshot.id);
        if let Some(card) = state.unassigned.iter_mut().find(|c| c.id == self.snapshot.id) {
            *card = self.snapshot;
        }
    }

    /// Removes the card and creates its block.
    pub(super) fn commit(
        self,
        state: &mut SessionState,
        group_id: Option<GroupId>,
        sync: SyncState,
    ) -> Result<Placement, PlacementError> {
        state.in_flight.remove(&self.snapshot.id);
        let Some(pos) = state.unassigned.iter().position(|c| c.id == self.snapshot.id) else {
            log::warn!(
                "Card {} left the pool during placement; no block created",
                self.snapshot.id
            );
            return Err(PlacementError::UnknownCard(self.snapshot.id));
        };
        let card = state.unassigned.remove(pos);
        state.resolved_groups.remove(&card.id);

        let block_id = match sync {
            SyncState::Synced { remote_block_id } => remote_block_key(remote_block_id),
            _ => local_id("blk"),
        };
        let mut block = ClassBlock::new(
            block_id.clone(),
            card.subject_id,
            self.slot,
            card.grade,
            card.class_num,
        )
        .with_source_card(card.id);
        block.teacher_id = card.teacher_id;
        block.room_id = self.room;
        block.group_id = group_id.or(card.group_id);

        let group_id = block.group_id;
        state.engine.insert_block(block);
        state.sync.insert(block_id.clone(), sync);

        Ok(Placement {
            block_id,
            group_id,
            sync,
        })
    }
}
