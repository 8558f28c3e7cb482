//! Timetable service object.
//!
//! Owns the editing session (`blocks`, unassigned pool, conflicts, sync
//! states) and the injected backend. Local edits are synchronous; the only
//! suspension points are backend calls, and the session lock is never held
//! across one.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::placement::PlacementCommand;
use super::{hydrate, GroupResolver, Placement, PlacementError, SyncState};
use crate::config::TimetableConfig;
use crate::engine::BlockAssignmentEngine;
use crate::error::{TimetableError, TimetableResult};
use crate::gateway::{
    sample_catalog, CatalogRepository, CatalogSource, GatewayError, IdMap, ScheduleGateway,
};
use crate::generator;
use crate::ids::local_id;
use crate::models::{
    ClassBlock, Conflict, Curriculum, GroupId, NewLectureBlock, ScheduleId, Slot, Teacher,
    UnassignedCard,
};

/// Mutable session state, guarded by the service lock.
#[derive(Debug, Default)]
pub(super) struct SessionState {
    pub(super) engine: BlockAssignmentEngine,
    pub(super) unassigned: Vec<UnassignedCard>,
    pub(super) in_flight: HashSet<String>,
    pub(super) sync: HashMap<String, SyncState>,
    // groups created for cards whose placement did not commit
    pub(super) resolved_groups: HashMap<String, GroupId>,
    // removed locally, possibly still stored on the backend
    pub(super) pending_removals: BTreeSet<String>,
    pub(super) schedule_id: Option<ScheduleId>,
    pub(super) ids: IdMap,
    pub(super) catalog_source: Option<CatalogSource>,
}

/// Result of a bulk auto-schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoScheduleReport {
    /// Blocks the solver reported as created.
    pub created_blocks: usize,
    /// Cards left in the pool after the resync.
    pub remaining_cards: usize,
}

/// Timetable editing service.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use u_timetable::config::TimetableConfig;
/// use u_timetable::gateway::InMemoryBackend;
/// use u_timetable::sync::TimetableService;
///
/// let backend = Arc::new(InMemoryBackend::new());
/// let service = TimetableService::new(TimetableConfig::default(), backend.clone(), backend);
/// assert!(service.blocks().is_empty());
/// ```
pub struct TimetableService {
    config: TimetableConfig,
    gateway: Arc<dyn ScheduleGateway>,
    catalog: Arc<dyn CatalogRepository>,
    state: Mutex<SessionState>,
}

impl TimetableService {
    pub fn new(
        config: TimetableConfig,
        gateway: Arc<dyn ScheduleGateway>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        let engine =
            BlockAssignmentEngine::new().with_daily_load_warning(config.daily_load_warning);
        Self {
            config,
            gateway,
            catalog,
            state: Mutex::new(SessionState {
                engine,
                ..SessionState::default()
            }),
        }
    }

    pub fn config(&self) -> &TimetableConfig {
        &self.config
    }

    // ==================== Catalog & schedule ====================

    /// Loads the school's teachers and subjects.
    ///
    /// A failed or empty fetch installs the built-in sample catalog.
    pub async fn load_catalog(&self) -> CatalogSource {
        let fetched = self.catalog.fetch_catalog(self.config.school_id).await;
        let (catalog, source) = match fetched {
            Ok(c) if !c.is_empty() => (c, CatalogSource::Remote),
            Ok(_) => {
                log::warn!(
                    "Catalog for school {} is empty; using sample catalog",
                    self.config.school_id
                );
                (sample_catalog(), CatalogSource::Fallback)
            }
            Err(e) => {
                log::warn!("Catalog fetch failed ({}); using sample catalog", e);
                (sample_catalog(), CatalogSource::Fallback)
            }
        };

        let mut state = self.state.lock();
        state.engine.set_roster(catalog.teachers, catalog.subjects);
        state.ids = catalog.ids;
        state.catalog_source = Some(source);
        source
    }

    /// Returns the active schedule id, creating the schedule if none exists.
    pub async fn ensure_active_schedule(&self) -> TimetableResult<ScheduleId> {
        if let Some(id) = self.state.lock().schedule_id {
            return Ok(id);
        }
        let schedule = match self.gateway.get_active_schedule().await? {
            Some(s) => s,
            None => {
                log::info!("No active schedule; creating '{}'", self.config.schedule_name);
                self.gateway.create_schedule(&self.config.schedule_name).await?
            }
        };
        self.state.lock().schedule_id = Some(schedule.id);
        Ok(schedule.id)
    }

    pub fn schedule_id(&self) -> Option<ScheduleId> {
        self.state.lock().schedule_id
    }

    pub fn catalog_source(&self) -> Option<CatalogSource> {
        self.state.lock().catalog_source
    }

    // ==================== Cards ====================

    /// Regenerates the unassigned pool from a curriculum.
    ///
    /// Replaces the whole pool; cards already converted into blocks are not
    /// recreated. Returns the new pool size.
    pub fn generate_cards(&self, curriculum: &Curriculum) -> usize {
        let cards = generator::generate_cards(curriculum);
        let mut state = self.state.lock();
        let placed: HashSet<&str> = state
            .engine
            .blocks()
            .iter()
            .filter_map(|b| b.source_card_id.as_deref())
            .collect();
        let pool: Vec<UnassignedCard> = cards
            .into_iter()
            .filter(|c| !placed.contains(c.id.as_str()))
            .collect();
        let count = pool.len();
        state.unassigned = pool;
        count
    }

    /// Batch-creates lecture groups for pool cards that have none.
    ///
    /// Cards that already got a group from an earlier placement attempt
    /// take that group instead. Cards whose subject has no backend id are
    /// skipped. Returns the number of groups created.
    pub async fn publish_cards(&self) -> TimetableResult<usize> {
        let (schedule_id, requests) = {
            let mut state = self.state.lock();
            let schedule_id = state.schedule_id.ok_or(TimetableError::NoActiveSchedule)?;
            adopt_resolved_groups(&mut state);
            let resolver = self.resolver(&state.ids);
            let mut requests = Vec::new();
            for card in state
                .unassigned
                .iter()
                .filter(|c| c.group_id.is_none() && !state.in_flight.contains(&c.id))
            {
                match resolver.request_for(card) {
                    Ok(req) => requests.push((card.id.clone(), req)),
                    Err(e) => log::warn!("Card {} not published: {}", card.id, e),
                }
            }
            (schedule_id, requests)
        };
        if requests.is_empty() {
            return Ok(0);
        }

        let bodies: Vec<_> = requests.iter().map(|(_, r)| r.clone()).collect();
        let groups = self.gateway.create_groups_batch(schedule_id, &bodies).await?;
        if groups.len() != requests.len() {
            return Err(GatewayError::Malformed(format!(
                "Batch returned {} groups for {} requests",
                groups.len(),
                requests.len()
            ))
            .into());
        }

        let mut state = self.state.lock();
        for ((card_id, _), group) in requests.iter().zip(&groups) {
            if let Some(card) = state.unassigned.iter_mut().find(|c| &c.id == card_id) {
                card.group_id = Some(group.id);
            }
        }
        log::info!("Published {} lecture groups", groups.len());
        Ok(groups.len())
    }

    // ==================== Placement ====================

    /// Places a pool card at a slot for the card's own class.
    ///
    /// # Returns
    /// * `Ok(Placement)` - the block exists locally; check `sync` for its
    ///   backend status
    /// * `Err(PlacementError::Rejected)` - the backend refused the block;
    ///   local state is unchanged
    /// * `Err(PlacementError::InFlight | UnknownCard | OutOfGrid)` - nothing
    ///   attempted
    pub async fn place_card(&self, card_id: &str, slot: Slot) -> Result<Placement, PlacementError> {
        if !self.config.contains(slot) {
            return Err(PlacementError::OutOfGrid(slot));
        }
        let (cmd, schedule_id, known_group, resolver, room_id) = {
            let mut state = self.state.lock();
            let cmd = PlacementCommand::begin(&mut state, card_id, slot)?;
            let known_group = cmd
                .card()
                .group_id
                .or_else(|| state.resolved_groups.get(card_id).copied());
            let room_id = cmd.room().and_then(|r| state.ids.room_backend_id(r));
            (cmd, state.schedule_id, known_group, self.resolver(&state.ids), room_id)
        };

        let group_id = match (known_group, schedule_id) {
            (Some(g), _) => Some(g),
            (None, None) => {
                log::warn!("No active schedule; card {} placed locally only", card_id);
                None
            }
            (None, Some(schedule)) => match resolver.resolve_group_id(schedule, cmd.card()).await {
                Ok(g) => {
                    self.state
                        .lock()
                        .resolved_groups
                        .insert(cmd.card().id.clone(), g);
                    Some(g)
                }
                Err(e) => {
                    log::warn!(
                        "Group creation for card {} failed ({}); placing locally only",
                        card_id,
                        e
                    );
                    None
                }
            },
        };

        let sync = match group_id {
            None => SyncState::LocalOnly,
            Some(group_id) => {
                let request = NewLectureBlock {
                    group_id,
                    day: cmd.slot().day,
                    period: cmd.slot().period,
                    room_id,
                    is_fixed: self.config.fixed_blocks,
                };
                match self.gateway.create_block(&request).await {
                    Ok(remote) => SyncState::Synced {
                        remote_block_id: remote.id,
                    },
                    Err(GatewayError::Rejected { errors }) => {
                        cmd.abort(&mut self.state.lock());
                        return Err(PlacementError::Rejected(errors));
                    }
                    Err(e) => {
                        log::warn!(
                            "Block creation for card {} unconfirmed ({}); keeping local block",
                            card_id,
                            e
                        );
                        SyncState::Unconfirmed
                    }
                }
            }
        };

        let mut state = self.state.lock();
        cmd.commit(&mut state, group_id, sync)
    }

    /// Asks the backend whether a card could be placed at a slot.
    ///
    /// Nothing is stored locally or remotely. Returns the messages the
    /// placement would be rejected with; empty means it would be accepted.
    /// A card without a lecture group cannot be checked yet.
    pub async fn preview_placement(
        &self,
        card_id: &str,
        slot: Slot,
    ) -> Result<Vec<String>, PlacementError> {
        if !self.config.contains(slot) {
            return Err(PlacementError::OutOfGrid(slot));
        }
        let request = {
            let state = self.state.lock();
            let card = state
                .unassigned
                .iter()
                .find(|c| c.id == card_id)
                .ok_or_else(|| PlacementError::UnknownCard(card_id.to_string()))?;
            let group_id = card
                .group_id
                .or_else(|| state.resolved_groups.get(card_id).copied())
                .ok_or_else(|| {
                    PlacementError::Unchecked(format!("card {} has no lecture group", card_id))
                })?;
            let room_id = state
                .engine
                .subject(&card.subject_id)
                .and_then(|s| s.required_room.as_deref())
                .and_then(|r| state.ids.room_backend_id(r));
            NewLectureBlock {
                group_id,
                day: slot.day,
                period: slot.period,
                room_id,
                is_fixed: self.config.fixed_blocks,
            }
        };

        self.gateway.check_block(&request).await.map_err(|e| {
            log::warn!("Preview of card {} at {} failed ({})", card_id, slot, e);
            PlacementError::Unchecked(e.to_string())
        })
    }

    /// Whether a placement of this card is in progress.
    pub fn is_in_flight(&self, card_id: &str) -> bool {
        self.state.lock().in_flight.contains(card_id)
    }

    // ==================== Local edits ====================

    /// Adds a block with no teacher. The block has no backend record.
    ///
    /// Returns `None` when the slot lies outside the grid.
    pub fn add_block(
        &self,
        subject_id: &str,
        slot: Slot,
        grade: u8,
        class_num: u8,
    ) -> Option<String> {
        if !self.config.contains(slot) {
            return None;
        }
        let mut state = self.state.lock();
        let id = state.engine.add_block(subject_id, slot, grade, class_num);
        state.sync.insert(id.clone(), SyncState::LocalOnly);
        Some(id)
    }

    /// Moves a block. Unknown ids and out-of-grid slots are a no-op
    /// returning `false`.
    pub fn move_block(&self, block_id: &str, slot: Slot, grade: u8, class_num: u8) -> bool {
        if !self.config.contains(slot) {
            return false;
        }
        let mut state = self.state.lock();
        let moved = state.engine.move_block(block_id, slot, grade, class_num);
        if moved {
            mark_diverged(&mut state, block_id);
        }
        moved
    }

    /// Deletes a block.
    ///
    /// A block with a group may still be stored on the backend; it stays in
    /// `unsynced_block_ids` until the next resync.
    pub fn remove_block(&self, block_id: &str) -> Option<ClassBlock> {
        let mut state = self.state.lock();
        let removed = state.engine.remove_block(block_id)?;
        forget_block(&mut state, &removed);
        Some(removed)
    }

    /// Sets a block's teacher. Unknown ids are a no-op returning `false`.
    pub fn assign_teacher_to_block(&self, block_id: &str, teacher_id: &str) -> bool {
        let mut state = self.state.lock();
        let assigned = state.engine.assign_teacher_to_block(block_id, teacher_id);
        if assigned {
            mark_diverged(&mut state, block_id);
        }
        assigned
    }

    /// Returns a block to the pool as a one-credit card. Returns the card id.
    pub fn unassign_block(&self, block_id: &str) -> Option<String> {
        let mut state = self.state.lock();
        let block = state.engine.remove_block(block_id)?;
        forget_block(&mut state, &block);

        let mut card = UnassignedCard::new(
            local_id("card"),
            block.subject_id,
            1,
            block.grade,
            block.class_num,
        );
        card.teacher_id = block.teacher_id;
        card.group_id = block.group_id;
        let id = card.id.clone();
        state.unassigned.push(card);
        Some(id)
    }

    // ==================== Resync & auto-schedule ====================

    /// Replaces blocks and pool with the backend's state.
    ///
    /// Pool cards that were never published have no backend record and are
    /// carried over; a card whose group was created during a rejected
    /// placement comes back as that group's remaining-credit card instead.
    /// Local removals are undone. On failure the session is left untouched.
    pub async fn resync(&self) -> TimetableResult<()> {
        let schedule_id = self.require_schedule()?;
        let groups = self.gateway.list_groups(schedule_id).await?;
        let blocks = self.gateway.list_blocks(schedule_id).await?;

        let mut state = self.state.lock();
        let hydrated = hydrate(&groups, &blocks, &state.ids);
        let dropped = state.sync.values().filter(|s| !s.is_synced()).count();
        if dropped > 0 {
            log::warn!("Resync discarded {} unsynced local blocks", dropped);
        }
        if !state.pending_removals.is_empty() {
            log::warn!(
                "Resync restored {} locally removed blocks",
                state.pending_removals.len()
            );
        }
        log::info!(
            "Resynced schedule {}: {} blocks, {} remaining cards",
            schedule_id,
            hydrated.blocks.len(),
            hydrated.cards.len()
        );
        let unpublished: Vec<UnassignedCard> = state
            .unassigned
            .iter()
            .filter(|c| c.group_id.is_none() && !state.resolved_groups.contains_key(&c.id))
            .cloned()
            .collect();
        state.engine.replace_blocks(hydrated.blocks);
        state.unassigned = hydrated.cards;
        state.unassigned.extend(unpublished);
        state.sync = hydrated.sync;
        state.resolved_groups.clear();
        state.pending_removals.clear();
        Ok(())
    }

    /// Runs the backend solver over every unassigned card, then resyncs.
    ///
    /// Cards without a group are published first. On any failure the
    /// session is left untouched and the error is returned.
    pub async fn auto_schedule(&self) -> TimetableResult<AutoScheduleReport> {
        let schedule_id = self.require_schedule()?;
        self.publish_cards().await?;

        let created = match self.gateway.auto_schedule(schedule_id).await {
            Ok(created) => created,
            Err(e) => {
                log::warn!("Auto-schedule failed: {}", e);
                return Err(e.into());
            }
        };
        self.resync().await?;

        let report = AutoScheduleReport {
            created_blocks: created.len(),
            remaining_cards: self.state.lock().unassigned.len(),
        };
        log::info!(
            "Auto-schedule created {} blocks; {} cards remain",
            report.created_blocks,
            report.remaining_cards
        );
        Ok(report)
    }

    /// Runs the backend's whole-schedule validator. Empty means valid.
    pub async fn validate_schedule(&self) -> TimetableResult<Vec<String>> {
        let schedule_id = self.require_schedule()?;
        let errors = self.gateway.validate_schedule(schedule_id).await?;
        if !errors.is_empty() {
            log::info!(
                "Schedule {} has {} validation errors",
                schedule_id,
                errors.len()
            );
        }
        Ok(errors)
    }

    // ==================== Views ====================

    pub fn blocks(&self) -> Vec<ClassBlock> {
        self.state.lock().engine.blocks().to_vec()
    }

    pub fn block(&self, block_id: &str) -> Option<ClassBlock> {
        self.state.lock().engine.block(block_id).cloned()
    }

    /// One teacher's blocks.
    pub fn teacher_timetable(&self, teacher_id: &str) -> Vec<ClassBlock> {
        let state = self.state.lock();
        state
            .engine
            .blocks_for_teacher(teacher_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// One class's blocks.
    pub fn class_timetable(&self, grade: u8, class_num: u8) -> Vec<ClassBlock> {
        let state = self.state.lock();
        state
            .engine
            .blocks_for_class(grade, class_num)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn unassigned_cards(&self) -> Vec<UnassignedCard> {
        self.state.lock().unassigned.clone()
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.state.lock().engine.conflicts().to_vec()
    }

    pub fn teachers(&self) -> Vec<Teacher> {
        self.state.lock().engine.teachers().to_vec()
    }

    pub fn sync_state(&self, block_id: &str) -> Option<SyncState> {
        self.state.lock().sync.get(block_id).copied()
    }

    /// Blocks whose local state differs from the backend, sorted: blocks
    /// without a confirmed record and removed blocks the backend may still
    /// hold.
    pub fn unsynced_block_ids(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut ids: Vec<String> = state
            .sync
            .iter()
            .filter(|(_, s)| !s.is_synced())
            .map(|(id, _)| id.clone())
            .chain(state.pending_removals.iter().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Whether any local change is not reflected on the backend.
    pub fn is_sync_degraded(&self) -> bool {
        let state = self.state.lock();
        !state.pending_removals.is_empty() || state.sync.values().any(|s| !s.is_synced())
    }

    fn require_schedule(&self) -> TimetableResult<ScheduleId> {
        self.state
            .lock()
            .schedule_id
            .ok_or(TimetableError::NoActiveSchedule)
    }

    fn resolver(&self, ids: &IdMap) -> GroupResolver {
        GroupResolver::new(
            Arc::clone(&self.gateway),
            ids.clone(),
            self.config.unassigned_teacher_id,
        )
    }
}

fn mark_diverged(state: &mut SessionState, block_id: &str) {
    if let Some(sync) = state.sync.get_mut(block_id) {
        *sync = SyncState::LocalOnly;
    }
}

fn forget_block(state: &mut SessionState, block: &ClassBlock) {
    state.sync.remove(&block.id);
    if block.group_id.is_some() {
        state.pending_removals.insert(block.id.clone());
    }
}

/// Gives idle pool cards the groups created for them by rejected
/// placements.
fn adopt_resolved_groups(state: &mut SessionState) {
    let SessionState {
        unassigned,
        in_flight,
        resolved_groups,
        ..
    } = state;
    for card in unassigned
        .iter_mut()
        .filter(|c| c.group_id.is_none() && !in_flight.contains(&c.id))
    {
        if let Some(group) = resolved_groups.remove(&card.id) {
            card.group_id = Some(group);
        }
    }
}
