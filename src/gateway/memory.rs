//! In-memory backend.
//!
//! Implements both gateway traits over plain collections, for tests and
//! offline use. It mirrors the backend behavior the timetable core relies
//! on:
//!
//! - `create_block` runs the server-side validator (unknown group, teacher
//!   and room double booking, teacher time-off) and answers with a
//!   structured rejection when it fails. `check_block` runs the same
//!   validator without storing; `validate_schedule` checks every stored
//!   block of a schedule.
//! - `auto_schedule` fills every group's remaining credits first-fit over
//!   the grid, honoring teacher, class and time-off occupancy. It either
//!   places everything or nothing.
//!
//! Each endpoint can be made to fail with a chosen error, and every call
//! is counted, so callers can assert on degraded paths.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::{Catalog, CatalogRepository, GatewayError, GatewayResult, ScheduleGateway};
use crate::models::{
    Day, GroupId, LectureBlock, LectureGroup, NewLectureBlock, NewLectureGroup, RemoteBlockId,
    ScheduleId, ScheduleMetadata, Slot,
};

/// Backend operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchCatalog,
    GetActiveSchedule,
    CreateSchedule,
    ListGroups,
    ListBlocks,
    CreateGroup,
    CreateGroupsBatch,
    CreateBlock,
    CheckBlock,
    ValidateSchedule,
    AutoSchedule,
}

/// Shared in-memory backend. Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    data: Arc<RwLock<BackendData>>,
}

#[derive(Debug)]
struct BackendData {
    catalog: Catalog,
    schedules: Vec<ScheduleMetadata>,
    groups: BTreeMap<GroupId, LectureGroup>,
    blocks: BTreeMap<RemoteBlockId, LectureBlock>,
    // (teacher, slot) -> reason
    time_off: HashMap<(i64, Slot), String>,
    grid: Vec<Slot>,

    failures: HashMap<Endpoint, GatewayError>,
    calls: HashMap<Endpoint, usize>,

    next_schedule_id: i64,
    next_group_id: i64,
    next_block_id: i64,
}

impl Default for BackendData {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            schedules: Vec::new(),
            groups: BTreeMap::new(),
            blocks: BTreeMap::new(),
            time_off: HashMap::new(),
            grid: grid(&Day::WEEKDAYS, 7),
            failures: HashMap::new(),
            calls: HashMap::new(),
            next_schedule_id: 1,
            next_group_id: 1,
            next_block_id: 1,
        }
    }
}

fn grid(days: &[Day], periods: u8) -> Vec<Slot> {
    days.iter()
        .flat_map(|&d| (1..=periods).map(move |p| Slot::new(d, p)))
        .collect()
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with a Monday-Friday, 7-period grid.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BackendData::default())),
        }
    }

    /// Sets the grid the solver places blocks on.
    pub fn with_grid(self, days: &[Day], periods_per_day: u8) -> Self {
        self.data.write().grid = grid(days, periods_per_day);
        self
    }

    /// Installs the catalog served by `fetch_catalog`. Teacher time-off
    /// is indexed by backend teacher id for validation and solving.
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        {
            let mut data = self.data.write();
            data.time_off.clear();
            for teacher in &catalog.teachers {
                let Some(backend_id) = catalog.ids.teacher_backend_id(&teacher.id) else {
                    continue;
                };
                for off in &teacher.time_off {
                    let reason = off.reason.clone().unwrap_or_default();
                    data.time_off.insert((backend_id, off.slot()), reason);
                }
            }
            data.catalog = catalog;
        }
        self
    }

    // ==================== Seeding ====================

    /// Stores a schedule and makes it active.
    pub fn seed_schedule(&self, name: &str) -> ScheduleId {
        insert_schedule(&mut self.data.write(), name).id
    }

    /// Stores a group without validation.
    pub fn seed_group(&self, schedule_id: ScheduleId, group: &NewLectureGroup) -> GroupId {
        insert_group(&mut self.data.write(), schedule_id, group).id
    }

    /// Stores a block without validation.
    pub fn seed_block(&self, block: &NewLectureBlock) -> RemoteBlockId {
        insert_block(&mut self.data.write(), block).id
    }

    // ==================== Failure injection ====================

    /// Makes every subsequent call to `endpoint` return `error`.
    pub fn fail(&self, endpoint: Endpoint, error: GatewayError) {
        self.data.write().failures.insert(endpoint, error);
    }

    /// Restores normal behavior of `endpoint`.
    pub fn clear_failure(&self, endpoint: Endpoint) {
        self.data.write().failures.remove(&endpoint);
    }

    /// Number of calls made to `endpoint`, including failed ones.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.data.read().calls.get(&endpoint).copied().unwrap_or(0)
    }

    // ==================== Inspection ====================

    /// All stored groups.
    pub fn groups(&self) -> Vec<LectureGroup> {
        self.data.read().groups.values().cloned().collect()
    }

    /// All stored blocks.
    pub fn blocks(&self) -> Vec<LectureBlock> {
        self.data.read().blocks.values().cloned().collect()
    }

    /// Counts the call and returns the injected failure, if any.
    fn enter(&self, endpoint: Endpoint) -> GatewayResult<()> {
        let mut data = self.data.write();
        *data.calls.entry(endpoint).or_insert(0) += 1;
        match data.failures.get(&endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn insert_schedule(data: &mut BackendData, name: &str) -> ScheduleMetadata {
    for s in &mut data.schedules {
        s.is_active = false;
    }
    let meta = ScheduleMetadata {
        id: ScheduleId(data.next_schedule_id),
        name: name.to_string(),
        is_active: true,
    };
    data.next_schedule_id += 1;
    data.schedules.push(meta.clone());
    meta
}

fn insert_group(
    data: &mut BackendData,
    schedule_id: ScheduleId,
    group: &NewLectureGroup,
) -> LectureGroup {
    let record = LectureGroup::from_request(GroupId(data.next_group_id), schedule_id, group);
    data.next_group_id += 1;
    data.groups.insert(record.id, record.clone());
    record
}

fn insert_block(data: &mut BackendData, block: &NewLectureBlock) -> LectureBlock {
    let record = LectureBlock {
        id: RemoteBlockId(data.next_block_id),
        group_id: block.group_id,
        day: block.day,
        period: block.period,
        room_id: block.room_id,
        is_fixed: block.is_fixed,
    };
    data.next_block_id += 1;
    data.blocks.insert(record.id, record.clone());
    record
}

fn teacher_double_booked(teacher: i64, slot: Slot) -> String {
    format!(
        "Teacher {} is double booked at {} period {}",
        teacher,
        slot.day.code(),
        slot.period
    )
}

fn room_double_booked(room: i64, slot: Slot) -> String {
    format!(
        "Room {} is double booked at {} period {}",
        room,
        slot.day.code(),
        slot.period
    )
}

fn teacher_time_off(teacher: i64, slot: Slot, reason: &str) -> String {
    format!(
        "Teacher {} has time off at {} period {} ({})",
        teacher,
        slot.day.code(),
        slot.period,
        reason
    )
}

/// Server-side placement checks. Returns the rejection messages.
fn check_placement(data: &BackendData, block: &NewLectureBlock) -> Vec<String> {
    let Some(group) = data.groups.get(&block.group_id) else {
        return vec![format!(
            "Invalid group_id {}: lecture group not found",
            block.group_id
        )];
    };
    let slot = Slot::new(block.day, block.period);
    let mut errors = Vec::new();

    let same_schedule_at_slot = data.blocks.values().filter(|b| b.slot() == slot).filter_map(|b| {
        data.groups
            .get(&b.group_id)
            .filter(|g| g.schedule_id == group.schedule_id)
            .map(|g| (b, g))
    });

    let mut teacher_clash = false;
    let mut room_clash = false;
    for (other, other_group) in same_schedule_at_slot {
        if group.teacher_id.is_some() && other_group.teacher_id == group.teacher_id {
            teacher_clash = true;
        }
        if block.room_id.is_some() && other.room_id == block.room_id {
            room_clash = true;
        }
    }

    if let (true, Some(t)) = (teacher_clash, group.teacher_id) {
        errors.push(teacher_double_booked(t, slot));
    }
    if let (true, Some(r)) = (room_clash, block.room_id) {
        errors.push(room_double_booked(r, slot));
    }
    if let Some(t) = group.teacher_id {
        if let Some(reason) = data.time_off.get(&(t, slot)) {
            errors.push(teacher_time_off(t, slot, reason));
        }
    }
    errors
}

/// Whole-schedule checks over stored blocks. Each clash is reported once.
fn check_schedule(data: &BackendData, schedule_id: ScheduleId) -> Vec<String> {
    let mut teachers: HashSet<(i64, Slot)> = HashSet::new();
    let mut rooms: HashSet<(i64, Slot)> = HashSet::new();
    let mut errors: Vec<String> = Vec::new();
    let mut report = |msg: String| {
        if !errors.contains(&msg) {
            errors.push(msg);
        }
    };

    for block in data.blocks.values() {
        let Some(group) = data
            .groups
            .get(&block.group_id)
            .filter(|g| g.schedule_id == schedule_id)
        else {
            continue;
        };
        let slot = block.slot();
        if let Some(t) = group.teacher_id {
            if !teachers.insert((t, slot)) {
                report(teacher_double_booked(t, slot));
            }
            if let Some(reason) = data.time_off.get(&(t, slot)) {
                report(teacher_time_off(t, slot, reason));
            }
        }
        if let Some(r) = block.room_id {
            if !rooms.insert((r, slot)) {
                report(room_double_booked(r, slot));
            }
        }
    }
    errors
}

#[async_trait]
impl CatalogRepository for InMemoryBackend {
    async fn fetch_catalog(&self, _school_id: i64) -> GatewayResult<Catalog> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::FetchCatalog)?;
        Ok(self.data.read().catalog.clone())
    }
}

#[async_trait]
impl ScheduleGateway for InMemoryBackend {
    async fn get_active_schedule(&self) -> GatewayResult<Option<ScheduleMetadata>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::GetActiveSchedule)?;
        Ok(self.data.read().schedules.iter().find(|s| s.is_active).cloned())
    }

    async fn create_schedule(&self, name: &str) -> GatewayResult<ScheduleMetadata> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::CreateSchedule)?;
        Ok(insert_schedule(&mut self.data.write(), name))
    }

    async fn list_groups(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureGroup>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::ListGroups)?;
        Ok(self
            .data
            .read()
            .groups
            .values()
            .filter(|g| g.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    async fn list_blocks(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureBlock>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::ListBlocks)?;
        let data = self.data.read();
        Ok(data
            .blocks
            .values()
            .filter(|b| {
                data.groups
                    .get(&b.group_id)
                    .is_some_and(|g| g.schedule_id == schedule_id)
            })
            .cloned()
            .collect())
    }

    async fn create_group(
        &self,
        schedule_id: ScheduleId,
        group: &NewLectureGroup,
    ) -> GatewayResult<LectureGroup> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::CreateGroup)?;
        let mut data = self.data.write();
        if !data.schedules.iter().any(|s| s.id == schedule_id) {
            return Err(GatewayError::NotFound(format!("Schedule {} not found", schedule_id)));
        }
        Ok(insert_group(&mut data, schedule_id, group))
    }

    async fn create_groups_batch(
        &self,
        schedule_id: ScheduleId,
        groups: &[NewLectureGroup],
    ) -> GatewayResult<Vec<LectureGroup>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::CreateGroupsBatch)?;
        let mut data = self.data.write();
        if !data.schedules.iter().any(|s| s.id == schedule_id) {
            return Err(GatewayError::NotFound(format!("Schedule {} not found", schedule_id)));
        }
        Ok(groups
            .iter()
            .map(|g| insert_group(&mut data, schedule_id, g))
            .collect())
    }

    async fn create_block(&self, block: &NewLectureBlock) -> GatewayResult<LectureBlock> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::CreateBlock)?;
        let mut data = self.data.write();
        let errors = check_placement(&data, block);
        if !errors.is_empty() {
            return Err(GatewayError::Rejected { errors });
        }
        Ok(insert_block(&mut data, block))
    }

    async fn check_block(&self, block: &NewLectureBlock) -> GatewayResult<Vec<String>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::CheckBlock)?;
        Ok(check_placement(&self.data.read(), block))
    }

    async fn validate_schedule(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<String>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::ValidateSchedule)?;
        let data = self.data.read();
        if !data.schedules.iter().any(|s| s.id == schedule_id) {
            return Err(GatewayError::NotFound(format!("Schedule {} not found", schedule_id)));
        }
        Ok(check_schedule(&data, schedule_id))
    }

    async fn auto_schedule(&self, schedule_id: ScheduleId) -> GatewayResult<Vec<LectureBlock>> {
        tokio::task::yield_now().await;
        self.enter(Endpoint::AutoSchedule)?;
        let mut data = self.data.write();

        let groups: Vec<LectureGroup> = data
            .groups
            .values()
            .filter(|g| g.schedule_id == schedule_id)
            .cloned()
            .collect();
        let group_ids: HashSet<GroupId> = groups.iter().map(|g| g.id).collect();

        let mut placed: HashMap<GroupId, usize> = HashMap::new();
        let mut teacher_busy: HashSet<(i64, Slot)> = HashSet::new();
        let mut class_busy: HashSet<(u8, u8, Slot)> = HashSet::new();
        for block in data.blocks.values().filter(|b| group_ids.contains(&b.group_id)) {
            *placed.entry(block.group_id).or_insert(0) += 1;
            if let Some(g) = data.groups.get(&block.group_id) {
                if let Some(t) = g.teacher_id {
                    teacher_busy.insert((t, block.slot()));
                }
                class_busy.insert((g.grade, g.class_num, block.slot()));
            }
        }

        let mut planned: Vec<NewLectureBlock> = Vec::new();
        for group in &groups {
            let have = placed.get(&group.id).copied().unwrap_or(0);
            let need = (group.total_credits as usize).saturating_sub(have);
            for _ in 0..need {
                let slot = data.grid.iter().copied().find(|&slot| {
                    let teacher_free = group.teacher_id.map_or(true, |t| {
                        !teacher_busy.contains(&(t, slot)) && !data.time_off.contains_key(&(t, slot))
                    });
                    teacher_free && !class_busy.contains(&(group.grade, group.class_num, slot))
                });
                let Some(slot) = slot else {
                    log::debug!("No free slot for group {}", group.id);
                    return Err(GatewayError::Solver(format!(
                        "no free slot for group {} (grade {} class {})",
                        group.id, group.grade, group.class_num
                    )));
                };
                if let Some(t) = group.teacher_id {
                    teacher_busy.insert((t, slot));
                }
                class_busy.insert((group.grade, group.class_num, slot));
                planned.push(NewLectureBlock {
                    group_id: group.id,
                    day: slot.day,
                    period: slot.period,
                    room_id: None,
                    is_fixed: false,
                });
            }
        }

        Ok(planned.iter().map(|b| insert_block(&mut data, b)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::IdMap;
    use crate::models::{SlicingOption, Teacher, TimeOffSlot};

    fn group(teacher: Option<i64>, grade: u8, class_num: u8, credits: u8) -> NewLectureGroup {
        NewLectureGroup {
            subject_id: 1,
            teacher_id: teacher,
            grade,
            class_num,
            total_credits: credits,
            slicing_option: None,
        }
    }

    fn block(group_id: GroupId, day: Day, period: u8, room: Option<i64>) -> NewLectureBlock {
        NewLectureBlock {
            group_id,
            day,
            period,
            room_id: room,
            is_fixed: false,
        }
    }

    #[tokio::test]
    async fn test_active_schedule_switches() {
        let backend = InMemoryBackend::new();
        assert!(backend.get_active_schedule().await.unwrap().is_none());
        let first = backend.create_schedule("A").await.unwrap();
        let second = backend.create_schedule("B").await.unwrap();
        let active = backend.get_active_schedule().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_block_rejects_teacher_double_booking() {
        let backend = InMemoryBackend::new();
        let s = backend.seed_schedule("S");
        let g1 = backend.seed_group(s, &group(Some(3), 1, 1, 4));
        let g2 = backend.seed_group(s, &group(Some(3), 1, 2, 4));
        backend.create_block(&block(g1, Day::Mon, 3, None)).await.unwrap();

        let err = backend
            .create_block(&block(g2, Day::Mon, 3, None))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                errors: vec!["Teacher 3 is double booked at MON period 3".into()]
            }
        );
        assert_eq!(backend.blocks().len(), 1);
    }

    #[tokio::test]
    async fn test_create_block_rejects_room_and_time_off() {
        let catalog = Catalog {
            teachers: vec![Teacher::new("t1", "Kim")
                .with_time_off(TimeOffSlot::new(Day::Fri, 1).with_reason("training"))],
            subjects: Vec::new(),
            ids: IdMap::new().with_teacher("t1", 5),
        };
        let backend = InMemoryBackend::new().with_catalog(catalog);
        let s = backend.seed_schedule("S");
        let g1 = backend.seed_group(s, &group(None, 1, 1, 2));
        let g2 = backend.seed_group(s, &group(Some(5), 1, 2, 2));
        backend.create_block(&block(g1, Day::Fri, 1, Some(9))).await.unwrap();

        match backend.create_block(&block(g2, Day::Fri, 1, Some(9))).await {
            Err(GatewayError::Rejected { errors }) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("Room 9"));
                assert!(errors[1].contains("(training)"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_group_is_rejected() {
        let backend = InMemoryBackend::new();
        let err = backend
            .create_block(&block(GroupId(42), Day::Mon, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_check_block_stores_nothing() {
        let backend = InMemoryBackend::new();
        let s = backend.seed_schedule("S");
        let g1 = backend.seed_group(s, &group(Some(3), 1, 1, 2));
        let g2 = backend.seed_group(s, &group(Some(3), 1, 2, 2));
        backend.seed_block(&block(g1, Day::Tue, 2, None));

        let errors = backend.check_block(&block(g2, Day::Tue, 2, None)).await.unwrap();
        assert_eq!(errors, vec!["Teacher 3 is double booked at TUE period 2".to_string()]);
        assert!(backend
            .check_block(&block(g2, Day::Tue, 3, None))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            backend.check_block(&block(GroupId(77), Day::Tue, 3, None)).await.unwrap().len(),
            1
        );
        assert_eq!(backend.blocks().len(), 1);
        assert_eq!(backend.calls(Endpoint::CreateBlock), 0);
    }

    #[tokio::test]
    async fn test_validate_schedule_reports_each_clash_once() {
        let backend = InMemoryBackend::new();
        let s = backend.seed_schedule("S");
        let other = backend.seed_schedule("T");
        let g1 = backend.seed_group(s, &group(Some(3), 1, 1, 4));
        let g2 = backend.seed_group(s, &group(Some(3), 1, 2, 4));
        let g3 = backend.seed_group(s, &group(Some(3), 1, 3, 4));
        let elsewhere = backend.seed_group(other, &group(Some(3), 2, 1, 4));
        for g in [g1, g2, g3, elsewhere] {
            backend.seed_block(&block(g, Day::Wed, 5, Some(4)));
        }

        let errors = backend.validate_schedule(s).await.unwrap();
        assert_eq!(
            errors,
            vec![
                "Teacher 3 is double booked at WED period 5".to_string(),
                "Room 4 is double booked at WED period 5".to_string()
            ]
        );
        assert!(backend.validate_schedule(ScheduleId(99)).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection_and_counting() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::GetActiveSchedule, GatewayError::Transport("down".into()));
        assert!(backend.get_active_schedule().await.is_err());
        backend.clear_failure(Endpoint::GetActiveSchedule);
        assert!(backend.get_active_schedule().await.is_ok());
        assert_eq!(backend.calls(Endpoint::GetActiveSchedule), 2);
        assert_eq!(backend.calls(Endpoint::CreateBlock), 0);
    }

    #[tokio::test]
    async fn test_auto_schedule_fills_remaining_credits() {
        let backend = InMemoryBackend::new().with_grid(&[Day::Mon, Day::Tue], 2);
        let s = backend.seed_schedule("S");
        let mut req = group(Some(1), 1, 1, 3);
        req.slicing_option = Some(SlicingOption::Whole);
        let g1 = backend.seed_group(s, &req);
        let g2 = backend.seed_group(s, &group(Some(1), 1, 2, 1));
        backend.seed_block(&block(g1, Day::Mon, 1, None));

        let created = backend.auto_schedule(s).await.unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(created.iter().filter(|b| b.group_id == g1).count(), 2);
        assert_eq!(created.iter().filter(|b| b.group_id == g2).count(), 1);

        // teacher 1 is never booked twice in a slot
        let slots: HashSet<Slot> = backend.blocks().iter().map(|b| b.slot()).collect();
        assert_eq!(slots.len(), 4);
    }

    #[tokio::test]
    async fn test_auto_schedule_is_all_or_nothing() {
        let backend = InMemoryBackend::new().with_grid(&[Day::Mon], 2);
        let s = backend.seed_schedule("S");
        backend.seed_group(s, &group(Some(1), 1, 1, 2));
        backend.seed_group(s, &group(Some(1), 1, 2, 1));

        let err = backend.auto_schedule(s).await.unwrap_err();
        assert!(matches!(err, GatewayError::Solver(_)));
        assert!(backend.blocks().is_empty());
    }
}
