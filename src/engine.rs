//! Block assignment engine.
//!
//! Owns the mutable set of placed blocks and the conflicts derived from it.
//! Every mutation ends with a full revalidation, so `conflicts()` and each
//! block's `warnings` always describe the current block set.
//!
//! # Preconditions
//! None of the operations check slot occupancy, teacher subject affinity or
//! weekly hour limits. Clashing placements are accepted and show up as
//! conflicts, which keeps them visible and correctable. Operations on an
//! unknown block id are no-ops.

use crate::conflicts::{daily_load_warnings, detect_conflicts, Roster};
use crate::ids::local_id;
use crate::models::{ClassBlock, Conflict, ConflictType, Slot, SubjectInfo, Teacher};

/// Default advisory threshold for blocks per teacher per day.
pub const DEFAULT_DAILY_LOAD_WARNING: usize = 4;

/// Placed-block store with automatic revalidation.
#[derive(Debug, Clone)]
pub struct BlockAssignmentEngine {
    blocks: Vec<ClassBlock>,
    conflicts: Vec<Conflict>,
    teachers: Vec<Teacher>,
    subjects: Vec<SubjectInfo>,
    daily_load_warning: usize,
}

impl Default for BlockAssignmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockAssignmentEngine {
    /// Creates an empty engine with no roster.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            conflicts: Vec::new(),
            teachers: Vec::new(),
            subjects: Vec::new(),
            daily_load_warning: DEFAULT_DAILY_LOAD_WARNING,
        }
    }

    /// Sets the teacher and subject catalog used for conflict messages.
    pub fn with_roster(mut self, teachers: Vec<Teacher>, subjects: Vec<SubjectInfo>) -> Self {
        self.set_roster(teachers, subjects);
        self
    }

    /// Sets the per-day load above which blocks get a warning.
    pub fn with_daily_load_warning(mut self, threshold: usize) -> Self {
        self.daily_load_warning = threshold;
        self.revalidate();
        self
    }

    /// Replaces the roster and revalidates.
    pub fn set_roster(&mut self, teachers: Vec<Teacher>, subjects: Vec<SubjectInfo>) {
        self.teachers = teachers;
        self.subjects = subjects;
        self.revalidate();
    }

    /// Places a new block with no teacher. Returns its id.
    pub fn add_block(
        &mut self,
        subject_id: impl Into<String>,
        slot: Slot,
        grade: u8,
        class_num: u8,
    ) -> String {
        let id = local_id("blk");
        self.blocks
            .push(ClassBlock::new(id.clone(), subject_id, slot, grade, class_num));
        self.revalidate();
        id
    }

    /// Appends a fully built block.
    pub fn insert_block(&mut self, block: ClassBlock) {
        self.blocks.push(block);
        self.revalidate();
    }

    /// Moves a block, keeping its id, teacher and group.
    ///
    /// Returns `false` (and changes nothing) if the block does not exist.
    pub fn move_block(&mut self, block_id: &str, slot: Slot, grade: u8, class_num: u8) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) else {
            return false;
        };
        block.day = slot.day;
        block.period = slot.period;
        block.grade = grade;
        block.class_num = class_num;
        self.revalidate();
        true
    }

    /// Removes a block.
    pub fn remove_block(&mut self, block_id: &str) -> Option<ClassBlock> {
        let pos = self.blocks.iter().position(|b| b.id == block_id)?;
        let removed = self.blocks.remove(pos);
        self.revalidate();
        Some(removed)
    }

    /// Sets or overwrites a block's teacher.
    ///
    /// Returns `false` if the block does not exist.
    pub fn assign_teacher_to_block(&mut self, block_id: &str, teacher_id: impl Into<String>) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) else {
            return false;
        };
        block.teacher_id = Some(teacher_id.into());
        self.revalidate();
        true
    }

    /// Replaces the whole block set (used after a backend resync).
    pub fn replace_blocks(&mut self, blocks: Vec<ClassBlock>) {
        self.blocks = blocks;
        self.revalidate();
    }

    /// Recomputes conflicts and warnings from scratch.
    pub fn revalidate(&mut self) {
        let roster = Roster::new(&self.teachers, &self.subjects);
        self.conflicts = detect_conflicts(&self.blocks, &roster);
        let mut warnings = daily_load_warnings(&self.blocks, &roster, self.daily_load_warning);
        for block in &mut self.blocks {
            block.warnings = warnings.remove(&block.id).unwrap_or_default();
        }
    }

    /// Placed blocks, in insertion order.
    pub fn blocks(&self) -> &[ClassBlock] {
        &self.blocks
    }

    /// Finds a block by id.
    pub fn block(&self, block_id: &str) -> Option<&ClassBlock> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// Current conflicts.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Conflicts of one type.
    pub fn conflicts_of(&self, conflict_type: ConflictType) -> Vec<&Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.conflict_type == conflict_type)
            .collect()
    }

    /// Roster teachers.
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// Finds a subject in the roster.
    pub fn subject(&self, subject_id: &str) -> Option<&SubjectInfo> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }

    /// Blocks taught by a teacher.
    pub fn blocks_for_teacher(&self, teacher_id: &str) -> Vec<&ClassBlock> {
        self.blocks
            .iter()
            .filter(|b| b.teacher_id.as_deref() == Some(teacher_id))
            .collect()
    }

    /// Blocks in one class's timetable.
    pub fn blocks_for_class(&self, grade: u8, class_num: u8) -> Vec<&ClassBlock> {
        self.blocks
            .iter()
            .filter(|b| b.grade == grade && b.class_num == class_num)
            .collect()
    }

    /// Number of placed blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
