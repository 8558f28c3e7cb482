//! Conflict detection over the placed block set.
//!
//! A pure recompute: given the current blocks and the staff roster, derive
//! every conflict from scratch. Nothing is carried over from a previous run,
//! so two runs over the same blocks always agree.
//!
//! # Rules
//!
//! Blocks are grouped by `(day, period)`. Within each slot:
//! 1. **teacher-double-book**: a teacher id appearing on more than one block
//!    yields one conflict listing all of that teacher's blocks in the slot.
//!    Blocks without a teacher are not counted.
//! 2. **room-double-book**: same, keyed by room id.
//! 3. **teacher-overflow**: more blocks of one subject than the roster has
//!    teachers for that subject (only when the roster has at least one).
//! 4. **teacher-time-off**: blocks placed on one of their teacher's
//!    time-off slots.
//!
//! Slots are visited in week order, keys within a slot in id order.

use std::collections::{BTreeMap, HashMap};

use crate::models::{ClassBlock, Conflict, Day, Slot, SubjectInfo, Teacher};

/// Read-only lookups the rules need: teacher names and time-off, subject
/// names, and how many teachers can teach each subject.
#[derive(Debug, Default)]
pub struct Roster<'a> {
    teachers: HashMap<&'a str, &'a Teacher>,
    subject_names: HashMap<&'a str, &'a str>,
    teachers_per_subject: HashMap<&'a str, usize>,
}

impl<'a> Roster<'a> {
    /// Builds a roster from catalog slices.
    pub fn new(teachers: &'a [Teacher], subjects: &'a [SubjectInfo]) -> Self {
        let mut teachers_per_subject: HashMap<&str, usize> = HashMap::new();
        for t in teachers {
            if !t.subject_id.is_empty() {
                *teachers_per_subject.entry(t.subject_id.as_str()).or_insert(0) += 1;
            }
        }
        Self {
            teachers: teachers.iter().map(|t| (t.id.as_str(), t)).collect(),
            subject_names: subjects
                .iter()
                .map(|s| (s.id.as_str(), s.name.as_str()))
                .collect(),
            teachers_per_subject,
        }
    }

    /// Display name of a teacher, falling back to the id.
    pub fn teacher_name<'b>(&'b self, teacher_id: &'b str) -> &'b str {
        self.teachers
            .get(teacher_id)
            .map(|t| t.name.as_str())
            .unwrap_or(teacher_id)
    }

    fn subject_name<'b>(&'b self, subject_id: &'b str) -> &'b str {
        self.subject_names.get(subject_id).copied().unwrap_or(subject_id)
    }
}

/// Detects all conflicts in a block set.
pub fn detect_conflicts(blocks: &[ClassBlock], roster: &Roster<'_>) -> Vec<Conflict> {
    let mut slots: BTreeMap<Slot, Vec<&ClassBlock>> = BTreeMap::new();
    for block in blocks {
        slots.entry(block.slot()).or_default().push(block);
    }

    let mut conflicts = Vec::new();
    for (slot, slot_blocks) in &slots {
        check_teacher_double_booking(*slot, slot_blocks, roster, &mut conflicts);
        check_room_double_booking(*slot, slot_blocks, &mut conflicts);
        check_teacher_overflow(*slot, slot_blocks, roster, &mut conflicts);
        check_time_off(*slot, slot_blocks, roster, &mut conflicts);
    }
    conflicts
}

fn check_teacher_double_booking(
    slot: Slot,
    blocks: &[&ClassBlock],
    roster: &Roster<'_>,
    out: &mut Vec<Conflict>,
) {
    let by_teacher = group_ids(blocks, |b| b.teacher_id.as_deref());
    for (teacher_id, ids) in by_teacher {
        if ids.len() > 1 {
            out.push(Conflict::teacher_double_book(
                slot,
                teacher_id,
                roster.teacher_name(teacher_id),
                ids,
            ));
        }
    }
}

fn check_room_double_booking(slot: Slot, blocks: &[&ClassBlock], out: &mut Vec<Conflict>) {
    let by_room = group_ids(blocks, |b| b.room_id.as_deref());
    for (room_id, ids) in by_room {
        if ids.len() > 1 {
            out.push(Conflict::room_double_book(slot, room_id, ids));
        }
    }
}

fn check_teacher_overflow(
    slot: Slot,
    blocks: &[&ClassBlock],
    roster: &Roster<'_>,
    out: &mut Vec<Conflict>,
) {
    let by_subject = group_ids(blocks, |b| Some(b.subject_id.as_str()));
    for (subject_id, ids) in by_subject {
        let available = roster
            .teachers_per_subject
            .get(subject_id)
            .copied()
            .unwrap_or(0);
        if available > 0 && ids.len() > available {
            out.push(Conflict::teacher_overflow(
                slot,
                subject_id,
                roster.subject_name(subject_id),
                available,
                ids,
            ));
        }
    }
}

fn check_time_off(slot: Slot, blocks: &[&ClassBlock], roster: &Roster<'_>, out: &mut Vec<Conflict>) {
    let by_teacher = group_ids(blocks, |b| b.teacher_id.as_deref());
    for (teacher_id, ids) in by_teacher {
        let Some(teacher) = roster.teachers.get(teacher_id) else {
            continue;
        };
        if let Some(off) = teacher.time_off_at(slot) {
            out.push(Conflict::teacher_time_off(
                slot,
                teacher_id,
                &teacher.name,
                off.reason.as_deref(),
                ids,
            ));
        }
    }
}

/// Groups block ids by a key, skipping blocks without one.
fn group_ids<'b, F>(blocks: &[&'b ClassBlock], key: F) -> BTreeMap<&'b str, Vec<String>>
where
    F: Fn(&'b ClassBlock) -> Option<&'b str>,
{
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for &block in blocks {
        if let Some(k) = key(block) {
            groups.entry(k).or_default().push(block.id.clone());
        }
    }
    groups
}

/// Advisory per-block warnings: teachers with more than `threshold` blocks
/// on one day. Keyed by block id.
pub fn daily_load_warnings(
    blocks: &[ClassBlock],
    roster: &Roster<'_>,
    threshold: usize,
) -> HashMap<String, Vec<String>> {
    let mut per_day: HashMap<(&str, Day), Vec<&str>> = HashMap::new();
    for block in blocks {
        if let Some(teacher_id) = block.teacher_id.as_deref() {
            per_day
                .entry((teacher_id, block.day))
                .or_default()
                .push(block.id.as_str());
        }
    }

    let mut warnings: HashMap<String, Vec<String>> = HashMap::new();
    for ((teacher_id, day), ids) in per_day {
        if ids.len() > threshold {
            let message = format!(
                "Heavy load: {} teaches {} classes on {}",
                roster.teacher_name(teacher_id),
                ids.len(),
                day
            );
            for id in ids {
                warnings.entry(id.to_string()).or_default().push(message.clone());
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictType, TimeOffSlot};

    fn teachers() -> Vec<Teacher> {
        vec![
            Teacher::new("t1", "Kim").with_subject("kor"),
            Teacher::new("t2", "Lee").with_subject("math"),
            Teacher::new("t3", "Park")
                .with_subject("math")
                .with_time_off(TimeOffSlot::new(Day::Fri, 1).with_reason("admin duty")),
        ]
    }

    fn subjects() -> Vec<SubjectInfo> {
        vec![
            SubjectInfo::new("kor", "Korean"),
            SubjectInfo::new("math", "Math"),
        ]
    }

    fn block(id: &str, subject: &str, day: Day, period: u8, class_num: u8) -> ClassBlock {
        ClassBlock::new(id, subject, Slot::new(day, period), 1, class_num)
    }

    #[test]
    fn test_teacher_double_book_example() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks = vec![
            block("A", "math", Day::Mon, 3, 1).with_teacher("t2"),
            block("B", "math", Day::Mon, 3, 2).with_teacher("t2"),
        ];
        let conflicts = detect_conflicts(&blocks, &roster);
        let doubles: Vec<_> = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::TeacherDoubleBook)
            .collect();
        assert_eq!(doubles.len(), 1);
        assert_eq!(doubles[0].block_ids, vec!["A".to_string(), "B".to_string()]);
        assert!(doubles[0].message.contains("Lee"));
    }

    #[test]
    fn test_unassigned_teacher_not_counted() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks = vec![
            block("A", "art", Day::Mon, 1, 1),
            block("B", "art", Day::Mon, 1, 2),
        ];
        assert!(detect_conflicts(&blocks, &roster).is_empty());
    }

    #[test]
    fn test_different_slots_do_not_conflict() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks = vec![
            block("A", "kor", Day::Mon, 1, 1).with_teacher("t1"),
            block("B", "kor", Day::Mon, 2, 2).with_teacher("t1"),
            block("C", "kor", Day::Tue, 1, 3).with_teacher("t1"),
        ];
        assert!(detect_conflicts(&blocks, &roster).is_empty());
    }

    #[test]
    fn test_unknown_teacher_name_falls_back_to_id() {
        let roster = Roster::default();
        let blocks = vec![
            block("A", "kor", Day::Mon, 1, 1).with_teacher("ghost"),
            block("B", "kor", Day::Mon, 1, 2).with_teacher("ghost"),
        ];
        let conflicts = detect_conflicts(&blocks, &roster);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("ghost"));
    }

    #[test]
    fn test_room_double_book() {
        let roster = Roster::default();
        let blocks = vec![
            block("A", "sci", Day::Wed, 2, 1).with_room("Lab 1"),
            block("B", "sci", Day::Wed, 2, 2).with_room("Lab 1"),
            block("C", "sci", Day::Wed, 2, 3).with_room("Lab 2"),
        ];
        let conflicts = detect_conflicts(&blocks, &roster);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::RoomDoubleBook);
        assert_eq!(conflicts[0].block_ids, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_teacher_overflow() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        // Two math teachers, three math blocks in one slot.
        let blocks = vec![
            block("A", "math", Day::Tue, 4, 1),
            block("B", "math", Day::Tue, 4, 2),
            block("C", "math", Day::Tue, 4, 3),
        ];
        let conflicts = detect_conflicts(&blocks, &roster);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TeacherOverflow);
        assert_eq!(conflicts[0].block_ids.len(), 3);
    }

    #[test]
    fn test_time_off_violation() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks = vec![block("A", "math", Day::Fri, 1, 1).with_teacher("t3")];
        let conflicts = detect_conflicts(&blocks, &roster);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::TeacherTimeOff);
        assert!(conflicts[0].message.contains("admin duty"));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks = vec![
            block("A", "kor", Day::Mon, 3, 1).with_teacher("t1"),
            block("B", "kor", Day::Mon, 3, 2).with_teacher("t1"),
            block("C", "math", Day::Thu, 5, 1).with_teacher("t2").with_room("r"),
            block("D", "math", Day::Thu, 5, 2).with_teacher("t2").with_room("r"),
        ];
        let first = detect_conflicts(&blocks, &roster);
        let second = detect_conflicts(&blocks, &roster);
        assert_eq!(first, second);
        // MON-3: double booking + Korean overflow; THU-5: double booking + room.
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_daily_load_warnings() {
        let (t, s) = (teachers(), subjects());
        let roster = Roster::new(&t, &s);
        let blocks: Vec<_> = (1..=5)
            .map(|p| block(&format!("b{p}"), "kor", Day::Mon, p, 1).with_teacher("t1"))
            .collect();

        let w = daily_load_warnings(&blocks, &roster, 4);
        assert_eq!(w.len(), 5);
        assert!(w["b1"][0].contains("Kim teaches 5 classes on MON"));

        assert!(daily_load_warnings(&blocks, &roster, 5).is_empty());
    }
}
