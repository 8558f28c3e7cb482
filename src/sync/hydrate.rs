//! Rebuilds local state from the backend's groups and blocks.
//!
//! # Algorithm
//! 1. Every remote block whose group is known becomes a [`ClassBlock`]
//!    carrying the group's subject, teacher and class. Block ids are
//!    `blk-{remote id}`, so repeated resyncs keep ids stable.
//! 2. Every group with fewer blocks than its `total_credits` contributes
//!    one card for the missing credits, id `group-{group id}-remaining`.
//!
//! Backend ids without a client mapping fall back to their decimal form.

use std::collections::HashMap;

use super::SyncState;
use crate::gateway::IdMap;
use crate::models::{
    ClassBlock, GroupId, LectureBlock, LectureGroup, RemoteBlockId, UnassignedCard,
};

/// Local state derived from a resync.
#[derive(Debug, Clone, Default)]
pub struct Hydrated {
    pub blocks: Vec<ClassBlock>,
    pub cards: Vec<UnassignedCard>,
    pub sync: HashMap<String, SyncState>,
}

/// Local id of a block fetched from the backend.
pub fn remote_block_key(id: RemoteBlockId) -> String {
    format!("blk-{}", id)
}

/// Id of the card holding a group's unplaced credits.
pub fn remaining_card_id(group_id: GroupId) -> String {
    format!("group-{}-remaining", group_id)
}

fn subject_of(ids: &IdMap, group: &LectureGroup) -> String {
    ids.subject_client_id(group.subject_id)
        .map(str::to_string)
        .unwrap_or_else(|| group.subject_id.to_string())
}

fn teacher_of(ids: &IdMap, group: &LectureGroup) -> Option<String> {
    group
        .teacher_id
        .and_then(|t| ids.teacher_client_id(t))
        .map(str::to_string)
}

/// Derives blocks, remaining cards and sync states.
pub fn hydrate(groups: &[LectureGroup], blocks: &[LectureBlock], ids: &IdMap) -> Hydrated {
    let by_id: HashMap<GroupId, &LectureGroup> = groups.iter().map(|g| (g.id, g)).collect();
    let mut assigned: HashMap<GroupId, usize> = HashMap::new();
    let mut out = Hydrated::default();

    for remote in blocks {
        let Some(group) = by_id.get(&remote.group_id) else {
            log::warn!(
                "Block {} references unknown group {}; skipped",
                remote.id,
                remote.group_id
            );
            continue;
        };
        *assigned.entry(group.id).or_insert(0) += 1;

        let id = remote_block_key(remote.id);
        let mut block = ClassBlock::new(
            id.clone(),
            subject_of(ids, group),
            remote.slot(),
            group.grade,
            group.class_num,
        )
        .with_group(group.id);
        block.teacher_id = teacher_of(ids, group);
        block.room_id = remote.room_id.map(|r| {
            ids.room_client_id(r)
                .map(str::to_string)
                .unwrap_or_else(|| r.to_string())
        });

        out.sync.insert(
            id,
            SyncState::Synced {
                remote_block_id: remote.id,
            },
        );
        out.blocks.push(block);
    }

    for group in groups {
        let placed = assigned.get(&group.id).copied().unwrap_or(0);
        let total = group.total_credits as usize;
        if placed >= total {
            continue;
        }
        let mut card = UnassignedCard::new(
            remaining_card_id(group.id),
            subject_of(ids, group),
            (total - placed) as u8,
            group.grade,
            group.class_num,
        )
        .with_slice(0, group.slicing_option)
        .with_group(group.id);
        card.teacher_id = teacher_of(ids, group);
        out.cards.push(card);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, ScheduleId, Slot};

    fn group(id: i64, subject: i64, teacher: Option<i64>, credits: u8) -> LectureGroup {
        LectureGroup {
            id: GroupId(id),
            schedule_id: ScheduleId(1),
            subject_id: subject,
            teacher_id: teacher,
            grade: 1,
            class_num: id as u8,
            total_credits: credits,
            slicing_option: None,
        }
    }

    fn block(id: i64, group: i64, day: Day, period: u8) -> LectureBlock {
        LectureBlock {
            id: RemoteBlockId(id),
            group_id: GroupId(group),
            day,
            period,
            room_id: None,
            is_fixed: false,
        }
    }

    #[test]
    fn test_remaining_credits() {
        let ids = IdMap::new().with_subject("kor", 10).with_teacher("t1", 3);
        let groups = vec![group(1, 10, Some(3), 4), group(2, 10, None, 2), group(3, 99, None, 1)];
        let blocks = vec![
            block(7, 1, Day::Mon, 1),
            block(8, 1, Day::Tue, 1),
            block(9, 2, Day::Mon, 2),
            block(10, 2, Day::Mon, 3),
        ];

        let h = hydrate(&groups, &blocks, &ids);
        assert_eq!(h.blocks.len(), 4);
        assert_eq!(h.blocks[0].id, "blk-7");
        assert_eq!(h.blocks[0].subject_id, "kor");
        assert_eq!(h.blocks[0].teacher_id.as_deref(), Some("t1"));
        assert_eq!(h.blocks[0].slot(), Slot::new(Day::Mon, 1));
        assert!(h.sync.values().all(SyncState::is_synced));

        let ids: Vec<(&str, u8)> = h.cards.iter().map(|c| (c.id.as_str(), c.credits)).collect();
        assert_eq!(ids, vec![("group-1-remaining", 2), ("group-3-remaining", 1)]);
        assert_eq!(h.cards[0].group_id, Some(GroupId(1)));
        // unmapped subject falls back to the backend id
        assert_eq!(h.cards[1].subject_id, "99");
    }

    #[test]
    fn test_orphan_block_skipped() {
        let h = hydrate(&[], &[block(1, 5, Day::Fri, 7)], &IdMap::new());
        assert!(h.blocks.is_empty());
        assert!(h.cards.is_empty());
    }
}
