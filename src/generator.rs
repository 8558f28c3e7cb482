//! Curriculum-to-card decomposition.
//!
//! Turns a curriculum into the pool of unassigned cards the operator (or
//! the auto-scheduler) places on the grid.
//!
//! # Algorithm
//!
//! For each subject, for each grade with non-zero credits and a configured
//! class count:
//! 1. If credits == 4 and a slicing option is set, split the weight into
//!    `2+2 → [2, 2]`, `3+1 → [3, 1]` or `4 → [4]`; otherwise `[credits]`.
//! 2. For every class `1..=class_count`, emit one card per split entry,
//!    keeping the entry's index.
//!
//! The credit weights emitted for a `(subject, grade)` always sum to
//! `credits × class_count`.
//!
//! # Determinism
//! Card ids are `"{subject}-{grade}-{class}-{slice}"`, so re-running the
//! generator on the same curriculum yields identical cards. The caller uses
//! this to avoid resurrecting cards that were already placed.

use crate::models::{Curriculum, SlicingOption, SubjectInfo, UnassignedCard};

/// Generates the full unassigned-card pool for a curriculum.
///
/// # Example
/// ```
/// use u_timetable::generator::generate_cards;
/// use u_timetable::models::{Curriculum, SlicingOption, SubjectInfo};
///
/// let curriculum = Curriculum::new().with_grade(3, 2).with_subject(
///     SubjectInfo::new("kor", "Korean")
///         .with_credits(3, 4)
///         .with_slicing(SlicingOption::TwoTwo),
/// );
/// let cards = generate_cards(&curriculum);
/// assert_eq!(cards.len(), 4);
/// assert!(cards.iter().all(|c| c.credits == 2));
/// ```
pub fn generate_cards(curriculum: &Curriculum) -> Vec<UnassignedCard> {
    let mut cards = Vec::new();

    for subject in &curriculum.subjects {
        for gc in &subject.grade_credits {
            if gc.credits == 0 {
                continue;
            }
            let Some(class_count) = curriculum.class_count(gc.grade) else {
                continue;
            };

            let (weights, slicing) = split_credits(subject, gc.credits);
            let sliced = weights.len() > 1;

            for class_num in 1..=class_count {
                for (index, &weight) in weights.iter().enumerate() {
                    let mut card = UnassignedCard::new(
                        card_id(&subject.id, gc.grade, class_num, index),
                        subject.id.clone(),
                        weight,
                        gc.grade,
                        class_num,
                    )
                    .with_slice(index, slicing);
                    if sliced {
                        card = card.with_original_subject(subject.id.clone());
                    }
                    cards.push(card);
                }
            }
        }
    }

    cards
}

/// Credit weights for one class of a subject in a grade, and the slicing
/// option that produced them (only when it applies).
fn split_credits(subject: &SubjectInfo, credits: u8) -> (Vec<u8>, Option<SlicingOption>) {
    match subject.slicing {
        Some(option) if credits == 4 => (option.split().to_vec(), Some(option)),
        _ => (vec![credits], None),
    }
}

fn card_id(subject_id: &str, grade: u8, class_num: u8, slice: usize) -> String {
    format!("{subject_id}-{grade}-{class_num}-{slice}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_curriculum() -> Curriculum {
        Curriculum::new()
            .with_grade(1, 3)
            .with_grade(2, 2)
            .with_grade(3, 2)
            .with_subject(
                SubjectInfo::new("kor", "Korean")
                    .with_credits(1, 4)
                    .with_credits(3, 4)
                    .with_slicing(SlicingOption::TwoTwo),
            )
            .with_subject(
                SubjectInfo::new("math", "Math")
                    .with_credits(1, 4)
                    .with_credits(2, 3)
                    .with_slicing(SlicingOption::ThreeOne),
            )
            .with_subject(
                SubjectInfo::new("eng", "English")
                    .with_credits(2, 4)
                    .with_slicing(SlicingOption::Whole),
            )
            .with_subject(SubjectInfo::new("music", "Music").with_credits(1, 2).with_credits(2, 0))
    }

    #[test]
    fn test_credit_sum_invariant() {
        let c = sample_curriculum();
        let cards = generate_cards(&c);

        let mut sums: HashMap<(&str, u8), u32> = HashMap::new();
        for card in &cards {
            *sums.entry((card.subject_id.as_str(), card.grade)).or_default() += card.credits as u32;
        }

        for subject in &c.subjects {
            for gc in &subject.grade_credits {
                let expected = match c.class_count(gc.grade) {
                    Some(n) => gc.credits as u32 * n as u32,
                    None => 0,
                };
                let actual = sums.get(&(subject.id.as_str(), gc.grade)).copied().unwrap_or(0);
                assert_eq!(actual, expected, "{} grade {}", subject.id, gc.grade);
            }
        }
    }

    #[test]
    fn test_korean_two_two_example() {
        let c = Curriculum::new().with_grade(3, 2).with_subject(
            SubjectInfo::new("korean", "Korean")
                .with_credits(3, 4)
                .with_slicing(SlicingOption::TwoTwo),
        );
        let cards = generate_cards(&c);
        let shape: Vec<(u8, u8, usize)> = cards
            .iter()
            .map(|c| (c.class_num, c.credits, c.slice_index))
            .collect();
        assert_eq!(shape, vec![(1, 2, 0), (1, 2, 1), (2, 2, 0), (2, 2, 1)]);
        assert!(cards
            .iter()
            .all(|c| c.original_subject_id.as_deref() == Some("korean")));
    }

    #[test]
    fn test_slicing_card_counts_per_class() {
        let cards = generate_cards(&sample_curriculum());
        let per_class = |subject: &str, grade: u8| {
            cards
                .iter()
                .filter(|c| c.subject_id == subject && c.grade == grade && c.class_num == 1)
                .count()
        };
        assert_eq!(per_class("kor", 1), 2); // 2+2
        assert_eq!(per_class("math", 1), 2); // 3+1
        assert_eq!(per_class("eng", 2), 1); // 4
        assert_eq!(per_class("music", 1), 1); // none
    }

    #[test]
    fn test_slicing_ignored_below_four_credits() {
        let cards = generate_cards(&sample_curriculum());
        let math2: Vec<_> = cards
            .iter()
            .filter(|c| c.subject_id == "math" && c.grade == 2)
            .collect();
        assert_eq!(math2.len(), 2); // one per class
        assert!(math2.iter().all(|c| c.credits == 3 && c.slicing.is_none()));
        assert!(math2.iter().all(|c| !c.is_slice()));
    }

    #[test]
    fn test_whole_option_is_not_a_slice() {
        let cards = generate_cards(&sample_curriculum());
        let eng = cards.iter().find(|c| c.subject_id == "eng").unwrap();
        assert_eq!(eng.credits, 4);
        assert_eq!(eng.slicing, Some(SlicingOption::Whole));
        assert!(eng.original_subject_id.is_none());
    }

    #[test]
    fn test_zero_credits_and_unknown_grade_skipped() {
        let c = Curriculum::new()
            .with_grade(1, 2)
            .with_subject(SubjectInfo::new("art", "Art").with_credits(1, 0).with_credits(4, 2));
        assert!(generate_cards(&c).is_empty());
    }

    #[test]
    fn test_deterministic_ids() {
        let c = sample_curriculum();
        let a = generate_cards(&c);
        let b = generate_cards(&c);
        assert_eq!(a, b);
        assert!(a.iter().any(|card| card.id == "kor-1-3-1"));

        let mut ids: Vec<_> = a.iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), a.len());
    }
}
