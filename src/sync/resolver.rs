//! Just-in-time lecture group resolution.

use std::sync::Arc;

use crate::gateway::{GatewayError, GatewayResult, IdMap, ScheduleGateway};
use crate::models::{GroupId, NewLectureGroup, ScheduleId, UnassignedCard};

/// Resolves the backend group a card belongs to, creating it on demand.
pub struct GroupResolver {
    gateway: Arc<dyn ScheduleGateway>,
    ids: IdMap,
    placeholder_teacher: Option<i64>,
}

impl GroupResolver {
    /// # Arguments
    /// * `ids` - client ↔ backend id table used to translate the card
    /// * `placeholder_teacher` - backend teacher sent when the card has
    ///   no mapped teacher
    pub fn new(
        gateway: Arc<dyn ScheduleGateway>,
        ids: IdMap,
        placeholder_teacher: Option<i64>,
    ) -> Self {
        Self {
            gateway,
            ids,
            placeholder_teacher,
        }
    }

    /// Builds the group-creation request for a card.
    ///
    /// Fails with `NotFound` when the card's subject has no backend id.
    pub fn request_for(&self, card: &UnassignedCard) -> GatewayResult<NewLectureGroup> {
        let subject_id = self.ids.subject_backend_id(&card.subject_id).ok_or_else(|| {
            GatewayError::NotFound(format!("No backend id for subject {}", card.subject_id))
        })?;
        let teacher_id = card
            .teacher_id
            .as_deref()
            .and_then(|t| self.ids.teacher_backend_id(t))
            .or(self.placeholder_teacher);

        Ok(NewLectureGroup {
            subject_id,
            teacher_id,
            grade: card.grade,
            class_num: card.class_num,
            total_credits: card.credits,
            slicing_option: card.slicing,
        })
    }

    /// Returns the card's group id, creating the group if the card has none.
    pub async fn resolve_group_id(
        &self,
        schedule_id: ScheduleId,
        card: &UnassignedCard,
    ) -> GatewayResult<GroupId> {
        if let Some(id) = card.group_id {
            return Ok(id);
        }
        let request = self.request_for(card)?;
        let group = self.gateway.create_group(schedule_id, &request).await?;
        log::debug!("Created group {} for card {}", group.id, card.id);
        Ok(group.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Endpoint, InMemoryBackend};
    use crate::models::SlicingOption;

    fn ids() -> IdMap {
        IdMap::new().with_subject("kor", 10).with_teacher("t1", 3)
    }

    #[test]
    fn test_request_for_maps_ids() {
        let backend = Arc::new(InMemoryBackend::new());
        let resolver = GroupResolver::new(backend, ids(), Some(0));

        let card = UnassignedCard::new("c", "kor", 2, 3, 1).with_slice(1, Some(SlicingOption::TwoTwo));
        let req = resolver.request_for(&card).unwrap();
        assert_eq!(req.subject_id, 10);
        assert_eq!(req.teacher_id, Some(0));
        assert_eq!(req.total_credits, 2);
        assert_eq!(req.slicing_option, Some(SlicingOption::TwoTwo));
        assert_eq!((req.grade, req.class_num), (3, 1));

        let req = resolver.request_for(&card.clone().with_teacher("t1")).unwrap();
        assert_eq!(req.teacher_id, Some(3));

        let unmapped = UnassignedCard::new("c", "sub-12a3", 4, 1, 1);
        assert!(matches!(
            resolver.request_for(&unmapped),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_creates_group_once() {
        let backend = Arc::new(InMemoryBackend::new());
        let schedule = backend.seed_schedule("S");
        let resolver = GroupResolver::new(backend.clone(), ids(), None);

        let card = UnassignedCard::new("c", "kor", 4, 1, 1);
        let gid = resolver.resolve_group_id(schedule, &card).await.unwrap();
        assert_eq!(backend.groups().len(), 1);
        assert_eq!(backend.groups()[0].id, gid);

        let again = resolver
            .resolve_group_id(schedule, &card.with_group(gid))
            .await
            .unwrap();
        assert_eq!(again, gid);
        assert_eq!(backend.calls(Endpoint::CreateGroup), 1);
    }

    #[tokio::test]
    async fn test_resolve_propagates_failure() {
        let backend = Arc::new(InMemoryBackend::new());
        let schedule = backend.seed_schedule("S");
        backend.fail(Endpoint::CreateGroup, GatewayError::Transport("timeout".into()));
        let resolver = GroupResolver::new(backend, ids(), None);

        let err = resolver
            .resolve_group_id(schedule, &UnassignedCard::new("c", "kor", 4, 1, 1))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Transport("timeout".into()));
    }
}
