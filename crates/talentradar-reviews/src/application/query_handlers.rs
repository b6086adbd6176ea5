//! Query handlers for the Reviews context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::error::DomainError;
use talentradar_core::repository::{Repository, SnapshotQuery, find_aggregates, load_required};
use uuid::Uuid;

use crate::domain::aggregates::{Cycle, Feedback};

/// Read-only view of one feedback request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackView {
    /// The feedback identifier.
    pub feedback_id: Uuid,
    /// The employee the feedback is about.
    pub employee_id: Uuid,
    /// The reviewer.
    pub email: String,
    /// Deadline for submission.
    pub collection_end_at: DateTime<Utc>,
    /// When the reviewer submitted, if they have.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Overall rating, once answered.
    pub rating: Option<i32>,
    /// Generated summary, once available.
    pub summary: Option<String>,
    /// Generated follow-up items.
    pub action_items: Vec<String>,
}

impl From<&Feedback> for FeedbackView {
    fn from(feedback: &Feedback) -> Self {
        Self {
            feedback_id: feedback.id,
            employee_id: feedback.employee_id,
            email: feedback.email.clone(),
            collection_end_at: feedback.collection_end_at,
            submitted_at: feedback.submitted_at,
            rating: feedback.details.as_ref().map(|d| d.rating),
            summary: feedback.summary.as_ref().map(|s| s.summary.clone()),
            action_items: feedback
                .summary
                .as_ref()
                .map(|s| s.action_items.clone())
                .unwrap_or_default(),
        }
    }
}

/// Retrieves one feedback request by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no snapshot exists for the ID.
pub async fn get_feedback_by_id(
    repo: &dyn Repository,
    feedback_id: Uuid,
) -> Result<FeedbackView, DomainError> {
    let feedback = load_required::<Feedback>(repo, feedback_id).await?;
    Ok(FeedbackView::from(feedback.state()))
}

/// Finds the feedback request a form access code belongs to.
///
/// Reviewers are not users, so this lookup spans tenants.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn find_feedback_by_code(
    repo: &dyn Repository,
    code: &str,
) -> Result<Option<AggregateRoot<Feedback>>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Feedback>().where_eq("code", code);
    Ok(find_aggregates::<Feedback>(repo, &query).await?.into_iter().next())
}

/// Lists every feedback request about one employee, newest deadline first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn list_feedback_for_employee(
    repo: &dyn Repository,
    organization_id: Uuid,
    employee_id: Uuid,
) -> Result<Vec<FeedbackView>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Feedback>()
        .in_organization(organization_id)
        .where_eq("employee_id", employee_id.to_string());
    let mut views: Vec<FeedbackView> = find_aggregates::<Feedback>(repo, &query)
        .await?
        .iter()
        .map(|root| FeedbackView::from(root.state()))
        .collect();
    views.sort_by(|a, b| b.collection_end_at.cmp(&a.collection_end_at));
    Ok(views)
}

/// The cycles `owner_id` opened in an organization, earliest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn find_cycles_owned_by(
    repo: &dyn Repository,
    organization_id: Uuid,
    owner_id: Option<Uuid>,
) -> Result<Vec<AggregateRoot<Cycle>>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Cycle>()
        .in_organization(organization_id)
        .where_eq("owner_id", owner_id.map(|id| id.to_string()));
    let mut cycles = find_aggregates::<Cycle>(repo, &query).await?;
    cycles.sort_by_key(|cycle| cycle.state().start_at);
    Ok(cycles)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use talentradar_core::event::Metadata;
    use talentradar_core::executor::call;
    use talentradar_core::identity::Identity;
    use talentradar_test_support::{FailingRepository, FixedClock, in_memory_context};

    use super::*;
    use crate::domain::commands::CreateFeedback;

    #[tokio::test]
    async fn test_feedback_lookups() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let org = Uuid::new_v4();
        let ctx = ctx.with_identity(Identity::new(Uuid::new_v4(), org));
        let employee_id = Uuid::new_v4();
        let now = FixedClock::default_instant().0;
        let mut ids = Vec::new();
        for (email, days) in [("a@acme.test", 3), ("b@acme.test", 9)] {
            let mut root = AggregateRoot::<Feedback>::new();
            call(
                &ctx,
                &mut root,
                &CreateFeedback {
                    employee_id,
                    email: email.to_owned(),
                    collection_end_at: now + Duration::days(days),
                },
                Metadata::new(),
            )
            .await
            .unwrap();
            ids.push(root.id());
        }

        // Act
        let listed = list_feedback_for_employee(&repo, org, employee_id).await.unwrap();
        let viewed = get_feedback_by_id(&repo, ids[0]).await.unwrap();
        let by_code = find_feedback_by_code(&repo, &viewed_code(&repo, ids[0]).await)
            .await
            .unwrap();

        // Assert
        let emails: Vec<&str> = listed.iter().map(|v| v.email.as_str()).collect();
        assert_eq!(emails, vec!["b@acme.test", "a@acme.test"]);
        assert_eq!(viewed.rating, None);
        assert!(viewed.action_items.is_empty());
        assert!(by_code.is_some());
    }

    async fn viewed_code(repo: &dyn Repository, id: Uuid) -> String {
        load_required::<Feedback>(repo, id).await.unwrap().state().code.clone()
    }

    #[tokio::test]
    async fn test_find_cycles_propagates_storage_failure() {
        let result = find_cycles_owned_by(&FailingRepository, Uuid::new_v4(), None).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
