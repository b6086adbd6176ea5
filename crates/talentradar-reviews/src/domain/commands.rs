//! Commands for the Reviews context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use talentradar_core::command::{Changes, Command};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::rng::alphanumeric;
use uuid::Uuid;

use super::aggregates::{Cycle, Feedback};
use super::events::{
    CycleCreated, CycleEvent, FeedbackCreated, FeedbackDetailsCreated, FeedbackDetailsUpdated,
    FeedbackEvent, FeedbackSubmitted, FeedbackSummaryCreated, FeedbackSummaryUpdated,
};
use crate::application::query_handlers::find_cycles_owned_by;

/// Length of the feedback form access code.
pub const FEEDBACK_CODE_LENGTH: usize = 12;
/// Highest feedback rating.
pub const MAX_RATING: i32 = 5;

fn caller_organization(ctx: &Context) -> Result<Uuid, DomainError> {
    ctx.identity()
        .organization_id
        .filter(|id| !id.is_nil())
        .ok_or_else(|| DomainError::validation("organization is required"))
}

fn require_open(feedback: &Feedback) -> Result<(), DomainError> {
    if feedback.id.is_nil() {
        return Err(DomainError::validation("feedback does not exist"));
    }
    if feedback.is_submitted() {
        return Err(DomainError::validation("feedback has already been submitted"));
    }
    Ok(())
}

/// Command to request feedback about an employee from one reviewer.
///
/// The requester is the calling user and the tenant is the caller's.
#[derive(Debug, Clone)]
pub struct CreateFeedback {
    /// The employee the feedback is about.
    pub employee_id: Uuid,
    /// Who is asked to give feedback.
    pub email: String,
    /// Deadline for submission.
    pub collection_end_at: DateTime<Utc>,
}

#[async_trait]
impl Command for CreateFeedback {
    type Aggregate = Feedback;

    fn command_type(&self) -> &'static str {
        "feedback.create"
    }

    async fn validate(&self, ctx: &Context, _feedback: &Feedback) -> Result<(), DomainError> {
        caller_organization(ctx)?;
        if self.employee_id.is_nil() {
            return Err(DomainError::validation("employee is required"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if self.collection_end_at <= ctx.clock().now() {
            return Err(DomainError::validation(
                "collection end must be in the future",
            ));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Feedback>,
    ) -> Result<(), DomainError> {
        let code = ctx.with_rng(|rng| alphanumeric(rng, FEEDBACK_CODE_LENGTH))?;
        changes.apply(FeedbackEvent::Created(FeedbackCreated {
            id: Uuid::now_v7(),
            organization_id: caller_organization(ctx)?,
            employee_id: self.employee_id,
            owner_id: ctx.identity().user_id,
            email: self.email.trim().to_owned(),
            code,
            collection_end_at: self.collection_end_at,
        }));
        Ok(())
    }
}

/// Command to save a reviewer's answers. Repeatable until submission.
#[derive(Debug, Clone, Default)]
pub struct CreateOrUpdateDetails {
    /// What the employee does well.
    pub strengths: String,
    /// Where the employee can grow.
    pub opportunities: String,
    /// Anything else.
    pub additional: String,
    /// Whether the reviewer felt they had enough to go on.
    pub enough_data: bool,
    /// Overall rating, `0..=MAX_RATING`.
    pub rating: i32,
}

#[async_trait]
impl Command for CreateOrUpdateDetails {
    type Aggregate = Feedback;

    fn command_type(&self) -> &'static str {
        "feedback.save_details"
    }

    async fn validate(&self, _ctx: &Context, feedback: &Feedback) -> Result<(), DomainError> {
        require_open(feedback)?;
        if !(0..=MAX_RATING).contains(&self.rating) {
            return Err(DomainError::Validation(format!(
                "rating must be between 0 and {MAX_RATING}"
            )));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Feedback>,
    ) -> Result<(), DomainError> {
        if changes.state().details.is_none() {
            let employee_id = changes.state().employee_id;
            changes.apply(FeedbackEvent::DetailsCreated(FeedbackDetailsCreated {
                id: Uuid::now_v7(),
                employee_id,
            }));
        }
        changes.apply(FeedbackEvent::DetailsUpdated(FeedbackDetailsUpdated {
            strengths: self.strengths.clone(),
            opportunities: self.opportunities.clone(),
            additional: self.additional.clone(),
            enough_data: self.enough_data,
            rating: self.rating,
        }));
        Ok(())
    }
}

/// Command to submit feedback. Answers are frozen afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitFeedback;

#[async_trait]
impl Command for SubmitFeedback {
    type Aggregate = Feedback;

    fn command_type(&self) -> &'static str {
        "feedback.submit"
    }

    async fn validate(&self, _ctx: &Context, feedback: &Feedback) -> Result<(), DomainError> {
        require_open(feedback)
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Feedback>,
    ) -> Result<(), DomainError> {
        changes.apply(FeedbackEvent::Submitted(FeedbackSubmitted {}));
        Ok(())
    }
}

/// Command to store a generated summary, replacing any earlier one.
#[derive(Debug, Clone, Default)]
pub struct CreateSummary {
    /// Prose summary.
    pub summary: String,
    /// Follow-up items for the manager.
    pub action_items: Vec<String>,
}

#[async_trait]
impl Command for CreateSummary {
    type Aggregate = Feedback;

    fn command_type(&self) -> &'static str {
        "feedback.summarize"
    }

    async fn validate(&self, _ctx: &Context, feedback: &Feedback) -> Result<(), DomainError> {
        if feedback.id.is_nil() {
            return Err(DomainError::validation("feedback does not exist"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Feedback>,
    ) -> Result<(), DomainError> {
        if changes.state().summary.is_none() {
            changes.apply(FeedbackEvent::SummaryCreated(FeedbackSummaryCreated {
                id: Uuid::now_v7(),
            }));
        }
        changes.apply(FeedbackEvent::SummaryUpdated(FeedbackSummaryUpdated {
            summary: self.summary.clone(),
            action_items: self.action_items.clone(),
        }));
        Ok(())
    }
}

/// Command to open a review cycle, or reuse the caller's cycle that already
/// overlaps the window.
#[derive(Debug, Clone)]
pub struct FindOrCreateCycle {
    /// Free-form kind.
    pub cycle_type: String,
    /// Window start.
    pub start_at: DateTime<Utc>,
    /// Window end, after `start_at`.
    pub end_at: DateTime<Utc>,
}

#[async_trait]
impl Command for FindOrCreateCycle {
    type Aggregate = Cycle;

    fn command_type(&self) -> &'static str {
        "cycle.find_or_create"
    }

    async fn validate(&self, ctx: &Context, _cycle: &Cycle) -> Result<(), DomainError> {
        caller_organization(ctx)?;
        if self.start_at >= self.end_at {
            return Err(DomainError::validation("start must be before end"));
        }
        Ok(())
    }

    async fn perform(&self, ctx: &Context, changes: &mut Changes<'_, Cycle>) -> Result<(), DomainError> {
        let organization_id = caller_organization(ctx)?;
        let owner_id = ctx.identity().user_id;

        let existing = find_cycles_owned_by(ctx.repository(), organization_id, owner_id)
            .await?
            .into_iter()
            .find(|cycle| cycle.state().overlaps(self.start_at, self.end_at));
        if let Some(cycle) = existing {
            return changes.adopt(cycle);
        }

        changes.apply(CycleEvent::Created(CycleCreated {
            id: Uuid::now_v7(),
            owner_id,
            organization_id,
            cycle_type: self.cycle_type.clone(),
            start_at: self.start_at,
            end_at: self.end_at,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Duration;
    use talentradar_core::aggregate::AggregateRoot;
    use talentradar_core::event::Metadata;
    use talentradar_core::executor::call;
    use talentradar_core::identity::Identity;
    use talentradar_core::subscription::SubscriptionRegistry;
    use talentradar_test_support::{FixedClock, InMemoryRepository, SequenceRng, in_memory_context};

    use super::*;

    fn now() -> DateTime<Utc> {
        FixedClock::default_instant().0
    }

    fn manager(ctx: &Context) -> Context {
        ctx.with_identity(Identity::new(Uuid::new_v4(), Uuid::new_v4()))
    }

    fn request() -> CreateFeedback {
        CreateFeedback {
            employee_id: Uuid::new_v4(),
            email: "peer@acme.test".to_owned(),
            collection_end_at: now() + Duration::days(7),
        }
    }

    async fn requested(ctx: &Context) -> AggregateRoot<Feedback> {
        let mut root = AggregateRoot::<Feedback>::new();
        call(ctx, &mut root, &request(), Metadata::new()).await.unwrap();
        root
    }

    #[tokio::test]
    async fn test_create_feedback_draws_code_and_owner() {
        // Arrange
        let repo = InMemoryRepository::new();
        let ctx = Context::new(
            Arc::new(repo.clone()),
            Arc::new(SubscriptionRegistry::new()),
            Arc::new(FixedClock::default_instant()),
            Arc::new(Mutex::new(SequenceRng::new(vec![0, 1, 26, 61]))),
        );
        let ctx = manager(&ctx);
        let command = request();

        // Act
        let root = requested(&ctx).await;

        // Assert
        let feedback = root.state();
        assert_eq!(feedback.code, "ABa9ABa9ABa9");
        assert_eq!(feedback.owner_id, ctx.identity().user_id);
        assert_eq!(Some(feedback.organization_id), ctx.identity().organization_id);
        assert_eq!(feedback.collection_end_at, command.collection_end_at);
        assert_eq!(repo.event_types(), vec!["feedback.created"]);
    }

    #[tokio::test]
    async fn test_create_feedback_validation() {
        let (ctx, repo) = in_memory_context();
        let scoped = manager(&ctx);
        let cases = [
            (&ctx, request(), "organization is required"),
            (
                &scoped,
                CreateFeedback {
                    email: " ".to_owned(),
                    ..request()
                },
                "email is required",
            ),
            (
                &scoped,
                CreateFeedback {
                    collection_end_at: now(),
                    ..request()
                },
                "collection end must be in the future",
            ),
        ];

        for (ctx, command, expected) in cases {
            let mut root = AggregateRoot::<Feedback>::new();
            let result = call(ctx, &mut root, &command, Metadata::new()).await;

            assert!(
                matches!(&result, Err(DomainError::Validation(msg)) if msg == expected),
                "expected {expected:?}, got {result:?}"
            );
        }
        assert_eq!(repo.event_count(), 0);
    }

    #[tokio::test]
    async fn test_details_created_once_then_updated() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut root = requested(&ctx).await;
        let answers = CreateOrUpdateDetails {
            strengths: "Clear writer".to_owned(),
            rating: 3,
            ..CreateOrUpdateDetails::default()
        };

        // Act
        call(&ctx, &mut root, &answers, Metadata::new()).await.unwrap();
        call(
            &ctx,
            &mut root,
            &CreateOrUpdateDetails {
                rating: 4,
                ..answers
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(
            repo.event_types(),
            vec![
                "feedback.created",
                "feedback.details_created",
                "feedback.details_updated",
                "feedback.details_updated"
            ]
        );
        let details = root.state().details.clone().unwrap();
        assert_eq!(details.rating, 4);
        assert_eq!(details.strengths, "Clear writer");
        assert_eq!(details.employee_id, root.state().employee_id);
    }

    #[tokio::test]
    async fn test_details_reject_out_of_range_rating() {
        let (ctx, _repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut root = requested(&ctx).await;

        let result = call(
            &ctx,
            &mut root,
            &CreateOrUpdateDetails {
                rating: 6,
                ..CreateOrUpdateDetails::default()
            },
            Metadata::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg == "rating must be between 0 and 5"));
    }

    #[tokio::test]
    async fn test_submitted_feedback_is_frozen() {
        // Arrange
        let (ctx, _repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut root = requested(&ctx).await;

        // Act
        call(&ctx, &mut root, &SubmitFeedback, Metadata::new()).await.unwrap();
        let again = call(&ctx, &mut root, &SubmitFeedback, Metadata::new()).await;
        let edit = call(&ctx, &mut root, &CreateOrUpdateDetails::default(), Metadata::new()).await;

        // Assert
        assert_eq!(root.state().submitted_at, Some(now()));
        for result in [again, edit] {
            assert!(
                matches!(result, Err(DomainError::Validation(msg)) if msg == "feedback has already been submitted")
            );
        }
    }

    #[tokio::test]
    async fn test_create_summary_replaces_earlier_summary() {
        let (ctx, repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut root = requested(&ctx).await;

        for text in ["first", "second"] {
            call(
                &ctx,
                &mut root,
                &CreateSummary {
                    summary: text.to_owned(),
                    action_items: vec![format!("follow up on {text}")],
                },
                Metadata::new(),
            )
            .await
            .unwrap();
        }

        let summary = root.state().summary.clone().unwrap();
        assert_eq!(summary.summary, "second");
        assert_eq!(summary.action_items, vec!["follow up on second".to_owned()]);
        assert_eq!(
            repo.event_types()
                .iter()
                .filter(|t| t.as_str() == "feedback.summary_created")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_find_or_create_cycle_adopts_overlapping_cycle() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut first = AggregateRoot::<Cycle>::new();
        call(
            &ctx,
            &mut first,
            &FindOrCreateCycle {
                cycle_type: "quarterly".to_owned(),
                start_at: now() - Duration::days(1),
                end_at: now() + Duration::days(1),
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Act
        let mut second = AggregateRoot::<Cycle>::new();
        let outcome = call(
            &ctx,
            &mut second,
            &FindOrCreateCycle {
                cycle_type: "adhoc".to_owned(),
                start_at: now() - Duration::hours(12),
                end_at: now() + Duration::hours(12),
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Assert
        assert!(outcome.events.is_empty());
        assert_eq!(second.id(), first.id());
        assert_eq!(second.state().cycle_type, "quarterly");
        assert_eq!(repo.event_count(), 1);
    }

    #[tokio::test]
    async fn test_find_or_create_cycle_ignores_other_owners_and_disjoint_windows() {
        // Arrange
        let (ctx, _repo) = in_memory_context();
        let alice = manager(&ctx);
        let bob = alice.with_identity(Identity {
            user_id: Some(Uuid::new_v4()),
            ..*alice.identity()
        });
        let window = |start: i64| FindOrCreateCycle {
            cycle_type: "quarterly".to_owned(),
            start_at: now() + Duration::days(start),
            end_at: now() + Duration::days(start + 1),
        };
        let mut existing = AggregateRoot::<Cycle>::new();
        call(&alice, &mut existing, &window(0), Metadata::new())
            .await
            .unwrap();

        // Act
        let mut for_bob = AggregateRoot::<Cycle>::new();
        call(&bob, &mut for_bob, &window(0), Metadata::new()).await.unwrap();
        let mut later = AggregateRoot::<Cycle>::new();
        call(&alice, &mut later, &window(1), Metadata::new()).await.unwrap();

        // Assert
        assert_ne!(for_bob.id(), existing.id());
        assert_eq!(for_bob.state().owner_id, bob.identity().user_id);
        assert_ne!(later.id(), existing.id());
    }

    #[tokio::test]
    async fn test_find_or_create_cycle_rejects_inverted_window() {
        let (ctx, _repo) = in_memory_context();
        let ctx = manager(&ctx);
        let mut root = AggregateRoot::<Cycle>::new();

        let result = call(
            &ctx,
            &mut root,
            &FindOrCreateCycle {
                cycle_type: String::new(),
                start_at: now(),
                end_at: now(),
            },
            Metadata::new(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(msg)) if msg == "start must be before end"));
    }
}
