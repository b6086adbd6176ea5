//! Command handlers for the Reviews context.

use chrono::{DateTime, Utc};
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Metadata;
use talentradar_core::executor::{CommandOutcome, call};
use talentradar_core::identity::Identity;
use talentradar_core::repository::load_required;
use talentradar_employees::application::query_handlers::list_team_members;
use talentradar_employees::domain::aggregates::Employee;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{Cycle, Feedback};
use crate::domain::commands::{CreateFeedback, CreateOrUpdateDetails, FindOrCreateCycle, SubmitFeedback};

/// Requests feedback about an employee from one reviewer.
///
/// # Errors
///
/// Returns `DomainError::Validation` on bad input.
#[instrument(skip(ctx, command), fields(employee_id = %command.employee_id))]
pub async fn handle_create_feedback(
    ctx: &Context,
    command: CreateFeedback,
    metadata: Metadata,
) -> Result<(AggregateRoot<Feedback>, CommandOutcome), DomainError> {
    let mut root = AggregateRoot::<Feedback>::new();
    let outcome = call(ctx, &mut root, &command, metadata).await?;
    Ok((root, outcome))
}

/// Input for requesting feedback about several employees at once.
#[derive(Debug, Clone, Default)]
pub struct BulkFeedbackRequest {
    /// The employees to collect feedback about.
    pub employee_ids: Vec<Uuid>,
    /// Reviewers asked about every employee.
    pub additional_emails: Vec<String>,
    /// Also ask each employee's teammates.
    pub include_team: bool,
    /// Deadline for submission.
    pub collection_end_at: Option<DateTime<Utc>>,
}

/// Requests feedback about each employee from every reviewer that applies
/// to them. Nobody is asked about themselves and each reviewer is asked
/// once per employee.
///
/// Stops at the first failure; requests created before it stay.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown employee or the
/// first failing command's error.
#[instrument(skip(ctx, request), fields(employees = request.employee_ids.len()))]
pub async fn handle_bulk_feedback(
    ctx: &Context,
    request: BulkFeedbackRequest,
    metadata: Metadata,
) -> Result<Vec<AggregateRoot<Feedback>>, DomainError> {
    let collection_end_at = request
        .collection_end_at
        .ok_or_else(|| DomainError::validation("collection end is required"))?;
    let mut created = Vec::new();

    for employee_id in &request.employee_ids {
        let employee = load_required::<Employee>(ctx.repository(), *employee_id).await?;
        let employee = employee.state();

        let mut reviewers = request.additional_emails.clone();
        if let (true, Some(team_id)) = (request.include_team, employee.team_id) {
            reviewers.extend(
                list_team_members(ctx.repository(), employee.organization_id, team_id)
                    .await?
                    .into_iter()
                    .map(|member| member.email),
            );
        }

        for email in reviewers_for(employee, reviewers) {
            let (feedback, _) = handle_create_feedback(
                ctx,
                CreateFeedback {
                    employee_id: employee.id,
                    email,
                    collection_end_at,
                },
                metadata.clone(),
            )
            .await?;
            created.push(feedback);
        }
    }

    info!(count = created.len(), "bulk feedback requested");
    Ok(created)
}

/// Deduplicates reviewers case-insensitively, keeping first-seen order, and
/// drops the employee's own address.
fn reviewers_for(employee: &Employee, emails: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    emails
        .into_iter()
        .map(|email| email.trim().to_owned())
        .filter(|email| {
            let key = email.to_lowercase();
            if email.is_empty() || email.eq_ignore_ascii_case(&employee.email) || seen.contains(&key) {
                debug!(%email, "reviewer skipped");
                return false;
            }
            seen.push(key);
            true
        })
        .collect()
}

/// Runs `command` against a feedback request acting within its tenant.
/// Reviewers are not users, so the caller's identity carries no tenant.
async fn on_feedback<C>(
    ctx: &Context,
    feedback_id: Uuid,
    command: &C,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError>
where
    C: talentradar_core::command::Command<Aggregate = Feedback>,
{
    let mut feedback = load_required::<Feedback>(ctx.repository(), feedback_id).await?;
    let ctx = ctx.with_identity(Identity {
        organization_id: Some(feedback.state().organization_id),
        ..*ctx.identity()
    });
    call(&ctx, &mut feedback, command, metadata).await
}

/// Saves a reviewer's answers.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown request or
/// `DomainError::Validation` if it was already submitted.
#[instrument(skip(ctx, command))]
pub async fn handle_save_details(
    ctx: &Context,
    feedback_id: Uuid,
    command: CreateOrUpdateDetails,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    on_feedback(ctx, feedback_id, &command, metadata).await
}

/// Submits a reviewer's answers.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown request or
/// `DomainError::Validation` if it was already submitted.
#[instrument(skip(ctx))]
pub async fn handle_submit_feedback(
    ctx: &Context,
    feedback_id: Uuid,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    on_feedback(ctx, feedback_id, &SubmitFeedback, metadata).await
}

/// Opens a review cycle for the caller, or returns their overlapping one.
///
/// # Errors
///
/// Returns `DomainError::Validation` on an inverted window or a caller
/// without a tenant.
#[instrument(skip(ctx, command), fields(cycle_type = %command.cycle_type))]
pub async fn handle_find_or_create_cycle(
    ctx: &Context,
    command: FindOrCreateCycle,
    metadata: Metadata,
) -> Result<AggregateRoot<Cycle>, DomainError> {
    let mut root = AggregateRoot::<Cycle>::new();
    call(ctx, &mut root, &command, metadata).await?;
    Ok(root)
}
