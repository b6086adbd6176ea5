//! Query handlers for the Accounts context.
//!
//! Read-only lookups over the snapshot tables, returning view DTOs or
//! hydrated aggregates for use by commands and subscriptions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::error::DomainError;
use talentradar_core::repository::{Repository, SnapshotQuery, find_aggregates, load_required};
use uuid::Uuid;

use crate::domain::aggregates::{Organization, User};

/// Read-only view of an organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationView {
    /// The organization identifier.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// Billing plan name.
    pub plan_name: String,
    /// When it was deactivated, if it was.
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

/// Read-only view of a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    /// The user identifier.
    pub user_id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// "First Last".
    pub name: String,
    /// Login email.
    pub email: String,
    /// `true` while an invitation is outstanding.
    pub invited: bool,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves an organization by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no snapshot exists for the ID.
pub async fn get_organization_by_id(
    repo: &dyn Repository,
    organization_id: Uuid,
) -> Result<OrganizationView, DomainError> {
    let org = load_required::<Organization>(repo, organization_id).await?;
    let state = org.state();
    Ok(OrganizationView {
        organization_id,
        name: state.name.clone(),
        plan_name: state.merchant_plan_name.clone(),
        deactivated_at: state.deactivated_at,
        version: org.version(),
    })
}

/// Retrieves a user by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no snapshot exists for the ID.
pub async fn get_user_by_id(repo: &dyn Repository, user_id: Uuid) -> Result<UserView, DomainError> {
    let user = load_required::<User>(repo, user_id).await?;
    let state = user.state();
    Ok(UserView {
        user_id,
        organization_id: state.organization_id,
        name: state.full_name(),
        email: state.email.clone(),
        invited: state.invited_at.is_some() && state.idp_id.is_empty(),
        version: user.version(),
    })
}

/// Finds the user with `email`, optionally within one organization.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn find_user_by_email(
    repo: &dyn Repository,
    organization_id: Option<Uuid>,
    email: &str,
) -> Result<Option<AggregateRoot<User>>, DomainError> {
    let mut query = SnapshotQuery::for_aggregate::<User>().where_eq("email", email);
    if let Some(org) = organization_id {
        query = query.in_organization(org);
    }
    Ok(find_aggregates::<User>(repo, &query).await?.into_iter().next())
}
