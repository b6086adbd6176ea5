//! Command handlers for the Accounts context.
//!
//! Each handler loads whatever the command needs, runs it through
//! [`call`], and returns the outcome. They are the entry points used by the
//! CLI and by other contexts.

use std::sync::Arc;

use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Metadata;
use talentradar_core::executor::{CommandOutcome, call};
use talentradar_core::identity::Identity;
use talentradar_core::repository::{load_aggregate, load_required};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::query_handlers::find_user_by_email;
use crate::collaborators::IdentityProvider;
use crate::domain::aggregates::{Organization, User};
use crate::domain::commands::{
    CreateOrganization, CreateUser, DeactivateOrganization, EditUser, IdpRecord, InviteUser,
};

/// Input for signing up a new organization with its first user.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    /// Organization display name.
    pub organization_name: String,
    /// Billing plan name.
    pub plan_name: String,
    /// First user's email.
    pub email: String,
    /// First user's given name.
    pub first_name: String,
    /// First user's family name.
    pub last_name: String,
    /// First user's password.
    pub password: String,
}

/// The records created by [`handle_register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// The new organization.
    pub organization_id: Uuid,
    /// The new user.
    pub user_id: Uuid,
}

/// Creates an organization and its first user.
///
/// The user is created acting within the new organization, so its events
/// carry the tenant.
///
/// # Errors
///
/// Returns the first failing command's `DomainError`. If the user cannot be
/// created the organization stays.
#[instrument(skip(ctx, identity_provider, input), fields(organization = %input.organization_name))]
pub async fn handle_register(
    ctx: &Context,
    identity_provider: Arc<dyn IdentityProvider>,
    input: RegisterAccount,
    metadata: Metadata,
) -> Result<Registration, DomainError> {
    let mut org = AggregateRoot::<Organization>::new();
    call(
        ctx,
        &mut org,
        &CreateOrganization {
            identity_provider: Arc::clone(&identity_provider),
            name: input.organization_name,
            plan_name: input.plan_name,
        },
        metadata.clone(),
    )
    .await?;

    let mut identity = *ctx.identity();
    identity.organization_id = Some(org.id());
    let scoped = ctx.with_identity(identity);

    let mut user = AggregateRoot::<User>::new();
    call(
        &scoped,
        &mut user,
        &CreateUser {
            identity_provider,
            organization: Some(IdpRecord::from(org.state())),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password: input.password,
        },
        metadata,
    )
    .await?;

    info!(organization_id = %org.id(), user_id = %user.id(), "account registered");
    Ok(Registration {
        organization_id: org.id(),
        user_id: user.id(),
    })
}

/// Input for inviting a user.
#[derive(Debug, Clone)]
pub struct InviteRequest {
    /// Organization to invite into.
    pub organization_id: Uuid,
    /// The user sending the invite.
    pub inviter_id: Option<Uuid>,
    /// Invitee display name.
    pub name: String,
    /// Invitee email.
    pub email: String,
}

/// Invites a user into an organization.
///
/// An unknown organization surfaces as the command's own
/// "organization is required" validation error.
///
/// # Errors
///
/// Returns `DomainError::Validation` on bad input,
/// `DomainError::AggregateNotFound` for an unknown inviter, or the
/// identity provider's error.
#[instrument(skip(ctx, identity_provider, request), fields(organization_id = %request.organization_id))]
pub async fn handle_invite_user(
    ctx: &Context,
    identity_provider: Arc<dyn IdentityProvider>,
    request: InviteRequest,
    metadata: Metadata,
) -> Result<(AggregateRoot<User>, CommandOutcome), DomainError> {
    let organization = load_aggregate::<Organization>(ctx.repository(), request.organization_id)
        .await?
        .map(|org| IdpRecord::from(org.state()));
    let inviter = match request.inviter_id {
        Some(id) => Some(IdpRecord::from(
            load_required::<User>(ctx.repository(), id).await?.state(),
        )),
        None => None,
    };

    let ctx = ctx.with_identity(Identity {
        organization_id: Some(request.organization_id),
        user_id: request.inviter_id.or(ctx.identity().user_id),
        ..*ctx.identity()
    });
    let mut user = AggregateRoot::<User>::new();
    let outcome = call(
        &ctx,
        &mut user,
        &InviteUser {
            identity_provider,
            organization,
            inviter,
            name: request.name,
            email: request.email,
        },
        metadata,
    )
    .await?;
    Ok((user, outcome))
}

/// Deactivates an organization.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown organization or
/// `DomainError::Validation` if it is already deactivated.
#[instrument(skip(ctx))]
pub async fn handle_deactivate_organization(
    ctx: &Context,
    organization_id: Uuid,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    let mut org = load_required::<Organization>(ctx.repository(), organization_id).await?;
    call(ctx, &mut org, &DeactivateOrganization, metadata).await
}

/// A profile change pushed by the identity provider.
#[derive(Debug, Clone, Default)]
pub struct IdpProfileUpdate {
    /// Tenant to search, when known.
    pub organization_id: Option<Uuid>,
    /// Identifier in the identity provider.
    pub idp_id: String,
    /// Email used to find the local user.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Applies an identity-provider profile update to the matching local user.
///
/// Returns `Ok(None)` when no user has that email.
///
/// # Errors
///
/// Returns `DomainError` if the lookup or the edit fails.
#[instrument(skip(ctx, update), fields(email = %update.email))]
pub async fn handle_idp_profile_update(
    ctx: &Context,
    update: IdpProfileUpdate,
    metadata: Metadata,
) -> Result<Option<CommandOutcome>, DomainError> {
    let Some(mut user) =
        find_user_by_email(ctx.repository(), update.organization_id, &update.email).await?
    else {
        return Ok(None);
    };

    let outcome = call(
        ctx,
        &mut user,
        &EditUser {
            idp_id: update.idp_id,
            email: String::new(),
            first_name: update.first_name,
            last_name: update.last_name,
        },
        metadata,
    )
    .await?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use talentradar_test_support::in_memory_context;

    use super::*;
    use crate::collaborators::RecordingIdentityProvider;

    fn registration() -> RegisterAccount {
        RegisterAccount {
            organization_name: "Acme".to_owned(),
            plan_name: "team".to_owned(),
            email: "ada@acme.test".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            password: "hunter22".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_organization_and_user_in_tenant() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let idp = Arc::new(RecordingIdentityProvider::new());

        // Act
        let registration = handle_register(&ctx, idp, registration(), Metadata::new())
            .await
            .unwrap();

        // Assert
        let user = load_required::<User>(&repo, registration.user_id)
            .await
            .unwrap();
        assert_eq!(user.state().organization_id, registration.organization_id);
        let user_events = repo.events_for(registration.user_id);
        assert_eq!(user_events.len(), 1);
        assert_eq!(user_events[0].organization_id, Some(registration.organization_id));
    }

    #[tokio::test]
    async fn test_invite_into_unknown_organization_is_rejected() {
        let (ctx, repo) = in_memory_context();
        let idp = Arc::new(RecordingIdentityProvider::new());

        let result = handle_invite_user(
            &ctx,
            idp,
            InviteRequest {
                organization_id: Uuid::new_v4(),
                inviter_id: None,
                name: "Grace Hopper".to_owned(),
                email: "grace@acme.test".to_owned(),
            },
            Metadata::new(),
        )
        .await;

        assert!(
            matches!(result, Err(DomainError::Validation(msg)) if msg == "organization is required")
        );
        assert_eq!(repo.event_count(), 0);
    }

    #[tokio::test]
    async fn test_invite_records_inviter() {
        // Arrange
        let (ctx, _repo) = in_memory_context();
        let idp = Arc::new(RecordingIdentityProvider::new());
        let registration = handle_register(&ctx, idp.clone(), registration(), Metadata::new())
            .await
            .unwrap();

        // Act
        let (user, outcome) = handle_invite_user(
            &ctx,
            idp,
            InviteRequest {
                organization_id: registration.organization_id,
                inviter_id: Some(registration.user_id),
                name: "Grace Hopper".to_owned(),
                email: "grace@acme.test".to_owned(),
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(user.state().inviter_id, Some(registration.user_id));
        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.events.iter().all(|e| e.user_id == Some(registration.user_id)));
    }

    #[tokio::test]
    async fn test_profile_update_for_unknown_email_is_ignored() {
        let (ctx, repo) = in_memory_context();

        let outcome = handle_idp_profile_update(
            &ctx,
            IdpProfileUpdate {
                email: "nobody@acme.test".to_owned(),
                ..IdpProfileUpdate::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        assert!(outcome.is_none());
        assert_eq!(repo.event_count(), 0);
    }

    #[tokio::test]
    async fn test_profile_update_edits_matching_user() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let idp = Arc::new(RecordingIdentityProvider::new());
        let registration = handle_register(&ctx, idp, registration(), Metadata::new())
            .await
            .unwrap();

        // Act
        handle_idp_profile_update(
            &ctx,
            IdpProfileUpdate {
                organization_id: Some(registration.organization_id),
                idp_id: "user_42".to_owned(),
                email: "ada@acme.test".to_owned(),
                first_name: "Augusta".to_owned(),
                last_name: String::new(),
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Assert
        let user = load_required::<User>(&repo, registration.user_id)
            .await
            .unwrap();
        assert_eq!(user.state().first_name, "Augusta");
        assert_eq!(user.state().last_name, "Lovelace");
        assert_eq!(user.state().idp_id, "user_42");
    }
}
