//! Commands for the Accounts context.

use std::sync::Arc;

use async_trait::async_trait;
use talentradar_core::command::{Changes, Command};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::{Organization, User};
use super::events::{
    OrganizationActivated, OrganizationCreated, OrganizationDeactivated, OrganizationEvent,
    UserCreated, UserEvent, UserInvited, UserUpdated,
};
use crate::collaborators::{IdentityProvider, IdpUserInput};

/// A record known both locally and to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpRecord {
    /// Local aggregate identifier.
    pub id: Uuid,
    /// Identifier in the identity provider.
    pub idp_id: String,
}

impl From<&Organization> for IdpRecord {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            idp_id: org.idp_id.clone(),
        }
    }
}

impl From<&User> for IdpRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            idp_id: user.idp_id.clone(),
        }
    }
}

/// Returns `value` unless it is blank, in which case `current`.
fn coalesce(value: &str, current: &str) -> String {
    if value.trim().is_empty() {
        current.to_owned()
    } else {
        value.to_owned()
    }
}

/// Splits a display name into first and last name.
///
/// One word is a first name only. With three or more words the last word is
/// the last name and the first name is every word before the final two.
#[must_use]
pub fn split_name(name: &str) -> (String, String) {
    let pieces: Vec<&str> = name.split_whitespace().collect();
    match pieces.as_slice() {
        [] => (String::new(), String::new()),
        [first] => ((*first).to_owned(), String::new()),
        [first, last] => ((*first).to_owned(), (*last).to_owned()),
        [leading @ .., _, last] => (leading.join(" "), (*last).to_owned()),
    }
}

/// Command to create a new organization.
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    /// Where the organization is provisioned.
    pub identity_provider: Arc<dyn IdentityProvider>,
    /// Display name.
    pub name: String,
    /// Billing plan name.
    pub plan_name: String,
}

#[async_trait]
impl Command for CreateOrganization {
    type Aggregate = Organization;

    fn command_type(&self) -> &'static str {
        "organization.create"
    }

    async fn validate(&self, _ctx: &Context, _org: &Organization) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Organization>,
    ) -> Result<(), DomainError> {
        let idp_id = self
            .identity_provider
            .create_organization(&self.name)
            .await?;

        changes.apply(OrganizationEvent::Created(OrganizationCreated {
            id: Uuid::now_v7(),
            idp_id,
            name: self.name.clone(),
            plan_name: self.plan_name.clone(),
        }));
        Ok(())
    }
}

/// Command to mark an organization as active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivateOrganization;

#[async_trait]
impl Command for ActivateOrganization {
    type Aggregate = Organization;

    fn command_type(&self) -> &'static str {
        "organization.activate"
    }

    async fn validate(&self, _ctx: &Context, org: &Organization) -> Result<(), DomainError> {
        if org.id.is_nil() {
            return Err(DomainError::validation("organization does not exist"));
        }
        if org.is_deactivated() {
            return Err(DomainError::validation("organization is deactivated"));
        }
        if org.activated_at.is_some() {
            return Err(DomainError::validation("organization is already active"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Organization>,
    ) -> Result<(), DomainError> {
        changes.apply(OrganizationEvent::Activated(OrganizationActivated {
            at: ctx.clock().now(),
        }));
        Ok(())
    }
}

/// Command to shut an organization down.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeactivateOrganization;

#[async_trait]
impl Command for DeactivateOrganization {
    type Aggregate = Organization;

    fn command_type(&self) -> &'static str {
        "organization.deactivate"
    }

    async fn validate(&self, _ctx: &Context, org: &Organization) -> Result<(), DomainError> {
        if org.id.is_nil() {
            return Err(DomainError::validation("organization does not exist"));
        }
        if org.is_deactivated() {
            return Err(DomainError::validation("organization is already deactivated"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Organization>,
    ) -> Result<(), DomainError> {
        changes.apply(OrganizationEvent::Deactivated(OrganizationDeactivated {
            at: ctx.clock().now(),
        }));
        Ok(())
    }
}

/// Command to create a user with a password, provisioning them in the
/// identity provider.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Where the user is provisioned.
    pub identity_provider: Arc<dyn IdentityProvider>,
    /// The organization the user joins.
    pub organization: Option<IdpRecord>,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Initial password, passed through to the identity provider only.
    pub password: String,
}

#[async_trait]
impl Command for CreateUser {
    type Aggregate = User;

    fn command_type(&self) -> &'static str {
        "user.create"
    }

    async fn validate(&self, _ctx: &Context, _user: &User) -> Result<(), DomainError> {
        if self.organization.is_none() {
            return Err(DomainError::validation("organization is required"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, User>,
    ) -> Result<(), DomainError> {
        let organization = self
            .organization
            .as_ref()
            .ok_or_else(|| DomainError::validation("organization is required"))?;

        let idp_id = self
            .identity_provider
            .create_user(&IdpUserInput {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
                organization_idp_id: organization.idp_id.clone(),
            })
            .await?;

        changes.apply(UserEvent::Created(UserCreated {
            id: Uuid::now_v7(),
            organization_id: organization.id,
            idp_id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }));
        Ok(())
    }
}

/// Command to invite someone into an organization by email.
#[derive(Debug, Clone)]
pub struct InviteUser {
    /// Sends the invitation.
    pub identity_provider: Arc<dyn IdentityProvider>,
    /// The organization the invitee joins.
    pub organization: Option<IdpRecord>,
    /// The user sending the invite, if any.
    pub inviter: Option<IdpRecord>,
    /// The invitee's display name.
    pub name: String,
    /// The invitee's email.
    pub email: String,
}

#[async_trait]
impl Command for InviteUser {
    type Aggregate = User;

    fn command_type(&self) -> &'static str {
        "user.invite"
    }

    async fn validate(&self, _ctx: &Context, _user: &User) -> Result<(), DomainError> {
        if self.organization.is_none() {
            return Err(DomainError::validation("organization is required"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, User>,
    ) -> Result<(), DomainError> {
        let organization = self
            .organization
            .as_ref()
            .ok_or_else(|| DomainError::validation("organization is required"))?;

        let invitation = self
            .identity_provider
            .invite_user(
                &organization.idp_id,
                &self.email,
                self.inviter.as_ref().map(|i| i.idp_id.as_str()),
            )
            .await?;

        let (first_name, last_name) = split_name(&self.name);

        changes.apply(UserEvent::Created(UserCreated {
            id: Uuid::now_v7(),
            organization_id: organization.id,
            idp_id: String::new(),
            email: self.email.clone(),
            first_name,
            last_name,
        }));
        changes.apply(UserEvent::Invited(UserInvited {
            idp_invite_id: invitation.id,
            invited_at: ctx.clock().now(),
            inviter_id: self.inviter.as_ref().map(|i| i.id),
            invite_url: invitation.accept_url,
        }));
        Ok(())
    }
}

/// Command to update a user's profile. Blank fields keep their current
/// value.
#[derive(Debug, Clone, Default)]
pub struct EditUser {
    /// Identifier in the identity provider.
    pub idp_id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

#[async_trait]
impl Command for EditUser {
    type Aggregate = User;

    fn command_type(&self) -> &'static str {
        "user.edit"
    }

    async fn validate(&self, _ctx: &Context, user: &User) -> Result<(), DomainError> {
        if user.id.is_nil() {
            return Err(DomainError::validation("user does not exist"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, User>,
    ) -> Result<(), DomainError> {
        let user = changes.state();
        let updated = UserUpdated {
            idp_id: coalesce(&self.idp_id, &user.idp_id),
            email: coalesce(&self.email, &user.email),
            first_name: coalesce(&self.first_name, &user.first_name),
            last_name: coalesce(&self.last_name, &user.last_name),
        };
        changes.apply(UserEvent::Updated(updated));
        Ok(())
    }
}
