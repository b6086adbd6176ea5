//! External services the Accounts context talks to: the identity provider
//! and the transactional mailer.
//!
//! Production HTTP clients live outside this workspace. The `Logging*`
//! implementations stand in for them during local development. The
//! `Recording*` test doubles are built for this crate's tests and, behind
//! the `test-support` feature, for downstream crates.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use talentradar_core::error::DomainError;
use tracing::info;
use uuid::Uuid;

#[cfg(any(test, feature = "test-support"))]
mod recording;
#[cfg(any(test, feature = "test-support"))]
pub use recording::{IdpCall, RecordingIdentityProvider, RecordingMailer, SentEmail};

/// Input for provisioning a user in the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpUserInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// The organization's identifier in the identity provider.
    pub organization_idp_id: String,
}

/// A pending invitation created by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpInvitation {
    /// The invitation's identifier in the identity provider.
    pub id: String,
    /// Where the invitee accepts the invitation.
    pub accept_url: String,
}

/// External identity provider (organizations, users, invitations).
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    /// Creates an organization and returns its provider-side ID.
    async fn create_organization(&self, name: &str) -> Result<String, DomainError>;

    /// Creates a user, adds them to the organization and returns the
    /// provider-side user ID.
    async fn create_user(&self, input: &IdpUserInput) -> Result<String, DomainError>;

    /// Sends an invitation to `email` on behalf of `inviter_idp_id`.
    async fn invite_user(
        &self,
        organization_idp_id: &str,
        email: &str,
        inviter_idp_id: Option<&str>,
    ) -> Result<IdpInvitation, DomainError>;
}

/// Parameters of the "you have been invited" email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    /// The invitee's first name.
    pub name: String,
    /// Who sent the invite.
    pub inviter_name: String,
    /// Recipient.
    pub email: String,
    /// Invitation accept link.
    pub accept_link: String,
    /// The organization being joined.
    pub organization_name: String,
}

impl InviteEmail {
    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "You have been invited to join {} on TalentRadar",
            self.organization_name
        )
    }
}

/// Parameters of the feedback request email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEmail {
    /// Name of the employee feedback is requested about.
    pub name: String,
    /// Recipient.
    pub email: String,
    /// Link to the feedback form.
    pub feedback_url: String,
    /// Deadline shown in the email.
    pub collection_end_at: DateTime<Utc>,
}

impl FeedbackEmail {
    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Feedback Request for {}", self.name)
    }

    /// The deadline formatted the way the template expects (`MM/DD/YYYY`).
    #[must_use]
    pub fn formatted_deadline(&self) -> String {
        self.collection_end_at.format("%m/%d/%Y").to_string()
    }
}

/// Transactional email delivery.
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    /// Sends a user invitation.
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), DomainError>;

    /// Sends a feedback request.
    async fn send_feedback_email(&self, email: &FeedbackEmail) -> Result<(), DomainError>;
}

/// Identity provider for local development: logs each call and hands out
/// synthetic IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingIdentityProvider;

#[async_trait]
impl IdentityProvider for LoggingIdentityProvider {
    async fn create_organization(&self, name: &str) -> Result<String, DomainError> {
        let id = format!("org_{}", Uuid::new_v4().simple());
        info!(idp_id = %id, name, "identity provider: organization created");
        Ok(id)
    }

    async fn create_user(&self, input: &IdpUserInput) -> Result<String, DomainError> {
        let id = format!("user_{}", Uuid::new_v4().simple());
        info!(
            idp_id = %id,
            email = %input.email,
            organization = %input.organization_idp_id,
            "identity provider: user created"
        );
        Ok(id)
    }

    async fn invite_user(
        &self,
        organization_idp_id: &str,
        email: &str,
        inviter_idp_id: Option<&str>,
    ) -> Result<IdpInvitation, DomainError> {
        let id = format!("invitation_{}", Uuid::new_v4().simple());
        info!(
            invitation = %id,
            email,
            organization = organization_idp_id,
            inviter = inviter_idp_id.unwrap_or_default(),
            "identity provider: invitation sent"
        );
        Ok(IdpInvitation {
            accept_url: format!("https://auth.localhost/invite/{id}"),
            id,
        })
    }
}

/// Mailer for local development: logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), DomainError> {
        info!(
            recipient = %email.email,
            subject = %email.subject(),
            accept_link = %email.accept_link,
            "mailer: invite email"
        );
        Ok(())
    }

    async fn send_feedback_email(&self, email: &FeedbackEmail) -> Result<(), DomainError> {
        info!(
            recipient = %email.email,
            subject = %email.subject(),
            feedback_url = %email.feedback_url,
            deadline = %email.formatted_deadline(),
            "mailer: feedback request email"
        );
        Ok(())
    }
}
