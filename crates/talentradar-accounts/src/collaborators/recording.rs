//! Test doubles for the Accounts collaborators.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use talentradar_core::error::DomainError;

use super::{FeedbackEmail, IdentityProvider, IdpInvitation, IdpUserInput, InviteEmail, Mailer};

/// One call observed by [`RecordingIdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpCall {
    /// `create_organization(name)`.
    CreateOrganization(String),
    /// `create_user(input)`.
    CreateUser(IdpUserInput),
    /// `invite_user(organization, email, inviter)`.
    InviteUser {
        /// Provider-side organization ID.
        organization_idp_id: String,
        /// Invitee.
        email: String,
        /// Provider-side inviter ID.
        inviter_idp_id: Option<String>,
    },
}

/// Test identity provider that records every call and returns predictable
/// IDs (`idp-org-1`, `idp-user-1`, `idp-invite-1`, ...).
#[derive(Debug, Default)]
pub struct RecordingIdentityProvider {
    calls: Mutex<Vec<IdpCall>>,
    failing: bool,
}

impl RecordingIdentityProvider {
    /// Creates a provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider whose every call fails with a collaborator error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// Returns the calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<IdpCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: IdpCall) -> Result<usize, DomainError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| DomainError::Infrastructure("idp lock poisoned".into()))?;
        calls.push(call);
        if self.failing {
            return Err(DomainError::Collaborator("identity provider unavailable".into()));
        }
        Ok(calls.len())
    }
}

#[async_trait]
impl IdentityProvider for RecordingIdentityProvider {
    async fn create_organization(&self, name: &str) -> Result<String, DomainError> {
        let n = self.record(IdpCall::CreateOrganization(name.to_owned()))?;
        Ok(format!("idp-org-{n}"))
    }

    async fn create_user(&self, input: &IdpUserInput) -> Result<String, DomainError> {
        let n = self.record(IdpCall::CreateUser(input.clone()))?;
        Ok(format!("idp-user-{n}"))
    }

    async fn invite_user(
        &self,
        organization_idp_id: &str,
        email: &str,
        inviter_idp_id: Option<&str>,
    ) -> Result<IdpInvitation, DomainError> {
        let n = self.record(IdpCall::InviteUser {
            organization_idp_id: organization_idp_id.to_owned(),
            email: email.to_owned(),
            inviter_idp_id: inviter_idp_id.map(str::to_owned),
        })?;
        Ok(IdpInvitation {
            id: format!("idp-invite-{n}"),
            accept_url: format!("https://idp.test/accept/{n}"),
        })
    }
}

/// An email observed by [`RecordingMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentEmail {
    /// An invite.
    Invite(InviteEmail),
    /// A feedback request.
    Feedback(FeedbackEmail),
}

/// Test mailer that records every email.
///
/// Subscriptions send mail from detached tasks; use
/// [`wait_for`](RecordingMailer::wait_for) to observe them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    /// Creates an empty mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the emails sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Polls until at least `count` emails were sent or about a second
    /// passed, then returns what was sent.
    pub async fn wait_for(&self, count: usize) -> Vec<SentEmail> {
        for _ in 0..200 {
            if self.sent().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sent()
    }

    fn push(&self, email: SentEmail) -> Result<(), DomainError> {
        self.sent
            .lock()
            .map_err(|_| DomainError::Infrastructure("mailer lock poisoned".into()))?
            .push(email);
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), DomainError> {
        self.push(SentEmail::Invite(email.clone()))
    }

    async fn send_feedback_email(&self, email: &FeedbackEmail) -> Result<(), DomainError> {
        self.push(SentEmail::Feedback(email.clone()))
    }
}
