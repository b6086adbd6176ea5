//! Domain events for the Accounts context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentradar_core::event::EventPayload;
use uuid::Uuid;

/// Event type for [`OrganizationCreated`].
pub const ORGANIZATION_CREATED_EVENT_TYPE: &str = "organization.created";
/// Event type for [`OrganizationActivated`].
pub const ORGANIZATION_ACTIVATED_EVENT_TYPE: &str = "organization.activated";
/// Event type for [`OrganizationDeactivated`].
pub const ORGANIZATION_DEACTIVATED_EVENT_TYPE: &str = "organization.deactivated";

/// Event type for [`UserCreated`].
pub const USER_CREATED_EVENT_TYPE: &str = "user.created";
/// Event type for [`UserInvited`].
pub const USER_INVITED_EVENT_TYPE: &str = "user.invited";
/// Event type for [`UserUpdated`].
pub const USER_UPDATED_EVENT_TYPE: &str = "user.updated";

/// Emitted when an organization is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationCreated {
    /// The organization identifier.
    pub id: Uuid,
    /// The organization's identifier in the identity provider.
    pub idp_id: String,
    /// Display name.
    pub name: String,
    /// Billing plan the organization signed up with.
    pub plan_name: String,
}

/// Emitted when billing activates an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationActivated {
    /// When the organization became active.
    pub at: DateTime<Utc>,
}

/// Emitted when an organization is shut down. Marks the end of its life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDeactivated {
    /// When the organization was deactivated.
    pub at: DateTime<Utc>,
}

/// Event payload variants for organizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganizationEvent {
    /// An organization has been created.
    Created(OrganizationCreated),
    /// An organization has been activated.
    Activated(OrganizationActivated),
    /// An organization has been deactivated.
    Deactivated(OrganizationDeactivated),
}

impl EventPayload for OrganizationEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        ORGANIZATION_CREATED_EVENT_TYPE,
        ORGANIZATION_ACTIVATED_EVENT_TYPE,
        ORGANIZATION_DEACTIVATED_EVENT_TYPE,
    ];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => ORGANIZATION_CREATED_EVENT_TYPE,
            Self::Activated(_) => ORGANIZATION_ACTIVATED_EVENT_TYPE,
            Self::Deactivated(_) => ORGANIZATION_DEACTIVATED_EVENT_TYPE,
        }
    }
}

/// Emitted when a user record is created, directly or by an invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreated {
    /// The user identifier.
    pub id: Uuid,
    /// The organization the user belongs to.
    pub organization_id: Uuid,
    /// The user's identifier in the identity provider (empty until the
    /// invitation is accepted).
    pub idp_id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Emitted when an invitation was sent to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInvited {
    /// The invitation's identifier in the identity provider.
    pub idp_invite_id: String,
    /// When the invitation was sent.
    pub invited_at: DateTime<Utc>,
    /// The user who sent it, if any.
    pub inviter_id: Option<Uuid>,
    /// Where the invitee accepts the invitation.
    pub invite_url: String,
}

/// Emitted when a user's profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdated {
    /// The user's identifier in the identity provider.
    pub idp_id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Event payload variants for users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserEvent {
    /// A user has been created.
    Created(UserCreated),
    /// A user has been invited.
    Invited(UserInvited),
    /// A user's profile has been updated.
    Updated(UserUpdated),
}

impl EventPayload for UserEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        USER_CREATED_EVENT_TYPE,
        USER_INVITED_EVENT_TYPE,
        USER_UPDATED_EVENT_TYPE,
    ];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => USER_CREATED_EVENT_TYPE,
            Self::Invited(_) => USER_INVITED_EVENT_TYPE,
            Self::Updated(_) => USER_UPDATED_EVENT_TYPE,
        }
    }
}
