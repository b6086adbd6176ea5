//! Caller identity, supplied by the authentication layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is issuing a command, and on behalf of which tenant.
///
/// Every snapshot lookup outside the runtime is expected to scope by
/// `organization_id`; the runtime itself only copies these values onto the
/// events it persists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The authenticated user, if any.
    pub user_id: Option<Uuid>,
    /// The tenant the request is scoped to.
    pub organization_id: Option<Uuid>,
    /// The employee record linked to the user, if any.
    pub employee_id: Option<Uuid>,
}

impl Identity {
    /// An identity with no user and no tenant (system tasks, CLI tools).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An identity for `user_id` acting within `organization_id`.
    #[must_use]
    pub fn new(user_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            organization_id: Some(organization_id),
            employee_id: None,
        }
    }

    /// Returns a copy scoped to a different organization.
    #[must_use]
    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Returns `true` when a user is attached.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some_and(|id| !id.is_nil())
    }
}
