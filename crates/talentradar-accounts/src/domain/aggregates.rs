//! Aggregate roots for the Accounts context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentradar_core::aggregate::Aggregate;
use talentradar_core::event::Event;
use uuid::Uuid;

use super::events::{OrganizationEvent, UserEvent};

/// A tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Identifier in the identity provider.
    pub idp_id: String,
    /// Billing customer.
    pub merchant_customer_id: String,
    /// Billing plan identifier.
    pub merchant_plan_id: String,
    /// Billing plan name.
    pub merchant_plan_name: String,
    /// Set once billing activates the organization.
    pub activated_at: Option<DateTime<Utc>>,
    /// Set once the organization is shut down.
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// `true` once the organization has been deactivated.
    #[must_use]
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }
}

impl Aggregate for Organization {
    const AGGREGATE_TYPE: &'static str = "organization";
    const TOPIC: &'static str = "events.organization";
    const TABLE_NAME: &'static str = "organizations";
    type Event = OrganizationEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    /// An organization is its own tenant.
    fn organization_id(&self) -> Option<Uuid> {
        (!self.id.is_nil()).then_some(self.id)
    }

    fn apply(&mut self, event: &Event<OrganizationEvent>) {
        match &event.data {
            OrganizationEvent::Created(payload) => {
                self.id = payload.id;
                self.name.clone_from(&payload.name);
                self.idp_id.clone_from(&payload.idp_id);
                self.merchant_plan_name.clone_from(&payload.plan_name);
            }
            OrganizationEvent::Activated(payload) => {
                self.activated_at = Some(payload.at);
            }
            OrganizationEvent::Deactivated(payload) => {
                self.deactivated_at = Some(payload.at);
            }
        }
    }
}

/// A person who can sign in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// Identifier in the identity provider.
    pub idp_id: String,
    /// Pending invitation in the identity provider.
    pub idp_invite_id: String,
    /// When the user was invited, if they were.
    pub invited_at: Option<DateTime<Utc>>,
    /// Who invited them.
    pub inviter_id: Option<Uuid>,
}

impl User {
    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

impl Aggregate for User {
    const AGGREGATE_TYPE: &'static str = "user";
    const TOPIC: &'static str = "events.users";
    const TABLE_NAME: &'static str = "users";
    type Event = UserEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<UserEvent>) {
        match &event.data {
            UserEvent::Created(payload) => {
                self.id = payload.id;
                self.organization_id = payload.organization_id;
                self.idp_id.clone_from(&payload.idp_id);
                self.email.clone_from(&payload.email);
                self.first_name.clone_from(&payload.first_name);
                self.last_name.clone_from(&payload.last_name);
            }
            UserEvent::Invited(payload) => {
                self.idp_invite_id.clone_from(&payload.idp_invite_id);
                self.invited_at = Some(payload.invited_at);
                self.inviter_id = payload.inviter_id;
            }
            UserEvent::Updated(payload) => {
                self.idp_id.clone_from(&payload.idp_id);
                self.email.clone_from(&payload.email);
                self.first_name.clone_from(&payload.first_name);
                self.last_name.clone_from(&payload.last_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use talentradar_core::event::{EventPayload, Metadata};

    use super::*;
    use crate::domain::events::{OrganizationCreated, OrganizationDeactivated, UserCreated};

    fn event<P: EventPayload>(aggregate_id: Uuid, version: i64, data: P) -> Event<P> {
        Event {
            id: Uuid::new_v4(),
            aggregate_id,
            aggregate_type: "test".to_owned(),
            event_type: data.event_type().to_owned(),
            version,
            data,
            metadata: Metadata::new(),
            organization_id: None,
            user_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_applying_organization_created_twice_is_idempotent() {
        let id = Uuid::new_v4();
        let created = event(
            id,
            1,
            OrganizationEvent::Created(OrganizationCreated {
                id,
                idp_id: "idp-org-1".to_owned(),
                name: "Acme".to_owned(),
                plan_name: "team".to_owned(),
            }),
        );

        let mut once = Organization::default();
        once.apply(&created);
        let mut twice = Organization::default();
        twice.apply(&created);
        twice.apply(&created);

        assert_eq!(once, twice);
        assert_eq!(once.name, "Acme");
        assert_eq!(once.merchant_plan_name, "team");
        assert_eq!(once.organization_id(), Some(id));
    }

    #[test]
    fn test_deactivated_marks_end_of_life() {
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut org = Organization::default();

        org.apply(&event(
            id,
            2,
            OrganizationEvent::Deactivated(OrganizationDeactivated { at }),
        ));

        assert!(org.is_deactivated());
        assert_eq!(org.deactivated_at, Some(at));
    }

    #[test]
    fn test_new_user_has_no_tenant() {
        let user = User::default();

        assert_eq!(user.organization_id(), None);
    }

    #[test]
    fn test_user_created_sets_profile_and_tenant() {
        let id = Uuid::new_v4();
        let org = Uuid::new_v4();
        let mut user = User::default();

        user.apply(&event(
            id,
            1,
            UserEvent::Created(UserCreated {
                id,
                organization_id: org,
                idp_id: String::new(),
                email: "grace@acme.test".to_owned(),
                first_name: "Grace".to_owned(),
                last_name: "Hopper".to_owned(),
            }),
        ));

        assert_eq!(user.id, id);
        assert_eq!(user.organization_id(), Some(org));
        assert_eq!(user.full_name(), "Grace Hopper");
    }
}
