//! Aggregate roots for the Employees context.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentradar_core::aggregate::Aggregate;
use talentradar_core::error::DomainError;
use talentradar_core::event::Event;
use uuid::Uuid;

use super::events::{EmployeeEvent, RoleEvent, TeamEvent};

/// Career track of an employee or a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeType {
    /// Individual contributor.
    #[default]
    #[serde(rename = "IC")]
    IndividualContributor,
    /// People manager.
    #[serde(rename = "MNG")]
    Manager,
}

impl EmployeeType {
    /// Reads a free-form track name. "manager" and "mng" (any case) mean
    /// [`EmployeeType::Manager`]; anything else is an individual
    /// contributor.
    #[must_use]
    pub fn from_track(track: &str) -> Self {
        match track.trim().to_ascii_lowercase().as_str() {
            "manager" | "mng" => Self::Manager,
            _ => Self::IndividualContributor,
        }
    }

    /// The stored code, `IC` or `MNG`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IndividualContributor => "IC",
            Self::Manager => "MNG",
        }
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerType {
    /// Direct contractor.
    #[serde(rename = "DC")]
    DirectContractor,
    /// Agency contractor.
    #[serde(rename = "AC")]
    AgencyContractor,
    /// Full-time employee.
    #[serde(rename = "FTE")]
    FullTime,
}

impl WorkerType {
    /// The stored code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectContractor => "DC",
            Self::AgencyContractor => "AC",
            Self::FullTime => "FTE",
        }
    }
}

impl FromStr for WorkerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DC" => Ok(Self::DirectContractor),
            "AC" => Ok(Self::AgencyContractor),
            "FTE" => Ok(Self::FullTime),
            other => Err(DomainError::Validation(format!(
                "unknown worker type: {other}"
            ))),
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person in the organization who can be reviewed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Job title.
    pub title: String,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// Linked sign-in user.
    pub user_id: Option<Uuid>,
    /// Current team.
    pub team_id: Option<Uuid>,
    /// Seniority level.
    pub level: i32,
    /// Individual contributor or manager.
    pub employee_type: EmployeeType,
    /// Employment arrangement.
    pub worker_type: Option<WorkerType>,
    /// When the record was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When any field last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Employee {
    /// `true` once the employee is linked to a sign-in user.
    #[must_use]
    pub fn has_user(&self) -> bool {
        self.user_id.is_some()
    }
}

impl Aggregate for Employee {
    const AGGREGATE_TYPE: &'static str = "employee";
    const TOPIC: &'static str = "events.employees";
    const TABLE_NAME: &'static str = "employees";
    type Event = EmployeeEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<EmployeeEvent>) {
        match &event.data {
            EmployeeEvent::Created(payload) => {
                self.id = payload.id;
                self.organization_id = payload.organization_id;
                self.name.clone_from(&payload.name);
                self.email.clone_from(&payload.email);
                self.level = payload.level;
                self.employee_type = payload.employee_type;
                self.worker_type = payload.worker_type;
                self.user_id = payload.user_id;
                self.created_at = Some(event.created_at);
            }
            EmployeeEvent::Updated(payload) => {
                self.name.clone_from(&payload.name);
                self.email.clone_from(&payload.email);
                self.level = payload.level;
                self.worker_type = payload.worker_type;
            }
            EmployeeEvent::TitleUpdated(payload) => {
                self.title.clone_from(&payload.title);
            }
            EmployeeEvent::UserUpdated(payload) => {
                self.user_id = Some(payload.user_id);
            }
            EmployeeEvent::TeamUpdated(payload) => {
                self.team_id = payload.team_id;
            }
        }
        self.updated_at = Some(event.created_at);
    }
}

/// A group of employees with an optional lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// The employee leading the team.
    pub lead_id: Option<Uuid>,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// When the team was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the team last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Team {
    const AGGREGATE_TYPE: &'static str = "team";
    const TOPIC: &'static str = "events.teams";
    const TABLE_NAME: &'static str = "teams";
    type Event = TeamEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<TeamEvent>) {
        match &event.data {
            TeamEvent::Created(payload) => {
                self.id = payload.id;
                self.organization_id = payload.organization_id;
                self.name.clone_from(&payload.name);
                self.lead_id = payload.lead_id;
                self.created_at = Some(event.created_at);
            }
            TeamEvent::Updated(payload) => {
                self.name.clone_from(&payload.name);
                self.lead_id = payload.lead_id;
            }
        }
        self.updated_at = Some(event.created_at);
    }
}

/// A rung on the organization's career ladder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Job title.
    pub title: String,
    /// Ladder level.
    pub level: i32,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// Individual contributor or manager track.
    pub track: EmployeeType,
    /// When the role was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the role last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Role {
    const AGGREGATE_TYPE: &'static str = "role";
    const TOPIC: &'static str = "events.employee_roles";
    const TABLE_NAME: &'static str = "employee_roles";
    type Event = RoleEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<RoleEvent>) {
        match &event.data {
            RoleEvent::Created(payload) => {
                self.id = payload.id;
                self.organization_id = payload.organization_id;
                self.title.clone_from(&payload.title);
                self.level = payload.level;
                self.track = payload.track;
                self.created_at = Some(event.created_at);
            }
            RoleEvent::TitleUpdated(payload) => self.title.clone_from(&payload.title),
            RoleEvent::LevelUpdated(payload) => self.level = payload.level,
            RoleEvent::TrackUpdated(payload) => self.track = payload.track,
        }
        self.updated_at = Some(event.created_at);
    }
}
