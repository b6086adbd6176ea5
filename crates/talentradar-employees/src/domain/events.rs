//! Domain events for the Employees context.

use serde::{Deserialize, Serialize};
use talentradar_core::event::EventPayload;
use uuid::Uuid;

use super::aggregates::{EmployeeType, WorkerType};

/// Event type for [`EmployeeCreated`].
pub const EMPLOYEE_CREATED_EVENT_TYPE: &str = "employee.created";
/// Event type for [`EmployeeUpdated`].
pub const EMPLOYEE_UPDATED_EVENT_TYPE: &str = "employee.updated";
/// Event type for [`EmployeeTitleUpdated`].
pub const EMPLOYEE_TITLE_UPDATED_EVENT_TYPE: &str = "employee.title_updated";
/// Event type for [`EmployeeUserUpdated`].
pub const EMPLOYEE_USER_UPDATED_EVENT_TYPE: &str = "employee.user_updated";
/// Event type for [`EmployeeTeamUpdated`].
pub const EMPLOYEE_TEAM_UPDATED_EVENT_TYPE: &str = "employee.team_updated";

/// Event type for [`TeamCreated`].
pub const TEAM_CREATED_EVENT_TYPE: &str = "team.created";
/// Event type for [`TeamUpdated`].
pub const TEAM_UPDATED_EVENT_TYPE: &str = "team.updated";

/// Event type for [`RoleCreated`].
pub const ROLE_CREATED_EVENT_TYPE: &str = "role.created";
/// Event type for [`RoleTitleUpdated`].
pub const ROLE_TITLE_UPDATED_EVENT_TYPE: &str = "role.title_updated";
/// Event type for [`RoleLevelUpdated`].
pub const ROLE_LEVEL_UPDATED_EVENT_TYPE: &str = "role.level_updated";
/// Event type for [`RoleTrackUpdated`].
pub const ROLE_TRACK_UPDATED_EVENT_TYPE: &str = "role.track_updated";

/// Emitted when an employee record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCreated {
    /// The employee identifier.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// Work email, unique within the organization.
    pub email: String,
    /// Seniority level.
    pub level: i32,
    /// Individual contributor or manager.
    pub employee_type: EmployeeType,
    /// Employment arrangement, when known.
    pub worker_type: Option<WorkerType>,
    /// The sign-in user with the same email, if one already existed.
    pub user_id: Option<Uuid>,
}

/// Emitted when an employee's core profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUpdated {
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Seniority level.
    pub level: i32,
    /// Employment arrangement.
    pub worker_type: Option<WorkerType>,
}

/// Emitted when an employee's job title changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeTitleUpdated {
    /// The new title.
    pub title: String,
}

/// Emitted when an employee is linked to a sign-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUserUpdated {
    /// The linked user.
    pub user_id: Uuid,
}

/// Emitted when an employee moves team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeTeamUpdated {
    /// The new team, or `None` when removed from every team.
    pub team_id: Option<Uuid>,
}

/// Event payload variants for employees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmployeeEvent {
    /// An employee has been created.
    Created(EmployeeCreated),
    /// An employee's profile has been updated.
    Updated(EmployeeUpdated),
    /// An employee's title has been updated.
    TitleUpdated(EmployeeTitleUpdated),
    /// An employee has been linked to a user.
    UserUpdated(EmployeeUserUpdated),
    /// An employee's team has been updated.
    TeamUpdated(EmployeeTeamUpdated),
}

impl EventPayload for EmployeeEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        EMPLOYEE_CREATED_EVENT_TYPE,
        EMPLOYEE_UPDATED_EVENT_TYPE,
        EMPLOYEE_TITLE_UPDATED_EVENT_TYPE,
        EMPLOYEE_USER_UPDATED_EVENT_TYPE,
        EMPLOYEE_TEAM_UPDATED_EVENT_TYPE,
    ];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => EMPLOYEE_CREATED_EVENT_TYPE,
            Self::Updated(_) => EMPLOYEE_UPDATED_EVENT_TYPE,
            Self::TitleUpdated(_) => EMPLOYEE_TITLE_UPDATED_EVENT_TYPE,
            Self::UserUpdated(_) => EMPLOYEE_USER_UPDATED_EVENT_TYPE,
            Self::TeamUpdated(_) => EMPLOYEE_TEAM_UPDATED_EVENT_TYPE,
        }
    }
}

/// Emitted when a team is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCreated {
    /// The team identifier.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// The employee leading the team, if any.
    pub lead_id: Option<Uuid>,
}

/// Emitted when a team is renamed or changes lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamUpdated {
    /// Display name.
    pub name: String,
    /// The employee leading the team, if any.
    pub lead_id: Option<Uuid>,
}

/// Event payload variants for teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TeamEvent {
    /// A team has been created.
    Created(TeamCreated),
    /// A team has been updated.
    Updated(TeamUpdated),
}

impl EventPayload for TeamEvent {
    const EVENT_TYPES: &'static [&'static str] = &[TEAM_CREATED_EVENT_TYPE, TEAM_UPDATED_EVENT_TYPE];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => TEAM_CREATED_EVENT_TYPE,
            Self::Updated(_) => TEAM_UPDATED_EVENT_TYPE,
        }
    }
}

/// Emitted when a role is added to the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCreated {
    /// The role identifier.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Job title, unique within the organization.
    pub title: String,
    /// Ladder level.
    pub level: i32,
    /// Individual contributor or manager track.
    pub track: EmployeeType,
}

/// Emitted when a role is retitled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTitleUpdated {
    /// The new title.
    pub title: String,
}

/// Emitted when a role moves on the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleLevelUpdated {
    /// The new level.
    pub level: i32,
}

/// Emitted when a role switches track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTrackUpdated {
    /// The new track.
    pub track: EmployeeType,
}

/// Event payload variants for roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleEvent {
    /// A role has been created.
    Created(RoleCreated),
    /// A role's title has been updated.
    TitleUpdated(RoleTitleUpdated),
    /// A role's level has been updated.
    LevelUpdated(RoleLevelUpdated),
    /// A role's track has been updated.
    TrackUpdated(RoleTrackUpdated),
}

impl EventPayload for RoleEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        ROLE_CREATED_EVENT_TYPE,
        ROLE_TITLE_UPDATED_EVENT_TYPE,
        ROLE_LEVEL_UPDATED_EVENT_TYPE,
        ROLE_TRACK_UPDATED_EVENT_TYPE,
    ];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => ROLE_CREATED_EVENT_TYPE,
            Self::TitleUpdated(_) => ROLE_TITLE_UPDATED_EVENT_TYPE,
            Self::LevelUpdated(_) => ROLE_LEVEL_UPDATED_EVENT_TYPE,
            Self::TrackUpdated(_) => ROLE_TRACK_UPDATED_EVENT_TYPE,
        }
    }
}
