//! Commands for the Employees context.

use async_trait::async_trait;
use talentradar_accounts::application::query_handlers::find_user_by_email;
use talentradar_core::command::{Changes, Command};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::{Employee, EmployeeType, Role, Team, WorkerType};
use super::events::{
    EmployeeCreated, EmployeeEvent, EmployeeTeamUpdated, EmployeeTitleUpdated, EmployeeUpdated,
    EmployeeUserUpdated, RoleCreated, RoleEvent, RoleLevelUpdated, RoleTitleUpdated,
    RoleTrackUpdated, TeamCreated, TeamEvent, TeamUpdated,
};
use crate::application::query_handlers::{find_employee_by_email, find_role_by_title};

/// Highest employee level, exclusive.
pub const EMPLOYEE_LEVEL_LIMIT: i32 = 10;
/// Highest role level, inclusive.
pub const MAX_ROLE_LEVEL: i32 = 11;

fn coalesce(value: &str, current: &str) -> String {
    if value.trim().is_empty() {
        current.to_owned()
    } else {
        value.trim().to_owned()
    }
}

fn non_nil(id: Option<Uuid>) -> Option<Uuid> {
    id.filter(|id| !id.is_nil())
}

/// The explicit organization, else the caller's.
fn tenant(explicit: Option<Uuid>, ctx: &Context) -> Result<Uuid, DomainError> {
    non_nil(explicit.or(ctx.identity().organization_id))
        .ok_or_else(|| DomainError::validation("organization is required"))
}

fn check_employee_level(level: i32) -> Result<(), DomainError> {
    if (0..EMPLOYEE_LEVEL_LIMIT).contains(&level) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "level must be between 0 and {}",
            EMPLOYEE_LEVEL_LIMIT - 1
        )))
    }
}

/// Command to add an employee to an organization.
#[derive(Debug, Clone, Default)]
pub struct CreateEmployee {
    /// Owning organization. Defaults to the caller's.
    pub organization_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Job title. Blank means none.
    pub title: String,
    /// Whether the employee manages people.
    pub manager: bool,
    /// Employment arrangement.
    pub worker_type: Option<WorkerType>,
    /// Seniority level, below [`EMPLOYEE_LEVEL_LIMIT`].
    pub level: i32,
    /// Initial team.
    pub team_id: Option<Uuid>,
}

#[async_trait]
impl Command for CreateEmployee {
    type Aggregate = Employee;

    fn command_type(&self) -> &'static str {
        "employee.create"
    }

    async fn validate(&self, ctx: &Context, _employee: &Employee) -> Result<(), DomainError> {
        let organization_id = tenant(self.organization_id, ctx)?;
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("email is invalid"));
        }
        check_employee_level(self.level)?;
        if find_employee_by_email(ctx.repository(), organization_id, self.email.trim())
            .await?
            .is_some()
        {
            return Err(DomainError::validation(
                "employee with that email already exists",
            ));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Employee>,
    ) -> Result<(), DomainError> {
        let organization_id = tenant(self.organization_id, ctx)?;
        let email = self.email.trim().to_owned();
        let user_id = find_user_by_email(ctx.repository(), Some(organization_id), &email)
            .await?
            .map(|user| user.id());

        changes.apply(EmployeeEvent::Created(EmployeeCreated {
            id: Uuid::now_v7(),
            organization_id,
            name: self.name.trim().to_owned(),
            email,
            level: self.level,
            employee_type: if self.manager {
                EmployeeType::Manager
            } else {
                EmployeeType::IndividualContributor
            },
            worker_type: self.worker_type,
            user_id,
        }));
        if let Some(team_id) = non_nil(self.team_id) {
            changes.apply(EmployeeEvent::TeamUpdated(EmployeeTeamUpdated {
                team_id: Some(team_id),
            }));
        }
        if !self.title.trim().is_empty() {
            changes.apply(EmployeeEvent::TitleUpdated(EmployeeTitleUpdated {
                title: self.title.trim().to_owned(),
            }));
        }
        Ok(())
    }
}

/// Command to edit an employee. Blank strings and a zero level keep the
/// current value; `worker_type: None` keeps the current arrangement.
///
/// `team_id: Some(nil)` removes the employee from their team.
#[derive(Debug, Clone, Default)]
pub struct UpdateEmployee {
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Seniority level.
    pub level: i32,
    /// Employment arrangement.
    pub worker_type: Option<WorkerType>,
    /// New team.
    pub team_id: Option<Uuid>,
    /// New job title.
    pub title: String,
}

#[async_trait]
impl Command for UpdateEmployee {
    type Aggregate = Employee;

    fn command_type(&self) -> &'static str {
        "employee.update"
    }

    async fn validate(&self, ctx: &Context, employee: &Employee) -> Result<(), DomainError> {
        if employee.id.is_nil() {
            return Err(DomainError::validation("employee does not exist"));
        }
        check_employee_level(self.level)?;
        let email = self.email.trim();
        if email.is_empty() || email == employee.email {
            return Ok(());
        }
        if !email.contains('@') {
            return Err(DomainError::validation("email is invalid"));
        }
        if find_employee_by_email(ctx.repository(), employee.organization_id, email)
            .await?
            .is_some()
        {
            return Err(DomainError::validation(
                "employee with that email already exists",
            ));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Employee>,
    ) -> Result<(), DomainError> {
        let employee = changes.state();
        let updated = EmployeeUpdated {
            name: coalesce(&self.name, &employee.name),
            email: coalesce(&self.email, &employee.email),
            level: if self.level == 0 {
                employee.level
            } else {
                self.level
            },
            worker_type: self.worker_type.or(employee.worker_type),
        };
        changes.apply(EmployeeEvent::Updated(updated));

        if let Some(team_id) = self.team_id {
            changes.apply(EmployeeEvent::TeamUpdated(EmployeeTeamUpdated {
                team_id: non_nil(Some(team_id)),
            }));
        }
        if !self.title.trim().is_empty() {
            changes.apply(EmployeeEvent::TitleUpdated(EmployeeTitleUpdated {
                title: self.title.trim().to_owned(),
            }));
        }
        Ok(())
    }
}

/// Command to link an employee to the sign-in user with the same email.
#[derive(Debug, Clone, Copy)]
pub struct LinkEmployeeUser {
    /// The user to link.
    pub user_id: Uuid,
}

#[async_trait]
impl Command for LinkEmployeeUser {
    type Aggregate = Employee;

    fn command_type(&self) -> &'static str {
        "employee.link_user"
    }

    async fn validate(&self, _ctx: &Context, employee: &Employee) -> Result<(), DomainError> {
        if employee.id.is_nil() {
            return Err(DomainError::validation("employee does not exist"));
        }
        if self.user_id.is_nil() {
            return Err(DomainError::validation("user is required"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Employee>,
    ) -> Result<(), DomainError> {
        changes.apply(EmployeeEvent::UserUpdated(EmployeeUserUpdated {
            user_id: self.user_id,
        }));
        Ok(())
    }
}

/// Command to move an employee to another team, or out of every team with
/// `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeEmployeeTeam {
    /// The new team.
    pub team_id: Option<Uuid>,
}

#[async_trait]
impl Command for ChangeEmployeeTeam {
    type Aggregate = Employee;

    fn command_type(&self) -> &'static str {
        "employee.change_team"
    }

    async fn validate(&self, _ctx: &Context, employee: &Employee) -> Result<(), DomainError> {
        if employee.id.is_nil() {
            return Err(DomainError::validation("employee does not exist"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Employee>,
    ) -> Result<(), DomainError> {
        changes.apply(EmployeeEvent::TeamUpdated(EmployeeTeamUpdated {
            team_id: non_nil(self.team_id),
        }));
        Ok(())
    }
}

/// Command to create a team.
#[derive(Debug, Clone, Default)]
pub struct CreateTeam {
    /// Owning organization. Defaults to the caller's.
    pub organization_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// The leading employee. A nil ID means no lead.
    pub lead_id: Option<Uuid>,
}

#[async_trait]
impl Command for CreateTeam {
    type Aggregate = Team;

    fn command_type(&self) -> &'static str {
        "team.create"
    }

    async fn validate(&self, ctx: &Context, _team: &Team) -> Result<(), DomainError> {
        tenant(self.organization_id, ctx)?;
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(())
    }

    async fn perform(&self, ctx: &Context, changes: &mut Changes<'_, Team>) -> Result<(), DomainError> {
        changes.apply(TeamEvent::Created(TeamCreated {
            id: Uuid::now_v7(),
            organization_id: tenant(self.organization_id, ctx)?,
            name: self.name.trim().to_owned(),
            lead_id: non_nil(self.lead_id),
        }));
        Ok(())
    }
}

/// Command to rename a team or change its lead.
///
/// A blank name keeps the current one. `lead_id: None` keeps the current
/// lead and `Some(nil)` removes it.
#[derive(Debug, Clone, Default)]
pub struct UpdateTeam {
    /// Display name.
    pub name: String,
    /// The leading employee.
    pub lead_id: Option<Uuid>,
}

#[async_trait]
impl Command for UpdateTeam {
    type Aggregate = Team;

    fn command_type(&self) -> &'static str {
        "team.update"
    }

    async fn validate(&self, _ctx: &Context, team: &Team) -> Result<(), DomainError> {
        if team.id.is_nil() {
            return Err(DomainError::validation("team does not exist"));
        }
        Ok(())
    }

    async fn perform(&self, _ctx: &Context, changes: &mut Changes<'_, Team>) -> Result<(), DomainError> {
        let team = changes.state();
        let updated = TeamUpdated {
            name: coalesce(&self.name, &team.name),
            lead_id: match self.lead_id {
                Some(lead_id) => non_nil(Some(lead_id)),
                None => team.lead_id,
            },
        };
        changes.apply(TeamEvent::Updated(updated));
        Ok(())
    }
}

/// Command to add a role to the organization's ladder.
#[derive(Debug, Clone, Default)]
pub struct CreateRole {
    /// Owning organization. Defaults to the caller's.
    pub organization_id: Option<Uuid>,
    /// Job title, unique within the organization.
    pub title: String,
    /// Ladder level, `0..=MAX_ROLE_LEVEL`.
    pub level: i32,
    /// Individual contributor or manager track.
    pub track: EmployeeType,
}

#[async_trait]
impl Command for CreateRole {
    type Aggregate = Role;

    fn command_type(&self) -> &'static str {
        "role.create"
    }

    async fn validate(&self, ctx: &Context, _role: &Role) -> Result<(), DomainError> {
        let organization_id = tenant(self.organization_id, ctx)?;
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if !(0..=MAX_ROLE_LEVEL).contains(&self.level) {
            return Err(DomainError::Validation(format!(
                "level must be between 0 and {MAX_ROLE_LEVEL}"
            )));
        }
        if find_role_by_title(ctx.repository(), organization_id, self.title.trim())
            .await?
            .is_some()
        {
            return Err(DomainError::validation("role exists"));
        }
        Ok(())
    }

    async fn perform(&self, ctx: &Context, changes: &mut Changes<'_, Role>) -> Result<(), DomainError> {
        changes.apply(RoleEvent::Created(RoleCreated {
            id: Uuid::now_v7(),
            organization_id: tenant(self.organization_id, ctx)?,
            title: self.title.trim().to_owned(),
            level: self.level,
            track: self.track,
        }));
        Ok(())
    }
}

/// Command to edit a role. Only supplied fields (non-blank, non-zero)
/// produce an event; the track is parsed with [`EmployeeType::from_track`].
#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    /// New title.
    pub title: String,
    /// New track, free-form.
    pub track: String,
    /// New level.
    pub level: i32,
}

#[async_trait]
impl Command for UpdateRole {
    type Aggregate = Role;

    fn command_type(&self) -> &'static str {
        "role.update"
    }

    async fn validate(&self, _ctx: &Context, role: &Role) -> Result<(), DomainError> {
        if role.id.is_nil() {
            return Err(DomainError::validation("role does not exist"));
        }
        if !(0..=MAX_ROLE_LEVEL).contains(&self.level) {
            return Err(DomainError::Validation(format!(
                "level must be between 0 and {MAX_ROLE_LEVEL}"
            )));
        }
        Ok(())
    }

    async fn perform(&self, _ctx: &Context, changes: &mut Changes<'_, Role>) -> Result<(), DomainError> {
        if !self.title.trim().is_empty() {
            changes.apply(RoleEvent::TitleUpdated(RoleTitleUpdated {
                title: self.title.trim().to_owned(),
            }));
        }
        if self.level != 0 {
            changes.apply(RoleEvent::LevelUpdated(RoleLevelUpdated { level: self.level }));
        }
        if !self.track.trim().is_empty() {
            changes.apply(RoleEvent::TrackUpdated(RoleTrackUpdated {
                track: EmployeeType::from_track(&self.track),
            }));
        }
        Ok(())
    }
}
