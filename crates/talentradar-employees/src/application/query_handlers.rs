//! Query handlers for the Employees context.

use serde::Serialize;
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::error::DomainError;
use talentradar_core::repository::{Repository, SnapshotQuery, find_aggregates, load_required};
use uuid::Uuid;

use crate::domain::aggregates::{Employee, EmployeeType, Role, Team, WorkerType};

/// Read-only view of an employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeView {
    /// The employee identifier.
    pub employee_id: Uuid,
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: String,
    /// Job title.
    pub title: String,
    /// Seniority level.
    pub level: i32,
    /// Track code.
    pub employee_type: EmployeeType,
    /// Employment arrangement.
    pub worker_type: Option<WorkerType>,
    /// Current team.
    pub team_id: Option<Uuid>,
    /// Linked sign-in user.
    pub user_id: Option<Uuid>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&AggregateRoot<Employee>> for EmployeeView {
    fn from(root: &AggregateRoot<Employee>) -> Self {
        let state = root.state();
        Self {
            employee_id: root.id(),
            name: state.name.clone(),
            email: state.email.clone(),
            title: state.title.clone(),
            level: state.level,
            employee_type: state.employee_type,
            worker_type: state.worker_type,
            team_id: state.team_id,
            user_id: state.user_id,
            version: root.version(),
        }
    }
}

/// Read-only view of a role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleView {
    /// The role identifier.
    pub role_id: Uuid,
    /// Job title.
    pub title: String,
    /// Ladder level.
    pub level: i32,
    /// Track code.
    pub track: EmployeeType,
}

/// Retrieves an employee by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no snapshot exists for the ID.
pub async fn get_employee_by_id(
    repo: &dyn Repository,
    employee_id: Uuid,
) -> Result<EmployeeView, DomainError> {
    let employee = load_required::<Employee>(repo, employee_id).await?;
    Ok(EmployeeView::from(&employee))
}

/// Finds the employee with `email` in an organization.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn find_employee_by_email(
    repo: &dyn Repository,
    organization_id: Uuid,
    email: &str,
) -> Result<Option<AggregateRoot<Employee>>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Employee>()
        .in_organization(organization_id)
        .where_eq("email", email);
    Ok(find_aggregates::<Employee>(repo, &query).await?.into_iter().next())
}

/// Lists an organization's employees, ordered by name.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn list_employees(
    repo: &dyn Repository,
    organization_id: Uuid,
) -> Result<Vec<EmployeeView>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Employee>().in_organization(organization_id);
    let mut views: Vec<EmployeeView> = find_aggregates::<Employee>(repo, &query)
        .await?
        .iter()
        .map(EmployeeView::from)
        .collect();
    views.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(views)
}

/// Lists the employees currently in `team_id`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn list_team_members(
    repo: &dyn Repository,
    organization_id: Uuid,
    team_id: Uuid,
) -> Result<Vec<EmployeeView>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Employee>()
        .in_organization(organization_id)
        .where_eq("team_id", team_id.to_string());
    Ok(find_aggregates::<Employee>(repo, &query)
        .await?
        .iter()
        .map(EmployeeView::from)
        .collect())
}

/// Retrieves a team by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no snapshot exists for the ID.
pub async fn get_team_by_id(repo: &dyn Repository, team_id: Uuid) -> Result<Team, DomainError> {
    Ok(load_required::<Team>(repo, team_id).await?.into_state())
}

/// Finds the role titled `title` in an organization.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn find_role_by_title(
    repo: &dyn Repository,
    organization_id: Uuid,
    title: &str,
) -> Result<Option<AggregateRoot<Role>>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Role>()
        .in_organization(organization_id)
        .where_eq("title", title);
    Ok(find_aggregates::<Role>(repo, &query).await?.into_iter().next())
}

/// Lists an organization's role ladder, lowest level first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage failure.
pub async fn list_roles(
    repo: &dyn Repository,
    organization_id: Uuid,
) -> Result<Vec<RoleView>, DomainError> {
    let query = SnapshotQuery::for_aggregate::<Role>().in_organization(organization_id);
    let mut roles: Vec<RoleView> = find_aggregates::<Role>(repo, &query)
        .await?
        .into_iter()
        .map(|root| {
            let role = root.into_state();
            RoleView {
                role_id: role.id,
                title: role.title,
                level: role.level,
                track: role.track,
            }
        })
        .collect();
    roles.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.title.cmp(&b.title)));
    Ok(roles)
}
