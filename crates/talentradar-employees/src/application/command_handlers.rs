//! Command handlers for the Employees context.
//!
//! Creation handlers return the new aggregate alongside the outcome; update
//! handlers load the aggregate by ID first.

use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::command::Command;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Metadata;
use talentradar_core::executor::{CommandOutcome, call};
use talentradar_core::repository::load_required;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::aggregates::{Employee, Role, Team};
use crate::domain::commands::{
    ChangeEmployeeTeam, CreateEmployee, CreateRole, CreateTeam, UpdateEmployee, UpdateRole,
    UpdateTeam,
};

async fn create<C: Command>(
    ctx: &Context,
    command: &C,
    metadata: Metadata,
) -> Result<(AggregateRoot<C::Aggregate>, CommandOutcome), DomainError> {
    let mut root = AggregateRoot::<C::Aggregate>::new();
    let outcome = call(ctx, &mut root, command, metadata).await?;
    Ok((root, outcome))
}

async fn update<C: Command>(
    ctx: &Context,
    id: Uuid,
    command: &C,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    let mut root = load_required::<C::Aggregate>(ctx.repository(), id).await?;
    call(ctx, &mut root, command, metadata).await
}

/// Adds an employee.
///
/// # Errors
///
/// Returns `DomainError::Validation` on bad input or a duplicate email.
#[instrument(skip(ctx, command), fields(email = %command.email))]
pub async fn handle_create_employee(
    ctx: &Context,
    command: CreateEmployee,
    metadata: Metadata,
) -> Result<(AggregateRoot<Employee>, CommandOutcome), DomainError> {
    create(ctx, &command, metadata).await
}

/// Edits an employee.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown employee or
/// `DomainError::Validation` on bad input.
#[instrument(skip(ctx, command))]
pub async fn handle_update_employee(
    ctx: &Context,
    employee_id: Uuid,
    command: UpdateEmployee,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    update(ctx, employee_id, &command, metadata).await
}

/// Moves an employee to a team, or out of every team with `None`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown employee.
#[instrument(skip(ctx))]
pub async fn handle_change_employee_team(
    ctx: &Context,
    employee_id: Uuid,
    team_id: Option<Uuid>,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    update(ctx, employee_id, &ChangeEmployeeTeam { team_id }, metadata).await
}

/// Creates a team.
///
/// # Errors
///
/// Returns `DomainError::Validation` on bad input.
#[instrument(skip(ctx, command), fields(name = %command.name))]
pub async fn handle_create_team(
    ctx: &Context,
    command: CreateTeam,
    metadata: Metadata,
) -> Result<(AggregateRoot<Team>, CommandOutcome), DomainError> {
    create(ctx, &command, metadata).await
}

/// Renames a team or changes its lead.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown team.
#[instrument(skip(ctx, command))]
pub async fn handle_update_team(
    ctx: &Context,
    team_id: Uuid,
    command: UpdateTeam,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    update(ctx, team_id, &command, metadata).await
}

/// Adds a role to the ladder.
///
/// # Errors
///
/// Returns `DomainError::Validation` on bad input or an existing title.
#[instrument(skip(ctx, command), fields(title = %command.title))]
pub async fn handle_create_role(
    ctx: &Context,
    command: CreateRole,
    metadata: Metadata,
) -> Result<(AggregateRoot<Role>, CommandOutcome), DomainError> {
    create(ctx, &command, metadata).await
}

/// Edits a role.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown role.
#[instrument(skip(ctx, command))]
pub async fn handle_update_role(
    ctx: &Context,
    role_id: Uuid,
    command: UpdateRole,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    update(ctx, role_id, &command, metadata).await
}

#[cfg(test)]
mod tests {
    use talentradar_core::identity::Identity;
    use talentradar_test_support::in_memory_context;

    use super::*;

    #[tokio::test]
    async fn test_update_unknown_employee_returns_not_found() {
        let (ctx, _repo) = in_memory_context();
        let id = Uuid::new_v4();

        let result = handle_update_employee(&ctx, id, UpdateEmployee::default(), Metadata::new()).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_team_lifecycle_through_handlers() {
        // Arrange
        let (ctx, repo) = in_memory_context();
        let ctx = ctx.with_identity(Identity::new(Uuid::new_v4(), Uuid::new_v4()));
        let (team, _) = handle_create_team(
            &ctx,
            CreateTeam {
                name: "Platform".to_owned(),
                ..CreateTeam::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();
        let (employee, _) = handle_create_employee(
            &ctx,
            CreateEmployee {
                name: "Grace".to_owned(),
                email: "grace@acme.test".to_owned(),
                ..CreateEmployee::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Act
        handle_change_employee_team(&ctx, employee.id(), Some(team.id()), Metadata::new())
            .await
            .unwrap();
        handle_update_team(
            &ctx,
            team.id(),
            UpdateTeam {
                lead_id: Some(employee.id()),
                ..UpdateTeam::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        // Assert
        let team = load_required::<Team>(&repo, team.id()).await.unwrap();
        let employee = load_required::<Employee>(&repo, employee.id()).await.unwrap();
        assert_eq!(team.state().lead_id, Some(employee.id()));
        assert_eq!(team.state().name, "Platform");
        assert_eq!(employee.state().team_id, Some(team.id()));
        assert_eq!(employee.version(), 2);
    }

    #[tokio::test]
    async fn test_update_role_through_handler() {
        let (ctx, repo) = in_memory_context();
        let ctx = ctx.with_identity(Identity::new(Uuid::new_v4(), Uuid::new_v4()));
        let (role, _) = handle_create_role(
            &ctx,
            CreateRole {
                title: "Engineer".to_owned(),
                level: 1,
                ..CreateRole::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        let outcome = handle_update_role(
            &ctx,
            role.id(),
            UpdateRole {
                title: "Software Engineer".to_owned(),
                ..UpdateRole::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.events[0].event_type, "role.title_updated");
        let role = load_required::<Role>(&repo, role.id()).await.unwrap();
        assert_eq!(role.state().title, "Software Engineer");
    }
}
