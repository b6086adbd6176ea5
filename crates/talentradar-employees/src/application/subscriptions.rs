//! Subscriptions for the Employees context.

use talentradar_accounts::domain::aggregates::User;
use talentradar_accounts::domain::events::{USER_CREATED_EVENT_TYPE, UserEvent};
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Event;
use talentradar_core::executor::call;
use talentradar_core::subscription::SubscriptionRegistry;
use tracing::{debug, info};

use crate::application::query_handlers::find_employee_by_email;
use crate::domain::commands::LinkEmployeeUser;

/// Registers every Employees subscription.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a subscription names an event type
/// its aggregate does not produce.
pub fn register_subscriptions(registry: &mut SubscriptionRegistry) -> Result<(), DomainError> {
    registry.subscribe::<User, _, _>(
        USER_CREATED_EVENT_TYPE,
        "employees.link_user",
        |ctx: Context, user: AggregateRoot<User>, event: Event<UserEvent>| async move {
            link_employee_user(&ctx, &user, &event).await
        },
    )
}

/// Links the employee sharing a new user's email to that user.
async fn link_employee_user(
    ctx: &Context,
    user: &AggregateRoot<User>,
    event: &Event<UserEvent>,
) -> Result<(), DomainError> {
    let UserEvent::Created(created) = &event.data else {
        return Ok(());
    };
    if created.organization_id.is_nil() {
        return Ok(());
    }

    let Some(mut employee) =
        find_employee_by_email(ctx.repository(), created.organization_id, &created.email).await?
    else {
        debug!(email = %created.email, "no employee to link");
        return Ok(());
    };
    if employee.state().user_id == Some(user.id()) {
        return Ok(());
    }

    call(
        ctx,
        &mut employee,
        &LinkEmployeeUser { user_id: user.id() },
        event.metadata.clone(),
    )
    .await?;
    info!(employee_id = %employee.id(), user_id = %user.id(), "employee linked to user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use talentradar_accounts::application::command_handlers::{InviteRequest, handle_invite_user};
    use talentradar_accounts::collaborators::RecordingIdentityProvider;
    use talentradar_accounts::domain::aggregates::Organization;
    use talentradar_accounts::domain::commands::CreateOrganization;
    use talentradar_core::event::Metadata;
    use talentradar_core::identity::Identity;
    use talentradar_core::repository::load_required;
    use talentradar_test_support::{InMemoryRepository, context_with};
    use uuid::Uuid;

    use super::*;
    use crate::application::command_handlers::handle_create_employee;
    use crate::domain::aggregates::Employee;
    use crate::domain::commands::CreateEmployee;

    fn setup() -> (Context, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let mut registry = SubscriptionRegistry::new();
        register_subscriptions(&mut registry).unwrap();
        (context_with(Arc::new(repo.clone()), registry), repo)
    }

    async fn organization(ctx: &Context, idp: &Arc<RecordingIdentityProvider>) -> Uuid {
        let mut org = AggregateRoot::<Organization>::new();
        call(
            ctx,
            &mut org,
            &CreateOrganization {
                identity_provider: idp.clone(),
                name: "Acme".to_owned(),
                plan_name: String::new(),
            },
            Metadata::new(),
        )
        .await
        .unwrap();
        org.id()
    }

    #[tokio::test]
    async fn test_user_created_links_matching_employee() {
        // Arrange
        let (ctx, repo) = setup();
        let idp = Arc::new(RecordingIdentityProvider::new());
        let org = organization(&ctx, &idp).await;
        let hr = ctx.with_identity(Identity::new(Uuid::new_v4(), org));
        let (employee, _) = handle_create_employee(
            &hr,
            CreateEmployee {
                name: "Grace Hopper".to_owned(),
                email: "grace@acme.test".to_owned(),
                ..CreateEmployee::default()
            },
            Metadata::new(),
        )
        .await
        .unwrap();
        let metadata = Metadata::new().with_source("test");

        // Act
        let (user, _) = handle_invite_user(
            &ctx,
            idp,
            InviteRequest {
                organization_id: org,
                inviter_id: None,
                name: "Grace Hopper".to_owned(),
                email: "grace@acme.test".to_owned(),
            },
            metadata.clone(),
        )
        .await
        .unwrap();

        // Assert
        let employee = load_required::<Employee>(&repo, employee.id()).await.unwrap();
        assert_eq!(employee.state().user_id, Some(user.id()));
        let link = repo.events_for(employee.id()).pop().unwrap();
        assert_eq!(link.event_type, "employee.user_updated");
        assert_eq!(link.metadata, metadata);
    }

    #[tokio::test]
    async fn test_user_without_matching_employee_changes_nothing() {
        let (ctx, repo) = setup();
        let idp = Arc::new(RecordingIdentityProvider::new());
        let org = organization(&ctx, &idp).await;

        handle_invite_user(
            &ctx,
            idp,
            InviteRequest {
                organization_id: org,
                inviter_id: None,
                name: "Linus".to_owned(),
                email: "linus@acme.test".to_owned(),
            },
            Metadata::new(),
        )
        .await
        .unwrap();

        assert!(!repo.event_types().iter().any(|t| t.starts_with("employee.")));
    }

    #[test]
    fn test_register_subscriptions_wires_link_handler() {
        let mut registry = SubscriptionRegistry::new();

        register_subscriptions(&mut registry).unwrap();

        assert_eq!(registry.handler_count("user", USER_CREATED_EVENT_TYPE), 1);
    }
}
