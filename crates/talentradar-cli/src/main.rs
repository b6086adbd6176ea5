//! Talent Radar command-line entry point.

use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::Parser;
use serde_json::json;
use talentradar_accounts::application::command_handlers::{
    InviteRequest, RegisterAccount, handle_invite_user, handle_register,
};
use talentradar_core::context::Context;
use talentradar_core::event::Metadata;
use talentradar_core::executor::CommandOutcome;
use talentradar_core::identity::Identity;
use talentradar_employees::application::command_handlers::handle_create_employee;
use talentradar_employees::domain::commands::CreateEmployee;
use talentradar_event_store::schema;
use talentradar_reviews::application::command_handlers::{BulkFeedbackRequest, handle_bulk_feedback};
use talentradar_reviews::application::query_handlers::list_feedback_for_employee;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cli::{Caller, Cli, Commands};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::runtime::Runtime;

mod cli;
mod config;
mod error;
mod runtime;

/// Upper bound on waiting for detached subscription work (emails,
/// summaries) before the process exits.
const SUBSCRIPTION_DRAIN_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let pool = runtime::connect(&config).await?;

    if matches!(cli.command, Commands::Migrate) {
        schema::migrate(&pool).await?;
        tracing::info!("migrations applied");
        return Ok(());
    }

    let runtime = runtime::build(pool, &config)?;
    run(&runtime, cli.command).await?;
    let background = runtime.context.background();
    if !background.is_empty() && !background.wait(SUBSCRIPTION_DRAIN_TIMEOUT).await {
        tracing::warn!(
            timeout_secs = SUBSCRIPTION_DRAIN_TIMEOUT.as_secs(),
            "gave up waiting for subscription work"
        );
    }
    Ok(())
}

/// Runs one subcommand.
async fn run(runtime: &Runtime, command: Commands) -> Result<(), AppError> {
    let ctx = &runtime.context;
    match command {
        Commands::Migrate => Ok(()),
        Commands::Register {
            organization,
            plan,
            email,
            first_name,
            last_name,
            password,
        } => {
            let registration = handle_register(
                ctx,
                runtime.identity_provider.clone(),
                RegisterAccount {
                    organization_name: organization,
                    plan_name: plan,
                    email,
                    first_name,
                    last_name,
                    password,
                },
                metadata(None),
            )
            .await?;
            print_json(&json!({
                "organization_id": registration.organization_id,
                "user_id": registration.user_id,
            }))?;
            Ok(())
        }
        Commands::Invite {
            caller,
            name,
            email,
        } => {
            let (user, outcome) = handle_invite_user(
                &as_caller(ctx, caller),
                runtime.identity_provider.clone(),
                InviteRequest {
                    organization_id: caller.organization_id,
                    inviter_id: caller.user_id,
                    name,
                    email,
                },
                metadata(caller.user_id),
            )
            .await?;
            print_outcome(user.id(), &outcome)?;
            Ok(())
        }
        Commands::CreateEmployee {
            caller,
            name,
            email,
            title,
            manager,
            worker_type,
            level,
            team_id,
        } => {
            let (employee, outcome) = handle_create_employee(
                &as_caller(ctx, caller),
                CreateEmployee {
                    organization_id: Some(caller.organization_id),
                    name,
                    email,
                    title,
                    manager,
                    worker_type,
                    level,
                    team_id,
                },
                metadata(caller.user_id),
            )
            .await?;
            print_outcome(employee.id(), &outcome)?;
            Ok(())
        }
        Commands::RequestFeedback {
            caller,
            employee_ids,
            reviewers,
            include_team,
            due_in_days,
        } => {
            let ctx = as_caller(ctx, caller);
            let collection_end_at = ctx.clock().now() + Duration::days(i64::from(due_in_days));
            let created = handle_bulk_feedback(
                &ctx,
                BulkFeedbackRequest {
                    employee_ids,
                    additional_emails: reviewers,
                    include_team,
                    collection_end_at: Some(collection_end_at),
                },
                metadata(caller.user_id),
            )
            .await?;
            let requests: Vec<_> = created
                .iter()
                .map(|feedback| {
                    json!({
                        "feedback_id": feedback.id(),
                        "employee_id": feedback.state().employee_id,
                        "email": feedback.state().email,
                    })
                })
                .collect();
            print_json(&json!({ "requests": requests }))?;
            Ok(())
        }
        Commands::ListFeedback {
            caller,
            employee_id,
        } => {
            let views =
                list_feedback_for_employee(ctx.repository(), caller.organization_id, employee_id)
                    .await?;
            print_json(&serde_json::to_value(views)?)?;
            Ok(())
        }
    }
}

fn as_caller(ctx: &Context, caller: Caller) -> Context {
    ctx.with_identity(Identity {
        user_id: caller.user_id,
        organization_id: Some(caller.organization_id),
        employee_id: None,
    })
}

fn metadata(actor: Option<Uuid>) -> Metadata {
    let metadata = Metadata::new().with_source("cli");
    match actor {
        Some(actor) => metadata.with_actor(actor),
        None => metadata,
    }
}

fn print_outcome(aggregate_id: Uuid, outcome: &CommandOutcome) -> Result<(), AppError> {
    print_json(&json!({
        "aggregate_id": aggregate_id,
        "event_ids": outcome.event_ids(),
    }))
}

fn print_json(value: &serde_json::Value) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
