//! Wires the Postgres store, the subscriptions of every context and the
//! production collaborators into one [`Context`].

use std::sync::{Arc, Mutex};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use talentradar_accounts::collaborators::{IdentityProvider, LoggingIdentityProvider, LoggingMailer, Mailer};
use talentradar_core::clock::SystemClock;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::rng::SystemRng;
use talentradar_core::subscription::SubscriptionRegistry;
use talentradar_event_store::pg_repository::PgRepository;
use talentradar_reviews::collaborators::{LoggingSummarizer, Summarizer};
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;

/// Everything a subcommand needs to run.
pub struct Runtime {
    /// Base context; subcommands scope it to their caller.
    pub context: Context,
    /// Identity provider used by registration and invitations.
    pub identity_provider: Arc<dyn IdentityProvider>,
}

/// Opens the connection pool.
///
/// # Errors
///
/// Returns `AppError::Database` if the database is unreachable.
pub async fn connect(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Registers the subscriptions of every bounded context.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a context subscribes to an event
/// type its aggregate does not produce.
pub fn subscriptions(
    mailer: &Arc<dyn Mailer>,
    summarizer: Arc<dyn Summarizer>,
    frontend_url: &str,
) -> Result<SubscriptionRegistry, DomainError> {
    let mut registry = SubscriptionRegistry::new();
    talentradar_accounts::application::subscriptions::register_subscriptions(
        &mut registry,
        Arc::clone(mailer),
    )?;
    talentradar_employees::application::subscriptions::register_subscriptions(&mut registry)?;
    talentradar_reviews::application::subscriptions::register_subscriptions(
        &mut registry,
        Arc::clone(mailer),
        summarizer,
        frontend_url.to_owned(),
    )?;
    Ok(registry)
}

/// Builds the runtime over `pool`.
///
/// # Errors
///
/// Returns `AppError::Domain` if subscription registration fails.
pub fn build(pool: PgPool, config: &AppConfig) -> Result<Runtime, AppError> {
    let mailer: Arc<dyn Mailer> = Arc::new(LoggingMailer);
    let registry = subscriptions(&mailer, Arc::new(LoggingSummarizer), &config.frontend_url)?;
    let context = Context::new(
        Arc::new(PgRepository::new(pool)),
        Arc::new(registry),
        Arc::new(SystemClock),
        Arc::new(Mutex::new(SystemRng::new())),
    );
    Ok(Runtime {
        context,
        identity_provider: Arc::new(LoggingIdentityProvider),
    })
}
