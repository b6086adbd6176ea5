//! Event store database schema.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Embedded migrations from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// The append-only event log.
pub const EVENTS_TABLE: &str = "events";

/// Every snapshot table the migrations create.
pub const SNAPSHOT_TABLES: &[&str] = &[
    "organizations",
    "users",
    "employees",
    "teams",
    "employee_roles",
    "feedbacks",
    "cycles",
];

/// Applies every pending migration.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history
/// diverges from the embedded one.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Returns `true` when `name` is safe to interpolate as a table name:
/// lowercase ASCII letters, digits and underscores, not starting with a
/// digit.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
