//! Application services for the Reviews context.

pub mod command_handlers;
pub mod query_handlers;
pub mod subscriptions;
