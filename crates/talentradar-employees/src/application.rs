//! Application services for the Employees context.

pub mod command_handlers;
pub mod query_handlers;
pub mod subscriptions;
