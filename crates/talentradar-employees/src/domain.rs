//! Domain model for the Employees context.

pub mod aggregates;
pub mod commands;
pub mod events;
