//! Domain model for the Reviews context.

pub mod aggregates;
pub mod commands;
pub mod events;
