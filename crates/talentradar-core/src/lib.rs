//! Talent Radar Core: the event-sourced runtime every domain is built on.
//!
//! An aggregate's authoritative history is an append-only log of events.
//! Commands validate against the current state and record new events,
//! [`executor::call`] persists the snapshot and the events in one
//! transaction, and the [`subscription::SubscriptionRegistry`] fans the
//! committed events out to side-effect handlers.
//!
//! This crate contains no storage code; adapters implement
//! [`repository::Repository`].

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod executor;
pub mod identity;
pub mod repository;
pub mod rng;
pub mod subscription;
pub mod tasks;
