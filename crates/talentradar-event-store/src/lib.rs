//! Talent Radar Event Store: PostgreSQL adapter for the runtime's
//! `Repository` contract.
//!
//! Events go to the shared append-only `events` table; each aggregate type
//! keeps its current state as a JSONB document in its own snapshot table.

pub mod pg_repository;
pub mod schema;
