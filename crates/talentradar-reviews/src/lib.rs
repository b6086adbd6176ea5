//! Talent Radar Reviews bounded context.
//!
//! Responsible for collecting feedback about employees from peers,
//! summarizing it once submitted, and grouping review work into cycles.

pub mod application;
pub mod collaborators;
pub mod domain;
