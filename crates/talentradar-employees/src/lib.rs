//! Talent Radar Employees bounded context.
//!
//! Responsible for the people an organization reviews, the teams they sit
//! in and the role ladder. Employees are linked to sign-in users by email.

pub mod application;
pub mod domain;
