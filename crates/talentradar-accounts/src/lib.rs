//! Talent Radar Accounts bounded context.
//!
//! Responsible for organizations (tenants) and their users, including
//! provisioning them in the external identity provider and sending invite
//! emails.

pub mod application;
pub mod collaborators;
pub mod domain;
