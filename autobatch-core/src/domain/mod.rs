//! Core domain types
//!
//! This module contains the structures shared between the backend client
//! (which speaks to the compute service) and the runner (which drives a batch).

pub mod descriptor;
pub mod job;
pub mod policy;
pub mod report;
