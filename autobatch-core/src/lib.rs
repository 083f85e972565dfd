//! Autobatch Core
//!
//! Core types and abstractions for the autobatch job orchestrator.
//!
//! This crate contains:
//! - Domain types: descriptors, job handles and statuses, run policy, run reports
//! - DTOs: wire payloads exchanged with the batch-compute gateway

pub mod domain;
pub mod dto;
