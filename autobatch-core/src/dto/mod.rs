//! Data Transfer Objects for the batch gateway
//!
//! Payloads sent to and received from the batch-compute service. These are
//! kept apart from the domain types so the wire format can follow the
//! service's conventions (camelCase keys, raw status strings).

pub mod job;
