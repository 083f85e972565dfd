//! Service layer
//!
//! Workload collaborators consumed by a run: the prepare step that produces
//! descriptors, the packager that publishes the executable environment, and
//! the combine step that consolidates finished outputs.
//!
//! All services are trait-based so workloads can plug in their own.

mod combine;
mod error;
mod packaging;
mod prepare;

// Re-export traits
pub use combine::ResultSink;
pub use packaging::EnvironmentPackager;
pub use prepare::DescriptorSource;

// Re-export implementations
pub use combine::JsonReportSink;
pub use error::ServiceError;
pub use packaging::{CommandPackager, NoopPackager};
pub use prepare::{JsonFileDescriptorSource, StaticDescriptorSource};
