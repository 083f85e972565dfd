//! Job descriptor domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Prefix applied to every descriptor key when it becomes a job environment variable
pub const ENV_PREFIX: &str = "BATCHPAR_";

/// One unit of batch work, as produced by a workload's prepare step
///
/// The two reserved fields are lifted out of the parameter map; every other
/// key is carried verbatim and never interpreted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// The result already exists; the descriptor must not be submitted
    #[serde(default)]
    pub done: bool,

    /// Caller-defined pointer to where this job's output is written
    pub outinfo: String,

    /// Remaining workload parameters
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

impl JobDescriptor {
    /// Creates a pending descriptor with no extra parameters
    pub fn new(outinfo: impl Into<String>) -> Self {
        Self {
            done: false,
            outinfo: outinfo.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a workload parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Marks the descriptor as already completed
    pub fn mark_done(mut self) -> Self {
        self.done = true;
        self
    }

    /// Builds the job environment for this descriptor
    ///
    /// Every key, including `done` and `outinfo`, is prefixed with
    /// [`ENV_PREFIX`] so the executable unit can recover it. String values
    /// are passed raw; everything else uses its JSON rendering.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = self
            .params
            .iter()
            .map(|(key, value)| (prefixed(key), render_value(value)))
            .collect();

        env.insert(prefixed("done"), self.done.to_string());
        env.insert(prefixed("outinfo"), self.outinfo.clone());
        env
    }
}

fn prefixed(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_prefixes_every_key() {
        let descriptor = JobDescriptor::new("s3://bucket/out/GB.json")
            .with_param("iso2", "GB")
            .with_param("page", 3);

        let env = descriptor.environment();

        assert_eq!(env.get("BATCHPAR_iso2"), Some(&"GB".to_string()));
        assert_eq!(env.get("BATCHPAR_page"), Some(&"3".to_string()));
        assert_eq!(env.get("BATCHPAR_done"), Some(&"false".to_string()));
        assert_eq!(
            env.get("BATCHPAR_outinfo"),
            Some(&"s3://bucket/out/GB.json".to_string())
        );
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn test_deserialize_lifts_reserved_fields() {
        let json = r#"{"done": true, "outinfo": "db://groups", "category": 34}"#;
        let descriptor: JobDescriptor = serde_json::from_str(json).unwrap();

        assert!(descriptor.done);
        assert_eq!(descriptor.outinfo, "db://groups");
        assert_eq!(descriptor.params.len(), 1);
        assert_eq!(descriptor.params.get("category"), Some(&Value::from(34)));
    }

    #[test]
    fn test_done_defaults_to_false() {
        let descriptor: JobDescriptor = serde_json::from_str(r#"{"outinfo": "x"}"#).unwrap();
        assert!(!descriptor.done);
    }
}
