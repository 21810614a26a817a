//! # Configuration
//!
//! Process-wide master switches and declarative policy documents.
//!
//! A policy document bundles [`GlobalOptions`] with per-method
//! [`MethodPolicy`] entries keyed by method name, and can be loaded from a
//! TOML/YAML/JSON file with environment overrides through [`ConfigLoader`]:
//!
//! ```toml
//! [options]
//! enable_retries = true
//!
//! [methods.find_order]
//! retry = { attempts = 3, delay_ms = 100 }
//! cache = { ttl_seconds = 60 }
//! ```

pub mod loader;

pub use loader::ConfigLoader;

use crate::policy::MethodPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Master switches. A stage runs only if its metadata asks for it and the
/// matching switch is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalOptions {
    #[serde(default = "enabled")]
    pub enable_retries: bool,

    #[serde(default = "enabled")]
    pub enable_validation: bool,

    #[serde(default = "enabled")]
    pub enable_timing: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            enable_retries: true,
            enable_validation: true,
            enable_timing: true,
        }
    }
}

/// Options plus per-method policies keyed by method name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub options: GlobalOptions,

    #[serde(default)]
    pub methods: BTreeMap<String, MethodPolicy>,
}

impl PolicyDocument {
    /// Check every method policy, returning the failures by method name.
    pub fn check(&self) -> Vec<(String, String)> {
        self.methods
            .iter()
            .filter_map(|(name, policy)| policy.check().err().map(|e| (name.clone(), e)))
            .collect()
    }
}

fn enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RetryPolicy;

    #[test]
    fn test_global_options_default_on() {
        let options = GlobalOptions::default();
        assert!(options.enable_retries && options.enable_validation && options.enable_timing);

        let parsed: GlobalOptions = serde_json::from_str(r#"{ "enable_timing": false }"#).unwrap();
        assert!(parsed.enable_retries && parsed.enable_validation);
        assert!(!parsed.enable_timing);
    }

    #[test]
    fn test_document_check_reports_bad_methods() {
        let mut document = PolicyDocument::default();
        document
            .methods
            .insert("good".into(), MethodPolicy::new().retry(RetryPolicy::new(2)));
        document
            .methods
            .insert("bad".into(), MethodPolicy::new().retry(RetryPolicy::new(0)));

        let failures = document.check();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "bad");
    }
}
