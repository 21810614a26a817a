//! Configuration Loader
//!
//! Layers a policy document file under environment overrides using the
//! `config` crate, and detects the running environment.

use super::PolicyDocument;
use crate::constants::env as env_names;
use crate::error::{ConfigResult, ConfigurationError};
use std::path::Path;
use tracing::{debug, info};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a policy document from a file (format inferred from the
    /// extension), then apply `INTERCEPTOR__...` environment overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<PolicyDocument> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::Load(format!(
                "policy file not found: {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Loading policy document");

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(Self::environment_source())
            .build()?;

        let document: PolicyDocument = settings.try_deserialize()?;
        Self::finish(document, &path.display().to_string())
    }

    /// Load a policy document from environment overrides alone.
    pub fn from_env() -> ConfigResult<PolicyDocument> {
        let settings = config::Config::builder()
            .add_source(Self::environment_source())
            .build()?;

        let document: PolicyDocument = settings.try_deserialize()?;
        Self::finish(document, "environment")
    }

    /// Current environment name (`INTERCEPTOR_ENV`, then `APP_ENV`).
    pub fn detect_environment() -> String {
        std::env::var(env_names::ENVIRONMENT)
            .or_else(|_| std::env::var(env_names::FALLBACK_ENVIRONMENT))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn environment_source() -> config::Environment {
        config::Environment::with_prefix(env_names::CONFIG_PREFIX)
            .separator(env_names::CONFIG_SEPARATOR)
            .try_parsing(true)
    }

    fn finish(document: PolicyDocument, source: &str) -> ConfigResult<PolicyDocument> {
        if let Some((method, reason)) = document.check().into_iter().next() {
            return Err(ConfigurationError::InvalidPolicy { method, reason });
        }

        info!(
            source = source,
            methods = document.methods.len(),
            enable_retries = document.options.enable_retries,
            enable_validation = document.options.enable_validation,
            enable_timing = document.options.enable_timing,
            "Policy document loaded"
        );

        Ok(document)
    }
}
