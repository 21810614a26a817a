//! Error types for the interception pipeline.
//!
//! Failures produced by the decorated implementation travel through every
//! stage untouched and reach the caller as [`InterceptError::Invocation`].
//! Everything else in this module is raised by the pipeline itself.

use thiserror::Error;

/// Classifies an implementation error for retry filtering.
///
/// `kind()` is matched against the exception kinds listed in a retry policy.
pub trait Classify: std::error::Error + Send + Sync + 'static {
    fn kind(&self) -> &str;
}

/// An argument violated a declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Positional argument could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Argument {index} is missing")]
    Missing { index: usize },

    #[error("Argument {index} could not be decoded: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Argument could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure surfacing from the protected core of the pipeline
/// (retry + circuit breaker), as seen by the fallback stage.
#[derive(Debug, Error)]
pub enum Failure<E: std::error::Error + 'static> {
    /// The decorated implementation failed.
    #[error(transparent)]
    Invocation(E),

    /// The circuit breaker rejected the call.
    #[error("Circuit breaker is open for {method}")]
    CircuitOpen { method: String },
}

/// Errors returned to the caller of an intercepted operation.
#[derive(Debug, Error)]
pub enum InterceptError<E: std::error::Error + 'static> {
    /// Argument validation failed before anything ran.
    #[error(transparent)]
    Validation(ValidationError),

    /// Call rejected while the breaker is open.
    #[error("Circuit breaker is open for {method}")]
    CircuitOpen { method: String },

    /// The decorated implementation's own error, exactly as it was raised.
    #[error(transparent)]
    Invocation(E),

    #[error("Method {method} is not registered on this interceptor")]
    UnknownMethod { method: String },

    #[error("Method {method} is declared {declared} but was invoked as {requested}")]
    ShapeMismatch {
        method: String,
        declared: &'static str,
        requested: &'static str,
    },

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    /// The untyped result did not match the caller's expected payload type.
    #[error("Result of {method} could not be reconstructed: {reason}")]
    Reconstruction { method: String, reason: String },
}

impl<E: std::error::Error + 'static> InterceptError<E> {
    /// Borrow the implementation error, if this is one.
    pub fn invocation(&self) -> Option<&E> {
        match self {
            InterceptError::Invocation(error) => Some(error),
            _ => None,
        }
    }

    /// Take the implementation error back out, if this is one.
    pub fn into_invocation(self) -> Result<E, Self> {
        match self {
            InterceptError::Invocation(error) => Ok(error),
            other => Err(other),
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, InterceptError::CircuitOpen { .. })
    }
}

impl<E: std::error::Error + 'static> From<Failure<E>> for InterceptError<E> {
    fn from(failure: Failure<E>) -> Self {
        match failure {
            Failure::Invocation(error) => InterceptError::Invocation(error),
            Failure::CircuitOpen { method } => InterceptError::CircuitOpen { method },
        }
    }
}

/// Configuration errors, raised while an interceptor is being built or a
/// policy document is being loaded.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid policy for {method}: {reason}")]
    InvalidPolicy { method: String, reason: String },

    #[error("Fallback '{target}' for {method} does not resolve to a compatible operation")]
    FallbackResolution { method: String, target: String },

    #[error("Policy targets unknown method '{method}'")]
    UnknownMethod { method: String },

    #[error("Method {method} is declared more than once")]
    DuplicateMethod { method: String },

    #[error("Circuit breaker for {method} is already registered with a different policy")]
    BreakerConflict { method: String },

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        ConfigurationError::Load(error.to_string())
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom: {0}")]
    struct Boom(String);

    #[test]
    fn test_invocation_error_keeps_original_message() {
        let error: InterceptError<Boom> = InterceptError::Invocation(Boom("disk".into()));
        assert_eq!(error.to_string(), "boom: disk");
        assert_eq!(error.into_invocation().unwrap(), Boom("disk".into()));
    }

    #[test]
    fn test_failure_converts_into_intercept_error() {
        let open: InterceptError<Boom> = Failure::CircuitOpen {
            method: "Svc.get()".into(),
        }
        .into();
        assert!(open.is_circuit_open());
        assert!(open.invocation().is_none());

        let failed: InterceptError<Boom> = Failure::Invocation(Boom("x".into())).into();
        assert_eq!(failed.invocation(), Some(&Boom("x".into())));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::new("name", "The name field is required.");
        assert_eq!(
            error.to_string(),
            "Validation failed for 'name': The name field is required."
        );
    }
}
