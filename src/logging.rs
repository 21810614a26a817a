//! # Structured Logging Module
//!
//! Stage output (audit, timing, retry warnings) goes through a [`LogSink`]
//! so that the concrete sink stays pluggable; [`TracingLogSink`] forwards
//! every record to `tracing` with structured fields. Internal diagnostics
//! (breaker transitions, cache hits) use `tracing` directly.

use crate::config::ConfigLoader;
use crate::constants::env as env_names;
use chrono::Utc;
use std::fmt;
use std::sync::OnceLock;
use tracing_subscriber::{fmt as subscriber_fmt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// What a record reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEvent {
    AuditInput,
    AuditOutput,
    AuditError,
    Elapsed,
    RetryAttempt,
    FallbackInvoked,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogEvent::AuditInput => "audit_input",
            LogEvent::AuditOutput => "audit_output",
            LogEvent::AuditError => "audit_error",
            LogEvent::Elapsed => "elapsed",
            LogEvent::RetryAttempt => "retry_attempt",
            LogEvent::FallbackInvoked => "fallback_invoked",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log record emitted by a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub event: LogEvent,
    pub method: String,
    pub context: Option<String>,
    pub invocation_id: Uuid,
    pub timestamp: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogRecord {
    pub fn new(event: LogEvent, method: impl Into<String>, invocation_id: Uuid) -> Self {
        Self {
            event,
            method: method.into(),
            context: None,
            invocation_id,
            timestamp: Utc::now().to_rfc3339(),
            fields: Vec::new(),
        }
    }

    pub fn context(mut self, context: Option<&str>) -> Self {
        self.context = context.map(str::to_string);
        self
    }

    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn rendered_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// External logger sink.
pub trait LogSink: Send + Sync {
    fn info(&self, record: &LogRecord);
    fn warn(&self, record: &LogRecord);
    fn error(&self, error: &(dyn std::error::Error + 'static), record: &LogRecord);
}

/// Default sink: forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, record: &LogRecord) {
        tracing::info!(
            event = %record.event,
            method = %record.method,
            context = record.context.as_deref(),
            invocation_id = %record.invocation_id,
            timestamp = %record.timestamp,
            fields = %record.rendered_fields(),
            "📋 INTERCEPTOR"
        );
    }

    fn warn(&self, record: &LogRecord) {
        tracing::warn!(
            event = %record.event,
            method = %record.method,
            context = record.context.as_deref(),
            invocation_id = %record.invocation_id,
            timestamp = %record.timestamp,
            fields = %record.rendered_fields(),
            "⚠️ INTERCEPTOR"
        );
    }

    fn error(&self, error: &(dyn std::error::Error + 'static), record: &LogRecord) {
        tracing::error!(
            event = %record.event,
            method = %record.method,
            context = record.context.as_deref(),
            invocation_id = %record.invocation_id,
            timestamp = %record.timestamp,
            error = %error,
            fields = %record.rendered_fields(),
            "❌ INTERCEPTOR"
        );
    }
}

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; an already-installed global subscriber is
/// left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigLoader::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(env_names::LOG_FORMAT)
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json {
            subscriber_fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .finish()
                .try_init()
        } else {
            subscriber_fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .finish()
                .try_init()
        };

        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
