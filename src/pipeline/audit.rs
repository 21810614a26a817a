//! Audit trail for one invocation.
//!
//! Input is logged once before the pipeline runs. When the pipeline finishes,
//! the caller reports the outcome through exactly one of
//! [`AuditTrail::output`] or [`AuditTrail::error`].

use crate::logging::{LogEvent, LogRecord, LogSink};
use crate::models::Arguments;
use crate::policy::AuditPolicy;
use serde_json::Value;
use uuid::Uuid;

pub struct AuditTrail<'a> {
    sink: &'a dyn LogSink,
    policy: Option<&'a AuditPolicy>,
    method: &'a str,
    invocation_id: Uuid,
}

impl<'a> AuditTrail<'a> {
    pub fn new(
        sink: &'a dyn LogSink,
        policy: Option<&'a AuditPolicy>,
        method: &'a str,
        invocation_id: Uuid,
    ) -> Self {
        Self {
            sink,
            policy,
            method,
            invocation_id,
        }
    }

    fn record(&self, event: LogEvent, policy: &AuditPolicy) -> LogRecord {
        LogRecord::new(event, self.method, self.invocation_id).context(policy.context.as_deref())
    }

    pub fn input(&self, arguments: &Arguments) {
        if let Some(policy) = self.policy.filter(|p| p.log_input) {
            self.sink.info(
                &self
                    .record(LogEvent::AuditInput, policy)
                    .field("arguments", arguments.describe()),
            );
        }
    }

    pub fn output(&self, value: &Value) {
        if let Some(policy) = self.policy.filter(|p| p.log_output) {
            self.sink
                .info(&self.record(LogEvent::AuditOutput, policy).field("result", value));
        }
    }

    pub fn error(&self, error: &(dyn std::error::Error + 'static)) {
        if let Some(policy) = self.policy.filter(|p| p.log_error) {
            self.sink
                .error(error, &self.record(LogEvent::AuditError, policy).field("error", error));
        }
    }
}
