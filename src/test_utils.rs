//! # Test Utilities
//!
//! Helpers shared by unit and integration tests.

use crate::logging::{LogEvent, LogRecord, LogSink};
use parking_lot::Mutex;

/// Log sink that keeps every record in memory for assertions.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    records: Mutex<Vec<LogRecord>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn records_for(&self, event: LogEvent) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.event == event)
            .cloned()
            .collect()
    }

    pub fn count(&self, event: LogEvent) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.event == event)
            .count()
    }

    /// Messages of the errors passed to [`LogSink::error`], in order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
        self.errors.lock().clear();
    }
}

impl LogSink for RecordingLogSink {
    fn info(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }

    fn warn(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }

    fn error(&self, error: &(dyn std::error::Error + 'static), record: &LogRecord) {
        self.errors.lock().push(error.to_string());
        self.records.lock().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_recording_sink_filters_by_event() {
        let sink = RecordingLogSink::new();
        let id = Uuid::new_v4();
        sink.info(&LogRecord::new(LogEvent::AuditInput, "Svc.op()", id));
        sink.warn(&LogRecord::new(LogEvent::RetryAttempt, "Svc.op()", id));
        sink.warn(&LogRecord::new(LogEvent::RetryAttempt, "Svc.op()", id));

        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.count(LogEvent::RetryAttempt), 2);
        assert_eq!(sink.records_for(LogEvent::AuditInput).len(), 1);

        sink.clear();
        assert!(sink.records().is_empty());
    }
}
