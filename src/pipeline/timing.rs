//! Execution timing.

use crate::logging::{LogEvent, LogRecord, LogSink};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Monotonic clock around the cache lookup and the protected call.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the clock and emit an `elapsed` record.
    pub fn stop(
        self,
        sink: &dyn LogSink,
        method: &str,
        context: Option<&str>,
        invocation_id: Uuid,
    ) -> Duration {
        let elapsed = self.elapsed();
        sink.info(
            &LogRecord::new(LogEvent::Elapsed, method, invocation_id)
                .context(context)
                .field("elapsed_ms", elapsed.as_millis()),
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingLogSink;

    #[test]
    fn test_stop_emits_elapsed_record() {
        let sink = RecordingLogSink::new();
        let stopwatch = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(5));

        let elapsed = stopwatch.stop(&sink, "Svc.op()", Some("orders"), Uuid::new_v4());
        assert!(elapsed >= Duration::from_millis(5));

        let records = sink.records_for(LogEvent::Elapsed);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "Svc.op()");
        assert_eq!(records[0].context.as_deref(), Some("orders"));
        let millis: u128 = records[0].get("elapsed_ms").unwrap().parse().unwrap();
        assert!(millis >= 5);
    }
}
