use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::Serialize;

/// Ring-buffer capacities for the report payload. Older entries are evicted
/// first.
pub const MAX_LOG_ENTRIES: usize = 50;
pub const MAX_NETWORK_ENTRIES: usize = 20;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NetworkEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// Holds the recent-activity ring buffers attached to every report.
/// Consumed only at submit time; the annotation engine never reads it.
#[derive(Debug, Default)]
pub struct ActivityRecorder {
    logs: Mutex<VecDeque<LogEntry>>,
    requests: Mutex<VecDeque<NetworkEntry>>,
}

impl ActivityRecorder {
    pub fn record_log(&self, level: Level, message: String) {
        let entry = LogEntry {
            level: level.to_string().to_lowercase(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut logs = self.logs.lock().expect("log buffer poisoned");
        logs.push_back(entry);
        while logs.len() > MAX_LOG_ENTRIES {
            logs.pop_front();
        }
    }

    pub fn record_request(&self, method: &str, url: &str, status: u16, duration_ms: u64) {
        let entry = NetworkEntry {
            method: method.to_string(),
            url: url.to_string(),
            status,
            duration_ms,
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut requests = self.requests.lock().expect("request buffer poisoned");
        requests.push_back(entry);
        while requests.len() > MAX_NETWORK_ENTRIES {
            requests.pop_front();
        }
    }

    /// Oldest first, like the order events happened.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.logs
            .lock()
            .expect("log buffer poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn network_entries(&self) -> Vec<NetworkEntry> {
        self.requests
            .lock()
            .expect("request buffer poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

/// `log` facade sink that tees every info-or-louder record into the
/// recorder while still printing through env_logger's filter.
struct RecorderLogger {
    inner: env_logger::Logger,
    recorder: Arc<ActivityRecorder>,
}

impl Log for RecorderLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Info || self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if record.level() <= Level::Info {
            self.recorder
                .record_log(record.level(), record.args().to_string());
        }
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logging(recorder: Arc<ActivityRecorder>) -> Result<(), SetLoggerError> {
    let inner = env_logger::Builder::from_default_env().build();
    let max_level = inner.filter().max(LevelFilter::Info);
    log::set_boxed_logger(Box::new(RecorderLogger { inner, recorder }))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::{ActivityRecorder, MAX_LOG_ENTRIES, MAX_NETWORK_ENTRIES};

    #[test]
    fn log_buffer_evicts_oldest_beyond_capacity() {
        let recorder = ActivityRecorder::default();
        for i in 0..(MAX_LOG_ENTRIES + 10) {
            recorder.record_log(Level::Info, format!("message {i}"));
        }

        let entries = recorder.log_entries();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(entries[0].message, "message 10");
        assert_eq!(entries.last().unwrap().message, format!("message {}", MAX_LOG_ENTRIES + 9));
    }

    #[test]
    fn network_buffer_keeps_insertion_order() {
        let recorder = ActivityRecorder::default();
        for i in 0..(MAX_NETWORK_ENTRIES + 5) {
            recorder.record_request("POST", &format!("https://api.test/{i}"), 200, 12);
        }

        let entries = recorder.network_entries();
        assert_eq!(entries.len(), MAX_NETWORK_ENTRIES);
        assert_eq!(entries[0].url, "https://api.test/5");
    }

    #[test]
    fn entries_serialize_for_the_payload() {
        let recorder = ActivityRecorder::default();
        recorder.record_log(Level::Warn, "capture failed".into());

        let json = serde_json::to_string(&recorder.log_entries()).expect("serialize");
        assert!(json.contains("\"level\":\"warn\""));
        assert!(json.contains("capture failed"));
    }
}
