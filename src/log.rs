//! Structured event logging seam used by the startup dispatcher.

/// Key/value pairs attached to a log event.
pub type Fields<'a> = &'a [(&'a str, String)];

pub trait EventLog: Send + Sync {
    fn info(&self, msg: &str, fields: Fields<'_>);
    fn error(&self, msg: &str, fields: Fields<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

/// Renders the pairs as a JSON object so values keep their boundaries.
fn render(fields: Fields<'_>) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| ((*k).to_string(), serde_json::Value::String(v.clone())))
        .collect();
    serde_json::Value::Object(map)
}

impl EventLog for TracingLog {
    fn info(&self, msg: &str, fields: Fields<'_>) {
        if fields.is_empty() {
            tracing::info!("{msg}");
        } else {
            tracing::info!(fields = %render(fields), "{msg}");
        }
    }

    fn error(&self, msg: &str, fields: Fields<'_>) {
        if fields.is_empty() {
            tracing::error!("{msg}");
        } else {
            tracing::error!(fields = %render(fields), "{msg}");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{EventLog, Fields};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Event {
        pub level: &'static str,
        pub msg: String,
        pub fields: Vec<(String, String)>,
    }

    impl Event {
        pub fn field(&self, key: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Records events for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingLog {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingLog {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        pub fn find(&self, msg: &str) -> Option<Event> {
            self.events().into_iter().find(|e| e.msg == msg)
        }

        fn push(&self, level: &'static str, msg: &str, fields: Fields<'_>) {
            if let Ok(mut events) = self.events.lock() {
                events.push(Event {
                    level,
                    msg: msg.to_string(),
                    fields: fields
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                });
            }
        }
    }

    impl EventLog for RecordingLog {
        fn info(&self, msg: &str, fields: Fields<'_>) {
            self.push("info", msg, fields);
        }

        fn error(&self, msg: &str, fields: Fields<'_>) {
            self.push("error", msg, fields);
        }
    }
}
