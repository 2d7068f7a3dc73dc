//! Display sinks: where the server hands off parsed messages
//!
//! The server never renders anything itself. It calls a [`DisplaySink`] with
//! forwarded messages and listener status changes. [`JsonLinesSink`] writes
//! them to stdout as JSON Lines so any front end can consume them:
//!
//! ```json
//! {"type":"message","kind":"ANSWER","payload":"➤ Paris","timestamp":"..."}
//! {"type":"connection_status","alive":true,"timestamp":"..."}
//! ```

use std::io::{self, Write};

use parking_lot::Mutex;
use serde::Serialize;

use super::protocol::MessageKind;

/// Receiver of display notifications
pub trait DisplaySink: Send + Sync {
    /// A CLEAR, QUESTION, or ANSWER arrived. PING is never forwarded.
    fn on_message(&self, kind: MessageKind, payload: &str);

    /// The listener came up (`true`) or went down (`false`)
    fn on_connection_status(&self, alive: bool);
}

/// Wrapper for events with type field
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DisplayEvent<'a> {
    Message {
        kind: MessageKind,
        payload: &'a str,
        timestamp: String,
    },
    ConnectionStatus {
        alive: bool,
        timestamp: String,
    },
}

/// Writes one JSON object per notification to a writer (stdout by default)
pub struct JsonLinesSink<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, event: &DisplayEvent<'_>) {
        if let Ok(json) = serde_json::to_string(event) {
            let mut out = self.out.lock();
            // Ignore write errors (consumer may have closed)
            let _ = writeln!(out, "{}", json);
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> DisplaySink for JsonLinesSink<W> {
    fn on_message(&self, kind: MessageKind, payload: &str) {
        self.emit(&DisplayEvent::Message {
            kind,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    fn on_connection_status(&self, alive: bool) {
        if alive {
            tracing::info!("Display server listening");
        } else {
            tracing::warn!("Display server down");
        }
        self.emit(&DisplayEvent::ConnectionStatus {
            alive,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(sink: JsonLinesSink<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(sink.into_inner())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_message_event_format() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.on_message(MessageKind::Answer, "➤ Paris");
        let events = lines(sink);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "message");
        assert_eq!(events[0]["kind"], "ANSWER");
        assert_eq!(events[0]["payload"], "➤ Paris");
        assert!(events[0]["timestamp"].is_string());
    }

    #[test]
    fn test_status_event_format() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.on_connection_status(true);
        sink.on_connection_status(false);
        let events = lines(sink);
        assert_eq!(events[0]["type"], "connection_status");
        assert_eq!(events[0]["alive"], true);
        assert_eq!(events[1]["alive"], false);
    }
}
