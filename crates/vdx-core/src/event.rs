//! # Structured Event Journal
//!
//! Every mutating operation in the stack emits a [`LogRecord`] — an event
//! name plus named arguments — into its component's [`EventJournal`] and
//! returns the record to the caller. The journal is the sole notification
//! channel for completed side effects: a record exists if and only if the
//! operation committed.
//!
//! Consumers retrieve fields by name:
//!
//! ```
//! use vdx_core::EventJournal;
//! use serde_json::json;
//!
//! let journal = EventJournal::new();
//! let record = journal.emit("LogAddIssuer", json!({ "issuer": "0xabc", "status": 0 }));
//! assert_eq!(record.arg("status").and_then(|v| v.as_u64()), Some(0));
//! assert_eq!(journal.last_named("LogAddIssuer").map(|r| r.event), Some("LogAddIssuer".into()));
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single emitted event: name, named arguments, and emission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Event name (e.g. `"LogAddIssuer"`).
    pub event: String,
    /// Named arguments.
    pub args: Map<String, Value>,
    /// When the event was emitted (UTC).
    pub recorded_at: DateTime<Utc>,
}

impl LogRecord {
    /// Retrieve a named argument, if present.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Retrieve a named argument as a string slice.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }

    /// Retrieve a named argument as an unsigned integer.
    pub fn arg_u64(&self, name: &str) -> Option<u64> {
        self.args.get(name).and_then(Value::as_u64)
    }
}

/// Append-only journal of emitted events.
///
/// Thread-safe; shared by reference from the owning component. Records are
/// never removed or reordered, so a journal read is a faithful audit trail
/// of everything the component committed.
#[derive(Debug, Default)]
pub struct EventJournal {
    records: RwLock<Vec<LogRecord>>,
}

impl EventJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event, appending it to the journal and returning the record.
    ///
    /// Non-object `args` values are wrapped under a `"value"` key so every
    /// record exposes the same named-argument surface.
    pub fn emit(&self, event: &str, args: Value) -> LogRecord {
        let args = match args {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        let record = LogRecord {
            event: event.to_string(),
            args,
            recorded_at: Utc::now(),
        };
        self.records.write().push(record.clone());
        record
    }

    /// Number of records emitted so far.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of every record, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<LogRecord> {
        self.records.read().last().cloned()
    }

    /// The most recent record with the given event name.
    pub fn last_named(&self, event: &str) -> Option<LogRecord> {
        self.records
            .read()
            .iter()
            .rev()
            .find(|r| r.event == event)
            .cloned()
    }

    /// All records with the given event name, in emission order.
    pub fn records_named(&self, event: &str) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emit_appends_and_returns_record() {
        let journal = EventJournal::new();
        let record = journal.emit("Transfer", json!({ "from": "0xaa", "amount": 100 }));
        assert_eq!(record.event, "Transfer");
        assert_eq!(record.arg_str("from"), Some("0xaa"));
        assert_eq!(record.arg_u64("amount"), Some(100));
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn last_named_finds_most_recent() {
        let journal = EventJournal::new();
        journal.emit("Transfer", json!({ "amount": 1 }));
        journal.emit("Approval", json!({ "amount": 2 }));
        journal.emit("Transfer", json!({ "amount": 3 }));

        let last = journal.last_named("Transfer").unwrap();
        assert_eq!(last.arg_u64("amount"), Some(3));
        assert!(journal.last_named("Burn").is_none());
    }

    #[test]
    fn records_named_preserves_order() {
        let journal = EventJournal::new();
        journal.emit("Tick", json!({ "n": 1 }));
        journal.emit("Tock", json!({ "n": 2 }));
        journal.emit("Tick", json!({ "n": 3 }));

        let ticks = journal.records_named("Tick");
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].arg_u64("n"), Some(1));
        assert_eq!(ticks[1].arg_u64("n"), Some(3));
    }

    #[test]
    fn non_object_args_wrapped() {
        let journal = EventJournal::new();
        let record = journal.emit("Raw", json!(42));
        assert_eq!(record.arg_u64("value"), Some(42));
    }

    #[test]
    fn missing_arg_is_none() {
        let journal = EventJournal::new();
        let record = journal.emit("Transfer", json!({ "from": "0xaa" }));
        assert!(record.arg("to").is_none());
        assert!(record.arg_u64("from").is_none());
    }

    #[test]
    fn record_serde_roundtrip() {
        let journal = EventJournal::new();
        let record = journal.emit("Transfer", json!({ "amount": 7 }));
        let json_str = serde_json::to_string(&record).unwrap();
        let back: LogRecord = serde_json::from_str(&json_str).unwrap();
        assert_eq!(back.event, record.event);
        assert_eq!(back.arg_u64("amount"), Some(7));
    }
}
