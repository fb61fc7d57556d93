//! Collaborators the codec consumes from its host.
//!
//! The codec never generates identifiers or looks up the "current" event on
//! its own. Ids come from an [`IdGenerator`]; the event an action responds to
//! is passed in explicitly as an [`EventRef`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use uuid::Uuid;

use crate::model::event::PostType;

/// Source of process-unique identifiers for actions and echoes.
pub trait IdGenerator: Send + Sync {
    /// Returns an id never returned before by this generator.
    fn next_id(&self) -> String;
}

/// Generates random UUID v4 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Generates `<prefix><n>` with a monotonically increasing counter.
///
/// Useful where ids must be predictable, e.g. in logs and tests.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `<prefix>1`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}

/// Causal back-reference from an action to the event that triggered it.
///
/// Used for tracing only; it never appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRef {
    /// Event timestamp.
    pub time: i64,
    /// Reporting bot account.
    pub self_id: i64,
    /// Top-level event kind.
    pub post_type: PostType,
    /// Message id, for message events.
    pub message_id: Option<i64>,
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.post_type.as_str(), self.self_id, self.time)?;
        if let Some(message_id) = self.message_id {
            write!(f, "#{message_id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| UuidIdGenerator.next_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::new("req-");
        assert_eq!(ids.next_id(), "req-1");
        assert_eq!(ids.next_id(), "req-2");
    }

    #[test]
    fn test_event_ref_display() {
        let event_ref = EventRef {
            time: 10,
            self_id: 2,
            post_type: PostType::Message,
            message_id: Some(5),
        };
        assert_eq!(event_ref.to_string(), "message@2/10#5");
    }
}
