//! Echo correlation.
//!
//! A [`PendingEchoes`] table matches inbound replies to the actions that
//! asked for them:
//!
//! 1. [`register`](PendingEchoes::register) the action before sending it, so
//!    a fast reply cannot be missed.
//! 2. Hand every inbound reply to [`resolve`](PendingEchoes::resolve) or
//!    [`resolve_value`](PendingEchoes::resolve_value).
//! 3. Await the returned [`PendingEcho`].
//!
//! Replies with no waiter are logged and dropped. Waiters that never get a
//! reply time out and remove themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use onebot_codec::{Action, Codec, CodecResult, Echo, EchoKind};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::CorrelationConfig;
use crate::error::{CorrelationError, CorrelationResult};

struct Waiter {
    kind: EchoKind,
    tx: oneshot::Sender<Echo>,
}

type Table = Arc<Mutex<HashMap<String, Waiter>>>;

/// Pending action ids and the tasks waiting on their replies.
#[derive(Clone)]
pub struct PendingEchoes {
    waiters: Table,
    timeout: Duration,
    max_pending: usize,
}

impl Default for PendingEchoes {
    fn default() -> Self {
        Self::from_config(&CorrelationConfig::default())
    }
}

impl PendingEchoes {
    /// Creates a table with the given reply timeout and no size limit.
    pub fn new(timeout: Duration) -> Self {
        Self {
            waiters: Arc::default(),
            timeout,
            max_pending: usize::MAX,
        }
    }

    /// Creates a table from the `correlation` config section.
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self {
            waiters: Arc::default(),
            timeout: config.timeout(),
            max_pending: config.max_pending,
        }
    }

    /// Registers `action` and returns the future for its reply.
    ///
    /// The action must request an echo.
    pub fn register(&self, action: &Action) -> CorrelationResult<PendingEcho> {
        let id = action.id().to_string();
        if !action.need_echo() {
            return Err(CorrelationError::EchoNotRequested { id });
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = self.waiters.lock();
            if waiters.contains_key(&id) {
                return Err(CorrelationError::Duplicate { id });
            }
            if waiters.len() >= self.max_pending {
                return Err(CorrelationError::Full {
                    limit: self.max_pending,
                });
            }
            waiters.insert(
                id.clone(),
                Waiter {
                    kind: action.echo_kind(),
                    tx,
                },
            );
        }
        debug!(id = %id, action = %action.kind(), "Registered pending echo");

        Ok(PendingEcho {
            id,
            rx,
            timeout: self.timeout,
            waiters: Arc::clone(&self.waiters),
        })
    }

    /// Returns the reply shape expected for a pending id.
    pub fn expected_kind(&self, id: &str) -> Option<EchoKind> {
        self.waiters.lock().get(id).map(|w| w.kind)
    }

    /// Delivers `echo` to the waiter registered under `id`.
    ///
    /// Returns `false` if nobody is waiting; the reply is dropped.
    pub fn resolve(&self, id: &str, echo: Echo) -> bool {
        let Some(waiter) = self.waiters.lock().remove(id) else {
            warn!(id = %id, "Received echo for unknown action (timed out?)");
            return false;
        };
        if waiter.tx.send(echo).is_err() {
            debug!(id = %id, "Echo waiter went away before delivery");
            return false;
        }
        true
    }

    /// Decodes a raw reply with the shape its pending action expects, then
    /// delivers it.
    ///
    /// Returns `Ok(false)` for replies without an `echo` key or with no
    /// waiter. Decode failures are returned and the waiter is dropped, so it
    /// observes [`CorrelationError::Disconnected`].
    pub fn resolve_value(&self, codec: &Codec, raw: Value) -> CodecResult<bool> {
        let Some(id) = echo_id(&raw) else {
            debug!("Reply carries no echo id, dropping");
            return Ok(false);
        };
        let Some(kind) = self.expected_kind(&id) else {
            warn!(id = %id, "Received echo for unknown action (timed out?)");
            return Ok(false);
        };
        match codec.decode_echo(raw, kind) {
            Ok(echo) => Ok(self.resolve(&id, echo)),
            Err(err) => {
                // A bad reply only costs its own waiter.
                if err.is_message_local() {
                    warn!(id = %id, error = %err, "Failed to decode echo, dropping waiter");
                    self.cancel(&id);
                }
                Err(err)
            }
        }
    }

    /// Drops the waiter for `id`, e.g. when sending the action failed.
    pub fn cancel(&self, id: &str) -> bool {
        self.waiters.lock().remove(id).is_some()
    }

    /// Drops every waiter. Use on disconnect.
    pub fn clear(&self) {
        let mut waiters = self.waiters.lock();
        if !waiters.is_empty() {
            debug!(
                count = waiters.len(),
                "Clearing pending echoes due to disconnect"
            );
        }
        waiters.clear();
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }
}

/// Extracts the correlation id of a raw reply. Numeric ids are accepted.
pub fn echo_id(raw: &Value) -> Option<String> {
    match raw.get("echo")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The reply to one registered action.
pub struct PendingEcho {
    id: String,
    rx: oneshot::Receiver<Echo>,
    timeout: Duration,
    waiters: Table,
}

impl PendingEcho {
    /// The action id being waited on.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the reply.
    pub async fn wait(self) -> CorrelationResult<Echo> {
        match timeout(self.timeout, self.rx).await {
            Ok(Ok(echo)) => Ok(echo),
            Ok(Err(_)) => Err(CorrelationError::Disconnected { id: self.id }),
            Err(_) => {
                self.waiters.lock().remove(&self.id);
                Err(CorrelationError::Timeout {
                    id: self.id,
                    timeout: self.timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use onebot_codec::{EchoData, MessageTarget, Segment};
    use serde_json::json;

    use super::*;

    fn codec() -> Codec {
        Codec::default()
    }

    fn send(codec: &Codec, want_echo: bool) -> Action {
        codec
            .send_message(
                [Segment::text("hi")],
                MessageTarget::Private { user_id: 1 },
                want_echo,
                None,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_delivers() {
        let codec = codec();
        let pending = PendingEchoes::new(Duration::from_secs(5));
        let action = send(&codec, true);
        let waiter = pending.register(&action).unwrap();
        assert_eq!(pending.expected_kind(action.id()), Some(EchoKind::SendMsg));

        let raw = json!({"status": "ok", "retcode": 0, "data": {"message_id": 3}, "echo": action.id()});
        assert!(pending.resolve_value(&codec, raw).unwrap());

        let echo = waiter.wait().await.unwrap();
        assert!(matches!(echo.data, EchoData::SendMsg(ref d) if d.message_id == 3));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_removes_waiter() {
        let codec = codec();
        let pending = PendingEchoes::new(Duration::from_millis(10));
        let action = send(&codec, true);
        let waiter = pending.register(&action).unwrap();

        let err = waiter.wait().await.unwrap_err();
        assert!(matches!(err, CorrelationError::Timeout { .. }));
        assert!(pending.is_empty());

        let late = codec
            .decode_echo(json!({"status": "ok", "retcode": 0, "data": null}), EchoKind::Raw)
            .unwrap();
        assert!(!pending.resolve(action.id(), late));
    }

    #[tokio::test]
    async fn test_clear_disconnects_waiters() {
        let codec = codec();
        let pending = PendingEchoes::new(Duration::from_secs(5));
        let waiter = pending.register(&send(&codec, true)).unwrap();

        pending.clear();
        let err = waiter.wait().await.unwrap_err();
        assert!(matches!(err, CorrelationError::Disconnected { .. }));
    }

    #[test]
    fn test_register_rejections() {
        let codec = codec();
        let pending = PendingEchoes::from_config(&CorrelationConfig {
            timeout_ms: 1000,
            max_pending: 1,
        });

        let err = pending.register(&send(&codec, false)).err();
        assert!(matches!(err, Some(CorrelationError::EchoNotRequested { .. })));

        let action = send(&codec, true);
        let _waiter = pending.register(&action).unwrap();
        assert!(matches!(
            pending.register(&action).err(),
            Some(CorrelationError::Duplicate { .. })
        ));
        assert!(matches!(
            pending.register(&send(&codec, true)).err(),
            Some(CorrelationError::Full { limit: 1 })
        ));
    }

    #[tokio::test]
    async fn test_bad_reply_drops_only_its_waiter() {
        let codec = codec();
        let pending = PendingEchoes::new(Duration::from_secs(5));
        let bad = send(&codec, true);
        let good = send(&codec, true);
        let bad_waiter = pending.register(&bad).unwrap();
        let _good_waiter = pending.register(&good).unwrap();

        let raw = json!({"status": "ok", "retcode": 0, "data": {"message_id": []}, "echo": bad.id()});
        let err = pending.resolve_value(&codec, raw).unwrap_err();
        assert!(err.is_message_local());

        let err = bad_waiter.wait().await.unwrap_err();
        assert!(matches!(err, CorrelationError::Disconnected { .. }));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.expected_kind(good.id()), Some(EchoKind::SendMsg));
    }

    #[test]
    fn test_unmatched_replies_are_dropped() {
        let codec = codec();
        let pending = PendingEchoes::default();
        assert!(!pending.resolve_value(&codec, json!({"status": "ok", "retcode": 0})).unwrap());
        assert!(
            !pending
                .resolve_value(&codec, json!({"status": "ok", "retcode": 0, "echo": 42}))
                .unwrap()
        );
        assert_eq!(echo_id(&json!({"echo": 42})), Some("42".to_string()));
    }
}
