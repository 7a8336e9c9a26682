//! Service-worker style events
//!
//! Install and activate are *extendable*: the handler hands the event a
//! future through [`ExtendableEvent::wait_until`], and whoever fired the
//! event learns the outcome through the paired [`EventCompletion`].
//! Messages optionally carry a reply port.

use std::future::Future;

use lantern_domain::{ControlMessage, ControlReply, LanternError, Result};
use tokio::sync::oneshot;
use tracing::debug;

/// Event whose completion is deferred until a future settles.
#[derive(Debug)]
pub struct ExtendableEvent {
    name: &'static str,
    completion: oneshot::Sender<Result<()>>,
}

/// Receiving half of an [`ExtendableEvent`].
#[derive(Debug)]
pub struct EventCompletion {
    name: &'static str,
    receiver: oneshot::Receiver<Result<()>>,
}

impl ExtendableEvent {
    /// Create an event named `name` together with its completion handle.
    pub fn new(name: &'static str) -> (Self, EventCompletion) {
        let (completion, receiver) = oneshot::channel();
        (Self { name, completion }, EventCompletion { name, receiver })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `work` and report its outcome to the waiter. The result is also
    /// returned to the handler.
    pub async fn wait_until<F, T>(self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = work.await;
        let signal = match &result {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        if self.completion.send(signal).is_err() {
            debug!(event = self.name, "nobody is waiting on event completion");
        }
        result
    }
}

impl EventCompletion {
    /// Wait for the handler's deferred work.
    ///
    /// # Errors
    /// Returns the handler's error, or `LanternError::Internal` when the event
    /// was dropped without `wait_until` being called.
    pub async fn wait(self) -> Result<()> {
        self.receiver.await.map_err(|_| {
            LanternError::Internal(format!("{} event dropped before completion", self.name))
        })?
    }
}

/// Control message from the host page.
#[derive(Debug)]
pub struct MessageEvent {
    data: ControlMessage,
    reply: Option<oneshot::Sender<ControlReply>>,
}

impl MessageEvent {
    /// Message without a reply port; replies are discarded.
    pub fn new(data: ControlMessage) -> Self {
        Self { data, reply: None }
    }

    /// Message with a reply port.
    pub fn with_reply(data: ControlMessage) -> (Self, oneshot::Receiver<ControlReply>) {
        let (sender, receiver) = oneshot::channel();
        (Self { data, reply: Some(sender) }, receiver)
    }

    pub fn data(&self) -> ControlMessage {
        self.data
    }

    /// Post `reply` back. Returns `false` when there is no port or the
    /// receiver is gone.
    pub fn respond(self, reply: ControlReply) -> bool {
        match self.reply {
            Some(port) => port.send(reply).is_ok(),
            None => false,
        }
    }
}

/// Incoming push message. The payload is raw text, usually JSON.
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    pub data: Option<String>,
}

/// Click on a displayed notification; `action` is the button id, empty for
/// a click on the notification body.
#[derive(Debug, Clone, Default)]
pub struct NotificationClickEvent {
    pub action: String,
}

/// Background sync request.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub tag: String,
}
