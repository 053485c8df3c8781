use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bon::Builder;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::hardware::{DeviceLink, NotificationStream};
use crate::error::InteractionError;

const NOTIFY_CHANNEL_CAPACITY: usize = 16;

/// Settings for constructing a fake device link.
#[derive(Debug, Builder)]
pub struct FakeLinkConfig {
    /// Scripted reply for each successive write; `None` stays silent so
    /// the exchange runs into its timeout.
    replies: Vec<Option<Vec<u8>>>,
    /// Makes every write fail with a transport error.
    #[builder(default)]
    reject_writes: bool,
}

/// Scripted device link used in tests and non-hardware environments.
///
/// Clones share state, so a test can keep a handle for assertions after
/// handing the link to a session. Notifications are fanned out to live
/// subscriptions only; a payload injected while nothing is subscribed is
/// dropped, matching how a real link discards traffic between exchanges.
#[derive(Debug, Clone)]
pub struct FakeDeviceLink {
    inner: Arc<FakeLinkInner>,
}

#[derive(Debug)]
struct FakeLinkInner {
    replies: Mutex<VecDeque<Option<Vec<u8>>>>,
    writes: Mutex<Vec<Vec<u8>>>,
    notify_tx: broadcast::Sender<Vec<u8>>,
    reject_writes: bool,
}

impl FakeDeviceLink {
    /// Creates a fake link from explicit settings.
    #[must_use]
    pub fn new(config: FakeLinkConfig) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(FakeLinkInner {
                replies: Mutex::new(config.replies.into()),
                writes: Mutex::new(Vec::new()),
                notify_tx,
                reject_writes: config.reject_writes,
            }),
        }
    }

    /// Returns every command frame written so far.
    #[must_use]
    pub fn written_commands(&self) -> Vec<Vec<u8>> {
        self.inner
            .writes
            .lock()
            .expect("fake link write log lock should not be poisoned")
            .clone()
    }

    /// Pushes a notification outside any scripted exchange, as a device
    /// would push one late.
    pub fn inject_notification(&self, payload: Vec<u8>) {
        // Dropped when no subscription is live.
        let _ = self.inner.notify_tx.send(payload);
    }
}

#[async_trait]
impl DeviceLink for FakeDeviceLink {
    async fn write_command(&self, payload: &[u8]) -> Result<(), InteractionError> {
        if self.inner.reject_writes {
            return Err(InteractionError::Ble(btleplug::Error::NotConnected));
        }

        self.inner
            .writes
            .lock()
            .expect("fake link write log lock should not be poisoned")
            .push(payload.to_vec());

        let reply = self
            .inner
            .replies
            .lock()
            .expect("fake link reply script lock should not be poisoned")
            .pop_front()
            .flatten();
        if let Some(reply) = reply {
            let _ = self.inner.notify_tx.send(reply);
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<NotificationStream, InteractionError> {
        let stream =
            BroadcastStream::new(self.inner.notify_tx.subscribe()).filter_map(Result::ok);
        Ok(Box::pin(stream))
    }

    async fn close(self: Box<Self>) -> Result<(), InteractionError> {
        Ok(())
    }
}
