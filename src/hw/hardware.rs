use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::error::InteractionError;

/// Stream of raw notification payloads from the command notify endpoint.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// One live logical connection to a single physical device.
///
/// The connection and its characteristic handles are exclusively owned by
/// the link for its lifetime; command exchange semantics live in
/// [`DeviceSession`](super::DeviceSession), which drives these primitives.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Writes one command frame to the control write characteristic.
    ///
    /// # Errors
    ///
    /// Returns the transport failure reported by the BLE stack, unchanged.
    async fn write_command(&self, payload: &[u8]) -> Result<(), InteractionError>;

    /// Opens a fresh notification subscription.
    ///
    /// Items are payloads arriving after this call; dropping the stream
    /// discards anything still in flight.
    ///
    /// # Errors
    ///
    /// Returns an error when the subscription cannot be established.
    async fn subscribe(&self) -> Result<NotificationStream, InteractionError>;

    /// Tears the link down, disconnecting where applicable.
    ///
    /// # Errors
    ///
    /// Returns an error when disconnecting fails.
    async fn close(self: Box<Self>) -> Result<(), InteractionError>;
}
