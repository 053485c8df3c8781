use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tracing::{debug, instrument};

use super::hardware::DeviceLink;
use crate::error::InteractionError;
use crate::protocol::{Command, DEFAULT_RESPONSE_TIMEOUT};

/// Failure outcomes of one command/response exchange.
#[derive(Debug, Error)]
pub enum OperateError {
    /// The transport reported a failure; propagated unchanged.
    #[error("transport failure during command exchange")]
    Transport(#[from] InteractionError),
    /// The device answered with an unrecognised opcode or length.
    #[error("device returned an unexpected response: {response_hex}")]
    UnexpectedResponse { response_hex: String },
    /// No notification arrived within the exchange bound.
    #[error("no response within {waited:?}")]
    Timeout { waited: Duration },
}

/// Correlates one outgoing command with exactly one acknowledgement.
///
/// A session owns its [`DeviceLink`] exclusively. `operate` takes
/// `&mut self`, so a second exchange cannot start before the first
/// resolves; callers that want queueing wrap the session in an async
/// mutex. There is no implicit retry: every call produces exactly one
/// outcome, and retry policy belongs to the caller.
pub struct DeviceSession {
    link: Box<dyn DeviceLink>,
    response_timeout: Duration,
}

impl DeviceSession {
    /// Creates a session over an established link with the default
    /// response timeout.
    #[must_use]
    pub fn new(link: Box<dyn DeviceLink>) -> Self {
        Self {
            link,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Overrides the per-exchange response timeout.
    #[must_use]
    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// Executes one command/response exchange.
    ///
    /// Writes the command bytes, waits for the next notification on the
    /// command notify endpoint, and validates its opcode and length
    /// against the command's accepted acknowledgements. The per-exchange
    /// subscription is dropped on every path, so a notification arriving
    /// after a timeout is discarded rather than delivered to a later call.
    ///
    /// # Errors
    ///
    /// Returns [`OperateError::Transport`] when the write or subscription
    /// fails, [`OperateError::Timeout`] when no notification arrives in
    /// time, and [`OperateError::UnexpectedResponse`] (carrying the raw
    /// bytes hex-encoded) when the device answers with an unrecognised
    /// opcode or length.
    #[instrument(
        skip(self, command),
        level = "debug",
        fields(command_len = command.bytes().len())
    )]
    pub async fn operate(&mut self, command: &Command) -> Result<(), OperateError> {
        let mut notifications = self.link.subscribe().await?;
        self.link.write_command(command.bytes()).await?;

        let response = match timeout(self.response_timeout, notifications.next()).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                return Err(OperateError::Transport(
                    InteractionError::NotificationStreamClosed,
                ));
            }
            Err(_elapsed) => {
                debug!(waited = ?self.response_timeout, "command exchange timed out");
                return Err(OperateError::Timeout {
                    waited: self.response_timeout,
                });
            }
        };
        drop(notifications);

        match response.first() {
            Some(&opcode) if response.len() == command.response_len() && command.accepts(opcode) => {
                Ok(())
            }
            _ => Err(OperateError::UnexpectedResponse {
                response_hex: hex::encode(&response),
            }),
        }
    }

    /// Closes the session and tears the link down.
    ///
    /// # Errors
    ///
    /// Returns an error when disconnecting fails.
    pub async fn close(self) -> Result<(), InteractionError> {
        self.link.close().await
    }
}
