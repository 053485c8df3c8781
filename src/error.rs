use derive_more::From;
use thiserror::Error;

use crate::hw::OperateError;
use crate::models::DecodeError;
use crate::protocol::EndpointId;
use crate::validator::ValidationError;

/// Errors returned by BLE interaction operations.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("BLE operation failed")]
    Ble(#[from] btleplug::Error),
    #[error("no BLE adapters were found")]
    NoAdapters,
    #[error(
        "required endpoint `{name}` ({uuid}) was not found on the connected device",
        name = endpoint.name(),
        uuid = endpoint.uuid()
    )]
    MissingEndpoint { endpoint: EndpointId },
    #[error("the notification stream closed while a command exchange was in flight")]
    NotificationStreamClosed,
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Top-level protocol errors wrapping module-specific error types.
#[derive(Debug, Error, From)]
pub enum ProtocolError {
    #[error(transparent)]
    #[from(ValidationError, Box<ValidationError>)]
    Validation(Box<ValidationError>),
    #[error(transparent)]
    #[from(DecodeError, Box<DecodeError>)]
    Decode(Box<DecodeError>),
    #[error(transparent)]
    #[from(OperateError, Box<OperateError>)]
    Operate(Box<OperateError>),
    #[error(transparent)]
    #[from(InteractionError, Box<InteractionError>)]
    Interaction(Box<InteractionError>),
}
