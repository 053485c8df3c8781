use std::time::Duration;

use strum_macros::Display;

/// Acknowledgement opcode reported for an accepted command.
pub const ACK_SUCCESS: u8 = 0x01;
/// Alternate success opcode returned by bot-style commands.
///
/// Device firmware does not document whether this means "busy" or
/// "accepted, pending"; it is treated as a terminal success either way.
pub const ACK_SUCCESS_ALTERNATE: u8 = 0x05;

/// Acknowledgement frame length for control commands.
pub(crate) const ACK_RESPONSE_LEN: usize = 3;

/// Default bound on one command/response exchange.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) const SCAN_SERVICE_DATA_UUID: &str = "0000fd3d-0000-1000-8000-00805f9b34fb";
pub(crate) const SCAN_SERVICE_DATA_UUID_LEGACY: &str = "00000d00-0000-1000-8000-00805f9b34fb";
pub(crate) const CONTROL_SERVICE_UUID: &str = "cba20d00-224d-11e6-9fb8-0002a5d5c51b";
pub(crate) const WRITE_CHARACTERISTIC_UUID: &str = "cba20002-224d-11e6-9fb8-0002a5d5c51b";
pub(crate) const NOTIFY_CHARACTERISTIC_UUID: &str = "cba20003-224d-11e6-9fb8-0002a5d5c51b";

/// Known protocol endpoints.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display)]
pub enum EndpointId {
    /// Primary control service.
    #[strum(to_string = "control_service")]
    ControlService,
    /// Characteristic used for command writes.
    #[strum(to_string = "write_characteristic")]
    WriteCharacteristic,
    /// Characteristic delivering command acknowledgements.
    #[strum(to_string = "notify_characteristic")]
    NotifyCharacteristic,
}

impl EndpointId {
    /// Human-readable endpoint name.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::ControlService => "control service",
            Self::WriteCharacteristic => "command write",
            Self::NotifyCharacteristic => "command notify",
        }
    }

    /// Endpoint UUID.
    pub(crate) fn uuid(self) -> &'static str {
        match self {
            Self::ControlService => CONTROL_SERVICE_UUID,
            Self::WriteCharacteristic => WRITE_CHARACTERISTIC_UUID,
            Self::NotifyCharacteristic => NOTIFY_CHARACTERISTIC_UUID,
        }
    }
}

/// One encoded operation request.
///
/// Carries the exact bytes written to the device together with the
/// acknowledgement opcodes the device may answer with. Built once per call
/// by a model command builder and consumed by exactly one
/// [`DeviceSession`](crate::DeviceSession) exchange.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Command {
    bytes: Vec<u8>,
    accepted_acks: &'static [u8],
    response_len: usize,
}

impl Command {
    pub(crate) fn new(bytes: Vec<u8>, accepted_acks: &'static [u8]) -> Self {
        Self {
            bytes,
            accepted_acks,
            response_len: ACK_RESPONSE_LEN,
        }
    }

    /// Returns the raw command bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the acknowledgement opcodes accepted as success.
    #[must_use]
    pub fn accepted_acks(&self) -> &[u8] {
        self.accepted_acks
    }

    /// Returns the expected acknowledgement frame length.
    #[must_use]
    pub fn response_len(&self) -> usize {
        self.response_len
    }

    /// Returns whether `opcode` is an accepted acknowledgement.
    #[must_use]
    pub fn accepts(&self, opcode: u8) -> bool {
        self.accepted_acks.contains(&opcode)
    }
}
