use serde::Serialize;

use super::{DecodeError, DeviceModel};
use crate::error::ProtocolError;
use crate::hw::DeviceSession;
use crate::protocol::{ACK_SUCCESS, ACK_SUCCESS_ALTERNATE, Command};

const SERVICE_DATA_LEN: usize = 3;
const COMMAND_PREFIX: [u8; 2] = [0x57, 0x01];
const ACCEPTED_ACKS: &[u8] = &[ACK_SUCCESS, ACK_SUCCESS_ALTERNATE];

/// Decoded bot advertisement state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct BotState {
    /// Whether the arm is configured as a toggle switch rather than a
    /// one-shot presser.
    pub switch_mode: bool,
    /// Reported switch state. The device transmits this bit inverted.
    pub switch_on: bool,
    /// Battery percentage, 0–100.
    pub battery: u8,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<BotState, DecodeError> {
    if buffer.len() != SERVICE_DATA_LEN {
        return Err(DecodeError::LengthMismatch {
            model: DeviceModel::Bot,
            expected: SERVICE_DATA_LEN,
            actual: buffer.len(),
        });
    }

    Ok(BotState {
        switch_mode: buffer[1] & 0x80 != 0,
        switch_on: buffer[1] & 0x40 == 0,
        battery: buffer[2] & 0x7F,
    })
}

/// Bot arm operations.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BotAction {
    /// One press-and-release cycle.
    Press,
    /// Latch the switch on.
    TurnOn,
    /// Latch the switch off.
    TurnOff,
    /// Hold the arm down.
    ArmDown,
    /// Release the arm up.
    ArmUp,
}

impl BotAction {
    const fn action_byte(self) -> u8 {
        match self {
            Self::Press => 0x00,
            Self::TurnOn => 0x01,
            Self::TurnOff => 0x02,
            Self::ArmDown => 0x03,
            Self::ArmUp => 0x04,
        }
    }
}

/// Command surface for bot devices.
pub struct BotHandler;

impl BotHandler {
    /// Builds the command frame for one bot action.
    ///
    /// ```
    /// use switchmote::{BotAction, BotHandler};
    ///
    /// let command = BotHandler::command_for(BotAction::TurnOn);
    /// assert_eq!(&[0x57, 0x01, 0x01], command.bytes());
    /// ```
    #[must_use]
    pub fn command_for(action: BotAction) -> Command {
        let mut bytes = Vec::with_capacity(COMMAND_PREFIX.len() + 1);
        bytes.extend_from_slice(&COMMAND_PREFIX);
        bytes.push(action.action_byte());
        Command::new(bytes, ACCEPTED_ACKS)
    }

    /// Runs one press cycle.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn press(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        Self::run(session, BotAction::Press).await
    }

    /// Latches the switch on.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn turn_on(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        Self::run(session, BotAction::TurnOn).await
    }

    /// Latches the switch off.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn turn_off(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        Self::run(session, BotAction::TurnOff).await
    }

    async fn run(session: &mut DeviceSession, action: BotAction) -> Result<(), ProtocolError> {
        session.operate(&Self::command_for(action)).await?;
        Ok(())
    }
}
