use std::sync::LazyLock;

use serde::Serialize;
use serde_json::json;

use super::{DecodeError, DeviceModel};
use crate::error::ProtocolError;
use crate::hw::DeviceSession;
use crate::protocol::{ACK_SUCCESS, ACK_SUCCESS_ALTERNATE, Command};
use crate::validator::{FieldRule, NumberRule, RuleKind, RuleSet, ValidationError};

const SERVICE_DATA_MIN_LEN: usize = 5;
const MOVE_PREFIX: [u8; 4] = [0x57, 0x0F, 0x45, 0x01];
const ACCEPTED_ACKS: &[u8] = &[ACK_SUCCESS, ACK_SUCCESS_ALTERNATE];

static RUN_TO_POSITION_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(
            "position",
            FieldRule::required(RuleKind::Integer(
                NumberRule::builder().min(0.0).max(100.0).build(),
            )),
        )
        .field(
            "mode",
            FieldRule::required(RuleKind::Integer(
                NumberRule::builder().allowed(vec![0.0, 1.0, 255.0]).build(),
            )),
        )
});

/// Decoded curtain advertisement state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct CurtainState {
    /// Whether the rail has been calibrated.
    pub calibrated: bool,
    /// Whether the motor is currently running.
    pub moving: bool,
    /// Rail position percentage, 0 fully open to 100 fully closed.
    pub position: u8,
    /// Ambient light level, 0–10.
    pub light_level: u8,
    /// Battery percentage, 0–100.
    pub battery: u8,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<CurtainState, DecodeError> {
    if buffer.len() < SERVICE_DATA_MIN_LEN {
        return Err(DecodeError::BufferTooShort {
            model: DeviceModel::Curtain,
            min: SERVICE_DATA_MIN_LEN,
            actual: buffer.len(),
        });
    }

    Ok(CurtainState {
        calibrated: buffer[1] & 0x40 != 0,
        moving: buffer[3] & 0x80 != 0,
        position: buffer[3] & 0x7F,
        light_level: (buffer[4] >> 4) & 0x0F,
        battery: buffer[2] & 0x7F,
    })
}

/// Motor drive mode for run-to-position commands.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CurtainMode {
    /// Fastest traversal.
    Performance,
    /// Quietest traversal.
    Silent,
    /// Firmware-selected default.
    Default,
}

impl CurtainMode {
    const fn mode_byte(self) -> u8 {
        match self {
            Self::Performance => 0x00,
            Self::Silent => 0x01,
            Self::Default => 0xFF,
        }
    }
}

/// Command surface for curtain devices.
pub struct CurtainHandler;

impl CurtainHandler {
    /// Builds the fully-open command frame.
    ///
    /// ```
    /// use switchmote::CurtainHandler;
    ///
    /// let command = CurtainHandler::open_command();
    /// assert_eq!(&[0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x00], command.bytes());
    /// ```
    #[must_use]
    pub fn open_command() -> Command {
        Self::run_frame(CurtainMode::Default, 0)
    }

    /// Builds the fully-close command frame.
    #[must_use]
    pub fn close_command() -> Command {
        Self::run_frame(CurtainMode::Default, 100)
    }

    /// Builds the pause command frame.
    #[must_use]
    pub fn pause_command() -> Command {
        let mut bytes = Vec::with_capacity(MOVE_PREFIX.len() + 2);
        bytes.extend_from_slice(&MOVE_PREFIX);
        bytes.extend_from_slice(&[0x00, 0xFF]);
        Command::new(bytes, ACCEPTED_ACKS)
    }

    /// Builds a run-to-position command frame for a validated target.
    ///
    /// # Errors
    ///
    /// Returns an error when `position` is outside 0–100.
    pub fn run_to_position_command(
        position: u8,
        mode: CurtainMode,
    ) -> Result<Command, ValidationError> {
        let params = json!({ "position": position, "mode": mode.mode_byte() });
        RUN_TO_POSITION_RULES.check(Some(&params), true)?;
        Ok(Self::run_frame(mode, position))
    }

    /// Drives the rail fully open.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn open(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        session.operate(&Self::open_command()).await?;
        Ok(())
    }

    /// Drives the rail fully closed.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn close(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        session.operate(&Self::close_command()).await?;
        Ok(())
    }

    /// Stops the motor where it is.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn pause(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        session.operate(&Self::pause_command()).await?;
        Ok(())
    }

    /// Drives the rail to a target position.
    ///
    /// # Errors
    ///
    /// Returns an error when the target is invalid or the exchange fails.
    pub async fn run_to_position(
        session: &mut DeviceSession,
        position: u8,
        mode: CurtainMode,
    ) -> Result<(), ProtocolError> {
        let command = Self::run_to_position_command(position, mode)?;
        session.operate(&command).await?;
        Ok(())
    }

    fn run_frame(mode: CurtainMode, position: u8) -> Command {
        let mut bytes = Vec::with_capacity(MOVE_PREFIX.len() + 3);
        bytes.extend_from_slice(&MOVE_PREFIX);
        bytes.extend_from_slice(&[0x05, mode.mode_byte(), position]);
        Command::new(bytes, ACCEPTED_ACKS)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::validator::ValidationCode;

    #[rstest]
    #[case(
        [0x63, 0x40, 0x5A, 0x2D, 0xA0],
        CurtainState {
            calibrated: true,
            moving: false,
            position: 45,
            light_level: 10,
            battery: 90,
        }
    )]
    #[case(
        [0x63, 0x00, 0x64, 0xE4, 0x30],
        CurtainState {
            calibrated: false,
            moving: true,
            position: 100,
            light_level: 3,
            battery: 100,
        }
    )]
    fn decode_extracts_position_and_motion(
        #[case] buffer: [u8; 5],
        #[case] expected: CurtainState,
    ) {
        let state = decode(&buffer).expect("well-formed curtain buffer should decode");
        assert_eq!(expected, state);
    }

    #[test]
    fn decode_accepts_longer_extended_buffers() {
        let buffer = [0x63, 0x40, 0x5A, 0x00, 0x00, 0x12, 0x34];
        let state = decode(&buffer).expect("extended curtain buffer should decode");
        assert_eq!(0, state.position);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let outcome = decode(&[0x63, 0x40, 0x5A, 0x00]);
        assert_matches!(
            outcome,
            Err(DecodeError::BufferTooShort {
                model: DeviceModel::Curtain,
                min: SERVICE_DATA_MIN_LEN,
                actual: 4,
            })
        );
    }

    #[rstest]
    #[case(CurtainHandler::open_command(), vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x00])]
    #[case(CurtainHandler::close_command(), vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x64])]
    #[case(CurtainHandler::pause_command(), vec![0x57, 0x0F, 0x45, 0x01, 0x00, 0xFF])]
    fn fixed_command_bytes_match_protocol(#[case] command: Command, #[case] expected: Vec<u8>) {
        assert_eq!(expected, command.bytes());
    }

    #[rstest]
    #[case(0, CurtainMode::Performance, vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0x00, 0x00])]
    #[case(75, CurtainMode::Silent, vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0x01, 0x4B])]
    #[case(100, CurtainMode::Default, vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0xFF, 0x64])]
    fn run_to_position_encodes_mode_and_target(
        #[case] position: u8,
        #[case] mode: CurtainMode,
        #[case] expected: Vec<u8>,
    ) {
        let command = CurtainHandler::run_to_position_command(position, mode)
            .expect("valid position should encode");
        assert_eq!(expected, command.bytes());
    }

    #[test]
    fn run_to_position_rejects_out_of_range_target() {
        let error = CurtainHandler::run_to_position_command(101, CurtainMode::Default)
            .expect_err("over-range position must be rejected");
        assert_eq!(ValidationCode::ValueOverflow, error.code);
    }
}
