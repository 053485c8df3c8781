use std::sync::LazyLock;

use serde::Serialize;
use serde_json::json;

use super::{DecodeError, DeviceModel};
use crate::error::ProtocolError;
use crate::hw::DeviceSession;
use crate::protocol::{ACK_SUCCESS, Command};
use crate::validator::{FieldRule, NumberRule, RuleKind, RuleSet, ValidationError};

const SERVICE_DATA_LEN: usize = 8;
const COMMAND_PREFIX: [u8; 2] = [0x57, 0x01];
const AUTO_MODE_BYTE: u8 = 0x80;
const ACCEPTED_ACKS: &[u8] = &[ACK_SUCCESS];

static MANUAL_TARGET_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new().field(
        "percentage",
        FieldRule::required(RuleKind::Integer(
            NumberRule::builder().min(0.0).max(100.0).build(),
        )),
    )
});

/// Discrete humidification presets encoded in the reserved 101–103 range.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickGear {
    Low,
    Medium,
    High,
}

impl QuickGear {
    pub(crate) const fn gear_byte(self) -> u8 {
        match self {
            Self::Low => 101,
            Self::Medium => 102,
            Self::High => 103,
        }
    }

    const fn from_gear_byte(value: u8) -> Option<Self> {
        match value {
            101 => Some(Self::Low),
            102 => Some(Self::Medium),
            103 => Some(Self::High),
            _ => None,
        }
    }
}

/// Decoded humidifier advertisement state.
///
/// Auto mode forces the reported percentage to 0 regardless of the raw
/// bits, and a quick-gear preset is reported as a discrete mode rather
/// than a percentage.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct HumidifierState {
    /// Whether the device is switched on.
    pub power_on: bool,
    /// Whether the device is regulating humidity automatically.
    pub auto_mode: bool,
    /// Manual humidification target percentage, 0–100.
    pub percentage: u8,
    /// Active quick-gear preset, when one is selected.
    pub quick_gear: Option<QuickGear>,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<HumidifierState, DecodeError> {
    if buffer.len() != SERVICE_DATA_LEN {
        return Err(DecodeError::LengthMismatch {
            model: DeviceModel::Humidifier,
            expected: SERVICE_DATA_LEN,
            actual: buffer.len(),
        });
    }

    let auto_mode = buffer[4] & 0x80 != 0;
    let raw_level = buffer[4] & 0x7F;
    let (percentage, quick_gear) = if auto_mode {
        (0, None)
    } else if raw_level <= 100 {
        (raw_level, None)
    } else if let Some(gear) = QuickGear::from_gear_byte(raw_level) {
        (0, Some(gear))
    } else {
        return Err(DecodeError::UnrecognizedBits {
            model: DeviceModel::Humidifier,
            field: "humidification level",
            value: raw_level,
        });
    };

    Ok(HumidifierState {
        power_on: buffer[1] & 0x80 != 0,
        auto_mode,
        percentage,
        quick_gear,
    })
}

/// Humidification target requested by a set-mode command.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HumidifierMode {
    /// Automatic humidity regulation.
    Auto,
    /// Fixed manual target percentage, 0–100.
    Manual(u8),
    /// One of the discrete quick-gear presets.
    QuickGear(QuickGear),
}

impl HumidifierMode {
    const fn mode_byte(self) -> u8 {
        match self {
            Self::Auto => AUTO_MODE_BYTE,
            Self::Manual(percentage) => percentage,
            Self::QuickGear(gear) => gear.gear_byte(),
        }
    }
}

/// Command surface for humidifier devices.
pub struct HumidifierHandler;

impl HumidifierHandler {
    /// Builds the power-on command frame.
    #[must_use]
    pub fn power_on_command() -> Command {
        Command::new(vec![COMMAND_PREFIX[0], COMMAND_PREFIX[1], 0x01], ACCEPTED_ACKS)
    }

    /// Builds the power-off command frame.
    #[must_use]
    pub fn power_off_command() -> Command {
        Command::new(vec![COMMAND_PREFIX[0], COMMAND_PREFIX[1], 0x02], ACCEPTED_ACKS)
    }

    /// Builds the set-mode command frame for a validated target.
    ///
    /// ```
    /// use switchmote::{HumidifierHandler, HumidifierMode};
    ///
    /// let command = HumidifierHandler::mode_command(HumidifierMode::Manual(45))?;
    /// assert_eq!(&[0x57, 0x01, 0x2D], command.bytes());
    ///
    /// let auto = HumidifierHandler::mode_command(HumidifierMode::Auto)?;
    /// assert_eq!(&[0x57, 0x01, 0x80], auto.bytes());
    /// # Ok::<(), switchmote::ValidationError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when a manual target is outside 0–100.
    pub fn mode_command(mode: HumidifierMode) -> Result<Command, ValidationError> {
        if let HumidifierMode::Manual(percentage) = mode {
            let params = json!({ "percentage": percentage });
            MANUAL_TARGET_RULES.check(Some(&params), true)?;
        }
        Ok(Command::new(
            vec![COMMAND_PREFIX[0], COMMAND_PREFIX[1], mode.mode_byte()],
            ACCEPTED_ACKS,
        ))
    }

    /// Switches the humidifier on.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn turn_on(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        session.operate(&Self::power_on_command()).await?;
        Ok(())
    }

    /// Switches the humidifier off.
    ///
    /// # Errors
    ///
    /// Returns an error when the command exchange fails.
    pub async fn turn_off(session: &mut DeviceSession) -> Result<(), ProtocolError> {
        session.operate(&Self::power_off_command()).await?;
        Ok(())
    }

    /// Sets the humidification mode.
    ///
    /// # Errors
    ///
    /// Returns an error when the target is invalid or the exchange fails.
    pub async fn set_mode(
        session: &mut DeviceSession,
        mode: HumidifierMode,
    ) -> Result<(), ProtocolError> {
        let command = Self::mode_command(mode)?;
        session.operate(&command).await?;
        Ok(())
    }
}
