mod bot;
mod contact;
mod curtain;
mod humidifier;
mod meter;
mod motion;

use serde::Serialize;
use serde_with::SerializeDisplay;
use thiserror::Error;

pub use self::bot::{BotAction, BotHandler, BotState};
pub use self::contact::{ContactSensorState, DoorState};
pub use self::curtain::{CurtainHandler, CurtainMode, CurtainState};
pub use self::humidifier::{HumidifierHandler, HumidifierMode, HumidifierState, QuickGear};
pub use self::meter::MeterState;
pub use self::motion::{LightLevel, MotionSensorState};

/// Device models in the codec table, keyed by the advertisement model byte.
///
/// The model identifier occupies the low 7 bits of the first service-data
/// byte; the high bit is an extended-payload flag and is masked off before
/// lookup.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, derive_more::Display, SerializeDisplay)]
pub enum DeviceModel {
    #[display("bot")]
    Bot,
    #[display("meter")]
    Meter,
    #[display("humidifier")]
    Humidifier,
    #[display("curtain")]
    Curtain,
    #[display("motion_sensor")]
    MotionSensor,
    #[display("contact_sensor")]
    ContactSensor,
}

impl DeviceModel {
    /// Returns the model identifier byte broadcast by this model.
    #[must_use]
    pub const fn identifier(self) -> u8 {
        match self {
            Self::Bot => 0x48,
            Self::Meter => 0x54,
            Self::Humidifier => 0x65,
            Self::Curtain => 0x63,
            Self::MotionSensor => 0x73,
            Self::ContactSensor => 0x64,
        }
    }

    /// Looks up a model by identifier byte, masking the extended-payload bit.
    ///
    /// ```
    /// use switchmote::DeviceModel;
    ///
    /// assert_eq!(Some(DeviceModel::Bot), DeviceModel::from_identifier(0x48));
    /// assert_eq!(Some(DeviceModel::Bot), DeviceModel::from_identifier(0xC8));
    /// assert_eq!(None, DeviceModel::from_identifier(0x7F));
    /// ```
    #[must_use]
    pub fn from_identifier(identifier: u8) -> Option<Self> {
        match identifier & 0x7F {
            0x48 => Some(Self::Bot),
            0x54 => Some(Self::Meter),
            0x65 => Some(Self::Humidifier),
            0x63 => Some(Self::Curtain),
            0x73 => Some(Self::MotionSensor),
            0x64 => Some(Self::ContactSensor),
            _ => None,
        }
    }

    /// Human-readable model name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bot => "Bot",
            Self::Meter => "Meter",
            Self::Humidifier => "Humidifier",
            Self::Curtain => "Curtain",
            Self::MotionSensor => "Motion Sensor",
            Self::ContactSensor => "Contact Sensor",
        }
    }
}

/// Decoded, model-specific advertisement state.
///
/// Produced fresh on every decode; carries no identity beyond the emitting
/// event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeviceState {
    Bot(BotState),
    Meter(MeterState),
    Humidifier(HumidifierState),
    Curtain(CurtainState),
    MotionSensor(MotionSensorState),
    ContactSensor(ContactSensorState),
}

impl DeviceState {
    /// Returns the model this state was decoded for.
    #[must_use]
    pub fn model(&self) -> DeviceModel {
        match self {
            Self::Bot(_) => DeviceModel::Bot,
            Self::Meter(_) => DeviceModel::Meter,
            Self::Humidifier(_) => DeviceModel::Humidifier,
            Self::Curtain(_) => DeviceModel::Curtain,
            Self::MotionSensor(_) => DeviceModel::MotionSensor,
            Self::ContactSensor(_) => DeviceModel::ContactSensor,
        }
    }
}

/// Errors returned while decoding a service-data buffer.
///
/// `UnknownModel` means "not a relevant device" and is safe to ignore; the
/// other variants mean a recognised device sent something unparsable.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DecodeError {
    #[error("model identifier 0x{identifier:02X} is not in the codec table")]
    UnknownModel { identifier: u8 },
    #[error("{model} service data must be {expected} bytes, got {actual}")]
    LengthMismatch {
        model: DeviceModel,
        expected: usize,
        actual: usize,
    },
    #[error("{model} service data must be at least {min} bytes, got {actual}")]
    BufferTooShort {
        model: DeviceModel,
        min: usize,
        actual: usize,
    },
    #[error("{model} {field} bits 0x{value:02X} are not a recognised pattern")]
    UnrecognizedBits {
        model: DeviceModel,
        field: &'static str,
        value: u8,
    },
}

/// Decodes one service-data buffer for the model selected by `identifier`.
///
/// Decoding is a pure function of the buffer: the same identifier and bytes
/// always yield the same state, and the buffer is neither mutated nor
/// retained. Each decoder validates the buffer length before reading any
/// offset.
///
/// ```
/// use switchmote::{DeviceState, models};
///
/// let state = models::decode(0x48, &[0x48, 0x40, 0x5F])?;
/// assert!(matches!(state, DeviceState::Bot(_)));
/// # Ok::<(), switchmote::DecodeError>(())
/// ```
///
/// # Errors
///
/// Returns [`DecodeError::UnknownModel`] when `identifier` has no codec
/// table entry, and a buffer-shaped error when a recognised model's payload
/// cannot be parsed.
pub fn decode(identifier: u8, buffer: &[u8]) -> Result<DeviceState, DecodeError> {
    let Some(model) = DeviceModel::from_identifier(identifier) else {
        return Err(DecodeError::UnknownModel { identifier });
    };

    let state = match model {
        DeviceModel::Bot => DeviceState::Bot(bot::decode(buffer)?),
        DeviceModel::Meter => DeviceState::Meter(meter::decode(buffer)?),
        DeviceModel::Humidifier => DeviceState::Humidifier(humidifier::decode(buffer)?),
        DeviceModel::Curtain => DeviceState::Curtain(curtain::decode(buffer)?),
        DeviceModel::MotionSensor => DeviceState::MotionSensor(motion::decode(buffer)?),
        DeviceModel::ContactSensor => DeviceState::ContactSensor(contact::decode(buffer)?),
    };
    Ok(state)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0x48, Some(DeviceModel::Bot))]
    #[case(0xC8, Some(DeviceModel::Bot))]
    #[case(0x54, Some(DeviceModel::Meter))]
    #[case(0x65, Some(DeviceModel::Humidifier))]
    #[case(0xE5, Some(DeviceModel::Humidifier))]
    #[case(0x63, Some(DeviceModel::Curtain))]
    #[case(0x73, Some(DeviceModel::MotionSensor))]
    #[case(0x64, Some(DeviceModel::ContactSensor))]
    #[case(0x00, None)]
    #[case(0x7F, None)]
    fn from_identifier_masks_extended_bit(
        #[case] identifier: u8,
        #[case] expected: Option<DeviceModel>,
    ) {
        assert_eq!(expected, DeviceModel::from_identifier(identifier));
    }

    #[test]
    fn decode_rejects_unknown_model() {
        let outcome = decode(0x7F, &[0x7F, 0x00, 0x00]);
        assert_matches!(outcome, Err(DecodeError::UnknownModel { identifier: 0x7F }));
    }

    #[test]
    fn decode_is_pure() {
        let buffer = [0x65, 0x80, 0x00, 0x00, 0x32, 0x00, 0x00, 0x00];
        let first = decode(0x65, &buffer).expect("humidifier buffer should decode");
        let second = decode(0x65, &buffer).expect("humidifier buffer should decode");
        assert_eq!(first, second);
    }

    #[test]
    fn state_reports_its_model() {
        let state = decode(0x48, &[0x48, 0x00, 0x64]).expect("bot buffer should decode");
        assert_eq!(DeviceModel::Bot, state.model());
    }
}
