use serde::Serialize;

use super::motion::LightLevel;
use super::{DecodeError, DeviceModel};

const SERVICE_DATA_LEN: usize = 9;

/// Door position reported by a contact sensor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Closed,
    Open,
    /// Left open beyond the configured alert delay.
    TimeoutOpen,
}

impl DoorState {
    const fn from_bits(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Closed),
            0x01 => Some(Self::Open),
            0x02 => Some(Self::TimeoutOpen),
            _ => None,
        }
    }
}

/// Decoded contact-sensor advertisement state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ContactSensorState {
    /// Whether the built-in motion sensor currently detects movement.
    pub motion_detected: bool,
    /// Door position.
    pub door: DoorState,
    /// Ambient light classification.
    pub light: LightLevel,
    /// Battery percentage, 0–100.
    pub battery: u8,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<ContactSensorState, DecodeError> {
    if buffer.len() != SERVICE_DATA_LEN {
        return Err(DecodeError::LengthMismatch {
            model: DeviceModel::ContactSensor,
            expected: SERVICE_DATA_LEN,
            actual: buffer.len(),
        });
    }

    let door_bits = (buffer[3] >> 1) & 0x03;
    let Some(door) = DoorState::from_bits(door_bits) else {
        return Err(DecodeError::UnrecognizedBits {
            model: DeviceModel::ContactSensor,
            field: "door state",
            value: door_bits,
        });
    };

    Ok(ContactSensorState {
        motion_detected: buffer[1] & 0x40 != 0,
        door,
        light: if buffer[3] & 0x01 != 0 {
            LightLevel::Bright
        } else {
            LightLevel::Dark
        },
        battery: buffer[2] & 0x7F,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        [0x64, 0x40, 0x64, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00],
        ContactSensorState {
            motion_detected: true,
            door: DoorState::Closed,
            light: LightLevel::Bright,
            battery: 100,
        }
    )]
    #[case(
        [0x64, 0x00, 0x32, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00],
        ContactSensorState {
            motion_detected: false,
            door: DoorState::Open,
            light: LightLevel::Dark,
            battery: 50,
        }
    )]
    #[case(
        [0x64, 0x00, 0x32, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00],
        ContactSensorState {
            motion_detected: false,
            door: DoorState::TimeoutOpen,
            light: LightLevel::Dark,
            battery: 50,
        }
    )]
    fn decode_extracts_door_state(
        #[case] buffer: [u8; 9],
        #[case] expected: ContactSensorState,
    ) {
        let state = decode(&buffer).expect("well-formed contact buffer should decode");
        assert_eq!(expected, state);
    }

    #[test]
    fn decode_rejects_reserved_door_bits() {
        let buffer = [0x64, 0x00, 0x32, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00];
        let outcome = decode(&buffer);
        assert_matches!(
            outcome,
            Err(DecodeError::UnrecognizedBits {
                model: DeviceModel::ContactSensor,
                value: 0x03,
                ..
            })
        );
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let outcome = decode(&[0x64, 0x00, 0x32]);
        assert_matches!(
            outcome,
            Err(DecodeError::LengthMismatch {
                model: DeviceModel::ContactSensor,
                expected: SERVICE_DATA_LEN,
                actual: 3,
            })
        );
    }
}
