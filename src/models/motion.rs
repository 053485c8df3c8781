use serde::Serialize;

use super::{DecodeError, DeviceModel};

const SERVICE_DATA_LEN: usize = 6;

/// Ambient light classification reported by sensor models.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightLevel {
    Dark,
    Bright,
}

impl LightLevel {
    pub(crate) const fn from_bits(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Dark),
            0x02 => Some(Self::Bright),
            _ => None,
        }
    }
}

/// Decoded motion-sensor advertisement state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct MotionSensorState {
    /// Whether motion is currently detected.
    pub motion_detected: bool,
    /// Ambient light classification, when the sensor reports one.
    pub light: Option<LightLevel>,
    /// Battery percentage, 0–100.
    pub battery: u8,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<MotionSensorState, DecodeError> {
    if buffer.len() != SERVICE_DATA_LEN {
        return Err(DecodeError::LengthMismatch {
            model: DeviceModel::MotionSensor,
            expected: SERVICE_DATA_LEN,
            actual: buffer.len(),
        });
    }

    Ok(MotionSensorState {
        motion_detected: buffer[1] & 0x40 != 0,
        light: LightLevel::from_bits(buffer[5] & 0x03),
        battery: buffer[2] & 0x7F,
    })
}
