use serde::Serialize;

use super::{DecodeError, DeviceModel};

const SERVICE_DATA_LEN: usize = 6;

/// Decoded thermometer/hygrometer advertisement state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterState {
    /// Measured temperature in degrees Celsius, 0.1 degree resolution.
    pub temperature_celsius: f32,
    /// Whether the device display is configured for Fahrenheit.
    pub fahrenheit_display: bool,
    /// Relative humidity percentage, 0–100.
    pub humidity: u8,
    /// Battery percentage, 0–100.
    pub battery: u8,
}

pub(crate) fn decode(buffer: &[u8]) -> Result<MeterState, DecodeError> {
    if buffer.len() != SERVICE_DATA_LEN {
        return Err(DecodeError::LengthMismatch {
            model: DeviceModel::Meter,
            expected: SERVICE_DATA_LEN,
            actual: buffer.len(),
        });
    }

    // Temperature is split across two bytes: integer part with a sign bit,
    // and a tenths digit in the low nibble of the preceding byte.
    let integer = f32::from(buffer[4] & 0x7F);
    let tenths = f32::from(buffer[3] & 0x0F) / 10.0;
    let sign = if buffer[4] & 0x80 != 0 { 1.0 } else { -1.0 };

    Ok(MeterState {
        temperature_celsius: sign * (integer + tenths),
        fahrenheit_display: buffer[5] & 0x80 != 0,
        humidity: buffer[5] & 0x7F,
        battery: buffer[2] & 0x7F,
    })
}
