use bon::Builder;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::models::{self, DecodeError, DeviceModel, DeviceState};
use crate::utils::format_hex;

const SERVICE_DATA_MIN_LEN: usize = 3;
const SERVICE_DATA_MAX_LEN: usize = 20;

/// One advertisement event delivered by the BLE stack.
#[derive(Debug, Clone, Eq, PartialEq, Builder)]
pub struct Advertisement {
    /// Peripheral address, owned by the BLE stack.
    pub address: String,
    /// Advertised local name, when broadcast.
    pub local_name: Option<String>,
    /// Received signal strength.
    pub rssi: Option<i16>,
    /// Vendor service-data payload, when broadcast.
    pub service_data: Option<Vec<u8>>,
    /// Manufacturer-data payload, when broadcast.
    pub manufacturer_data: Option<Vec<u8>>,
}

/// Normalized device-state record emitted for one decoded advertisement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStateEvent {
    /// Peripheral address the advertisement came from.
    pub address: String,
    /// Decoded device model.
    pub model: DeviceModel,
    /// Human-readable model name.
    pub model_name: &'static str,
    /// Received signal strength.
    pub rssi: Option<i16>,
    /// Decoded model-specific state.
    pub state: DeviceState,
}

/// Why an advertisement was dropped without emitting a record.
///
/// Dropping is the expected common case: most nearby BLE traffic belongs
/// to unrelated devices.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IgnoreReason {
    /// The advertisement carried no service data.
    NoServiceData,
    /// The service-data payload is outside the decodable 3–20 byte range.
    ServiceDataLength { len: usize },
    /// The model identifier has no codec table entry.
    UnknownModel { identifier: u8 },
    /// The record was suppressed by the subscriber's model filter.
    FilteredOut,
}

/// Outcome of dispatching one advertisement.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A well-formed record for a recognised model.
    Emitted(DeviceStateEvent),
    /// Dropped silently.
    Ignored(IgnoreReason),
    /// A recognised model broadcast a payload this crate cannot parse.
    Anomaly {
        model: DeviceModel,
        error: DecodeError,
    },
}

/// Classifies raw advertisement events into normalized state records.
///
/// Stateless; a single dispatcher may process interleaved advertisements
/// from any number of physical devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvertisementDispatcher {
    filter: Option<DeviceModel>,
}

impl AdvertisementDispatcher {
    /// Creates a dispatcher emitting records for every known model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher emitting records for one model only.
    #[must_use]
    pub fn with_model_filter(model: DeviceModel) -> Self {
        Self {
            filter: Some(model),
        }
    }

    /// Dispatches one advertisement event.
    ///
    /// ```
    /// use switchmote::{Advertisement, AdvertisementDispatcher, DispatchOutcome};
    ///
    /// let advertisement = Advertisement::builder()
    ///     .address("AA:BB:CC:DD:EE:FF".to_string())
    ///     .service_data(vec![0x48, 0x40, 0x5F])
    ///     .build();
    /// let outcome = AdvertisementDispatcher::new().dispatch(&advertisement);
    /// assert!(matches!(outcome, DispatchOutcome::Emitted(_)));
    /// ```
    #[instrument(skip(self, advertisement), level = "trace", fields(address = %advertisement.address))]
    pub fn dispatch(&self, advertisement: &Advertisement) -> DispatchOutcome {
        let Some(service_data) = advertisement.service_data.as_deref() else {
            return DispatchOutcome::Ignored(IgnoreReason::NoServiceData);
        };
        if !(SERVICE_DATA_MIN_LEN..=SERVICE_DATA_MAX_LEN).contains(&service_data.len()) {
            return DispatchOutcome::Ignored(IgnoreReason::ServiceDataLength {
                len: service_data.len(),
            });
        }

        let identifier = service_data[0];
        let Some(model) = DeviceModel::from_identifier(identifier) else {
            return DispatchOutcome::Ignored(IgnoreReason::UnknownModel { identifier });
        };
        if let Some(filter) = self.filter
            && filter != model
        {
            return DispatchOutcome::Ignored(IgnoreReason::FilteredOut);
        }

        match models::decode(identifier, service_data) {
            Ok(state) => DispatchOutcome::Emitted(DeviceStateEvent {
                address: advertisement.address.clone(),
                model,
                model_name: model.label(),
                rssi: advertisement.rssi,
                state,
            }),
            Err(DecodeError::UnknownModel { identifier }) => {
                DispatchOutcome::Ignored(IgnoreReason::UnknownModel { identifier })
            }
            Err(error) => {
                warn!(
                    address = %advertisement.address,
                    %model,
                    payload = %format_hex(service_data),
                    %error,
                    "recognised model broadcast an unparsable payload"
                );
                DispatchOutcome::Anomaly { model, error }
            }
        }
    }
}
