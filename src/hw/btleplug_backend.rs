use std::time::Duration;

use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::hardware::{DeviceLink, NotificationStream};
use super::session::DeviceSession;
use crate::advert::{Advertisement, AdvertisementDispatcher, DeviceStateEvent, DispatchOutcome};
use crate::error::InteractionError;
use crate::models::DeviceModel;
use crate::protocol::{
    EndpointId, SCAN_SERVICE_DATA_UUID, SCAN_SERVICE_DATA_UUID_LEGACY,
};

const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STATE_EVENT_CHANNEL_CAPACITY: usize = 64;

/// BLE client backed by `btleplug`.
#[derive(Debug)]
pub struct BleClient {
    manager: Manager,
}

impl BleClient {
    /// Creates the real BLE client.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform BLE manager cannot be created.
    pub async fn new() -> Result<Self, InteractionError> {
        Ok(Self {
            manager: Manager::new().await?,
        })
    }

    async fn first_adapter(&self) -> Result<Adapter, InteractionError> {
        let mut adapters = self.manager.adapters().await?;
        if adapters.is_empty() {
            return Err(InteractionError::NoAdapters);
        }
        Ok(adapters.remove(0))
    }

    /// Streams normalized device-state records decoded from advertisement
    /// traffic, optionally restricted to one model.
    ///
    /// The scan runs until `cancel` fires or the receiver is dropped.
    /// Unrelated advertisements are dropped silently; anomalies for
    /// recognised models are logged by the dispatcher and not emitted.
    ///
    /// # Errors
    ///
    /// Returns an error when no adapter is available or the scan cannot
    /// be started.
    #[instrument(skip_all, level = "debug", fields(?filter))]
    pub async fn state_events(
        &self,
        filter: Option<DeviceModel>,
        cancel: CancellationToken,
    ) -> Result<ReceiverStream<DeviceStateEvent>, InteractionError> {
        let adapter = self.first_adapter().await?;
        let mut events = adapter.events().await?;
        adapter.start_scan(ScanFilter::default()).await?;

        let dispatcher = match filter {
            Some(model) => AdvertisementDispatcher::with_model_filter(model),
            None => AdvertisementDispatcher::new(),
        };
        let (record_tx, record_rx) = mpsc::channel(STATE_EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    maybe_event = events.next() => {
                        let Some(event) = maybe_event else { break };
                        let Some(advertisement) = advertisement_from_event(event) else {
                            continue;
                        };
                        if let DispatchOutcome::Emitted(record) = dispatcher.dispatch(&advertisement)
                            && record_tx.send(record).await.is_err()
                        {
                            break;
                        }
                    }
                }
            }
            if let Err(error) = adapter.stop_scan().await {
                debug!(?error, "failed to stop adapter scan cleanly");
            }
        });

        Ok(ReceiverStream::new(record_rx))
    }

    /// Scans until a peripheral matching `query` (address, or local-name
    /// prefix) appears, connects, and prepares a command session.
    ///
    /// # Errors
    ///
    /// Returns an error when scanning or connecting fails, or when the
    /// peripheral lacks the control endpoints.
    #[instrument(skip(self), level = "debug")]
    pub async fn connect(&self, query: &str) -> Result<DeviceSession, InteractionError> {
        let adapter = self.first_adapter().await?;
        adapter.start_scan(ScanFilter::default()).await?;

        let peripheral = find_matching_peripheral(&adapter, query).await?;
        if let Err(error) = adapter.stop_scan().await {
            debug!(?error, "failed to stop adapter scan cleanly");
        }

        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        peripheral.discover_services().await?;

        let write_characteristic =
            find_characteristic(&peripheral, EndpointId::WriteCharacteristic)?;
        let notify_characteristic =
            find_characteristic(&peripheral, EndpointId::NotifyCharacteristic)?;
        info!(device_id = %peripheral.id(), "connected to matching peripheral");

        Ok(DeviceSession::new(Box::new(RealDeviceLink {
            peripheral,
            write_characteristic,
            notify_characteristic,
        })))
    }
}

async fn find_matching_peripheral(
    adapter: &Adapter,
    query: &str,
) -> Result<Peripheral, InteractionError> {
    loop {
        for peripheral in adapter.peripherals().await? {
            let Some(properties) = peripheral.properties().await? else {
                continue;
            };

            let address_matches = peripheral.id().to_string().eq_ignore_ascii_case(query);
            let name_matches = properties
                .local_name
                .as_deref()
                .is_some_and(|name| name.starts_with(query));
            if address_matches || name_matches {
                return Ok(peripheral);
            }
        }

        sleep(SCAN_POLL_INTERVAL).await;
    }
}

fn find_characteristic(
    peripheral: &Peripheral,
    endpoint: EndpointId,
) -> Result<Characteristic, InteractionError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|characteristic| {
            characteristic
                .uuid
                .to_string()
                .eq_ignore_ascii_case(endpoint.uuid())
        })
        .ok_or(InteractionError::MissingEndpoint { endpoint })
}

fn advertisement_from_event(event: CentralEvent) -> Option<Advertisement> {
    match event {
        CentralEvent::ServiceDataAdvertisement { id, service_data } => {
            let payload = [SCAN_SERVICE_DATA_UUID, SCAN_SERVICE_DATA_UUID_LEGACY]
                .into_iter()
                .find_map(|expected| {
                    service_data.iter().find_map(|(uuid, payload)| {
                        uuid.to_string()
                            .eq_ignore_ascii_case(expected)
                            .then(|| payload.clone())
                    })
                })?;
            Some(
                Advertisement::builder()
                    .address(id.to_string())
                    .service_data(payload)
                    .build(),
            )
        }
        CentralEvent::ManufacturerDataAdvertisement {
            id,
            manufacturer_data,
        } => {
            let payload = manufacturer_data.into_values().next()?;
            Some(
                Advertisement::builder()
                    .address(id.to_string())
                    .manufacturer_data(payload)
                    .build(),
            )
        }
        _ => None,
    }
}

/// Active command link bound to a real peripheral.
#[derive(Debug)]
struct RealDeviceLink {
    peripheral: Peripheral,
    write_characteristic: Characteristic,
    notify_characteristic: Characteristic,
}

#[async_trait::async_trait]
impl DeviceLink for RealDeviceLink {
    #[instrument(skip(self, payload), level = "trace", fields(payload_len = payload.len()))]
    async fn write_command(&self, payload: &[u8]) -> Result<(), InteractionError> {
        self.peripheral
            .write(&self.write_characteristic, payload, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<NotificationStream, InteractionError> {
        self.peripheral.subscribe(&self.notify_characteristic).await?;
        let notifications = self.peripheral.notifications().await?;

        let expected = self.notify_characteristic.uuid;
        let stream = notifications
            .filter_map(move |notification| (notification.uuid == expected).then_some(notification.value));
        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), level = "debug")]
    async fn close(self: Box<Self>) -> Result<(), InteractionError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}
