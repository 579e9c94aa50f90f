//! Native BLE transport on btleplug.
//!
//! Locates the configured device through the adapter's event stream,
//! connects, discovers services and caches characteristics by UUID.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, ValueNotification, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{Stream, StreamExt};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::address::DeviceAddress;
use crate::ble::handles::{handle_for_uuid, CharacteristicHandle};
use crate::ble::transport::{Notification, Transport};
use crate::error::TransportError;
use crate::protocol::RawPayload;

type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// [`Transport`] backed by the platform Bluetooth stack.
pub struct NativeTransport {
    /// The adapter used for scanning and connecting.
    adapter: Adapter,
    /// The connected peripheral.
    peripheral: Option<Peripheral>,
    /// Cached characteristics by UUID.
    characteristics: HashMap<Uuid, Characteristic>,
    /// Notification stream, opened on first subscribe.
    notifications: Option<NotificationStream>,
    /// Whether a scan started by `connect` may still be running.
    scanning: bool,
}

impl NativeTransport {
    /// Open the Bluetooth adapter.
    ///
    /// `adapter_name` selects an adapter whose info string starts with the
    /// given text (for example `hci1`); `None` takes the first adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(adapter_name: Option<&str>) -> Result<Self, TransportError> {
        let manager = Manager::new()
            .await
            .map_err(|_e| TransportError::BluetoothUnavailable)?;

        let mut selected = None;
        for adapter in manager.adapters().await? {
            let adapter_info = adapter.adapter_info().await.unwrap_or_default();
            if adapter_name.map_or(true, |name| adapter_info.starts_with(name)) {
                info!("Using Bluetooth adapter: {}", adapter_info);
                selected = Some(adapter);
                break;
            }
        }

        let adapter = selected.ok_or(TransportError::BluetoothUnavailable)?;

        Ok(Self::with_adapter(adapter))
    }

    /// Create a transport on a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            peripheral: None,
            characteristics: HashMap::new(),
            notifications: None,
            scanning: false,
        }
    }

    fn peripheral(&self) -> Result<&Peripheral, TransportError> {
        self.peripheral.as_ref().ok_or(TransportError::NotConnected)
    }

    fn characteristic(&self, uuid: &Uuid) -> Result<Characteristic, TransportError> {
        self.characteristics
            .get(uuid)
            .cloned()
            .ok_or_else(|| TransportError::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Wait until the adapter reports a peripheral with `address`.
    ///
    /// Runs until found; the driver bounds the wait.
    async fn find_peripheral(&mut self, address: &DeviceAddress) -> Result<Peripheral, TransportError> {
        let target = BDAddr::from(*address);

        if let Some(peripheral) = self
            .adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| p.address() == target)
        {
            debug!("{} already known to the adapter", address);
            return Ok(peripheral);
        }

        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        self.scanning = true;
        debug!("Scanning for {}", address);

        while let Some(event) = events.next().await {
            if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event {
                let peripheral = self.adapter.peripheral(&id).await?;
                if peripheral.address() == target {
                    self.stop_scan().await;
                    return Ok(peripheral);
                }
            }
        }

        self.stop_scan().await;
        Err(TransportError::DeviceNotFound {
            address: address.to_string(),
        })
    }

    async fn stop_scan(&mut self) {
        if !self.scanning {
            return;
        }
        self.scanning = false;
        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
    }

    async fn read_uuid(&mut self, uuid: &Uuid) -> Result<RawPayload, TransportError> {
        let characteristic = self.characteristic(uuid)?;
        let data = self.peripheral()?.read(&characteristic).await?;

        trace!("Read {} bytes from characteristic {}", data.len(), uuid);

        Ok(RawPayload::from(data))
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), TransportError> {
        let peripheral = self.find_peripheral(address).await?;

        self.characteristics.clear();

        if !peripheral.is_connected().await.unwrap_or(false) {
            peripheral.connect().await?;
        }
        info!("Connected to {}", address);

        // The link is up: `disconnect` must reach it even if discovery fails
        // or this future is dropped by the driver's timeout.
        self.peripheral = Some(peripheral.clone());

        peripheral.discover_services().await?;

        for service in peripheral.services() {
            for characteristic in service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                self.characteristics.insert(characteristic.uuid, characteristic);
            }
        }
        debug!("Discovered {} characteristics", self.characteristics.len());

        Ok(())
    }

    async fn read_characteristic(
        &mut self,
        target: &CharacteristicHandle,
    ) -> Result<RawPayload, TransportError> {
        self.read_uuid(&target.uuid()).await
    }

    async fn read_by_uuid(&mut self, uuid: Uuid) -> Result<RawPayload, TransportError> {
        self.read_uuid(&uuid).await
    }

    async fn write_characteristic(
        &mut self,
        target: &CharacteristicHandle,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let characteristic = self.characteristic(&target.uuid())?;

        let write_type = if characteristic.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral()?
            .write(&characteristic, data, write_type)
            .await?;

        trace!("Wrote {} bytes to characteristic {}", data.len(), target);

        Ok(())
    }

    async fn subscribe(&mut self, target: &CharacteristicHandle) -> Result<(), TransportError> {
        let characteristic = self.characteristic(&target.uuid())?;
        let peripheral = self.peripheral()?.clone();

        if self.notifications.is_none() {
            self.notifications = Some(peripheral.notifications().await?);
        }

        peripheral.subscribe(&characteristic).await?;

        debug!("Subscribed to notifications from {}", target);

        Ok(())
    }

    async fn next_notification(&mut self) -> Option<Notification> {
        let notification = self.notifications.as_mut()?.next().await?;

        trace!(
            "Notification from {}: {:02X?}",
            notification.uuid,
            notification.value
        );

        Some(Notification {
            handle: handle_for_uuid(&notification.uuid).map(|h| h.handle()),
            uuid: Some(notification.uuid),
            payload: RawPayload::from(notification.value),
        })
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.stop_scan().await;
        self.notifications = None;
        self.characteristics.clear();

        match self.peripheral.take() {
            Some(peripheral) => {
                peripheral.disconnect().await?;
                info!("Disconnected from {}", peripheral.address());
                Ok(())
            }
            None => Ok(()),
        }
    }
}
