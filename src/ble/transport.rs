//! The transport boundary.
//!
//! A [`Transport`] is the black box the driver talks to: it can connect to
//! one device, read and write characteristics, and deliver notifications
//! in arrival order. Two backends ship with the crate:
//! [`NativeTransport`](crate::ble::NativeTransport) on btleplug and
//! [`GattToolTransport`](crate::ble::GattToolTransport) driving `gatttool -I`.
//!
//! Implementations never apply timeouts themselves; the driver bounds every
//! call.

use async_trait::async_trait;
use uuid::Uuid;

use crate::ble::address::DeviceAddress;
use crate::ble::handles::CharacteristicHandle;
use crate::error::TransportError;
use crate::protocol::RawPayload;

/// Notification event from a characteristic.
///
/// Backends tag notifications with whatever they know: text transports
/// report the attribute handle, UUID based stacks the characteristic UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Attribute handle of the notifying characteristic, if known.
    pub handle: Option<u16>,
    /// UUID of the notifying characteristic, if known.
    pub uuid: Option<Uuid>,
    /// The notification data.
    pub payload: RawPayload,
}

/// Capability to exchange GATT operations with a single device.
///
/// Calls are issued strictly one at a time by the driver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Connect to the device and wait for the acknowledgment.
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), TransportError>;

    /// Read a characteristic by handle.
    async fn read_characteristic(
        &mut self,
        target: &CharacteristicHandle,
    ) -> Result<RawPayload, TransportError>;

    /// Read a characteristic by UUID.
    async fn read_by_uuid(&mut self, uuid: Uuid) -> Result<RawPayload, TransportError>;

    /// Write to a characteristic and wait for the write acknowledgment.
    async fn write_characteristic(
        &mut self,
        target: &CharacteristicHandle,
        data: &[u8],
    ) -> Result<(), TransportError>;

    /// Make sure notifications from `target` will be delivered.
    async fn subscribe(&mut self, target: &CharacteristicHandle) -> Result<(), TransportError>;

    /// Wait for the next notification.
    ///
    /// Returns `None` once the event stream has ended.
    async fn next_notification(&mut self) -> Option<Notification>;

    /// Disconnect from the device and release the transport.
    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
