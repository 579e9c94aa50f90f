//! GATT characteristic handles and UUIDs.
//!
//! Contains the attribute constants used to talk to the sensor. Handles are
//! fixed by the device's attribute table; the UUIDs name the same
//! characteristics for backends that address them by UUID.

use uuid::Uuid;

use crate::ble::transport::Notification;

/// A GATT characteristic identified by its attribute handle and UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicHandle {
    name: &'static str,
    handle: u16,
    uuid: Uuid,
}

impl CharacteristicHandle {
    /// Create a characteristic handle constant.
    pub const fn new(name: &'static str, handle: u16, uuid: Uuid) -> Self {
        Self { name, handle, uuid }
    }

    /// Human readable name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The 16-bit attribute handle.
    pub fn handle(&self) -> u16 {
        self.handle
    }

    /// The characteristic UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Check whether a notification originates from this characteristic.
    ///
    /// Handle-tagged notifications are matched by handle, UUID-tagged ones by UUID.
    pub fn matches(&self, notification: &Notification) -> bool {
        match (notification.handle, notification.uuid) {
            (Some(handle), _) => handle == self.handle,
            (None, Some(uuid)) => uuid == self.uuid,
            (None, None) => false,
        }
    }
}

impl std::fmt::Display for CharacteristicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:04x})", self.name, self.handle)
    }
}

// Sensor data (Xiaomi custom)
/// Request handle: writing [`MEASUREMENT_COMMAND`] here triggers a measurement.
pub const REQUEST_HANDLE: CharacteristicHandle = CharacteristicHandle::new(
    "measurement request",
    0x0010,
    Uuid::from_u128(0x226c_bb55_6476_4566_7562_66734470666d),
);
/// Notification handle carrying the `T=.. H=..` frame.
pub const NOTIFICATION_HANDLE: CharacteristicHandle = CharacteristicHandle::new(
    "measurement data",
    0x000e,
    Uuid::from_u128(0x226c_aa55_6476_4566_7562_66734470666d),
);
/// Payload written to [`REQUEST_HANDLE`] to request one measurement.
pub const MEASUREMENT_COMMAND: [u8; 2] = [0x01, 0x00];

// Battery Service (Standard BLE)
/// Battery Level characteristic.
pub const BATTERY_HANDLE: CharacteristicHandle = CharacteristicHandle::new(
    "battery level",
    0x0018,
    Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb),
);

// Device Information (Standard BLE), read by UUID
/// GAP Device Name characteristic UUID.
pub const DEVICE_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a00_0000_1000_8000_00805f9b34fb);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_00805f9b34fb);
/// Model Number characteristic UUID.
pub const MODEL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a24_0000_1000_8000_00805f9b34fb);
/// Hardware Revision characteristic UUID.
pub const HARDWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a27_0000_1000_8000_00805f9b34fb);
/// Firmware Revision characteristic UUID.
pub const FIRMWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a26_0000_1000_8000_00805f9b34fb);

const KNOWN_HANDLES: [CharacteristicHandle; 3] = [REQUEST_HANDLE, NOTIFICATION_HANDLE, BATTERY_HANDLE];

/// Find the handle constant for a characteristic UUID.
pub fn handle_for_uuid(uuid: &Uuid) -> Option<CharacteristicHandle> {
    KNOWN_HANDLES.iter().find(|h| h.uuid == *uuid).copied()
}
