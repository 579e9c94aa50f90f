//! BLE communication module.
//!
//! This module provides the transport boundary and its two backends,
//! together with the addresses and characteristic handles of the sensor.

pub mod address;
pub mod gatttool;
pub mod handles;
pub mod native;
pub mod transport;

pub use address::DeviceAddress;
pub use gatttool::{GattToolEvent, GattToolTransport};
pub use handles::*;
pub use native::NativeTransport;
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{Notification, Transport};
