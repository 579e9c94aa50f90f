// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # mijia-ht-ble
//!
//! Read temperature, humidity and battery level from Xiaomi Mijia
//! Bluetooth LE temperature/humidity sensors.
//!
//! A query is one short session: connect, read the battery characteristic,
//! write the measurement request and wait for the `T=.. H=..` notification,
//! then disconnect. Dew point, absolute humidity and steam pressure are
//! derived from the sample.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mijia_ht_ble::{read_sensor, NativeTransport, Result, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = NativeTransport::new(None).await?;
//!     let address = "4C:65:A8:D0:0A:1F".parse()?;
//!
//!     let report = read_sensor(transport, address, SessionConfig::default()).await?;
//!
//!     if let Some(measurement) = report.measurement {
//!         println!("Temperature: {:.1}°C", measurement.temperature_c());
//!         println!("Humidity:    {:.1}%", measurement.rel_humidity());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Transports
//!
//! - [`NativeTransport`] uses the platform Bluetooth stack through btleplug.
//! - [`GattToolTransport`] drives BlueZ's `gatttool -I` and parses its output.
//!
//! Both implement [`Transport`]; anything else that does can be plugged in.
//!
//! ## Platform Notes
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### macOS
//! Requires Bluetooth permission.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization for data types and JSON reports
//! - `cli`: Build the `mijia-ht` command line tool (default)

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod session;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use ble::{DeviceAddress, GattToolTransport, NativeTransport, Notification, Transport};
pub use config::{ReadSelection, SessionConfig};
pub use data::{BatteryLevel, DeviceInfo, Measurement, Report};
pub use driver::{DeviceHandle, DriverState, TransportDriver};
pub use error::{ConnectError, DecodeError, Error, ReadError, Result, TransportError, WriteError};
pub use session::{read_sensor, Session};
pub use utils::celsius_to_fahrenheit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<NativeTransport>();
        let _ = std::any::TypeId::of::<Session<NativeTransport>>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<Report>();
        let _ = std::any::TypeId::of::<Measurement>();
        let _ = std::any::TypeId::of::<SessionConfig>();
    }

    #[test]
    fn test_temperature_conversion() {
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.001);
    }
}
