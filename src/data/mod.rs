//! Data structures for sensor readings.
//!
//! This module contains the typed values produced by a session:
//! battery level, measurement sample, device information, and the
//! report that bundles them.

pub mod battery;
pub mod device_info;
pub mod measurement;
pub mod report;

pub use battery::BatteryLevel;
pub use device_info::DeviceInfo;
pub use measurement::Measurement;
pub use report::Report;
