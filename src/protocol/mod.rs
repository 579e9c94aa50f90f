//! Protocol module for decoding sensor payloads.
//!
//! This module contains the implementations for:
//! - Raw payload handling and hex transport text
//! - Battery, measurement and text decoding
//! - Derived humidity quantities

pub mod decoder;
pub mod payload;
pub mod psychrometrics;

pub use decoder::{decode_battery, decode_measurement, decode_text};
pub use payload::RawPayload;
pub use psychrometrics::{derive_quantities, DerivedQuantities};
