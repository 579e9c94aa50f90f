//! Error types for the mijia-ht-ble crate.

use std::time::Duration;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The device could not be connected.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A characteristic read failed.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// A characteristic write failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The device accepted the measurement request but never answered.
    #[error("Device did not respond within {timeout:?}")]
    NotificationTimeout {
        /// How long we waited for the notification.
        timeout: Duration,
    },

    /// A payload arrived but could not be decoded.
    #[error("Malformed sensor response: {0}")]
    Decode(#[from] DecodeError),

    /// The given text is not a valid device address.
    #[error("Invalid device address: {address}")]
    InvalidAddress {
        /// The rejected address text.
        address: String,
    },

    /// The transport failed outside of a driver operation.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to establish the connection. Always fatal for the session.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// No acknowledgment was observed before the timeout elapsed.
    #[error("Connection to {address} timed out after {timeout:?}")]
    Timeout {
        /// Address of the device.
        address: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The transport reported a connection failure.
    #[error("Connection to {address} failed: {reason}")]
    Rejected {
        /// Address of the device.
        address: String,
        /// Description of why the connection failed.
        reason: String,
    },
}

/// Failure of a direct characteristic read.
#[derive(Error, Debug)]
pub enum ReadError {
    /// No value was reported before the timeout elapsed.
    #[error("Read of {target} timed out after {timeout:?}")]
    Timeout {
        /// The characteristic that was read.
        target: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The transport rejected the read or never reported a value.
    #[error("Read of {target} not acknowledged: {reason}")]
    NotAcknowledged {
        /// The characteristic that was read.
        target: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Failure of a characteristic write or of the notification wait that follows it.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The write was not acknowledged before the timeout elapsed.
    #[error("Write to {target} timed out after {timeout:?}")]
    Timeout {
        /// The characteristic that was written.
        target: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The transport rejected the write.
    #[error("Write to {target} not acknowledged: {reason}")]
    NotAcknowledged {
        /// The characteristic that was written.
        target: String,
        /// Description of the failure.
        reason: String,
    },

    /// The notification stream ended while waiting for a response.
    #[error("Connection lost while waiting for notification on {target}")]
    ConnectionLost {
        /// The characteristic we were waiting on.
        target: String,
    },
}

/// A payload could not be converted into a typed value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The payload contained no bytes.
    #[error("Empty payload")]
    Empty,

    /// Transport text was not a sequence of hex byte pairs.
    #[error("Invalid hex payload: {input:?}")]
    InvalidHex {
        /// The offending text.
        input: String,
    },

    /// No `T=<number> H=<number>` frame was found.
    #[error("No temperature/humidity frame in {payload:?}")]
    PatternNotFound {
        /// The payload rendered as text, for diagnosis.
        payload: String,
    },

    /// A frame was found but one of its numbers does not parse.
    #[error("Invalid {field} value {text:?}")]
    InvalidNumber {
        /// Which field failed.
        field: &'static str,
        /// The captured text.
        text: String,
    },

    /// A decoded value is outside the range the sensor can report.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Which field failed.
        field: &'static str,
        /// The decoded value.
        value: f64,
    },

    /// A text characteristic was not valid UTF-8.
    #[error("Invalid UTF-8 text payload")]
    InvalidText,
}

/// Error reported by a [`Transport`](crate::ble::Transport) backend.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The device was not seen by the adapter.
    #[error("Device not found: {address}")]
    DeviceNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// Operation requires a connection but the device is not connected.
    #[error("Device not connected")]
    NotConnected,

    /// I/O error talking to the transport process.
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport answered with an error line.
    #[error("Transport error: {0}")]
    Rejected(String),

    /// The transport output ended.
    #[error("Transport closed")]
    Closed,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
