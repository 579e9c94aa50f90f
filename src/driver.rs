//! Transport driver.
//!
//! Wraps a [`Transport`] and turns its unbounded calls into the bounded
//! operations a session needs: every wait is limited by the configured
//! timeout, reads and disconnects are followed by a short settle delay,
//! and any failure after connecting releases the transport.

use std::time::Duration;

use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::{CharacteristicHandle, DeviceAddress, Transport, BATTERY_HANDLE};
use crate::config::SessionConfig;
use crate::error::{ConnectError, ReadError, TransportError, WriteError};
use crate::protocol::RawPayload;

/// Where the driver is in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverState {
    /// No device is connected.
    #[default]
    Disconnected,
    /// Waiting for the connection acknowledgment.
    Connecting,
    /// Connected, nothing read yet.
    Connected,
    /// The battery characteristic has been read.
    BatteryRead,
    /// The measurement request was written, waiting for the notification.
    MeasurementRequested,
    /// The measurement notification arrived.
    MeasurementReceived,
}

impl DriverState {
    /// Check if a device is connected.
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Connecting)
    }
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::BatteryRead => write!(f, "Battery read"),
            Self::MeasurementRequested => write!(f, "Measurement requested"),
            Self::MeasurementReceived => write!(f, "Measurement received"),
        }
    }
}

/// Proof of an established connection.
///
/// Returned by [`TransportDriver::connect`] and consumed by
/// [`TransportDriver::disconnect`]. Not `Clone`: there is exactly one per
/// connection.
#[derive(Debug)]
pub struct DeviceHandle {
    address: DeviceAddress,
    connected_at: Instant,
}

impl DeviceHandle {
    /// Address of the connected device.
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Time since the connection was acknowledged.
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Bounded operations on one [`Transport`].
pub struct TransportDriver<T> {
    transport: T,
    timeout: Duration,
    settle_delay: Duration,
    state: DriverState,
}

impl<T: Transport> TransportDriver<T> {
    /// Create a driver using the timing from `config`.
    pub fn new(transport: T, config: &SessionConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout,
            settle_delay: config.settle_delay,
            state: DriverState::Disconnected,
        }
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The operation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn set_state(&mut self, state: DriverState) {
        if self.state != state {
            debug!("Driver state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Connect to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Timeout`] when no acknowledgment arrives in
    /// time and [`ConnectError::Rejected`] when the transport reports a
    /// failure. The transport is released in both cases.
    pub async fn connect(&mut self, address: DeviceAddress) -> Result<DeviceHandle, ConnectError> {
        if self.state != DriverState::Disconnected {
            return Err(ConnectError::Rejected {
                address: address.to_string(),
                reason: format!("driver is {}", self.state),
            });
        }

        info!("Connecting to {}", address);
        self.set_state(DriverState::Connecting);

        match timeout(self.timeout, self.transport.connect(&address)).await {
            Ok(Ok(())) => {
                self.set_state(DriverState::Connected);
                Ok(DeviceHandle {
                    address,
                    connected_at: Instant::now(),
                })
            }
            Ok(Err(e)) => {
                warn!("Connection to {} failed: {}", address, e);
                self.release().await;
                Err(ConnectError::Rejected {
                    address: address.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!("Connection to {} timed out", address);
                self.release().await;
                Err(ConnectError::Timeout {
                    address: address.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    /// Read a characteristic by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the read fails or times out. The transport
    /// is released on failure.
    pub async fn read_characteristic(
        &mut self,
        device: &DeviceHandle,
        target: &CharacteristicHandle,
    ) -> Result<RawPayload, ReadError> {
        self.ensure_readable(target.to_string())?;
        trace!("Reading {} from {}", target, device.address());

        let result = timeout(self.timeout, self.transport.read_characteristic(target)).await;
        let payload = self.finish_read(target.to_string(), result).await?;

        if *target == BATTERY_HANDLE {
            self.set_state(DriverState::BatteryRead);
        }
        Ok(payload)
    }

    /// Read a characteristic by UUID.
    ///
    /// # Errors
    ///
    /// Same as [`read_characteristic`](Self::read_characteristic).
    pub async fn read_by_uuid(
        &mut self,
        device: &DeviceHandle,
        uuid: Uuid,
    ) -> Result<RawPayload, ReadError> {
        self.ensure_readable(uuid.to_string())?;
        trace!("Reading {} from {}", uuid, device.address());

        let result = timeout(self.timeout, self.transport.read_by_uuid(uuid)).await;
        self.finish_read(uuid.to_string(), result).await
    }

    fn ensure_readable(&self, target: String) -> Result<(), ReadError> {
        if self.state.is_connected() {
            Ok(())
        } else {
            Err(ReadError::NotAcknowledged {
                target,
                reason: "device not connected".to_string(),
            })
        }
    }

    async fn finish_read(
        &mut self,
        target: String,
        result: Result<Result<RawPayload, TransportError>, tokio::time::error::Elapsed>,
    ) -> Result<RawPayload, ReadError> {
        match result {
            Ok(Ok(payload)) => {
                debug!("Read {}: {}", target, payload);
                sleep(self.settle_delay).await;
                Ok(payload)
            }
            Ok(Err(e)) => {
                self.release().await;
                Err(ReadError::NotAcknowledged {
                    target,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                self.release().await;
                Err(ReadError::Timeout {
                    target,
                    timeout: self.timeout,
                })
            }
        }
    }

    /// Write `command` to `target` and wait for a notification from `notify`.
    ///
    /// Notifications from other characteristics are discarded. When nothing
    /// arrives within the timeout an empty payload is returned; the caller
    /// decides whether that is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if subscribing or writing fails, or if the
    /// notification stream ends. The transport is released on failure.
    pub async fn write_and_await_notification(
        &mut self,
        device: &DeviceHandle,
        target: &CharacteristicHandle,
        command: &[u8],
        notify: &CharacteristicHandle,
    ) -> Result<RawPayload, WriteError> {
        if !self.state.is_connected() {
            return Err(WriteError::NotAcknowledged {
                target: target.to_string(),
                reason: "device not connected".to_string(),
            });
        }

        let subscribed = timeout(self.timeout, self.transport.subscribe(notify)).await;
        self.check_write(notify, subscribed).await?;

        trace!(
            "Writing {} to {} on {}",
            hex::encode(command),
            target,
            device.address()
        );
        let written = timeout(
            self.timeout,
            self.transport.write_characteristic(target, command),
        )
        .await;
        self.check_write(target, written).await?;
        self.set_state(DriverState::MeasurementRequested);

        let deadline = Instant::now() + self.timeout;
        loop {
            match timeout_at(deadline, self.transport.next_notification()).await {
                Ok(Some(notification)) if notify.matches(&notification) => {
                    debug!("Notification from {}: {}", notify, notification.payload);
                    self.set_state(DriverState::MeasurementReceived);
                    return Ok(notification.payload);
                }
                Ok(Some(notification)) => {
                    debug!(
                        "Discarding notification from {:?}/{:?}",
                        notification.handle, notification.uuid
                    );
                }
                Ok(None) => {
                    warn!("Notification stream ended while waiting on {}", notify);
                    self.release().await;
                    return Err(WriteError::ConnectionLost {
                        target: notify.to_string(),
                    });
                }
                Err(_) => {
                    warn!("No notification from {} within {:?}", notify, self.timeout);
                    return Ok(RawPayload::empty());
                }
            }
        }
    }

    async fn check_write(
        &mut self,
        target: &CharacteristicHandle,
        result: Result<Result<(), TransportError>, tokio::time::error::Elapsed>,
    ) -> Result<(), WriteError> {
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.release().await;
                Err(WriteError::NotAcknowledged {
                    target: target.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                self.release().await;
                Err(WriteError::Timeout {
                    target: target.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    /// Disconnect from the device.
    ///
    /// Best effort: errors are logged, never returned.
    pub async fn disconnect(&mut self, device: DeviceHandle) {
        if self.state == DriverState::Disconnected {
            debug!("{} already released", device.address());
            return;
        }

        self.release().await;
        info!(
            "Disconnected from {} after {:?}",
            device.address(),
            device.connected_for()
        );
        sleep(self.settle_delay).await;
    }

    async fn release(&mut self) {
        match timeout(self.timeout, self.transport.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Error while disconnecting: {}", e),
            Err(_) => warn!("Disconnect timed out after {:?}", self.timeout),
        }
        self.set_state(DriverState::Disconnected);
    }
}
