//! One query session against a sensor.
//!
//! A session connects, reads what the [`ReadSelection`](crate::config::ReadSelection)
//! asks for, and always disconnects before returning. The result is either a
//! complete [`Report`] or an error; there are no partial reports.

use tracing::{debug, info, warn};

use crate::ble::{
    DeviceAddress, Transport, BATTERY_HANDLE, DEVICE_NAME_UUID, FIRMWARE_REVISION_UUID,
    HARDWARE_REVISION_UUID, MANUFACTURER_NAME_UUID, MEASUREMENT_COMMAND, MODEL_NUMBER_UUID,
    NOTIFICATION_HANDLE, REQUEST_HANDLE,
};
use crate::config::SessionConfig;
use crate::data::{BatteryLevel, DeviceInfo, Measurement, Report};
use crate::driver::{DeviceHandle, TransportDriver};
use crate::error::{Error, Result};
use crate::protocol::{decode_battery, decode_measurement, decode_text};

/// A query session on one transport.
pub struct Session<T> {
    driver: TransportDriver<T>,
    address: DeviceAddress,
    config: SessionConfig,
}

impl<T: Transport> Session<T> {
    /// Create a session for the device at `address`.
    pub fn new(transport: T, address: DeviceAddress, config: SessionConfig) -> Self {
        let driver = TransportDriver::new(transport, &config);
        Self {
            driver,
            address,
            config,
        }
    }

    /// Run the session.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Whatever happens after connecting, the
    /// device is disconnected before this returns.
    pub async fn run(&mut self) -> Result<Report> {
        let device = self.driver.connect(self.address).await?;

        let result = self.read_all(&device).await;
        self.driver.disconnect(device).await;

        match &result {
            Ok(_) => info!("Session with {} complete", self.address),
            Err(e) => debug!("Session with {} failed: {}", self.address, e),
        }
        result
    }

    /// Give back the transport.
    pub fn into_transport(self) -> T {
        self.driver.into_inner()
    }

    async fn read_all(&mut self, device: &DeviceHandle) -> Result<Report> {
        let reads = self.config.reads;
        let mut report = Report::default();

        if reads.info {
            report.info = Some(self.read_device_info(device).await?);
        }
        if reads.battery {
            report.battery = Some(self.read_battery(device).await?);
        }
        if reads.measurement {
            report.measurement = Some(self.read_measurement(device).await?);
        }

        Ok(report)
    }

    async fn read_device_info(&mut self, device: &DeviceHandle) -> Result<DeviceInfo> {
        let mut info = DeviceInfo {
            address: self.address.to_string(),
            ..Default::default()
        };

        for (uuid, field) in [
            (DEVICE_NAME_UUID, &mut info.name),
            (MANUFACTURER_NAME_UUID, &mut info.manufacturer),
            (MODEL_NUMBER_UUID, &mut info.model),
            (HARDWARE_REVISION_UUID, &mut info.hardware),
            (FIRMWARE_REVISION_UUID, &mut info.firmware),
        ] {
            let payload = self.driver.read_by_uuid(device, uuid).await?;
            *field = decode_text(&payload)?;
        }

        Ok(info)
    }

    async fn read_battery(&mut self, device: &DeviceHandle) -> Result<BatteryLevel> {
        let payload = self
            .driver
            .read_characteristic(device, &BATTERY_HANDLE)
            .await?;
        Ok(decode_battery(&payload)?)
    }

    async fn read_measurement(&mut self, device: &DeviceHandle) -> Result<Measurement> {
        let payload = self
            .driver
            .write_and_await_notification(
                device,
                &REQUEST_HANDLE,
                &MEASUREMENT_COMMAND,
                &NOTIFICATION_HANDLE,
            )
            .await?;

        if payload.is_empty() {
            return Err(Error::NotificationTimeout {
                timeout: self.driver.timeout(),
            });
        }

        decode_measurement(&payload).map_err(|e| {
            warn!("Undecodable measurement payload: {}", payload);
            Error::from(e)
        })
    }
}

/// Run a complete session on `transport` and return the report.
///
/// # Example
///
/// ```rust,no_run
/// use mijia_ht_ble::{read_sensor, NativeTransport, SessionConfig};
///
/// # async fn example() -> mijia_ht_ble::Result<()> {
/// let transport = NativeTransport::new(None).await?;
/// let address = "4C:65:A8:D0:0A:1F".parse()?;
/// let report = read_sensor(transport, address, SessionConfig::default()).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn read_sensor<T: Transport>(
    transport: T,
    address: DeviceAddress,
    config: SessionConfig,
) -> Result<Report> {
    Session::new(transport, address, config).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadSelection;
    use crate::error::{ConnectError, DecodeError, ReadError};
    use crate::testing::ScriptedTransport;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn address() -> DeviceAddress {
        "4C:65:A8:D0:0A:1F".parse().unwrap()
    }

    fn measurement_transport(frame: &[u8]) -> ScriptedTransport {
        ScriptedTransport::new()
            .with_read(BATTERY_HANDLE, "34")
            .notify_after_write(NOTIFICATION_HANDLE.handle(), frame)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session() {
        let mut session = Session::new(
            measurement_transport(b"T=22.6 H=61.6\0"),
            address(),
            SessionConfig::default(),
        );

        let report = session.run().await.unwrap();

        assert_eq!(report.battery.map(|b| b.percent()), Some(52));
        let measurement = report.measurement.as_ref().unwrap();
        assert_eq!(measurement.temperature_c(), 22.6);
        assert_eq!(measurement.rel_humidity(), 61.6);
        assert_eq!(measurement.dew_point_c(), Some(14.8));
        assert!(report.info.is_none());

        let transport = session.into_transport();
        assert_eq!(
            transport.calls,
            vec![
                "connect",
                "read 0x0018",
                "subscribe 0x000e",
                "write 0x0010 0100",
                "disconnect",
            ]
        );
    }

    #[cfg(feature = "serde")]
    #[tokio::test(start_paused = true)]
    async fn test_full_session_json() {
        let report = read_sensor(
            measurement_transport(b"T=22.6 H=61.6\0"),
            address(),
            SessionConfig::default(),
        )
        .await
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["battery"], 52);
        assert_eq!(json["measurement"]["temperatureC"], 22.6);
        assert_eq!(json["measurement"]["relHumidity"], 61.6);
        assert!(json.get("info").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_device_times_out_and_disconnects() {
        let transport = ScriptedTransport::new().with_read(BATTERY_HANDLE, "34");
        let config = SessionConfig::default().with_timeout(Duration::from_secs(5));
        let mut session = Session::new(transport, address(), config);

        let result = session.run().await;

        match result {
            Err(Error::NotificationTimeout { timeout }) => {
                assert_eq!(timeout, Duration::from_secs(5))
            }
            other => panic!("expected notification timeout, got {:?}", other),
        }
        assert_eq!(session.into_transport().count("disconnect"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_is_decode_error() {
        let mut session = Session::new(
            measurement_transport(b"Z=bad"),
            address(),
            SessionConfig::default(),
        );

        let result = session.run().await;

        assert!(matches!(
            result,
            Err(Error::Decode(DecodeError::PatternNotFound { .. }))
        ));
        assert_eq!(session.into_transport().count("disconnect"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_has_no_report() {
        let mut session = Session::new(
            ScriptedTransport::new().rejecting_connect(),
            address(),
            SessionConfig::default(),
        );

        let result = session.run().await;

        assert!(matches!(
            result,
            Err(Error::Connect(ConnectError::Rejected { .. }))
        ));
        let transport = session.into_transport();
        assert_eq!(transport.calls, vec!["connect", "disconnect"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_battery_failure_stops_session() {
        // No scripted battery value: the read hangs until the timeout.
        let mut session = Session::new(
            ScriptedTransport::new(),
            address(),
            SessionConfig::default(),
        );

        let result = session.run().await;

        assert!(matches!(result, Err(Error::Read(ReadError::Timeout { .. }))));
        let transport = session.into_transport();
        assert_eq!(transport.count("disconnect"), 1);
        assert_eq!(transport.count("write 0x0010 0100"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_write_is_write_error() {
        let transport = ScriptedTransport::new()
            .with_read(BATTERY_HANDLE, "34")
            .rejecting_writes();
        let mut session = Session::new(transport, address(), SessionConfig::default());

        let result = session.run().await;

        assert!(matches!(result, Err(Error::Write(_))));
        assert_eq!(session.into_transport().count("disconnect"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_info_only() {
        let transport = ScriptedTransport::new()
            .with_text(DEVICE_NAME_UUID, "MJ_HT_V1\0")
            .with_text(MANUFACTURER_NAME_UUID, "Cleargrass Inc")
            .with_text(MODEL_NUMBER_UUID, "LYWSD02")
            .with_text(HARDWARE_REVISION_UUID, "1.0")
            .with_text(FIRMWARE_REVISION_UUID, "00.00.66");
        let config =
            SessionConfig::default().with_reads(ReadSelection::from_flags(true, false, false));
        let mut session = Session::new(transport, address(), config);

        let report = session.run().await.unwrap();

        let info = report.info.unwrap();
        assert_eq!(info.address, "4C:65:A8:D0:0A:1F");
        assert_eq!(info.name, "MJ_HT_V1");
        assert_eq!(info.manufacturer, "Cleargrass Inc");
        assert_eq!(info.firmware, "00.00.66");
        assert!(report.battery.is_none());
        assert!(report.measurement.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_left_to_the_caller_to_report() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = read_sensor(
            measurement_transport(b"Z=bad"),
            address(),
            SessionConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::Decode(_))));

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("failed"));
        assert!(!output.contains("ERROR"));
    }
}
