//! Session result rendering.

use crate::data::{BatteryLevel, DeviceInfo, Measurement};

/// Everything one session read from the sensor.
///
/// Sections that were not requested stay `None` and are left out of both
/// the text and the JSON rendering.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    /// Device identification.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub info: Option<DeviceInfo>,
    /// Battery charge.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub battery: Option<BatteryLevel>,
    /// Temperature/humidity sample.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub measurement: Option<Measurement>,
}

impl Report {
    /// Whether nothing was read.
    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.battery.is_none() && self.measurement.is_none()
    }

    /// Render as pretty printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sections = Vec::new();

        if let Some(ref info) = self.info {
            sections.push(info.to_string());
        }
        if let Some(battery) = self.battery {
            sections.push(format!("Battery-Level:  {}", battery));
        }
        if let Some(ref measurement) = self.measurement {
            sections.push(measurement.to_string());
        }

        write!(f, "{}", sections.join("\n\n"))
    }
}
