//! Battery level.

/// Battery charge in percent, as reported by the sensor.
///
/// The sensor reports a single unsigned byte. Values above 100 are kept
/// as reported; [`BatteryLevel::is_plausible`] flags them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// Create a battery level from a raw percentage.
    pub fn new(percent: u8) -> Self {
        Self(percent)
    }

    /// The percentage value.
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Whether the value is a valid percentage (0-100).
    pub fn is_plausible(&self) -> bool {
        self.0 <= 100
    }
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
