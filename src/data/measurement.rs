//! Measurement data structures.
//!
//! Contains the decoded temperature/humidity sample and the quantities
//! derived from it.

use std::ops::RangeInclusive;

use crate::error::DecodeError;
use crate::protocol::psychrometrics::derive_quantities;
use crate::utils::celsius_to_fahrenheit;

/// One temperature/humidity sample with derived quantities.
///
/// Created by decoding a single notification payload. Derived values are
/// computed once at construction and the sample cannot be modified afterwards.
///
/// With the `serde` feature the sample serializes to the documented
/// `measurement` object (`temperatureC`, `temperatureF`, `relHumidity`,
/// `absHumidity`, `dewPointC`, `dewPointF`, `steamPressure`). The dew point
/// keys are left out when the dew point is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Measurement {
    temperature_c: f64,
    temperature_f: f64,
    rel_humidity: f64,
    abs_humidity: f64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    dew_point_c: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    dew_point_f: Option<f64>,
    #[cfg_attr(feature = "serde", serde(rename = "steamPressure"))]
    steam_pressure_mbar: f64,
}

impl Measurement {
    /// Temperatures the sensor can report, in °C.
    pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -40.0..=85.0;

    /// Relative humidity range, in %.
    pub const HUMIDITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;

    /// Build a measurement, rejecting values the sensor cannot produce.
    pub fn try_new(temperature_c: f64, rel_humidity: f64) -> Result<Self, DecodeError> {
        if !Self::TEMPERATURE_RANGE.contains(&temperature_c) {
            return Err(DecodeError::OutOfRange {
                field: "temperature",
                value: temperature_c,
            });
        }
        if !Self::HUMIDITY_RANGE.contains(&rel_humidity) {
            return Err(DecodeError::OutOfRange {
                field: "humidity",
                value: rel_humidity,
            });
        }

        let derived = derive_quantities(temperature_c, rel_humidity);

        Ok(Self {
            temperature_c,
            temperature_f: celsius_to_fahrenheit(temperature_c),
            rel_humidity,
            abs_humidity: derived.abs_humidity_g_m3,
            dew_point_c: derived.dew_point_c,
            dew_point_f: derived.dew_point_c.map(celsius_to_fahrenheit),
            steam_pressure_mbar: derived.steam_pressure_mbar,
        })
    }

    /// Temperature in °C.
    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Temperature in °F.
    pub fn temperature_f(&self) -> f64 {
        self.temperature_f
    }

    /// Relative humidity in %.
    pub fn rel_humidity(&self) -> f64 {
        self.rel_humidity
    }

    /// Absolute humidity in g/m³.
    pub fn abs_humidity(&self) -> f64 {
        self.abs_humidity
    }

    /// Dew point in °C, `None` at 0 %RH.
    pub fn dew_point_c(&self) -> Option<f64> {
        self.dew_point_c
    }

    /// Dew point in °F, `None` at 0 %RH.
    pub fn dew_point_f(&self) -> Option<f64> {
        self.dew_point_f
    }

    /// Water vapour partial pressure in mbar.
    pub fn steam_pressure_mbar(&self) -> f64 {
        self.steam_pressure_mbar
    }
}

fn format_optional(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit),
        None => "n/a".to_string(),
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Temperature:    {:.1} °C", self.temperature_c)?;
        writeln!(f, "Dew point:      {}", format_optional(self.dew_point_c, "°C"))?;
        writeln!(f)?;
        writeln!(f, "Temperature:    {:.1} °F", self.temperature_f)?;
        writeln!(f, "Dew point:      {}", format_optional(self.dew_point_f, "°F"))?;
        writeln!(f)?;
        writeln!(f, "Rel. humidity:  {:.1} %", self.rel_humidity)?;
        writeln!(f, "Abs. humidity:  {:.1} g/m³", self.abs_humidity)?;
        write!(f, "Steam pressure: {:.1} mbar", self.steam_pressure_mbar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_try_new_computes_derived_values() {
        let m = Measurement::try_new(22.6, 61.6).unwrap();
        assert_eq!(m.temperature_c(), 22.6);
        assert_eq!(m.rel_humidity(), 61.6);
        assert_eq!(m.dew_point_c(), Some(14.8));
        assert!((m.temperature_f() - 72.68).abs() < 0.001);
        assert!((m.dew_point_f().unwrap() - 58.64).abs() < 0.001);
        assert!((m.abs_humidity() - 12.4).abs() < 1e-9);
        assert!((m.steam_pressure_mbar() - 16.9).abs() < 1e-9);
    }

    #[test]
    fn test_try_new_rejects_humidity_above_100() {
        assert_eq!(
            Measurement::try_new(20.0, 100.5),
            Err(DecodeError::OutOfRange {
                field: "humidity",
                value: 100.5
            })
        );
    }

    #[test]
    fn test_try_new_rejects_implausible_temperature() {
        assert!(Measurement::try_new(85.1, 50.0).is_err());
        assert!(Measurement::try_new(-40.5, 50.0).is_err());
        assert!(Measurement::try_new(-40.0, 50.0).is_ok());
    }

    #[test]
    fn test_display() {
        let m = Measurement::try_new(22.6, 61.6).unwrap();
        let expected = "\
Temperature:    22.6 °C
Dew point:      14.8 °C

Temperature:    72.7 °F
Dew point:      58.6 °F

Rel. humidity:  61.6 %
Abs. humidity:  12.4 g/m³
Steam pressure: 16.9 mbar";
        assert_eq!(m.to_string(), expected);
    }

    #[test]
    fn test_display_without_dew_point() {
        let m = Measurement::try_new(21.0, 0.0).unwrap();
        assert!(m.to_string().contains("Dew point:      n/a"));
    }
}
