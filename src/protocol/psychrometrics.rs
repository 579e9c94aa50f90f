//! Derived humidity quantities.
//!
//! Uses the Magnus-type approximation
//! `es = 6.1 * 10^(7.45 t / (235 + t))` hPa for the saturation vapour
//! pressure over water, which is what the sensor vendor's tooling reports.
//! Results carry one decimal place: absolute humidity is rounded, dew point
//! and steam pressure are truncated towards zero.

use crate::utils::{round_to_tenth, truncate_to_tenth};

/// Base saturation vapour pressure at 0°C in hPa (mbar).
const SATURATION_BASE_HPA: f64 = 6.1;
/// Magnus coefficient `a`.
const MAGNUS_A: f64 = 7.45;
/// Magnus coefficient `b` in °C.
const MAGNUS_B: f64 = 235.0;
/// Absolute humidity factor in g·K/(hPa·m³).
const ABS_HUMIDITY_FACTOR: f64 = 216.7;
/// 0°C in Kelvin.
const KELVIN_OFFSET: f64 = 273.15;

/// Quantities computed from temperature and relative humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedQuantities {
    /// Dew point in °C. `None` when the vapour pressure is zero (0 %RH).
    pub dew_point_c: Option<f64>,
    /// Absolute humidity in g/m³.
    pub abs_humidity_g_m3: f64,
    /// Partial water vapour pressure in mbar.
    pub steam_pressure_mbar: f64,
}

/// Saturation vapour pressure in hPa at `temperature_c`.
pub fn saturation_vapour_pressure(temperature_c: f64) -> f64 {
    let exponent = (MAGNUS_A * temperature_c) / (MAGNUS_B + temperature_c);
    SATURATION_BASE_HPA * 10f64.powf(exponent)
}

/// Compute dew point, absolute humidity and steam pressure.
///
/// # Example
///
/// ```
/// use mijia_ht_ble::protocol::derive_quantities;
///
/// let derived = derive_quantities(22.6, 61.6);
/// assert_eq!(derived.dew_point_c, Some(14.8));
/// ```
pub fn derive_quantities(temperature_c: f64, rel_humidity: f64) -> DerivedQuantities {
    let vapour_pressure = saturation_vapour_pressure(temperature_c) * rel_humidity / 100.0;

    let abs_humidity =
        (ABS_HUMIDITY_FACTOR * vapour_pressure) / (KELVIN_OFFSET + temperature_c);

    let dew_point_c = if vapour_pressure > 0.0 {
        let z = (vapour_pressure / SATURATION_BASE_HPA).log10();
        Some(truncate_to_tenth((MAGNUS_B * z) / (MAGNUS_A - z)))
    } else {
        None
    };

    DerivedQuantities {
        dew_point_c,
        abs_humidity_g_m3: round_to_tenth(abs_humidity),
        steam_pressure_mbar: truncate_to_tenth(vapour_pressure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_saturation_at_zero() {
        assert!((saturation_vapour_pressure(0.0) - 6.1).abs() < 1e-9);
    }

    #[test]
    fn test_reference_reading() {
        let derived = derive_quantities(22.6, 61.6);
        assert_eq!(derived.dew_point_c, Some(14.8));
        assert!((derived.abs_humidity_g_m3 - 12.4).abs() < 1e-9);
        assert!((derived.steam_pressure_mbar - 16.9).abs() < 1e-9);
    }

    #[test]
    fn test_saturated_air_dew_point_equals_temperature() {
        let derived = derive_quantities(20.0, 100.0);
        let dew_point = derived.dew_point_c.unwrap();
        assert!((dew_point - 20.0).abs() < 0.15);
    }

    #[test]
    fn test_below_freezing() {
        let derived = derive_quantities(-10.0, 80.0);
        let dew_point = derived.dew_point_c.unwrap();
        assert!(dew_point < -10.0);
        assert!(derived.abs_humidity_g_m3 > 0.0);
    }

    #[test]
    fn test_zero_humidity_has_no_dew_point() {
        let derived = derive_quantities(21.0, 0.0);
        assert_eq!(derived.dew_point_c, None);
        assert_eq!(derived.abs_humidity_g_m3, 0.0);
        assert_eq!(derived.steam_pressure_mbar, 0.0);
    }

    proptest! {
        #[test]
        fn abs_humidity_monotonic_in_rel_humidity(
            t in -40.0f64..85.0,
            a in 0.0f64..=100.0,
            b in 0.0f64..=100.0,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let lower = derive_quantities(t, low);
            let upper = derive_quantities(t, high);
            prop_assert!(upper.abs_humidity_g_m3 >= lower.abs_humidity_g_m3);
            prop_assert!(upper.steam_pressure_mbar >= lower.steam_pressure_mbar);
        }

        #[test]
        fn dew_point_never_exceeds_temperature(
            t in -40.0f64..85.0,
            rh in 1.0f64..=100.0,
        ) {
            let dew_point = derive_quantities(t, rh).dew_point_c.unwrap();
            prop_assert!(dew_point < t + 0.11);
        }
    }
}
