//! Utility functions for the mijia-ht-ble crate.

/// Convert Celsius to Fahrenheit.
///
/// # Example
///
/// ```
/// use mijia_ht_ble::celsius_to_fahrenheit;
///
/// let fahrenheit = celsius_to_fahrenheit(100.0);
/// assert!((fahrenheit - 212.0).abs() < 0.001);
/// ```
#[inline]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round to one decimal place, halves away from zero.
#[inline]
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Truncate towards zero to one decimal place.
#[inline]
pub(crate) fn truncate_to_tenth(value: f64) -> f64 {
    (value * 10.0).trunc() / 10.0
}
