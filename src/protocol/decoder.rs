//! Payload decoding.
//!
//! Pure conversions from [`RawPayload`] to typed values. Nothing here does I/O.
//!
//! The measurement notification carries an ASCII frame such as
//! `T=22.6 H=61.6\0`. Bytes around the frame are ignored as long as the
//! frame itself is intact.

use tracing::{trace, warn};

use crate::data::{BatteryLevel, Measurement};
use crate::error::DecodeError;
use crate::protocol::payload::RawPayload;

/// Decode the battery characteristic.
///
/// The value is a big-endian unsigned integer. Leading zero bytes are
/// allowed; anything that does not fit in one byte is rejected.
///
/// # Example
///
/// ```
/// use mijia_ht_ble::protocol::{decode_battery, RawPayload};
///
/// let payload = RawPayload::from_hex_str("34").unwrap();
/// assert_eq!(decode_battery(&payload).unwrap().percent(), 52);
/// ```
pub fn decode_battery(payload: &RawPayload) -> Result<BatteryLevel, DecodeError> {
    let bytes = payload.as_bytes();
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let significant: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
    let level = match significant.as_slice() {
        [] => BatteryLevel::new(0),
        [value] => BatteryLevel::new(*value),
        _ => {
            return Err(DecodeError::OutOfRange {
                field: "battery",
                value: bytes.iter().fold(0.0, |acc, &b| acc * 256.0 + b as f64),
            })
        }
    };

    if !level.is_plausible() {
        warn!("Battery level {} is above 100%", level.percent());
    }

    Ok(level)
}

/// Decode a measurement notification.
///
/// Finds the first `T=<number> H=<number>` frame in the payload text and
/// builds a [`Measurement`] from it.
///
/// # Errors
///
/// - [`DecodeError::Empty`] if the payload has no bytes
/// - [`DecodeError::PatternNotFound`] if no frame is present
/// - [`DecodeError::InvalidNumber`] if a captured number does not parse
/// - [`DecodeError::OutOfRange`] if the values are outside the sensor range
pub fn decode_measurement(payload: &RawPayload) -> Result<Measurement, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }

    let text = payload.to_text_lossy();
    trace!("Measurement payload text: {:?}", text);

    let (temperature, humidity) =
        find_frame(&text).ok_or_else(|| DecodeError::PatternNotFound {
            payload: text.clone(),
        })?;

    let temperature_c = parse_number("temperature", temperature)?;
    let rel_humidity = parse_number("humidity", humidity)?;

    Measurement::try_new(temperature_c, rel_humidity)
}

/// Decode a UTF-8 string characteristic, dropping trailing NULs.
pub fn decode_text(payload: &RawPayload) -> Result<String, DecodeError> {
    let text = std::str::from_utf8(payload.as_bytes()).map_err(|_| DecodeError::InvalidText)?;
    Ok(text.trim_end_matches('\0').to_string())
}

/// Locate the first `T=<number> H=<number>` frame, returning both number texts.
fn find_frame(text: &str) -> Option<(&str, &str)> {
    text.match_indices("T=").find_map(|(start, marker)| {
        let rest = &text[start + marker.len()..];
        let temperature = leading_number(rest);
        if temperature.is_empty() {
            return None;
        }

        let rest = rest[temperature.len()..].strip_prefix(" H=")?;
        let humidity = leading_number(rest);
        (!humidity.is_empty()).then_some((temperature, humidity))
    })
}

/// Longest prefix made of an optional `-` followed by digits and dots.
fn leading_number(text: &str) -> &str {
    let sign = usize::from(text.starts_with('-'));
    let digits = text[sign..]
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b'.')
        .count();

    if digits == 0 {
        ""
    } else {
        &text[..sign + digits]
    }
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, DecodeError> {
    text.parse::<f64>()
        .map_err(|_| DecodeError::InvalidNumber {
            field,
            text: text.to_string(),
        })
}
