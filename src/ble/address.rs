//! Bluetooth device addresses.

use std::str::FromStr;

use crate::error::Error;

/// A Bluetooth device address (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    /// Create an address from its six bytes, most significant first.
    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// The address bytes, most significant first.
    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for DeviceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAddress {
            address: s.to_string(),
        };

        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');

        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(bytes))
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl From<DeviceAddress> for btleplug::api::BDAddr {
    fn from(address: DeviceAddress) -> Self {
        btleplug::api::BDAddr::from(address.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let address: DeviceAddress = "4c:65:a8:d0:0a:1f".parse().unwrap();
        assert_eq!(address.bytes(), [0x4c, 0x65, 0xa8, 0xd0, 0x0a, 0x1f]);
        assert_eq!(address.to_string(), "4C:65:A8:D0:0A:1F");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in [
            "",
            "4C:65:A8:D0:0A",
            "4C:65:A8:D0:0A:1F:00",
            "4C-65-A8-D0-0A-1F",
            "4C:65:A8:D0:0A:1",
            "4C:65:A8:D0:0A:ZZ",
            "+C:65:A8:D0:0A:1F",
        ] {
            assert!(
                matches!(
                    text.parse::<DeviceAddress>(),
                    Err(Error::InvalidAddress { .. })
                ),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_into_bdaddr() {
        let address = DeviceAddress::new([0x4c, 0x65, 0xa8, 0xd0, 0x0a, 0x1f]);
        let bd: btleplug::api::BDAddr = address.into();
        assert_eq!(bd.into_inner(), address.bytes());
    }
}
