//! Device information read from the standard GATT characteristics.

/// Identification strings of the connected sensor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Bluetooth address of the device.
    #[cfg_attr(feature = "serde", serde(rename = "mac"))]
    pub address: String,
    /// GAP device name.
    pub name: String,
    /// Manufacturer name string.
    pub manufacturer: String,
    /// Model number string.
    pub model: String,
    /// Hardware revision string.
    pub hardware: String,
    /// Firmware revision string.
    pub firmware: String,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MAC-Address:    {}", self.address)?;
        writeln!(f, "Devicename:     {}", self.name)?;
        writeln!(f, "Manufacturer:   {}", self.manufacturer)?;
        writeln!(f, "Model:          {}", self.model)?;
        writeln!(f, "Hardware-Rev.:  {}", self.hardware)?;
        write!(f, "Firmware-Rev.:  {}", self.firmware)
    }
}
