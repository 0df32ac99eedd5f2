//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces the BLE local name `PicoLight-XXYYZZ` (last 3 bytes of the
//! 6-byte MAC in uppercase hex).  The name is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - Distinct between units on the same bench
//! - Prefixed with the shared [`DEVICE_NAME_PREFIX`] so every compatible
//!   controller can filter scan results on it

use core::fmt::Write;

use crate::config::DEVICE_NAME_PREFIX;

/// `PicoLight-XXYYZZ` fits with room to spare.
pub type DeviceName = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Advertised local name for `mac`.
pub fn device_name(mac: &MacAddress) -> DeviceName {
    let mut name = DeviceName::new();
    // 16 bytes into a 24-byte buffer cannot overflow.
    let _ = write!(
        name,
        "{}-{:02X}{:02X}{:02X}",
        DEVICE_NAME_PREFIX, mac[3], mac[4], mac[5]
    );
    name
}
