//! Device identity derived from the ESP32 factory MAC address.
//!
//! The id has the form `KR-XXYYZZ` (last 3 MAC bytes, uppercase hex).  It
//! is stable across reboots and is sent as `device_id` in every alert
//! payload.

use core::fmt::Write;

/// "KR-XXYYZZ" fits comfortably.
pub type DeviceIdString = heapless::String<16>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed, recognisable MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x6F, 0x28, 0x1A, 0x2B, 0x3C]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(id, "KR-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}
