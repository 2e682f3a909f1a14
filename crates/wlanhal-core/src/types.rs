//! Core types for the WLAN HAL
//!
//! This module defines the fundamental types used throughout the HAL, using
//! newtype patterns for semantic validation and type safety.

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::errors::HalError;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Maximum interface name length in bytes (kernel IFNAMSIZ convention)
pub const IFNAME_MAX_LEN: usize = 16;

/// Length of an Ethernet MAC address
pub const MAC_LEN: usize = 6;

/// Number of interface roles an interface can advertise support for
pub const IFACE_TYPE_COUNT: usize = 11;

/// Number of radio bands a frequency query may address
pub const BAND_COUNT: i32 = 2;

/// Largest number of channels any supported band reports
pub const MAX_CHANNEL_COUNT: usize = 14;

/// Largest number of stations an AP tracks associations for
pub const MAX_ASSOC_STA_COUNT: usize = 8;

/// Largest interface inventory a driver may report
pub const MAX_IFACE_COUNT: usize = 8;

// ----------------------------------------------------------------------------
// Interface Name
// ----------------------------------------------------------------------------

/// Validated network interface name: 1..=16 bytes, no interior NUL
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IfaceName(String);

impl IfaceName {
    /// Create a validated interface name
    pub fn new<T: Into<String>>(name: T) -> Result<Self, HalError> {
        let name = name.into();
        if name.is_empty() {
            return Err(HalError::invalid_param("interface name is empty"));
        }
        if name.len() > IFNAME_MAX_LEN {
            return Err(HalError::invalid_param(format!(
                "interface name {name:?} exceeds {IFNAME_MAX_LEN} bytes"
            )));
        }
        if name.bytes().any(|b| b == 0) {
            return Err(HalError::invalid_param("interface name contains NUL"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IfaceName {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Deref for IfaceName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ----------------------------------------------------------------------------
// MAC Address
// ----------------------------------------------------------------------------

/// Ethernet MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddr([u8; MAC_LEN]);

impl MacAddr {
    /// Create a MAC address from 6 bytes
    pub fn new(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a MAC address from a slice, failing on any other length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HalError> {
        let octets: [u8; MAC_LEN] = bytes.try_into().map_err(|_| {
            HalError::invalid_param(format!("MAC address must be {MAC_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(octets))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    /// The all-zero address, used by drivers for "unset"
    pub const ZERO: Self = Self([0u8; MAC_LEN]);
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.replace(':', ""))
            .map_err(|_| HalError::invalid_param("invalid hex in MAC address"))?;
        Self::from_bytes(&bytes)
    }
}

impl Deref for MacAddr {
    type Target = [u8; MAC_LEN];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ----------------------------------------------------------------------------
// Interface Role
// ----------------------------------------------------------------------------

/// Logical role a network interface can serve
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IfaceType {
    Unspecified = 0,
    AdHoc = 1,
    Station = 2,
    Ap = 3,
    ApVlan = 4,
    Wds = 5,
    Monitor = 6,
    Mesh = 7,
    P2pClient = 8,
    P2pGo = 9,
    P2pDevice = 10,
}

impl IfaceType {
    /// All roles in numeric order
    pub const ALL: [IfaceType; IFACE_TYPE_COUNT] = [
        IfaceType::Unspecified,
        IfaceType::AdHoc,
        IfaceType::Station,
        IfaceType::Ap,
        IfaceType::ApVlan,
        IfaceType::Wds,
        IfaceType::Monitor,
        IfaceType::Mesh,
        IfaceType::P2pClient,
        IfaceType::P2pGo,
        IfaceType::P2pDevice,
    ];

    pub fn from_u8(value: u8) -> Result<Self, HalError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| HalError::invalid_param(format!("unknown interface role {value}")))
    }

    pub fn from_i32(value: i32) -> Result<Self, HalError> {
        u8::try_from(value)
            .map_err(|_| HalError::invalid_param(format!("unknown interface role {value}")))
            .and_then(Self::from_u8)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for IfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IfaceType::Unspecified => "unspecified",
            IfaceType::AdHoc => "adhoc",
            IfaceType::Station => "station",
            IfaceType::Ap => "ap",
            IfaceType::ApVlan => "ap-vlan",
            IfaceType::Wds => "wds",
            IfaceType::Monitor => "monitor",
            IfaceType::Mesh => "mesh",
            IfaceType::P2pClient => "p2p-client",
            IfaceType::P2pGo => "p2p-go",
            IfaceType::P2pDevice => "p2p-device",
        };
        f.write_str(name)
    }
}

// ----------------------------------------------------------------------------
// Client Identity
// ----------------------------------------------------------------------------

/// Numeric identity of an IPC caller (process-uid analog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(u32);

impl ClientId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Discovery Records
// ----------------------------------------------------------------------------

/// One interface in the driver's discovery report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: IfaceName,
    /// Support flag per role, indexed by `IfaceType as u8`
    pub support_modes: [bool; IFACE_TYPE_COUNT],
}

impl InterfaceInfo {
    /// Create a record supporting exactly the given roles
    pub fn with_modes(name: IfaceName, modes: &[IfaceType]) -> Self {
        let mut support_modes = [false; IFACE_TYPE_COUNT];
        for mode in modes {
            support_modes[mode.as_u8() as usize] = true;
        }
        Self {
            name,
            support_modes,
        }
    }

    pub fn supports(&self, mode: IfaceType) -> bool {
        self.support_modes[mode.as_u8() as usize]
    }
}

/// Kernel-side description of one network device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDeviceInfo {
    pub index: u32,
    pub if_name: IfaceName,
    pub iface_type: u8,
    pub mac: MacAddr,
}

// ----------------------------------------------------------------------------
// Scan Request
// ----------------------------------------------------------------------------

/// Parameters of a station scan request. The HAL forwards these opaquely;
/// only their wire shape matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Target BSSID, or none for a broadcast scan
    pub bssid: Option<MacAddr>,
    pub ssids: Vec<String>,
    pub extra_ies: Vec<u8>,
    pub freqs: Vec<i32>,
    pub prefix_ssid_scan: bool,
    pub fast_connect: bool,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iface_name_validation() {
        assert!(IfaceName::new("wlan0").is_ok());
        assert!(IfaceName::new("").is_err());
        assert!(IfaceName::new("a".repeat(IFNAME_MAX_LEN)).is_ok());
        assert!(IfaceName::new("a".repeat(IFNAME_MAX_LEN + 1)).is_err());
        assert!(IfaceName::new("wl\0an").is_err());
    }

    #[test]
    fn test_mac_addr_roundtrip() {
        let mac = MacAddr::new([0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "aa:bb:cc:00:11:22");
        assert_eq!("aa:bb:cc:00:11:22".parse::<MacAddr>().unwrap(), mac);
        assert!(MacAddr::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_iface_type_conversion() {
        assert_eq!(IfaceType::from_u8(2).unwrap(), IfaceType::Station);
        assert_eq!(IfaceType::from_u8(3).unwrap(), IfaceType::Ap);
        assert_eq!(IfaceType::from_u8(10).unwrap(), IfaceType::P2pDevice);
        assert!(IfaceType::from_u8(11).is_err());
        assert!(IfaceType::from_i32(-1).is_err());
    }

    #[test]
    fn test_interface_info_modes() {
        let info = InterfaceInfo::with_modes(
            IfaceName::new("wlan0").unwrap(),
            &[IfaceType::Station, IfaceType::Ap],
        );
        assert!(info.supports(IfaceType::Station));
        assert!(info.supports(IfaceType::Ap));
        assert!(!info.supports(IfaceType::Monitor));
    }
}
