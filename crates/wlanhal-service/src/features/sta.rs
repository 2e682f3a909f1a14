//! Station feature operations

use wlanhal_core::driver::commands;
use wlanhal_core::errors::Result;
use wlanhal_core::types::{MacAddr, ScanSettings};

use super::base::check_mac_len;
use super::BaseFeature;

// ----------------------------------------------------------------------------
// STA Feature
// ----------------------------------------------------------------------------

/// Feature bound in the station role
#[derive(Clone)]
pub struct StaFeature {
    base: BaseFeature,
}

impl StaFeature {
    pub fn new(base: BaseFeature) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseFeature {
        &self.base
    }

    /// Program the randomized MAC used while scanning. `NotSupported` when
    /// the driver lacks the capability.
    pub fn set_scanning_mac_address(&self, mac: &[u8], declared_len: usize) -> Result<()> {
        check_mac_len(mac, declared_len)?;
        let mac = MacAddr::from_bytes(mac)?;
        commands::set_scan_mac_addr(self.base.driver(), self.base.if_name(), &mac)
    }

    /// Kick off a scan; completion arrives later as a ScanDone event.
    pub fn start_scan(&self, settings: &ScanSettings) -> Result<()> {
        commands::start_scan(self.base.driver(), self.base.if_name(), settings)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wlanhal_core::driver::{DriverCmd, FakeDriverClient};
    use wlanhal_core::errors::HalError;
    use wlanhal_core::types::{IfaceName, IfaceType, InterfaceInfo};

    fn sta() -> (Arc<FakeDriverClient>, StaFeature) {
        let driver = Arc::new(FakeDriverClient::with_interfaces(vec![
            InterfaceInfo::with_modes(IfaceName::new("wlan0").unwrap(), &[IfaceType::Station]),
        ]));
        let base = BaseFeature::new(
            IfaceName::new("wlan0").unwrap(),
            IfaceType::Station,
            driver.clone(),
        );
        (driver, StaFeature::new(base))
    }

    #[test]
    fn test_scan_mac_length_is_checked_first() {
        let (driver, feature) = sta();
        let mac = [1, 2, 3, 4, 5, 6];
        assert!(matches!(
            feature.set_scanning_mac_address(&mac, 5).unwrap_err(),
            HalError::InvalidParam { .. }
        ));
        assert!(feature.set_scanning_mac_address(&mac[..4], 4).is_err());
        assert_eq!(driver.call_count(DriverCmd::SetScanMacAddr), 0);

        feature.set_scanning_mac_address(&mac, 6).unwrap();
        assert_eq!(driver.call_count(DriverCmd::SetScanMacAddr), 1);
    }

    #[test]
    fn test_scan_mac_not_supported() {
        let (driver, feature) = sta();
        driver.set_scan_mac_supported(false);
        assert!(matches!(
            feature
                .set_scanning_mac_address(&[1, 2, 3, 4, 5, 6], 6)
                .unwrap_err(),
            HalError::NotSupported
        ));
    }

    #[test]
    fn test_start_scan_reaches_driver() {
        let (driver, feature) = sta();
        let settings = ScanSettings {
            ssids: vec!["lab".into()],
            ..Default::default()
        };
        feature.start_scan(&settings).unwrap();
        let (if_name, recorded) = driver.last_scan().unwrap();
        assert_eq!(if_name, "wlan0");
        assert_eq!(recorded, settings);
    }
}
