//! Base feature operations shared by every feature kind

use std::sync::Arc;

use wlanhal_core::driver::{commands, DriverClient};
use wlanhal_core::errors::{HalError, Result};
use wlanhal_core::types::{IfaceName, IfaceType, MacAddr, MAC_LEN, MAX_CHANNEL_COUNT};

// ----------------------------------------------------------------------------
// Base Feature
// ----------------------------------------------------------------------------

/// Operations available on any bound feature. The feature addresses its
/// interface by name; the registry remains the single source of truth for
/// the descriptor itself.
#[derive(Clone)]
pub struct BaseFeature {
    if_name: IfaceName,
    iface_type: IfaceType,
    driver: Arc<dyn DriverClient>,
}

impl BaseFeature {
    pub fn new(if_name: IfaceName, iface_type: IfaceType, driver: Arc<dyn DriverClient>) -> Self {
        Self {
            if_name,
            iface_type,
            driver,
        }
    }

    pub fn if_name(&self) -> &IfaceName {
        &self.if_name
    }

    pub fn iface_type(&self) -> IfaceType {
        self.iface_type
    }

    pub(crate) fn driver(&self) -> &dyn DriverClient {
        self.driver.as_ref()
    }

    /// Overwrite the interface MAC. The raw slice must hold exactly one
    /// address.
    pub fn set_mac_address(&self, mac: &[u8]) -> Result<()> {
        let mac = MacAddr::from_bytes(mac)?;
        commands::set_mac_addr(self.driver(), &self.if_name, &mac)
    }

    /// Factory MAC as stored by the chip; `NotSupported` when the chip has
    /// none.
    pub fn get_device_mac_address(&self) -> Result<MacAddr> {
        commands::get_dev_mac_addr(
            self.driver(),
            &self.if_name,
            self.iface_type.as_u8() as i32,
        )
    }

    /// Valid center frequencies for `band`. The caller's buffer must be
    /// able to hold the largest channel set any band reports.
    pub fn get_valid_freqs(&self, band: i32, capacity: u32) -> Result<Vec<i32>> {
        if (capacity as usize) < MAX_CHANNEL_COUNT {
            return Err(HalError::invalid_param(format!(
                "frequency buffer of {capacity} cannot hold {MAX_CHANNEL_COUNT} channels"
            )));
        }
        commands::get_valid_freqs(self.driver(), &self.if_name, band, capacity as usize)
    }

    pub fn set_tx_power(&self, power: i32) -> Result<()> {
        if power <= 0 {
            return Err(HalError::invalid_param(format!(
                "transmit power must be positive, got {power}"
            )));
        }
        commands::set_tx_power(self.driver(), &self.if_name, power)
    }

    pub fn get_chip_id(&self) -> Result<u8> {
        commands::get_chip_id(self.driver(), &self.if_name)
    }

    pub fn get_iface_names_by_chip_id(&self, chip_id: u8) -> Result<Vec<String>> {
        commands::get_if_names_by_chip_id(self.driver(), chip_id)
    }
}

/// Shared check for MAC-with-length operation signatures
pub(crate) fn check_mac_len(mac: &[u8], declared_len: usize) -> Result<()> {
    if declared_len != MAC_LEN || mac.len() != declared_len {
        return Err(HalError::invalid_param(format!(
            "MAC of {} bytes with declared length {declared_len}",
            mac.len()
        )));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wlanhal_core::driver::{DriverCmd, FakeDriverClient};
    use wlanhal_core::types::InterfaceInfo;

    fn base() -> (Arc<FakeDriverClient>, BaseFeature) {
        let driver = Arc::new(FakeDriverClient::with_interfaces(vec![
            InterfaceInfo::with_modes(
                IfaceName::new("wlan0").unwrap(),
                &[IfaceType::Station, IfaceType::Ap],
            ),
        ]));
        let feature = BaseFeature::new(
            IfaceName::new("wlan0").unwrap(),
            IfaceType::Station,
            driver.clone(),
        );
        (driver, feature)
    }

    #[test]
    fn test_set_mac_rejects_wrong_length_before_driver() {
        let (driver, feature) = base();
        assert!(matches!(
            feature.set_mac_address(&[1, 2, 3]).unwrap_err(),
            HalError::InvalidParam { .. }
        ));
        assert_eq!(driver.call_count(DriverCmd::SetMacAddr), 0);

        feature.set_mac_address(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(driver.call_count(DriverCmd::SetMacAddr), 1);
    }

    #[test]
    fn test_tx_power_must_be_positive() {
        let (driver, feature) = base();
        assert!(feature.set_tx_power(0).is_err());
        assert!(feature.set_tx_power(-5).is_err());
        assert_eq!(driver.call_count(DriverCmd::SetTxPower), 0);
        feature.set_tx_power(20).unwrap();
        assert_eq!(driver.call_count(DriverCmd::SetTxPower), 1);
    }

    #[test]
    fn test_freq_capacity_must_cover_channel_max() {
        let (driver, feature) = base();
        assert!(feature
            .get_valid_freqs(0, (MAX_CHANNEL_COUNT - 1) as u32)
            .is_err());
        assert_eq!(driver.call_count(DriverCmd::GetValidFreqs), 0);

        let freqs = feature.get_valid_freqs(0, MAX_CHANNEL_COUNT as u32).unwrap();
        assert_eq!(freqs.len(), MAX_CHANNEL_COUNT);
    }

    #[test]
    fn test_driver_failure_passes_through() {
        let (driver, feature) = base();
        driver.fail_with(-42);
        assert!(matches!(
            feature.get_chip_id().unwrap_err(),
            HalError::Driver { code: -42 }
        ));
    }
}
