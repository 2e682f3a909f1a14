//! Access-point feature operations

use wlanhal_core::driver::commands;
use wlanhal_core::errors::{HalError, Result};
use wlanhal_core::types::MacAddr;

use super::BaseFeature;

// ----------------------------------------------------------------------------
// AP Feature
// ----------------------------------------------------------------------------

/// Feature bound in the access-point role
#[derive(Clone)]
pub struct ApFeature {
    base: BaseFeature,
}

impl ApFeature {
    pub fn new(base: BaseFeature) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseFeature {
        &self.base
    }

    /// Stations currently associated with this AP. `capacity` is the
    /// caller's buffer size; a reply larger than it is a driver contract
    /// violation.
    pub fn get_associated_stations(&self, capacity: u32) -> Result<Vec<MacAddr>> {
        if capacity == 0 {
            return Err(HalError::invalid_param("station buffer of capacity 0"));
        }
        let stas = commands::get_associated_stas(self.base.driver(), self.base.if_name())?;
        if stas.len() > capacity as usize {
            return Err(HalError::driver_failure());
        }
        Ok(stas)
    }

    /// Program the regulatory country code. The declared length must match
    /// the code's own byte length exactly.
    pub fn set_country_code(&self, code: &str, declared_len: u32) -> Result<()> {
        if declared_len as usize != code.len() {
            return Err(HalError::invalid_param(format!(
                "country code {code:?} with declared length {declared_len}"
            )));
        }
        commands::set_country_code(self.base.driver(), self.base.if_name(), code)
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
    use wlanhal_core::types::{IfaceName, IfaceType, InterfaceInfo};

    fn ap() -> (Arc<FakeDriverClient>, ApFeature) {
        let driver = Arc::new(FakeDriverClient::with_interfaces(vec![
            InterfaceInfo::with_modes(IfaceName::new("wlan0").unwrap(), &[IfaceType::Ap]),
        ]));
        let base = BaseFeature::new(
            IfaceName::new("wlan0").unwrap(),
            IfaceType::Ap,
            driver.clone(),
        );
        (driver, ApFeature::new(base))
    }

    #[test]
    fn test_country_code_length_must_match() {
        let (driver, feature) = ap();
        assert!(matches!(
            feature.set_country_code("CN", 3).unwrap_err(),
            HalError::InvalidParam { .. }
        ));
        assert_eq!(driver.call_count(DriverCmd::SetCountryCode), 0);

        feature.set_country_code("CN", 2).unwrap();
        assert_eq!(driver.call_count(DriverCmd::SetCountryCode), 1);
    }

    #[test]
    fn test_associated_stations() {
        let (driver, feature) = ap();
        assert!(feature.get_associated_stations(0).is_err());

        driver.set_assoc_stas(vec![
            MacAddr::new([1, 1, 1, 1, 1, 1]),
            MacAddr::new([2, 2, 2, 2, 2, 2]),
        ]);
        let stas = feature.get_associated_stations(8).unwrap();
        assert_eq!(stas.len(), 2);

        // A reply that does not fit the caller's buffer is a driver fault
        assert!(matches!(
            feature.get_associated_stations(1).unwrap_err(),
            HalError::Driver { .. }
        ));
    }
}
