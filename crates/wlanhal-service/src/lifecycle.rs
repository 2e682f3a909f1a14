//! Service lifecycle and feature management
//!
//! `WlanService` is the single entry point onto the HAL's shared state: the
//! interface registry and the bound features, both behind one mutex. Every
//! operation takes the lock on entry and releases it on exit; there is no
//! re-entrancy. Event fan-out lives in the subscriber table with its own
//! lock, so neither side ever blocks the other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use wlanhal_core::config::HalConfig;
use wlanhal_core::driver::{commands, DriverClient};
use wlanhal_core::errors::{HalError, Result};
use wlanhal_core::types::{
    ClientId, IfaceName, IfaceType, MacAddr, NetDeviceInfo, ScanSettings, IFACE_TYPE_COUNT,
};

use crate::features::{ApFeature, BaseFeature, Feature, StaFeature};
use crate::registry::InterfaceRegistry;
use crate::subscribers::SubscriberTable;

// ----------------------------------------------------------------------------
// Service State
// ----------------------------------------------------------------------------

/// Lifecycle state of the service singleton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed-by-nobody; only `construct` is legal
    Uninitialized,
    /// Constructed but not running; the registry is empty
    Stopped,
    /// Running; the registry mirrors the driver's inventory
    Started,
}

struct LifecycleInner {
    state: ServiceState,
    registry: InterfaceRegistry,
    features: HashMap<String, Feature>,
}

// ----------------------------------------------------------------------------
// WLAN Service
// ----------------------------------------------------------------------------

/// The HAL service: lifecycle state machine, feature factory, and the
/// gateway every feature operation is serialized through.
pub struct WlanService {
    config: HalConfig,
    driver: Arc<dyn DriverClient>,
    inner: Mutex<LifecycleInner>,
    subscribers: Arc<SubscriberTable>,
}

impl WlanService {
    pub fn new(driver: Arc<dyn DriverClient>, config: HalConfig) -> Arc<Self> {
        let subscribers = SubscriberTable::new(driver.clone());
        Arc::new(Self {
            config,
            driver,
            inner: Mutex::new(LifecycleInner {
                state: ServiceState::Uninitialized,
                registry: InterfaceRegistry::new(),
                features: HashMap::new(),
            }),
            subscribers,
        })
    }

    pub fn subscribers(&self) -> &Arc<SubscriberTable> {
        &self.subscribers
    }

    pub fn state(&self) -> ServiceState {
        self.inner.lock().unwrap().state
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bring the singleton into existence. Exactly one construct per
    /// destruct; a second construct is lifecycle misuse.
    pub fn construct(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            ServiceState::Uninitialized => {
                inner.state = ServiceState::Stopped;
                Ok(())
            }
            _ => Err(HalError::AlreadyStarted),
        }
    }

    /// Tear the singleton down. The service must be stopped first.
    pub fn destruct(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            ServiceState::Started => Err(HalError::AlreadyStarted),
            ServiceState::Uninitialized => Err(HalError::NotStarted),
            ServiceState::Stopped => {
                inner.state = ServiceState::Uninitialized;
                Ok(())
            }
        }
    }

    /// Initialize the driver channel and populate the registry from the
    /// driver's inventory. On any failure the channel is torn down again
    /// and the registry stays empty.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            ServiceState::Started => return Err(HalError::AlreadyStarted),
            ServiceState::Uninitialized => return Err(HalError::NotStarted),
            ServiceState::Stopped => {}
        }
        self.driver.init()?;
        match commands::get_network_info(self.driver.as_ref()) {
            Ok(mut infos) => {
                if infos.len() > self.config.max_interfaces {
                    warn!(
                        reported = infos.len(),
                        max = self.config.max_interfaces,
                        "driver reported more interfaces than configured, truncating"
                    );
                    infos.truncate(self.config.max_interfaces);
                }
                inner.registry.populate(infos);
                inner.state = ServiceState::Started;
                info!(interfaces = inner.registry.len(), "wlan service started");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "interface discovery failed, tearing the driver channel down");
                self.driver.deinit();
                inner.registry.clear();
                Err(err)
            }
        }
    }

    /// Tear down the driver channel and drop the registry and every bound
    /// feature.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        self.driver.deinit();
        inner.features.clear();
        inner.registry.clear();
        inner.state = ServiceState::Stopped;
        info!("wlan service stopped");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Feature Management
    // ------------------------------------------------------------------

    /// Bind the first free interface supporting `role` and return the new
    /// feature's identity. Only the AP and station roles carry an
    /// operation table.
    pub fn create_feature(&self, role: IfaceType) -> Result<(IfaceName, IfaceType)> {
        if !matches!(role, IfaceType::Ap | IfaceType::Station) {
            return Err(HalError::invalid_param(format!(
                "role {role} has no feature operations"
            )));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        let descriptor = inner
            .registry
            .find_unbound(role)
            .ok_or(HalError::NotAvailable)?;
        descriptor.bound = true;
        let if_name = descriptor.name.clone();

        let base = BaseFeature::new(if_name.clone(), role, self.driver.clone());
        let feature = match role {
            IfaceType::Ap => Feature::Ap(ApFeature::new(base)),
            _ => Feature::Sta(StaFeature::new(base)),
        };
        inner.features.insert(if_name.as_str().to_owned(), feature);
        debug!(%if_name, %role, "feature created");
        Ok((if_name, role))
    }

    /// Release the feature bound to `if_name` and unbind its descriptor.
    pub fn destroy_feature(&self, if_name: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.features.remove(if_name).is_none() {
            return Err(HalError::invalid_param(format!(
                "no feature bound to {if_name}"
            )));
        }
        inner.registry.unbind(if_name)?;
        debug!(if_name, "feature destroyed");
        Ok(())
    }

    /// Identity of the feature bound to `if_name`
    pub fn get_feature_by_if_name(&self, if_name: &str) -> Result<(IfaceName, IfaceType)> {
        let inner = self.inner.lock().unwrap();
        let feature = inner
            .features
            .get(if_name)
            .ok_or_else(|| HalError::not_found(if_name))?;
        Ok((feature.if_name().clone(), feature.iface_type()))
    }

    fn with_feature<R>(&self, if_name: &str, f: impl FnOnce(&Feature) -> Result<R>) -> Result<R> {
        let inner = self.inner.lock().unwrap();
        let feature = inner
            .features
            .get(if_name)
            .ok_or_else(|| HalError::not_found(if_name))?;
        f(feature)
    }

    // ------------------------------------------------------------------
    // Capability Queries
    // ------------------------------------------------------------------

    /// Union of role support across every interface, one flag byte per
    /// role, plus a trailing flag for multi-role combination support.
    /// The caller's buffer must be able to hold all of them.
    pub fn get_supported_modes(&self, out_capacity: u32) -> Result<Vec<u8>> {
        if (out_capacity as usize) <= IFACE_TYPE_COUNT {
            return Err(HalError::invalid_param(format!(
                "support buffer of {out_capacity} cannot hold {} flags",
                IFACE_TYPE_COUNT + 1
            )));
        }
        let inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        let mut flags = vec![0u8; IFACE_TYPE_COUNT + 1];
        for descriptor in inner.registry.iter() {
            for (flag, supported) in flags.iter_mut().zip(descriptor.support_modes.iter()) {
                *flag |= *supported as u8;
            }
        }
        flags[IFACE_TYPE_COUNT] = commands::is_support_combo(self.driver.as_ref())? as u8;
        Ok(flags)
    }

    /// Multi-role combinations as the driver reports them; `NotSupported`
    /// when the driver has none.
    pub fn get_supported_combos(&self, out_capacity: u32) -> Result<Vec<u64>> {
        if out_capacity == 0 {
            return Err(HalError::invalid_param("combination buffer of capacity 0"));
        }
        let inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        commands::get_combo_info(self.driver.as_ref(), out_capacity as usize)
    }

    pub fn get_net_device_info(&self) -> Result<Vec<NetDeviceInfo>> {
        let inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        commands::get_net_device_info(self.driver.as_ref())
    }

    /// Interface names served by `chip_id`
    pub fn get_iface_names_by_chip_id(&self, chip_id: u8) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        commands::get_if_names_by_chip_id(self.driver.as_ref(), chip_id)
    }

    // ------------------------------------------------------------------
    // Privileged Operations
    // ------------------------------------------------------------------

    /// Reset the driver for `chip_id`. The identity check runs before any
    /// state is consulted; an unauthorized caller never reaches the
    /// driver. On success the call blocks for the configured settle time.
    pub fn reset_driver(&self, caller: ClientId, chip_id: u8, if_name: &str) -> Result<()> {
        if !self.config.is_reset_authorized(caller.as_u32()) {
            warn!(%caller, chip_id, "unauthorized driver reset attempt");
            return Err(HalError::Unauthorized(caller.as_u32()));
        }
        let inner = self.inner.lock().unwrap();
        if inner.state != ServiceState::Started {
            return Err(HalError::NotStarted);
        }
        commands::reset_driver(self.driver.as_ref(), chip_id, if_name)?;
        info!(%caller, chip_id, if_name, "driver reset issued");
        thread::sleep(self.config.reset_settle_time());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Feature Operation Gateway
    // ------------------------------------------------------------------
    //
    // Feature operations run under the lifecycle lock, so a feature can
    // never race its own destruction.

    pub fn set_mac_address(&self, if_name: &str, mac: &[u8]) -> Result<()> {
        self.with_feature(if_name, |feature| feature.base().set_mac_address(mac))
    }

    pub fn get_device_mac_address(&self, if_name: &str) -> Result<MacAddr> {
        self.with_feature(if_name, |feature| feature.base().get_device_mac_address())
    }

    pub fn get_valid_freqs(&self, if_name: &str, band: i32, capacity: u32) -> Result<Vec<i32>> {
        self.with_feature(if_name, |feature| {
            feature.base().get_valid_freqs(band, capacity)
        })
    }

    pub fn set_tx_power(&self, if_name: &str, power: i32) -> Result<()> {
        self.with_feature(if_name, |feature| feature.base().set_tx_power(power))
    }

    pub fn get_chip_id(&self, if_name: &str) -> Result<u8> {
        self.with_feature(if_name, |feature| feature.base().get_chip_id())
    }

    pub fn get_associated_stations(&self, if_name: &str, capacity: u32) -> Result<Vec<MacAddr>> {
        self.with_feature(if_name, |feature| {
            let ap = feature
                .as_ap()
                .ok_or_else(|| HalError::invalid_param(format!("{if_name} is not an AP feature")))?;
            ap.get_associated_stations(capacity)
        })
    }

    pub fn set_country_code(&self, if_name: &str, code: &str, declared_len: u32) -> Result<()> {
        self.with_feature(if_name, |feature| {
            let ap = feature
                .as_ap()
                .ok_or_else(|| HalError::invalid_param(format!("{if_name} is not an AP feature")))?;
            ap.set_country_code(code, declared_len)
        })
    }

    pub fn set_scanning_mac_address(
        &self,
        if_name: &str,
        mac: &[u8],
        declared_len: usize,
    ) -> Result<()> {
        self.with_feature(if_name, |feature| {
            let sta = feature.as_sta().ok_or_else(|| {
                HalError::invalid_param(format!("{if_name} is not a station feature"))
            })?;
            sta.set_scanning_mac_address(mac, declared_len)
        })
    }

    pub fn start_scan(&self, if_name: &str, settings: &ScanSettings) -> Result<()> {
        self.with_feature(if_name, |feature| {
            let sta = feature.as_sta().ok_or_else(|| {
                HalError::invalid_param(format!("{if_name} is not a station feature"))
            })?;
            sta.start_scan(settings)
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
