//! Feature operation tables
//!
//! A feature is one logical WLAN role bound to one interface. Every feature
//! carries the shared base operations; the AP and STA kinds add their own.
//! All argument validation happens here, before anything reaches the driver,
//! and driver status codes pass through unchanged.

mod ap;
mod base;
mod sta;

pub use ap::ApFeature;
pub use base::BaseFeature;
pub use sta::StaFeature;

use wlanhal_core::types::{IfaceName, IfaceType};

// ----------------------------------------------------------------------------
// Feature
// ----------------------------------------------------------------------------

/// A bound feature of either supported kind
#[derive(Clone)]
pub enum Feature {
    Ap(ApFeature),
    Sta(StaFeature),
}

impl Feature {
    /// The shared base operation table
    pub fn base(&self) -> &BaseFeature {
        match self {
            Feature::Ap(ap) => ap.base(),
            Feature::Sta(sta) => sta.base(),
        }
    }

    pub fn if_name(&self) -> &IfaceName {
        self.base().if_name()
    }

    pub fn iface_type(&self) -> IfaceType {
        self.base().iface_type()
    }

    /// The AP operation table, if this feature is an AP
    pub fn as_ap(&self) -> Option<&ApFeature> {
        match self {
            Feature::Ap(ap) => Some(ap),
            Feature::Sta(_) => None,
        }
    }

    /// The STA operation table, if this feature is a station
    pub fn as_sta(&self) -> Option<&StaFeature> {
        match self {
            Feature::Sta(sta) => Some(sta),
            Feature::Ap(_) => None,
        }
    }
}
