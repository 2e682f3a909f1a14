//! HAL configuration
//!
//! Consolidates the tunables of the service layer: privileged identities for
//! driver reset, the post-reset settle time, and inventory limits.

use core::time::Duration;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// HAL Configuration
// ----------------------------------------------------------------------------

/// Configuration for the WLAN HAL service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalConfig {
    /// Identities that may always reset the driver
    pub privileged_uids: Vec<u32>,
    /// Identities at or above this value may never reset the driver
    pub reset_uid_threshold: u32,
    /// Time the service blocks after a driver reset before replying
    pub reset_settle_ms: u64,
    /// Largest interface inventory accepted from the driver
    pub max_interfaces: usize,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            privileged_uids: vec![0, 1000], // root and the system service uid
            reset_uid_threshold: 10_000,
            reset_settle_ms: 2_000,
            max_interfaces: crate::types::MAX_IFACE_COUNT,
        }
    }
}

impl HalConfig {
    /// Configuration for tests: no settle delay
    pub fn immediate() -> Self {
        Self {
            reset_settle_ms: 0,
            ..Self::default()
        }
    }

    /// Whether `uid` may perform the privileged driver reset
    pub fn is_reset_authorized(&self, uid: u32) -> bool {
        self.privileged_uids.contains(&uid) || uid < self.reset_uid_threshold
    }

    pub fn reset_settle_time(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
