//! WLAN HAL Core
//!
//! This crate provides the foundational pieces of the WLAN hardware
//! abstraction layer: the tagged wire codec used for IPC payloads, the
//! service command and driver event sets, typed request/response messages,
//! and the synchronous driver-client contract that the service layer calls
//! into. It holds no long-lived state of its own.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod driver;
pub mod errors;
pub mod protocol;
pub mod types;
pub mod wire;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::HalConfig;
pub use driver::{DriverClient, DriverCmd, DriverEvent, EventListener};
pub use errors::{HalError, HalResult, Result, WireError};
pub use protocol::{DriverEventKind, ServiceCommand};
pub use types::{ClientId, IfaceName, IfaceType, InterfaceInfo, MacAddr, NetDeviceInfo};
pub use wire::{WireReader, WireWriter};
