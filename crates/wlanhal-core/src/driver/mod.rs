//! Driver client contract
//!
//! The kernel/firmware transport is an external collaborator. This module
//! fixes its call contract: a synchronous command channel returning a status
//! plus optional reply bytes, and a listener hook through which the driver
//! raises asynchronous events. Everything above this seam is transport
//! agnostic; swapping the real netlink-backed client for the in-memory fake
//! changes nothing else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::protocol::DriverEventKind;

pub mod commands;
pub mod fake;

pub use fake::FakeDriverClient;

// ----------------------------------------------------------------------------
// Driver Command Set
// ----------------------------------------------------------------------------

/// Low-level commands understood by the driver transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverCmd {
    GetNetworkInfo,
    IsSupportCombo,
    GetSupportCombo,
    SetMacAddr,
    GetDevMacAddr,
    GetValidFreqs,
    SetTxPower,
    GetAssociatedStas,
    SetCountryCode,
    SetScanMacAddr,
    GetChipId,
    GetIfNamesByChipId,
    ResetDriver,
    GetNetDevInfo,
    StartScan,
}

// ----------------------------------------------------------------------------
// Event Listener Seam
// ----------------------------------------------------------------------------

/// One asynchronous event as the driver raises it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverEvent {
    pub kind: DriverEventKind,
    pub if_name: String,
    pub payload: Vec<u8>,
}

/// Receives driver events on whatever thread the transport calls back on
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: DriverEvent);
}

// ----------------------------------------------------------------------------
// Driver Client Trait
// ----------------------------------------------------------------------------

/// Synchronous call layer onto the driver transport.
///
/// `call` blocks until the driver answers; there are no timeouts or retries
/// at this layer. A non-success status surfaces as `HalError::Driver` with
/// the transport's code unchanged.
pub trait DriverClient: Send + Sync {
    /// Bind the command channel. Must be called before any `call`.
    fn init(&self) -> Result<()>;

    /// Release the command channel; idempotent.
    fn deinit(&self);

    /// Send one command and return the reply payload.
    fn call(&self, cmd: DriverCmd, request: &[u8]) -> Result<Vec<u8>>;

    /// Install the event listener; the transport starts forwarding events.
    fn register_event_listener(&self, listener: Arc<dyn EventListener>) -> Result<()>;

    /// Drop the event listener; the transport stops forwarding events.
    fn unregister_event_listener(&self);
}
