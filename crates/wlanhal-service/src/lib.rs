//! WLAN HAL Service
//!
//! The stateful half of the HAL: the interface registry and its binding
//! invariant, the per-role feature operation tables, the lifecycle state
//! machine, event fan-out to registered subscribers, and the IPC-facing
//! command dispatcher with its framed Unix-socket server.
//!
//! All lifecycle and feature operations serialize through one mutex inside
//! [`WlanService`]; event delivery runs under the subscriber table's own
//! lock, so neither side blocks the other.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod dispatch;
pub mod features;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod subscribers;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use dispatch::{CallContext, CommandDispatcher};
pub use features::{ApFeature, BaseFeature, Feature, StaFeature};
pub use lifecycle::{ServiceState, WlanService};
pub use registry::{InterfaceDescriptor, InterfaceRegistry};
pub use server::{IpcClient, IpcServer, ServerError};
pub use subscribers::{EventChannel, SubscriberTable};
