//! IPC protocol definitions
//!
//! The numeric command set, the typed request/response messages exchanged
//! per command, and the asynchronous driver event frames.

pub mod command;
pub mod event;
pub mod messages;

pub use command::{ServiceCommand, COMMAND_COUNT};
pub use event::{DriverEventKind, EventMessage, EVENT_KIND_COUNT};

/// Token every request must lead with; a request carrying anything else was
/// built against a different interface revision.
pub const INTERFACE_TOKEN: &str = "wlanhal.interface.v1";
