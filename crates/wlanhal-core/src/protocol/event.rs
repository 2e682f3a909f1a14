//! Asynchronous driver events
//!
//! Events originate in the kernel/firmware layer, reach the HAL through the
//! driver client's listener hook, and fan out to every registered IPC
//! subscriber as an encoded frame.

use serde::{Deserialize, Serialize};

use crate::errors::HalError;
use crate::wire::{WireReader, WireWriter};

// ----------------------------------------------------------------------------
// Event Kinds
// ----------------------------------------------------------------------------

/// Number of distinct driver event kinds
pub const EVENT_KIND_COUNT: usize = 16;

/// Kind of an asynchronous driver event
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverEventKind {
    NewSta = 0,
    DelSta = 1,
    RxMgmt = 2,
    TxStatus = 3,
    ScanDone = 4,
    ScanResult = 5,
    ConnectResult = 6,
    Disconnect = 7,
    MeshClose = 8,
    NewPeerCandidate = 9,
    RemainOnChannel = 10,
    CancelRemainOnChannel = 11,
    ChannelSwitch = 12,
    EapolRecv = 13,
    TimeoutDisconnect = 14,
    ResetDriver = 15,
}

impl DriverEventKind {
    /// All event kinds in numeric order
    pub const ALL: [DriverEventKind; EVENT_KIND_COUNT] = [
        DriverEventKind::NewSta,
        DriverEventKind::DelSta,
        DriverEventKind::RxMgmt,
        DriverEventKind::TxStatus,
        DriverEventKind::ScanDone,
        DriverEventKind::ScanResult,
        DriverEventKind::ConnectResult,
        DriverEventKind::Disconnect,
        DriverEventKind::MeshClose,
        DriverEventKind::NewPeerCandidate,
        DriverEventKind::RemainOnChannel,
        DriverEventKind::CancelRemainOnChannel,
        DriverEventKind::ChannelSwitch,
        DriverEventKind::EapolRecv,
        DriverEventKind::TimeoutDisconnect,
        DriverEventKind::ResetDriver,
    ];

    pub fn from_u32(value: u32) -> Result<Self, HalError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| HalError::invalid_param(format!("unknown event kind {value}")))
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

// ----------------------------------------------------------------------------
// Event Frame
// ----------------------------------------------------------------------------

/// One event as delivered to subscribers. The payload is opaque to the HAL;
/// its meaning belongs to the kind-specific 802.11 semantics out of scope
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub kind: DriverEventKind,
    pub if_name: String,
    pub payload: Vec<u8>,
}

impl EventMessage {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.kind.as_u32());
        writer.write_str(&self.if_name)?;
        writer.write_bytes(&self.payload)?;
        Ok(writer.finish())
    }

    pub fn decode(data: &[u8]) -> Result<Self, HalError> {
        let mut reader = WireReader::new(data);
        let kind = DriverEventKind::from_u32(reader.read_u32()?)?;
        let if_name = reader.read_str()?;
        let payload = reader.read_bytes()?;
        reader.finish()?;
        Ok(Self {
            kind,
            if_name,
            payload,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_values() {
        for (i, kind) in DriverEventKind::ALL.iter().enumerate() {
            assert_eq!(kind.as_u32(), i as u32);
            assert_eq!(DriverEventKind::from_u32(i as u32).unwrap(), *kind);
        }
        assert!(DriverEventKind::from_u32(EVENT_KIND_COUNT as u32).is_err());
    }

    #[test]
    fn test_event_message_roundtrip() {
        let msg = EventMessage {
            kind: DriverEventKind::ScanDone,
            if_name: "wlan0".into(),
            payload: vec![0xAB; 32],
        };
        let decoded = EventMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_event_message_empty_payload() {
        let msg = EventMessage {
            kind: DriverEventKind::ResetDriver,
            if_name: "wlan1".into(),
            payload: Vec::new(),
        };
        let decoded = EventMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }
}
