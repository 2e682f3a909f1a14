//! Service command set
//!
//! One opcode per operation on the IPC surface. The numeric values are part
//! of the wire contract and never change.

use serde::{Deserialize, Serialize};

use crate::errors::HalError;

// ----------------------------------------------------------------------------
// Service Commands
// ----------------------------------------------------------------------------

/// Number of commands in the protocol
pub const COMMAND_COUNT: usize = 25;

/// IPC command opcodes
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCommand {
    Construct = 0,
    Destruct = 1,
    Start = 2,
    Stop = 3,
    GetSupportFeature = 4,
    GetSupportCombo = 5,
    CreateFeature = 6,
    GetFeatureByIfName = 7,
    RegisterEventCallback = 8,
    UnregisterEventCallback = 9,
    DestroyFeature = 10,
    ResetDriver = 11,
    GetAssociatedStas = 12,
    SetCountryCode = 13,
    GetNetworkIfaceName = 14,
    GetFeatureType = 15,
    SetMacAddress = 16,
    GetMacAddress = 17,
    GetFreqsWithBand = 18,
    SetTxPower = 19,
    GetChipId = 20,
    GetIfNamesByChipId = 21,
    SetScanMacAddress = 22,
    GetNetDevInfo = 23,
    StartScan = 24,
}

impl ServiceCommand {
    /// All commands in opcode order
    pub const ALL: [ServiceCommand; COMMAND_COUNT] = [
        ServiceCommand::Construct,
        ServiceCommand::Destruct,
        ServiceCommand::Start,
        ServiceCommand::Stop,
        ServiceCommand::GetSupportFeature,
        ServiceCommand::GetSupportCombo,
        ServiceCommand::CreateFeature,
        ServiceCommand::GetFeatureByIfName,
        ServiceCommand::RegisterEventCallback,
        ServiceCommand::UnregisterEventCallback,
        ServiceCommand::DestroyFeature,
        ServiceCommand::ResetDriver,
        ServiceCommand::GetAssociatedStas,
        ServiceCommand::SetCountryCode,
        ServiceCommand::GetNetworkIfaceName,
        ServiceCommand::GetFeatureType,
        ServiceCommand::SetMacAddress,
        ServiceCommand::GetMacAddress,
        ServiceCommand::GetFreqsWithBand,
        ServiceCommand::SetTxPower,
        ServiceCommand::GetChipId,
        ServiceCommand::GetIfNamesByChipId,
        ServiceCommand::SetScanMacAddress,
        ServiceCommand::GetNetDevInfo,
        ServiceCommand::StartScan,
    ];

    pub fn from_u32(value: u32) -> Result<Self, HalError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| HalError::invalid_param(format!("unknown opcode {value}")))
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values_are_dense_and_stable() {
        for (i, cmd) in ServiceCommand::ALL.iter().enumerate() {
            assert_eq!(cmd.as_u32(), i as u32);
            assert_eq!(ServiceCommand::from_u32(i as u32).unwrap(), *cmd);
        }
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert!(ServiceCommand::from_u32(COMMAND_COUNT as u32).is_err());
        assert!(ServiceCommand::from_u32(u32::MAX).is_err());
    }
}
