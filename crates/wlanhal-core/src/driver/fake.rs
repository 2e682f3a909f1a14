//! In-memory driver client for tests
//!
//! Serves scripted replies for every driver command and records each call,
//! so tests can assert both behavior ("the scan reached the driver") and
//! absence of behavior ("the unauthorized reset never did"). Events are
//! raised synchronously through the registered listener, mimicking the
//! callback-context delivery of a real transport.

use std::sync::{Arc, Mutex};

use crate::driver::{DriverClient, DriverCmd, DriverEvent, EventListener};
use crate::errors::{HalError, Result};
use crate::protocol::messages::decode_scan_settings;
use crate::protocol::DriverEventKind;
use crate::types::{
    InterfaceInfo, MacAddr, NetDeviceInfo, ScanSettings, IFACE_TYPE_COUNT, MAC_LEN,
};
use crate::wire::{WireReader, WireWriter};

// ----------------------------------------------------------------------------
// Scripted State
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct FakeState {
    initialized: bool,
    interfaces: Vec<InterfaceInfo>,
    netdev_infos: Vec<NetDeviceInfo>,
    /// Factory MAC; `None` models a chip without an efuse-stored address
    device_mac: Option<MacAddr>,
    /// Combination table; `None` models a single-role-only driver
    combos: Option<Vec<u64>>,
    scan_mac_supported: bool,
    chip_id: u8,
    freqs_per_band: [Vec<i32>; 2],
    assoc_stas: Vec<MacAddr>,
    /// Forced failure code returned by every subsequent call
    fail_code: Option<i32>,
    calls: Vec<DriverCmd>,
    last_scan: Option<(String, ScanSettings)>,
}

/// Scripted driver client with a call-log spy
pub struct FakeDriverClient {
    state: Mutex<FakeState>,
    listener: Mutex<Option<Arc<dyn EventListener>>>,
}

impl FakeDriverClient {
    /// Create a fake serving the given interface inventory
    pub fn with_interfaces(interfaces: Vec<InterfaceInfo>) -> Self {
        let netdev_infos = interfaces
            .iter()
            .enumerate()
            .map(|(i, info)| NetDeviceInfo {
                index: i as u32,
                if_name: info.name.clone(),
                iface_type: 0,
                mac: MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, i as u8]),
            })
            .collect();
        Self {
            state: Mutex::new(FakeState {
                initialized: false,
                interfaces,
                netdev_infos,
                device_mac: Some(MacAddr::new([0x02, 0x42, 0xac, 0x11, 0x00, 0x02])),
                combos: Some(vec![0x0C, 0x84]),
                scan_mac_supported: true,
                chip_id: 1,
                freqs_per_band: [
                    (0..14).map(|i| 2412 + 5 * i).collect(),
                    vec![5180, 5200, 5220, 5240],
                ],
                assoc_stas: Vec::new(),
                fail_code: None,
                calls: Vec::new(),
                last_scan: None,
            }),
            listener: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    pub fn set_device_mac(&self, mac: Option<MacAddr>) {
        self.state.lock().unwrap().device_mac = mac;
    }

    pub fn set_combos(&self, combos: Option<Vec<u64>>) {
        self.state.lock().unwrap().combos = combos;
    }

    pub fn set_scan_mac_supported(&self, supported: bool) {
        self.state.lock().unwrap().scan_mac_supported = supported;
    }

    pub fn set_chip_id(&self, chip_id: u8) {
        self.state.lock().unwrap().chip_id = chip_id;
    }

    pub fn set_assoc_stas(&self, stas: Vec<MacAddr>) {
        self.state.lock().unwrap().assoc_stas = stas;
    }

    /// Make every subsequent call fail with `code`
    pub fn fail_with(&self, code: i32) {
        self.state.lock().unwrap().fail_code = Some(code);
    }

    pub fn clear_failure(&self) {
        self.state.lock().unwrap().fail_code = None;
    }

    // ------------------------------------------------------------------
    // Spying
    // ------------------------------------------------------------------

    pub fn calls(&self) -> Vec<DriverCmd> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, cmd: DriverCmd) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == cmd)
            .count()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().unwrap().is_some()
    }

    pub fn last_scan(&self) -> Option<(String, ScanSettings)> {
        self.state.lock().unwrap().last_scan.clone()
    }

    /// Raise an event through the registered listener, synchronously, on
    /// the calling thread. No-op when no listener is installed.
    pub fn emit_event(&self, kind: DriverEventKind, if_name: &str, payload: &[u8]) {
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener.on_event(DriverEvent {
                kind,
                if_name: if_name.to_owned(),
                payload: payload.to_vec(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Reply builders
    // ------------------------------------------------------------------

    fn reply_network_info(state: &FakeState) -> Result<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.write_u32(state.interfaces.len() as u32);
        for info in &state.interfaces {
            writer.write_str(info.name.as_str())?;
            let modes: Vec<u8> = info.support_modes.iter().map(|m| *m as u8).collect();
            debug_assert_eq!(modes.len(), IFACE_TYPE_COUNT);
            writer.write_bytes(&modes)?;
        }
        Ok(writer.finish())
    }

    fn reply_netdev_info(state: &FakeState) -> Result<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.write_u32(state.netdev_infos.len() as u32);
        for info in &state.netdev_infos {
            writer.write_u32(info.index);
            writer.write_str(info.if_name.as_str())?;
            writer.write_u8(info.iface_type);
            writer.write_bytes(info.mac.as_bytes())?;
        }
        Ok(writer.finish())
    }

    fn known_iface(state: &FakeState, name: &str) -> Result<()> {
        if state.interfaces.iter().any(|i| i.name.as_str() == name) {
            Ok(())
        } else {
            Err(HalError::driver_failure())
        }
    }
}

// ----------------------------------------------------------------------------
// DriverClient Implementation
// ----------------------------------------------------------------------------

impl DriverClient for FakeDriverClient {
    fn init(&self) -> Result<()> {
        self.state.lock().unwrap().initialized = true;
        Ok(())
    }

    fn deinit(&self) {
        self.state.lock().unwrap().initialized = false;
    }

    fn call(&self, cmd: DriverCmd, request: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(cmd);
        if let Some(code) = state.fail_code {
            return Err(HalError::driver(code));
        }

        let mut reader = WireReader::new(request);
        match cmd {
            DriverCmd::GetNetworkInfo => Self::reply_network_info(&state),
            DriverCmd::GetNetDevInfo => Self::reply_netdev_info(&state),
            DriverCmd::IsSupportCombo => {
                let mut writer = WireWriter::new();
                writer.write_u8(state.combos.is_some() as u8);
                Ok(writer.finish())
            }
            DriverCmd::GetSupportCombo => {
                let mut writer = WireWriter::new();
                match &state.combos {
                    Some(combos) => {
                        writer.write_u8(1);
                        writer.write_u32(combos.len() as u32);
                        for combo in combos {
                            writer.write_u64(*combo);
                        }
                    }
                    None => {
                        writer.write_u8(0);
                    }
                }
                Ok(writer.finish())
            }
            DriverCmd::SetMacAddr => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let mac = reader.read_bytes()?;
                if mac.len() != MAC_LEN {
                    return Err(HalError::driver_failure());
                }
                Ok(Vec::new())
            }
            DriverCmd::GetDevMacAddr => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let _iface_type = reader.read_i32()?;
                let mut writer = WireWriter::new();
                match state.device_mac {
                    Some(mac) => {
                        writer.write_u8(1);
                        writer.write_bytes(mac.as_bytes())?;
                    }
                    None => {
                        writer.write_u8(0);
                    }
                }
                Ok(writer.finish())
            }
            DriverCmd::GetValidFreqs => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let band = reader.read_i32()?;
                let freqs = state
                    .freqs_per_band
                    .get(band as usize)
                    .ok_or_else(HalError::driver_failure)?;
                let mut writer = WireWriter::new();
                writer.write_u32(freqs.len() as u32);
                for freq in freqs {
                    writer.write_i32(*freq);
                }
                Ok(writer.finish())
            }
            DriverCmd::SetTxPower => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let _power = reader.read_i32()?;
                Ok(Vec::new())
            }
            DriverCmd::GetAssociatedStas => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let mut writer = WireWriter::new();
                writer.write_u32(state.assoc_stas.len() as u32);
                let mut blob = Vec::with_capacity(state.assoc_stas.len() * MAC_LEN);
                for mac in &state.assoc_stas {
                    blob.extend_from_slice(mac.as_bytes());
                }
                writer.write_bytes(&blob)?;
                Ok(writer.finish())
            }
            DriverCmd::SetCountryCode => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let _code = reader.read_bytes()?;
                Ok(Vec::new())
            }
            DriverCmd::SetScanMacAddr => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let _mac = reader.read_bytes()?;
                let mut writer = WireWriter::new();
                writer.write_u8(state.scan_mac_supported as u8);
                Ok(writer.finish())
            }
            DriverCmd::GetChipId => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let mut writer = WireWriter::new();
                writer.write_u8(state.chip_id);
                Ok(writer.finish())
            }
            DriverCmd::GetIfNamesByChipId => {
                let chip_id = reader.read_u8()?;
                let mut writer = WireWriter::new();
                if chip_id == state.chip_id {
                    writer.write_u32(state.interfaces.len() as u32);
                    for info in &state.interfaces {
                        writer.write_str(info.name.as_str())?;
                    }
                } else {
                    writer.write_u32(0);
                }
                Ok(writer.finish())
            }
            DriverCmd::ResetDriver => {
                let _chip_id = reader.read_u8()?;
                let _name = reader.read_str()?;
                Ok(Vec::new())
            }
            DriverCmd::StartScan => {
                let name = reader.read_str()?;
                Self::known_iface(&state, &name)?;
                let settings = decode_scan_settings(&mut reader)?;
                state.last_scan = Some((name, settings));
                Ok(Vec::new())
            }
        }
    }

    fn register_event_listener(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        *self.listener.lock().unwrap() = Some(listener);
        Ok(())
    }

    fn unregister_event_listener(&self) {
        *self.listener.lock().unwrap() = None;
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
