//! Typed driver commands
//!
//! One function per driver command: build the request buffer, send it
//! through the client, parse the reply. Argument validation happens here or
//! above; a malformed reply from the driver is reported as a generic driver
//! failure because the transport, not the caller, violated the contract.

use log::warn;

use crate::driver::{DriverClient, DriverCmd};
use crate::errors::{HalError, Result};
use crate::protocol::messages::{decode_scan_settings, encode_scan_settings};
use crate::types::{
    IfaceName, InterfaceInfo, MacAddr, NetDeviceInfo, ScanSettings, BAND_COUNT, IFACE_TYPE_COUNT,
    MAC_LEN, MAX_ASSOC_STA_COUNT, MAX_IFACE_COUNT,
};
use crate::wire::{WireReader, WireWriter};

// ----------------------------------------------------------------------------
// Inventory Queries
// ----------------------------------------------------------------------------

/// Query the driver for the current interface inventory.
pub fn get_network_info(client: &dyn DriverClient) -> Result<Vec<InterfaceInfo>> {
    let reply = client.call(DriverCmd::GetNetworkInfo, &[])?;
    let mut reader = WireReader::new(&reply);
    let count = (reader.read_u32()? as usize).min(MAX_IFACE_COUNT);
    let mut infos = Vec::with_capacity(count);
    for _ in 0..count {
        let name = IfaceName::new(reader.read_str()?)?;
        let modes_raw = reader.read_bytes()?;
        if modes_raw.len() != IFACE_TYPE_COUNT {
            warn!("interface {name}: mode set of {} entries in discovery reply", modes_raw.len());
            return Err(HalError::driver_failure());
        }
        let mut support_modes = [false; IFACE_TYPE_COUNT];
        for (slot, raw) in support_modes.iter_mut().zip(modes_raw) {
            *slot = raw != 0;
        }
        infos.push(InterfaceInfo {
            name,
            support_modes,
        });
    }
    Ok(infos)
}

pub fn is_support_combo(client: &dyn DriverClient) -> Result<bool> {
    let reply = client.call(DriverCmd::IsSupportCombo, &[])?;
    let mut reader = WireReader::new(&reply);
    Ok(reader.read_u8()? != 0)
}

/// Fetch the multi-role combination table. The combination count is
/// whatever the driver reports; a count beyond `capacity` means the reply
/// does not fit the caller's buffer.
pub fn get_combo_info(client: &dyn DriverClient, capacity: usize) -> Result<Vec<u64>> {
    let reply = client.call(DriverCmd::GetSupportCombo, &[])?;
    let mut reader = WireReader::new(&reply);
    if reader.read_u8()? == 0 {
        return Err(HalError::NotSupported);
    }
    let count = reader.read_u32()? as usize;
    if count > capacity {
        warn!("combination reply of {count} entries exceeds the caller's {capacity}");
        return Err(HalError::driver_failure());
    }
    let mut combos = Vec::with_capacity(count);
    for _ in 0..count {
        combos.push(reader.read_u64()?);
    }
    Ok(combos)
}

pub fn get_net_device_info(client: &dyn DriverClient) -> Result<Vec<NetDeviceInfo>> {
    let reply = client.call(DriverCmd::GetNetDevInfo, &[])?;
    let mut reader = WireReader::new(&reply);
    let count = reader.read_u32()? as usize;
    let mut infos = Vec::with_capacity(count.min(MAX_IFACE_COUNT));
    for _ in 0..count {
        let index = reader.read_u32()?;
        let if_name = IfaceName::new(reader.read_str()?)?;
        let iface_type = reader.read_u8()?;
        let mac = MacAddr::from_bytes(&reader.read_bytes()?)
            .map_err(|_| HalError::driver_failure())?;
        infos.push(NetDeviceInfo {
            index,
            if_name,
            iface_type,
            mac,
        });
    }
    Ok(infos)
}

// ----------------------------------------------------------------------------
// Per-Interface Commands
// ----------------------------------------------------------------------------

pub fn set_mac_addr(client: &dyn DriverClient, if_name: &str, mac: &MacAddr) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_bytes(mac.as_bytes())?;
    client.call(DriverCmd::SetMacAddr, &writer.finish())?;
    Ok(())
}

/// Read the device's factory MAC. The reply leads with a validity flag;
/// drivers without an efuse-stored address report zero there.
pub fn get_dev_mac_addr(client: &dyn DriverClient, if_name: &str, iface_type: i32) -> Result<MacAddr> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_i32(iface_type);
    let reply = client.call(DriverCmd::GetDevMacAddr, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    if reader.read_u8()? == 0 {
        return Err(HalError::NotSupported);
    }
    let raw = reader.read_bytes()?;
    if raw.len() != MAC_LEN {
        return Err(HalError::driver_failure());
    }
    MacAddr::from_bytes(&raw)
}

pub fn get_valid_freqs(
    client: &dyn DriverClient,
    if_name: &str,
    band: i32,
    capacity: usize,
) -> Result<Vec<i32>> {
    if !(0..BAND_COUNT).contains(&band) {
        return Err(HalError::invalid_param(format!("unknown band {band}")));
    }
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_i32(band);
    let reply = client.call(DriverCmd::GetValidFreqs, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    let count = reader.read_u32()? as usize;
    if count > capacity {
        warn!("frequency reply of {count} entries exceeds the caller's {capacity}");
        return Err(HalError::driver_failure());
    }
    let mut freqs = Vec::with_capacity(count);
    for _ in 0..count {
        freqs.push(reader.read_i32()?);
    }
    Ok(freqs)
}

pub fn set_tx_power(client: &dyn DriverClient, if_name: &str, power: i32) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_i32(power);
    client.call(DriverCmd::SetTxPower, &writer.finish())?;
    Ok(())
}

pub fn get_associated_stas(client: &dyn DriverClient, if_name: &str) -> Result<Vec<MacAddr>> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    let reply = client.call(DriverCmd::GetAssociatedStas, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    let count = reader.read_u32()? as usize;
    if count > MAX_ASSOC_STA_COUNT {
        warn!("driver reports {count} associated stations, more than the {MAX_ASSOC_STA_COUNT} tracked");
        return Err(HalError::driver_failure());
    }
    if count == 0 {
        return Ok(Vec::new());
    }
    let blob = reader.read_bytes()?;
    if blob.len() != count * MAC_LEN {
        warn!("station blob of {} bytes does not hold {count} addresses", blob.len());
        return Err(HalError::driver_failure());
    }
    blob.chunks_exact(MAC_LEN).map(MacAddr::from_bytes).collect()
}

pub fn set_country_code(client: &dyn DriverClient, if_name: &str, code: &str) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_bytes(code.as_bytes())?;
    client.call(DriverCmd::SetCountryCode, &writer.finish())?;
    Ok(())
}

/// Program the randomized scan MAC. The reply leads with a validity flag;
/// drivers without the capability report zero there.
pub fn set_scan_mac_addr(client: &dyn DriverClient, if_name: &str, mac: &MacAddr) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    writer.write_bytes(mac.as_bytes())?;
    let reply = client.call(DriverCmd::SetScanMacAddr, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    if reader.read_u8()? == 0 {
        return Err(HalError::NotSupported);
    }
    Ok(())
}

pub fn get_chip_id(client: &dyn DriverClient, if_name: &str) -> Result<u8> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    let reply = client.call(DriverCmd::GetChipId, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    reader.read_u8().map_err(Into::into)
}

pub fn get_if_names_by_chip_id(client: &dyn DriverClient, chip_id: u8) -> Result<Vec<String>> {
    let mut writer = WireWriter::new();
    writer.write_u8(chip_id);
    let reply = client.call(DriverCmd::GetIfNamesByChipId, &writer.finish())?;
    let mut reader = WireReader::new(&reply);
    let count = reader.read_u32()? as usize;
    let mut names = Vec::with_capacity(count.min(MAX_IFACE_COUNT));
    for _ in 0..count {
        names.push(reader.read_str()?);
    }
    Ok(names)
}

pub fn reset_driver(client: &dyn DriverClient, chip_id: u8, if_name: &str) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_u8(chip_id);
    writer.write_str(if_name)?;
    client.call(DriverCmd::ResetDriver, &writer.finish())?;
    Ok(())
}

pub fn start_scan(
    client: &dyn DriverClient,
    if_name: &str,
    settings: &ScanSettings,
) -> Result<()> {
    let mut writer = WireWriter::new();
    writer.write_str(if_name)?;
    encode_scan_settings(&mut writer, settings)?;
    client.call(DriverCmd::StartScan, &writer.finish())?;
    Ok(())
}

// ----------------------------------------------------------------------------
// Request Parsers (used by driver implementations)
// ----------------------------------------------------------------------------

/// Parse a scan command request back into its parts. Driver implementations
/// (the fake, a simulator) use this to interpret what `start_scan` built.
pub fn parse_scan_request(request: &[u8]) -> Result<(String, ScanSettings)> {
    let mut reader = WireReader::new(request);
    let if_name = reader.read_str()?;
    let settings = decode_scan_settings(&mut reader)?;
    reader.finish()?;
    Ok((if_name, settings))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
