//! Typed request/response messages
//!
//! One struct per wire shape, with the field order fixed by the protocol.
//! Encoding always goes through the tagged codec, so a message decoded with
//! the wrong type fails instead of producing garbage.
//!
//! `decode_fields` consumes fields from a reader already positioned past the
//! interface token; `decode` is the symmetric whole-buffer form.

use crate::errors::HalError;
use crate::types::{IfaceName, MacAddr, NetDeviceInfo, ScanSettings, MAC_LEN};
use crate::wire::{WireReader, WireWriter};

// ----------------------------------------------------------------------------
// Decode Helper
// ----------------------------------------------------------------------------

macro_rules! whole_buffer_decode {
    ($ty:ty) => {
        impl $ty {
            pub fn decode(data: &[u8]) -> Result<Self, HalError> {
                let mut reader = WireReader::new(data);
                let msg = Self::decode_fields(&mut reader)?;
                reader.finish()?;
                Ok(msg)
            }
        }
    };
}

// ----------------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------------

/// Request shape shared by every operation addressed at a bound feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfaceRequest {
    pub if_name: String,
}

impl IfaceRequest {
    pub fn new<T: Into<String>>(if_name: T) -> Self {
        Self {
            if_name: if_name.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
        })
    }
}
whole_buffer_decode!(IfaceRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFeatureRequest {
    pub role: i32,
}

impl CreateFeatureRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_i32(self.role);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            role: reader.read_i32()?,
        })
    }
}
whole_buffer_decode!(CreateFeatureRequest);

/// Capacity-carrying request for the support-set queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityRequest {
    pub capacity: u32,
}

impl CapacityRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.capacity);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            capacity: reader.read_u32()?,
        })
    }
}
whole_buffer_decode!(CapacityRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetDriverRequest {
    pub chip_id: u8,
    pub if_name: String,
}

impl ResetDriverRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u8(self.chip_id);
        writer.write_str(&self.if_name)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            chip_id: reader.read_u8()?,
            if_name: reader.read_str()?,
        })
    }
}
whole_buffer_decode!(ResetDriverRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssociatedStasRequest {
    pub if_name: String,
    pub capacity: u32,
}

impl GetAssociatedStasRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_u32(self.capacity);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            capacity: reader.read_u32()?,
        })
    }
}
whole_buffer_decode!(GetAssociatedStasRequest);

/// Country code plus the caller-declared length, which must equal the
/// code's own byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCountryCodeRequest {
    pub if_name: String,
    pub code: String,
    pub declared_len: u32,
}

impl SetCountryCodeRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_str(&self.code)?;
        writer.write_u32(self.declared_len);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            code: reader.read_str()?,
            declared_len: reader.read_u32()?,
        })
    }
}
whole_buffer_decode!(SetCountryCodeRequest);

/// MAC-carrying request; the MAC is kept raw so length validation stays
/// with the feature operation, not the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacRequest {
    pub if_name: String,
    pub mac: Vec<u8>,
}

impl MacRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_bytes(&self.mac)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            mac: reader.read_bytes()?,
        })
    }
}
whole_buffer_decode!(MacRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFreqsRequest {
    pub if_name: String,
    pub band: i32,
    pub capacity: u32,
}

impl GetFreqsRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_i32(self.band);
        writer.write_u32(self.capacity);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            band: reader.read_i32()?,
            capacity: reader.read_u32()?,
        })
    }
}
whole_buffer_decode!(GetFreqsRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTxPowerRequest {
    pub if_name: String,
    pub power: i32,
}

impl SetTxPowerRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_i32(self.power);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            power: reader.read_i32()?,
        })
    }
}
whole_buffer_decode!(SetTxPowerRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetIfNamesByChipIdRequest {
    pub chip_id: u8,
}

impl GetIfNamesByChipIdRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u8(self.chip_id);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            chip_id: reader.read_u8()?,
        })
    }
}
whole_buffer_decode!(GetIfNamesByChipIdRequest);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartScanRequest {
    pub if_name: String,
    pub settings: ScanSettings,
}

impl StartScanRequest {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        encode_scan_settings(&mut writer, &self.settings)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            settings: decode_scan_settings(reader)?,
        })
    }
}
whole_buffer_decode!(StartScanRequest);

/// Scan settings share one wire shape between the IPC request and the
/// driver command: bssid (empty buffer when absent), ssid list, extra IEs,
/// frequency list, then the two flag bytes.
pub fn encode_scan_settings(
    writer: &mut WireWriter,
    settings: &ScanSettings,
) -> Result<(), HalError> {
    match settings.bssid {
        Some(mac) => writer.write_bytes(mac.as_bytes())?,
        None => writer.write_bytes(&[])?,
    };
    writer.write_u32(settings.ssids.len() as u32);
    for ssid in &settings.ssids {
        writer.write_str(ssid)?;
    }
    writer.write_bytes(&settings.extra_ies)?;
    writer.write_u32(settings.freqs.len() as u32);
    for freq in &settings.freqs {
        writer.write_i32(*freq);
    }
    writer.write_u8(settings.prefix_ssid_scan as u8);
    writer.write_u8(settings.fast_connect as u8);
    Ok(())
}

pub fn decode_scan_settings(reader: &mut WireReader<'_>) -> Result<ScanSettings, HalError> {
    let bssid_raw = reader.read_bytes()?;
    let bssid = if bssid_raw.is_empty() {
        None
    } else {
        Some(MacAddr::from_bytes(&bssid_raw)?)
    };
    let ssid_count = reader.read_u32()? as usize;
    let mut ssids = Vec::with_capacity(ssid_count.min(64));
    for _ in 0..ssid_count {
        ssids.push(reader.read_str()?);
    }
    let extra_ies = reader.read_bytes()?;
    let freq_count = reader.read_u32()? as usize;
    let mut freqs = Vec::with_capacity(freq_count.min(64));
    for _ in 0..freq_count {
        freqs.push(reader.read_i32()?);
    }
    let prefix_ssid_scan = reader.read_u8()? != 0;
    let fast_connect = reader.read_u8()? != 0;
    Ok(ScanSettings {
        bssid,
        ssids,
        extra_ies,
        freqs,
        prefix_ssid_scan,
        fast_connect,
    })
}

// ----------------------------------------------------------------------------
// Responses
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFeatureResponse {
    pub if_name: String,
    pub role: i32,
}

impl CreateFeatureResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        writer.write_i32(self.role);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
            role: reader.read_i32()?,
        })
    }
}
whole_buffer_decode!(CreateFeatureResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTypeResponse {
    pub role: i32,
}

impl FeatureTypeResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_i32(self.role);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            role: reader.read_i32()?,
        })
    }
}
whole_buffer_decode!(FeatureTypeResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfaceNameResponse {
    pub if_name: String,
}

impl IfaceNameResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_str(&self.if_name)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            if_name: reader.read_str()?,
        })
    }
}
whole_buffer_decode!(IfaceNameResponse);

/// Union of per-role support flags plus the trailing combo flag, one byte
/// each (0 or 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFeatureResponse {
    pub flags: Vec<u8>,
}

impl SupportFeatureResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_bytes(&self.flags)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            flags: reader.read_bytes()?,
        })
    }
}
whole_buffer_decode!(SupportFeatureResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportComboResponse {
    pub combos: Vec<u64>,
}

impl SupportComboResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.combos.len() as u32);
        for combo in &self.combos {
            writer.write_u64(*combo);
        }
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let count = reader.read_u32()? as usize;
        let mut combos = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            combos.push(reader.read_u64()?);
        }
        Ok(Self { combos })
    }
}
whole_buffer_decode!(SupportComboResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacAddressResponse {
    pub mac: MacAddr,
}

impl MacAddressResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_bytes(self.mac.as_bytes())?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let raw = reader.read_bytes()?;
        Ok(Self {
            mac: MacAddr::from_bytes(&raw)?,
        })
    }
}
whole_buffer_decode!(MacAddressResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqsResponse {
    pub freqs: Vec<i32>,
}

impl FreqsResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.freqs.len() as u32);
        for freq in &self.freqs {
            writer.write_i32(*freq);
        }
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let count = reader.read_u32()? as usize;
        let mut freqs = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            freqs.push(reader.read_i32()?);
        }
        Ok(Self { freqs })
    }
}
whole_buffer_decode!(FreqsResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipIdResponse {
    pub chip_id: u8,
}

impl ChipIdResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u8(self.chip_id);
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        Ok(Self {
            chip_id: reader.read_u8()?,
        })
    }
}
whole_buffer_decode!(ChipIdResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfNamesResponse {
    pub names: Vec<String>,
}

impl IfNamesResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.names.len() as u32);
        for name in &self.names {
            writer.write_str(name)?;
        }
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let count = reader.read_u32()? as usize;
        let mut names = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            names.push(reader.read_str()?);
        }
        Ok(Self { names })
    }
}
whole_buffer_decode!(IfNamesResponse);

/// Associated stations as a count plus a packed 6-byte-per-entry blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedStasResponse {
    pub macs: Vec<MacAddr>,
}

impl AssociatedStasResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.macs.len() as u32);
        let mut blob = Vec::with_capacity(self.macs.len() * MAC_LEN);
        for mac in &self.macs {
            blob.extend_from_slice(mac.as_bytes());
        }
        writer.write_bytes(&blob)?;
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let count = reader.read_u32()? as usize;
        let blob = reader.read_bytes()?;
        if blob.len() != count * MAC_LEN {
            return Err(HalError::invalid_param(format!(
                "station blob of {} bytes does not hold {count} addresses",
                blob.len()
            )));
        }
        let macs = blob
            .chunks_exact(MAC_LEN)
            .map(MacAddr::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { macs })
    }
}
whole_buffer_decode!(AssociatedStasResponse);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDevInfoResponse {
    pub infos: Vec<NetDeviceInfo>,
}

impl NetDevInfoResponse {
    pub fn encode(&self) -> Result<Vec<u8>, HalError> {
        let mut writer = WireWriter::new();
        writer.write_u32(self.infos.len() as u32);
        for info in &self.infos {
            writer.write_u32(info.index);
            writer.write_str(info.if_name.as_str())?;
            writer.write_u8(info.iface_type);
            writer.write_bytes(info.mac.as_bytes())?;
        }
        Ok(writer.finish())
    }

    pub fn decode_fields(reader: &mut WireReader<'_>) -> Result<Self, HalError> {
        let count = reader.read_u32()? as usize;
        let mut infos = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let index = reader.read_u32()?;
            let if_name = IfaceName::new(reader.read_str()?)?;
            let iface_type = reader.read_u8()?;
            let mac = MacAddr::from_bytes(&reader.read_bytes()?)?;
            infos.push(NetDeviceInfo {
                index,
                if_name,
                iface_type,
                mac,
            });
        }
        Ok(Self { infos })
    }
}
whole_buffer_decode!(NetDevInfoResponse);

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IfaceType;

    #[test]
    fn test_create_feature_roundtrip() {
        let req = CreateFeatureRequest {
            role: IfaceType::Ap.as_u8() as i32,
        };
        assert_eq!(CreateFeatureRequest::decode(&req.encode().unwrap()).unwrap(), req);

        let resp = CreateFeatureResponse {
            if_name: "wlan0".into(),
            role: IfaceType::Ap.as_u8() as i32,
        };
        assert_eq!(
            CreateFeatureResponse::decode(&resp.encode().unwrap()).unwrap(),
            resp
        );
    }

    #[test]
    fn test_mac_request_roundtrip() {
        let req = MacRequest {
            if_name: "wlan1".into(),
            mac: vec![1, 2, 3, 4, 5, 6],
        };
        assert_eq!(MacRequest::decode(&req.encode().unwrap()).unwrap(), req);
    }

    #[test]
    fn test_country_code_roundtrip() {
        let req = SetCountryCodeRequest {
            if_name: "wlan0".into(),
            code: "CN".into(),
            declared_len: 2,
        };
        assert_eq!(
            SetCountryCodeRequest::decode(&req.encode().unwrap()).unwrap(),
            req
        );
    }

    #[test]
    fn test_freqs_response_roundtrip() {
        let resp = FreqsResponse {
            freqs: vec![2412, 2417, 2422, 2467, 2472],
        };
        assert_eq!(FreqsResponse::decode(&resp.encode().unwrap()).unwrap(), resp);

        let empty = FreqsResponse { freqs: Vec::new() };
        assert_eq!(
            FreqsResponse::decode(&empty.encode().unwrap()).unwrap(),
            empty
        );
    }

    #[test]
    fn test_associated_stas_roundtrip() {
        let resp = AssociatedStasResponse {
            macs: vec![
                MacAddr::new([1, 2, 3, 4, 5, 6]),
                MacAddr::new([7, 8, 9, 10, 11, 12]),
            ],
        };
        assert_eq!(
            AssociatedStasResponse::decode(&resp.encode().unwrap()).unwrap(),
            resp
        );
    }

    #[test]
    fn test_associated_stas_blob_length_mismatch() {
        let mut writer = WireWriter::new();
        writer.write_u32(2);
        writer.write_bytes(&[0u8; 7]).unwrap();
        assert!(AssociatedStasResponse::decode(&writer.finish()).is_err());
    }

    #[test]
    fn test_scan_request_roundtrip() {
        let req = StartScanRequest {
            if_name: "wlan0".into(),
            settings: ScanSettings {
                bssid: Some(MacAddr::new([6, 5, 4, 3, 2, 1])),
                ssids: vec!["office".into(), "lab".into()],
                extra_ies: vec![0xDD, 0x05, 1, 2, 3, 4, 5],
                freqs: vec![2412, 5180],
                prefix_ssid_scan: true,
                fast_connect: false,
            },
        };
        assert_eq!(StartScanRequest::decode(&req.encode().unwrap()).unwrap(), req);
    }

    #[test]
    fn test_scan_request_broadcast_bssid() {
        let req = StartScanRequest {
            if_name: "wlan0".into(),
            settings: ScanSettings::default(),
        };
        let decoded = StartScanRequest::decode(&req.encode().unwrap()).unwrap();
        assert_eq!(decoded.settings.bssid, None);
    }

    #[test]
    fn test_netdev_info_roundtrip() {
        let resp = NetDevInfoResponse {
            infos: vec![NetDeviceInfo {
                index: 3,
                if_name: IfaceName::new("wlan0").unwrap(),
                iface_type: IfaceType::Station.as_u8(),
                mac: MacAddr::new([0xA, 0xB, 0xC, 0xD, 0xE, 0xF]),
            }],
        };
        assert_eq!(
            NetDevInfoResponse::decode(&resp.encode().unwrap()).unwrap(),
            resp
        );
    }

    #[test]
    fn test_support_combo_roundtrip() {
        let resp = SupportComboResponse {
            combos: vec![0x0101, 0x0202, u64::MAX],
        };
        assert_eq!(
            SupportComboResponse::decode(&resp.encode().unwrap()).unwrap(),
            resp
        );
    }

    #[test]
    fn test_trailing_data_rejected() {
        let mut buf = IfaceRequest::new("wlan0").encode().unwrap();
        buf.push(0x01);
        buf.push(0x00);
        assert!(IfaceRequest::decode(&buf).is_err());
    }
}
