//! Command dispatcher
//!
//! Maps an inbound opcode to its handler: verify the interface token,
//! decode the typed request, invoke the service, encode the reply. The
//! response frame always leads with the i32 status; a failed request
//! carries the status alone.

use std::sync::Arc;

use tracing::{debug, trace};

use wlanhal_core::errors::{HalError, Result, STATUS_SUCCESS};
use wlanhal_core::protocol::messages::{
    AssociatedStasResponse, CapacityRequest, ChipIdResponse, CreateFeatureRequest,
    CreateFeatureResponse, FeatureTypeResponse, FreqsResponse, GetAssociatedStasRequest,
    GetFreqsRequest, GetIfNamesByChipIdRequest, IfNamesResponse, IfaceNameResponse, IfaceRequest,
    MacAddressResponse, MacRequest, NetDevInfoResponse, ResetDriverRequest, SetCountryCodeRequest,
    SetTxPowerRequest, StartScanRequest, SupportComboResponse, SupportFeatureResponse,
};
use wlanhal_core::protocol::{ServiceCommand, INTERFACE_TOKEN};
use wlanhal_core::types::{ClientId, IfaceType};
use wlanhal_core::wire::{WireReader, WireWriter};

use crate::lifecycle::WlanService;
use crate::subscribers::EventChannel;

// ----------------------------------------------------------------------------
// Call Context
// ----------------------------------------------------------------------------

/// Per-request caller context supplied by the connection layer
#[derive(Clone)]
pub struct CallContext {
    /// Authenticated identity of the caller
    pub client: ClientId,
    /// Channel for event frames, present when the connection can receive
    /// asynchronous pushes
    pub event_channel: Option<EventChannel>,
}

impl CallContext {
    pub fn new(client: ClientId) -> Self {
        Self {
            client,
            event_channel: None,
        }
    }

    pub fn with_event_channel(client: ClientId, channel: EventChannel) -> Self {
        Self {
            client,
            event_channel: Some(channel),
        }
    }
}

// ----------------------------------------------------------------------------
// Request/Response Framing Helpers
// ----------------------------------------------------------------------------

/// Prefix `body` with the interface token, producing a request payload
pub fn request_payload(body: &[u8]) -> Result<Vec<u8>> {
    let mut writer = WireWriter::new();
    writer.write_str(INTERFACE_TOKEN)?;
    let mut payload = writer.finish();
    payload.extend_from_slice(body);
    Ok(payload)
}

/// Split a response frame into its status and command-specific body
pub fn split_response(frame: &[u8]) -> Result<(i32, Vec<u8>)> {
    let mut reader = WireReader::new(frame);
    let status = reader.read_i32()?;
    Ok((status, reader.remaining_slice().to_vec()))
}

fn response_frame(status: i32, body: &[u8]) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.write_i32(status);
    let mut frame = writer.finish();
    frame.extend_from_slice(body);
    frame
}

// ----------------------------------------------------------------------------
// Command Dispatcher
// ----------------------------------------------------------------------------

/// IPC-facing dispatcher over the service surface
pub struct CommandDispatcher {
    service: Arc<WlanService>,
}

impl CommandDispatcher {
    pub fn new(service: Arc<WlanService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<WlanService> {
        &self.service
    }

    /// Handle one request and produce the response frame. Every failure,
    /// including an unknown opcode or a malformed payload, is reported
    /// through the status field.
    pub fn dispatch(&self, ctx: &CallContext, opcode: u32, payload: &[u8]) -> Vec<u8> {
        match self.handle(ctx, opcode, payload) {
            Ok(body) => response_frame(STATUS_SUCCESS, &body),
            Err(err) => {
                debug!(opcode, client = %ctx.client, %err, "request failed");
                response_frame(err.status(), &[])
            }
        }
    }

    fn handle(&self, ctx: &CallContext, opcode: u32, payload: &[u8]) -> Result<Vec<u8>> {
        let command = ServiceCommand::from_u32(opcode)?;
        trace!(?command, client = %ctx.client, "dispatching");

        let mut reader = WireReader::new(payload);
        let token = reader.read_str()?;
        if token != INTERFACE_TOKEN {
            return Err(HalError::invalid_param(format!(
                "unexpected interface token {token:?}"
            )));
        }

        let service = self.service.as_ref();
        match command {
            ServiceCommand::Construct => {
                reader.finish()?;
                service.construct()?;
                Ok(Vec::new())
            }
            ServiceCommand::Destruct => {
                reader.finish()?;
                service.destruct()?;
                Ok(Vec::new())
            }
            ServiceCommand::Start => {
                reader.finish()?;
                service.start()?;
                Ok(Vec::new())
            }
            ServiceCommand::Stop => {
                reader.finish()?;
                service.stop()?;
                Ok(Vec::new())
            }
            ServiceCommand::GetSupportFeature => {
                let req = CapacityRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let flags = service.get_supported_modes(req.capacity)?;
                SupportFeatureResponse { flags }.encode()
            }
            ServiceCommand::GetSupportCombo => {
                let req = CapacityRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let combos = service.get_supported_combos(req.capacity)?;
                SupportComboResponse { combos }.encode()
            }
            ServiceCommand::CreateFeature => {
                let req = CreateFeatureRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let role = IfaceType::from_i32(req.role)?;
                let (if_name, role) = service.create_feature(role)?;
                CreateFeatureResponse {
                    if_name: if_name.as_str().to_owned(),
                    role: role.as_u8() as i32,
                }
                .encode()
            }
            ServiceCommand::GetFeatureByIfName => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let (_, role) = service.get_feature_by_if_name(&req.if_name)?;
                FeatureTypeResponse {
                    role: role.as_u8() as i32,
                }
                .encode()
            }
            ServiceCommand::RegisterEventCallback => {
                reader.finish()?;
                let channel = ctx.event_channel.clone().ok_or_else(|| {
                    HalError::invalid_param("connection cannot receive event pushes")
                })?;
                service.subscribers().register(ctx.client, channel)?;
                Ok(Vec::new())
            }
            ServiceCommand::UnregisterEventCallback => {
                reader.finish()?;
                service.subscribers().unregister(ctx.client)?;
                Ok(Vec::new())
            }
            ServiceCommand::DestroyFeature => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.destroy_feature(&req.if_name)?;
                Ok(Vec::new())
            }
            ServiceCommand::ResetDriver => {
                let req = ResetDriverRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.reset_driver(ctx.client, req.chip_id, &req.if_name)?;
                Ok(Vec::new())
            }
            ServiceCommand::GetAssociatedStas => {
                let req = GetAssociatedStasRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let macs = service.get_associated_stations(&req.if_name, req.capacity)?;
                AssociatedStasResponse { macs }.encode()
            }
            ServiceCommand::SetCountryCode => {
                let req = SetCountryCodeRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.set_country_code(&req.if_name, &req.code, req.declared_len)?;
                Ok(Vec::new())
            }
            ServiceCommand::GetNetworkIfaceName => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let (if_name, _) = service.get_feature_by_if_name(&req.if_name)?;
                IfaceNameResponse {
                    if_name: if_name.as_str().to_owned(),
                }
                .encode()
            }
            ServiceCommand::GetFeatureType => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let (_, role) = service.get_feature_by_if_name(&req.if_name)?;
                FeatureTypeResponse {
                    role: role.as_u8() as i32,
                }
                .encode()
            }
            ServiceCommand::SetMacAddress => {
                let req = MacRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.set_mac_address(&req.if_name, &req.mac)?;
                Ok(Vec::new())
            }
            ServiceCommand::GetMacAddress => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let mac = service.get_device_mac_address(&req.if_name)?;
                MacAddressResponse { mac }.encode()
            }
            ServiceCommand::GetFreqsWithBand => {
                let req = GetFreqsRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let freqs = service.get_valid_freqs(&req.if_name, req.band, req.capacity)?;
                FreqsResponse { freqs }.encode()
            }
            ServiceCommand::SetTxPower => {
                let req = SetTxPowerRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.set_tx_power(&req.if_name, req.power)?;
                Ok(Vec::new())
            }
            ServiceCommand::GetChipId => {
                let req = IfaceRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let chip_id = service.get_chip_id(&req.if_name)?;
                ChipIdResponse { chip_id }.encode()
            }
            ServiceCommand::GetIfNamesByChipId => {
                let req = GetIfNamesByChipIdRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let names = service.get_iface_names_by_chip_id(req.chip_id)?;
                IfNamesResponse { names }.encode()
            }
            ServiceCommand::SetScanMacAddress => {
                let req = MacRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                let declared_len = req.mac.len();
                service.set_scanning_mac_address(&req.if_name, &req.mac, declared_len)?;
                Ok(Vec::new())
            }
            ServiceCommand::GetNetDevInfo => {
                reader.finish()?;
                let infos = service.get_net_device_info()?;
                NetDevInfoResponse { infos }.encode()
            }
            ServiceCommand::StartScan => {
                let req = StartScanRequest::decode_fields(&mut reader)?;
                reader.finish()?;
                service.start_scan(&req.if_name, &req.settings)?;
                Ok(Vec::new())
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wlanhal_core::config::HalConfig;
    use wlanhal_core::driver::FakeDriverClient;
    use wlanhal_core::errors::{STATUS_INVALID_PARAM, STATUS_NOT_AVAILABLE};
    use wlanhal_core::types::{IfaceName, InterfaceInfo};

    fn dispatcher() -> CommandDispatcher {
        let driver = Arc::new(FakeDriverClient::with_interfaces(vec![
            InterfaceInfo::with_modes(
                IfaceName::new("wlan0").unwrap(),
                &[IfaceType::Station, IfaceType::Ap],
            ),
        ]));
        let service = WlanService::new(driver, HalConfig::immediate());
        CommandDispatcher::new(service)
    }

    fn call(dispatcher: &CommandDispatcher, cmd: ServiceCommand, body: &[u8]) -> (i32, Vec<u8>) {
        let ctx = CallContext::new(ClientId::new(0));
        let payload = request_payload(body).unwrap();
        let frame = dispatcher.dispatch(&ctx, cmd.as_u32(), &payload);
        split_response(&frame).unwrap()
    }

    #[test]
    fn test_unknown_opcode_is_invalid_param() {
        let dispatcher = dispatcher();
        let ctx = CallContext::new(ClientId::new(0));
        let payload = request_payload(&[]).unwrap();
        let frame = dispatcher.dispatch(&ctx, 4096, &payload);
        let (status, body) = split_response(&frame).unwrap();
        assert_eq!(status, STATUS_INVALID_PARAM);
        assert!(body.is_empty());
    }

    #[test]
    fn test_bad_token_is_rejected() {
        let dispatcher = dispatcher();
        let ctx = CallContext::new(ClientId::new(0));
        let mut writer = WireWriter::new();
        writer.write_str("some.other.interface").unwrap();
        let frame = dispatcher.dispatch(&ctx, ServiceCommand::Start.as_u32(), &writer.finish());
        let (status, _) = split_response(&frame).unwrap();
        assert_eq!(status, STATUS_INVALID_PARAM);
    }

    #[test]
    fn test_create_feature_roundtrip_through_dispatch() {
        let dispatcher = dispatcher();
        let (status, _) = call(&dispatcher, ServiceCommand::Construct, &[]);
        assert_eq!(status, STATUS_SUCCESS);
        let (status, _) = call(&dispatcher, ServiceCommand::Start, &[]);
        assert_eq!(status, STATUS_SUCCESS);

        let req = CreateFeatureRequest {
            role: IfaceType::Ap.as_u8() as i32,
        };
        let (status, body) = call(&dispatcher, ServiceCommand::CreateFeature, &req.encode().unwrap());
        assert_eq!(status, STATUS_SUCCESS);
        let resp = CreateFeatureResponse::decode(&body).unwrap();
        assert_eq!(resp.if_name, "wlan0");
        assert_eq!(resp.role, IfaceType::Ap.as_u8() as i32);

        // Only one interface: a second AP feature is not available
        let (status, body) = call(&dispatcher, ServiceCommand::CreateFeature, &req.encode().unwrap());
        assert_eq!(status, STATUS_NOT_AVAILABLE);
        assert!(body.is_empty());
    }

    #[test]
    fn test_trailing_request_fields_are_rejected() {
        let dispatcher = dispatcher();
        let (status, _) = call(&dispatcher, ServiceCommand::Construct, &[]);
        assert_eq!(status, STATUS_SUCCESS);

        let mut writer = WireWriter::new();
        writer.write_u32(99); // Start takes no fields
        let (status, _) = call(&dispatcher, ServiceCommand::Start, &writer.finish());
        assert_eq!(status, STATUS_INVALID_PARAM);
    }

    #[test]
    fn test_register_callback_requires_event_channel() {
        let dispatcher = dispatcher();
        let ctx = CallContext::new(ClientId::new(0));
        let payload = request_payload(&[]).unwrap();
        let frame =
            dispatcher.dispatch(&ctx, ServiceCommand::RegisterEventCallback.as_u32(), &payload);
        let (status, _) = split_response(&frame).unwrap();
        assert_eq!(status, STATUS_INVALID_PARAM);
    }
}
