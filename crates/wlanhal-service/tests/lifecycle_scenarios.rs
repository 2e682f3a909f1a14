//! End-to-end scenarios over the service surface, driven against the
//! scripted driver client.

use std::sync::Arc;

use tokio::sync::mpsc;

use wlanhal_core::config::HalConfig;
use wlanhal_core::driver::{DriverCmd, FakeDriverClient};
use wlanhal_core::errors::HalError;
use wlanhal_core::protocol::{DriverEventKind, EventMessage};
use wlanhal_core::types::{ClientId, IfaceName, IfaceType, InterfaceInfo, MacAddr};
use wlanhal_service::WlanService;

fn two_ap_inventory() -> Vec<InterfaceInfo> {
    vec![
        InterfaceInfo::with_modes(
            IfaceName::new("wlan0").unwrap(),
            &[IfaceType::Station, IfaceType::Ap],
        ),
        InterfaceInfo::with_modes(IfaceName::new("wlan1").unwrap(), &[IfaceType::Ap]),
    ]
}

fn started_service(
    inventory: Vec<InterfaceInfo>,
) -> (Arc<FakeDriverClient>, Arc<WlanService>) {
    let driver = Arc::new(FakeDriverClient::with_interfaces(inventory));
    let service = WlanService::new(driver.clone(), HalConfig::immediate());
    service.construct().unwrap();
    service.start().unwrap();
    (driver, service)
}

#[test]
fn ap_binding_exhaustion_and_reuse() {
    let (_driver, service) = started_service(two_ap_inventory());

    // Two interfaces support AP: the first two creates bind them in
    // discovery order, the third finds nothing free.
    let (first, _) = service.create_feature(IfaceType::Ap).unwrap();
    let (second, _) = service.create_feature(IfaceType::Ap).unwrap();
    assert_eq!(first.as_str(), "wlan0");
    assert_eq!(second.as_str(), "wlan1");
    assert!(matches!(
        service.create_feature(IfaceType::Ap).unwrap_err(),
        HalError::NotAvailable
    ));

    // Destroying the wlan0 feature frees its descriptor for reuse.
    service.destroy_feature("wlan0").unwrap();
    let (rebound, _) = service.create_feature(IfaceType::Ap).unwrap();
    assert_eq!(rebound.as_str(), "wlan0");
}

#[test]
fn no_two_features_share_a_descriptor() {
    let (_driver, service) = started_service(two_ap_inventory());

    let mut bound = Vec::new();
    while let Ok((name, _)) = service.create_feature(IfaceType::Ap) {
        bound.push(name.as_str().to_owned());
    }
    let mut deduped = bound.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(bound.len(), deduped.len(), "a descriptor was bound twice");
}

#[test]
fn restart_rebuilds_registry_without_stale_bindings() {
    let (_driver, service) = started_service(two_ap_inventory());
    service.create_feature(IfaceType::Ap).unwrap();
    service.create_feature(IfaceType::Station).unwrap_err(); // wlan0 is taken, wlan1 is AP-only

    for _ in 0..5 {
        service.stop().unwrap();
        service.start().unwrap();
    }

    // Nothing from the previous generations is still bound.
    service.create_feature(IfaceType::Station).unwrap();
    service.create_feature(IfaceType::Ap).unwrap();
}

#[test]
fn country_code_length_mismatch_scenario() {
    let (driver, service) = started_service(two_ap_inventory());
    service.create_feature(IfaceType::Ap).unwrap();

    assert!(matches!(
        service.set_country_code("wlan0", "CN", 3).unwrap_err(),
        HalError::InvalidParam { .. }
    ));
    assert_eq!(driver.call_count(DriverCmd::SetCountryCode), 0);

    service.set_country_code("wlan0", "CN", 2).unwrap();
    assert_eq!(driver.call_count(DriverCmd::SetCountryCode), 1);
}

#[test]
fn combo_query_on_single_role_driver() {
    let (driver, service) = started_service(two_ap_inventory());
    driver.set_combos(None);
    assert!(matches!(
        service.get_supported_combos(16).unwrap_err(),
        HalError::NotSupported
    ));
}

#[test]
fn unauthorized_reset_never_reaches_the_driver() {
    let (driver, service) = started_service(two_ap_inventory());

    let over_threshold = ClientId::new(20_000);
    assert!(matches!(
        service.reset_driver(over_threshold, 1, "wlan0").unwrap_err(),
        HalError::Unauthorized(20_000)
    ));
    assert_eq!(driver.call_count(DriverCmd::ResetDriver), 0);

    // Both well-known identities pass, as does anything under the threshold.
    service.reset_driver(ClientId::new(0), 1, "wlan0").unwrap();
    service.reset_driver(ClientId::new(1000), 1, "wlan0").unwrap();
    service.reset_driver(ClientId::new(42), 1, "wlan0").unwrap();
    assert_eq!(driver.call_count(DriverCmd::ResetDriver), 3);
}

#[test]
fn double_registration_does_not_duplicate_fanout() {
    let (driver, service) = started_service(two_ap_inventory());
    let subscribers = service.subscribers();

    let (tx, mut rx) = mpsc::unbounded_channel();
    subscribers.register(ClientId::new(7), tx.clone()).unwrap();
    assert!(matches!(
        subscribers.register(ClientId::new(7), tx).unwrap_err(),
        HalError::AlreadyRegistered(7)
    ));

    driver.emit_event(DriverEventKind::NewSta, "wlan0", &[1]);
    let frame = rx.try_recv().unwrap();
    let message = EventMessage::decode(&frame).unwrap();
    assert_eq!(message.kind, DriverEventKind::NewSta);
    assert!(rx.try_recv().is_err(), "event was delivered twice");
}

#[test]
fn device_mac_and_scan_mac_capability_flags() {
    let (driver, service) = started_service(two_ap_inventory());
    service.create_feature(IfaceType::Station).unwrap();

    let mac = service.get_device_mac_address("wlan0").unwrap();
    assert_ne!(mac, MacAddr::ZERO);

    driver.set_device_mac(None);
    assert!(matches!(
        service.get_device_mac_address("wlan0").unwrap_err(),
        HalError::NotSupported
    ));

    driver.set_scan_mac_supported(false);
    assert!(matches!(
        service
            .set_scanning_mac_address("wlan0", &[2, 2, 2, 2, 2, 2], 6)
            .unwrap_err(),
        HalError::NotSupported
    ));
}

#[test]
fn frequency_query_validates_capacity_locally() {
    let (driver, service) = started_service(two_ap_inventory());
    service.create_feature(IfaceType::Station).unwrap();

    assert!(matches!(
        service.get_valid_freqs("wlan0", 0, 4).unwrap_err(),
        HalError::InvalidParam { .. }
    ));
    assert_eq!(driver.call_count(DriverCmd::GetValidFreqs), 0);

    let freqs = service.get_valid_freqs("wlan0", 0, 14).unwrap();
    assert_eq!(freqs.first(), Some(&2412));
    assert_eq!(freqs.len(), 14);
}
