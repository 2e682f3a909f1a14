//! Subscriber table and event fan-out
//!
//! Remote clients register here to receive asynchronous driver events. The
//! table installs itself as the driver's event listener while at least one
//! subscriber exists, and fans every event out in registration order. The
//! table has its own lock, distinct from the lifecycle lock, so event
//! delivery never contends with Start/Stop.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use wlanhal_core::driver::{DriverClient, DriverEvent, EventListener};
use wlanhal_core::errors::{HalError, Result};
use wlanhal_core::protocol::EventMessage;
use wlanhal_core::types::ClientId;

// ----------------------------------------------------------------------------
// Subscriber Table
// ----------------------------------------------------------------------------

/// Channel over which a subscriber receives encoded event frames
pub type EventChannel = mpsc::UnboundedSender<Vec<u8>>;

struct SubscriberEntry {
    client: ClientId,
    channel: EventChannel,
}

/// Registered event subscribers with broadcast delivery
pub struct SubscriberTable {
    driver: Arc<dyn DriverClient>,
    entries: Mutex<Vec<SubscriberEntry>>,
}

impl SubscriberTable {
    pub fn new(driver: Arc<dyn DriverClient>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Add a subscriber. The first registration starts driver event
    /// forwarding; a duplicate identity is rejected without touching the
    /// table.
    pub fn register(self: &Arc<Self>, client: ClientId, channel: EventChannel) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.client == client) {
            return Err(HalError::AlreadyRegistered(client.as_u32()));
        }
        if entries.is_empty() {
            let listener: Arc<dyn EventListener> = self.clone();
            self.driver.register_event_listener(listener)?;
        }
        entries.push(SubscriberEntry { client, channel });
        debug!(%client, subscribers = entries.len(), "event subscriber registered");
        Ok(())
    }

    /// Remove a subscriber. Removing the last one stops driver event
    /// forwarding.
    pub fn unregister(&self, client: ClientId) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.client != client);
        if entries.len() == before {
            return Err(HalError::invalid_param(format!("{client} is not registered")));
        }
        if entries.is_empty() {
            self.driver.unregister_event_listener();
        }
        debug!(%client, subscribers = entries.len(), "event subscriber unregistered");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver one event to every subscriber, in registration order. A
    /// failed delivery is logged and skipped; it never blocks the rest.
    pub fn dispatch(&self, event: &DriverEvent) {
        let message = EventMessage {
            kind: event.kind,
            if_name: event.if_name.clone(),
            payload: event.payload.clone(),
        };
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(?event.kind, %err, "dropping undeliverable event");
                return;
            }
        };
        let entries = self.entries.lock().unwrap();
        for entry in entries.iter() {
            if entry.channel.send(frame.clone()).is_err() {
                warn!(client = %entry.client, ?event.kind, "event delivery failed, skipping subscriber");
            }
        }
    }
}

impl EventListener for SubscriberTable {
    fn on_event(&self, event: DriverEvent) {
        self.dispatch(&event);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wlanhal_core::driver::FakeDriverClient;
    use wlanhal_core::protocol::DriverEventKind;
    use wlanhal_core::types::{IfaceName, IfaceType, InterfaceInfo};

    fn table() -> (Arc<FakeDriverClient>, Arc<SubscriberTable>) {
        let driver = Arc::new(FakeDriverClient::with_interfaces(vec![
            InterfaceInfo::with_modes(IfaceName::new("wlan0").unwrap(), &[IfaceType::Station]),
        ]));
        let subscribers = SubscriberTable::new(driver.clone());
        (driver, subscribers)
    }

    #[test]
    fn test_first_and_last_subscriber_toggle_forwarding() {
        let (driver, table) = table();
        assert!(!driver.has_listener());

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        table.register(ClientId::new(1), tx1).unwrap();
        assert!(driver.has_listener());
        table.register(ClientId::new(2), tx2).unwrap();

        table.unregister(ClientId::new(1)).unwrap();
        assert!(driver.has_listener());
        table.unregister(ClientId::new(2)).unwrap();
        assert!(!driver.has_listener());
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let (_driver, table) = table();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        table.register(ClientId::new(7), tx1).unwrap();
        assert!(matches!(
            table.register(ClientId::new(7), tx2).unwrap_err(),
            HalError::AlreadyRegistered(7)
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unregister_unknown_client() {
        let (_driver, table) = table();
        assert!(table.unregister(ClientId::new(9)).is_err());
    }

    #[test]
    fn test_fanout_reaches_every_subscriber_once() {
        let (driver, table) = table();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        table.register(ClientId::new(1), tx1).unwrap();
        table.register(ClientId::new(2), tx2).unwrap();

        driver.emit_event(DriverEventKind::ScanDone, "wlan0", &[9, 9]);

        let frame = rx1.try_recv().unwrap();
        let message = EventMessage::decode(&frame).unwrap();
        assert_eq!(message.kind, DriverEventKind::ScanDone);
        assert_eq!(message.payload, vec![9, 9]);
        assert!(rx1.try_recv().is_err());

        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dead_subscriber_does_not_block_others() {
        let (driver, table) = table();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        table.register(ClientId::new(1), tx1).unwrap();
        table.register(ClientId::new(2), tx2).unwrap();
        drop(rx1); // first subscriber's channel is gone

        driver.emit_event(DriverEventKind::Disconnect, "wlan0", &[]);
        assert!(rx2.try_recv().is_ok());
    }
}
