//! Interface registry
//!
//! The inventory of network interfaces the driver reported, each with its
//! supported roles and a binding flag. Descriptors are owned by value in a
//! vector; the binding flag replaces the raw back-pointer a feature would
//! otherwise hold, so at most one live feature can ever claim an interface.

use wlanhal_core::errors::{HalError, Result};
use wlanhal_core::types::{IfaceName, IfaceType, InterfaceInfo, IFACE_TYPE_COUNT};

// ----------------------------------------------------------------------------
// Interface Descriptor
// ----------------------------------------------------------------------------

/// One registry entry: a network interface, its role support set, and
/// whether a feature currently claims it.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    pub name: IfaceName,
    pub support_modes: [bool; IFACE_TYPE_COUNT],
    pub bound: bool,
}

impl InterfaceDescriptor {
    pub fn supports(&self, mode: IfaceType) -> bool {
        self.support_modes[mode.as_u8() as usize]
    }
}

// ----------------------------------------------------------------------------
// Interface Registry
// ----------------------------------------------------------------------------

/// Inventory of known interfaces, in driver discovery order
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    descriptors: Vec<InterfaceDescriptor>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the inventory with a fresh discovery report. Existing
    /// bindings do not survive: the previous generation of descriptors is
    /// dropped wholesale, never partially.
    pub fn populate(&mut self, infos: Vec<InterfaceInfo>) {
        self.descriptors = infos
            .into_iter()
            .map(|info| InterfaceDescriptor {
                name: info.name,
                support_modes: info.support_modes,
                bound: false,
            })
            .collect();
    }

    /// First unbound descriptor supporting `mode`, in discovery order
    pub fn find_unbound(&mut self, mode: IfaceType) -> Option<&mut InterfaceDescriptor> {
        self.descriptors
            .iter_mut()
            .find(|d| !d.bound && d.supports(mode))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&InterfaceDescriptor> {
        self.descriptors.iter().find(|d| d.name.as_str() == name)
    }

    fn find_by_name_mut(&mut self, name: &str) -> Option<&mut InterfaceDescriptor> {
        self.descriptors
            .iter_mut()
            .find(|d| d.name.as_str() == name)
    }

    /// Release the binding on `name`. Unknown names are an error; the
    /// caller holds a feature whose descriptor must still exist.
    pub fn unbind(&mut self, name: &str) -> Result<()> {
        let descriptor = self
            .find_by_name_mut(name)
            .ok_or_else(|| HalError::invalid_param(format!("no descriptor named {name}")))?;
        descriptor.bound = false;
        Ok(())
    }

    /// Drop every descriptor; idempotent.
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Vec<InterfaceInfo> {
        vec![
            InterfaceInfo::with_modes(
                IfaceName::new("wlan0").unwrap(),
                &[IfaceType::Station, IfaceType::Ap],
            ),
            InterfaceInfo::with_modes(IfaceName::new("wlan1").unwrap(), &[IfaceType::Ap]),
        ]
    }

    #[test]
    fn test_find_unbound_is_discovery_ordered() {
        let mut registry = InterfaceRegistry::new();
        registry.populate(inventory());

        let first = registry.find_unbound(IfaceType::Ap).unwrap();
        assert_eq!(first.name.as_str(), "wlan0");
        first.bound = true;

        let second = registry.find_unbound(IfaceType::Ap).unwrap();
        assert_eq!(second.name.as_str(), "wlan1");
        second.bound = true;

        assert!(registry.find_unbound(IfaceType::Ap).is_none());
    }

    #[test]
    fn test_unbind_releases_descriptor() {
        let mut registry = InterfaceRegistry::new();
        registry.populate(inventory());
        registry.find_unbound(IfaceType::Station).unwrap().bound = true;
        assert!(registry.find_unbound(IfaceType::Station).is_none());

        registry.unbind("wlan0").unwrap();
        assert_eq!(
            registry.find_unbound(IfaceType::Station).unwrap().name.as_str(),
            "wlan0"
        );
        assert!(registry.unbind("wlan9").is_err());
    }

    #[test]
    fn test_populate_clears_previous_generation() {
        let mut registry = InterfaceRegistry::new();
        registry.populate(inventory());
        registry.find_unbound(IfaceType::Ap).unwrap().bound = true;

        registry.populate(inventory());
        assert!(registry.iter().all(|d| !d.bound));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut registry = InterfaceRegistry::new();
        registry.populate(inventory());
        registry.clear();
        assert!(registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
    }
}
