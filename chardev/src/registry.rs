//! Named device nodes.
//!
//! Registering a device makes it reachable by name; unregistering makes it
//! unreachable. Sessions already open keep their device alive, and the
//! device is deactivated when the last reference goes away.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::info;
use spin::RwLock;

use crate::device::Device;
use crate::session::Session;

/// Registry errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No device is registered under that name.
    NotFound,
    /// The name is already taken.
    AlreadyExists,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound => write!(f, "no such device"),
            RegistryError::AlreadyExists => write!(f, "device already exists"),
        }
    }
}

pub struct DeviceRegistry {
    nodes: RwLock<BTreeMap<String, Arc<Device>>>,
}

impl DeviceRegistry {
    pub const fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Expose `device` under its own name.
    pub fn register(&self, device: Arc<Device>) -> Result<(), RegistryError> {
        let mut nodes = self.nodes.write();
        let name = device.name();

        if nodes.contains_key(name) {
            return Err(RegistryError::AlreadyExists);
        }

        nodes.insert(String::from(name), device);
        info!("registry: created /dev/{}", name);
        Ok(())
    }

    /// Remove the node called `name`, returning its device.
    pub fn unregister(&self, name: &str) -> Result<Arc<Device>, RegistryError> {
        let device = self
            .nodes
            .write()
            .remove(name)
            .ok_or(RegistryError::NotFound)?;

        info!("registry: removed /dev/{}", name);
        Ok(device)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Device>> {
        self.nodes.read().get(name).cloned()
    }

    /// Open a new session on the node called `name`.
    pub fn open(&self, name: &str) -> Result<(Arc<Device>, Session), RegistryError> {
        let device = self.get(name).ok_or(RegistryError::NotFound)?;
        let session = device.open();
        Ok((device, session))
    }

    pub fn list(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use drivers::hw::sim::SimMapper;

    #[test]
    fn names_are_unique() {
        let registry = DeviceRegistry::new();
        registry
            .register(Arc::new(Device::buffer_only(16).unwrap()))
            .unwrap();

        assert_eq!(
            registry.register(Arc::new(Device::buffer_only(16).unwrap())),
            Err(RegistryError::AlreadyExists)
        );
        assert_eq!(registry.list(), ["simple_dev"]);
    }

    #[test]
    fn unregistered_node_is_unreachable_but_sessions_survive() {
        let mapper = SimMapper::new();
        let registry = DeviceRegistry::new();
        let led = Device::activate(&DeviceConfig::default(), &mapper).unwrap();
        registry.register(Arc::new(led)).unwrap();

        let (device, mut session) = registry.open("gpio_led").unwrap();
        registry.unregister("gpio_led").unwrap();

        assert_eq!(registry.open("gpio_led").err(), Some(RegistryError::NotFound));
        assert_eq!(device.write(&mut session, b"1"), Ok(1));
        assert_eq!(mapper.live_mappings(), 1);

        drop(session);
        drop(device);
        assert_eq!(mapper.live_mappings(), 0);
    }
}
