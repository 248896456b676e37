//! Mock systems backend for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::boot::{self, Gen1BootEntry};
use crate::error::{DriverError, HostError, Result};
use crate::traits::SystemsDriver;
use crate::types::*;

/// One generation-2 boot record in the mock object model: an opaque handle
/// plus the class it resolves to (`None` for records outside the known
/// classes).
#[derive(Debug, Clone)]
pub struct MockBootEntry {
    pub handle: String,
    pub class: Option<BootSource>,
}

/// A virtual machine in the mock object model.
#[derive(Debug, Clone)]
pub struct MockSystem {
    name: String,
    uuid: String,
    power: PowerState,
    generation: VmGeneration,
    gen1_order: Vec<Gen1BootEntry>,
    gen2_order: Vec<MockBootEntry>,
    nics: Vec<NicDescriptor>,
    memory_gib: Option<u64>,
    cpus: Option<u32>,
    storage: HashMap<String, SimpleStorage>,
    bios: HashMap<String, serde_json::Value>,
    bios_defaults: HashMap<String, serde_json::Value>,
}

impl MockSystem {
    /// Create a powered-off generation-2 system with a fresh UUID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4().to_string(),
            power: PowerState::Off,
            generation: VmGeneration::Gen2,
            gen1_order: Vec::new(),
            gen2_order: Vec::new(),
            nics: Vec::new(),
            memory_gib: Some(2),
            cpus: Some(2),
            storage: HashMap::new(),
            bios: HashMap::new(),
            bios_defaults: HashMap::new(),
        }
    }

    pub fn with_generation(mut self, generation: VmGeneration) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_gen1_order(mut self, order: Vec<Gen1BootEntry>) -> Self {
        self.gen1_order = order;
        self
    }

    pub fn with_gen2_entry(mut self, handle: impl Into<String>, class: Option<BootSource>) -> Self {
        self.gen2_order.push(MockBootEntry {
            handle: handle.into(),
            class,
        });
        self
    }

    pub fn with_nic(mut self, id: impl Into<String>, mac: impl Into<String>) -> Self {
        self.nics.push(NicDescriptor {
            id: id.into(),
            mac: mac.into(),
        });
        self
    }

    pub fn with_memory_gib(mut self, memory_gib: Option<u64>) -> Self {
        self.memory_gib = memory_gib;
        self
    }

    pub fn with_cpus(mut self, cpus: Option<u32>) -> Self {
        self.cpus = cpus;
        self
    }

    pub fn with_storage(mut self, controller: impl Into<String>, storage: SimpleStorage) -> Self {
        self.storage.insert(controller.into(), storage);
        self
    }

    pub fn with_bios(mut self, attributes: HashMap<String, serde_json::Value>) -> Self {
        self.bios_defaults = attributes.clone();
        self.bios = attributes;
        self
    }
}

/// In-memory systems backend.
///
/// Simulates the hypervisor's object model without a hypervisor, for unit
/// tests, development, and demo environments. State lives behind `RwLock`s
/// standing in for the backend's own object model; this driver still holds
/// nothing between calls.
pub struct MockDriver {
    systems: RwLock<HashMap<String, MockSystem>>,
    // volume name -> volume id
    volumes: RwLock<HashMap<String, String>>,
}

impl MockDriver {
    pub fn new() -> Self {
        info!("Creating mock systems driver");
        Self {
            systems: RwLock::new(HashMap::new()),
            volumes: RwLock::new(HashMap::new()),
        }
    }

    /// Add a system to the mock object model.
    pub fn with_system(self, system: MockSystem) -> Self {
        {
            let mut systems = self.systems.write().unwrap_or_else(|e| e.into_inner());
            systems.insert(system.name.clone(), system);
        }
        self
    }

    fn locked(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, MockSystem>>> {
        self.systems
            .write()
            .map_err(|_| DriverError::backend("access mock state", "mock", HostError::new("lock poisoned")))
    }

    fn with_vm<T>(&self, identity: &str, f: impl FnOnce(&mut MockSystem) -> T) -> Result<T> {
        let mut systems = self.locked()?;
        systems.get_mut(identity).map(f).ok_or_else(|| {
            DriverError::backend("look up system", identity, HostError::new("no such system"))
        })
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemsDriver for MockDriver {
    fn driver(&self) -> &'static str {
        "mock"
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn list_systems(&self) -> Result<Vec<String>> {
        Ok(self.locked()?.keys().cloned().collect())
    }

    async fn system_uuid(&self, identity: &str) -> Result<String> {
        self.with_vm(identity, |vm| vm.uuid.clone())
    }

    async fn system_name(&self, identity: &str) -> Result<String> {
        self.with_vm(identity, |vm| vm.name.clone())
    }

    async fn power_state(&self, identity: &str) -> PowerState {
        self.with_vm(identity, |vm| vm.power)
            .unwrap_or(PowerState::Unknown)
    }

    async fn set_power_state(&self, identity: &str, transition: PowerTransition) -> Result<()> {
        debug!(vm = %identity, transition = transition.as_str(), "Mock power transition");

        let next = match transition {
            PowerTransition::On | PowerTransition::ForceOn => PowerState::On,
            PowerTransition::ForceOff | PowerTransition::GracefulShutdown => PowerState::Off,
            PowerTransition::ForceRestart | PowerTransition::GracefulRestart => PowerState::On,
            PowerTransition::Nmi => {
                return Err(DriverError::NotSupported(
                    "power transition \"Nmi\"".to_string(),
                ))
            }
        };

        self.with_vm(identity, |vm| vm.power = next)
    }

    async fn boot_device(&self, identity: &str) -> Result<Option<BootSource>> {
        self.with_vm(identity, |vm| match vm.generation {
            VmGeneration::Gen1 => boot::gen1_first_source(&vm.gen1_order),
            VmGeneration::Gen2 => vm.gen2_order.first().and_then(|entry| entry.class),
        })
    }

    async fn set_boot_device(&self, identity: &str, target: BootSource) -> Result<()> {
        self.with_vm(identity, |vm| match vm.generation {
            VmGeneration::Gen1 => {
                vm.gen1_order = boot::gen1_promote(&vm.gen1_order, target)?;
                Ok(())
            }
            VmGeneration::Gen2 => {
                let entries = std::mem::take(&mut vm.gen2_order);
                vm.gen2_order = boot::stable_partition(entries, |e| e.class == Some(target));
                Ok(())
            }
        })?
    }

    async fn boot_mode(&self, identity: &str) -> Result<Option<BootMode>> {
        self.with_vm(identity, |vm| match vm.generation {
            VmGeneration::Gen2 => Some(BootMode::Uefi),
            VmGeneration::Gen1 => Some(BootMode::Legacy),
        })
    }

    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<()> {
        // Generation is fixed at creation in the mock model too.
        debug!(vm = %identity, ?mode, "Ignoring boot mode change");
        Ok(())
    }

    async fn total_memory_gib(&self, identity: &str) -> Option<u64> {
        self.with_vm(identity, |vm| vm.memory_gib).ok().flatten()
    }

    async fn total_cpus(&self, identity: &str) -> Option<u32> {
        self.with_vm(identity, |vm| vm.cpus).ok().flatten()
    }

    async fn nics(&self, identity: &str) -> Vec<NicDescriptor> {
        self.with_vm(identity, |vm| vm.nics.clone())
            .unwrap_or_default()
    }

    async fn simple_storage(&self, identity: &str) -> HashMap<String, SimpleStorage> {
        self.with_vm(identity, |vm| vm.storage.clone())
            .unwrap_or_default()
    }

    async fn bios(&self, identity: &str) -> Result<HashMap<String, serde_json::Value>> {
        self.with_vm(identity, |vm| vm.bios.clone())
    }

    async fn set_bios(
        &self,
        identity: &str,
        attributes: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        self.with_vm(identity, |vm| vm.bios.extend(attributes))
    }

    async fn reset_bios(&self, identity: &str) -> Result<()> {
        self.with_vm(identity, |vm| vm.bios = vm.bios_defaults.clone())
    }

    async fn find_or_create_volume(&self, request: &VolumeRequest) -> Result<Option<String>> {
        let mut volumes = self
            .volumes
            .write()
            .map_err(|_| DriverError::backend("access mock state", "mock", HostError::new("lock poisoned")))?;

        if let Some(id) = volumes.get(&request.name) {
            return Ok(Some(id.clone()));
        }

        let id = request
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        volumes.insert(request.name.clone(), id.clone());

        info!(volume = %request.name, id = %id, "Mock volume created");
        Ok(Some(id))
    }
}
