//! Hyper-V driver implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::boot;
use crate::config::HyperVConfig;
use crate::error::{DriverError, Result};
use crate::hyperv::host::{BootSourceType, DriveSubtype, HypervHost, HypervVmState};
use crate::traits::SystemsDriver;
use crate::types::*;

/// Hyper-V backend.
///
/// Pure translation of the contract onto the host management service: no
/// state of its own beyond the host handle and the immutable config, both
/// built once at startup and held for the process lifetime.
pub struct HyperVDriver {
    host: Arc<dyn HypervHost>,
    config: HyperVConfig,
}

impl HyperVDriver {
    /// Create a driver over a connected host management service.
    pub fn new(host: Arc<dyn HypervHost>, config: HyperVConfig) -> Self {
        info!(host = %config.host, "Creating Hyper-V systems driver");
        Self { host, config }
    }

    /// Host state for a hard power transition, `None` when the transition
    /// has no mapping.
    fn hard_state(transition: PowerTransition) -> Option<HypervVmState> {
        match transition {
            PowerTransition::On | PowerTransition::ForceOn => Some(HypervVmState::Enabled),
            PowerTransition::ForceOff => Some(HypervVmState::Disabled),
            PowerTransition::ForceRestart => Some(HypervVmState::Reboot),
            _ => None,
        }
    }

    /// Resolve one generation-2 boot record handle to its device class.
    ///
    /// Network records are PXE; drive records resolve their subtype through
    /// the association lookup. `Ok(None)` when the record matches neither
    /// class cleanly.
    fn classify(&self, identity: &str, handle: &str) -> Result<Option<BootSource>> {
        let source_type = self
            .host
            .boot_source_type(handle)
            .map_err(|e| DriverError::backend("classify boot record", identity, e))?;

        match source_type {
            BootSourceType::Network => Ok(Some(BootSource::Pxe)),
            BootSourceType::Drive => {
                let subtype = self
                    .host
                    .drive_subtype(handle)
                    .map_err(|e| DriverError::backend("resolve drive subtype", identity, e))?;
                Ok(match subtype {
                    DriveSubtype::Disk => Some(BootSource::Hdd),
                    DriveSubtype::Dvd => Some(BootSource::Cd),
                    DriveSubtype::Other => None,
                })
            }
        }
    }

    fn generation(&self, identity: &str) -> Result<VmGeneration> {
        self.host
            .vm_generation(identity)
            .map_err(|e| DriverError::backend("read hardware generation", identity, e))
    }

    fn boot_device_gen1(&self, identity: &str) -> Result<Option<BootSource>> {
        let order = self
            .host
            .gen1_boot_order(identity)
            .map_err(|e| DriverError::backend("read boot order", identity, e))?;
        Ok(boot::gen1_first_source(&order))
    }

    fn boot_device_gen2(&self, identity: &str) -> Result<Option<BootSource>> {
        let handles = self
            .host
            .gen2_boot_order(identity)
            .map_err(|e| DriverError::backend("read boot order", identity, e))?;

        match handles.first() {
            Some(first) => self.classify(identity, first),
            None => Ok(None),
        }
    }

    fn set_boot_device_gen1(&self, identity: &str, target: BootSource) -> Result<()> {
        let order = self
            .host
            .gen1_boot_order(identity)
            .map_err(|e| DriverError::backend("read boot order", identity, e))?;

        let reordered = boot::gen1_promote(&order, target)?;

        self.host
            .set_gen1_boot_order(identity, reordered)
            .map_err(|e| DriverError::backend("persist boot order", identity, e))
    }

    fn set_boot_device_gen2(&self, identity: &str, target: BootSource) -> Result<()> {
        let handles = self
            .host
            .gen2_boot_order(identity)
            .map_err(|e| DriverError::backend("read boot order", identity, e))?;

        let mut classified = Vec::with_capacity(handles.len());
        for handle in handles {
            let class = self.classify(identity, &handle)?;
            classified.push((handle, class));
        }

        let reordered: Vec<String> =
            boot::stable_partition(classified, |(_, class)| *class == Some(target))
                .into_iter()
                .map(|(handle, _)| handle)
                .collect();

        self.host
            .set_gen2_boot_order(identity, reordered)
            .map_err(|e| DriverError::backend("persist boot order", identity, e))
    }
}

#[async_trait]
impl SystemsDriver for HyperVDriver {
    fn driver(&self) -> &'static str {
        "hyperv"
    }

    #[instrument(skip(self))]
    async fn probe(&self) -> bool {
        match self.host.list_vms() {
            Ok(_) => true,
            Err(e) => {
                warn!(host = %self.config.host, error = %e, "Hyper-V host unavailable");
                false
            }
        }
    }

    async fn list_systems(&self) -> Result<Vec<String>> {
        self.host
            .list_vms()
            .map_err(|e| DriverError::backend("enumerate systems", self.config.host.as_str(), e))
    }

    async fn system_uuid(&self, identity: &str) -> Result<String> {
        self.host
            .vm_uuid(identity)
            .map_err(|e| DriverError::backend("resolve UUID", identity, e))
    }

    async fn system_name(&self, identity: &str) -> Result<String> {
        // Hyper-V addresses VMs by name; the identity is the name.
        Ok(identity.to_string())
    }

    #[instrument(skip(self), fields(vm = %identity))]
    async fn power_state(&self, identity: &str) -> PowerState {
        match self.host.vm_state(identity) {
            Ok(HypervVmState::Enabled) => PowerState::On,
            Ok(_) => PowerState::Off,
            Err(e) => {
                debug!(error = %e, "Power state indeterminate");
                PowerState::Unknown
            }
        }
    }

    #[instrument(skip(self), fields(vm = %identity, transition = transition.as_str()))]
    async fn set_power_state(&self, identity: &str, transition: PowerTransition) -> Result<()> {
        info!("Requesting power transition");

        if let Some(state) = Self::hard_state(transition) {
            return self.host.set_vm_state(identity, state).map_err(|e| {
                DriverError::backend(
                    format!("set power state \"{}\"", transition.as_str()),
                    identity,
                    e,
                )
            });
        }

        match transition {
            PowerTransition::GracefulShutdown => {
                self.host.soft_shutdown(identity).map_err(|e| {
                    DriverError::backend("request graceful shutdown", identity, e)
                })
            }
            _ => Err(DriverError::NotSupported(format!(
                "power transition \"{}\"",
                transition.as_str()
            ))),
        }
    }

    #[instrument(skip(self), fields(vm = %identity))]
    async fn boot_device(&self, identity: &str) -> Result<Option<BootSource>> {
        match self.generation(identity)? {
            VmGeneration::Gen1 => self.boot_device_gen1(identity),
            VmGeneration::Gen2 => self.boot_device_gen2(identity),
        }
    }

    #[instrument(skip(self), fields(vm = %identity, target = target.as_str()))]
    async fn set_boot_device(&self, identity: &str, target: BootSource) -> Result<()> {
        info!("Setting boot device");

        match self.generation(identity)? {
            VmGeneration::Gen1 => self.set_boot_device_gen1(identity, target),
            VmGeneration::Gen2 => self.set_boot_device_gen2(identity, target),
        }
    }

    async fn boot_mode(&self, identity: &str) -> Result<Option<BootMode>> {
        Ok(match self.generation(identity)? {
            VmGeneration::Gen2 => Some(BootMode::Uefi),
            VmGeneration::Gen1 => Some(BootMode::Legacy),
        })
    }

    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<()> {
        // Firmware mode is fixed by the hardware generation at creation
        // time; the contract requires this to be a silent no-op.
        debug!(vm = %identity, ?mode, "Ignoring boot mode change");
        Ok(())
    }

    async fn total_memory_gib(&self, identity: &str) -> Option<u64> {
        let summary = self.host.summary(identity).ok()?;
        // Hosts report MiB; round up so small VMs don't read as zero.
        summary.memory_mib.map(|mib| mib.div_ceil(1024))
    }

    async fn total_cpus(&self, identity: &str) -> Option<u32> {
        self.host.summary(identity).ok()?.processor_count
    }

    async fn nics(&self, identity: &str) -> Vec<NicDescriptor> {
        match self.host.vm_nics(identity) {
            Ok(nics) => nics,
            Err(e) => {
                debug!(vm = %identity, error = %e, "NIC enumeration unavailable");
                Vec::new()
            }
        }
    }

    async fn simple_storage(&self, identity: &str) -> HashMap<String, SimpleStorage> {
        // Hyper-V does not model simple storage controllers.
        let _ = identity;
        HashMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::Gen1BootEntry;
    use crate::error::HostError;
    use crate::hyperv::host::{HostResult, VmSummary};
    use std::sync::Mutex;

    struct FakeVm {
        uuid: String,
        state: HypervVmState,
        generation: VmGeneration,
        gen1_order: Vec<Gen1BootEntry>,
        gen2_order: Vec<String>,
        summary: VmSummary,
        nics: Vec<NicDescriptor>,
        soft_shutdowns: u32,
    }

    impl Default for FakeVm {
        fn default() -> Self {
            Self {
                uuid: String::new(),
                state: HypervVmState::Disabled,
                generation: VmGeneration::Gen2,
                gen1_order: Vec::new(),
                gen2_order: Vec::new(),
                summary: VmSummary::default(),
                nics: Vec::new(),
                soft_shutdowns: 0,
            }
        }
    }

    #[derive(Default)]
    struct FakeHost {
        vms: Mutex<HashMap<String, FakeVm>>,
        // handle -> (record type, drive subtype)
        records: Mutex<HashMap<String, (BootSourceType, DriveSubtype)>>,
    }

    impl FakeHost {
        fn with_vm(self, identity: &str, vm: FakeVm) -> Self {
            self.vms.lock().unwrap().insert(identity.to_string(), vm);
            self
        }

        fn with_record(self, handle: &str, ty: BootSourceType, subtype: DriveSubtype) -> Self {
            self.records
                .lock()
                .unwrap()
                .insert(handle.to_string(), (ty, subtype));
            self
        }

        fn vm<T>(&self, identity: &str, f: impl FnOnce(&mut FakeVm) -> T) -> HostResult<T> {
            let mut vms = self.vms.lock().unwrap();
            vms.get_mut(identity)
                .map(f)
                .ok_or_else(|| HostError::new(format!("no VM named {identity}")))
        }
    }

    impl HypervHost for FakeHost {
        fn list_vms(&self) -> HostResult<Vec<String>> {
            Ok(self.vms.lock().unwrap().keys().cloned().collect())
        }

        fn vm_uuid(&self, identity: &str) -> HostResult<String> {
            self.vm(identity, |vm| vm.uuid.clone())
        }

        fn vm_state(&self, identity: &str) -> HostResult<HypervVmState> {
            self.vm(identity, |vm| vm.state)
        }

        fn set_vm_state(&self, identity: &str, state: HypervVmState) -> HostResult<()> {
            self.vm(identity, |vm| vm.state = state)
        }

        fn soft_shutdown(&self, identity: &str) -> HostResult<()> {
            self.vm(identity, |vm| {
                vm.soft_shutdowns += 1;
                vm.state = HypervVmState::Disabled;
            })
        }

        fn vm_generation(&self, identity: &str) -> HostResult<VmGeneration> {
            self.vm(identity, |vm| vm.generation)
        }

        fn gen1_boot_order(&self, identity: &str) -> HostResult<Vec<Gen1BootEntry>> {
            self.vm(identity, |vm| vm.gen1_order.clone())
        }

        fn set_gen1_boot_order(
            &self,
            identity: &str,
            order: Vec<Gen1BootEntry>,
        ) -> HostResult<()> {
            self.vm(identity, |vm| vm.gen1_order = order)
        }

        fn gen2_boot_order(&self, identity: &str) -> HostResult<Vec<String>> {
            self.vm(identity, |vm| vm.gen2_order.clone())
        }

        fn set_gen2_boot_order(&self, identity: &str, order: Vec<String>) -> HostResult<()> {
            self.vm(identity, |vm| vm.gen2_order = order)
        }

        fn boot_source_type(&self, handle: &str) -> HostResult<BootSourceType> {
            self.records
                .lock()
                .unwrap()
                .get(handle)
                .map(|(ty, _)| *ty)
                .ok_or_else(|| HostError::new(format!("unknown boot record {handle}")))
        }

        fn drive_subtype(&self, handle: &str) -> HostResult<DriveSubtype> {
            self.records
                .lock()
                .unwrap()
                .get(handle)
                .map(|(_, subtype)| *subtype)
                .ok_or_else(|| HostError::new(format!("unknown boot record {handle}")))
        }

        fn summary(&self, identity: &str) -> HostResult<VmSummary> {
            self.vm(identity, |vm| vm.summary)
        }

        fn vm_nics(&self, identity: &str) -> HostResult<Vec<NicDescriptor>> {
            self.vm(identity, |vm| vm.nics.clone())
        }
    }

    fn driver(host: FakeHost) -> HyperVDriver {
        HyperVDriver::new(Arc::new(host), HyperVConfig::default())
    }

    fn gen2_vm() -> (FakeHost, &'static str) {
        let host = FakeHost::default()
            .with_vm(
                "vm-a",
                FakeVm {
                    uuid: "9e4e3f0b-1af1-4f43-8c06-1f1b71d2a6d2".to_string(),
                    gen2_order: vec!["net0".into(), "disk0".into(), "dvd0".into()],
                    ..Default::default()
                },
            )
            .with_record("net0", BootSourceType::Network, DriveSubtype::Other)
            .with_record("disk0", BootSourceType::Drive, DriveSubtype::Disk)
            .with_record("dvd0", BootSourceType::Drive, DriveSubtype::Dvd);
        (host, "vm-a")
    }

    #[tokio::test]
    async fn power_transitions_map_to_hard_states() {
        let host = FakeHost::default().with_vm("vm-a", FakeVm::default());
        let driver = driver(host);

        driver
            .set_power_state("vm-a", PowerTransition::On)
            .await
            .unwrap();
        assert_eq!(driver.power_state("vm-a").await, PowerState::On);

        driver
            .set_power_state("vm-a", PowerTransition::ForceOff)
            .await
            .unwrap();
        assert_eq!(driver.power_state("vm-a").await, PowerState::Off);
    }

    #[tokio::test]
    async fn graceful_shutdown_uses_soft_shutdown() {
        let fake = Arc::new(FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                state: HypervVmState::Enabled,
                ..Default::default()
            },
        ));
        let driver = HyperVDriver::new(fake.clone(), HyperVConfig::default());

        driver
            .set_power_state("vm-a", PowerTransition::GracefulShutdown)
            .await
            .unwrap();

        fake.vm("vm-a", |vm| {
            assert_eq!(vm.soft_shutdowns, 1);
            assert_eq!(vm.state, HypervVmState::Disabled);
        })
        .unwrap();
    }

    #[tokio::test]
    async fn unmapped_transitions_are_not_supported() {
        let driver = driver(FakeHost::default().with_vm("vm-a", FakeVm::default()));

        for transition in [PowerTransition::Nmi, PowerTransition::GracefulRestart] {
            let err = driver.set_power_state("vm-a", transition).await.unwrap_err();
            assert!(matches!(err, DriverError::NotSupported(_)), "{transition:?}");
        }
    }

    #[tokio::test]
    async fn backend_failure_carries_transition_and_identity() {
        let driver = driver(FakeHost::default());

        let err = driver
            .set_power_state("ghost", PowerTransition::ForceOff)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ForceOff"));
        assert!(msg.contains("ghost"));
    }

    #[tokio::test]
    async fn power_state_is_unknown_on_host_failure() {
        let driver = driver(FakeHost::default());
        assert_eq!(driver.power_state("ghost").await, PowerState::Unknown);
    }

    #[tokio::test]
    async fn gen2_boot_device_resolves_record_classes() {
        let (host, id) = gen2_vm();
        let driver = driver(host);

        assert_eq!(driver.boot_device(id).await.unwrap(), Some(BootSource::Pxe));
    }

    #[tokio::test]
    async fn gen2_set_boot_device_is_a_stable_partition() {
        let (host, id) = gen2_vm();
        let driver = driver(host);

        driver.set_boot_device(id, BootSource::Hdd).await.unwrap();

        let order = driver.host.gen2_boot_order(id).unwrap();
        assert_eq!(order, vec!["disk0", "net0", "dvd0"]);
        assert_eq!(driver.boot_device(id).await.unwrap(), Some(BootSource::Hdd));

        // Applying the same request twice yields the same sequence.
        driver.set_boot_device(id, BootSource::Hdd).await.unwrap();
        assert_eq!(driver.host.gen2_boot_order(id).unwrap(), order);
    }

    #[tokio::test]
    async fn gen2_set_without_matching_device_is_silently_ignored() {
        let host = FakeHost::default()
            .with_vm(
                "vm-a",
                FakeVm {
                    gen2_order: vec!["disk0".into(), "dvd0".into()],
                    ..Default::default()
                },
            )
            .with_record("disk0", BootSourceType::Drive, DriveSubtype::Disk)
            .with_record("dvd0", BootSourceType::Drive, DriveSubtype::Dvd);
        let driver = driver(host);

        driver.set_boot_device("vm-a", BootSource::Pxe).await.unwrap();
        assert_eq!(
            driver.host.gen2_boot_order("vm-a").unwrap(),
            vec!["disk0", "dvd0"]
        );
    }

    #[tokio::test]
    async fn gen2_empty_boot_order_reads_absent() {
        let driver = driver(FakeHost::default().with_vm("vm-a", FakeVm::default()));
        assert_eq!(driver.boot_device("vm-a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn gen1_boot_device_round_trip() {
        let host = FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                generation: VmGeneration::Gen1,
                gen1_order: vec![
                    Gen1BootEntry::Floppy,
                    Gen1BootEntry::Cdrom,
                    Gen1BootEntry::HardDisk,
                    Gen1BootEntry::Network,
                ],
                ..Default::default()
            },
        );
        let driver = driver(host);

        driver.set_boot_device("vm-a", BootSource::Pxe).await.unwrap();

        assert_eq!(
            driver.boot_device("vm-a").await.unwrap(),
            Some(BootSource::Pxe)
        );
        assert_eq!(
            driver.host.gen1_boot_order("vm-a").unwrap(),
            vec![
                Gen1BootEntry::Network,
                Gen1BootEntry::Floppy,
                Gen1BootEntry::Cdrom,
                Gen1BootEntry::HardDisk,
            ]
        );
    }

    #[tokio::test]
    async fn gen1_set_without_entry_is_invalid_argument() {
        let host = FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                generation: VmGeneration::Gen1,
                gen1_order: vec![Gen1BootEntry::HardDisk, Gen1BootEntry::Network],
                ..Default::default()
            },
        );
        let driver = driver(host);

        let err = driver
            .set_boot_device("vm-a", BootSource::Cd)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidArgument(_)));
        // Boot order untouched.
        assert_eq!(
            driver.host.gen1_boot_order("vm-a").unwrap(),
            vec![Gen1BootEntry::HardDisk, Gen1BootEntry::Network]
        );
    }

    #[tokio::test]
    async fn boot_mode_follows_generation_and_set_is_a_noop() {
        let host = FakeHost::default()
            .with_vm(
                "gen1",
                FakeVm {
                    generation: VmGeneration::Gen1,
                    ..Default::default()
                },
            )
            .with_vm("gen2", FakeVm::default());
        let driver = driver(host);

        assert_eq!(driver.boot_mode("gen1").await.unwrap(), Some(BootMode::Legacy));
        assert_eq!(driver.boot_mode("gen2").await.unwrap(), Some(BootMode::Uefi));

        driver.set_boot_mode("gen1", BootMode::Uefi).await.unwrap();
        assert_eq!(driver.boot_mode("gen1").await.unwrap(), Some(BootMode::Legacy));
    }

    #[tokio::test]
    async fn introspection_is_best_effort() {
        let host = FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                summary: VmSummary {
                    memory_mib: Some(2048),
                    processor_count: Some(4),
                },
                nics: vec![NicDescriptor {
                    id: "nic0".to_string(),
                    mac: "00:15:5d:00:00:01".to_string(),
                }],
                ..Default::default()
            },
        );
        let driver = driver(host);

        assert_eq!(driver.total_memory_gib("vm-a").await, Some(2));
        assert_eq!(driver.total_cpus("vm-a").await, Some(4));
        assert_eq!(driver.nics("vm-a").await.len(), 1);

        // Unknown system: absent and empty, never an error.
        assert_eq!(driver.total_memory_gib("ghost").await, None);
        assert_eq!(driver.total_cpus("ghost").await, None);
        assert!(driver.nics("ghost").await.is_empty());
        assert!(driver.simple_storage("vm-a").await.is_empty());
    }

    #[tokio::test]
    async fn small_memory_rounds_up_to_one_gib() {
        let host = FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                summary: VmSummary {
                    memory_mib: Some(512),
                    processor_count: None,
                },
                ..Default::default()
            },
        );
        let driver = driver(host);

        assert_eq!(driver.total_memory_gib("vm-a").await, Some(1));
        assert_eq!(driver.total_cpus("vm-a").await, None);
    }

    #[tokio::test]
    async fn bios_and_boot_images_are_not_supported() {
        let driver = driver(FakeHost::default().with_vm("vm-a", FakeVm::default()));

        assert!(matches!(
            driver.bios("vm-a").await.unwrap_err(),
            DriverError::NotSupported(_)
        ));
        assert!(matches!(
            driver.reset_bios("vm-a").await.unwrap_err(),
            DriverError::NotSupported(_)
        ));
        assert!(matches!(
            driver.boot_image("vm-a", BootSource::Cd).await.unwrap_err(),
            DriverError::NotSupported(_)
        ));
        assert!(driver
            .find_or_create_volume(&VolumeRequest {
                id: None,
                name: "vol0".to_string(),
                capacity_bytes: 1 << 30,
                volume_type: None,
                pool_hint: None,
                volume_hint: None,
            })
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn identity_normalization() {
        let host = FakeHost::default().with_vm(
            "vm-a",
            FakeVm {
                uuid: "b9a4c1ce-0000-4e9c-9a0c-59e5b1a2c57f".to_string(),
                ..Default::default()
            },
        );
        let driver = driver(host);

        assert_eq!(
            driver.system_uuid("vm-a").await.unwrap(),
            "b9a4c1ce-0000-4e9c-9a0c-59e5b1a2c57f"
        );
        // Hyper-V has no separate name concept at this layer.
        assert_eq!(driver.system_name("vm-a").await.unwrap(), "vm-a");
    }
}
