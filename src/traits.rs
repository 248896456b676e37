//! The abstract systems-driver contract.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{DriverError, Result};
use crate::types::*;

/// Contract every hypervisor backend must satisfy.
///
/// The front-end holds `Arc<dyn SystemsDriver>` and never a concrete backend
/// type, so it can address Hyper-V, libvirt, or an in-memory mock uniformly.
///
/// The contract is asymmetric on purpose: operations that are fundamentally
/// queries return an absent or empty value on "don't know" and never fail
/// for that reason, while operations that are fundamentally commands either
/// succeed, fail [`DriverError::NotSupported`], or wrap the backend cause in
/// [`DriverError::Backend`]. Every call is one logical, blocking flow against
/// the backend: no retries, no timeouts, no internal queuing.
#[async_trait]
pub trait SystemsDriver: Send + Sync {
    // =========================================================================
    // Identification & availability
    // =========================================================================

    /// Short backend tag for logs and registry lookup (e.g. "hyperv").
    fn driver(&self) -> &'static str;

    /// Check whether the backend is reachable and usable.
    ///
    /// The [`DriverRegistry`](crate::registry::DriverRegistry) calls this at
    /// startup and excludes backends that answer `false`.
    async fn probe(&self) -> bool;

    // =========================================================================
    // Systems & identity
    // =========================================================================

    /// Enumerate all manageable systems. Empty if none.
    async fn list_systems(&self) -> Result<Vec<String>>;

    /// Get the stable UUID for a system.
    ///
    /// Backends without a distinct UUID concept may return the identity
    /// unchanged.
    async fn system_uuid(&self, identity: &str) -> Result<String>;

    /// Get the human-readable name for a system.
    ///
    /// Backends without a distinct name concept may return the identity
    /// unchanged.
    async fn system_name(&self, identity: &str) -> Result<String>;

    // =========================================================================
    // Power
    // =========================================================================

    /// Get the current power state, read fresh from the backend.
    ///
    /// Returns [`PowerState::Unknown`] when the state cannot be determined,
    /// including on backend failure; this query never raises.
    async fn power_state(&self, identity: &str) -> PowerState;

    /// Request a power state transition.
    ///
    /// Fails with [`DriverError::NotSupported`] when the transition has no
    /// backend mapping, and with [`DriverError::Backend`] (carrying the
    /// transition and identity) on any other failure.
    async fn set_power_state(&self, identity: &str, transition: PowerTransition) -> Result<()>;

    // =========================================================================
    // Boot
    // =========================================================================

    /// Get the effective next-boot device class.
    ///
    /// `Ok(None)` when it cannot be determined (empty boot order, device
    /// class outside the known set).
    async fn boot_device(&self, identity: &str) -> Result<Option<BootSource>>;

    /// Make `target` the first-attempted boot device class, preserving the
    /// relative order of all other entries.
    async fn set_boot_device(&self, identity: &str, target: BootSource) -> Result<()>;

    /// Get the firmware boot mode, derived from the hardware generation.
    async fn boot_mode(&self, identity: &str) -> Result<Option<BootMode>>;

    /// Set the firmware boot mode.
    ///
    /// Backends that cannot change firmware mode after VM creation implement
    /// this as a no-op; it must not fail for that reason.
    async fn set_boot_mode(&self, identity: &str, mode: BootMode) -> Result<()>;

    // =========================================================================
    // Introspection (best effort, never fails)
    // =========================================================================

    /// Total memory in GiB, `None` when the backend cannot report it.
    async fn total_memory_gib(&self, identity: &str) -> Option<u64>;

    /// Total CPU count, `None` when the backend cannot report it.
    async fn total_cpus(&self, identity: &str) -> Option<u32>;

    /// NICs and their attributes. Empty when none or unreported.
    async fn nics(&self, identity: &str) -> Vec<NicDescriptor>;

    /// Simple storage controllers and their devices.
    ///
    /// An empty map means "no simple storage modeled".
    async fn simple_storage(&self, identity: &str) -> HashMap<String, SimpleStorage>;

    // =========================================================================
    // BIOS attributes
    // =========================================================================

    /// Get BIOS attributes for the system.
    async fn bios(&self, _identity: &str) -> Result<HashMap<String, serde_json::Value>> {
        Err(DriverError::NotSupported("BIOS attributes".to_string()))
    }

    /// Update BIOS attributes.
    async fn set_bios(
        &self,
        _identity: &str,
        _attributes: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        Err(DriverError::NotSupported("BIOS attributes".to_string()))
    }

    /// Reset BIOS attributes to defaults.
    async fn reset_bios(&self, _identity: &str) -> Result<()> {
        Err(DriverError::NotSupported("BIOS attributes".to_string()))
    }

    // =========================================================================
    // Boot images
    // =========================================================================

    /// Get the boot image configured for a removable device.
    async fn boot_image(&self, _identity: &str, _device: BootSource) -> Result<BootImage> {
        Err(DriverError::NotSupported("boot images".to_string()))
    }

    /// Set (or with `image == None`, remove) the boot image for a device.
    async fn set_boot_image(
        &self,
        _identity: &str,
        _device: BootSource,
        _image: Option<&str>,
        _write_protected: bool,
    ) -> Result<()> {
        Err(DriverError::NotSupported("boot images".to_string()))
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    /// Find or create a storage volume.
    ///
    /// `Ok(None)` signals "not implemented / not found", which is distinct
    /// from failure.
    async fn find_or_create_volume(&self, _request: &VolumeRequest) -> Result<Option<String>> {
        Ok(None)
    }
}
