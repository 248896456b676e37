//! Hyper-V host management API seam.
//!
//! The driver talks to the Hyper-V host through this trait instead of a
//! concrete WMI/management client, so the translation logic stays testable
//! and the vendor surface stays swappable. Calls are synchronous and
//! blocking; the host service provides whatever serialization it provides,
//! and this layer adds none.

use crate::boot::Gen1BootEntry;
use crate::error::HostError;
use crate::types::{NicDescriptor, VmGeneration};

/// Result of a host API call.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Hyper-V virtual machine state as exposed by the host service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypervVmState {
    /// Powered on.
    Enabled,
    /// Powered off.
    Disabled,
    /// Hard reset in progress.
    Reboot,
}

/// Type tag of one generation-2 boot source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSourceType {
    Network,
    Drive,
}

/// Resource subtype of a drive-typed boot source record, resolved through
/// the host's logical-identity association lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveSubtype {
    Disk,
    Dvd,
    /// Subtype outside the disk/optical pair (e.g. a pass-through device).
    Other,
}

/// Summary counters for one VM; fields the host cannot report are `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmSummary {
    pub memory_mib: Option<u64>,
    pub processor_count: Option<u32>,
}

/// The Hyper-V host management surface consumed by [`HyperVDriver`].
///
/// Every method maps onto one primitive of the host service (VM enumeration,
/// state transition, boot order access, association lookups). Any transport
/// or API failure is a [`HostError`]; the driver wraps it with operation and
/// identity context.
///
/// [`HyperVDriver`]: crate::hyperv::HyperVDriver
pub trait HypervHost: Send + Sync {
    /// Enumerate VM identities on the host.
    fn list_vms(&self) -> HostResult<Vec<String>>;

    /// Resolve a VM identity to its stable UUID.
    fn vm_uuid(&self, identity: &str) -> HostResult<String>;

    /// Current VM state.
    fn vm_state(&self, identity: &str) -> HostResult<HypervVmState>;

    /// Request a hard state transition.
    fn set_vm_state(&self, identity: &str, state: HypervVmState) -> HostResult<()>;

    /// Ask the guest to shut down gracefully.
    fn soft_shutdown(&self, identity: &str) -> HostResult<()>;

    /// Virtual-hardware generation, fixed at creation time.
    fn vm_generation(&self, identity: &str) -> HostResult<VmGeneration>;

    /// Generation-1 boot order as device-class tokens.
    fn gen1_boot_order(&self, identity: &str) -> HostResult<Vec<Gen1BootEntry>>;

    /// Persist a generation-1 boot order.
    fn set_gen1_boot_order(&self, identity: &str, order: Vec<Gen1BootEntry>) -> HostResult<()>;

    /// Generation-2 boot order as opaque device record handles.
    fn gen2_boot_order(&self, identity: &str) -> HostResult<Vec<String>>;

    /// Persist a generation-2 boot order.
    fn set_gen2_boot_order(&self, identity: &str, order: Vec<String>) -> HostResult<()>;

    /// Type tag of one generation-2 boot record.
    fn boot_source_type(&self, handle: &str) -> HostResult<BootSourceType>;

    /// Resource subtype of a drive-typed boot record.
    fn drive_subtype(&self, handle: &str) -> HostResult<DriveSubtype>;

    /// Memory and CPU summary for a VM.
    fn summary(&self, identity: &str) -> HostResult<VmSummary>;

    /// NICs attached to a VM.
    fn vm_nics(&self, identity: &str) -> HostResult<Vec<NicDescriptor>>;
}
