//! Contract-level data model shared by all backends.
//!
//! Everything here is a read-fresh snapshot of the hypervisor's own object
//! model; this layer stores none of it.

use serde::{Deserialize, Serialize};

// =============================================================================
// POWER
// =============================================================================

/// Observed power state of a system.
///
/// Derived on every query, never cached. `Unknown` means the backend could
/// not determine the state; it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

impl Default for PowerState {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Requested power state transition (Redfish ResetType spelling).
///
/// Not every backend supports every transition; an unmapped transition
/// fails with `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerTransition {
    On,
    ForceOn,
    ForceOff,
    GracefulShutdown,
    GracefulRestart,
    ForceRestart,
    Nmi,
}

impl PowerTransition {
    /// Wire spelling, used in error messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerTransition::On => "On",
            PowerTransition::ForceOn => "ForceOn",
            PowerTransition::ForceOff => "ForceOff",
            PowerTransition::GracefulShutdown => "GracefulShutdown",
            PowerTransition::GracefulRestart => "GracefulRestart",
            PowerTransition::ForceRestart => "ForceRestart",
            PowerTransition::Nmi => "Nmi",
        }
    }
}

// =============================================================================
// BOOT
// =============================================================================

/// Class of next-boot device, not a specific device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootSource {
    /// Network (PXE) boot.
    Pxe,
    /// Hard-disk boot.
    Hdd,
    /// Optical-media boot.
    Cd,
}

impl BootSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootSource::Pxe => "Pxe",
            BootSource::Hdd => "Hdd",
            BootSource::Cd => "Cd",
        }
    }
}

/// Firmware boot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootMode {
    #[serde(rename = "UEFI")]
    Uefi,
    Legacy,
}

/// Virtual-hardware generation of a system.
///
/// Fixed at VM creation time and read-only here. Selects which boot-order
/// representation and reordering algorithm applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmGeneration {
    Gen1,
    Gen2,
}

/// Boot image attached to a removable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootImage {
    /// Path to the image, `None` when no image is inserted.
    pub image: Option<String>,
    pub write_protected: bool,
    pub inserted: bool,
}

// =============================================================================
// INVENTORY
// =============================================================================

/// Read-only snapshot of a virtual NIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicDescriptor {
    /// Backend element name or identifier.
    pub id: String,
    /// MAC address as reported by the backend.
    pub mac: String,
}

/// A device behind a simple storage controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleStorageDevice {
    pub name: String,
    pub capacity_bytes: Option<u64>,
}

/// Devices grouped under one simple storage controller.
///
/// An empty collection of these is a valid answer meaning "no simple
/// storage modeled", not a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleStorage {
    pub devices: Vec<SimpleStorageDevice>,
}

/// Input to the find-or-create volume operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeRequest {
    /// Caller-supplied volume id, if any.
    pub id: Option<String>,
    pub name: String,
    pub capacity_bytes: u64,
    /// Redfish volume type hint (e.g. "Mirrored"); backends may ignore it.
    pub volume_type: Option<String>,
    /// Backend-specific pool naming hint.
    pub pool_hint: Option<String>,
    /// Backend-specific volume naming hint.
    pub volume_hint: Option<String>,
}
