//! Boot policy engine.
//!
//! Two virtual-hardware generations expose incompatible boot-order
//! representations. Generation 1 keeps a flat ordered list of device-class
//! tokens; generation 2 keeps an ordered list of opaque device records that
//! a backend classifies individually. The get/set logic for both lives here
//! as pure functions so every backend reorders the same way.

use crate::error::{DriverError, Result};
use crate::types::BootSource;

/// Device-class token in a generation-1 boot order.
///
/// A generation-1 order never contains duplicate tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gen1BootEntry {
    Floppy,
    Cdrom,
    HardDisk,
    Network,
}

impl Gen1BootEntry {
    /// Fixed token-to-class mapping. `None` for tokens with no abstract
    /// boot-source class (floppy).
    pub fn boot_source(&self) -> Option<BootSource> {
        match self {
            Gen1BootEntry::Network => Some(BootSource::Pxe),
            Gen1BootEntry::HardDisk => Some(BootSource::Hdd),
            Gen1BootEntry::Cdrom => Some(BootSource::Cd),
            Gen1BootEntry::Floppy => None,
        }
    }

    /// Token for an abstract boot-source class.
    pub fn for_source(source: BootSource) -> Self {
        match source {
            BootSource::Pxe => Gen1BootEntry::Network,
            BootSource::Hdd => Gen1BootEntry::HardDisk,
            BootSource::Cd => Gen1BootEntry::Cdrom,
        }
    }
}

/// Class of the first entry in a generation-1 boot order, `None` when the
/// order is empty or the first token has no class.
pub fn gen1_first_source(order: &[Gen1BootEntry]) -> Option<BootSource> {
    order.first().and_then(Gen1BootEntry::boot_source)
}

/// Move the token for `target` to the front of a generation-1 order,
/// leaving every other entry in its original relative order.
///
/// Fails with [`DriverError::InvalidArgument`] when the order has no token
/// for `target`: promoting a device class the VM does not have would
/// otherwise corrupt the sequence.
pub fn gen1_promote(order: &[Gen1BootEntry], target: BootSource) -> Result<Vec<Gen1BootEntry>> {
    let token = Gen1BootEntry::for_source(target);
    let position = order.iter().position(|entry| *entry == token).ok_or_else(|| {
        DriverError::InvalidArgument(format!(
            "no {} entry in the generation-1 boot order",
            target.as_str()
        ))
    })?;

    let mut reordered = Vec::with_capacity(order.len());
    reordered.push(token);
    reordered.extend(
        order
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, entry)| *entry),
    );
    Ok(reordered)
}

/// Stable partition of a generation-2 boot order: entries matching the
/// requested class first, everything else after, relative order preserved
/// within both groups.
///
/// Zero matching entries degenerates to the identity permutation; callers
/// treat that as silently ignored, mirroring the query side's "absent on
/// unknown".
pub fn stable_partition<T>(entries: Vec<T>, matches: impl Fn(&T) -> bool) -> Vec<T> {
    let (mut matching, rest): (Vec<T>, Vec<T>) = entries.into_iter().partition(matches);
    matching.extend(rest);
    matching
}
