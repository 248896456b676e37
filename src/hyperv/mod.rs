//! Hyper-V backend.
//!
//! Translates the [`SystemsDriver`](crate::traits::SystemsDriver) contract
//! onto a Hyper-V host management service reached through the
//! [`HypervHost`] seam.

mod backend;
mod host;

pub use backend::HyperVDriver;
pub use host::{
    BootSourceType, DriveSubtype, HostResult, HypervHost, HypervVmState, VmSummary,
};
