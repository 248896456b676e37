//! # Redfin Systems
//!
//! Systems-resource driver layer for the Redfin BMC emulator.
//!
//! The Redfish front-end exposes virtualization hosts as if they were
//! bare-metal servers with a standard management API; this crate supplies
//! the backend side of that: an abstract driver contract, the boot-order
//! policy shared by all backends, and concrete backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           SystemsDriver trait           │
//! │ (power, boot device/mode, CPU/memory,   │
//! │  NICs, BIOS, storage volumes)           │
//! └─────────────────────┬───────────────────┘
//!                       │  DriverRegistry (probe at startup)
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │   HyperVDriver    │     │    MockDriver     │
//! │ (via HypervHost)  │     │   (in-memory)     │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! Every operation is a single blocking flow against the backend: no
//! caching, no retries, no timeouts. Queries answer "don't know" with an
//! absent or empty value; commands fail with a uniform error taxonomy
//! ([`DriverError`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redfin_systems::{DriverRegistry, MockDriver, SystemsDriver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut registry = DriverRegistry::new();
//!     registry.register(Arc::new(MockDriver::new())).await;
//!
//!     let driver = registry.default_driver().unwrap();
//!     let systems = driver.list_systems().await.unwrap();
//! }
//! ```

pub mod boot;
pub mod config;
pub mod error;
pub mod hyperv;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod types;

pub use boot::Gen1BootEntry;
pub use config::{BackendKind, DriverConfig, HyperVConfig};
pub use error::{DriverError, HostError};
pub use hyperv::{HyperVDriver, HypervHost};
pub use mock::{MockDriver, MockSystem};
pub use registry::DriverRegistry;
pub use traits::SystemsDriver;
pub use types::*;
