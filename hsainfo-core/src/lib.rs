//! # hsainfo-core
//!
//! hsainfo-core contains everything needed to describe what an HSA runtime
//! exposes, without linking to one. The [`HsaApi`](api::HsaApi) trait is the
//! seam to the native library, [`walker`] visits agents, regions and pools
//! through it and collects an [`Inventory`](walker::Inventory), and
//! [`report`] renders that inventory as text. [`probe`] inspects kernel
//! state for RDMA and PeerDirect support.
//!
#![forbid(unsafe_code)]
#![forbid(missing_docs)]
#![forbid(rustdoc::broken_intra_doc_links)]
#![forbid(rustdoc::private_intra_doc_links)]
#![forbid(rustdoc::missing_crate_level_docs)]
#![forbid(rustdoc::bare_urls)]

/// See [Agent](agent::Agent)
pub mod agent;
/// See [HsaApi](api::HsaApi)
pub mod api;
/// See [DummyRuntime](dummy::DummyRuntime)
pub mod dummy;
/// See [HsaError](error::HsaError)
pub mod error;
/// See [Region](memory::Region) and [Pool](memory::Pool)
pub mod memory;
/// See [KernelProbe](probe::KernelProbe)
pub mod probe;
/// See [Report](report::Report)
pub mod report;
/// See [Inventory](walker::Inventory)
pub mod walker;

pub use agent::{Agent, DeviceType, PciLocation, Profile};
pub use api::{AgentHandle, HsaApi, PoolHandle, RegionHandle};
pub use error::{ErrorStatus, HsaError, HsaStatus};
pub use memory::{Pool, PoolGlobalFlags, PoolSegment, Region, RegionGlobalFlags, RegionSegment};
pub use probe::{KernelProbe, SystemInfo};
pub use report::{format_size, Report, ReportOptions};
pub use walker::{enumerate, walk_agents, Inventory};
