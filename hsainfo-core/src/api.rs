//! Calls of the HSA runtime used for introspection.
//!
//! [`HsaApi`] mirrors the native functions one to one, so that the walker can
//! run against the real library or against [`DummyRuntime`](crate::dummy::DummyRuntime).
//! Info ids and value layouts are a fixed ABI contract with
//! `libhsa-runtime64.so` and must not be renumbered.

use crate::error::HsaStatus;
use core::fmt::Debug;
use core::mem::size_of;

/// Length of the `char` buffer the runtime writes agent names into
pub const NAME_LEN: usize = 64;

/// Size of the largest value any supported attribute writes
pub const MAX_VALUE_SIZE: usize = NAME_LEN;

const POINTER_SIZE: usize = size_of::<usize>();

/// Opaque `hsa_agent_t`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentHandle(pub u64);

/// Opaque `hsa_region_t`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionHandle(pub u64);

/// Opaque `hsa_amd_memory_pool_t`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolHandle(pub u64);

impl From<u64> for AgentHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for RegionHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for PoolHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Attribute that can be passed to one of the `*_get_info` calls
pub trait Attribute: Copy + Debug {
    /// Numeric id understood by the runtime
    fn id(self) -> u32;
    /// Number of bytes the runtime writes for this attribute
    fn value_size(self) -> usize;
}

/// `hsa_agent_info_t` and `hsa_amd_agent_info_t` ids
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentAttribute {
    /// `char[64]` agent name
    Name = 0,
    /// `char[64]` vendor name
    VendorName = 1,
    /// `hsa_profile_t`
    Profile = 4,
    /// `uint32_t` NUMA node
    Node = 16,
    /// `hsa_device_type_t`
    Device = 17,
    /// `uint32_t` chip identifier
    ChipId = 0xA000,
    /// `uint32_t` packed PCI bus/device/function
    BdfId = 0xA006,
}

impl Attribute for AgentAttribute {
    fn id(self) -> u32 {
        self as u32
    }

    fn value_size(self) -> usize {
        match self {
            Self::Name | Self::VendorName => NAME_LEN,
            Self::Profile | Self::Node | Self::Device | Self::ChipId | Self::BdfId => 4,
        }
    }
}

/// `hsa_region_info_t` and `hsa_amd_region_info_t` ids
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionAttribute {
    /// `hsa_region_segment_t`
    Segment = 0,
    /// `uint32_t` mask of `hsa_region_global_flag_t`
    GlobalFlags = 1,
    /// `size_t` region size in bytes
    Size = 2,
    /// `size_t` maximum single allocation
    AllocMaxSize = 4,
    /// `bool`
    RuntimeAllocAllowed = 5,
    /// `size_t`
    RuntimeAllocGranule = 6,
    /// `size_t`
    RuntimeAllocAlignment = 7,
    /// `bool`
    HostAccessible = 0xA000,
    /// `void*`
    Base = 0xA001,
    /// `uint32_t`
    BusWidth = 0xA002,
}

impl Attribute for RegionAttribute {
    fn id(self) -> u32 {
        self as u32
    }

    fn value_size(self) -> usize {
        match self {
            Self::Segment | Self::GlobalFlags | Self::BusWidth => 4,
            Self::RuntimeAllocAllowed | Self::HostAccessible => 1,
            Self::Size
            | Self::AllocMaxSize
            | Self::RuntimeAllocGranule
            | Self::RuntimeAllocAlignment
            | Self::Base => POINTER_SIZE,
        }
    }
}

/// `hsa_amd_memory_pool_info_t` ids
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolAttribute {
    /// `hsa_amd_segment_t`
    Segment = 0,
    /// `uint32_t` mask of `hsa_amd_memory_pool_global_flag_t`
    GlobalFlags = 1,
    /// `size_t`
    Size = 2,
    /// `bool`
    RuntimeAllocAllowed = 5,
    /// `size_t`
    RuntimeAllocGranule = 6,
    /// `size_t`
    RuntimeAllocAlignment = 7,
    /// `bool`
    AccessibleByAll = 15,
    /// `size_t`
    AllocMaxSize = 16,
}

impl Attribute for PoolAttribute {
    fn id(self) -> u32 {
        self as u32
    }

    fn value_size(self) -> usize {
        match self {
            Self::Segment | Self::GlobalFlags => 4,
            Self::RuntimeAllocAllowed | Self::AccessibleByAll => 1,
            Self::Size | Self::RuntimeAllocGranule | Self::RuntimeAllocAlignment | Self::AllocMaxSize => {
                POINTER_SIZE
            }
        }
    }
}

/// Rust value decoded from the bytes an info query wrote
pub trait InfoValue: Sized {
    /// Decodes native-endian bytes, `None` if there are not enough of them
    fn decode(value: &[u8]) -> Option<Self>;
}

impl InfoValue for u32 {
    fn decode(value: &[u8]) -> Option<Self> {
        Some(u32::from_ne_bytes(value.get(..4)?.try_into().ok()?))
    }
}

/// `size_t` and pointers, widened to 64 bits
impl InfoValue for u64 {
    fn decode(value: &[u8]) -> Option<Self> {
        let bytes = value.get(..POINTER_SIZE)?;
        Some(usize::from_ne_bytes(bytes.try_into().ok()?) as u64)
    }
}

impl InfoValue for bool {
    fn decode(value: &[u8]) -> Option<Self> {
        value.first().map(|byte| *byte != 0)
    }
}

/// Nul terminated `char` buffer
impl InfoValue for String {
    fn decode(value: &[u8]) -> Option<Self> {
        let end = value.iter().position(|byte| *byte == 0).unwrap_or(value.len());
        Some(String::from_utf8_lossy(&value[..end]).into_owned())
    }
}

/// Introspection calls of the HSA runtime.
///
/// Iteration calls invoke the visitor once per handle, synchronously, and stop
/// as soon as the visitor returns anything other than [`HsaStatus::SUCCESS`].
/// In that case the iteration returns the visitor's status.
///
/// Info calls write the attribute's value into the front of `value`. They must
/// not write more than [`Attribute::value_size`] bytes and refuse buffers
/// smaller than that with [`HsaStatus::ERROR_INVALID_ARGUMENT`].
pub trait HsaApi {
    /// `hsa_init`
    fn init(&self) -> HsaStatus;

    /// `hsa_shut_down`
    fn shut_down(&self) -> HsaStatus;

    /// `hsa_iterate_agents`
    fn iterate_agents(&self, visitor: &mut dyn FnMut(AgentHandle) -> HsaStatus) -> HsaStatus;

    /// `hsa_agent_get_info`
    fn agent_get_info(&self, agent: AgentHandle, attribute: AgentAttribute, value: &mut [u8]) -> HsaStatus;

    /// `hsa_agent_iterate_regions`
    fn agent_iterate_regions(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(RegionHandle) -> HsaStatus,
    ) -> HsaStatus;

    /// `hsa_region_get_info`
    fn region_get_info(&self, region: RegionHandle, attribute: RegionAttribute, value: &mut [u8]) -> HsaStatus;

    /// `hsa_amd_agent_iterate_memory_pools`
    fn agent_iterate_memory_pools(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(PoolHandle) -> HsaStatus,
    ) -> HsaStatus;

    /// `hsa_amd_memory_pool_get_info`
    fn memory_pool_get_info(&self, pool: PoolHandle, attribute: PoolAttribute, value: &mut [u8]) -> HsaStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_runtime_headers() {
        assert_eq!(AgentAttribute::Device.id(), 17);
        assert_eq!(AgentAttribute::BdfId.id(), 0xA006);
        assert_eq!(RegionAttribute::HostAccessible.id(), 0xA000);
        assert_eq!(RegionAttribute::RuntimeAllocAlignment.id(), 7);
        assert_eq!(PoolAttribute::AccessibleByAll.id(), 15);
    }

    #[test]
    fn names_stop_at_nul() {
        let mut buf = [0u8; NAME_LEN];
        buf[..6].copy_from_slice(b"gfx90a");
        assert_eq!(String::decode(&buf).as_deref(), Some("gfx90a"));
    }

    #[test]
    fn short_buffers_do_not_decode() {
        assert_eq!(u32::decode(&[1, 2]), None);
        assert_eq!(u64::decode(&[1, 2, 3]), None);
        assert_eq!(bool::decode(&[]), None);
    }
}
