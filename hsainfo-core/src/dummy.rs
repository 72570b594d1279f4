//! In-process runtime that needs no hardware.
//!
//! Agents, regions and pools are described attribute by attribute, exactly
//! as the native runtime would answer `*_get_info` calls. Attributes that were
//! not set answer with [`HsaStatus::ERROR_INVALID_ARGUMENT`], like a runtime
//! that does not support them.

use crate::agent::DeviceType;
use crate::api::{
    AgentAttribute, AgentHandle, Attribute, HsaApi, PoolAttribute, PoolHandle, RegionAttribute, RegionHandle,
    NAME_LEN,
};
use crate::error::HsaStatus;
use crate::memory::{PoolSegment, RegionSegment};
use std::cell::Cell;
use std::collections::BTreeMap;

const REGION_HANDLE_BASE: u64 = 0x1_0000;
const POOL_HANDLE_BASE: u64 = 0x2_0000;

/// Value that can be stored as an attribute answer
pub trait EncodeInfo {
    /// Bytes the native runtime would write
    fn encode(self) -> Vec<u8>;
}

impl EncodeInfo for u32 {
    fn encode(self) -> Vec<u8> {
        self.to_ne_bytes().to_vec()
    }
}

/// Encoded as `size_t`
impl EncodeInfo for u64 {
    fn encode(self) -> Vec<u8> {
        (self as usize).to_ne_bytes().to_vec()
    }
}

impl EncodeInfo for bool {
    fn encode(self) -> Vec<u8> {
        vec![u8::from(self)]
    }
}

/// Encoded as nul terminated `char[64]`, truncated if longer
impl EncodeInfo for &str {
    fn encode(self) -> Vec<u8> {
        let mut bytes = vec![0; NAME_LEN];
        let len = self.len().min(NAME_LEN - 1);
        bytes[..len].copy_from_slice(&self.as_bytes()[..len]);
        bytes
    }
}

#[derive(Debug, Default, Clone)]
struct Info(BTreeMap<u32, Vec<u8>>);

impl Info {
    fn set(&mut self, attribute: impl Attribute, value: impl EncodeInfo) {
        self.0.insert(attribute.id(), value.encode());
    }

    fn get(&self, attribute: impl Attribute, value: &mut [u8]) -> HsaStatus {
        let size = attribute.value_size();
        if value.len() < size {
            return HsaStatus::ERROR_INVALID_ARGUMENT;
        }
        let Some(bytes) = self.0.get(&attribute.id()) else {
            return HsaStatus::ERROR_INVALID_ARGUMENT;
        };
        let len = bytes.len().min(size);
        value[..len].copy_from_slice(&bytes[..len]);
        HsaStatus::SUCCESS
    }
}

/// Description of a memory region
#[derive(Debug, Default, Clone)]
pub struct DummyRegion {
    info: Info,
}

impl DummyRegion {
    /// Region without any attributes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocatable region of given segment and size
    #[must_use]
    pub fn allocatable(segment: RegionSegment, size: u64) -> Self {
        Self::new()
            .with(RegionAttribute::Segment, segment.id())
            .with(RegionAttribute::Size, size)
            .with(RegionAttribute::RuntimeAllocAllowed, true)
            .with(RegionAttribute::RuntimeAllocGranule, 4096u64)
            .with(RegionAttribute::RuntimeAllocAlignment, 4096u64)
    }

    /// Sets attribute answer
    #[must_use]
    pub fn with(mut self, attribute: RegionAttribute, value: impl EncodeInfo) -> Self {
        self.info.set(attribute, value);
        self
    }
}

/// Description of an AMD memory pool
#[derive(Debug, Default, Clone)]
pub struct DummyPool {
    info: Info,
}

impl DummyPool {
    /// Pool without any attributes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocatable pool of given segment and size
    #[must_use]
    pub fn allocatable(segment: PoolSegment, size: u64) -> Self {
        Self::new()
            .with(PoolAttribute::Segment, segment.id())
            .with(PoolAttribute::Size, size)
            .with(PoolAttribute::RuntimeAllocAllowed, true)
            .with(PoolAttribute::RuntimeAllocGranule, 4096u64)
            .with(PoolAttribute::RuntimeAllocAlignment, 4096u64)
    }

    /// Sets attribute answer
    #[must_use]
    pub fn with(mut self, attribute: PoolAttribute, value: impl EncodeInfo) -> Self {
        self.info.set(attribute, value);
        self
    }
}

/// Description of an agent
#[derive(Debug, Default, Clone)]
pub struct DummyAgent {
    info: Info,
    regions: Vec<DummyRegion>,
    pools: Vec<DummyPool>,
    region_iteration: Option<HsaStatus>,
    pool_iteration: Option<HsaStatus>,
}

impl DummyAgent {
    /// Agent without any attributes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// CPU agent with name and vendor
    #[must_use]
    pub fn cpu(name: &str) -> Self {
        Self::new()
            .with(AgentAttribute::Name, name)
            .with(AgentAttribute::VendorName, "CPU")
            .with(AgentAttribute::Device, device_id(DeviceType::Cpu))
    }

    /// GPU agent with name, vendor, PCI location and chip id
    #[must_use]
    pub fn gpu(name: &str, bdfid: u32) -> Self {
        Self::new()
            .with(AgentAttribute::Name, name)
            .with(AgentAttribute::VendorName, "AMD")
            .with(AgentAttribute::Device, device_id(DeviceType::Gpu))
            .with(AgentAttribute::BdfId, bdfid)
            .with(AgentAttribute::ChipId, 0x740fu32)
    }

    /// Sets attribute answer
    #[must_use]
    pub fn with(mut self, attribute: AgentAttribute, value: impl EncodeInfo) -> Self {
        self.info.set(attribute, value);
        self
    }

    /// Adds region, regions are iterated in insertion order
    #[must_use]
    pub fn with_region(mut self, region: DummyRegion) -> Self {
        self.regions.push(region);
        self
    }

    /// Adds pool, pools are iterated in insertion order
    #[must_use]
    pub fn with_pool(mut self, pool: DummyPool) -> Self {
        self.pools.push(pool);
        self
    }

    /// Region iteration of this agent returns status without visiting anything
    #[must_use]
    pub fn failing_region_iteration(mut self, status: HsaStatus) -> Self {
        self.region_iteration = Some(status);
        self
    }

    /// Pool iteration of this agent returns status without visiting anything
    #[must_use]
    pub fn failing_pool_iteration(mut self, status: HsaStatus) -> Self {
        self.pool_iteration = Some(status);
        self
    }
}

const fn device_id(device: DeviceType) -> u32 {
    match device {
        DeviceType::Cpu => 0,
        DeviceType::Gpu => 1,
        DeviceType::Dsp => 2,
        DeviceType::Unknown(id) => id,
    }
}

#[derive(Debug)]
struct AgentEntry {
    handle: AgentHandle,
    info: Info,
    regions: Vec<RegionHandle>,
    pools: Vec<PoolHandle>,
    region_iteration: Option<HsaStatus>,
    pool_iteration: Option<HsaStatus>,
}

/// [`HsaApi`] implementation answering from in-memory descriptions
#[derive(Debug, Default)]
pub struct DummyRuntime {
    agents: Vec<AgentEntry>,
    regions: BTreeMap<RegionHandle, Info>,
    pools: BTreeMap<PoolHandle, Info>,
    init_status: Option<HsaStatus>,
    shut_down_status: Option<HsaStatus>,
    agent_iteration: Option<HsaStatus>,
    init_calls: Cell<u32>,
    shut_down_calls: Cell<u32>,
}

impl DummyRuntime {
    /// Runtime without agents
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds agent, agents are iterated in insertion order
    #[must_use]
    pub fn with_agent(mut self, agent: DummyAgent) -> Self {
        let handle = AgentHandle(self.agents.len() as u64 + 1);
        let mut regions = Vec::with_capacity(agent.regions.len());
        for region in agent.regions {
            let region_handle = RegionHandle(REGION_HANDLE_BASE + self.regions.len() as u64);
            self.regions.insert(region_handle, region.info);
            regions.push(region_handle);
        }
        let mut pools = Vec::with_capacity(agent.pools.len());
        for pool in agent.pools {
            let pool_handle = PoolHandle(POOL_HANDLE_BASE + self.pools.len() as u64);
            self.pools.insert(pool_handle, pool.info);
            pools.push(pool_handle);
        }
        self.agents.push(AgentEntry {
            handle,
            info: agent.info,
            regions,
            pools,
            region_iteration: agent.region_iteration,
            pool_iteration: agent.pool_iteration,
        });
        self
    }

    /// `init` returns status
    #[must_use]
    pub fn failing_init(mut self, status: HsaStatus) -> Self {
        self.init_status = Some(status);
        self
    }

    /// `shut_down` returns status
    #[must_use]
    pub fn failing_shut_down(mut self, status: HsaStatus) -> Self {
        self.shut_down_status = Some(status);
        self
    }

    /// Agent iteration returns status without visiting anything
    #[must_use]
    pub fn failing_agent_iteration(mut self, status: HsaStatus) -> Self {
        self.agent_iteration = Some(status);
        self
    }

    /// How many times `init` was called
    #[must_use]
    pub fn init_calls(&self) -> u32 {
        self.init_calls.get()
    }

    /// How many times `shut_down` was called
    #[must_use]
    pub fn shut_down_calls(&self) -> u32 {
        self.shut_down_calls.get()
    }

    fn agent(&self, handle: AgentHandle) -> Option<&AgentEntry> {
        self.agents.iter().find(|agent| agent.handle == handle)
    }
}

fn visit_all<H: Copy>(handles: &[H], visitor: &mut dyn FnMut(H) -> HsaStatus) -> HsaStatus {
    for handle in handles {
        let status = visitor(*handle);
        if !status.is_success() {
            return status;
        }
    }
    HsaStatus::SUCCESS
}

impl HsaApi for DummyRuntime {
    fn init(&self) -> HsaStatus {
        self.init_calls.set(self.init_calls.get() + 1);
        self.init_status.unwrap_or(HsaStatus::SUCCESS)
    }

    fn shut_down(&self) -> HsaStatus {
        self.shut_down_calls.set(self.shut_down_calls.get() + 1);
        self.shut_down_status.unwrap_or(HsaStatus::SUCCESS)
    }

    fn iterate_agents(&self, visitor: &mut dyn FnMut(AgentHandle) -> HsaStatus) -> HsaStatus {
        if let Some(status) = self.agent_iteration {
            return status;
        }
        let handles: Vec<AgentHandle> = self.agents.iter().map(|agent| agent.handle).collect();
        visit_all(&handles, visitor)
    }

    fn agent_get_info(&self, agent: AgentHandle, attribute: AgentAttribute, value: &mut [u8]) -> HsaStatus {
        self.agent(agent).map_or(HsaStatus::ERROR_INVALID_AGENT, |agent| agent.info.get(attribute, value))
    }

    fn agent_iterate_regions(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(RegionHandle) -> HsaStatus,
    ) -> HsaStatus {
        let Some(agent) = self.agent(agent) else {
            return HsaStatus::ERROR_INVALID_AGENT;
        };
        match agent.region_iteration {
            Some(status) => status,
            None => visit_all(&agent.regions, visitor),
        }
    }

    fn region_get_info(&self, region: RegionHandle, attribute: RegionAttribute, value: &mut [u8]) -> HsaStatus {
        self.regions.get(&region).map_or(HsaStatus::ERROR_INVALID_REGION, |info| info.get(attribute, value))
    }

    fn agent_iterate_memory_pools(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(PoolHandle) -> HsaStatus,
    ) -> HsaStatus {
        let Some(agent) = self.agent(agent) else {
            return HsaStatus::ERROR_INVALID_AGENT;
        };
        match agent.pool_iteration {
            Some(status) => status,
            None => visit_all(&agent.pools, visitor),
        }
    }

    fn memory_pool_get_info(&self, pool: PoolHandle, attribute: PoolAttribute, value: &mut [u8]) -> HsaStatus {
        self.pools.get(&pool).map_or(HsaStatus::ERROR_INVALID_MEMORY_POOL, |info| info.get(attribute, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_attribute_is_unsupported() {
        let runtime = DummyRuntime::new().with_agent(DummyAgent::new());
        let mut value = [0u8; NAME_LEN];
        assert_eq!(
            runtime.agent_get_info(AgentHandle(1), AgentAttribute::Name, &mut value),
            HsaStatus::ERROR_INVALID_ARGUMENT
        );
    }

    #[test]
    fn short_buffer_is_refused() {
        let runtime = DummyRuntime::new().with_agent(DummyAgent::cpu("cpu0"));
        let mut value = [0u8; 8];
        assert_eq!(
            runtime.agent_get_info(AgentHandle(1), AgentAttribute::Name, &mut value),
            HsaStatus::ERROR_INVALID_ARGUMENT
        );
    }

    #[test]
    fn unknown_handles_are_invalid() {
        let runtime = DummyRuntime::new().with_agent(DummyAgent::cpu("cpu0"));
        let mut value = [0u8; NAME_LEN];
        assert_eq!(
            runtime.agent_get_info(AgentHandle(9), AgentAttribute::Name, &mut value),
            HsaStatus::ERROR_INVALID_AGENT
        );
        assert_eq!(
            runtime.region_get_info(RegionHandle(9), RegionAttribute::Size, &mut value),
            HsaStatus::ERROR_INVALID_REGION
        );
        assert_eq!(
            runtime.memory_pool_get_info(PoolHandle(9), PoolAttribute::Size, &mut value),
            HsaStatus::ERROR_INVALID_MEMORY_POOL
        );
        assert_eq!(
            runtime.agent_iterate_memory_pools(AgentHandle(9), &mut |_| HsaStatus::SUCCESS),
            HsaStatus::ERROR_INVALID_AGENT
        );
    }

    #[test]
    fn visitor_status_stops_iteration() {
        let runtime = DummyRuntime::new().with_agent(DummyAgent::new()).with_agent(DummyAgent::new());
        let mut visited = 0;
        let status = runtime.iterate_agents(&mut |_| {
            visited += 1;
            HsaStatus::INFO_BREAK
        });
        assert_eq!(status, HsaStatus::INFO_BREAK);
        assert_eq!(visited, 1);
    }

    #[test]
    fn long_names_are_truncated_and_terminated() {
        let bytes = "x".repeat(100).as_str().encode();
        assert_eq!(bytes.len(), NAME_LEN);
        assert_eq!(bytes[NAME_LEN - 1], 0);
    }
}
