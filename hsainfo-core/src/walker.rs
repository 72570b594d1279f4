//! Visits every agent, memory region and memory pool of the runtime.
//!
//! The walk is strictly sequential: `init`, agents (and, while each agent is
//! being visited, its regions and pools), `shut_down`. The visited agent is
//! handed to the nested iterations explicitly, so nothing depends on the
//! order in which the runtime calls back.

use crate::agent::{Agent, DeviceType, PciLocation, Profile};
use crate::api::{
    AgentAttribute, AgentHandle, Attribute, HsaApi, InfoValue, PoolAttribute, PoolHandle, RegionAttribute,
    RegionHandle, MAX_VALUE_SIZE,
};
use crate::error::{ErrorStatus, HsaError, HsaStatus};
use crate::memory::{Pool, PoolGlobalFlags, PoolSegment, Region, RegionGlobalFlags, RegionSegment};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Everything the runtime reported, agents in iteration order and their
/// regions and pools keyed by agent handle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inventory {
    agents: Vec<Agent>,
    regions: BTreeMap<AgentHandle, Vec<Region>>,
    pools: BTreeMap<AgentHandle, Vec<Pool>>,
}

impl Inventory {
    /// Empty inventory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends agent
    pub fn push_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    /// Records region as belonging to agent
    pub fn push_region(&mut self, agent: AgentHandle, region: Region) {
        self.regions.entry(agent).or_default().push(region);
    }

    /// Records pool as belonging to agent
    pub fn push_pool(&mut self, agent: AgentHandle, pool: Pool) {
        self.pools.entry(agent).or_default().push(pool);
    }

    /// Agents in the order the runtime reported them
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Regions of agent in iteration order
    #[must_use]
    pub fn regions(&self, agent: AgentHandle) -> &[Region] {
        self.regions.get(&agent).map_or(&[], Vec::as_slice)
    }

    /// Pools of agent in iteration order
    #[must_use]
    pub fn pools(&self, agent: AgentHandle) -> &[Pool] {
        self.pools.get(&agent).map_or(&[], Vec::as_slice)
    }
}

/// Initializes the runtime, walks it and shuts it down.
///
/// Shutdown is attempted even if the walk failed, the walk's error wins.
pub fn enumerate<A: HsaApi + ?Sized>(api: &A) -> Result<Inventory, HsaError> {
    api.init().check(ErrorStatus::Initialization)?;
    debug!("HSA runtime initialized");
    let inventory = walk_agents(api);
    let shut_down = api.shut_down().check(ErrorStatus::Deinitialization);
    let inventory = inventory?;
    shut_down?;
    debug!("HSA runtime shut down, {} agents found", inventory.agents().len());
    Ok(inventory)
}

/// Collects all agents with their regions and pools. The runtime must already
/// be initialized.
pub fn walk_agents<A: HsaApi + ?Sized>(api: &A) -> Result<Inventory, HsaError> {
    let mut inventory = Inventory::new();
    let mut failure = None;
    let status = api.iterate_agents(&mut |handle| match visit_agent(api, handle, &mut inventory) {
        Ok(()) => HsaStatus::SUCCESS,
        Err(err) => {
            failure = Some(err);
            HsaStatus::ERROR
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    status.check(ErrorStatus::AgentEnumeration)?;
    Ok(inventory)
}

fn visit_agent<A: HsaApi + ?Sized>(api: &A, handle: AgentHandle, inventory: &mut Inventory) -> Result<(), HsaError> {
    let agent = query_agent(api, handle);
    trace!("Visiting agent {handle:?} {:?}", agent.name);
    inventory.push_agent(agent);

    api.agent_iterate_regions(handle, &mut |region| {
        inventory.push_region(handle, query_region(api, region));
        HsaStatus::SUCCESS
    })
    .check(ErrorStatus::RegionEnumeration)?;

    api.agent_iterate_memory_pools(handle, &mut |pool| {
        inventory.push_pool(handle, query_pool(api, pool));
        HsaStatus::SUCCESS
    })
    .check(ErrorStatus::PoolEnumeration)
}

/// Runs one info query, `None` if the runtime did not answer it.
fn query<T: InfoValue, Attr: Attribute>(attribute: Attr, get: impl FnOnce(Attr, &mut [u8]) -> HsaStatus) -> Option<T> {
    let mut value = [0u8; MAX_VALUE_SIZE];
    let status = get(attribute, &mut value[..]);
    if status.is_success() {
        T::decode(&value[..attribute.value_size()])
    } else {
        debug!("Query of {attribute:?} failed with {status}, leaving it unset");
        None
    }
}

fn query_agent<A: HsaApi + ?Sized>(api: &A, handle: AgentHandle) -> Agent {
    let info = |attribute, value: &mut [u8]| api.agent_get_info(handle, attribute, value);
    let mut agent = Agent::new(handle);
    agent.name = query(AgentAttribute::Name, info);
    agent.vendor_name = query(AgentAttribute::VendorName, info);
    agent.device = query(AgentAttribute::Device, info).map(DeviceType::from_raw);
    agent.profile = query(AgentAttribute::Profile, info).map(Profile::from_raw);
    agent.node = query(AgentAttribute::Node, info);
    if agent.is_gpu() {
        agent.pci = query(AgentAttribute::BdfId, info).map(PciLocation::from_bdfid);
        agent.chip_id = query(AgentAttribute::ChipId, info);
    }
    agent
}

fn query_region<A: HsaApi + ?Sized>(api: &A, handle: RegionHandle) -> Region {
    let info = |attribute, value: &mut [u8]| api.region_get_info(handle, attribute, value);
    let mut region = Region::new(handle);
    region.segment = query(RegionAttribute::Segment, info).map(RegionSegment::from_raw);
    if region.is_global() {
        region.global_flags = query(RegionAttribute::GlobalFlags, info).map(RegionGlobalFlags);
    }
    region.size = query(RegionAttribute::Size, info);
    region.alloc_max_size = query(RegionAttribute::AllocMaxSize, info);
    region.alloc_allowed = query(RegionAttribute::RuntimeAllocAllowed, info);
    region.alloc_granule = query(RegionAttribute::RuntimeAllocGranule, info);
    region.alloc_alignment = query(RegionAttribute::RuntimeAllocAlignment, info);
    region.host_accessible = query(RegionAttribute::HostAccessible, info);
    region.base = query(RegionAttribute::Base, info);
    region.bus_width = query(RegionAttribute::BusWidth, info);
    trace!("Visited region {handle:?} {:?}", region.segment);
    region
}

fn query_pool<A: HsaApi + ?Sized>(api: &A, handle: PoolHandle) -> Pool {
    let info = |attribute, value: &mut [u8]| api.memory_pool_get_info(handle, attribute, value);
    let mut pool = Pool::new(handle);
    pool.segment = query(PoolAttribute::Segment, info).map(PoolSegment::from_raw);
    if pool.is_global() {
        pool.global_flags = query(PoolAttribute::GlobalFlags, info).map(PoolGlobalFlags);
    }
    pool.size = query(PoolAttribute::Size, info);
    pool.alloc_max_size = query(PoolAttribute::AllocMaxSize, info);
    pool.alloc_allowed = query(PoolAttribute::RuntimeAllocAllowed, info);
    pool.alloc_granule = query(PoolAttribute::RuntimeAllocGranule, info);
    pool.alloc_alignment = query(PoolAttribute::RuntimeAllocAlignment, info);
    pool.accessible_by_all = query(PoolAttribute::AccessibleByAll, info);
    trace!("Visited pool {handle:?} {:?}", pool.segment);
    pool
}
