use crate::api::{PoolHandle, RegionHandle};

/// `hsa_region_segment_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionSegment {
    /// Shared by all agents
    Global,
    /// Read-only, visible to all agents
    ReadOnly,
    /// Private to a work-item
    Private,
    /// Shared by work-items of a work-group
    Group,
    /// Segment this build does not know about
    Unknown(u32),
}

impl RegionSegment {
    /// Maps runtime id to segment
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        match id {
            0 => Self::Global,
            1 => Self::ReadOnly,
            2 => Self::Private,
            3 => Self::Group,
            id => Self::Unknown(id),
        }
    }

    /// Runtime id
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Global => 0,
            Self::ReadOnly => 1,
            Self::Private => 2,
            Self::Group => 3,
            Self::Unknown(id) => id,
        }
    }

    /// Symbolic name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Global => "HSA_REGION_SEGMENT_GLOBAL",
            Self::ReadOnly => "HSA_REGION_SEGMENT_READONLY",
            Self::Private => "HSA_REGION_SEGMENT_PRIVATE",
            Self::Group => "HSA_REGION_SEGMENT_GROUP",
            Self::Unknown(_) => "HSA_REGION_SEGMENT_UNKNOWN",
        }
    }
}

/// `hsa_amd_segment_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolSegment {
    /// Shared by all agents
    Global,
    /// Read-only, visible to all agents
    ReadOnly,
    /// Private to a work-item
    Private,
    /// Shared by work-items of a work-group
    Group,
    /// Segment this build does not know about
    Unknown(u32),
}

impl PoolSegment {
    /// Maps runtime id to segment
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        match id {
            0 => Self::Global,
            1 => Self::ReadOnly,
            2 => Self::Private,
            3 => Self::Group,
            id => Self::Unknown(id),
        }
    }

    /// Runtime id
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::Global => 0,
            Self::ReadOnly => 1,
            Self::Private => 2,
            Self::Group => 3,
            Self::Unknown(id) => id,
        }
    }

    /// Symbolic name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Global => "HSA_AMD_SEGMENT_GLOBAL",
            Self::ReadOnly => "HSA_AMD_SEGMENT_READONLY",
            Self::Private => "HSA_AMD_SEGMENT_PRIVATE",
            Self::Group => "HSA_AMD_SEGMENT_GROUP",
            Self::Unknown(_) => "HSA_AMD_SEGMENT_UNKNOWN",
        }
    }
}

/// Mask of `hsa_region_global_flag_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionGlobalFlags(pub u32);

impl RegionGlobalFlags {
    /// `HSA_REGION_GLOBAL_FLAG_KERNARG`
    pub const KERNARG: u32 = 1;
    /// `HSA_REGION_GLOBAL_FLAG_FINE_GRAINED`
    pub const FINE_GRAINED: u32 = 2;
    /// `HSA_REGION_GLOBAL_FLAG_COARSE_GRAINED`
    pub const COARSE_GRAINED: u32 = 4;

    /// Region can hold kernel arguments
    #[must_use]
    pub const fn kernarg(self) -> bool {
        self.0 & Self::KERNARG != 0
    }

    /// Coherent at the granularity of a single access
    #[must_use]
    pub const fn fine_grained(self) -> bool {
        self.0 & Self::FINE_GRAINED != 0
    }

    /// Coherent only at dispatch boundaries
    #[must_use]
    pub const fn coarse_grained(self) -> bool {
        self.0 & Self::COARSE_GRAINED != 0
    }
}

/// Mask of `hsa_amd_memory_pool_global_flag_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolGlobalFlags(pub u32);

impl PoolGlobalFlags {
    /// `HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_KERNARG_INIT`
    pub const KERNARG_INIT: u32 = 1;
    /// `HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_FINE_GRAINED`
    pub const FINE_GRAINED: u32 = 2;
    /// `HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_COARSE_GRAINED`
    pub const COARSE_GRAINED: u32 = 4;

    /// Pool can be used to initialize kernel arguments
    #[must_use]
    pub const fn kernarg_init(self) -> bool {
        self.0 & Self::KERNARG_INIT != 0
    }

    /// Coherent at the granularity of a single access
    #[must_use]
    pub const fn fine_grained(self) -> bool {
        self.0 & Self::FINE_GRAINED != 0
    }

    /// Coherent only at dispatch boundaries
    #[must_use]
    pub const fn coarse_grained(self) -> bool {
        self.0 & Self::COARSE_GRAINED != 0
    }
}

/// Memory region of an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Runtime handle
    pub handle: RegionHandle,
    /// Segment
    pub segment: Option<RegionSegment>,
    /// Only set for global regions
    pub global_flags: Option<RegionGlobalFlags>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Largest single allocation in bytes
    pub alloc_max_size: Option<u64>,
    /// Can the runtime allocate from this region?
    pub alloc_allowed: Option<bool>,
    /// Allocation granule in bytes
    pub alloc_granule: Option<u64>,
    /// Allocation alignment in bytes
    pub alloc_alignment: Option<u64>,
    /// Can the host access this region directly?
    pub host_accessible: Option<bool>,
    /// Base address
    pub base: Option<u64>,
    /// Memory bus width in bits
    pub bus_width: Option<u32>,
}

impl Region {
    /// Region with no attributes known yet
    #[must_use]
    pub const fn new(handle: RegionHandle) -> Self {
        Self {
            handle,
            segment: None,
            global_flags: None,
            size: None,
            alloc_max_size: None,
            alloc_allowed: None,
            alloc_granule: None,
            alloc_alignment: None,
            host_accessible: None,
            base: None,
            bus_width: None,
        }
    }

    /// Is this region in the global segment?
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.segment == Some(RegionSegment::Global)
    }

    /// Allocation is allowed only if the runtime said so
    #[must_use]
    pub fn alloc_allowed(&self) -> bool {
        self.alloc_allowed == Some(true)
    }
}

/// AMD memory pool of an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    /// Runtime handle
    pub handle: PoolHandle,
    /// Segment
    pub segment: Option<PoolSegment>,
    /// Only set for global pools
    pub global_flags: Option<PoolGlobalFlags>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Largest single allocation in bytes
    pub alloc_max_size: Option<u64>,
    /// Can the runtime allocate from this pool?
    pub alloc_allowed: Option<bool>,
    /// Allocation granule in bytes
    pub alloc_granule: Option<u64>,
    /// Allocation alignment in bytes
    pub alloc_alignment: Option<u64>,
    /// Is the pool accessible by all agents by default?
    pub accessible_by_all: Option<bool>,
}

impl Pool {
    /// Pool with no attributes known yet
    #[must_use]
    pub const fn new(handle: PoolHandle) -> Self {
        Self {
            handle,
            segment: None,
            global_flags: None,
            size: None,
            alloc_max_size: None,
            alloc_allowed: None,
            alloc_granule: None,
            alloc_alignment: None,
            accessible_by_all: None,
        }
    }

    /// Is this pool in the global segment?
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.segment == Some(PoolSegment::Global)
    }

    /// Allocation is allowed only if the runtime said so
    #[must_use]
    pub fn alloc_allowed(&self) -> bool {
        self.alloc_allowed == Some(true)
    }
}
