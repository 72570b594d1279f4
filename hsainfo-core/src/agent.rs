use crate::api::AgentHandle;

/// `hsa_device_type_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// `HSA_DEVICE_TYPE_CPU`
    Cpu,
    /// `HSA_DEVICE_TYPE_GPU`
    Gpu,
    /// `HSA_DEVICE_TYPE_DSP`
    Dsp,
    /// Device type this build does not know about
    Unknown(u32),
}

impl DeviceType {
    /// Maps runtime id to device type
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        match id {
            0 => Self::Cpu,
            1 => Self::Gpu,
            2 => Self::Dsp,
            id => Self::Unknown(id),
        }
    }

    /// Short label used in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Dsp => "DSP",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// `hsa_profile_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// `HSA_PROFILE_BASE`
    Base,
    /// `HSA_PROFILE_FULL`
    Full,
    /// Profile this build does not know about
    Unknown(u32),
}

impl Profile {
    /// Maps runtime id to profile
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        match id {
            0 => Self::Base,
            1 => Self::Full,
            id => Self::Unknown(id),
        }
    }

    /// Symbolic name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "HSA_PROFILE_BASE",
            Self::Full => "HSA_PROFILE_FULL",
            Self::Unknown(_) => "HSA_PROFILE_UNKNOWN",
        }
    }
}

/// PCI location of a GPU agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciLocation {
    /// Bus number
    pub bus: u8,
    /// Device number, 5 bits
    pub device: u8,
    /// Function number, 3 bits
    pub function: u8,
}

impl PciLocation {
    /// Unpacks `HSA_AMD_AGENT_INFO_BDFID`: function in bits 0-2, device in
    /// bits 3-7 and bus in bits 8-15.
    #[must_use]
    pub const fn from_bdfid(bdfid: u32) -> Self {
        Self {
            bus: ((bdfid >> 8) & 0xff) as u8,
            device: ((bdfid >> 3) & 0x1f) as u8,
            function: (bdfid & 0x7) as u8,
        }
    }
}

/// Compute device exposed by the runtime.
///
/// Every attribute is queried on a best-effort basis, `None` means the runtime
/// did not answer the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Runtime handle
    pub handle: AgentHandle,
    /// Agent name, e.g. `gfx90a`
    pub name: Option<String>,
    /// Vendor name
    pub vendor_name: Option<String>,
    /// CPU, GPU, ...
    pub device: Option<DeviceType>,
    /// Supported HSA profile
    pub profile: Option<Profile>,
    /// NUMA node the agent belongs to
    pub node: Option<u32>,
    /// PCI location, only queried for GPUs
    pub pci: Option<PciLocation>,
    /// Chip identifier, only queried for GPUs
    pub chip_id: Option<u32>,
}

impl Agent {
    /// Agent with no attributes known yet
    #[must_use]
    pub const fn new(handle: AgentHandle) -> Self {
        Self { handle, name: None, vendor_name: None, device: None, profile: None, node: None, pci: None, chip_id: None }
    }

    /// Is this agent a GPU?
    #[must_use]
    pub fn is_gpu(&self) -> bool {
        self.device == Some(DeviceType::Gpu)
    }
}
