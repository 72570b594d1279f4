use core::fmt::{Display, Formatter};
use thiserror::Error;

/// Status code returned by every HSA runtime call (`hsa_status_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HsaStatus(pub u32);

impl HsaStatus {
    /// The function has been executed successfully.
    pub const SUCCESS: Self = Self(0x0);
    /// A traversal over a list of elements has been interrupted by the application.
    pub const INFO_BREAK: Self = Self(0x1);
    /// A generic error has occurred.
    pub const ERROR: Self = Self(0x1000);
    /// One of the actual arguments does not meet a precondition.
    pub const ERROR_INVALID_ARGUMENT: Self = Self(0x1001);
    /// The requested queue creation is not valid.
    pub const ERROR_INVALID_QUEUE_CREATION: Self = Self(0x1002);
    /// The requested allocation is not valid.
    pub const ERROR_INVALID_ALLOCATION: Self = Self(0x1003);
    /// The agent is invalid.
    pub const ERROR_INVALID_AGENT: Self = Self(0x1004);
    /// The memory region is invalid.
    pub const ERROR_INVALID_REGION: Self = Self(0x1005);
    /// The signal is invalid.
    pub const ERROR_INVALID_SIGNAL: Self = Self(0x1006);
    /// The queue is invalid.
    pub const ERROR_INVALID_QUEUE: Self = Self(0x1007);
    /// The runtime failed to allocate the necessary resources.
    pub const ERROR_OUT_OF_RESOURCES: Self = Self(0x1008);
    /// The AQL packet is malformed.
    pub const ERROR_INVALID_PACKET_FORMAT: Self = Self(0x1009);
    /// An error has been detected while releasing a resource.
    pub const ERROR_RESOURCE_FREE: Self = Self(0x100A);
    /// An API other than `hsa_init` has been invoked while the reference count is zero.
    pub const ERROR_NOT_INITIALIZED: Self = Self(0x100B);
    /// The maximum reference count for the object has been reached.
    pub const ERROR_REFCOUNT_OVERFLOW: Self = Self(0x100C);
    /// The arguments passed to a function are not compatible.
    pub const ERROR_INCOMPATIBLE_ARGUMENTS: Self = Self(0x100D);
    /// The index is invalid.
    pub const ERROR_INVALID_INDEX: Self = Self(0x100E);
    /// The memory pool is invalid (`hsa_ext_amd.h`).
    pub const ERROR_INVALID_MEMORY_POOL: Self = Self(0x28);

    /// Symbolic name of the status, if it is one the runtime documents
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x0 => "HSA_STATUS_SUCCESS",
            0x1 => "HSA_STATUS_INFO_BREAK",
            0x28 => "HSA_STATUS_ERROR_INVALID_MEMORY_POOL",
            0x1000 => "HSA_STATUS_ERROR",
            0x1001 => "HSA_STATUS_ERROR_INVALID_ARGUMENT",
            0x1002 => "HSA_STATUS_ERROR_INVALID_QUEUE_CREATION",
            0x1003 => "HSA_STATUS_ERROR_INVALID_ALLOCATION",
            0x1004 => "HSA_STATUS_ERROR_INVALID_AGENT",
            0x1005 => "HSA_STATUS_ERROR_INVALID_REGION",
            0x1006 => "HSA_STATUS_ERROR_INVALID_SIGNAL",
            0x1007 => "HSA_STATUS_ERROR_INVALID_QUEUE",
            0x1008 => "HSA_STATUS_ERROR_OUT_OF_RESOURCES",
            0x1009 => "HSA_STATUS_ERROR_INVALID_PACKET_FORMAT",
            0x100A => "HSA_STATUS_ERROR_RESOURCE_FREE",
            0x100B => "HSA_STATUS_ERROR_NOT_INITIALIZED",
            0x100C => "HSA_STATUS_ERROR_REFCOUNT_OVERFLOW",
            0x100D => "HSA_STATUS_ERROR_INCOMPATIBLE_ARGUMENTS",
            0x100E => "HSA_STATUS_ERROR_INVALID_INDEX",
            _ => return None,
        })
    }

    /// Is this [`HsaStatus::SUCCESS`]?
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Turns a non-success status into an [`HsaError`] of the given kind.
    pub fn check(self, status: ErrorStatus) -> Result<(), HsaError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(HsaError::new(status, format!("HSA runtime returned {self}")))
        }
    }
}

impl Display for HsaStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => f.write_fmt(format_args!("{name} ({:#x})", self.0)),
            None => f.write_fmt(format_args!("unknown status {:#x}", self.0)),
        }
    }
}

/// Error returned when a structural runtime call fails.
///
/// Per-attribute queries never produce this error, they leave the attribute
/// unset instead.
#[derive(Debug, Error)]
#[error("{status:?}: {context}")]
pub struct HsaError {
    /// What went wrong
    pub status: ErrorStatus,
    /// Human readable details
    pub context: Box<str>,
}

impl HsaError {
    /// Creates new error
    pub fn new(status: ErrorStatus, context: impl Into<Box<str>>) -> Self {
        Self { status, context: context.into() }
    }
}

/// Kind of [`HsaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Dynamic library was not found on the disk
    DyLibNotFound,
    /// Dynamic library does not export a required function
    SymbolNotFound,
    /// Runtime initialization failure
    Initialization,
    /// Runtime shutdown failure
    Deinitialization,
    /// Failed to enumerate agents
    AgentEnumeration,
    /// Failed to enumerate memory regions of an agent
    RegionEnumeration,
    /// Failed to enumerate memory pools of an agent
    PoolEnumeration,
}
