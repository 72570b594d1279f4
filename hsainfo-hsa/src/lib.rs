//! HSA runtime backend
//!
//! Loads `libhsa-runtime64.so` at runtime and implements [`HsaApi`] over it.

#![allow(non_camel_case_types)]

use hsainfo_core::api::{
    AgentAttribute, AgentHandle, Attribute, HsaApi, PoolAttribute, PoolHandle, RegionAttribute, RegionHandle,
};
use hsainfo_core::{ErrorStatus, HsaError, HsaStatus};
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the runtime, resolved by the dynamic loader
pub const LIBRARY_NAME: &str = "libhsa-runtime64.so";

type hsa_status_t = u32;
// hsa_agent_t, hsa_region_t and hsa_amd_memory_pool_t are structs holding a single uint64_t
type hsa_handle_t = u64;
type hsa_iterate_callback_t = unsafe extern "C" fn(hsa_handle_t, *mut c_void) -> hsa_status_t;

/// Loaded HSA runtime
#[derive(Debug)]
pub struct HsaRuntime {
    // Function pointers below are only valid while this is loaded
    #[allow(unused)]
    hsa: Library,
    hsa_init: unsafe extern "C" fn() -> hsa_status_t,
    hsa_shut_down: unsafe extern "C" fn() -> hsa_status_t,
    hsa_iterate_agents: unsafe extern "C" fn(hsa_iterate_callback_t, *mut c_void) -> hsa_status_t,
    hsa_agent_get_info: unsafe extern "C" fn(hsa_handle_t, u32, *mut c_void) -> hsa_status_t,
    hsa_agent_iterate_regions:
        unsafe extern "C" fn(hsa_handle_t, hsa_iterate_callback_t, *mut c_void) -> hsa_status_t,
    hsa_region_get_info: unsafe extern "C" fn(hsa_handle_t, u32, *mut c_void) -> hsa_status_t,
    hsa_amd_agent_iterate_memory_pools:
        unsafe extern "C" fn(hsa_handle_t, hsa_iterate_callback_t, *mut c_void) -> hsa_status_t,
    hsa_amd_memory_pool_get_info: unsafe extern "C" fn(hsa_handle_t, u32, *mut c_void) -> hsa_status_t,
}

/// Where to look for the runtime, in order: configured paths, `$ROCM_PATH/lib`,
/// the dynamic loader's search path, fixed install locations and finally a
/// local build in `$HOME/git/compute/out/lib`.
#[must_use]
pub fn library_candidates(configured: &[PathBuf], rocm_path: Option<&Path>, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = configured.to_vec();
    if let Some(rocm_path) = rocm_path {
        candidates.push(rocm_path.join("lib").join(LIBRARY_NAME));
    }
    candidates.push(PathBuf::from(LIBRARY_NAME));
    candidates.push(PathBuf::from(format!("{LIBRARY_NAME}.1")));
    candidates.push(PathBuf::from("/opt/hsa/lib").join(LIBRARY_NAME));
    candidates.push(PathBuf::from("/opt/rocm/lib").join(LIBRARY_NAME));
    if let Some(home) = home {
        candidates.push(home.join("git/compute/out/lib").join(LIBRARY_NAME));
    }
    candidates
}

/// [`library_candidates`] with `ROCM_PATH` and `HOME` taken from the environment
#[must_use]
pub fn default_library_candidates(configured: &[PathBuf]) -> Vec<PathBuf> {
    let rocm_path = std::env::var_os("ROCM_PATH").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    library_candidates(configured, rocm_path.as_deref(), home.as_deref())
}

fn symbol<T: Copy>(hsa: &Library, name: &str) -> Result<T, HsaError> {
    // Safety: every symbol is requested with the signature from hsa.h / hsa_ext_amd.h
    let symbol = unsafe { hsa.get::<T>(name.as_bytes()) }
        .map_err(|err| HsaError::new(ErrorStatus::SymbolNotFound, format!("{name}: {err}")))?;
    Ok(*symbol)
}

impl HsaRuntime {
    /// Loads the first candidate that the dynamic loader accepts.
    pub fn load(candidates: &[PathBuf]) -> Result<Self, HsaError> {
        let (hsa, path) = candidates
            .iter()
            .find_map(|path| match unsafe { Library::new(path) } {
                Ok(hsa) => Some((hsa, path)),
                Err(err) => {
                    debug!("Failed to load {}, {err}", path.display());
                    None
                }
            })
            .ok_or_else(|| {
                HsaError::new(ErrorStatus::DyLibNotFound, format!("HSA runtime not found, searched {candidates:?}"))
            })?;
        info!("Using HSA runtime {}", path.display());

        Ok(Self {
            hsa_init: symbol(&hsa, "hsa_init")?,
            hsa_shut_down: symbol(&hsa, "hsa_shut_down")?,
            hsa_iterate_agents: symbol(&hsa, "hsa_iterate_agents")?,
            hsa_agent_get_info: symbol(&hsa, "hsa_agent_get_info")?,
            hsa_agent_iterate_regions: symbol(&hsa, "hsa_agent_iterate_regions")?,
            hsa_region_get_info: symbol(&hsa, "hsa_region_get_info")?,
            hsa_amd_agent_iterate_memory_pools: symbol(&hsa, "hsa_amd_agent_iterate_memory_pools")?,
            hsa_amd_memory_pool_get_info: symbol(&hsa, "hsa_amd_memory_pool_get_info")?,
            hsa,
        })
    }
}

/// Native callback, `data` is the visitor passed to one of the iterate calls.
/// A panicking visitor aborts the process.
unsafe extern "C" fn visit<H: From<u64>>(handle: hsa_handle_t, data: *mut c_void) -> hsa_status_t {
    let visitor = unsafe { &mut *data.cast::<&mut dyn FnMut(H) -> HsaStatus>() };
    visitor(H::from(handle)).0
}

/// Runs a native iteration with visitor as its `data` pointer.
fn iterate<H: From<u64>>(
    mut visitor: &mut dyn FnMut(H) -> HsaStatus,
    native: impl FnOnce(hsa_iterate_callback_t, *mut c_void) -> hsa_status_t,
) -> HsaStatus {
    let data = std::ptr::addr_of_mut!(visitor).cast::<c_void>();
    HsaStatus(native(visit::<H>, data))
}

fn fits(attribute: impl Attribute, value: &[u8]) -> bool {
    value.len() >= attribute.value_size()
}

impl HsaApi for HsaRuntime {
    fn init(&self) -> HsaStatus {
        HsaStatus(unsafe { (self.hsa_init)() })
    }

    fn shut_down(&self) -> HsaStatus {
        HsaStatus(unsafe { (self.hsa_shut_down)() })
    }

    fn iterate_agents(&self, visitor: &mut dyn FnMut(AgentHandle) -> HsaStatus) -> HsaStatus {
        iterate(visitor, |callback, data| unsafe { (self.hsa_iterate_agents)(callback, data) })
    }

    fn agent_get_info(&self, agent: AgentHandle, attribute: AgentAttribute, value: &mut [u8]) -> HsaStatus {
        if !fits(attribute, value) {
            return HsaStatus::ERROR_INVALID_ARGUMENT;
        }
        HsaStatus(unsafe { (self.hsa_agent_get_info)(agent.0, attribute.id(), value.as_mut_ptr().cast()) })
    }

    fn agent_iterate_regions(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(RegionHandle) -> HsaStatus,
    ) -> HsaStatus {
        iterate(visitor, |callback, data| unsafe { (self.hsa_agent_iterate_regions)(agent.0, callback, data) })
    }

    fn region_get_info(&self, region: RegionHandle, attribute: RegionAttribute, value: &mut [u8]) -> HsaStatus {
        if !fits(attribute, value) {
            return HsaStatus::ERROR_INVALID_ARGUMENT;
        }
        HsaStatus(unsafe { (self.hsa_region_get_info)(region.0, attribute.id(), value.as_mut_ptr().cast()) })
    }

    fn agent_iterate_memory_pools(
        &self,
        agent: AgentHandle,
        visitor: &mut dyn FnMut(PoolHandle) -> HsaStatus,
    ) -> HsaStatus {
        iterate(visitor, |callback, data| unsafe {
            (self.hsa_amd_agent_iterate_memory_pools)(agent.0, callback, data)
        })
    }

    fn memory_pool_get_info(&self, pool: PoolHandle, attribute: PoolAttribute, value: &mut [u8]) -> HsaStatus {
        if !fits(attribute, value) {
            return HsaStatus::ERROR_INVALID_ARGUMENT;
        }
        HsaStatus(unsafe { (self.hsa_amd_memory_pool_get_info)(pool.0, attribute.id(), value.as_mut_ptr().cast()) })
    }
}
