//! Kernel capabilities that are not visible through the HSA runtime.
//!
//! Both checks read text the kernel exposes and treat every I/O failure as
//! "not found".

use core::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Init state of the amdp2p module
pub const RDMA_MODULE_INITSTATE: &str = "/sys/module/amdp2p/initstate";
/// Kernel symbol table
pub const KERNEL_SYMBOLS: &str = "/proc/kallsyms";
/// Exported by amdkfd when it offers an RDMA interface
pub const RDMA_QUERY_SYMBOL: &str = "amdkfd_query_rdma_interface";
/// Exported by PeerDirect capable InfiniBand stacks
pub const PEER_MEMORY_REGISTER_SYMBOL: &str = "ib_register_peer_memory_client";

/// Reads kernel module state and the kernel symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelProbe {
    module_initstate: PathBuf,
    kernel_symbols: PathBuf,
}

impl Default for KernelProbe {
    fn default() -> Self {
        Self::new(RDMA_MODULE_INITSTATE, KERNEL_SYMBOLS)
    }
}

impl KernelProbe {
    /// Probe reading the given initstate file and symbol table
    pub fn new(module_initstate: impl Into<PathBuf>, kernel_symbols: impl Into<PathBuf>) -> Self {
        Self { module_initstate: module_initstate.into(), kernel_symbols: kernel_symbols.into() }
    }

    /// Is the amdp2p module live or does amdkfd export its RDMA query interface?
    #[must_use]
    pub fn rdma_supported(&self) -> bool {
        module_is_live(&self.module_initstate) || has_kernel_symbol(&self.kernel_symbols, RDMA_QUERY_SYMBOL)
    }

    /// Can peer memory clients register with the InfiniBand stack?
    #[must_use]
    pub fn peer_direct_supported(&self) -> bool {
        has_kernel_symbol(&self.kernel_symbols, PEER_MEMORY_REGISTER_SYMBOL)
    }

    /// Runs both checks
    #[must_use]
    pub fn system_info(&self) -> SystemInfo {
        SystemInfo { rdma: self.rdma_supported(), peer_direct: self.peer_direct_supported() }
    }
}

fn module_is_live(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(state) => state.contains("live"),
        Err(err) => {
            debug!("Failed to read {}, {err}", path.display());
            false
        }
    }
}

/// Looks for a name starting with symbol in the name column of
/// `address type name [module]` lines, so versioned exports like
/// `amdkfd_query_rdma_interface_v2` count too.
fn has_kernel_symbol(path: &Path, symbol: &str) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("Failed to open {}, {err}", path.display());
            return false;
        }
    };
    for line in BufReader::new(file).split(b'\n') {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                debug!("Failed to read {}, {err}", path.display());
                return false;
            }
        };
        let name = line.split(u8::is_ascii_whitespace).filter(|token| !token.is_empty()).nth(2);
        if name.is_some_and(|name| name.starts_with(symbol.as_bytes())) {
            return true;
        }
    }
    false
}

/// Result of [`KernelProbe::system_info`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    /// RDMA is supported by amdkfd
    pub rdma: bool,
    /// PeerDirect interface is present
    pub peer_direct: bool,
}

impl Display for SystemInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "(*) System information:")?;
        if self.rdma {
            writeln!(f, "RDMA is supported by amdkfd")?;
        } else {
            writeln!(f, "RDMA is not supported")?;
        }
        if self.peer_direct {
            writeln!(f, "PeerDirect interface is detected")
        } else {
            writeln!(f, "PeerDirect interface is not found")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_symbol_matches() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = dir.path().join("kallsyms");
        std::fs::write(&symbols, "ffffffffc0a1b2c0 T amdkfd_query_rdma_interface\t[amdgpu]\n").unwrap();
        assert!(has_kernel_symbol(&symbols, RDMA_QUERY_SYMBOL));
        std::fs::write(&symbols, "ffffffffc0a1b2c0 t amdkfd_query_rdma_interface_v2\t[amdgpu]\n").unwrap();
        assert!(has_kernel_symbol(&symbols, RDMA_QUERY_SYMBOL));
    }

    #[test]
    fn symbol_must_start_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = dir.path().join("kallsyms");
        std::fs::write(&symbols, "ffffffffc0a1b2b0 t __pfx_amdkfd_query_rdma_interface\t[amdgpu]\n").unwrap();
        assert!(!has_kernel_symbol(&symbols, RDMA_QUERY_SYMBOL));
        // Only the name column is searched
        std::fs::write(&symbols, "ffffffffc0a1b2b0 t amdgpu_init\t[amdkfd_query_rdma_interface]\n").unwrap();
        assert!(!has_kernel_symbol(&symbols, RDMA_QUERY_SYMBOL));
    }

    #[test]
    fn system_info_lines() {
        let info = SystemInfo { rdma: true, peer_direct: false };
        assert_eq!(
            info.to_string(),
            "(*) System information:\nRDMA is supported by amdkfd\nPeerDirect interface is not found\n"
        );
    }
}
