use hsainfo_core::probe::{PEER_MEMORY_REGISTER_SYMBOL, RDMA_QUERY_SYMBOL};
use hsainfo_core::{KernelProbe, SystemInfo};
use std::path::Path;
use tempfile::TempDir;

const KALLSYMS: &str = "\
ffffffff81000000 T startup_64
ffffffff81000070 T secondary_startup_64
ffffffffc0812340 t amdgpu_device_init\t[amdgpu]
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn missing(dir: &TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join(name)
}

#[test]
fn rdma_from_live_module() {
    let dir = tempfile::tempdir().unwrap();
    let probe = KernelProbe::new(write(&dir, "initstate", "live\n"), missing(&dir, "kallsyms"));
    assert!(probe.rdma_supported());
}

#[test]
fn rdma_from_kernel_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = format!("{KALLSYMS}ffffffffc0901230 T {RDMA_QUERY_SYMBOL}\t[amdgpu]\n");
    let probe = KernelProbe::new(write(&dir, "initstate", "coming\n"), write(&dir, "kallsyms", &symbols));
    assert!(probe.rdma_supported());
}

#[test]
fn rdma_absent() {
    let dir = tempfile::tempdir().unwrap();
    let probe = KernelProbe::new(write(&dir, "initstate", "going\n"), write(&dir, "kallsyms", KALLSYMS));
    assert!(!probe.rdma_supported());
}

#[test]
fn unreadable_sources_are_negative() {
    let dir = tempfile::tempdir().unwrap();
    let probe = KernelProbe::new(missing(&dir, "initstate"), missing(&dir, "kallsyms"));
    assert_eq!(probe.system_info(), SystemInfo { rdma: false, peer_direct: false });

    // A directory can be opened but not read
    let probe = KernelProbe::new(dir.path(), dir.path());
    assert_eq!(probe.system_info(), SystemInfo::default());
}

#[test]
fn peer_direct_needs_registration_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let without = KernelProbe::new(missing(&dir, "initstate"), write(&dir, "without", KALLSYMS));
    assert!(!without.peer_direct_supported());

    let symbols = format!("{KALLSYMS}ffffffffc0a00010 T {PEER_MEMORY_REGISTER_SYMBOL}\t[ib_core]\n");
    let with = KernelProbe::new(missing(&dir, "initstate"), write(&dir, "with", &symbols));
    assert!(with.peer_direct_supported());
    // The live module alone says nothing about PeerDirect
    let live = KernelProbe::new(write(&dir, "initstate", "live"), write(&dir, "without2", KALLSYMS));
    assert!(!live.peer_direct_supported());
    assert!(live.rdma_supported());
}

#[test]
fn default_probe_reads_system_paths() {
    let probe = KernelProbe::default();
    assert_eq!(probe, KernelProbe::new(Path::new("/sys/module/amdp2p/initstate"), Path::new("/proc/kallsyms")));
}
