use hsainfo_core::{enumerate, HsaError, Report, ReportOptions};
use hsainfo_hsa::{default_library_candidates, HsaRuntime};

// Needs libhsa-runtime64.so and at least the host CPU agent
#[test]
#[ignore]
fn enumerate_installed_runtime() -> Result<(), HsaError> {
    let runtime = HsaRuntime::load(&default_library_candidates(&[]))?;
    let inventory = enumerate(&runtime)?;
    assert!(!inventory.agents().is_empty());
    for agent in inventory.agents() {
        assert!(agent.name.is_some());
        assert_eq!(agent.is_gpu(), agent.pci.is_some());
    }
    let options = ReportOptions { segments: true, nonglobal: true, verbose: true };
    println!("{}", Report::new(&inventory, options));
    Ok(())
}

#[test]
#[ignore]
fn runtime_can_be_reinitialized() -> Result<(), HsaError> {
    let runtime = HsaRuntime::load(&default_library_candidates(&[]))?;
    let first = enumerate(&runtime)?;
    let second = enumerate(&runtime)?;
    assert_eq!(first.agents().len(), second.agents().len());
    Ok(())
}
