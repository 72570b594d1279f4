use hsainfo_core::agent::Agent;
use hsainfo_core::api::{AgentHandle, PoolHandle, RegionHandle};
use hsainfo_core::dummy::{DummyAgent, DummyPool, DummyRegion, DummyRuntime};
use hsainfo_core::{
    enumerate, format_size, DeviceType, HsaError, Inventory, PciLocation, Pool, PoolGlobalFlags, PoolSegment, Region,
    RegionSegment, Report, ReportOptions,
};

const SEGMENTS: ReportOptions = ReportOptions { segments: true, nonglobal: false, verbose: false };
const ALL: ReportOptions = ReportOptions { segments: true, nonglobal: true, verbose: false };

fn region(handle: u64, segment: RegionSegment) -> Region {
    let mut region = Region::new(RegionHandle(handle));
    region.segment = Some(segment);
    region.size = Some(handle << 20);
    region
}

fn pool(handle: u64, segment: PoolSegment) -> Pool {
    let mut pool = Pool::new(PoolHandle(handle));
    pool.segment = Some(segment);
    pool.size = Some(handle << 20);
    pool
}

/// One GPU whose regions and pools interleave global and non-global records.
fn interleaved() -> Inventory {
    let handle = AgentHandle(7);
    let mut agent = Agent::new(handle);
    agent.name = Some("gfx90a".into());
    agent.vendor_name = Some("AMD".into());
    agent.device = Some(DeviceType::Gpu);
    agent.pci = Some(PciLocation { bus: 0xc3, device: 0, function: 1 });
    let mut inventory = Inventory::new();
    inventory.push_agent(agent);
    for (i, segment) in [
        RegionSegment::Group,
        RegionSegment::Global,
        RegionSegment::Private,
        RegionSegment::Global,
        RegionSegment::ReadOnly,
        RegionSegment::Global,
    ]
    .into_iter()
    .enumerate()
    {
        inventory.push_region(handle, region(i as u64 + 1, segment));
    }
    for (i, segment) in [PoolSegment::Global, PoolSegment::Group, PoolSegment::Global].into_iter().enumerate() {
        inventory.push_pool(handle, pool(i as u64 + 1, segment));
    }
    inventory
}

fn lines_with<'a>(report: &'a str, needle: &str) -> Vec<&'a str> {
    report.lines().filter(|line| line.contains(needle)).collect()
}

#[test]
fn agent_header() {
    let report = Report::new(&interleaved(), ReportOptions::default()).to_string();
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some("(*) Agent index ...................................... 0"));
    assert_eq!(lines.next(), Some("GPU Agent    : 'gfx90a'"));
    assert_eq!(lines.next(), Some("     Vendor  : 'AMD'"));
    assert_eq!(lines.next(), Some("     Device  topology    PCI [B#c3 D#00 F#01]"));
    assert!(report.ends_with("\n\n"));
}

#[test]
fn regions_only_with_segments() {
    let report = Report::new(&interleaved(), ReportOptions::default()).to_string();
    assert!(!report.contains("(**) Regions"));
    assert!(!report.contains("Region segment"));
    assert!(report.contains("(**) AMD Pools"));

    let report = Report::new(&interleaved(), SEGMENTS).to_string();
    assert!(report.contains("(**) Regions"));
}

#[test]
fn global_indices_are_consecutive() {
    let report = Report::new(&interleaved(), ALL).to_string();
    assert_eq!(
        lines_with(&report, "Global region index"),
        [
            "(***) Global region index ............0",
            "(***) Global region index ............1",
            "(***) Global region index ............2",
        ]
    );
    assert_eq!(
        lines_with(&report, "Global pool index"),
        ["(***) Global pool index ............0", "(***) Global pool index ............1"]
    );
}

#[test]
fn nonglobal_hidden_by_default() {
    let report = Report::new(&interleaved(), SEGMENTS).to_string();
    assert!(!report.contains("Non global"));
    assert!(!report.contains("HSA_REGION_SEGMENT_GROUP"));
    assert!(!report.contains("HSA_AMD_SEGMENT_GROUP"));
    assert_eq!(lines_with(&report, "Region segment").len(), 3);
    assert_eq!(lines_with(&report, "AMD pool segment").len(), 2);
}

#[test]
fn nonglobal_shown_once_in_order() {
    let report = Report::new(&interleaved(), ALL).to_string();
    assert_eq!(lines_with(&report, "Non global region").len(), 3);
    assert_eq!(lines_with(&report, "Non global pool").len(), 1);
    assert_eq!(
        lines_with(&report, "Region segment"),
        [
            "Region segment: HSA_REGION_SEGMENT_GROUP (3)",
            "Region segment: HSA_REGION_SEGMENT_GLOBAL (0)",
            "Region segment: HSA_REGION_SEGMENT_PRIVATE (2)",
            "Region segment: HSA_REGION_SEGMENT_GLOBAL (0)",
            "Region segment: HSA_REGION_SEGMENT_READONLY (1)",
            "Region segment: HSA_REGION_SEGMENT_GLOBAL (0)",
        ]
    );
    // Region i has size i MiB
    let sizes: Vec<_> = lines_with(&report, "MB /").into_iter().take(6).collect();
    assert_eq!(sizes.len(), 6);
    for (i, line) in sizes.iter().enumerate() {
        assert!(line.ends_with(&format_size((i as u64 + 1) << 20)), "{line}");
    }
    assert!(sizes[5].ends_with("6.00 MB / 0.01 GB"));
}

#[test]
fn verbose_global_pool() -> Result<(), HsaError> {
    let runtime = DummyRuntime::new().with_agent(
        DummyAgent::gpu("gfx942", 0).with_pool(
            DummyPool::allocatable(PoolSegment::Global, 192 << 30)
                .with(hsainfo_core::api::PoolAttribute::GlobalFlags, PoolGlobalFlags::COARSE_GRAINED)
                .with(hsainfo_core::api::PoolAttribute::AccessibleByAll, false),
        ),
    );
    let inventory = enumerate(&runtime)?;
    let report = Report::new(&inventory, ReportOptions { verbose: true, ..ReportOptions::default() }).to_string();
    assert!(report.contains("     Chip ID : 0x740f"));
    assert!(report.contains("AMD pool segment: HSA_AMD_SEGMENT_GLOBAL (0)"));
    assert!(report.contains("196608.00 MB / 192.00 GB"));
    assert!(report.contains("Pool Global flags:"));
    assert!(report.contains("HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_KERNARG_INIT     0"));
    assert!(report.contains("HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_COARSE_GRAINED   1"));
    assert!(report.contains("Allocation granularity\t\t\t0x1000"));
    assert!(report.contains("Accessible by all\t\t\t0"));
    Ok(())
}

#[test]
fn verbose_not_allocatable() -> Result<(), HsaError> {
    let runtime = DummyRuntime::new().with_agent(
        DummyAgent::cpu("cpu").with_region(DummyRegion::allocatable(RegionSegment::Global, 1 << 30).with(
            hsainfo_core::api::RegionAttribute::RuntimeAllocAllowed,
            false,
        )),
    );
    let inventory = enumerate(&runtime)?;
    let options = ReportOptions { segments: true, nonglobal: false, verbose: true };
    let report = Report::new(&inventory, options).to_string();
    assert!(report.contains("Allocation is not allowed"));
    assert!(!report.contains("Allocation granularity"));
    // Flags were never answered
    assert!(report.contains("Region Global flags:\n         unsupported\n"));
    Ok(())
}

#[test]
fn unsupported_attributes_do_not_fault() -> Result<(), HsaError> {
    let runtime = DummyRuntime::new().with_agent(
        DummyAgent::new().with_region(DummyRegion::new()).with_pool(DummyPool::new()),
    );
    let inventory = enumerate(&runtime)?;
    let options = ReportOptions { segments: true, nonglobal: true, verbose: true };
    let report = Report::new(&inventory, options).to_string();
    assert!(report.contains("Unknown Agent    : unsupported"));
    assert!(report.contains("     Vendor  : unsupported"));
    assert!(report.contains("Region segment: unsupported"));
    assert!(report.contains("AMD pool segment: unsupported"));
    assert_eq!(lines_with(&report, "Allocation is not allowed").len(), 2);
    Ok(())
}

#[test]
fn unknown_segment_is_named() {
    let handle = AgentHandle(1);
    let mut inventory = Inventory::new();
    inventory.push_agent(Agent::new(handle));
    inventory.push_region(handle, region(1, RegionSegment::Unknown(0xff)));
    let report = Report::new(&inventory, ALL).to_string();
    assert!(report.contains("Region segment: HSA_REGION_SEGMENT_UNKNOWN (255)"));
}
