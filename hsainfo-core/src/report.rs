//! Human readable rendering of an [`Inventory`].

use crate::agent::Agent;
use crate::memory::{Pool, Region};
use crate::walker::Inventory;
use core::fmt::{self, Display, Formatter};

const UNSUPPORTED: &str = "unsupported";
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// What the report includes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Include memory regions, pools are always included
    pub segments: bool,
    /// Include non-global regions and pools
    pub nonglobal: bool,
    /// Include flags, allocation details and extra agent attributes
    pub verbose: bool,
}

/// Report of all agents in an inventory, rendered through [`Display`]
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    inventory: &'a Inventory,
    options: ReportOptions,
}

/// Byte count in mebibytes and gibibytes, e.g. `1024.00 MB / 1.00 GB`
#[must_use]
pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    format!("{:.2} MB / {:.2} GB", bytes / MIB, bytes / GIB)
}

fn size(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| UNSUPPORTED.into(), format_size)
}

fn hex(value: Option<u64>) -> String {
    value.map_or_else(|| UNSUPPORTED.into(), |value| format!("{value:#x}"))
}

fn flag(value: Option<bool>) -> String {
    value.map_or_else(|| UNSUPPORTED.into(), |value| u8::from(value).to_string())
}

fn quoted(value: Option<&str>) -> String {
    value.map_or_else(|| UNSUPPORTED.into(), |value| format!("'{value}'"))
}

impl<'a> Report<'a> {
    /// Creates report over inventory
    #[must_use]
    pub const fn new(inventory: &'a Inventory, options: ReportOptions) -> Self {
        Self { inventory, options }
    }

    fn fmt_agent(&self, f: &mut Formatter<'_>, agent: &Agent) -> fmt::Result {
        let label = agent.device.map_or("Unknown", |device| device.label());
        writeln!(f, "{label} Agent    : {}", quoted(agent.name.as_deref()))?;
        writeln!(f, "     Vendor  : {}", quoted(agent.vendor_name.as_deref()))?;
        if agent.is_gpu() {
            match agent.pci {
                Some(pci) => writeln!(
                    f,
                    "     Device  topology    PCI [B#{:02x} D#{:02x} F#{:02x}]",
                    pci.bus, pci.device, pci.function
                )?,
                None => writeln!(f, "     Device  topology    {UNSUPPORTED}")?,
            }
        }
        if self.options.verbose {
            if agent.is_gpu() {
                writeln!(f, "     Chip ID : {}", hex(agent.chip_id.map(u64::from)))?;
            }
            writeln!(f, "     Profile : {}", agent.profile.map_or(UNSUPPORTED, |profile| profile.name()))?;
            match agent.node {
                Some(node) => writeln!(f, "     Node    : {node}")?,
                None => writeln!(f, "     Node    : {UNSUPPORTED}")?,
            }
        }

        if self.options.segments {
            writeln!(f, "(**) Regions")?;
            self.fmt_listing(f, "region", self.inventory.regions(agent.handle), Region::is_global, |f, region| {
                self.fmt_region(f, region)
            })?;
        }
        writeln!(f, "(**) AMD Pools")?;
        self.fmt_listing(f, "pool", self.inventory.pools(agent.handle), Pool::is_global, |f, pool| {
            self.fmt_pool(f, pool)
        })
    }

    /// Global records get consecutive indices, non-global ones are only
    /// delimited and only shown with `nonglobal`.
    fn fmt_listing<T>(
        &self,
        f: &mut Formatter<'_>,
        kind: &str,
        records: &[T],
        is_global: impl Fn(&T) -> bool,
        fmt_record: impl Fn(&mut Formatter<'_>, &T) -> fmt::Result,
    ) -> fmt::Result {
        let mut global_index = 0;
        for record in records {
            if is_global(record) {
                writeln!(f, "(***) Global {kind} index ............{global_index}")?;
                fmt_record(f, record)?;
                global_index += 1;
            } else if self.options.nonglobal {
                writeln!(f, "(***) Non global {kind} ..............")?;
                fmt_record(f, record)?;
            }
        }
        Ok(())
    }

    fn fmt_region(&self, f: &mut Formatter<'_>, region: &Region) -> fmt::Result {
        match region.segment {
            Some(segment) => writeln!(f, "Region segment: {} ({})", segment.name(), segment.id())?,
            None => writeln!(f, "Region segment: {UNSUPPORTED}")?,
        }
        writeln!(f, "Size \t\t\t\t\t\t{}", size(region.size))?;
        if !self.options.verbose {
            return Ok(());
        }

        if region.is_global() {
            writeln!(f, "Region Global flags:")?;
            match region.global_flags {
                Some(flags) => {
                    writeln!(f, "         HSA_REGION_GLOBAL_FLAG_KERNARG\t\t {}", u8::from(flags.kernarg()))?;
                    writeln!(f, "         HSA_REGION_GLOBAL_FLAG_FINE_GRAINED     {}", u8::from(flags.fine_grained()))?;
                    writeln!(f, "         HSA_REGION_GLOBAL_FLAG_COARSE_GRAINED   {}", u8::from(flags.coarse_grained()))?;
                }
                None => writeln!(f, "         {UNSUPPORTED}")?,
            }
        }
        if region.alloc_allowed() {
            writeln!(f, "Allocation granularity\t\t\t{}", hex(region.alloc_granule))?;
            writeln!(f, "Alignment \t\t\t\t{}", hex(region.alloc_alignment))?;
            writeln!(f, "Host accessible   \t\t\t{}", flag(region.host_accessible))?;
            writeln!(f, "Max allocation size \t\t\t{}", size(region.alloc_max_size))?;
        } else {
            writeln!(f, "Allocation is not allowed")?;
        }
        if let Some(base) = region.base {
            writeln!(f, "Base address \t\t\t\t{base:#x}")?;
        }
        if let Some(bus_width) = region.bus_width {
            writeln!(f, "Bus width \t\t\t\t{bus_width} bits")?;
        }
        Ok(())
    }

    fn fmt_pool(&self, f: &mut Formatter<'_>, pool: &Pool) -> fmt::Result {
        match pool.segment {
            Some(segment) => writeln!(f, "AMD pool segment: {} ({})", segment.name(), segment.id())?,
            None => writeln!(f, "AMD pool segment: {UNSUPPORTED}")?,
        }
        writeln!(f, "Size\t\t\t\t\t\t{}", size(pool.size))?;
        if !self.options.verbose {
            return Ok(());
        }

        if pool.is_global() {
            writeln!(f, "Pool Global flags:")?;
            match pool.global_flags {
                Some(flags) => {
                    writeln!(f, "         HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_KERNARG_INIT     {}", u8::from(flags.kernarg_init()))?;
                    writeln!(f, "         HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_FINE_GRAINED     {}", u8::from(flags.fine_grained()))?;
                    writeln!(f, "         HSA_AMD_MEMORY_POOL_GLOBAL_FLAG_COARSE_GRAINED   {}", u8::from(flags.coarse_grained()))?;
                }
                None => writeln!(f, "         {UNSUPPORTED}")?,
            }
        }
        if pool.alloc_allowed() {
            writeln!(f, "Allocation granularity\t\t\t{}", hex(pool.alloc_granule))?;
            writeln!(f, "Alignment \t\t\t\t{}", hex(pool.alloc_alignment))?;
            writeln!(f, "Accessible by all\t\t\t{}", flag(pool.accessible_by_all))?;
            writeln!(f, "Max allocation size \t\t\t{}", size(pool.alloc_max_size))?;
        } else {
            writeln!(f, "Allocation is not allowed")?;
        }
        Ok(())
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, agent) in self.inventory.agents().iter().enumerate() {
            writeln!(f, "(*) Agent index ...................................... {index}")?;
            self.fmt_agent(f, agent)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
