use clap::Parser;
use hsainfo_core::ReportOptions;

/// Display information about HSA agents and related memory
#[derive(Parser, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Display information about segments (Default: pool only)
    #[arg(long)]
    pub segments: bool,

    /// Display information about non-global memory (Default: global only)
    #[arg(long)]
    pub nonglobal: bool,

    /// Display more information
    #[arg(long)]
    pub verbose: bool,
}

impl From<Cli> for ReportOptions {
    fn from(cli: Cli) -> Self {
        ReportOptions { segments: cli.segments, nonglobal: cli.nonglobal, verbose: cli.verbose }
    }
}
