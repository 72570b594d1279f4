//! Display information about HSA agents and related memory

#![forbid(missing_docs)]

mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use hsainfo_core::{enumerate, KernelProbe, Report};
use hsainfo_hsa::{default_library_candidates, HsaRuntime};
use std::ffi::OsString;
use std::io::Write;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;

/// Filter directives for the stderr log, e.g. `HSAINFO_LOG=debug`
const LOG_ENV: &str = "HSAINFO_LOG";

fn banner() -> String {
    let rule = "*".repeat(74);
    format!(
        "{rule}\n* Display information about HSA agents and related memory\n* Version {}\n{rule}\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Writes the banner, then parses arguments. Help and usage errors are
/// returned for the caller to print, after the banner.
fn parse_args<I, T>(args: I, out: &mut impl Write) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    write!(out, "{}", banner())?;
    let cli = Cli::try_parse_from(&args)?;
    let program = args.first().map_or_else(|| "hsainfo".into(), |program| program.to_string_lossy());
    write!(out, "Use '{program} --help' for command line options\n\n\n")?;
    Ok(cli)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = match parse_args(std::env::args_os(), &mut std::io::stdout()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    let config = Config::load();

    let runtime = HsaRuntime::load(&default_library_candidates(&config.library_paths()))
        .context("Failed to load the HSA runtime")?;
    let inventory = enumerate(&runtime).context("Failed to enumerate HSA agents")?;
    print!("{}", Report::new(&inventory, cli.into()));
    print!("{}", KernelProbe::default().system_info());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn banner_then_hint() {
        let mut out = Vec::new();
        let cli = parse_args(["./hsainfo", "--verbose"], &mut out).unwrap();
        assert!(cli.verbose);
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0].len(), 74);
        assert_eq!(lines[1], "* Display information about HSA agents and related memory");
        assert_eq!(lines[2], format!("* Version {}", env!("CARGO_PKG_VERSION")));
        assert_eq!(lines[4], "Use './hsainfo --help' for command line options");
        assert!(out.ends_with("options\n\n\n"));
    }

    #[test]
    fn banner_precedes_help() {
        let mut out = Vec::new();
        let err = parse_args(["hsainfo", "--help"], &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(String::from_utf8(out).unwrap(), banner());
    }

    #[test]
    fn banner_precedes_usage_errors() {
        let mut out = Vec::new();
        let err = parse_args(["hsainfo", "--pools"], &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert!(String::from_utf8(out).unwrap().starts_with("*****"));
    }
}
