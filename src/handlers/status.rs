//! Status handler

use anyhow::Result;
use std::path::PathBuf;

use crate::config::SyncConfig;
use crate::report::StatusReport;
use crate::VerbosityLevel;

/// Handle `wiki-sync status`
///
/// Re-scans the working tree and the remote, then prints either the console
/// listing or, with `json`, the JSON report.
pub fn handle_status(
    paths: &[PathBuf],
    all: bool,
    json: bool,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let config = SyncConfig::load()?;
    let mut sync = super::open_working_tree(paths, verbosity)?;
    sync.refresh()?;

    let report = StatusReport::collect(&sync, paths)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        report.print_summary(
            verbosity == VerbosityLevel::Verbose,
            all || config.show_up_to_date,
        )?;
    }

    Ok(())
}
