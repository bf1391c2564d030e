//! Event processors.
//!
//! This module contains the front-end of pollscope's event processors. Each
//! of these processors is invoked by a different CLI subcommand.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::context::Context;
use crate::utils::unique_json_filename;

pub mod poll_stats;
pub mod spin_report;

/// Serialize a report to the configured output file, or to a generated file
/// name in the current directory.
fn write_report<T: Serialize>(ctx: &Context, report: &T) -> Result<()> {
    let path = match &ctx.output {
        Some(path) => path.clone(),
        None => unique_json_filename(None::<PathBuf>)
            .ok_or_else(|| anyhow!("could not pick a report file name"))?,
    };

    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, report)?;

    eprintln!("Results saved in {}.", path.display());

    Ok(())
}
