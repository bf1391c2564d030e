//! Pollscope runtime parameters.
//!
//! This module defines the `Context` struct containing all the parameters
//! needed by the analyses at runtime. The Context struct is meant to be built
//! from command line parameters.
//! ```no_run
//! use pollscope::{cli::CLI, context::Context};
//! use clap::Parser;
//!
//! let args = CLI::parse();
//! let ctx = Context::from(&args);
//! ```

use std::path::PathBuf;

use crate::cli::CLI;

/// Contains all pollscope parameters.
#[derive(Default)]
pub struct Context {
    pub verbose: bool,

    /// Lower bound of the report window, in nanoseconds. Defaults to the
    /// start of the recorded history.
    pub begin: Option<i64>,
    /// Upper bound of the report window, in nanoseconds. Defaults to the end
    /// of the recorded history.
    pub end: Option<i64>,

    /// If non-empty, restrict utilization reports to these thread names.
    pub threads: Vec<String>,

    /// Report destination. `None` means a generated file name in the current
    /// directory.
    pub output: Option<PathBuf>,
}

impl From<&CLI> for Context {
    fn from(cli_opts: &CLI) -> Self {
        Self {
            verbose: cli_opts.verbose,
            begin: cli_opts.begin(),
            end: cli_opts.end(),
            threads: cli_opts.threads().to_vec(),
            output: cli_opts.output().cloned(),
        }
    }
}
