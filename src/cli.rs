//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct CLI {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: PollscopeSubCommand,
}

#[derive(Subcommand)]
pub enum PollscopeSubCommand {
    /// Report poll statistics per polled device queue.
    Polls {
        /// Trace folder.
        trace: PathBuf,

        /// Report file. Defaults to a generated name in the current
        /// directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report spin/active utilization per polling thread.
    Spin {
        /// Trace folder.
        trace: PathBuf,

        /// Report window lower bound, in nanoseconds.
        #[arg(long)]
        begin: Option<i64>,

        /// Report window upper bound, in nanoseconds.
        #[arg(long)]
        end: Option<i64>,

        /// Restrict the report to the given thread names. May be repeated.
        #[arg(short, long)]
        threads: Vec<String>,

        /// Report file. Defaults to a generated name in the current
        /// directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl CLI {
    pub fn trace_dir(&self) -> &PathBuf {
        match &self.command {
            PollscopeSubCommand::Polls { trace, .. } => trace,
            PollscopeSubCommand::Spin { trace, .. } => trace,
        }
    }

    pub fn begin(&self) -> Option<i64> {
        match &self.command {
            PollscopeSubCommand::Spin { begin, .. } => *begin,
            _ => None,
        }
    }

    pub fn end(&self) -> Option<i64> {
        match &self.command {
            PollscopeSubCommand::Spin { end, .. } => *end,
            _ => None,
        }
    }

    pub fn threads(&self) -> &[String] {
        match &self.command {
            PollscopeSubCommand::Spin { threads, .. } => threads,
            _ => &[],
        }
    }

    pub fn output(&self) -> Option<&PathBuf> {
        match &self.command {
            PollscopeSubCommand::Polls { output, .. } => output.as_ref(),
            PollscopeSubCommand::Spin { output, .. } => output.as_ref(),
        }
    }
}
