//! A DPDK ethdev trace analysis tool.
//!
//! Pollscope derives performance metrics from DPDK ethdev instrumentation
//! events recorded in execution traces: packet-per-poll statistics taken from
//! `rte_eth_rx_burst()` invocations, and per-thread spin/active utilization
//! of the polled NIC queues.
//!
//! Pollscope's main components are either __event sources__ or __event
//! processors__:
//! - An event source produces a timestamp-ordered stream of events. It
//!   implements the `EventSource` trait. Currently the only event source is a
//!   recorded trace directory.
//! - An event processor consumes a stream of events. It implements the
//!   `EventProcessor` trait. Pollscope has two processors: a poll statistics
//!   extractor backed by a segment store, and a spin/active usage extractor
//!   backed by a state system.

pub mod cli;
pub mod utils;

pub mod events;
pub mod layout;

pub mod poll;
pub mod spin;
pub mod statesys;

pub mod context;
pub mod processors;

pub mod trace;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::{context::Context, events::TraceEvent};

/// Cooperative cancellation flag shared between an event source and an
/// external signal handler. Checked between events, never mid-update.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// The raw flag, for registration with a signal handler.
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }
}

/// Feeds an `EventProcessor` with a stream of events.
pub trait EventSource: Sized {
    /// Consume and feed all events to the supplied processor. Stops at the
    /// next event boundary once `cancel` is raised.
    fn event_loop<P: EventProcessor>(
        &mut self,
        processor: &mut P,
        ctx: &Context,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Process the events with the supplied `EventProcessor` and return it
    /// once finalized.
    fn process_events<P: EventProcessor>(
        &mut self,
        mut processor: P,
        ctx: &Context,
        cancel: &CancelToken,
    ) -> Result<P> {
        processor.pre_load_init(ctx)?;

        self.event_loop(&mut processor, ctx, cancel)?;

        processor.finalize(ctx)?;

        Ok(processor)
    }
}

/// Consumes a stream of events.
///
/// A malformed event makes `consume_event` fail, which aborts the whole run:
/// no partial stores are reported for malformed traces.
pub trait EventProcessor {
    /// Initialize the processor before supplying it to an event source.
    fn pre_load_init(&mut self, ctx: &Context) -> Result<()>;

    /// Process an event.
    fn consume_event(&mut self, event: TraceEvent, ctx: &Context) -> Result<()>;

    /// Called once the event stream is exhausted.
    fn finalize(&mut self, ctx: &Context) -> Result<()>;
}
