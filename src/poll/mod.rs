//! Poll latency analysis.
//!
//! Builds a segment store of discrete polls from `rx.burst` events carrying a
//! nonzero packet count. Empty polls carry no information for latency or
//! density statistics and are filtered out, not errored.

use anyhow::Result;

use crate::{
    context::Context,
    events::TraceEvent,
    layout::{EventKind, FieldKind},
    EventProcessor,
};

pub mod aspects;
pub mod segment;
pub mod store;

pub use aspects::{AspectValue, SegmentAspect};
pub use segment::PollSegment;
pub use store::SegmentStore;

/// Segment-store construction from the event stream.
pub struct PollAnalysis {
    store: SegmentStore,
}

impl PollAnalysis {
    pub fn new() -> Self {
        Self {
            store: SegmentStore::new(),
        }
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn into_store(self) -> SegmentStore {
        self.store
    }

    fn handle_rx_burst(&mut self, event: &TraceEvent) -> Result<()> {
        let nb_pkts = event.require_i32(FieldKind::NbRxPkts)?;
        if nb_pkts <= 0 {
            return Ok(());
        }

        let thread_name = event.require_str(FieldKind::ThreadName)?.to_string();
        let cpu_id = event.require_i32(FieldKind::CpuId)?;
        let port_id = event.require_i32(FieldKind::PortId)?;
        let queue_id = event.require_i32(FieldKind::QueueId)?;

        self.store.add(PollSegment::new(
            thread_name,
            cpu_id,
            event.ts,
            port_id,
            queue_id,
            nb_pkts,
        ));

        Ok(())
    }
}

impl Default for PollAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl EventProcessor for PollAnalysis {
    fn pre_load_init(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    fn consume_event(&mut self, event: TraceEvent, _ctx: &Context) -> Result<()> {
        if event.kind() == Some(EventKind::RxBurst) {
            self.handle_rx_burst(&event)?;
        }

        Ok(())
    }

    fn finalize(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
}
