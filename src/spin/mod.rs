//! Queue spin/active analysis.
//!
//! Tracks, per polling thread and per NIC queue, whether the thread is
//! spinning (polling an empty queue) or actively processing received data.
//! The state is kept in a hierarchical state system under
//! `Threads/<thread>/<cpu>` -> `P<port>/Q<queue>`, with a dedicated packet
//! counter attribute beneath each queue. A range query with interval
//! interpolation turns the recorded history into utilization reports.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::Serialize;

use crate::{
    context::Context,
    events::TraceEvent,
    layout::{EventKind, FieldKind},
    statesys::{Quark, QueueStatus, StateError, StateInterval, StateSystem, StateValue},
    EventProcessor,
};

/* Attribute names */
pub const POLL_THREADS: &str = "Threads";
pub const PKT_COUNT: &str = "pkts";

/// State-system construction from the event stream.
pub struct SpinAnalysis {
    ss: StateSystem,
}

impl SpinAnalysis {
    pub fn new() -> Self {
        Self {
            ss: StateSystem::new(),
        }
    }

    pub fn state_system(&self) -> &StateSystem {
        &self.ss
    }

    pub fn into_state_system(self) -> StateSystem {
        self.ss
    }

    fn handle_burst(&mut self, event: &TraceEvent, status: QueueStatus) -> Result<()> {
        let port_id = event.require_i32(FieldKind::PortId)?;
        let queue_id = event.require_i32(FieldKind::QueueId)?;
        let thread_name = event.require_str(FieldKind::ThreadName)?.to_string();
        let cpu_id = event.require_i32(FieldKind::CpuId)?;

        let thread_quark = self
            .ss
            .quark_absolute_and_add(&[POLL_THREADS, &format!("{}/{}", thread_name, cpu_id)]);
        let queue_quark = self
            .ss
            .quark_relative_and_add(thread_quark, &format!("P{}/Q{}", port_id, queue_id));

        self.ss
            .modify_attribute(event.ts, StateValue::Status(status), queue_quark)?;

        self.update_counts(event, queue_quark)?;

        Ok(())
    }

    /// Update the packet counter of the queue whenever the event carries a
    /// positive packet count, regardless of the spin/active classification.
    fn update_counts(&mut self, event: &TraceEvent, queue_quark: Quark) -> Result<()> {
        let nb_pkts = event
            .field_i64(FieldKind::NbRxPkts)
            .or_else(|| event.field_i64(FieldKind::NbTxPkts));

        let nb_pkts = match nb_pkts {
            Some(n) if n > 0 => n,
            _ => return Ok(()),
        };

        let counter = self.ss.quark_relative_and_add(queue_quark, PKT_COUNT);

        match self.ss.increment_attribute(event.ts, nb_pkts, counter) {
            Err(StateError::ValueType(quark)) => {
                // recoverable: keep the status history intact and move on
                log::warn!(
                    "problem accessing the packet counter of a NIC queue (quark {})",
                    quark
                );
                Ok(())
            }
            other => Ok(other?),
        }
    }
}

impl Default for SpinAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl EventProcessor for SpinAnalysis {
    fn pre_load_init(&mut self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    fn consume_event(&mut self, event: TraceEvent, _ctx: &Context) -> Result<()> {
        match event.kind() {
            Some(EventKind::RxBurstEmpty) => self.handle_burst(&event, QueueStatus::Spin),
            Some(EventKind::RxBurstNonEmpty) => self.handle_burst(&event, QueueStatus::Active),
            _ => Ok(()),
        }
    }

    fn finalize(&mut self, _ctx: &Context) -> Result<()> {
        self.ss.finish();
        Ok(())
    }
}

/// Per-thread active/spin totals over a query window, in nanoseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThreadUsage {
    pub active: i64,
    pub spin: i64,
}

/// Time spent active vs spinning per selected thread in `[start, end]`.
///
/// The window is clipped to the state system bounds; an inverted clipped
/// window yields an empty map. Any state system failure aborts the whole
/// query and returns an empty map: utilization reporting tolerates "no data"
/// but not misleading partial data.
pub fn usage_in_range(
    ss: &StateSystem,
    threads: &HashSet<Quark>,
    start: i64,
    end: i64,
) -> HashMap<String, ThreadUsage> {
    let Some(ss_start) = ss.start_time() else {
        return HashMap::new();
    };

    let start_time = start.max(ss_start);
    let end_time = end.min(ss.current_end_time());
    if end_time < start_time {
        return HashMap::new();
    }

    collect_usage(ss, threads, start_time, end_time).unwrap_or_default()
}

fn collect_usage(
    ss: &StateSystem,
    threads: &HashSet<Quark>,
    start_time: i64,
    end_time: i64,
) -> Result<HashMap<String, ThreadUsage>, StateError> {
    let mut map = HashMap::new();

    let threads_node = ss.quark_absolute(&[POLL_THREADS])?;

    for &thread_node in ss.sub_attributes(threads_node)? {
        if !threads.contains(&thread_node) {
            continue;
        }

        let thread_name = ss.attribute_name(thread_node)?.to_string();
        let mut usage = ThreadUsage::default();

        for &queue_node in ss.sub_attributes(thread_node)? {
            let mut ts = start_time;

            loop {
                let interval = ss.query_single_state(ts, queue_node)?;

                match interval.value {
                    StateValue::Status(QueueStatus::Active) => {
                        usage.active += interpolate_count(start_time, end_time, &interval);
                    }
                    StateValue::Status(QueueStatus::Spin) => {
                        usage.spin += interpolate_count(start_time, end_time, &interval);
                    }
                    _ => {}
                }

                // open end: the next interval starts exactly at interval.end
                if interval.end >= end_time {
                    break;
                }
                ts = interval.end;
            }
        }

        map.insert(thread_name, usage);
    }

    Ok(map)
}

/// Exact overlap length between an interval and the query window.
fn interpolate_count(start_time: i64, end_time: i64, interval: &StateInterval) -> i64 {
    let mut count = interval.end - interval.start;

    /* sanity check */
    if count > 0 {
        if start_time > interval.start {
            count -= start_time - interval.start;
        }

        if end_time < interval.end {
            count -= interval.end - end_time;
        }

        if count < 0 {
            return 0;
        }
    }

    count.max(0)
}
