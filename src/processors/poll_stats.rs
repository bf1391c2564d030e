//! Per-queue poll statistics reporter.

use anyhow::Result;
use serde::Serialize;
use tdigest::TDigest;

use crate::{
    context::Context,
    events::TraceEvent,
    poll::{PollAnalysis, SegmentStore},
    utils::{Dispatcher, LowerBoundTracker, UpperBoundTracker},
    EventProcessor,
};

use super::write_report;

const DIGEST_SIZE: usize = 100;

#[derive(Default)]
struct QueueAccumulator {
    polls: u64,
    pkts_total: i64,
    pkts_min: LowerBoundTracker<i32>,
    pkts_max: UpperBoundTracker<i32>,
    samples: Vec<f64>,
}

impl QueueAccumulator {
    fn update(&mut self, nb_pkts: i32) {
        self.polls += 1;
        self.pkts_total += nb_pkts as i64;
        self.pkts_min.update(nb_pkts);
        self.pkts_max.update(nb_pkts);
        self.samples.push(nb_pkts as f64);
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QueueStats {
    pub device: String,
    pub polls: u64,
    pub pkts_total: i64,
    pub pkts_min: i32,
    pub pkts_max: i32,
    pub pkts_p50: f64,
    pub pkts_p90: f64,
    pub pkts_p99: f64,
}

#[derive(Debug, Serialize)]
pub struct PollStatsReport {
    pub first_poll: Option<i64>,
    pub last_poll: Option<i64>,
    pub total_polls: u64,
    pub queues: Vec<QueueStats>,
}

impl PollStatsReport {
    pub fn from_store(store: &SegmentStore) -> Self {
        let mut per_queue: Dispatcher<String, QueueAccumulator> = Dispatcher::new();
        let mut first = LowerBoundTracker::default();
        let mut last = UpperBoundTracker::default();

        for segment in store.iter() {
            first.update(segment.start());
            last.update(segment.end());

            per_queue
                .get_or_default(&segment.device_name())
                .update(segment.nb_pkts());
        }

        let mut queues: Vec<QueueStats> = per_queue
            .items()
            .map(|(device, acc)| {
                let digest =
                    TDigest::new_with_size(DIGEST_SIZE).merge_unsorted(acc.samples.clone());

                QueueStats {
                    device: device.clone(),
                    polls: acc.polls,
                    pkts_total: acc.pkts_total,
                    pkts_min: acc.pkts_min.get().unwrap_or_default(),
                    pkts_max: acc.pkts_max.get().unwrap_or_default(),
                    pkts_p50: digest.estimate_quantile(0.50),
                    pkts_p90: digest.estimate_quantile(0.90),
                    pkts_p99: digest.estimate_quantile(0.99),
                }
            })
            .collect();

        queues.sort_by(|a, b| a.device.cmp(&b.device));

        Self {
            first_poll: first.get(),
            last_poll: last.get(),
            total_polls: store.len() as u64,
            queues,
        }
    }
}

/// Builds poll segments from the event stream and reports per-queue
/// statistics once the trace is exhausted.
pub struct PollStatsReporter {
    analysis: PollAnalysis,
}

impl PollStatsReporter {
    pub fn new() -> Self {
        Self {
            analysis: PollAnalysis::new(),
        }
    }
}

impl Default for PollStatsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Context> for PollStatsReporter {
    fn from(_ctx: &Context) -> Self {
        Self::new()
    }
}

impl EventProcessor for PollStatsReporter {
    fn pre_load_init(&mut self, ctx: &Context) -> Result<()> {
        self.analysis.pre_load_init(ctx)
    }

    fn consume_event(&mut self, event: TraceEvent, ctx: &Context) -> Result<()> {
        self.analysis.consume_event(event, ctx)
    }

    fn finalize(&mut self, ctx: &Context) -> Result<()> {
        self.analysis.finalize(ctx)?;

        let report = PollStatsReport::from_store(self.analysis.store());

        if ctx.verbose {
            log::info!(
                "{} polls across {} queues",
                report.total_polls,
                report.queues.len()
            );
        }

        write_report(ctx, &report)
    }
}
