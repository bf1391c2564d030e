//! Per-thread spin/active utilization reporter.

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;

use crate::{
    context::Context,
    events::TraceEvent,
    spin::{usage_in_range, SpinAnalysis, POLL_THREADS},
    statesys::{Quark, StateSystem},
    EventProcessor,
};

use super::write_report;

#[derive(Debug, Serialize, PartialEq)]
pub struct ThreadUsageRow {
    pub thread: String,
    pub active_ns: i64,
    pub spin_ns: i64,
    pub busy_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct SpinUsageReport {
    pub begin: i64,
    pub end: i64,
    pub threads: Vec<ThreadUsageRow>,
}

impl SpinUsageReport {
    pub fn from_state_system(ss: &StateSystem, ctx: &Context) -> Self {
        let begin = ctx.begin.or_else(|| ss.start_time()).unwrap_or_default();
        let end = ctx.end.unwrap_or_else(|| ss.current_end_time());

        let selected = select_threads(ss, &ctx.threads);
        let usage = usage_in_range(ss, &selected, begin, end);

        let mut threads: Vec<ThreadUsageRow> = usage
            .into_iter()
            .map(|(thread, u)| {
                let total = u.active + u.spin;
                let busy_pct = if total > 0 {
                    100.0 * u.active as f64 / total as f64
                } else {
                    0.0
                };

                ThreadUsageRow {
                    thread,
                    active_ns: u.active,
                    spin_ns: u.spin,
                    busy_pct,
                }
            })
            .collect();

        threads.sort_by(|a, b| a.thread.cmp(&b.thread));

        Self {
            begin,
            end,
            threads,
        }
    }
}

/// Thread nodes under the poll thread root, restricted to `names` when the
/// selection is non-empty.
fn select_threads(ss: &StateSystem, names: &[String]) -> HashSet<Quark> {
    let Ok(root) = ss.quark_absolute(&[POLL_THREADS]) else {
        return HashSet::new();
    };
    let Ok(nodes) = ss.sub_attributes(root) else {
        return HashSet::new();
    };

    nodes
        .iter()
        .copied()
        .filter(|&q| {
            names.is_empty()
                || ss
                    .attribute_name(q)
                    .map(|n| names.iter().any(|sel| n == sel || n.starts_with(&format!("{}/", sel))))
                    .unwrap_or(false)
        })
        .collect()
}

/// Tracks queue spin/active state from the event stream and reports
/// per-thread utilization once the trace is exhausted.
pub struct SpinUsageReporter {
    analysis: SpinAnalysis,
}

impl SpinUsageReporter {
    pub fn new() -> Self {
        Self {
            analysis: SpinAnalysis::new(),
        }
    }
}

impl Default for SpinUsageReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Context> for SpinUsageReporter {
    fn from(_ctx: &Context) -> Self {
        Self::new()
    }
}

impl EventProcessor for SpinUsageReporter {
    fn pre_load_init(&mut self, ctx: &Context) -> Result<()> {
        self.analysis.pre_load_init(ctx)
    }

    fn consume_event(&mut self, event: TraceEvent, ctx: &Context) -> Result<()> {
        self.analysis.consume_event(event, ctx)
    }

    fn finalize(&mut self, ctx: &Context) -> Result<()> {
        self.analysis.finalize(ctx)?;

        let report = SpinUsageReport::from_state_system(self.analysis.state_system(), ctx);

        if ctx.verbose {
            log::info!("utilization computed for {} threads", report.threads.len());
        }

        write_report(ctx, &report)
    }
}

#[cfg(test)]
mod tests {
    use crate::{context::Context, events::TraceEvent, EventProcessor};

    use super::{SpinUsageReport, SpinUsageReporter};

    fn burst(ts: i64, kind: &str, thread: &str, cpu: i32, extra: &str) -> TraceEvent {
        serde_json::from_str(&format!(
            r#"{{"ts": {ts}, "event": "lib.ethdev.rx.burst.{kind}",
                "fields": {{"port_id": 0, "queue_id": 0,
                            "context.name": "{thread}", "context.cpu_id": {cpu}{extra}}}}}"#
        ))
        .unwrap()
    }

    fn reporter(events: Vec<TraceEvent>) -> SpinUsageReporter {
        let ctx = Context::default();
        let mut reporter = SpinUsageReporter::new();

        for event in events {
            reporter.consume_event(event, &ctx).unwrap();
        }
        reporter.analysis.finalize(&ctx).unwrap();

        reporter
    }

    #[test]
    fn test_report_rows_and_busy_pct() {
        let reporter = reporter(vec![
            burst(100, "empty", "poll0", 0, ""),
            burst(200, "nonempty", "poll0", 0, r#", "nb_rx": 3"#),
            burst(300, "empty", "poll0", 0, ""),
        ]);

        let report =
            SpinUsageReport::from_state_system(reporter.analysis.state_system(), &Context::default());

        assert_eq!(report.begin, 100);
        assert_eq!(report.end, 300);

        assert_eq!(report.threads.len(), 1);
        let row = &report.threads[0];
        assert_eq!(row.thread, "poll0/0");
        assert_eq!(row.spin_ns, 100);
        assert_eq!(row.active_ns, 100);
        assert!((row.busy_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_thread_selection_by_name() {
        let reporter = reporter(vec![
            burst(100, "empty", "poll0", 0, ""),
            burst(100, "empty", "poll1", 1, ""),
            burst(300, "nonempty", "poll0", 0, r#", "nb_rx": 1"#),
            burst(300, "nonempty", "poll1", 1, r#", "nb_rx": 1"#),
        ]);

        let ctx = Context {
            threads: vec!["poll1".to_string()],
            ..Default::default()
        };

        let report = SpinUsageReport::from_state_system(reporter.analysis.state_system(), &ctx);

        assert_eq!(report.threads.len(), 1);
        assert_eq!(report.threads[0].thread, "poll1/1");
    }

    #[test]
    fn test_explicit_window_overrides_trace_bounds() {
        let reporter = reporter(vec![
            burst(100, "nonempty", "poll0", 0, r#", "nb_rx": 1"#),
            burst(500, "empty", "poll0", 0, ""),
        ]);

        let ctx = Context {
            begin: Some(200),
            end: Some(400),
            ..Default::default()
        };

        let report = SpinUsageReport::from_state_system(reporter.analysis.state_system(), &ctx);

        assert_eq!(report.begin, 200);
        assert_eq!(report.end, 400);
        assert_eq!(report.threads[0].active_ns, 200);
    }

    #[test]
    fn test_empty_trace_yields_empty_report() {
        let reporter = reporter(vec![]);

        let report =
            SpinUsageReport::from_state_system(reporter.analysis.state_system(), &Context::default());

        assert!(report.threads.is_empty());
    }
}
