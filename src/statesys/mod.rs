//! Time-indexed hierarchical attribute store.
//!
//! The state system records a value-over-time history per attribute.
//! Attributes form a tree addressed by string paths and resolved to stable
//! integer handles (quarks); each attribute owns an append-only sequence of
//! contiguous intervals. Construction is single-threaded and consumes events
//! in timestamp order; once construction completes the system is read-only
//! and can be queried freely.

use thiserror::Error;

pub mod attribute;
pub mod history;

pub use attribute::{AttributeTree, Quark};
use history::AttributeHistory;

/// Queue polling status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Polling an empty queue, waiting for data.
    Spin,
    /// Processing received data.
    Active,
}

/// A value recorded in an attribute history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// No value recorded yet.
    Null,
    Int(i64),
    Status(QueueStatus),
}

/// One entry of an attribute timeline: `[start, end)` holding `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInterval {
    pub start: i64,
    pub end: i64,
    pub value: StateValue,
}

impl StateInterval {
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

/// State system failure modes.
///
/// All of these are recoverable at the query boundary: callers return empty
/// results instead of partial ones.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state system was disposed")]
    Disposed,
    #[error("attribute not found (quark {0})")]
    AttributeNotFound(Quark),
    #[error("timestamp {ts} outside of state system range [{start}, {end}]")]
    TimeRange { ts: i64, start: i64, end: i64 },
    #[error("attribute value is not numeric (quark {0})")]
    ValueType(Quark),
}

/// Hierarchical attribute state machine built from an ordered event stream.
pub struct StateSystem {
    tree: AttributeTree,
    histories: Vec<AttributeHistory>,
    start: Option<i64>,
    end: i64,
    finished: bool,
    disposed: bool,
}

impl StateSystem {
    pub fn new() -> Self {
        Self {
            tree: AttributeTree::new(),
            histories: Vec::new(),
            start: None,
            end: 0,
            finished: false,
            disposed: false,
        }
    }

    fn sync_histories(&mut self) {
        if self.histories.len() < self.tree.len() {
            self.histories
                .resize_with(self.tree.len(), AttributeHistory::default);
        }
    }

    fn touch(&mut self, ts: i64) {
        if self.start.is_none() {
            self.start = Some(ts);
            self.end = ts;
        }
        self.end = self.end.max(ts);
    }

    fn history(&self, quark: Quark) -> Result<&AttributeHistory, StateError> {
        self.histories
            .get(quark.index())
            .ok_or(StateError::AttributeNotFound(quark))
    }

    fn history_mut(&mut self, quark: Quark) -> Result<&mut AttributeHistory, StateError> {
        self.histories
            .get_mut(quark.index())
            .ok_or(StateError::AttributeNotFound(quark))
    }

    fn check_queryable(&self) -> Result<(), StateError> {
        if self.disposed {
            return Err(StateError::Disposed);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attribute resolution
    // ------------------------------------------------------------------

    pub fn quark_absolute_and_add(&mut self, path: &[&str]) -> Quark {
        let q = self.tree.quark_absolute_and_add(path);
        self.sync_histories();
        q
    }

    pub fn quark_relative_and_add(&mut self, parent: Quark, label: &str) -> Quark {
        let q = self.tree.quark_relative_and_add(parent, label);
        self.sync_histories();
        q
    }

    pub fn quark_absolute(&self, path: &[&str]) -> Result<Quark, StateError> {
        self.tree.quark_absolute(path)
    }

    pub fn sub_attributes(&self, quark: Quark) -> Result<&[Quark], StateError> {
        self.tree.sub_attributes(quark)
    }

    pub fn attribute_name(&self, quark: Quark) -> Result<&str, StateError> {
        self.tree.attribute_name(quark)
    }

    pub fn full_attribute_path(&self, quark: Quark) -> Result<String, StateError> {
        self.tree.full_path(quark)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Record a state change: close the attribute's open interval at `ts`
    /// and open a new one holding `value`.
    pub fn modify_attribute(
        &mut self,
        ts: i64,
        value: StateValue,
        quark: Quark,
    ) -> Result<(), StateError> {
        self.touch(ts);
        self.history_mut(quark)?.modify(ts, value);
        Ok(())
    }

    /// Add `delta` to the attribute's numeric value at `ts`, accumulating
    /// rather than overwriting.
    pub fn increment_attribute(
        &mut self,
        ts: i64,
        delta: i64,
        quark: Quark,
    ) -> Result<(), StateError> {
        self.touch(ts);
        self.history_mut(quark)?
            .increment(ts, delta)
            .map_err(|_| StateError::ValueType(quark))
    }

    /// Close every open interval at the stream's last timestamp. Called once
    /// the input stream ends.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let end = self.end;
        for h in &mut self.histories {
            h.close(end);
        }
    }

    /// Drop the system. Subsequent queries fail with `StateError::Disposed`.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Timestamp of the first recorded change, if any event was consumed.
    pub fn start_time(&self) -> Option<i64> {
        self.start
    }

    /// Timestamp of the last recorded change.
    pub fn current_end_time(&self) -> i64 {
        self.end
    }

    /// The interval covering `ts` for the given attribute.
    pub fn query_single_state(&self, ts: i64, quark: Quark) -> Result<StateInterval, StateError> {
        self.check_queryable()?;

        let start = self.start.ok_or(StateError::TimeRange {
            ts,
            start: 0,
            end: 0,
        })?;
        let end = self.end;

        if ts < start || ts > end {
            return Err(StateError::TimeRange { ts, start, end });
        }

        Ok(self.history(quark)?.interval_at(ts, start, end))
    }

    /// All intervals of the attribute intersecting `[t1, t2]`, in
    /// chronological order.
    pub fn query_history_range(
        &self,
        quark: Quark,
        t1: i64,
        t2: i64,
    ) -> Result<Vec<StateInterval>, StateError> {
        self.check_queryable()?;

        let mut out = Vec::new();

        let start = match self.start {
            Some(s) => s.max(t1),
            None => return Ok(out),
        };
        let end = self.end.min(t2);
        if end < start {
            return Ok(out);
        }

        let mut ts = start;
        loop {
            let interval = self.query_single_state(ts, quark)?;
            let interval_end = interval.end;
            out.push(interval);

            // open end: the next interval starts exactly at interval_end
            if interval_end >= end {
                break;
            }
            ts = interval_end;
        }

        Ok(out)
    }

    /// Closed intervals recorded so far for an attribute. Mostly useful to
    /// inspect a finished system.
    pub fn closed_intervals(&self, quark: Quark) -> Result<&[StateInterval], StateError> {
        Ok(self.history(quark)?.closed_intervals())
    }

    /// The value held by the attribute's open (or last) interval.
    pub fn current_value(&self, quark: Quark) -> Result<StateValue, StateError> {
        let h = self.history(quark)?;

        if let Some((_, value)) = h.current() {
            return Ok(value.clone());
        }

        Ok(h.closed_intervals()
            .last()
            .map(|i| i.value.clone())
            .unwrap_or(StateValue::Null))
    }
}

impl Default for StateSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{QueueStatus, StateError, StateSystem, StateValue};

    #[test]
    fn test_build_and_query() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "poll0/3", "P0/Q0"]);

        ss.modify_attribute(100, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.modify_attribute(150, StateValue::Status(QueueStatus::Active), q)
            .unwrap();
        ss.finish();

        assert_eq!(ss.start_time(), Some(100));
        assert_eq!(ss.current_end_time(), 150);

        let i = ss.query_single_state(120, q).unwrap();
        assert_eq!((i.start, i.end), (100, 150));
        assert_eq!(i.value, StateValue::Status(QueueStatus::Spin));

        // query at the exact end time resolves to the final interval
        let i = ss.query_single_state(150, q).unwrap();
        assert_eq!(i.value, StateValue::Status(QueueStatus::Active));

        assert_eq!(
            ss.query_single_state(99, q),
            Err(StateError::TimeRange {
                ts: 99,
                start: 100,
                end: 150
            })
        );
    }

    #[test]
    fn test_counter_is_monotonic() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "poll0/3", "P0/Q0", "pkts"]);

        for (ts, n) in [(10, 32), (20, 16), (30, 64)] {
            ss.increment_attribute(ts, n, q).unwrap();
        }

        assert_eq!(ss.current_value(q).unwrap(), StateValue::Int(112));
    }

    #[test]
    fn test_increment_on_status_attribute_fails() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "t/0", "P0/Q0"]);
        ss.modify_attribute(10, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();

        assert_eq!(
            ss.increment_attribute(20, 8, q),
            Err(StateError::ValueType(q))
        );
    }

    #[test]
    fn test_disposed_system_rejects_queries() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "t/0", "P0/Q0"]);
        ss.modify_attribute(10, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.finish();
        ss.dispose();

        assert_eq!(ss.query_single_state(10, q), Err(StateError::Disposed));
    }

    #[test]
    fn test_query_history_range() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "t/0", "P0/Q0"]);
        ss.modify_attribute(100, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.modify_attribute(150, StateValue::Status(QueueStatus::Active), q)
            .unwrap();
        ss.modify_attribute(300, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.finish();

        let intervals = ss.query_history_range(q, 120, 200).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!((intervals[0].start, intervals[0].end), (100, 150));
        assert_eq!((intervals[1].start, intervals[1].end), (150, 300));

        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_history_range_includes_one_ns_interval() {
        let mut ss = StateSystem::new();

        let q = ss.quark_absolute_and_add(&["Threads", "t/0", "P0/Q0"]);
        ss.modify_attribute(100, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.modify_attribute(200, StateValue::Status(QueueStatus::Active), q)
            .unwrap();
        ss.modify_attribute(201, StateValue::Status(QueueStatus::Spin), q)
            .unwrap();
        ss.modify_attribute(400, StateValue::Status(QueueStatus::Active), q)
            .unwrap();
        ss.finish();

        let intervals = ss.query_history_range(q, 100, 400).unwrap();

        assert_eq!(intervals.len(), 3);
        assert_eq!((intervals[1].start, intervals[1].end), (200, 201));
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
