//! Per-attribute interval history.
//!
//! Each attribute owns an append-only timeline of closed-start/open-end
//! intervals. A value change never mutates a past interval: it closes the
//! open interval at the change timestamp and opens a new one.

use super::{StateInterval, StateValue};

/// The current value of an attribute is not numeric.
#[derive(Debug, PartialEq, Eq)]
pub struct ValueTypeMismatch;

/// Append-only value-over-time history of one attribute.
#[derive(Default)]
pub struct AttributeHistory {
    closed: Vec<StateInterval>,
    /// Start time and value of the open interval, if any.
    current: Option<(i64, StateValue)>,
}

impl AttributeHistory {
    /// Close the open interval at `ts` and open a new one holding `value`.
    ///
    /// A change at the exact start of the open interval replaces its value:
    /// the superseded value never covered any time, so no zero-width interval
    /// is materialized.
    pub fn modify(&mut self, ts: i64, value: StateValue) {
        if let Some((start, old)) = self.current.take() {
            if ts > start {
                self.closed.push(StateInterval {
                    start,
                    end: ts,
                    value: old,
                });
            }
        }

        self.current = Some((ts, value));
    }

    /// Add `delta` to the current numeric value at `ts`.
    ///
    /// Accumulates rather than overwrites: the new open interval holds
    /// `old + delta`. Fails if the current value is not numeric.
    pub fn increment(&mut self, ts: i64, delta: i64) -> Result<(), ValueTypeMismatch> {
        let old = match &self.current {
            None => 0,
            Some((_, StateValue::Int(v))) => *v,
            Some(_) => return Err(ValueTypeMismatch),
        };

        self.modify(ts, StateValue::Int(old + delta));
        Ok(())
    }

    /// Close the open interval at the end of the input stream.
    pub fn close(&mut self, end: i64) {
        if let Some((start, value)) = self.current.take() {
            self.closed.push(StateInterval {
                start,
                end: end.max(start),
                value,
            });
        }
    }

    /// All closed intervals, in chronological order.
    pub fn closed_intervals(&self) -> &[StateInterval] {
        &self.closed
    }

    pub fn current(&self) -> Option<(i64, &StateValue)> {
        self.current.as_ref().map(|(start, value)| (*start, value))
    }

    /// Timestamp of the first recorded change, if any.
    fn first_change(&self) -> Option<i64> {
        self.closed
            .first()
            .map(|i| i.start)
            .or(self.current.as_ref().map(|(start, _)| *start))
    }

    /// The interval covering `ts`, given the system time bounds.
    ///
    /// Times before the first change resolve to an implicit unset interval
    /// starting at `sys_start`. The open interval is reported with `sys_end`
    /// as its provisional end.
    pub fn interval_at(&self, ts: i64, sys_start: i64, sys_end: i64) -> StateInterval {
        let idx = self.closed.partition_point(|i| i.start <= ts);

        if idx > 0 {
            let interval = &self.closed[idx - 1];
            if ts < interval.end {
                return interval.clone();
            }

            // A history closed at the stream end is queryable at its final
            // timestamp.
            if self.current.is_none() && idx == self.closed.len() && ts == interval.end {
                return interval.clone();
            }
        }

        if let Some((start, value)) = &self.current {
            if ts >= *start {
                return StateInterval {
                    start: *start,
                    end: sys_end,
                    value: value.clone(),
                };
            }
        }

        StateInterval {
            start: sys_start,
            end: self.first_change().unwrap_or(sys_end),
            value: StateValue::Null,
        }
    }
}
