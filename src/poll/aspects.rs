//! Segment sort/display aspects.
//!
//! Aspects expose the different orderings the poll table offers. They are a
//! closed set, so they are modeled as a plain enum with pure resolve and
//! compare functions rather than trait objects.

use std::cmp::Ordering;

use super::segment::PollSegment;

/// A value extracted from a segment by an aspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AspectValue {
    Text(String),
    Num(i32),
}

/// Sortable views over poll segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentAspect {
    /// Sort by polled device queue name ("P<port>/Q<queue>").
    ByDevice,
    /// Sort by the polling CPU.
    ByCpu,
    /// Sort by the polling thread.
    ByThread,
}

impl SegmentAspect {
    pub const ALL: [SegmentAspect; 3] = [
        SegmentAspect::ByThread,
        SegmentAspect::ByCpu,
        SegmentAspect::ByDevice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SegmentAspect::ByDevice => "Device",
            SegmentAspect::ByCpu => "CPU",
            SegmentAspect::ByThread => "Thread",
        }
    }

    /// Extract the aspect's display value from a segment.
    pub fn resolve(self, segment: &PollSegment) -> AspectValue {
        match self {
            SegmentAspect::ByDevice => AspectValue::Text(segment.device_name()),
            SegmentAspect::ByCpu => AspectValue::Num(segment.cpu_id()),
            SegmentAspect::ByThread => AspectValue::Text(segment.thread_name().to_string()),
        }
    }

    /// Compare two optional segments under this aspect. Missing segments
    /// order after any real segment.
    pub fn compare(self, a: Option<&PollSegment>, b: Option<&PollSegment>) -> Ordering {
        let (a, b) = match (a, b) {
            (None, _) => return Ordering::Greater,
            (_, None) => return Ordering::Less,
            (Some(a), Some(b)) => (a, b),
        };

        let primary = match self {
            SegmentAspect::ByDevice => a.device_name().cmp(&b.device_name()),
            SegmentAspect::ByCpu => a.cpu_id().cmp(&b.cpu_id()),
            // Thread ordering currently falls back to the cpu id, keeping
            // the behavior the poll table has always shown.
            SegmentAspect::ByThread => a.cpu_id().cmp(&b.cpu_id()),
        };

        primary
            .then_with(|| a.start().cmp(&b.start()))
            .then_with(|| a.end().cmp(&b.end()))
    }
}
