//! Append-only poll segment store.
//!
//! Events arrive sorted by timestamp, so the store is an ordered vector:
//! appends are O(1) and range queries are binary searches. The store is
//! written once by the analysis and read-only afterwards.

use std::io::{Read, Write};

use anyhow::Result;

use super::aspects::SegmentAspect;
use super::segment::PollSegment;

pub struct SegmentStore {
    segments: Vec<PollSegment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append a segment. Input order follows event timestamps.
    pub fn add(&mut self, segment: PollSegment) {
        debug_assert!(self
            .segments
            .last()
            .map_or(true, |last| last.start() <= segment.start()));

        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PollSegment> {
        self.segments.iter()
    }

    /// Segments intersecting `[start, end]`. Since polls are zero-width this
    /// selects segments whose start time lies in the window.
    pub fn range(&self, start: i64, end: i64) -> &[PollSegment] {
        if end < start {
            return &[];
        }

        let lo = self.segments.partition_point(|s| s.start() < start);
        let hi = self.segments.partition_point(|s| s.start() <= end);

        &self.segments[lo..hi]
    }

    /// Segments reordered under the given aspect.
    pub fn sorted_by(&self, aspect: SegmentAspect) -> Vec<&PollSegment> {
        let mut out: Vec<&PollSegment> = self.segments.iter().collect();
        out.sort_by(|a, b| aspect.compare(Some(a), Some(b)));
        out
    }

    /// Serialize the whole store, one segment after another, in the stable
    /// per-segment field order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&(self.segments.len() as u64).to_be_bytes())?;
        for segment in &self.segments {
            segment.write_to(writer)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut len_buf = [0u8; 8];
        reader.read_exact(&mut len_buf)?;
        let count = u64::from_be_bytes(len_buf);

        let mut segments = Vec::with_capacity(count as usize);
        for _ in 0..count {
            segments.push(PollSegment::read_from(reader)?);
        }

        Ok(Self { segments })
    }
}

impl Default for SegmentStore {
    fn default() -> Self {
        Self::new()
    }
}
