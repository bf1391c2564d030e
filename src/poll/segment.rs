//! Poll segment definition.
//!
//! A poll is one invocation of `rte_eth_rx_burst()` that returned at least
//! one packet. Segments are zero-width intervals: the start time locates the
//! poll, the length encodes the packet count rather than a duration.

use std::io::{Read, Write};

use anyhow::{bail, Result};
use serde::Serialize;

/// An Ethernet poll of a NIC queue. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSegment {
    thread_name: String,
    cpu_id: i32,
    start_time: i64,
    port_id: i32,
    queue_id: i32,
    nb_pkts: i32,
}

impl PollSegment {
    /// Build a segment. Callers filter out empty polls beforehand; a
    /// non-positive packet count here is a logic error.
    pub fn new(
        thread_name: String,
        cpu_id: i32,
        start_time: i64,
        port_id: i32,
        queue_id: i32,
        nb_pkts: i32,
    ) -> Self {
        debug_assert!(nb_pkts > 0);

        Self {
            thread_name,
            cpu_id,
            start_time,
            port_id,
            queue_id,
            nb_pkts,
        }
    }

    pub fn start(&self) -> i64 {
        self.start_time
    }

    /// Zero-width by design: the length carries the packet count instead.
    pub fn end(&self) -> i64 {
        self.start_time
    }

    pub fn length(&self) -> i64 {
        self.nb_pkts as i64
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn cpu_id(&self) -> i32 {
        self.cpu_id
    }

    pub fn port_id(&self) -> i32 {
        self.port_id
    }

    pub fn queue_id(&self) -> i32 {
        self.queue_id
    }

    pub fn nb_pkts(&self) -> i32 {
        self.nb_pkts
    }

    /// Name of the polled device queue.
    pub fn device_name(&self) -> String {
        format!("P{}/Q{}", self.port_id, self.queue_id)
    }

    /// Serialize with the stable on-disk field order: thread name, cpu id,
    /// start time, port id, queue id, packet count.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let name = self.thread_name.as_bytes();
        writer.write_all(&(name.len() as u32).to_be_bytes())?;
        writer.write_all(name)?;
        writer.write_all(&self.cpu_id.to_be_bytes())?;
        writer.write_all(&self.start_time.to_be_bytes())?;
        writer.write_all(&self.port_id.to_be_bytes())?;
        writer.write_all(&self.queue_id.to_be_bytes())?;
        writer.write_all(&self.nb_pkts.to_be_bytes())?;
        Ok(())
    }

    /// Deserialize a segment written by `write_to`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;

        let mut name_buf = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        reader.read_exact(&mut name_buf)?;
        let thread_name = String::from_utf8(name_buf)?;

        let mut i32_buf = [0u8; 4];
        let mut i64_buf = [0u8; 8];

        reader.read_exact(&mut i32_buf)?;
        let cpu_id = i32::from_be_bytes(i32_buf);
        reader.read_exact(&mut i64_buf)?;
        let start_time = i64::from_be_bytes(i64_buf);
        reader.read_exact(&mut i32_buf)?;
        let port_id = i32::from_be_bytes(i32_buf);
        reader.read_exact(&mut i32_buf)?;
        let queue_id = i32::from_be_bytes(i32_buf);
        reader.read_exact(&mut i32_buf)?;
        let nb_pkts = i32::from_be_bytes(i32_buf);

        if nb_pkts <= 0 {
            bail!("corrupted poll segment: packet count {}", nb_pkts);
        }

        Ok(Self {
            thread_name,
            cpu_id,
            start_time,
            port_id,
            queue_id,
            nb_pkts,
        })
    }
}

impl std::fmt::Display for PollSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Start Time = {}; Number of packets = {}; Device = {}",
            self.start(),
            self.length(),
            self.device_name()
        )
    }
}
