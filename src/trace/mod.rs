//! Recorded trace access.

pub mod reader;

pub use reader::TraceReader;
