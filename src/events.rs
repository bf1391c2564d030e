//! Traced events definition.
//!
//! An event is a named, timestamped record carrying a flat field map. Field
//! and event names are resolved through the `layout` module so that the
//! analyses never hard-code wire-format strings.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::layout::{EventKind, FieldKind};

/// A single field value. Trace fields are either integers or strings.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Str(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Int(_) => None,
            FieldValue::Str(s) => Some(s.as_str()),
        }
    }
}

/// A trace event: name, timestamp in nanoseconds and field map.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct TraceEvent {
    pub ts: i64,
    #[serde(rename = "event")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl PartialOrd for TraceEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TraceEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ts.cmp(&other.ts)
    }
}

impl TraceEvent {
    /// Resolve the event name through the layout.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::of(&self.name)
    }

    pub fn field(&self, kind: FieldKind) -> Option<&FieldValue> {
        self.fields.get(kind.name())
    }

    pub fn field_i64(&self, kind: FieldKind) -> Option<i64> {
        self.field(kind).and_then(FieldValue::as_i64)
    }

    /// `None` for absent, non-integer, or out-of-range values.
    pub fn field_i32(&self, kind: FieldKind) -> Option<i32> {
        self.field_i64(kind).and_then(|v| i32::try_from(v).ok())
    }

    pub fn field_str(&self, kind: FieldKind) -> Option<&str> {
        self.field(kind).and_then(FieldValue::as_str)
    }

    fn missing(&self, kind: FieldKind) -> anyhow::Error {
        anyhow!(
            "malformed trace: event '{}' at {} is missing field '{}'",
            self.name,
            self.ts,
            kind.name()
        )
    }

    /// An integer field whose absence makes the trace malformed.
    pub fn require_i32(&self, kind: FieldKind) -> Result<i32> {
        self.field_i32(kind).ok_or_else(|| self.missing(kind))
    }

    /// A string field whose absence makes the trace malformed.
    pub fn require_str(&self, kind: FieldKind) -> Result<&str> {
        self.field_str(kind).ok_or_else(|| self.missing(kind))
    }
}
