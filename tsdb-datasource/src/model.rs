//! Host-facing data model.
//!
//! These types cross the boundary between the host runtime and the core:
//! targets, time ranges and connection settings come in as JSON; frames and
//! probe results go back out. Everything here is plain data; the only
//! behaviour is the eligibility gate on [`QueryTarget`].

use serde::{Deserialize, Serialize};

use crate::error::DatasourceError;

// ------------------------------------------------------------------ //
//  Inbound (host → core)                                              //
// ------------------------------------------------------------------ //

/// One requested time-series query within a batch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryTarget {
    /// Identifier unique within a request batch; echoed back on the frame.
    pub ref_id: String,
    /// First level of the hierarchical series key.
    pub primary_idx: String,
    /// Second level of the hierarchical series key.
    pub secondary_idx: String,
    /// Path prefix inserted verbatim between `/api/` and the series key.
    pub path: String,
    /// Opaque eligibility flag; a target without one is a deliberate no-op.
    pub query_text: Option<String>,
}

impl QueryTarget {
    /// Whether this target should run at all.
    ///
    /// Gates on `query_text` only. An eligible target may still carry empty
    /// index fields; that is not rejected here and comes back as a
    /// per-target backend failure instead.
    pub fn is_eligible(&self) -> bool {
        self.query_text.as_deref().is_some_and(|q| !q.is_empty())
    }
}

/// Requested time window in epoch milliseconds; `from <= to`.
///
/// Supplied by the host per request; the ordering invariant is the host
/// time picker's to uphold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

/// Connection settings supplied by the host at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceSettings {
    /// Backend base URL, e.g. `http://localhost:8080`. Fixed for the
    /// lifetime of the datasource instance.
    #[serde(rename = "url")]
    pub base_url: String,
}

// ------------------------------------------------------------------ //
//  Outbound (core → host)                                             //
// ------------------------------------------------------------------ //

/// Role of a column inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Time,
    Number,
}

/// Column values; timestamps and samples keep their native widths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValues {
    Time(Vec<i64>),
    Number(Vec<f64>),
}

/// One column of a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub values: FieldValues,
}

/// Canonical time-series record consumed by the visualization host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesFrame {
    /// Series name, taken from the payload's `MetricName` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `ref_id` of the target this frame answers.
    pub ref_id: String,
    /// Row count; equals the length of both columns.
    pub length: usize,
    /// Fixed order: `Ts` (time) then `Val` (number).
    pub fields: Vec<Field>,
}

impl TimeSeriesFrame {
    /// Assemble a frame from equal-length timestamp and value columns.
    pub(crate) fn new(ref_id: &str, name: Option<String>, ts: Vec<i64>, val: Vec<f64>) -> Self {
        Self {
            name,
            ref_id: ref_id.to_string(),
            length: ts.len(),
            fields: vec![
                Field {
                    name: "Ts".to_string(),
                    kind: FieldKind::Time,
                    values: FieldValues::Time(ts),
                },
                Field {
                    name: "Val".to_string(),
                    kind: FieldKind::Number,
                    values: FieldValues::Number(val),
                },
            ],
        }
    }
}

/// Result of one orchestrated batch: frames for the targets that produced
/// data, failures for the ones that did not. Both follow input target order.
#[derive(Debug, Default)]
pub struct BatchResponse {
    pub frames: Vec<TimeSeriesFrame>,
    pub failures: Vec<TargetFailure>,
}

/// A per-target failure, attributable by `ref_id`, that did not abort the
/// rest of the batch.
#[derive(Debug)]
pub struct TargetFailure {
    pub ref_id: String,
    pub error: DatasourceError,
}

/// Connectivity probe outcome; constructed fresh per probe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Error,
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
