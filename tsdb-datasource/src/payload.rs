//! Backend payload schemas and the response mapper.
//!
//! The backend has answered with two shapes over its life: the current flat
//! record carrying the metric name alongside the series, and an older one
//! nesting the series under a single category key. The shape is resolved
//! exactly once here, at the mapping boundary, into [`BackendPayload`];
//! nothing downstream probes fields ad hoc.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::MapError;
use crate::model::{QueryTarget, TimeSeriesFrame};

/// Series body of the current flat schema.
///
/// The wire type also declares a `MetricCategory` string; nothing consumes
/// it, so deserialization ignores it along with any other unknown keys.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesBody {
    #[serde(rename = "MetricName")]
    pub metric_name: Option<String>,
    #[serde(rename = "Ts")]
    pub ts: Vec<i64>,
    #[serde(rename = "Val")]
    pub val: Vec<f64>,
}

/// One category record of the legacy nested schema. The old backend emitted
/// extra metadata next to the series (`PrimaryIdx`, `Key`); it is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacySeries {
    #[serde(rename = "Ts")]
    pub ts: Vec<i64>,
    #[serde(rename = "Val")]
    pub val: Vec<f64>,
}

/// Raw backend response, shape resolved at deserialization time.
///
/// The flat schema is tried first; a payload matching neither shape (both
/// `Ts` and `Val` absent, for instance) is a mapping error, never a panic.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BackendPayload {
    /// Current schema: `{MetricName, Ts, Val}`.
    Current(SeriesBody),
    /// Legacy schema: the series nested under a category name.
    Legacy(BTreeMap<String, LegacySeries>),
}

/// Map a decoded JSON body into the canonical frame for `target`.
///
/// Input order of the series is preserved: no sorting, no deduplication.
/// Legacy payloads produce nameless frames; the old schema carried no
/// usable metric name.
pub fn map_frame(value: Value, target: &QueryTarget) -> Result<TimeSeriesFrame, MapError> {
    let payload: BackendPayload =
        serde_json::from_value(value).map_err(|_| MapError::UnknownShape)?;

    let (name, ts, val) = match payload {
        BackendPayload::Current(body) => (body.metric_name, body.ts, body.val),
        BackendPayload::Legacy(categories) => {
            // First category in key order; the old backend only ever sent one.
            let (_, series) = categories.into_iter().next().ok_or(MapError::EmptyPayload)?;
            (None, series.ts, series.val)
        }
    };

    if ts.len() != val.len() {
        return Err(MapError::LengthMismatch {
            ts: ts.len(),
            val: val.len(),
        });
    }

    Ok(TimeSeriesFrame::new(&target.ref_id, name, ts, val))
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
