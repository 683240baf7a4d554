//! Datasource facade: batch query orchestration and the connectivity probe.
//!
//! | Operation      | Backend call                                            |
//! |----------------|---------------------------------------------------------|
//! | `query`        | `GET /api/[{path}]{primary}/{secondary}?from=..&to=..`  |
//! | `health_check` | `GET /ping`                                             |

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};

use crate::endpoint::build_endpoint;
use crate::error::DatasourceError;
use crate::model::{
    BatchResponse, DatasourceSettings, ProbeResult, ProbeStatus, QueryTarget, TargetFailure,
    TimeRange, TimeSeriesFrame,
};
use crate::payload::map_frame;
use crate::transport::{HttpTransport, Transport};

/// Probe message used when the backend gave us nothing more specific.
const FALLBACK_MESSAGE: &str = "Cannot connect to API";

/// A datasource instance bound to one backend.
pub struct Datasource {
    transport: Arc<dyn Transport>,
}

impl Datasource {
    /// Build a datasource talking to the backend named in `settings`.
    pub fn new(settings: &DatasourceSettings) -> Self {
        Self {
            transport: Arc::new(HttpTransport::new(settings)),
        }
    }

    /// Build a datasource over any transport (tests, alternative clients).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run a batch of targets against one time window.
    ///
    /// Ineligible targets are dropped silently (a deliberate no-op query,
    /// not a failure). Eligible targets run concurrently, one independent
    /// pipeline each (build endpoint → fetch → map); a failing target lands
    /// in [`BatchResponse::failures`] under its `ref_id` and never aborts
    /// its siblings. Output follows input target order, not completion
    /// order.
    pub async fn query(&self, targets: &[QueryTarget], range: TimeRange) -> BatchResponse {
        let pipelines = targets
            .iter()
            .filter(|t| t.is_eligible())
            .map(|target| self.run_target(target, range));

        let mut response = BatchResponse::default();
        for (ref_id, outcome) in join_all(pipelines).await {
            match outcome {
                Ok(frame) => response.frames.push(frame),
                Err(e) => {
                    error!(ref_id = %ref_id, error = %e, "target query failed");
                    response.failures.push(TargetFailure { ref_id, error: e });
                }
            }
        }
        response
    }

    /// One target's pipeline. Returns the `ref_id` alongside the outcome so
    /// the caller associates results by target, not by completion order.
    async fn run_target(
        &self,
        target: &QueryTarget,
        range: TimeRange,
    ) -> (String, Result<TimeSeriesFrame, DatasourceError>) {
        let endpoint = build_endpoint(target, range);
        debug!(ref_id = %target.ref_id, path = %endpoint.path, "dispatching target");

        let outcome = match self.transport.fetch(&endpoint.path, &endpoint.query).await {
            Ok(value) => map_frame(value, target).map_err(DatasourceError::from),
            Err(e) => Err(e),
        };
        (target.ref_id.clone(), outcome)
    }

    /// Probe backend connectivity.
    ///
    /// Never propagates an error: every failure path collapses into a
    /// [`ProbeResult`] with a best-effort human-readable message.
    pub async fn health_check(&self) -> ProbeResult {
        match self.transport.ping("/ping").await {
            Ok(resp) if resp.status == 200 => ProbeResult {
                status: ProbeStatus::Success,
                message: "Success".to_string(),
            },
            Ok(resp) => ProbeResult {
                status: ProbeStatus::Error,
                message: if resp.status_text.is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    resp.status_text
                },
            },
            Err(e) => ProbeResult {
                status: ProbeStatus::Error,
                message: probe_failure_message(&e),
            },
        }
    }
}

/// Message for a probe request that raised an error.
fn probe_failure_message(err: &DatasourceError) -> String {
    match err {
        DatasourceError::Transport {
            status_text, body, ..
        } => {
            let mut message = format!(
                "Fetch error: {}",
                if status_text.is_empty() {
                    FALLBACK_MESSAGE
                } else {
                    status_text
                }
            );
            if let Some(body) = body {
                message.push_str(&format!(": {}. {}", body.code, body.message));
            }
            message
        }
        DatasourceError::Network(_) => format!("Fetch error: {FALLBACK_MESSAGE}"),
        other => other.to_string(),
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorBody, MapError};
    use crate::model::FieldValues;
    use crate::transport::{FakeTransport, RawResponse};

    fn target(ref_id: &str, primary: &str, secondary: &str) -> QueryTarget {
        QueryTarget {
            ref_id: ref_id.to_string(),
            primary_idx: primary.to_string(),
            secondary_idx: secondary.to_string(),
            path: String::new(),
            query_text: Some("x".to_string()),
        }
    }

    fn datasource(fake: FakeTransport) -> (Datasource, Arc<FakeTransport>) {
        let fake = Arc::new(fake);
        (Datasource::with_transport(fake.clone()), fake)
    }

    const RANGE: TimeRange = TimeRange {
        from: 1000,
        to: 2000,
    };

    #[tokio::test]
    async fn single_target_end_to_end() {
        let (ds, fake) = datasource(FakeTransport::new().route(
            "/api/instance1/cpu",
            Ok(serde_json::json!({
                "MetricName": "cpu.load",
                "Ts": [1000, 1500],
                "Val": [0.1, 0.2]
            })),
        ));

        let resp = ds.query(&[target("A", "instance1", "cpu")], RANGE).await;

        assert!(resp.failures.is_empty());
        assert_eq!(resp.frames.len(), 1);
        let frame = &resp.frames[0];
        assert_eq!(frame.name.as_deref(), Some("cpu.load"));
        assert_eq!(frame.ref_id, "A");
        assert_eq!(frame.length, 2);
        assert_eq!(frame.fields[0].values, FieldValues::Time(vec![1000, 1500]));
        assert_eq!(frame.fields[1].values, FieldValues::Number(vec![0.1, 0.2]));

        assert_eq!(
            fake.calls(),
            [("/api/instance1/cpu".to_string(), "from=1000&to=2000".to_string())]
        );
    }

    #[tokio::test]
    async fn ineligible_targets_are_dropped_silently() {
        let (ds, fake) = datasource(FakeTransport::new().route(
            "/api/instance1/cpu",
            Ok(serde_json::json!({ "Ts": [1], "Val": [1.0] })),
        ));

        let no_query_text = QueryTarget {
            query_text: None,
            ..target("B", "instance2", "mem")
        };
        let empty_query_text = QueryTarget {
            query_text: Some(String::new()),
            ..target("C", "instance3", "mem")
        };

        let resp = ds
            .query(
                &[target("A", "instance1", "cpu"), no_query_text, empty_query_text],
                RANGE,
            )
            .await;

        // One frame, no failure entries: skipping is a no-op, not an error.
        assert_eq!(resp.frames.len(), 1);
        assert_eq!(resp.frames[0].ref_id, "A");
        assert!(resp.failures.is_empty());
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn one_failing_target_does_not_abort_the_batch() {
        let (ds, _fake) = datasource(
            FakeTransport::new()
                .route(
                    "/api/instance1/cpu",
                    Ok(serde_json::json!({ "Ts": [1000], "Val": [0.5] })),
                )
                .route(
                    "/api/instance2/cpu",
                    Err(DatasourceError::Transport {
                        status: 500,
                        status_text: "Internal Server Error".to_string(),
                        body: None,
                    }),
                )
                .route(
                    "/api/instance3/cpu",
                    Ok(serde_json::json!({ "Ts": [2000], "Val": [0.7] })),
                ),
        );

        let resp = ds
            .query(
                &[
                    target("A", "instance1", "cpu"),
                    target("B", "instance2", "cpu"),
                    target("C", "instance3", "cpu"),
                ],
                RANGE,
            )
            .await;

        // Frames keep input order; the failure is attributable by ref_id.
        assert_eq!(resp.frames.len(), 2);
        assert_eq!(resp.frames[0].ref_id, "A");
        assert_eq!(resp.frames[1].ref_id, "C");
        assert_eq!(resp.failures.len(), 1);
        assert_eq!(resp.failures[0].ref_id, "B");
        assert!(matches!(
            resp.failures[0].error,
            DatasourceError::Transport { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_per_target_mapping_failure() {
        let (ds, _fake) = datasource(FakeTransport::new().route(
            "/api/instance1/cpu",
            Ok(serde_json::json!({ "Ts": [1000, 1500], "Val": [0.1] })),
        ));

        let resp = ds.query(&[target("A", "instance1", "cpu")], RANGE).await;

        assert!(resp.frames.is_empty());
        assert_eq!(resp.failures.len(), 1);
        assert_eq!(
            resp.failures[0].error,
            DatasourceError::Mapping(MapError::LengthMismatch { ts: 2, val: 1 })
        );
    }

    #[tokio::test]
    async fn eligible_target_with_empty_index_fails_at_the_backend() {
        // The eligibility gate does not inspect the index fields, so this
        // target runs and comes back as an attributable backend failure.
        let (ds, fake) = datasource(FakeTransport::new());

        let mut bad = target("A", "", "cpu");
        bad.query_text = Some("x".to_string());
        let resp = ds.query(&[bad], RANGE).await;

        assert!(resp.frames.is_empty());
        assert_eq!(resp.failures.len(), 1);
        assert_eq!(resp.failures[0].ref_id, "A");
        assert_eq!(fake.calls()[0].0, "/api//cpu");
    }

    #[tokio::test]
    async fn probe_succeeds_on_200() {
        let (ds, _fake) = datasource(FakeTransport::new().on_ping(Ok(RawResponse {
            status: 200,
            status_text: "OK".to_string(),
        })));

        assert_eq!(
            ds.health_check().await,
            ProbeResult {
                status: ProbeStatus::Success,
                message: "Success".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn probe_reports_status_text_on_non_200() {
        let (ds, _fake) = datasource(FakeTransport::new().on_ping(Ok(RawResponse {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        })));

        assert_eq!(
            ds.health_check().await,
            ProbeResult {
                status: ProbeStatus::Error,
                message: "Internal Server Error".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn probe_falls_back_when_status_text_is_empty() {
        let (ds, _fake) = datasource(FakeTransport::new().on_ping(Ok(RawResponse {
            status: 599,
            status_text: String::new(),
        })));

        assert_eq!(ds.health_check().await.message, "Cannot connect to API");
    }

    #[tokio::test]
    async fn probe_classifies_network_failure() {
        let (ds, _fake) = datasource(
            FakeTransport::new()
                .on_ping(Err(DatasourceError::Network("connection refused".to_string()))),
        );

        assert_eq!(
            ds.health_check().await,
            ProbeResult {
                status: ProbeStatus::Error,
                message: "Fetch error: Cannot connect to API".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn probe_appends_structured_error_body() {
        let (ds, _fake) = datasource(FakeTransport::new().on_ping(Err(
            DatasourceError::Transport {
                status: 502,
                status_text: "Bad Gateway".to_string(),
                body: Some(ErrorBody {
                    code: 42,
                    message: "backend exploded".to_string(),
                }),
            },
        )));

        assert_eq!(
            ds.health_check().await.message,
            "Fetch error: Bad Gateway: 42. backend exploded"
        );
    }

    #[test]
    fn probe_message_uses_fallback_for_blank_status_text() {
        let message = probe_failure_message(&DatasourceError::Transport {
            status: 500,
            status_text: String::new(),
            body: None,
        });
        assert_eq!(message, "Fetch error: Cannot connect to API");
    }

    #[test]
    fn probe_message_passes_other_errors_through_verbatim() {
        let err = DatasourceError::Mapping(MapError::UnknownShape);
        assert_eq!(probe_failure_message(&err), err.to_string());
    }
}
