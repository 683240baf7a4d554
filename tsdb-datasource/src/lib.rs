//! Time-series datasource core.
//!
//! Queries a time-series backend by hierarchical index pair
//! (`primary/secondary`, optionally under a path prefix) and a time window,
//! and maps the responses into canonical frames for a visualization host.
//! The host supplies connection settings at construction time and consumes
//! the frames; query-input and settings UIs live host-side.
//!
//! | Module         | Responsibility                                   |
//! |----------------|--------------------------------------------------|
//! | [`model`]      | host-facing data model and the eligibility gate  |
//! | [`endpoint`]   | target + range → request path and query string   |
//! | [`transport`]  | GET transport over the backend HTTP API          |
//! | [`payload`]    | backend payload schemas and the frame mapper     |
//! | [`datasource`] | batch orchestration and the connectivity probe   |
//! | [`error`]      | network / transport / mapping error taxonomy     |

pub mod datasource;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod payload;
pub mod transport;

pub use datasource::Datasource;
pub use error::{DatasourceError, ErrorBody, MapError};
pub use model::{
    BatchResponse, DatasourceSettings, Field, FieldKind, FieldValues, ProbeResult, ProbeStatus,
    QueryTarget, TargetFailure, TimeRange, TimeSeriesFrame,
};
pub use transport::{HttpTransport, Transport};
