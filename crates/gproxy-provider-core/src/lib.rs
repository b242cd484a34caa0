//! Config snapshot types, the observer sink contract, and small shared
//! utilities (headers, errors) used by both `gproxy-core` and
//! `gproxy-provider-impl`.
//!
//! This crate intentionally does not depend on axum or any concrete HTTP
//! client; upstream IO lives in `gproxy-provider-impl`.

pub mod credential;
pub mod events;
pub mod headers;
pub mod model;
pub mod record;
pub mod snapshot;

pub use credential::{Credential, CredentialId, RateLimit};
pub use events::{Event, EventHub, EventSink, TerminalEventSink};
pub use headers::{header_get, header_remove, header_set, Headers};
pub use model::{ModelMapping, Provider, ProviderId, ProviderParams, ProviderType};
pub use record::{bounded_body, RequestRecord};
pub use snapshot::ConfigSnapshot;
