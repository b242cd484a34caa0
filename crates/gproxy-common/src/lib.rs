//! Shared types used across the gproxy workspace: the error taxonomy and
//! the environment-driven process configuration.

mod error;
mod settings;

pub use error::{ErrorKind, GproxyError};
pub use settings::Settings;

/// Stable numeric identifier for a provider row.
pub type ProviderId = i64;

/// Stable numeric identifier for a credential row.
pub type CredentialId = i64;
