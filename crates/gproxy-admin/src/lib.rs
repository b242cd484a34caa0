//! The admin surface: a single authenticated endpoint that accepts a full
//! provider/credential snapshot and publishes it. Everything else about
//! configuration management (a CRUD UI, per-field PATCH endpoints) lives
//! outside this crate's scope; this is the one RPC the running proxy needs.

pub mod router;

pub use router::{admin_router, AdminState};
