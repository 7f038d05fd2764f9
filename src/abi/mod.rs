//! Host-facing C ABI
//!
//! `types` mirrors the host structures, `convert` moves records in and out
//! of them, `host` wraps the host's callback table and `entry` holds the
//! exported functions the host resolves by name.

pub mod convert;
pub mod entry;
pub mod host;
pub mod types;

pub use host::{CallbackHost, HostCallbacks};
pub use types::{AddonStatus, PvrError};
