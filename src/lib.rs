//! PVR add-on that forwards the host's PVR client ABI to a Python
//! implementation running in an embedded interpreter.

pub mod abi;
pub mod client;
pub mod config;
pub mod errors;
pub mod host;
pub mod interpreter;
pub mod logging;
pub mod schema;

pub use abi::{AddonStatus, PvrError};
pub use client::{Amount, BackendString, ListRequest, PvrClient};
pub use config::{BridgeConfig, LogFormat, LoggingConfig, ScriptConfig};
pub use errors::{BridgeError, Result};
pub use host::{Entry, LogLevel, PvrHost, TransferHandle};
pub use interpreter::{CrossingStats, Interpreter};
pub use schema::{
    AddonProps, Capabilities, Channel, ChannelGroup, ChannelGroupMember, DriveSpace, EpgTag,
    Record, RecordKind, Recording, Timer,
};
