//! Host seam
//!
//! Everything the bridge needs from the media-center host: a log sink and
//! one transfer callback per streamed record kind. The ABI layer implements
//! this over the host's C callback table; tests use an in-memory recorder.

use std::fmt;
use std::os::raw::c_void;

use crate::schema::{Channel, ChannelGroup, ChannelGroupMember, EpgTag, Recording, RecordKind, Timer};

/// Host log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

/// Opaque handle of the host list currently being filled
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TransferHandle(*mut c_void);

// The handle is only dereferenced by the host, on the thread that handed it
// out, while the request that owns it is still running.
unsafe impl Send for TransferHandle {}
unsafe impl Sync for TransferHandle {}

impl TransferHandle {
    pub fn new(raw: *mut c_void) -> Self {
        Self(raw)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

impl fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransferHandle({:p})", self.0)
    }
}

/// One streamed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Channel(Channel),
    ChannelGroup(ChannelGroup),
    ChannelGroupMember(ChannelGroupMember),
    Timer(Timer),
    Recording(Recording),
    Epg(EpgTag),
}

impl Entry {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Channel(_) => RecordKind::Channel,
            Self::ChannelGroup(_) => RecordKind::ChannelGroup,
            Self::ChannelGroupMember(_) => RecordKind::ChannelGroupMember,
            Self::Timer(_) => RecordKind::Timer,
            Self::Recording(_) => RecordKind::Recording,
            Self::Epg(_) => RecordKind::EpgTag,
        }
    }
}

pub trait PvrHost: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    /// Append one record to the host list identified by `handle`
    fn transfer(&self, handle: TransferHandle, entry: &Entry);
}
