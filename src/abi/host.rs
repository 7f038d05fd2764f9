//! Host callback table
//!
//! `ADDON_Create` receives a pointer to `HostCallbacks` as its `hdl`
//! argument. The table is copied once; the host keeps the callbacks and the
//! opaque `host` pointer valid until `ADDON_Destroy` returns.

use std::os::raw::{c_char, c_int, c_void};

use super::convert::{to_cstring, OwnedEpgTag};
use super::types::*;
use crate::errors::{BridgeError, Result};
use crate::host::{Entry, LogLevel, PvrHost, TransferHandle};

pub type LogFn = unsafe extern "C" fn(host: *mut c_void, level: c_int, message: *const c_char);
pub type TransferFn<T> = unsafe extern "C" fn(host: *mut c_void, handle: AddonHandle, entry: *const T);

#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostCallbacks {
    pub host: *mut c_void,
    pub log: Option<LogFn>,
    pub transfer_channel_entry: Option<TransferFn<PvrChannel>>,
    pub transfer_channel_group: Option<TransferFn<PvrChannelGroup>>,
    pub transfer_channel_group_member: Option<TransferFn<PvrChannelGroupMember>>,
    pub transfer_timer_entry: Option<TransferFn<PvrTimer>>,
    pub transfer_recording_entry: Option<TransferFn<PvrRecording>>,
    pub transfer_epg_entry: Option<TransferFn<EpgTagRaw>>,
}

struct Registered {
    log: LogFn,
    channel: TransferFn<PvrChannel>,
    group: TransferFn<PvrChannelGroup>,
    member: TransferFn<PvrChannelGroupMember>,
    timer: TransferFn<PvrTimer>,
    recording: TransferFn<PvrRecording>,
    epg: TransferFn<EpgTagRaw>,
}

/// `PvrHost` over the host's C callbacks
pub struct CallbackHost {
    host: *mut c_void,
    callbacks: Registered,
}

// The host guarantees its callbacks are callable from any thread it calls
// into the add-on from, for the whole add-on lifetime.
unsafe impl Send for CallbackHost {}
unsafe impl Sync for CallbackHost {}

impl CallbackHost {
    /// Copy and validate the host's table
    ///
    /// # Safety
    /// `table` must be null or point to a readable `HostCallbacks`.
    pub unsafe fn register(table: *const HostCallbacks) -> Result<Self> {
        let table = table
            .as_ref()
            .ok_or(BridgeError::HostRegistration("callback table"))?;

        let callbacks = Registered {
            log: table.log.ok_or(BridgeError::HostRegistration("log"))?,
            channel: table
                .transfer_channel_entry
                .ok_or(BridgeError::HostRegistration("transfer_channel_entry"))?,
            group: table
                .transfer_channel_group
                .ok_or(BridgeError::HostRegistration("transfer_channel_group"))?,
            member: table
                .transfer_channel_group_member
                .ok_or(BridgeError::HostRegistration("transfer_channel_group_member"))?,
            timer: table
                .transfer_timer_entry
                .ok_or(BridgeError::HostRegistration("transfer_timer_entry"))?,
            recording: table
                .transfer_recording_entry
                .ok_or(BridgeError::HostRegistration("transfer_recording_entry"))?,
            epg: table
                .transfer_epg_entry
                .ok_or(BridgeError::HostRegistration("transfer_epg_entry"))?,
        };

        Ok(Self {
            host: table.host,
            callbacks,
        })
    }
}

impl PvrHost for CallbackHost {
    fn log(&self, level: LogLevel, message: &str) {
        let level = match level {
            LogLevel::Debug => AddonLogLevel::Debug,
            LogLevel::Info => AddonLogLevel::Info,
            LogLevel::Error => AddonLogLevel::Error,
        };
        let message = to_cstring(message);
        unsafe { (self.callbacks.log)(self.host, level as c_int, message.as_ptr()) }
    }

    fn transfer(&self, handle: TransferHandle, entry: &Entry) {
        let handle = handle.as_ptr() as AddonHandle;
        let cb = &self.callbacks;
        unsafe {
            match entry {
                Entry::Channel(channel) => {
                    let raw = PvrChannel::from(channel);
                    (cb.channel)(self.host, handle, &raw);
                }
                Entry::ChannelGroup(group) => {
                    let raw = PvrChannelGroup::from(group);
                    (cb.group)(self.host, handle, &raw);
                }
                Entry::ChannelGroupMember(member) => {
                    let raw = PvrChannelGroupMember::from(member);
                    (cb.member)(self.host, handle, &raw);
                }
                Entry::Timer(timer) => {
                    let raw = PvrTimer::from(timer);
                    (cb.timer)(self.host, handle, &raw);
                }
                Entry::Recording(recording) => {
                    let raw = PvrRecording::from(recording);
                    (cb.recording)(self.host, handle, &raw);
                }
                Entry::Epg(tag) => {
                    let owned = OwnedEpgTag::from(tag);
                    (cb.epg)(self.host, handle, owned.as_ptr());
                }
            }
        }
    }
}
