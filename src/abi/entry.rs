//! Exported add-on entry points
//!
//! Design:
//! - One session per process behind `SESSION`; every forwarded call holds
//!   the lock for its whole duration, then takes the GIL inside
//! - Host callbacks run while the lock is held and must not re-enter
//! - Failures are mapped to the host's fixed answers here and never cross
//!   the boundary as anything else
//! - Unimplemented operations answer without touching the session

#![allow(non_snake_case)]

use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_longlong, c_uchar, c_uint, c_void};
use std::path::Path;
use std::sync::Arc;

use libc::time_t;
use once_cell::sync::Lazy;
use parking_lot::{const_mutex, Mutex};

use super::convert::{read_props, read_str, to_cstring};
use super::host::{CallbackHost, HostCallbacks};
use super::types::*;
use crate::client::{Amount, BackendString, ListRequest, PvrClient};
use crate::config::{BridgeConfig, PVR_API_VERSION, PVR_MIN_API_VERSION};
use crate::errors::{BridgeError, Result};
use crate::host::{LogLevel, PvrHost, TransferHandle};
use crate::logging;

struct Session {
    client: PvrClient,
    /// Strings handed to the host, one slot per entry point
    strings: HashMap<&'static str, CString>,
}

static SESSION: Mutex<Option<Session>> = const_mutex(None);

static EMPTY: Lazy<CString> = Lazy::new(CString::default);
static API_VERSION: Lazy<CString> = Lazy::new(|| to_cstring(PVR_API_VERSION));
static MIN_API_VERSION: Lazy<CString> = Lazy::new(|| to_cstring(PVR_MIN_API_VERSION));

fn open_session(host: Arc<dyn PvrHost>, props: *const PvrProperties) -> Result<Session> {
    let props = unsafe { read_props(props) }?;
    let config = BridgeConfig::load(Path::new(&props.client_path))?;

    let user_path = Path::new(&props.user_path);
    logging::init(
        &config.logging,
        Some(user_path).filter(|p| !p.as_os_str().is_empty()),
    );
    tracing::info!(client_path = %props.client_path, module = %config.script.module, "creating session");

    let client = PvrClient::create(host, &props, &config)?;
    Ok(Session {
        client,
        strings: HashMap::new(),
    })
}

fn with_client<T>(name: &str, fallback: T, f: impl FnOnce(&PvrClient) -> T) -> T {
    let session = SESSION.lock();
    match session.as_ref() {
        Some(session) => f(&session.client),
        None => {
            tracing::warn!("{}: {}", name, BridgeError::NotCreated);
            fallback
        }
    }
}

/// Keep `value` alive in the session and hand out its pointer
fn session_string(name: &'static str, f: impl FnOnce(&PvrClient) -> String) -> *const c_char {
    let mut guard = SESSION.lock();
    let Some(session) = guard.as_mut() else {
        tracing::warn!("{}: {}", name, BridgeError::NotCreated);
        return EMPTY.as_ptr();
    };
    let value = to_cstring(&f(&session.client));
    let slot = session.strings.entry(name).or_default();
    *slot = value;
    slot.as_ptr()
}

fn nyi(name: &str) {
    tracing::debug!("{} - NYI", name);
    if let Some(session) = SESSION.lock().as_ref() {
        session.client.host().log(LogLevel::Debug, &format!("{} - NYI", name));
    }
}

fn list(name: &str, handle: AddonHandle, request: ListRequest) -> PvrError {
    with_client(name, PvrError::Failed, |client| {
        client.list(TransferHandle::new(handle as *mut c_void), &request)
    })
}

// Lifecycle

/// `hdl` is the host's `HostCallbacks` table, `props` its `PVR_PROPERTIES`
#[no_mangle]
pub extern "C" fn ADDON_Create(hdl: *mut c_void, props: *mut c_void) -> AddonStatus {
    if hdl.is_null() || props.is_null() {
        return AddonStatus::Unknown;
    }

    let mut session = SESSION.lock();
    if let Some(existing) = session.as_ref() {
        tracing::warn!("ADDON_Create called twice; keeping the running session");
        return existing.client.status();
    }

    let host: Arc<dyn PvrHost> = match unsafe { CallbackHost::register(hdl as *const HostCallbacks) } {
        Ok(host) => Arc::new(host),
        Err(err) => {
            tracing::error!("{}", err);
            return AddonStatus::PermanentFailure;
        }
    };

    match open_session(host.clone(), props as *const PvrProperties) {
        Ok(opened) => {
            let status = opened.client.status();
            *session = Some(opened);
            status
        }
        Err(err) => {
            tracing::error!("ADDON_Create failed: {}", err);
            host.log(LogLevel::Error, &format!("ADDON_Create failed: {}", err));
            AddonStatus::PermanentFailure
        }
    }
}

#[no_mangle]
pub extern "C" fn ADDON_GetStatus() -> AddonStatus {
    SESSION
        .lock()
        .as_ref()
        .map(|session| session.client.status())
        .unwrap_or(AddonStatus::Unknown)
}

#[no_mangle]
pub extern "C" fn ADDON_Destroy() {
    let session = SESSION.lock().take();
    match session {
        Some(session) => {
            let stats = session.client.destroy();
            tracing::info!(entered = stats.entered, exited = stats.exited, "session closed");
        }
        None => tracing::debug!("ADDON_Destroy without an active session"),
    }
}

#[no_mangle]
pub extern "C" fn ADDON_HasSettings() -> bool {
    nyi("ADDON_HasSettings");
    true
}

#[no_mangle]
pub extern "C" fn ADDON_GetSettings(_settings: *mut c_void) -> c_uint {
    nyi("ADDON_GetSettings");
    0
}

#[no_mangle]
pub extern "C" fn ADDON_SetSetting(_name: *const c_char, _value: *const c_void) -> AddonStatus {
    nyi("ADDON_SetSetting");
    AddonStatus::Ok
}

#[no_mangle]
pub extern "C" fn ADDON_Stop() {
    nyi("ADDON_Stop");
}

#[no_mangle]
pub extern "C" fn ADDON_FreeSettings() {
    nyi("ADDON_FreeSettings");
}

// Forwarded to the script

#[no_mangle]
pub extern "C" fn GetAddonCapabilities(capabilities: *mut PvrAddonCapabilities) -> PvrError {
    if capabilities.is_null() {
        return PvrError::InvalidParameters;
    }
    with_client("GetAddonCapabilities", PvrError::Failed, |client| {
        let (status, caps) = client.capabilities();
        if let Some(caps) = caps {
            unsafe { *capabilities = PvrAddonCapabilities::from(&caps) };
        }
        status
    })
}

#[no_mangle]
pub extern "C" fn GetBackendName() -> *const c_char {
    session_string("GetBackendName", |c| c.backend_string(BackendString::Name))
}

#[no_mangle]
pub extern "C" fn GetConnectionString() -> *const c_char {
    session_string("GetConnectionString", |c| c.backend_string(BackendString::ConnectionString))
}

#[no_mangle]
pub extern "C" fn GetBackendVersion() -> *const c_char {
    session_string("GetBackendVersion", |c| c.backend_string(BackendString::Version))
}

#[no_mangle]
pub extern "C" fn GetBackendHostname() -> *const c_char {
    session_string("GetBackendHostname", |c| c.backend_string(BackendString::Hostname))
}

#[no_mangle]
pub extern "C" fn GetChannels(handle: AddonHandle, radio: bool) -> PvrError {
    list("GetChannels", handle, ListRequest::Channels { radio })
}

#[no_mangle]
pub extern "C" fn GetChannelGroups(handle: AddonHandle, radio: bool) -> PvrError {
    list("GetChannelGroups", handle, ListRequest::ChannelGroups { radio })
}

#[no_mangle]
pub extern "C" fn GetChannelGroupMembers(handle: AddonHandle, group: *const PvrChannelGroup) -> PvrError {
    let Some(group) = (unsafe { group.as_ref() }) else {
        return PvrError::InvalidParameters;
    };
    let group_name = read_str(&group.strGroupName);
    list(
        "GetChannelGroupMembers",
        handle,
        ListRequest::ChannelGroupMembers { group_name },
    )
}

#[no_mangle]
pub extern "C" fn GetTimers(handle: AddonHandle) -> PvrError {
    list("GetTimers", handle, ListRequest::Timers)
}

#[no_mangle]
pub extern "C" fn GetRecordings(handle: AddonHandle, deleted: bool) -> PvrError {
    list("GetRecordings", handle, ListRequest::Recordings { deleted })
}

#[no_mangle]
pub extern "C" fn GetEPGForChannel(
    handle: AddonHandle,
    channel: *const PvrChannel,
    start: time_t,
    end: time_t,
) -> PvrError {
    let Some(channel) = (unsafe { channel.as_ref() }) else {
        return PvrError::InvalidParameters;
    };
    let request = ListRequest::Epg {
        channel_uid: channel.iUniqueId as i64,
        start: start as i64,
        end: end as i64,
    };
    list("GetEPGForChannel", handle, request)
}

#[no_mangle]
pub extern "C" fn GetDriveSpace(total: *mut c_longlong, used: *mut c_longlong) -> PvrError {
    if total.is_null() || used.is_null() {
        return PvrError::InvalidParameters;
    }
    with_client("GetDriveSpace", PvrError::Failed, |client| {
        let (status, space) = client.drive_space();
        if let Some(space) = space {
            unsafe {
                *total = space.total as c_longlong;
                *used = space.used as c_longlong;
            }
        }
        status
    })
}

#[no_mangle]
pub extern "C" fn GetChannelsAmount() -> c_int {
    with_client("GetChannelsAmount", -1, |c| c.amount(Amount::Channels)) as c_int
}

#[no_mangle]
pub extern "C" fn GetTimersAmount() -> c_int {
    with_client("GetTimersAmount", -1, |c| c.amount(Amount::Timers)) as c_int
}

#[no_mangle]
pub extern "C" fn GetRecordingsAmount(deleted: bool) -> c_int {
    with_client("GetRecordingsAmount", -1, |c| c.amount(Amount::Recordings { deleted })) as c_int
}

// Versions

#[no_mangle]
pub extern "C" fn GetPVRAPIVersion() -> *const c_char {
    API_VERSION.as_ptr()
}

#[no_mangle]
pub extern "C" fn GetMininumPVRAPIVersion() -> *const c_char {
    MIN_API_VERSION.as_ptr()
}

#[no_mangle]
pub extern "C" fn GetGUIAPIVersion() -> *const c_char {
    EMPTY.as_ptr()
}

#[no_mangle]
pub extern "C" fn GetMininumGUIAPIVersion() -> *const c_char {
    EMPTY.as_ptr()
}

// Logged no-ops

#[no_mangle]
pub extern "C" fn OnSystemSleep() {
    nyi("OnSystemSleep");
}

#[no_mangle]
pub extern "C" fn OnSystemWake() {
    nyi("OnSystemWake");
}

#[no_mangle]
pub extern "C" fn OnPowerSavingActivated() {
    nyi("OnPowerSavingActivated");
}

#[no_mangle]
pub extern "C" fn OnPowerSavingDeactivated() {
    nyi("OnPowerSavingDeactivated");
}

#[no_mangle]
pub extern "C" fn CloseLiveStream() {
    nyi("CloseLiveStream");
}

// Not implemented
//
// Fixed answers only. None of these take the session lock or write an NYI
// line, GetTimerTypes through SignalStatus included, so polling them leaves
// no trace on the host.

#[no_mangle]
pub extern "C" fn GetTimerTypes(_types: *mut c_void, _size: *mut c_int) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn OpenLiveStream(_channel: *const PvrChannel) -> bool {
    false
}

#[no_mangle]
pub extern "C" fn SwitchChannel(_channel: *const PvrChannel) -> bool {
    false
}

#[no_mangle]
pub extern "C" fn GetStreamProperties(_properties: *mut c_void) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn GetChannelGroupsAmount() -> c_int {
    -1
}

#[no_mangle]
pub extern "C" fn SignalStatus(_status: *mut c_void) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn OpenDialogChannelScan() -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn CallMenuHook(_hook: *const c_void, _item: *const c_void) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn DeleteChannel(_channel: *const PvrChannel) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn RenameChannel(_channel: *const PvrChannel) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn MoveChannel(_channel: *const PvrChannel) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn OpenDialogChannelSettings(_channel: *const PvrChannel) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn OpenDialogChannelAdd(_channel: *const PvrChannel) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn OpenRecordedStream(_recording: *const PvrRecording) -> bool {
    false
}

#[no_mangle]
pub extern "C" fn CloseRecordedStream() {}

#[no_mangle]
pub extern "C" fn ReadRecordedStream(_buffer: *mut c_uchar, _size: c_uint) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn SeekRecordedStream(_position: c_longlong, _whence: c_int) -> c_longlong {
    0
}

#[no_mangle]
pub extern "C" fn PositionRecordedStream() -> c_longlong {
    -1
}

#[no_mangle]
pub extern "C" fn LengthRecordedStream() -> c_longlong {
    0
}

#[no_mangle]
pub extern "C" fn DemuxReset() {}

#[no_mangle]
pub extern "C" fn DemuxFlush() {}

#[no_mangle]
pub extern "C" fn ReadLiveStream(_buffer: *mut c_uchar, _size: c_uint) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn SeekLiveStream(_position: c_longlong, _whence: c_int) -> c_longlong {
    -1
}

#[no_mangle]
pub extern "C" fn PositionLiveStream() -> c_longlong {
    -1
}

#[no_mangle]
pub extern "C" fn LengthLiveStream() -> c_longlong {
    -1
}

#[no_mangle]
pub extern "C" fn GetLiveStreamURL(_channel: *const PvrChannel) -> *const c_char {
    EMPTY.as_ptr()
}

#[no_mangle]
pub extern "C" fn DeleteRecording(_recording: *const PvrRecording) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn RenameRecording(_recording: *const PvrRecording) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn SetRecordingPlayCount(_recording: *const PvrRecording, _count: c_int) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn SetRecordingLastPlayedPosition(
    _recording: *const PvrRecording,
    _position: c_int,
) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn GetRecordingLastPlayedPosition(_recording: *const PvrRecording) -> c_int {
    -1
}

#[no_mangle]
pub extern "C" fn GetRecordingEdl(
    _recording: *const PvrRecording,
    _entries: *mut c_void,
    _size: *mut c_int,
) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn AddTimer(_timer: *const PvrTimer) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn DeleteTimer(_timer: *const PvrTimer, _force: bool) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn UpdateTimer(_timer: *const PvrTimer) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn DemuxAbort() {}

#[no_mangle]
pub extern "C" fn DemuxRead() -> *mut c_void {
    std::ptr::null_mut()
}

#[no_mangle]
pub extern "C" fn GetChannelSwitchDelay() -> c_uint {
    0
}

#[no_mangle]
pub extern "C" fn PauseStream(_paused: bool) {}

#[no_mangle]
pub extern "C" fn CanPauseStream() -> bool {
    false
}

#[no_mangle]
pub extern "C" fn CanSeekStream() -> bool {
    false
}

#[no_mangle]
pub extern "C" fn SeekTime(_time: f64, _backwards: bool, _start_pts: *mut f64) -> bool {
    false
}

#[no_mangle]
pub extern "C" fn SetSpeed(_speed: c_int) {}

#[no_mangle]
pub extern "C" fn IsTimeshifting() -> bool {
    false
}

#[no_mangle]
pub extern "C" fn IsRealTimeStream() -> bool {
    true
}

#[no_mangle]
pub extern "C" fn GetPlayingTime() -> time_t {
    0
}

#[no_mangle]
pub extern "C" fn GetBufferTimeStart() -> time_t {
    0
}

#[no_mangle]
pub extern "C" fn GetBufferTimeEnd() -> time_t {
    0
}

#[no_mangle]
pub extern "C" fn UndeleteRecording(_recording: *const PvrRecording) -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn DeleteAllRecordingsFromTrash() -> PvrError {
    PvrError::NotImplemented
}

#[no_mangle]
pub extern "C" fn SetEPGTimeFrame(_days: c_int) -> PvrError {
    PvrError::NotImplemented
}
