//! Exported C entry points, driven the way the host drives them
//!
//! The session is process-wide, so everything runs in one sequential test.

use std::ffi::{CStr, CString};
use std::fs;
use std::os::raw::{c_char, c_int, c_longlong, c_void};
use std::sync::Mutex;

use pvr_python::abi::convert::{read_cstr, read_str};
use pvr_python::abi::entry::*;
use pvr_python::abi::types::*;
use pvr_python::abi::HostCallbacks;

static LOGS: Mutex<Vec<(c_int, String)>> = Mutex::new(Vec::new());
static CHANNELS: Mutex<Vec<(usize, String, u32)>> = Mutex::new(Vec::new());
static EPG_TITLES: Mutex<Vec<String>> = Mutex::new(Vec::new());

unsafe extern "C" fn log(_host: *mut c_void, level: c_int, message: *const c_char) {
    LOGS.lock().unwrap().push((level, read_cstr(message)));
}

unsafe extern "C" fn channel(_host: *mut c_void, handle: AddonHandle, entry: *const PvrChannel) {
    let entry = &*entry;
    CHANNELS.lock().unwrap().push((
        handle as usize,
        read_str(&entry.strChannelName),
        entry.iChannelNumber,
    ));
}

unsafe extern "C" fn epg(_host: *mut c_void, _handle: AddonHandle, entry: *const EpgTagRaw) {
    EPG_TITLES.lock().unwrap().push(read_cstr((*entry).strTitle));
}

unsafe extern "C" fn ignore<T>(_host: *mut c_void, _handle: AddonHandle, _entry: *const T) {}

fn callbacks() -> HostCallbacks {
    HostCallbacks {
        host: std::ptr::null_mut(),
        log: Some(log),
        transfer_channel_entry: Some(channel),
        transfer_channel_group: Some(ignore::<PvrChannelGroup>),
        transfer_channel_group_member: Some(ignore::<PvrChannelGroupMember>),
        transfer_timer_entry: Some(ignore::<PvrTimer>),
        transfer_recording_entry: Some(ignore::<PvrRecording>),
        transfer_epg_entry: Some(epg),
    }
}

fn text(ptr: *const c_char) -> String {
    assert!(!ptr.is_null());
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

const SCRIPT: &str = r#"
import bridge

class Impl:
    def ADDON_Create(self, props):
        bridge.XBMC_Log('created for %s' % props['clientPath'])
        return bridge.ADDON_STATUS.OK

    def GetAddonCapabilities(self):
        return (0, {'supportsEPG': True, 'supportsTV': True})

    def GetBackendName(self):
        return 'entry point backend'

    def GetBackendVersion(self):
        return '1.0'

    def GetChannels(self, radio):
        yield {'channelName': 'ABC', 'channelNumber': 2}
        yield {'channelName': 'ABC ME', 'channelNumber': 23}

    def GetEPGForChannel(self, uid, start, end):
        bridge.PVR_TransferEpgEntry({'title': 'Channel %d' % uid, 'startTime': start})
        return bridge.PVR_ERROR.NO_ERROR

    def GetChannelsAmount(self):
        return 2

    def GetDriveSpace(self):
        return (0, 4096, 1024)

def getInstance():
    return Impl()
"#;

const FAILING_SCRIPT: &str = r#"
class Impl:
    def GetAddonCapabilities(self):
        raise IOError('backend offline')

    def GetChannelsAmount(self):
        return 11

def getInstance():
    return Impl()
"#;

/// Calls every stub; none of them may touch the host
fn assert_stub_answers() {
    let log_lines = LOGS.lock().unwrap().len();

    assert_eq!(GetTimerTypes(std::ptr::null_mut(), std::ptr::null_mut()), PvrError::NotImplemented);
    assert!(!OpenLiveStream(std::ptr::null()));
    assert!(!SwitchChannel(std::ptr::null()));
    assert_eq!(GetStreamProperties(std::ptr::null_mut()), PvrError::NotImplemented);
    assert_eq!(GetChannelGroupsAmount(), -1);
    assert_eq!(SignalStatus(std::ptr::null_mut()), PvrError::NotImplemented);
    assert_eq!(OpenDialogChannelScan(), PvrError::NotImplemented);
    assert_eq!(CallMenuHook(std::ptr::null(), std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(DeleteChannel(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(RenameChannel(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(MoveChannel(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(OpenDialogChannelSettings(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(OpenDialogChannelAdd(std::ptr::null()), PvrError::NotImplemented);
    assert!(!OpenRecordedStream(std::ptr::null()));
    CloseRecordedStream();
    assert_eq!(ReadRecordedStream(std::ptr::null_mut(), 64), 0);
    assert_eq!(SeekRecordedStream(10, 0), 0);
    assert_eq!(PositionRecordedStream(), -1);
    assert_eq!(LengthRecordedStream(), 0);
    DemuxReset();
    DemuxFlush();
    assert_eq!(ReadLiveStream(std::ptr::null_mut(), 64), 0);
    assert_eq!(SeekLiveStream(10, 0), -1);
    assert_eq!(PositionLiveStream(), -1);
    assert_eq!(LengthLiveStream(), -1);
    assert_eq!(text(GetLiveStreamURL(std::ptr::null())), "");
    assert_eq!(DeleteRecording(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(RenameRecording(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(SetRecordingPlayCount(std::ptr::null(), 1), PvrError::NotImplemented);
    assert_eq!(SetRecordingLastPlayedPosition(std::ptr::null(), 1), PvrError::NotImplemented);
    assert_eq!(GetRecordingLastPlayedPosition(std::ptr::null()), -1);
    assert_eq!(GetRecordingEdl(std::ptr::null(), std::ptr::null_mut(), std::ptr::null_mut()), PvrError::NotImplemented);
    assert_eq!(AddTimer(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(DeleteTimer(std::ptr::null(), true), PvrError::NotImplemented);
    assert_eq!(UpdateTimer(std::ptr::null()), PvrError::NotImplemented);
    DemuxAbort();
    assert!(DemuxRead().is_null());
    assert_eq!(GetChannelSwitchDelay(), 0);
    PauseStream(true);
    assert!(!CanPauseStream());
    assert!(!CanSeekStream());
    assert!(!SeekTime(1.0, false, std::ptr::null_mut()));
    SetSpeed(1000);
    assert!(!IsTimeshifting());
    assert!(IsRealTimeStream());
    assert_eq!(GetPlayingTime(), 0);
    assert_eq!(GetBufferTimeStart(), 0);
    assert_eq!(GetBufferTimeEnd(), 0);
    assert_eq!(UndeleteRecording(std::ptr::null()), PvrError::NotImplemented);
    assert_eq!(DeleteAllRecordingsFromTrash(), PvrError::NotImplemented);
    assert_eq!(SetEPGTimeFrame(7), PvrError::NotImplemented);

    assert_eq!(text(GetPVRAPIVersion()), "5.2.1");
    assert_eq!(text(GetMininumPVRAPIVersion()), "5.2.0");
    assert_eq!(text(GetGUIAPIVersion()), "");
    assert_eq!(text(GetMininumGUIAPIVersion()), "");

    assert_eq!(LOGS.lock().unwrap().len(), log_lines);
}

#[test]
fn test_entry_point_lifecycle() {
    // Nothing created yet
    assert_eq!(ADDON_GetStatus(), AddonStatus::Unknown);
    assert_eq!(GetChannels(std::ptr::null_mut(), false), PvrError::Failed);
    assert_eq!(GetChannelsAmount(), -1);
    assert_eq!(text(GetBackendName()), "");
    assert_stub_answers();

    // Rejected creation
    assert_eq!(
        ADDON_Create(std::ptr::null_mut(), std::ptr::null_mut()),
        AddonStatus::Unknown
    );

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pvrimpl.py"), SCRIPT).unwrap();
    let user_path = CString::new(dir.path().join("user").display().to_string()).unwrap();
    let client_path = CString::new(dir.path().display().to_string()).unwrap();
    let mut props = PvrProperties {
        strUserPath: user_path.as_ptr(),
        strClientPath: client_path.as_ptr(),
        iEpgMaxDays: 3,
    };
    let props_ptr = &mut props as *mut PvrProperties as *mut c_void;

    let mut incomplete = callbacks();
    incomplete.transfer_epg_entry = None;
    assert_eq!(
        ADDON_Create(&mut incomplete as *mut HostCallbacks as *mut c_void, props_ptr),
        AddonStatus::PermanentFailure
    );
    assert_eq!(ADDON_GetStatus(), AddonStatus::Unknown);

    // Real session
    let mut table = callbacks();
    let table_ptr = &mut table as *mut HostCallbacks as *mut c_void;
    assert_eq!(ADDON_Create(table_ptr, props_ptr), AddonStatus::Ok);
    assert_eq!(ADDON_GetStatus(), AddonStatus::Ok);
    assert!(LOGS
        .lock()
        .unwrap()
        .iter()
        .any(|(level, line)| *level == AddonLogLevel::Debug as c_int && line.starts_with("created for")));

    // Second create keeps the running session
    assert_eq!(ADDON_Create(table_ptr, props_ptr), AddonStatus::Ok);

    let mut caps = PvrAddonCapabilities::default();
    assert_eq!(GetAddonCapabilities(&mut caps), PvrError::NoError);
    assert!(caps.bSupportsEPG);
    assert!(caps.bSupportsTV);
    assert!(!caps.bSupportsRadio);

    let name = GetBackendName();
    let version = GetBackendVersion();
    // Another entry point's string does not disturb this one
    assert_eq!(text(name), "entry point backend");
    assert_eq!(text(version), "1.0");
    assert_eq!(text(GetConnectionString()), "");

    let list_handle = 0x1000 as AddonHandle;
    assert_eq!(GetChannels(list_handle, false), PvrError::NoError);
    assert_eq!(
        *CHANNELS.lock().unwrap(),
        vec![
            (0x1000, "ABC".to_string(), 2),
            (0x1000, "ABC ME".to_string(), 23),
        ]
    );
    assert_eq!(GetChannelsAmount(), 2);
    assert_eq!(GetTimersAmount(), -1);
    assert_eq!(GetTimers(list_handle), PvrError::NotImplemented);

    let mut channel: PvrChannel = unsafe { std::mem::zeroed() };
    channel.iUniqueId = 9;
    assert_eq!(
        GetEPGForChannel(list_handle, &channel, 1_476_000_000, 1_476_086_400),
        PvrError::NoError
    );
    assert_eq!(*EPG_TITLES.lock().unwrap(), vec!["Channel 9".to_string()]);

    let (mut total, mut used): (c_longlong, c_longlong) = (0, 0);
    assert_eq!(GetDriveSpace(&mut total, &mut used), PvrError::NoError);
    assert_eq!((total, used), (4096, 1024));

    // Null arguments are rejected before the script is asked
    assert_eq!(
        GetAddonCapabilities(std::ptr::null_mut()),
        PvrError::InvalidParameters
    );
    used = -7;
    assert_eq!(GetDriveSpace(std::ptr::null_mut(), &mut used), PvrError::InvalidParameters);
    assert_eq!(used, -7);
    assert_eq!(
        GetChannelGroupMembers(list_handle, std::ptr::null()),
        PvrError::InvalidParameters
    );
    assert_eq!(
        GetEPGForChannel(list_handle, std::ptr::null(), 1_476_000_000, 1_476_086_400),
        PvrError::InvalidParameters
    );
    assert_eq!(EPG_TITLES.lock().unwrap().len(), 1);
    assert_eq!(CHANNELS.lock().unwrap().len(), 2);

    assert_stub_answers();

    ADDON_Destroy();
    assert_eq!(ADDON_GetStatus(), AddonStatus::Unknown);
    assert_eq!(GetChannelsAmount(), -1);
    // A second destroy has nothing to tear down
    ADDON_Destroy();

    // A new session imports the rewritten script rather than the old module
    fs::write(dir.path().join("pvrimpl.py"), FAILING_SCRIPT).unwrap();
    assert_eq!(ADDON_Create(table_ptr, props_ptr), AddonStatus::Ok);
    assert_eq!(GetChannelsAmount(), 11);

    // A raising script leaves the host struct as it was
    let untouched = PvrAddonCapabilities {
        bSupportsRecordings: true,
        bHandlesDemuxing: true,
        ..PvrAddonCapabilities::default()
    };
    let mut caps = untouched;
    assert_eq!(GetAddonCapabilities(&mut caps), PvrError::Failed);
    assert_eq!(caps, untouched);
    assert!(LOGS
        .lock()
        .unwrap()
        .iter()
        .any(|(level, line)| *level == AddonLogLevel::Error as c_int && line.contains("backend offline")));

    ADDON_Destroy();
}
