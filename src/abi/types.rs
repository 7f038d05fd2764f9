//! C-layout mirrors of the host's PVR add-on structures
//!
//! Field order, widths and array lengths follow the host headers exactly;
//! these structs are read and written by the host through raw pointers.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

use libc::time_t;

pub const PVR_ADDON_NAME_STRING_LENGTH: usize = 1024;
pub const PVR_ADDON_URL_STRING_LENGTH: usize = 1024;
pub const PVR_ADDON_DESC_STRING_LENGTH: usize = 1024;
pub const PVR_ADDON_INPUT_FORMAT_STRING_LENGTH: usize = 32;

/// `ADDON_STATUS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum AddonStatus {
    Ok = 0,
    LostConnection = 1,
    NeedRestart = 2,
    NeedSettings = 3,
    Unknown = 4,
    NeedSavedSettings = 5,
    PermanentFailure = 6,
}

impl AddonStatus {
    pub const ALL: [AddonStatus; 7] = [
        Self::Ok,
        Self::LostConnection,
        Self::NeedRestart,
        Self::NeedSettings,
        Self::Unknown,
        Self::NeedSavedSettings,
        Self::PermanentFailure,
    ];

    /// Script-side integer to host enum; out-of-range codes become `Unknown`
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|status| *status as i64 == code)
            .unwrap_or(Self::Unknown)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::LostConnection => "LOST_CONNECTION",
            Self::NeedRestart => "NEED_RESTART",
            Self::NeedSettings => "NEED_SETTINGS",
            Self::Unknown => "UNKNOWN",
            Self::NeedSavedSettings => "NEED_SAVEDSETTINGS",
            Self::PermanentFailure => "PERMANENT_FAILURE",
        }
    }
}

/// `PVR_ERROR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum PvrError {
    NoError = 0,
    Unknown = -1,
    NotImplemented = -2,
    ServerError = -3,
    ServerTimeout = -4,
    Rejected = -5,
    AlreadyPresent = -6,
    InvalidParameters = -7,
    RecordingRunning = -8,
    Failed = -9,
}

impl PvrError {
    pub const ALL: [PvrError; 10] = [
        Self::NoError,
        Self::Unknown,
        Self::NotImplemented,
        Self::ServerError,
        Self::ServerTimeout,
        Self::Rejected,
        Self::AlreadyPresent,
        Self::InvalidParameters,
        Self::RecordingRunning,
        Self::Failed,
    ];

    /// Script-side integer to host enum; out-of-range codes become `Unknown`
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|err| *err as i64 == code)
            .unwrap_or(Self::Unknown)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NO_ERROR",
            Self::Unknown => "UNKNOWN",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ServerError => "SERVER_ERROR",
            Self::ServerTimeout => "SERVER_TIMEOUT",
            Self::Rejected => "REJECTED",
            Self::AlreadyPresent => "ALREADY_PRESENT",
            Self::InvalidParameters => "INVALID_PARAMETERS",
            Self::RecordingRunning => "RECORDING_RUNNING",
            Self::Failed => "FAILED",
        }
    }
}

/// `PVR_TIMER_STATE` values, exported to scripts as constants
pub const PVR_TIMER_STATES: [(&str, i64); 10] = [
    ("NEW", 0),
    ("SCHEDULED", 1),
    ("RECORDING", 2),
    ("COMPLETED", 3),
    ("ABORTED", 4),
    ("CANCELLED", 5),
    ("CONFLICT_OK", 6),
    ("CONFLICT_NOK", 7),
    ("ERROR", 8),
    ("DISABLED", 9),
];

/// `PVR_RECORDING_CHANNEL_TYPE` values
pub const PVR_RECORDING_CHANNEL_TYPES: [(&str, i64); 3] =
    [("UNKNOWN", 0), ("TV", 1), ("RADIO", 2)];

/// `ADDON::addon_log_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum AddonLogLevel {
    Debug = 0,
    Info = 1,
    Notice = 2,
    Error = 3,
}

/// `ADDON_HANDLE_STRUCT`
#[derive(Debug)]
#[repr(C)]
pub struct AddonHandleStruct {
    pub callerAddress: *mut c_void,
    pub dataAddress: *mut c_void,
    pub dataIdentifier: c_int,
}

pub type AddonHandle = *mut AddonHandleStruct;

/// `PVR_PROPERTIES`
#[derive(Debug)]
#[repr(C)]
pub struct PvrProperties {
    pub strUserPath: *const c_char,
    pub strClientPath: *const c_char,
    pub iEpgMaxDays: c_int,
}

/// `PVR_ADDON_CAPABILITIES`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct PvrAddonCapabilities {
    pub bSupportsEPG: bool,
    pub bSupportsTV: bool,
    pub bSupportsRadio: bool,
    pub bSupportsRecordings: bool,
    pub bSupportsRecordingsUndelete: bool,
    pub bSupportsTimers: bool,
    pub bSupportsChannelGroups: bool,
    pub bSupportsChannelScan: bool,
    pub bSupportsChannelSettings: bool,
    pub bHandlesInputStream: bool,
    pub bHandlesDemuxing: bool,
    pub bSupportsRecordingPlayCount: bool,
    pub bSupportsLastPlayedPosition: bool,
    pub bSupportsRecordingEdl: bool,
}

/// `PVR_CHANNEL`
#[repr(C)]
pub struct PvrChannel {
    pub iUniqueId: c_uint,
    pub bIsRadio: bool,
    pub iChannelNumber: c_uint,
    pub iSubChannelNumber: c_uint,
    pub strChannelName: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub strInputFormat: [c_char; PVR_ADDON_INPUT_FORMAT_STRING_LENGTH],
    pub strStreamURL: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub iEncryptionSystem: c_uint,
    pub strIconPath: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub bIsHidden: bool,
}

/// `PVR_CHANNEL_GROUP`
#[repr(C)]
pub struct PvrChannelGroup {
    pub strGroupName: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub bIsRadio: bool,
    pub iPosition: c_uint,
}

/// `PVR_CHANNEL_GROUP_MEMBER`
#[repr(C)]
pub struct PvrChannelGroupMember {
    pub strGroupName: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub iChannelUniqueId: c_uint,
    pub iChannelNumber: c_uint,
}

/// `PVR_TIMER`
#[repr(C)]
pub struct PvrTimer {
    pub iClientIndex: c_uint,
    pub iParentClientIndex: c_uint,
    pub iClientChannelUid: c_int,
    pub startTime: time_t,
    pub endTime: time_t,
    pub bStartAnyTime: bool,
    pub bEndAnyTime: bool,
    /// `PVR_TIMER_STATE`, an int-sized enum on the host side
    pub state: c_int,
    pub iTimerType: c_uint,
    pub strTitle: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub strEpgSearchString: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub bFullTextEpgSearch: bool,
    pub strDirectory: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub strSummary: [c_char; PVR_ADDON_DESC_STRING_LENGTH],
    pub iPriority: c_int,
    pub iLifetime: c_int,
    pub iMaxRecordings: c_int,
    pub iRecordingGroup: c_uint,
    pub firstDay: time_t,
    pub iWeekdays: c_uint,
    pub iPreventDuplicateEpisodes: c_uint,
    pub iEpgUid: c_uint,
    pub iMarginStart: c_uint,
    pub iMarginEnd: c_uint,
    pub iGenreType: c_int,
    pub iGenreSubType: c_int,
}

/// `PVR_RECORDING`
#[repr(C)]
pub struct PvrRecording {
    pub strRecordingId: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub strTitle: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub strEpisodeName: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub iSeriesNumber: c_int,
    pub iEpisodeNumber: c_int,
    pub iYear: c_int,
    pub strStreamURL: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub strDirectory: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub strPlotOutline: [c_char; PVR_ADDON_DESC_STRING_LENGTH],
    pub strPlot: [c_char; PVR_ADDON_DESC_STRING_LENGTH],
    pub strChannelName: [c_char; PVR_ADDON_NAME_STRING_LENGTH],
    pub strIconPath: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub strThumbnailPath: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub strFanartPath: [c_char; PVR_ADDON_URL_STRING_LENGTH],
    pub recordingTime: time_t,
    pub iDuration: c_int,
    pub iPriority: c_int,
    pub iLifetime: c_int,
    pub iGenreType: c_int,
    pub iGenreSubType: c_int,
    pub iPlayCount: c_int,
    pub iLastPlayedPosition: c_int,
    pub bIsDeleted: bool,
    pub iEpgEventId: c_uint,
    pub iChannelUid: c_int,
    /// `PVR_RECORDING_CHANNEL_TYPE`
    pub channelType: c_int,
}

/// `EPG_TAG`; strings are borrowed and only valid during the transfer call
#[repr(C)]
pub struct EpgTagRaw {
    pub iUniqueBroadcastId: c_uint,
    pub strTitle: *const c_char,
    pub iChannelNumber: c_uint,
    pub startTime: time_t,
    pub endTime: time_t,
    pub strPlotOutline: *const c_char,
    pub strPlot: *const c_char,
    pub strOriginalTitle: *const c_char,
    pub strCast: *const c_char,
    pub strDirector: *const c_char,
    pub strWriter: *const c_char,
    pub iYear: c_int,
    pub strIMDBNumber: *const c_char,
    pub strIconPath: *const c_char,
    pub iGenreType: c_int,
    pub iGenreSubType: c_int,
    pub strGenreDescription: *const c_char,
    pub firstAired: time_t,
    pub iParentalRating: c_int,
    pub iStarRating: c_int,
    pub bNotify: bool,
    pub iSeriesNumber: c_int,
    pub iEpisodeNumber: c_int,
    pub iEpisodePartNumber: c_int,
    pub strEpisodeName: *const c_char,
    pub iFlags: c_uint,
}

/// Host-side zero initialisation (`memset(&s, 0, sizeof(s))`)
///
/// # Safety
/// `T` must be a plain C struct for which all-zero bytes is a valid value.
pub(crate) unsafe fn zeroed<T>() -> T {
    std::mem::zeroed()
}
