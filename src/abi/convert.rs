//! Record ↔ host struct conversions
//!
//! Integers are narrowed with C assignment semantics (`as`), strings are
//! copied into fixed buffers and always NUL-terminated.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint};

use libc::time_t;

use super::types::*;
use crate::errors::{BridgeError, Result};
use crate::schema::{AddonProps, Capabilities, Channel, ChannelGroup, ChannelGroupMember, EpgTag, Recording, Timer};

/// Copy `src` into a fixed C buffer.
///
/// Stops at the first interior NUL, truncates on a UTF-8 boundary so the
/// result fits in `buf.len() - 1` bytes, and zero-fills the remainder.
pub fn copy_str(buf: &mut [c_char], src: &str) {
    if buf.is_empty() {
        return;
    }

    let src = src.split('\0').next().unwrap_or_default();
    let mut end = src.len().min(buf.len() - 1);
    while !src.is_char_boundary(end) {
        end -= 1;
    }

    for (dst, byte) in buf.iter_mut().zip(&src.as_bytes()[..end]) {
        *dst = *byte as c_char;
    }
    for dst in &mut buf[end..] {
        *dst = 0;
    }
}

/// Read a NUL-terminated fixed buffer back into a `String`
pub fn read_str(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Read a borrowed C string; null reads as empty
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn read_cstr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// `CString` that never fails: interior NULs cut the string
pub fn to_cstring(s: &str) -> CString {
    let head = s.split('\0').next().unwrap_or_default();
    CString::new(head).unwrap_or_default()
}

impl From<&Capabilities> for PvrAddonCapabilities {
    fn from(caps: &Capabilities) -> Self {
        Self {
            bSupportsEPG: caps.supports_epg,
            bSupportsTV: caps.supports_tv,
            bSupportsRadio: caps.supports_radio,
            bSupportsRecordings: caps.supports_recordings,
            bSupportsRecordingsUndelete: caps.supports_recordings_undelete,
            bSupportsTimers: caps.supports_timers,
            bSupportsChannelGroups: caps.supports_channel_groups,
            bSupportsChannelScan: caps.supports_channel_scan,
            bSupportsChannelSettings: caps.supports_channel_settings,
            bHandlesInputStream: caps.handles_input_stream,
            bHandlesDemuxing: caps.handles_demuxing,
            bSupportsRecordingPlayCount: caps.supports_recording_play_count,
            bSupportsLastPlayedPosition: caps.supports_last_played_position,
            bSupportsRecordingEdl: caps.supports_recording_edl,
        }
    }
}

impl From<&Channel> for PvrChannel {
    fn from(channel: &Channel) -> Self {
        let mut raw: PvrChannel = unsafe { zeroed() };
        raw.iUniqueId = channel.unique_id as c_uint;
        raw.bIsRadio = channel.is_radio;
        raw.iChannelNumber = channel.channel_number as c_uint;
        raw.iSubChannelNumber = channel.sub_channel_number as c_uint;
        copy_str(&mut raw.strChannelName, &channel.channel_name);
        copy_str(&mut raw.strInputFormat, &channel.input_format);
        copy_str(&mut raw.strStreamURL, &channel.stream_url);
        raw.iEncryptionSystem = channel.encryption_system as c_uint;
        copy_str(&mut raw.strIconPath, &channel.icon_path);
        raw.bIsHidden = channel.is_hidden;
        raw
    }
}

impl From<&PvrChannel> for Channel {
    fn from(raw: &PvrChannel) -> Self {
        Self {
            unique_id: raw.iUniqueId as i64,
            is_radio: raw.bIsRadio,
            channel_number: raw.iChannelNumber as i64,
            sub_channel_number: raw.iSubChannelNumber as i64,
            channel_name: read_str(&raw.strChannelName),
            input_format: read_str(&raw.strInputFormat),
            stream_url: read_str(&raw.strStreamURL),
            encryption_system: raw.iEncryptionSystem as i64,
            icon_path: read_str(&raw.strIconPath),
            is_hidden: raw.bIsHidden,
        }
    }
}

impl From<&ChannelGroup> for PvrChannelGroup {
    fn from(group: &ChannelGroup) -> Self {
        let mut raw: PvrChannelGroup = unsafe { zeroed() };
        copy_str(&mut raw.strGroupName, &group.group_name);
        raw.bIsRadio = group.is_radio;
        raw.iPosition = group.position as c_uint;
        raw
    }
}

impl From<&PvrChannelGroup> for ChannelGroup {
    fn from(raw: &PvrChannelGroup) -> Self {
        Self {
            group_name: read_str(&raw.strGroupName),
            is_radio: raw.bIsRadio,
            position: raw.iPosition as i64,
        }
    }
}

impl From<&ChannelGroupMember> for PvrChannelGroupMember {
    fn from(member: &ChannelGroupMember) -> Self {
        let mut raw: PvrChannelGroupMember = unsafe { zeroed() };
        copy_str(&mut raw.strGroupName, &member.group_name);
        raw.iChannelUniqueId = member.channel_unique_id as c_uint;
        raw.iChannelNumber = member.channel_number as c_uint;
        raw
    }
}

impl From<&Timer> for PvrTimer {
    fn from(timer: &Timer) -> Self {
        let mut raw: PvrTimer = unsafe { zeroed() };
        raw.iClientIndex = timer.client_index as c_uint;
        raw.iParentClientIndex = timer.parent_client_index as c_uint;
        raw.iClientChannelUid = timer.client_channel_uid as c_int;
        raw.startTime = timer.start_time as time_t;
        raw.endTime = timer.end_time as time_t;
        raw.bStartAnyTime = timer.start_any_time;
        raw.bEndAnyTime = timer.end_any_time;
        raw.state = timer.state as c_int;
        raw.iTimerType = timer.timer_type as c_uint;
        copy_str(&mut raw.strTitle, &timer.title);
        copy_str(&mut raw.strEpgSearchString, &timer.epg_search_string);
        raw.bFullTextEpgSearch = timer.full_text_epg_search;
        copy_str(&mut raw.strDirectory, &timer.directory);
        copy_str(&mut raw.strSummary, &timer.summary);
        raw.iPriority = timer.priority as c_int;
        raw.iLifetime = timer.lifetime as c_int;
        raw.iMaxRecordings = timer.max_recordings as c_int;
        raw.iRecordingGroup = timer.recording_group as c_uint;
        raw.firstDay = timer.first_day as time_t;
        raw.iWeekdays = timer.weekdays as c_uint;
        raw.iPreventDuplicateEpisodes = timer.prevent_duplicate_episodes as c_uint;
        raw.iEpgUid = timer.epg_uid as c_uint;
        raw.iMarginStart = timer.margin_start as c_uint;
        raw.iMarginEnd = timer.margin_end as c_uint;
        raw.iGenreType = timer.genre_type as c_int;
        raw.iGenreSubType = timer.genre_sub_type as c_int;
        raw
    }
}

impl From<&Recording> for PvrRecording {
    fn from(rec: &Recording) -> Self {
        let mut raw: PvrRecording = unsafe { zeroed() };
        copy_str(&mut raw.strRecordingId, &rec.recording_id);
        copy_str(&mut raw.strTitle, &rec.title);
        copy_str(&mut raw.strEpisodeName, &rec.episode_name);
        raw.iSeriesNumber = rec.series_number as c_int;
        raw.iEpisodeNumber = rec.episode_number as c_int;
        raw.iYear = rec.year as c_int;
        copy_str(&mut raw.strStreamURL, &rec.stream_url);
        copy_str(&mut raw.strDirectory, &rec.directory);
        copy_str(&mut raw.strPlotOutline, &rec.plot_outline);
        copy_str(&mut raw.strPlot, &rec.plot);
        copy_str(&mut raw.strChannelName, &rec.channel_name);
        copy_str(&mut raw.strIconPath, &rec.icon_path);
        copy_str(&mut raw.strThumbnailPath, &rec.thumbnail_path);
        copy_str(&mut raw.strFanartPath, &rec.fanart_path);
        raw.recordingTime = rec.recording_time as time_t;
        raw.iDuration = rec.duration as c_int;
        raw.iPriority = rec.priority as c_int;
        raw.iLifetime = rec.lifetime as c_int;
        raw.iGenreType = rec.genre_type as c_int;
        raw.iGenreSubType = rec.genre_sub_type as c_int;
        raw.iPlayCount = rec.play_count as c_int;
        raw.iLastPlayedPosition = rec.last_played_position as c_int;
        raw.bIsDeleted = rec.is_deleted;
        raw.iEpgEventId = rec.epg_event_id as c_uint;
        raw.iChannelUid = rec.channel_uid as c_int;
        raw.channelType = rec.channel_type as c_int;
        raw
    }
}

/// An `EPG_TAG` together with the strings it points into
pub struct OwnedEpgTag {
    raw: EpgTagRaw,
    _strings: Vec<CString>,
}

impl OwnedEpgTag {
    pub fn as_ptr(&self) -> *const EpgTagRaw {
        &self.raw
    }

    pub fn raw(&self) -> &EpgTagRaw {
        &self.raw
    }
}

impl From<&EpgTag> for OwnedEpgTag {
    fn from(tag: &EpgTag) -> Self {
        let mut strings = Vec::with_capacity(13);
        let mut hold = |s: &str| -> *const c_char {
            let owned = to_cstring(s);
            // The heap buffer does not move when the CString itself moves
            let ptr = owned.as_ptr();
            strings.push(owned);
            ptr
        };

        let raw = EpgTagRaw {
            iUniqueBroadcastId: tag.unique_broadcast_id as c_uint,
            strTitle: hold(&tag.title),
            iChannelNumber: tag.channel_number as c_uint,
            startTime: tag.start_time as time_t,
            endTime: tag.end_time as time_t,
            strPlotOutline: hold(&tag.plot_outline),
            strPlot: hold(&tag.plot),
            strOriginalTitle: hold(&tag.original_title),
            strCast: hold(&tag.cast),
            strDirector: hold(&tag.director),
            strWriter: hold(&tag.writer),
            iYear: tag.year as c_int,
            strIMDBNumber: hold(&tag.imdb_number),
            strIconPath: hold(&tag.icon_path),
            iGenreType: tag.genre_type as c_int,
            iGenreSubType: tag.genre_sub_type as c_int,
            strGenreDescription: hold(&tag.genre_description),
            firstAired: tag.first_aired as time_t,
            iParentalRating: tag.parental_rating as c_int,
            iStarRating: tag.star_rating as c_int,
            bNotify: tag.notify,
            iSeriesNumber: tag.series_number as c_int,
            iEpisodeNumber: tag.episode_number as c_int,
            iEpisodePartNumber: tag.episode_part_number as c_int,
            strEpisodeName: hold(&tag.episode_name),
            iFlags: tag.flags as c_uint,
        };

        Self {
            raw,
            _strings: strings,
        }
    }
}

/// Copy the host's `PVR_PROPERTIES`
///
/// # Safety
/// `props` must be null or point to a readable `PVR_PROPERTIES` whose string
/// members are null or NUL-terminated.
pub unsafe fn read_props(props: *const PvrProperties) -> Result<AddonProps> {
    let props = props
        .as_ref()
        .ok_or_else(|| BridgeError::InvalidProperties("null properties".to_string()))?;
    let client_path = read_cstr(props.strClientPath);
    if client_path.is_empty() {
        return Err(BridgeError::InvalidProperties("empty client path".to_string()));
    }
    Ok(AddonProps {
        user_path: read_cstr(props.strUserPath),
        client_path,
        epg_max_days: props.iEpgMaxDays as i64,
    })
}
