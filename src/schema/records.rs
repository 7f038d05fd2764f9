use super::RecordKind;
use crate::pvr_record;

/// Channel uid the host treats as "no channel"
pub const CHANNEL_INVALID_UID: i64 = -1;

pvr_record! {
    /// Properties handed to the script's `ADDON_Create`
    pub struct AddonProps: RecordKind::Properties {
        user_path: String => "userPath" as Str,
        client_path: String => "clientPath" as Str,
        epg_max_days: i64 => "epgMaxDays" as Int,
    }
}

pvr_record! {
    pub struct Capabilities: RecordKind::Capabilities {
        supports_epg: bool => "supportsEPG" as Bool,
        supports_tv: bool => "supportsTV" as Bool,
        supports_radio: bool => "supportsRadio" as Bool,
        supports_recordings: bool => "supportsRecordings" as Bool,
        supports_recordings_undelete: bool => "supportsRecordingsUndelete" as Bool,
        supports_timers: bool => "supportsTimers" as Bool,
        supports_channel_groups: bool => "supportsChannelGroups" as Bool,
        supports_channel_scan: bool => "supportsChannelScan" as Bool,
        supports_channel_settings: bool => "supportsChannelSettings" as Bool,
        handles_input_stream: bool => "handlesInputStream" as Bool,
        handles_demuxing: bool => "handlesDemuxing" as Bool,
        supports_recording_play_count: bool => "supportsRecordingPlayCount" as Bool,
        supports_last_played_position: bool => "supportsLastPlayedPosition" as Bool,
        supports_recording_edl: bool => "supportsRecordingEdl" as Bool,
    }
}

pvr_record! {
    pub struct Channel: RecordKind::Channel {
        unique_id: i64 => "uniqueId" as Int,
        is_radio: bool => "isRadio" as Bool,
        channel_number: i64 => "channelNumber" as Int,
        sub_channel_number: i64 => "subChannelNumber" as Int,
        channel_name: String => "channelName" as Str,
        input_format: String => "inputFormat" as Str,
        stream_url: String => "streamURL" as Str,
        encryption_system: i64 => "encryptionSystem" as Int,
        icon_path: String => "iconPath" as Str,
        is_hidden: bool => "isHidden" as Bool,
    }
}

pvr_record! {
    pub struct ChannelGroup: RecordKind::ChannelGroup {
        group_name: String => "groupName" as Str,
        is_radio: bool => "isRadio" as Bool,
        position: i64 => "position" as Int,
    }
}

pvr_record! {
    pub struct ChannelGroupMember: RecordKind::ChannelGroupMember {
        group_name: String => "groupName" as Str,
        channel_unique_id: i64 => "channelUniqueId" as Int,
        channel_number: i64 => "channelNumber" as Int,
    }
}

pvr_record! {
    pub struct Timer: RecordKind::Timer {
        client_index: i64 => "clientIndex" as Int,
        parent_client_index: i64 => "parentClientIndex" as Int,
        client_channel_uid: i64 => "clientChannelUid" as Int,
        start_time: i64 => "startTime" as Time,
        end_time: i64 => "endTime" as Time,
        start_any_time: bool => "startAnyTime" as Bool,
        end_any_time: bool => "endAnyTime" as Bool,
        /// `PVR_TIMER_STATE` value
        state: i64 => "state" as Int,
        timer_type: i64 => "timerType" as Int,
        title: String => "title" as Str,
        epg_search_string: String => "epgSearchString" as Str,
        full_text_epg_search: bool => "fullTextEpgSearch" as Bool,
        directory: String => "directory" as Str,
        summary: String => "summary" as Str,
        priority: i64 => "priority" as Int,
        lifetime: i64 => "lifetime" as Int,
        max_recordings: i64 => "maxRecordings" as Int,
        recording_group: i64 => "recordingGroup" as Int,
        first_day: i64 => "firstDay" as Time,
        weekdays: i64 => "weekdays" as Int,
        prevent_duplicate_episodes: i64 => "preventDuplicateEpisodes" as Int,
        epg_uid: i64 => "epgUid" as Int,
        margin_start: i64 => "marginStart" as Int,
        margin_end: i64 => "marginEnd" as Int,
        genre_type: i64 => "genreType" as Int,
        genre_sub_type: i64 => "genreSubType" as Int,
    }
}

pvr_record! {
    pub struct Recording: RecordKind::Recording {
        recording_id: String => "recordingId" as Str,
        title: String => "title" as Str,
        episode_name: String => "episodeName" as Str,
        series_number: i64 => "seriesNumber" as Int,
        episode_number: i64 => "episodeNumber" as Int,
        year: i64 => "year" as Int,
        stream_url: String => "streamURL" as Str,
        directory: String => "directory" as Str,
        plot_outline: String => "plotOutline" as Str,
        plot: String => "plot" as Str,
        channel_name: String => "channelName" as Str,
        icon_path: String => "iconPath" as Str,
        thumbnail_path: String => "thumbnailPath" as Str,
        fanart_path: String => "fanartPath" as Str,
        recording_time: i64 => "recordingTime" as Time,
        duration: i64 => "duration" as Int,
        priority: i64 => "priority" as Int,
        lifetime: i64 => "lifetime" as Int,
        genre_type: i64 => "genreType" as Int,
        genre_sub_type: i64 => "genreSubType" as Int,
        play_count: i64 => "playCount" as Int,
        last_played_position: i64 => "lastPlayedPosition" as Int,
        is_deleted: bool => "isDeleted" as Bool,
        epg_event_id: i64 => "epgEventId" as Int,
        channel_uid: i64 => "channelUid" as Int = CHANNEL_INVALID_UID,
        /// `PVR_RECORDING_CHANNEL_TYPE` value
        channel_type: i64 => "channelType" as Int,
    }
}

pvr_record! {
    pub struct EpgTag: RecordKind::EpgTag {
        unique_broadcast_id: i64 => "uniqueBroadcastId" as Int,
        title: String => "title" as Str,
        channel_number: i64 => "channelNumber" as Int,
        start_time: i64 => "startTime" as Time,
        end_time: i64 => "endTime" as Time,
        plot_outline: String => "plotOutline" as Str,
        plot: String => "plot" as Str,
        original_title: String => "originalTitle" as Str,
        cast: String => "cast" as Str,
        director: String => "director" as Str,
        writer: String => "writer" as Str,
        year: i64 => "year" as Int,
        imdb_number: String => "IMDBNumber" as Str,
        icon_path: String => "iconPath" as Str,
        genre_type: i64 => "genreType" as Int,
        genre_sub_type: i64 => "genreSubType" as Int,
        genre_description: String => "genreDescription" as Str,
        first_aired: i64 => "firstAired" as Time,
        parental_rating: i64 => "parentalRating" as Int,
        star_rating: i64 => "starRating" as Int,
        notify: bool => "notify" as Bool,
        series_number: i64 => "seriesNumber" as Int,
        episode_number: i64 => "episodeNumber" as Int,
        episode_part_number: i64 => "episodePartNumber" as Int,
        episode_name: String => "episodeName" as Str,
        flags: i64 => "flags" as Int,
    }
}

pvr_record! {
    /// Drive space in KiB, as returned by the script's `GetDriveSpace`
    pub struct DriveSpace: RecordKind::DriveSpace {
        total: i64 => "total" as Int,
        used: i64 => "used" as Int,
    }
}
