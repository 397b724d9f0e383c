//! Status byte classification
//!
//! Splits the first byte of a raw MIDI message into its status class and
//! channel, and maps the class onto a closed [`EventKind`].

use super::engine::{MidiError, Result};
use serde::Deserialize;
use std::fmt;

// Channel message status classes (high nibble)
pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const KEY_PRESSURE: u8 = 0xA0;
pub const CONTROLLER_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;

// System messages occupy the full byte
pub const SYSTEM_EXCLUSIVE: u8 = 0xF0;
pub const SONG_POSITION: u8 = 0xF2;
pub const SONG_SELECT: u8 = 0xF3;
pub const TUNE_REQUEST: u8 = 0xF6;
pub const TIMING_TICK: u8 = 0xF8;
pub const START_SONG: u8 = 0xFA;
pub const CONTINUE_SONG: u8 = 0xFB;
pub const STOP_SONG: u8 = 0xFC;
pub const ACTIVE_SENSING: u8 = 0xFE;

/// MMC transport commands are only recognised in this exact SysEx length.
const MMC_MESSAGE_LEN: usize = 6;
/// Index of the MMC command byte inside the SysEx frame.
const MMC_COMMAND_INDEX: usize = 4;

/// Semantic type of a decoded MIDI message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NoteOff,
    NoteOn,
    KeyPressure,
    ControllerChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    SongPosition,
    SongSelect,
    TuneRequest,
    TimingTick,
    StartSong,
    ContinueSong,
    StopSong,
    MmcStop,
    MmcPlay,
    MmcFastForward,
    MmcRewind,
    MmcRecord,
    MmcPause,
    /// Status byte not present in the classification table
    Unrecognized,
}

impl EventKind {
    /// Name of the kind as handed to mapping collaborators
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NoteOff => "note_off",
            EventKind::NoteOn => "note_on",
            EventKind::KeyPressure => "key_pressure",
            EventKind::ControllerChange => "controller_change",
            EventKind::ProgramChange => "program_change",
            EventKind::ChannelPressure => "channel_pressure",
            EventKind::PitchBend => "pitch_bend",
            EventKind::SongPosition => "song_position",
            EventKind::SongSelect => "song_select",
            EventKind::TuneRequest => "tune_request",
            EventKind::TimingTick => "timing_tick",
            EventKind::StartSong => "start_song",
            EventKind::ContinueSong => "continue_song",
            EventKind::StopSong => "stop_song",
            EventKind::MmcStop => "mmc_stop",
            EventKind::MmcPlay => "mmc_play",
            EventKind::MmcFastForward => "mmc_fast_forward",
            EventKind::MmcRewind => "mmc_rewind",
            EventKind::MmcRecord => "mmc_record",
            EventKind::MmcPause => "mmc_pause",
            EventKind::Unrecognized => "unrecognized",
        }
    }

    /// Returns true for the seven channel-addressed kinds
    pub fn is_channel_message(&self) -> bool {
        matches!(
            self,
            EventKind::NoteOff
                | EventKind::NoteOn
                | EventKind::KeyPressure
                | EventKind::ControllerChange
                | EventKind::ProgramChange
                | EventKind::ChannelPressure
                | EventKind::PitchBend
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub kind: EventKind,
    /// 0-15 for channel messages, always 0 for system messages
    pub channel: u8,
    /// Payload length the table declares for this kind (0 or 2)
    pub expected_bytes: usize,
}

/// Classifies a raw message by its status byte.
///
/// Only the first byte is inspected, except for System Exclusive where a
/// six byte frame is read as an MMC transport command.
pub fn classify(raw: &[u8]) -> Result<Status> {
    let first = *raw.first().ok_or(MidiError::MalformedMessage {
        len: 0,
        needed: 1,
    })?;

    let (status, channel) = if first & 0xF0 != 0xF0 {
        (first & 0xF0, first & 0x0F)
    } else {
        (first, 0)
    };

    let (kind, expected_bytes) = match status {
        NOTE_OFF => (EventKind::NoteOff, 2),
        NOTE_ON => (EventKind::NoteOn, 2),
        KEY_PRESSURE => (EventKind::KeyPressure, 2),
        CONTROLLER_CHANGE => (EventKind::ControllerChange, 2),
        PROGRAM_CHANGE => (EventKind::ProgramChange, 2),
        CHANNEL_PRESSURE => (EventKind::ChannelPressure, 2),
        PITCH_BEND => (EventKind::PitchBend, 2),
        SYSTEM_EXCLUSIVE => (classify_sysex(raw), 0),
        SONG_POSITION => (EventKind::SongPosition, 2),
        SONG_SELECT => (EventKind::SongSelect, 2),
        TUNE_REQUEST => (EventKind::TuneRequest, 2),
        TIMING_TICK => (EventKind::TimingTick, 0),
        START_SONG => (EventKind::StartSong, 0),
        CONTINUE_SONG => (EventKind::ContinueSong, 0),
        STOP_SONG => (EventKind::StopSong, 0),
        _ => (EventKind::Unrecognized, 0),
    };

    Ok(Status {
        kind,
        channel,
        expected_bytes,
    })
}

// Unmapped MMC commands and other SysEx lengths stay unrecognized.
fn classify_sysex(raw: &[u8]) -> EventKind {
    if raw.len() != MMC_MESSAGE_LEN {
        return EventKind::Unrecognized;
    }

    match raw[MMC_COMMAND_INDEX] {
        1 => EventKind::MmcStop,
        2 => EventKind::MmcPlay,
        4 => EventKind::MmcFastForward,
        5 => EventKind::MmcRewind,
        6 => EventKind::MmcRecord,
        9 => EventKind::MmcPause,
        _ => EventKind::Unrecognized,
    }
}
