use super::status::CONTROLLER_CHANGE;
use crate::dispatch::DeviceIdentity;
use thiserror::Error;

/// Custom error type for MIDI operations
#[derive(Error, Debug)]
pub enum MidiError {
    /// Raw message too short for the field being read
    #[error("malformed MIDI message: {len} byte(s), needed at least {needed}")]
    MalformedMessage { len: usize, needed: usize },

    /// Error when initialising the MIDI backend
    #[error("MIDI init error: {0}")]
    Init(String),

    /// Error when connecting to a MIDI device
    #[error("MIDI connection error: {0}")]
    Connection(String),

    /// No port matched the requested name or index
    #[error("MIDI port not found: {0}")]
    PortNotFound(String),

    /// Error when sending a MIDI message
    #[error("MIDI send error: {0}")]
    Send(String),
}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::Init(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for MidiError {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        MidiError::Connection(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for MidiError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        MidiError::Connection(e.to_string())
    }
}

impl From<midir::SendError> for MidiError {
    fn from(e: midir::SendError) -> Self {
        MidiError::Send(e.to_string())
    }
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Frames an outbound Controller Change. Always addressed to channel 0.
pub fn controller_change_bytes(key: u8, value: u8) -> [u8; 3] {
    [CONTROLLER_CHANGE, key, value]
}

/// An open device session: an input/output port pair bound to one device
pub trait MidiEngine: Send {
    /// Identity inbound messages from this session are routed under
    fn identity(&self) -> &DeviceIdentity;

    /// Sends raw bytes to the device output
    fn send_raw(&mut self, bytes: &[u8]) -> Result<()>;

    /// Sends a single Controller Change message, fire-and-forget
    fn send_cc(&mut self, key: u8, value: u8) -> Result<()> {
        self.send_raw(&controller_change_bytes(key, value))
    }
}
