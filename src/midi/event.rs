use super::engine::{MidiError, Result};
use super::status::{classify, EventKind};

/// A raw message decoded into its semantic fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedEvent {
    pub kind: EventKind,
    pub channel: u8,
    /// Byte at index 1, when the message has one
    pub key: Option<u8>,
    /// Byte at index 2 as a float, when the message has one
    pub value: Option<f32>,
}

impl DecodedEvent {
    /// Returns the key or fails if the message was too short to carry one
    pub fn require_key(&self) -> Result<u8> {
        self.key.ok_or(MidiError::MalformedMessage {
            len: 1,
            needed: 2,
        })
    }

    /// Returns the value or fails if the message was too short to carry one
    pub fn require_value(&self) -> Result<f32> {
        let len = if self.key.is_some() { 2 } else { 1 };
        self.value
            .ok_or(MidiError::MalformedMessage { len, needed: 3 })
    }
}

/// Decodes a raw message.
///
/// Key and value are read positionally whenever the bytes exist, whatever
/// payload length the classifier declares. A note on with zero velocity is
/// reported as a note off.
pub fn extract(raw: &[u8]) -> Result<DecodedEvent> {
    let status = classify(raw)?;

    let key = raw.get(1).copied();
    let velocity = raw.get(2).copied();

    let kind = match (status.kind, velocity) {
        (EventKind::NoteOn, Some(0)) => EventKind::NoteOff,
        (kind, _) => kind,
    };

    Ok(DecodedEvent {
        kind,
        channel: status.channel,
        key,
        value: velocity.map(f32::from),
    })
}
