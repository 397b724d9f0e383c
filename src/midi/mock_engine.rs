use crate::dispatch::{DeviceIdentity, MessageHandler};
use crate::midi::{MidiEngine, Result};

/// In-memory device session: records outbound bytes and feeds injected
/// inbound messages through the same handler a real session would use
pub struct MockMidiEngine {
    identity: DeviceIdentity,
    handler: Box<dyn MessageHandler>,
    sent: Vec<Vec<u8>>,
}

impl MockMidiEngine {
    pub fn new<H: MessageHandler>(identity: DeviceIdentity, handler: H) -> Self {
        MockMidiEngine {
            identity,
            handler: Box::new(handler),
            sent: Vec::new(),
        }
    }

    /// Delivers a raw message as if it arrived from the device
    pub fn inject(&self, raw: &[u8]) {
        self.handler.on_raw_message(&self.identity, raw);
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }
}

impl MidiEngine for MockMidiEngine {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }
}
