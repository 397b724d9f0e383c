use crate::dispatch::{DeviceIdentity, MessageHandler};
use crate::midi::{MidiEngine, MidiError, Result};
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Port names double as mapping keys, so whitespace is replaced.
pub fn sanitize_port_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Identity a session is routed under: the configured device name, not the
/// full port name it was matched against
pub fn session_identity(device_name: &str, port_index: usize) -> DeviceIdentity {
    DeviceIdentity::new(sanitize_port_name(device_name), port_index)
}

/// Lists the input ports currently visible to the MIDI backend
pub fn list_input_ports() -> Vec<String> {
    let mut devices = Vec::new();

    if let Ok(midi_in) = MidiInput::new("midiroute-list") {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                devices.push(sanitize_port_name(&name));
            }
        }
    }

    devices
}

/// A device session over midir: one input port with a callback installed,
/// and the matching output port when one exists
pub struct MidirEngine {
    identity: DeviceIdentity,
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
}

impl MidirEngine {
    /// Resolves a configured device name to an input port index
    pub fn find_port(name: &str) -> Result<usize> {
        let midi_in = MidiInput::new("midiroute-find")?;
        let wanted = sanitize_port_name(name);

        midi_in
            .ports()
            .iter()
            .position(|p| {
                let port_name = midi_in.port_name(p).unwrap_or_default();
                debug!("Checking port: {}", port_name);
                sanitize_port_name(&port_name).contains(&wanted)
            })
            .ok_or_else(|| MidiError::PortNotFound(name.to_string()))
    }

    /// Opens input port `port_index` and routes every inbound message to
    /// `handler` on the backend's callback thread, tagged with `device_name`.
    pub fn open<H: MessageHandler>(
        client_name: &str,
        device_name: &str,
        port_index: usize,
        handler: H,
    ) -> Result<Self> {
        let mut midi_in = MidiInput::new(&format!("{}-in", client_name))?;
        // Pass SysEx and timing, drop active sensing.
        midi_in.ignore(Ignore::ActiveSense);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .get(port_index)
            .ok_or_else(|| MidiError::PortNotFound(format!("input port {}", port_index)))?;
        let port_name = midi_in
            .port_name(in_port)
            .map_err(|e| MidiError::Connection(e.to_string()))?;
        let identity = session_identity(device_name, port_index);
        debug!("Binding port '{}' as {}", port_name, identity);

        let output = Self::open_output(client_name, &port_name, port_index);

        let callback_identity = identity.clone();
        let input = midi_in.connect(
            in_port,
            &format!("{}-input", client_name),
            move |_stamp, message, _| {
                handler.on_raw_message(&callback_identity, message);
            },
            (),
        )?;

        info!("Opened MIDI device {}", identity);
        Ok(MidirEngine {
            identity,
            input: Some(input),
            output,
        })
    }

    // Prefers the output port named like the input, then the same index.
    fn open_output(
        client_name: &str,
        port_name: &str,
        port_index: usize,
    ) -> Option<MidiOutputConnection> {
        let midi_out = match MidiOutput::new(&format!("{}-out", client_name)) {
            Ok(midi_out) => midi_out,
            Err(e) => {
                warn!("Cannot create MIDI output for {}: {}", port_name, e);
                return None;
            }
        };

        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n == port_name)
                    .unwrap_or(false)
            })
            .or_else(|| out_ports.get(port_index));

        let Some(out_port) = out_port else {
            warn!("No MIDI output for {}, session is input-only", port_name);
            return None;
        };

        match midi_out.connect(out_port, &format!("{}-output", client_name)) {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("Failed to open MIDI output for {}: {}", port_name, e);
                None
            }
        }
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Closes both ports; the callback is not invoked afterwards
    pub fn close(mut self) {
        if let Some(input) = self.input.take() {
            input.close();
        }
        if let Some(output) = self.output.take() {
            output.close();
        }
        info!("Closed MIDI device {}", self.identity);
    }
}

impl MidiEngine for MidirEngine {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let output = self.output.as_mut().ok_or_else(|| {
            MidiError::Send(format!("{} has no output port", self.identity))
        })?;
        debug!("Sending {:02X?} to {}", bytes, self.identity);
        output.send(bytes)?;
        Ok(())
    }
}
