//! Routing of decoded events into the shared configuration mapping
//!
//! Every device session hands its inbound messages to a [`MessageHandler`].
//! The [`Dispatcher`] decodes them and, under one global lock, asks the
//! mapping to shape and apply the value.

use crate::midi::{classify, extract, DecodedEvent, MidiError, Result};
use log::{debug, error, trace, warn};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Name and port index of an open device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub name: String,
    pub port: usize,
}

impl DeviceIdentity {
    pub fn new(name: impl Into<String>, port: usize) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

/// Configuration mapping fed by the dispatcher.
///
/// All methods are called with the mapping already locked, so an
/// implementation must never try to lock its own [`SharedMapping`].
pub trait ConfigMapping {
    /// Handle to a registered target
    type Target;

    /// Whether `(device, key)` is a registered target
    fn exists(&self, device: &str, key: u8) -> bool;

    /// Resolves the target registered for `(device, key)`
    fn get_target(&self, device: &str, key: u8) -> Option<Self::Target>;

    /// Shapes `value` in place. Returns false to reject the event.
    fn shape(
        &mut self,
        target: &Self::Target,
        device: &str,
        kind: &str,
        key: u8,
        value: &mut f32,
    ) -> bool;

    /// Stores a shaped value into the target
    fn apply(&mut self, target: &Self::Target, device: &str, key: u8, value: f32);
}

/// Lock-guarded mapping shared between the dispatcher and external readers
pub type SharedMapping<M> = Arc<Mutex<M>>;

pub fn create_shared_mapping<M: ConfigMapping>(mapping: M) -> SharedMapping<M> {
    Arc::new(Mutex::new(mapping))
}

/// What a single dispatch did to the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Value shaped and applied
    Applied,
    /// No target registered for the device/key pair
    UnknownKey,
    /// The mapping declined to shape the value
    ShapeRejected,
}

/// Receives raw messages from a device session
pub trait MessageHandler: Send + 'static {
    fn on_raw_message(&self, device: &DeviceIdentity, raw: &[u8]);
}

pub struct Dispatcher<M> {
    mapping: SharedMapping<M>,
}

impl<M> Clone for Dispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            mapping: Arc::clone(&self.mapping),
        }
    }
}

impl<M: ConfigMapping> Dispatcher<M> {
    pub fn new(mapping: SharedMapping<M>) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &SharedMapping<M> {
        &self.mapping
    }

    /// Applies one decoded event to the mapping.
    ///
    /// Lookup, shape and apply run under a single lock acquisition, so at most
    /// one shape/apply pair executes at a time across all devices.
    pub fn dispatch(
        &self,
        device: &DeviceIdentity,
        event: &DecodedEvent,
    ) -> Result<DispatchOutcome> {
        let key = event.require_key()?;
        let mut value = event.require_value()?;

        let mut mapping = match self.mapping.lock() {
            Ok(guard) => guard,
            Err(_) => {
                error!("Configuration mapping lock poisoned, cannot guarantee consistency");
                std::process::exit(1);
            }
        };

        if !mapping.exists(&device.name, key) {
            trace!("No target for {} key {}", device, key);
            return Ok(DispatchOutcome::UnknownKey);
        }
        let target = match mapping.get_target(&device.name, key) {
            Some(target) => target,
            None => return Ok(DispatchOutcome::UnknownKey),
        };

        if !mapping.shape(&target, &device.name, event.kind.as_str(), key, &mut value) {
            debug!(
                "Target for {} key {} rejected {} value",
                device, key, event.kind
            );
            return Ok(DispatchOutcome::ShapeRejected);
        }

        mapping.apply(&target, &device.name, key, value);
        debug!("Applied {} key {} = {}", device, key, value);
        Ok(DispatchOutcome::Applied)
    }

    /// Decodes and dispatches one raw message
    pub fn handle_raw(&self, device: &DeviceIdentity, raw: &[u8]) -> Result<DispatchOutcome> {
        let event = extract(raw)?;
        self.dispatch(device, &event)
    }

    /// Like [`MessageHandler::on_raw_message`] but hands back the decoded event
    /// and outcome, for callers that report what happened.
    pub fn process(
        &self,
        device: &DeviceIdentity,
        raw: &[u8],
    ) -> Option<(DecodedEvent, Result<DispatchOutcome>)> {
        match extract(raw) {
            Ok(event) => {
                let outcome = self.dispatch(device, &event);
                if let Err(e) = &outcome {
                    log_skipped(device, raw, e);
                }
                Some((event, outcome))
            }
            Err(e) => {
                log_skipped(device, raw, &e);
                None
            }
        }
    }
}

impl<M> MessageHandler for Dispatcher<M>
where
    M: ConfigMapping + Send + 'static,
{
    fn on_raw_message(&self, device: &DeviceIdentity, raw: &[u8]) {
        self.process(device, raw);
    }
}

// Short system messages (timing ticks, transport) are routine and carry no key.
fn log_skipped(device: &DeviceIdentity, raw: &[u8], err: &MidiError) {
    if is_routine_skip(raw) {
        trace!("Skipping message from {}: {:02X?} ({})", device, raw, err);
    } else {
        warn!("Skipping message from {}: {:02X?} ({})", device, raw, err);
    }
}

/// True when a skipped message is not a channel message, so it is logged
/// at trace level rather than as a warning
pub fn is_routine_skip(raw: &[u8]) -> bool {
    match classify(raw) {
        Ok(status) => !status.kind.is_channel_message(),
        Err(_) => false,
    }
}
