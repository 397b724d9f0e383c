//! MIDI functionality for midiroute
//!
//! This module provides:
//! - Status byte classification into a closed [`EventKind`]
//! - Decoding of raw messages into [`DecodedEvent`]s
//! - Device sessions via midir, plus a mock session for testing
//!
//! The main components are:
//! - [`classify`] and [`extract`], the pure decode pipeline
//! - [`MidiEngine`] trait for an open device session
//! - [`MidirEngine`] for real MIDI device communication
//! - [`MockMidiEngine`] for testing
//!
mod engine;
mod event;
pub mod midir_engine;
pub mod mock_engine;
pub mod status;

pub use engine::{controller_change_bytes, MidiEngine, MidiError, Result};
pub use event::{extract, DecodedEvent};
pub use status::{classify, EventKind, Status};

pub use midir_engine::{list_input_ports, MidirEngine};
pub use mock_engine::MockMidiEngine;

// Set default engine type
pub type DefaultMidiEngine = MidirEngine;
