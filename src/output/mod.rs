// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note output abstraction layer.
//!
//! This module provides a trait-based abstraction for the receivers that
//! chords are played on, allowing the built-in synth stand-in and an
//! external MIDI port to be used interchangeably.

pub mod midir_backend;
pub mod sinks;

use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::music::MidiNote;

pub use midir_backend::{list_midi_outputs, print_midi_outputs, MidirSink};
pub use sinks::{LogSink, RecordingSink, SinkEvent, SinkLog};

/// Default note-on velocity
pub const DEFAULT_VELOCITY: u8 = 100;

/// Errors raised while sending notes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The receiver refused the message
    #[error("send failed: {0}")]
    SendFailed(String),
    /// The receiver went away
    #[error("output disconnected: {0}")]
    Disconnected(String),
    /// A thread panicked while holding the sink
    #[error("output lock poisoned")]
    LockPoisoned,
}

/// Trait for note receivers.
///
/// Only note-on and note-off are ever sent. Implementations must not block
/// for long; they are called with the session lock held.
pub trait NoteSink: Send {
    /// Start a note
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<(), OutputError>;

    /// Stop a note
    fn note_off(&mut self, note: MidiNote) -> Result<(), OutputError>;

    /// Human-readable receiver name
    fn name(&self) -> &str;
}

/// A sink shared between the session and armed note-offs
pub type SharedSink = Arc<Mutex<dyn NoteSink>>;

/// Wrap a sink for sharing
pub fn shared<S: NoteSink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/// Which receiver a note went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    Synth,
    External,
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Synth => write!(f, "synth"),
            OutputTarget::External => write!(f, "external"),
        }
    }
}

/// Holds the synth sink and the optional external receiver.
///
/// The current receiver is resolved at call time: the external sink when one
/// is selected, otherwise the synth.
pub struct OutputRouter {
    synth: SharedSink,
    external: Option<SharedSink>,
}

impl OutputRouter {
    pub fn new(synth: SharedSink) -> Self {
        Self {
            synth,
            external: None,
        }
    }

    /// Select (or clear) the external receiver
    pub fn select_external(&mut self, external: Option<SharedSink>) {
        self.external = external;
    }

    /// Target that new notes go to
    pub fn current_target(&self) -> OutputTarget {
        if self.external.is_some() {
            OutputTarget::External
        } else {
            OutputTarget::Synth
        }
    }

    /// Current target together with its sink
    pub fn current(&self) -> (OutputTarget, SharedSink) {
        match &self.external {
            Some(sink) => (OutputTarget::External, Arc::clone(sink)),
            None => (OutputTarget::Synth, Arc::clone(&self.synth)),
        }
    }

    /// Sink for a specific target, if present
    pub fn sink(&self, target: OutputTarget) -> Option<SharedSink> {
        match target {
            OutputTarget::Synth => Some(Arc::clone(&self.synth)),
            OutputTarget::External => self.external.as_ref().map(Arc::clone),
        }
    }
}

/// One note that could not be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFailure {
    pub target: OutputTarget,
    pub note: MidiNote,
    pub error: OutputError,
}

impl fmt::Display for OutputFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} note {}: {}", self.target, self.note, self.error)
    }
}

/// Send note-on for every note, continuing past failures
pub fn send_note_ons(
    sink: &SharedSink,
    target: OutputTarget,
    notes: &[MidiNote],
    velocity: u8,
) -> Vec<OutputFailure> {
    send_each(sink, target, notes, |s, note| s.note_on(note, velocity))
}

/// Send note-off for every note, continuing past failures
pub fn send_note_offs(
    sink: &SharedSink,
    target: OutputTarget,
    notes: &[MidiNote],
) -> Vec<OutputFailure> {
    send_each(sink, target, notes, |s, note| s.note_off(note))
}

fn send_each<F>(
    sink: &SharedSink,
    target: OutputTarget,
    notes: &[MidiNote],
    mut send: F,
) -> Vec<OutputFailure>
where
    F: FnMut(&mut dyn NoteSink, MidiNote) -> Result<(), OutputError>,
{
    let mut guard = match sink.lock() {
        Ok(guard) => guard,
        Err(_) => {
            tracing::warn!("{} output lock poisoned, dropping {} notes", target, notes.len());
            return notes
                .iter()
                .map(|&note| OutputFailure {
                    target,
                    note,
                    error: OutputError::LockPoisoned,
                })
                .collect();
        }
    };

    let mut failures = Vec::new();
    for &note in notes {
        if let Err(error) = send(&mut *guard, note) {
            tracing::warn!("{} ({}) note {}: {}", target, guard.name(), note, error);
            failures.push(OutputFailure {
                target,
                note,
                error,
            });
        }
    }
    failures
}

/// MIDI message constants
pub mod messages {
    use crate::music::MidiNote;

    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;

    /// Note On for a channel (0-15)
    pub fn note_on_bytes(channel: u8, note: MidiNote, velocity: u8) -> [u8; 3] {
        [NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
    }

    /// Note Off for a channel (0-15), release velocity 0
    pub fn note_off_bytes(channel: u8, note: MidiNote) -> [u8; 3] {
        [NOTE_OFF | (channel & 0x0F), note & 0x7F, 0]
    }
}
