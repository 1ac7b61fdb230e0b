// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-process note sinks.
//!
//! `LogSink` stands in for the synth voice and only logs. `RecordingSink`
//! captures every message with a timestamp for dry runs and tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::music::MidiNote;

use super::{NoteSink, OutputError};

/// Synth stand-in that logs notes through `tracing`
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("synth")
    }
}

impl NoteSink for LogSink {
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<(), OutputError> {
        tracing::info!("[{}] note on  {:3} vel {}", self.name, note, velocity);
        Ok(())
    }

    fn note_off(&mut self, note: MidiNote) -> Result<(), OutputError> {
        tracing::info!("[{}] note off {:3}", self.name, note);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A captured message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    NoteOn {
        note: MidiNote,
        velocity: u8,
        at: Instant,
    },
    NoteOff {
        note: MidiNote,
        at: Instant,
    },
}

impl SinkEvent {
    pub fn note(&self) -> MidiNote {
        match *self {
            SinkEvent::NoteOn { note, .. } | SinkEvent::NoteOff { note, .. } => note,
        }
    }

    pub fn at(&self) -> Instant {
        match *self {
            SinkEvent::NoteOn { at, .. } | SinkEvent::NoteOff { at, .. } => at,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, SinkEvent::NoteOn { .. })
    }
}

/// Read handle onto a `RecordingSink`'s captured events
#[derive(Debug, Clone, Default)]
pub struct SinkLog {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl SinkLog {
    /// Snapshot of every event so far
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn note_ons(&self) -> Vec<MidiNote> {
        self.events()
            .iter()
            .filter(|e| e.is_note_on())
            .map(SinkEvent::note)
            .collect()
    }

    pub fn note_offs(&self) -> Vec<MidiNote> {
        self.events()
            .iter()
            .filter(|e| !e.is_note_on())
            .map(SinkEvent::note)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn push(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Sink that records every message it receives
#[derive(Debug, Clone)]
pub struct RecordingSink {
    name: String,
    log: SinkLog,
    failing: HashSet<MidiNote>,
}

impl RecordingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: SinkLog::default(),
            failing: HashSet::new(),
        }
    }

    /// Make every message for `note` fail with `SendFailed`
    pub fn fail_on(mut self, note: MidiNote) -> Self {
        self.failing.insert(note);
        self
    }

    /// Handle for reading captured events after the sink is shared
    pub fn log(&self) -> SinkLog {
        self.log.clone()
    }

    fn check(&self, note: MidiNote) -> Result<(), OutputError> {
        if self.failing.contains(&note) {
            Err(OutputError::SendFailed(format!(
                "{} rejected note {}",
                self.name, note
            )))
        } else {
            Ok(())
        }
    }
}

impl NoteSink for RecordingSink {
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<(), OutputError> {
        self.check(note)?;
        self.log.push(SinkEvent::NoteOn {
            note,
            velocity,
            at: Instant::now(),
        });
        Ok(())
    }

    fn note_off(&mut self, note: MidiNote) -> Result<(), OutputError> {
        self.check(note)?;
        self.log.push(SinkEvent::NoteOff {
            note,
            at: Instant::now(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
