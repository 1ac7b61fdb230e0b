// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Shared session state.
//!
//! A `Session` owns everything the clock and the manual controls mutate:
//! grid parameters, auto mode controls, output routing and the notes that
//! are currently held down. It is shared behind a mutex so every measure
//! reads the latest state.

use std::collections::HashMap;
use std::time::Duration;

use crate::grid::{generate_grid, validate_width, GridParams, GridState, RowType};
use crate::music::{HarmonyError, MidiNote, Pitch, TensionLevel};
use crate::output::{
    send_note_offs, send_note_ons, OutputFailure, OutputRouter, OutputTarget, SharedSink,
    DEFAULT_VELOCITY,
};
use crate::timing::{beat_duration, MeasureClock};

use super::{
    select_target, validate_bpm, AutoDirection, AutoModeState, ChordTarget, Mood, Playable,
    Voicing,
};

/// Default time a running clock takes to reach a new tempo
pub const DEFAULT_TEMPO_RAMP: Duration = Duration::from_millis(1000);

/// A re-centering of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootChange {
    pub from: Pitch,
    pub to: Pitch,
}

/// Result of playing one chord
#[derive(Debug, Clone, PartialEq)]
pub struct PlayOutcome {
    pub chord_name: String,
    pub target: OutputTarget,
    /// Voiced notes that were sent note-on
    pub notes: Vec<MidiNote>,
    pub root_change: Option<RootChange>,
    /// Notes that could not be sent; the rest still went out
    pub failures: Vec<OutputFailure>,
}

/// Note-off armed by a measure, bound to the sink the note-ons went to
pub struct PendingRelease {
    sink: SharedSink,
    target: OutputTarget,
    notes: Vec<MidiNote>,
    delay: Duration,
}

impl PendingRelease {
    /// Time from note-on to note-off
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn notes(&self) -> &[MidiNote] {
        &self.notes
    }

    pub fn target(&self) -> OutputTarget {
        self.target
    }

    /// Send the note-offs now
    pub fn fire(self) -> Vec<OutputFailure> {
        send_note_offs(&self.sink, self.target, &self.notes)
    }
}

impl std::fmt::Debug for PendingRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRelease")
            .field("target", &self.target)
            .field("notes", &self.notes)
            .field("delay", &self.delay)
            .finish()
    }
}

/// What one clock measure did
#[derive(Debug)]
pub enum TickOutcome {
    /// Auto mode is off
    Inactive,
    /// Direction is `Rest`
    Rest,
    Played {
        play: PlayOutcome,
        release: PendingRelease,
    },
}

/// Notes turned on by a press, and where they went
struct HeldNotes {
    sink: SharedSink,
    notes: Vec<MidiNote>,
}

/// Engine state shared between the clock and manual controls
pub struct Session {
    params: GridParams,
    auto: AutoModeState,
    router: OutputRouter,
    held: HashMap<OutputTarget, HeldNotes>,
    clock: MeasureClock,
    clock_epoch: u64,
    voicing: Voicing,
    velocity: u8,
    tempo_ramp: Duration,
    last_chord: Option<String>,
}

impl Session {
    /// Create a session. Auto mode always starts inactive.
    ///
    /// Fails with `InvalidConfiguration` for a tempo or grid width outside
    /// the accepted range.
    pub fn new(
        params: GridParams,
        auto: AutoModeState,
        router: OutputRouter,
    ) -> Result<Self, HarmonyError> {
        validate_bpm(auto.bpm)?;
        validate_width(params.grid_width)?;

        let params = GridParams {
            current_root: params.current_root.simplify(),
            ..params
        };
        Ok(Self {
            params,
            auto: AutoModeState {
                is_active: false,
                ..auto
            },
            router,
            held: HashMap::new(),
            clock: MeasureClock::new(auto.bpm),
            clock_epoch: 0,
            voicing: Voicing::default(),
            velocity: DEFAULT_VELOCITY,
            tempo_ramp: DEFAULT_TEMPO_RAMP,
            last_chord: None,
        })
    }

    pub fn params(&self) -> GridParams {
        self.params
    }

    pub fn auto_state(&self) -> AutoModeState {
        self.auto
    }

    pub fn current_root(&self) -> Pitch {
        self.params.current_root
    }

    /// The grid for the current parameters, generated fresh
    pub fn grid(&self) -> GridState {
        generate_grid(&self.params)
    }

    pub fn clock(&self) -> &MeasureClock {
        &self.clock
    }

    /// Bumped on every activation and deactivation
    pub fn clock_epoch(&self) -> u64 {
        self.clock_epoch
    }

    pub fn last_chord(&self) -> Option<&str> {
        self.last_chord.as_deref()
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn router(&self) -> &OutputRouter {
        &self.router
    }

    /// Notes currently held down on a target
    pub fn held_notes(&self, target: OutputTarget) -> Vec<MidiNote> {
        self.held
            .get(&target)
            .map(|h| h.notes.clone())
            .unwrap_or_default()
    }

    /// Select (or clear) the external receiver. Held notes stay bound to
    /// the sink they were sent to.
    pub fn set_external_output(&mut self, external: Option<SharedSink>) {
        self.router.select_external(external);
        tracing::info!("Output routed to {}", self.router.current_target());
    }

    pub fn set_voicing(&mut self, voicing: Voicing) {
        self.voicing = voicing;
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<(), HarmonyError> {
        if !(1..=127).contains(&velocity) {
            return Err(HarmonyError::InvalidConfiguration(format!(
                "velocity must be 1-127, got {}",
                velocity
            )));
        }
        self.velocity = velocity;
        Ok(())
    }

    pub fn set_tempo_ramp(&mut self, ramp: Duration) {
        self.tempo_ramp = ramp;
    }

    /// Re-center the grid. Returns `None` when the root is unchanged.
    pub fn navigate(&mut self, root: Pitch) -> Option<RootChange> {
        let root = root.simplify();
        let from = self.params.current_root;
        if root == from {
            return None;
        }
        self.params.current_root = root;
        tracing::debug!("Root changed {} -> {}", from, root);
        Some(RootChange { from, to: root })
    }

    pub fn set_tension(&mut self, tension: TensionLevel) {
        self.params.tension_level = tension;
    }

    pub fn set_width(&mut self, width: usize) -> Result<(), HarmonyError> {
        validate_width(width)?;
        self.params.grid_width = width;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: AutoDirection) {
        self.auto.direction = direction;
    }

    /// Change tempo. A running clock ramps to it; an idle one takes it at once.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<(), HarmonyError> {
        let bpm = validate_bpm(bpm)?;
        self.auto.bpm = bpm;
        if self.clock.is_running() {
            self.clock.ramp_to(bpm, self.tempo_ramp);
        } else {
            self.clock.set_bpm(bpm);
        }
        Ok(())
    }

    /// Turn auto mode on and return the new clock epoch
    pub fn activate(&mut self) -> u64 {
        self.auto.is_active = true;
        self.clock_epoch += 1;
        self.clock.set_bpm(self.auto.bpm);
        self.clock.start();
        self.clock_epoch
    }

    /// Turn auto mode off. Clock tasks from earlier epochs stop ticking.
    pub fn deactivate(&mut self) {
        self.auto.is_active = false;
        self.clock_epoch += 1;
        self.clock.stop();
    }

    /// Play one measure of auto mode.
    ///
    /// Note-ons go out immediately; the matching note-offs are returned
    /// armed for one beat later rather than waited on.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.auto.is_active {
            return TickOutcome::Inactive;
        }

        let grid = self.grid();
        let Some(target) = select_target(self.auto.direction, &grid, self.params.current_root)
        else {
            self.clock.advance();
            return TickOutcome::Rest;
        };

        let notes = self.voicing.voice(target.tones());
        let (output, sink) = self.router.current();
        let failures = send_note_ons(&sink, output, &notes, self.velocity);
        self.clock.advance();

        let release = PendingRelease {
            sink,
            target: output,
            notes: notes.clone(),
            delay: beat_duration(self.auto.bpm),
        };
        let play = self.finish_play(&target, output, notes, failures);

        TickOutcome::Played { play, release }
    }

    /// Press a chord: release whatever is held, sound the new chord and
    /// remember its notes for the matching release.
    pub fn press(&mut self, target: &ChordTarget) -> PlayOutcome {
        let mut failures = self.release();

        let notes = self.voicing.voice(target.tones());
        let (output, sink) = self.router.current();
        failures.extend(send_note_ons(&sink, output, &notes, self.velocity));
        self.held.insert(
            output,
            HeldNotes {
                sink,
                notes: notes.clone(),
            },
        );

        self.finish_play(target, output, notes, failures)
    }

    /// Press the grid cell at `(row, col)` of the current grid
    pub fn press_cell(&mut self, row: RowType, col: i32) -> Result<PlayOutcome, HarmonyError> {
        let cell = self.grid().cell(row, col).cloned().ok_or_else(|| {
            HarmonyError::InvalidConfiguration(format!("no cell at {} column {}", row, col))
        })?;
        Ok(self.press(&ChordTarget::Grid(cell)))
    }

    /// Press the chord for a mood relative to the current root
    pub fn press_mood(&mut self, mood: Mood) -> PlayOutcome {
        let chord = mood.chord(self.params.current_root);
        self.press(&ChordTarget::Mood(chord))
    }

    /// Release exactly the notes recorded by earlier presses, on every target
    pub fn release(&mut self) -> Vec<OutputFailure> {
        let mut failures = Vec::new();
        for (target, held) in self.held.drain() {
            failures.extend(send_note_offs(&held.sink, target, &held.notes));
        }
        failures
    }

    fn finish_play(
        &mut self,
        target: &ChordTarget,
        output: OutputTarget,
        notes: Vec<MidiNote>,
        failures: Vec<OutputFailure>,
    ) -> PlayOutcome {
        let chord_name = target.full_name().to_string();
        self.last_chord = Some(chord_name.clone());
        let root_change = self.navigate(target.root());

        PlayOutcome {
            chord_name,
            target: output,
            notes,
            root_change,
            failures,
        }
    }
}
