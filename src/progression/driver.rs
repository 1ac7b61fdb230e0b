// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Progression driver.
//!
//! The `Engine` hosts the shared session on a tokio runtime. Auto mode runs
//! as a single clock task that ticks once per measure; note-offs are armed
//! as separate timer tasks so a measure never waits for its own release.
//! Everything observable is published on a broadcast channel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::grid::{GridParams, GridState, RowType};
use crate::music::{HarmonyError, Pitch, TensionLevel};
use crate::output::{OutputFailure, OutputRouter, OutputTarget, SharedSink, DEFAULT_VELOCITY};

use super::session::{PendingRelease, PlayOutcome, Session, TickOutcome, DEFAULT_TEMPO_RAMP};
use super::{AutoDirection, AutoModeState, ChordTarget, Mood, Voicing};

const EVENT_CAPACITY: usize = 256;

/// Initial engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub params: GridParams,
    /// `is_active` is ignored; auto mode starts with `set_auto_active`
    pub auto: AutoModeState,
    pub velocity: u8,
    pub tempo_ramp: Duration,
    pub voicing: Voicing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: GridParams::default(),
            auto: AutoModeState::default(),
            velocity: DEFAULT_VELOCITY,
            tempo_ramp: DEFAULT_TEMPO_RAMP,
            voicing: Voicing::default(),
        }
    }
}

/// Who triggered a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaySource {
    Auto,
    Manual,
}

impl fmt::Display for PlaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaySource::Auto => write!(f, "auto"),
            PlaySource::Manual => write!(f, "manual"),
        }
    }
}

/// Events published by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ChordPlayed { name: String, source: PlaySource },
    RootChanged { from: Pitch, to: Pitch },
    AutoStateChanged { active: bool },
    OutputError { target: OutputTarget, message: String },
}

struct ClockTask {
    epoch: u64,
    handle: JoinHandle<()>,
}

/// Harmonic navigation engine
pub struct Engine {
    session: Arc<Mutex<Session>>,
    events: broadcast::Sender<EngineEvent>,
    clock_task: Mutex<Option<ClockTask>>,
}

impl Engine {
    /// Build an engine playing on `synth` until an external output is selected
    pub fn new(config: EngineConfig, synth: SharedSink) -> Result<Self, HarmonyError> {
        let mut session = Session::new(config.params, config.auto, OutputRouter::new(synth))?;
        session.set_velocity(config.velocity)?;
        session.set_tempo_ramp(config.tempo_ramp);
        session.set_voicing(config.voicing);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            events,
            clock_task: Mutex::new(None),
        })
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Shared session handle
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    pub fn grid(&self) -> GridState {
        self.lock().grid()
    }

    pub fn current_root(&self) -> Pitch {
        self.lock().current_root()
    }

    pub fn auto_state(&self) -> AutoModeState {
        self.lock().auto_state()
    }

    pub fn last_chord(&self) -> Option<String> {
        self.lock().last_chord().map(str::to_string)
    }

    pub fn is_auto_active(&self) -> bool {
        self.lock().auto_state().is_active
    }

    /// Start or stop auto mode.
    ///
    /// Starting spawns the clock task; the first measure plays at once.
    /// Stopping prevents any further note-on. Note-offs already armed still
    /// fire so nothing is left sounding.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_auto_active(&self, active: bool) {
        let mut task = self
            .clock_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if active {
            if task.is_some() && self.is_auto_active() {
                return;
            }
            if let Some(old) = task.take() {
                old.handle.abort();
            }
            let epoch = self.lock().activate();
            let handle = tokio::spawn(run_clock(
                Arc::clone(&self.session),
                self.events.clone(),
                epoch,
            ));
            *task = Some(ClockTask { epoch, handle });
            tracing::info!("Auto mode started (clock epoch {})", epoch);
        } else {
            self.lock().deactivate();
            match task.take() {
                Some(old) => {
                    old.handle.abort();
                    tracing::info!("Auto mode stopped (clock epoch {})", old.epoch);
                }
                None => return,
            }
        }

        let _ = self.events.send(EngineEvent::AutoStateChanged { active });
    }

    /// Change tempo; a running clock ramps to it without restarting
    pub fn set_bpm(&self, bpm: f64) -> Result<(), HarmonyError> {
        self.lock().set_bpm(bpm)
    }

    pub fn set_direction(&self, direction: AutoDirection) {
        self.lock().set_direction(direction);
    }

    pub fn set_tension(&self, tension: TensionLevel) {
        self.lock().set_tension(tension);
    }

    pub fn set_width(&self, width: usize) -> Result<(), HarmonyError> {
        self.lock().set_width(width)
    }

    pub fn set_velocity(&self, velocity: u8) -> Result<(), HarmonyError> {
        self.lock().set_velocity(velocity)
    }

    /// Select (or clear) the external receiver
    pub fn set_external_output(&self, external: Option<SharedSink>) {
        self.lock().set_external_output(external);
    }

    /// Move the grid to a new root
    pub fn navigate(&self, root: Pitch) {
        let change = self.lock().navigate(root);
        if let Some(change) = change {
            let _ = self.events.send(EngineEvent::RootChanged {
                from: change.from,
                to: change.to,
            });
        }
    }

    /// Manual press of any target
    pub fn press(&self, target: &ChordTarget) -> PlayOutcome {
        let outcome = self.lock().press(target);
        publish_play(&self.events, &outcome, PlaySource::Manual);
        outcome
    }

    /// Manual press of a cell of the current grid
    pub fn press_cell(&self, row: RowType, col: i32) -> Result<PlayOutcome, HarmonyError> {
        let outcome = self.lock().press_cell(row, col)?;
        publish_play(&self.events, &outcome, PlaySource::Manual);
        Ok(outcome)
    }

    /// Manual press of a mood button
    pub fn press_mood(&self, mood: Mood) -> PlayOutcome {
        let outcome = self.lock().press_mood(mood);
        publish_play(&self.events, &outcome, PlaySource::Manual);
        outcome
    }

    /// Release every held note
    pub fn release(&self) {
        let failures = self.lock().release();
        publish_failures(&self.events, &failures);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Ok(mut task) = self.clock_task.lock() {
            if let Some(task) = task.take() {
                task.handle.abort();
            }
        }
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock loop: one measure per iteration, never overlapping.
///
/// Deadlines advance by the measure length read after each tick, so a tempo
/// change retimes the next wait without restarting the current one.
async fn run_clock(
    session: Arc<Mutex<Session>>,
    events: broadcast::Sender<EngineEvent>,
    epoch: u64,
) {
    let mut deadline = Instant::now();

    loop {
        let interval = {
            let mut session = lock_session(&session);
            if session.clock_epoch() != epoch {
                break;
            }
            match session.tick() {
                TickOutcome::Inactive => break,
                TickOutcome::Rest => {}
                TickOutcome::Played { play, release } => {
                    arm_release(release, events.clone());
                    publish_play(&events, &play, PlaySource::Auto);
                }
            }
            session.clock().measure_interval()
        };

        deadline = next_deadline(deadline, interval, Instant::now());
        sleep_until(deadline).await;
    }

    tracing::debug!("Clock task for epoch {} finished", epoch);
}

/// Deadline for the next measure. A tick that ran late pushes the grid back
/// so missed measures are dropped rather than fired back to back.
fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Instant {
    let next = deadline + interval;
    if next < now {
        tracing::warn!("Clock fell behind by {:?}, skipping missed measures", now - next);
        now + interval
    } else {
        next
    }
}

/// Fire a measure's note-offs after its delay on a detached task
fn arm_release(release: PendingRelease, events: broadcast::Sender<EngineEvent>) {
    let at = Instant::now() + release.delay();
    tokio::spawn(async move {
        sleep_until(at).await;
        let failures = release.fire();
        publish_failures(&events, &failures);
    });
}

fn publish_play(events: &broadcast::Sender<EngineEvent>, outcome: &PlayOutcome, source: PlaySource) {
    tracing::debug!("{} chord {} -> {:?}", source, outcome.chord_name, outcome.notes);
    let _ = events.send(EngineEvent::ChordPlayed {
        name: outcome.chord_name.clone(),
        source,
    });
    if let Some(change) = outcome.root_change {
        let _ = events.send(EngineEvent::RootChanged {
            from: change.from,
            to: change.to,
        });
    }
    publish_failures(events, &outcome.failures);
}

fn publish_failures(events: &broadcast::Sender<EngineEvent>, failures: &[OutputFailure]) {
    for failure in failures {
        let _ = events.send(EngineEvent::OutputError {
            target: failure.target,
            message: failure.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{shared, RecordingSink, SinkLog};

    fn engine(direction: AutoDirection) -> (Engine, SinkLog) {
        let synth = RecordingSink::new("synth");
        let log = synth.log();
        let config = EngineConfig {
            auto: AutoModeState {
                direction,
                ..Default::default()
            },
            ..Default::default()
        };
        (Engine::new(config, shared(synth)).unwrap(), log)
    }

    #[test]
    fn test_next_deadline_on_time() {
        let start = Instant::now();
        let measure = Duration::from_secs(2);
        assert_eq!(next_deadline(start, measure, start), start + measure);
        // Slightly late ticks keep the original grid
        assert_eq!(
            next_deadline(start, measure, start + Duration::from_millis(300)),
            start + measure
        );
    }

    #[test]
    fn test_next_deadline_after_stall() {
        let start = Instant::now();
        let measure = Duration::from_secs(2);
        let now = start + Duration::from_secs(7);
        // Three measures were missed; the next one is a full measure away
        assert_eq!(next_deadline(start, measure, now), now + measure);
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let config = EngineConfig {
            auto: AutoModeState {
                bpm: 500.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Engine::new(config, shared(RecordingSink::new("s"))).is_err());

        let config = EngineConfig {
            velocity: 0,
            ..Default::default()
        };
        assert!(Engine::new(config, shared(RecordingSink::new("s"))).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (engine, log) = engine(AutoDirection::Stay);
        engine.set_auto_active(true);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(log.note_ons(), vec![48, 64, 67]);
        assert_eq!(engine.last_chord().as_deref(), Some("C"));
        engine.set_auto_active(false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_tick_per_measure() {
        let (engine, log) = engine(AutoDirection::Stay);
        let start = Instant::now();
        engine.set_auto_active(true);

        // 120 bpm: a measure is 2 s
        tokio::time::sleep(Duration::from_millis(4500)).await;
        engine.set_auto_active(false);

        let starts: Vec<Duration> = log
            .events()
            .iter()
            .filter(|e| e.is_note_on() && e.note() == 48)
            .map(|e| e.at() - start)
            .collect();
        assert_eq!(
            starts,
            vec![Duration::ZERO, Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_published() {
        let (engine, _log) = engine(AutoDirection::Up);
        let mut events = engine.subscribe();

        engine.set_auto_active(true);
        tokio::time::sleep(Duration::from_millis(1)).await;
        engine.set_auto_active(false);

        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::AutoStateChanged { active: true }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::ChordPlayed {
                name: "G".to_string(),
                source: PlaySource::Auto
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::RootChanged {
                from: "C".parse().unwrap(),
                to: "G".parse().unwrap()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::AutoStateChanged { active: false }
        );
    }

    #[tokio::test]
    async fn test_manual_press_events() {
        let (engine, log) = engine(AutoDirection::Stay);
        let mut events = engine.subscribe();

        engine.press_mood(Mood::Sad);
        engine.release();

        assert_eq!(log.note_ons(), vec![57, 60, 64]);
        assert_eq!(log.note_offs(), vec![57, 60, 64]);
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::ChordPlayed {
                name: "Am".to_string(),
                source: PlaySource::Manual
            }
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            EngineEvent::RootChanged { .. }
        ));
        assert_eq!(engine.current_root(), "A".parse().unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_without_start_is_silent() {
        let (engine, _log) = engine(AutoDirection::Stay);
        let mut events = engine.subscribe();
        engine.set_auto_active(false);
        assert!(events.try_recv().is_err());
    }
}
