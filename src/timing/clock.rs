// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Measure clock.
//!
//! This module provides a BPM-based clock that advances once per measure
//! (four beats) and supports live tempo ramps. It uses tokio's `Instant` so
//! that paused-time tests see exact durations.

use std::time::Duration;

use tokio::time::Instant;

/// Beats in one clock period
pub const BEATS_PER_MEASURE: u32 = 4;

/// Default tempo in BPM
pub const DEFAULT_BPM: f64 = 120.0;

/// Duration of one beat at the given tempo (`60000 / bpm` ms)
pub fn beat_duration(bpm: f64) -> Duration {
    Duration::from_secs_f64(60.0 / bpm)
}

/// Beat duration in milliseconds
pub fn beat_duration_ms(bpm: f64) -> f64 {
    60_000.0 / bpm
}

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Configuration for tempo ramping
#[derive(Debug, Clone)]
pub struct TempoRamp {
    /// Starting tempo
    pub from_bpm: f64,
    /// Target tempo
    pub to_bpm: f64,
    /// Duration of the ramp
    pub duration: Duration,
    /// When the ramp started
    pub start_time: Instant,
}

impl TempoRamp {
    /// Calculate the current tempo based on elapsed time
    pub fn current_tempo(&self) -> f64 {
        let elapsed = self.start_time.elapsed();
        if elapsed >= self.duration {
            self.to_bpm
        } else {
            let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
            self.from_bpm + (self.to_bpm - self.from_bpm) * progress
        }
    }

    /// Check if the ramp is complete
    pub fn is_complete(&self) -> bool {
        self.start_time.elapsed() >= self.duration
    }
}

/// Clock that ticks once per measure
#[derive(Debug)]
pub struct MeasureClock {
    /// Target tempo in BPM
    bpm: f64,
    /// Current clock state
    state: ClockState,
    /// Measures elapsed since start
    measures: u64,
    /// Active tempo ramp
    tempo_ramp: Option<TempoRamp>,
}

impl MeasureClock {
    /// Create a new clock at the specified tempo
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            state: ClockState::Stopped,
            measures: 0,
            tempo_ramp: None,
        }
    }

    /// Get the current tempo in BPM, following any active ramp
    pub fn bpm(&self) -> f64 {
        if let Some(ref ramp) = self.tempo_ramp {
            ramp.current_tempo()
        } else {
            self.bpm
        }
    }

    /// Tempo the clock is heading to
    pub fn target_bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo immediately
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
        self.tempo_ramp = None;
    }

    /// Start a tempo ramp to the target BPM over the specified duration.
    ///
    /// A zero duration sets the tempo immediately.
    pub fn ramp_to(&mut self, target_bpm: f64, duration: Duration) {
        if duration.is_zero() {
            self.set_bpm(target_bpm);
            return;
        }
        self.tempo_ramp = Some(TempoRamp {
            from_bpm: self.bpm(),
            to_bpm: target_bpm,
            duration,
            start_time: Instant::now(),
        });
        self.bpm = target_bpm;
    }

    /// Whether a ramp is still in progress
    pub fn is_ramping(&self) -> bool {
        self.tempo_ramp.as_ref().is_some_and(|r| !r.is_complete())
    }

    /// Get the current clock state
    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Measures counted since the clock started
    pub fn measures(&self) -> u64 {
        self.measures
    }

    /// Duration of one beat at the current tempo
    pub fn beat_interval(&self) -> Duration {
        beat_duration(self.bpm())
    }

    /// Duration of one measure at the current tempo
    pub fn measure_interval(&self) -> Duration {
        self.beat_interval() * BEATS_PER_MEASURE
    }

    /// Start the clock from the first measure
    pub fn start(&mut self) {
        self.state = ClockState::Running;
        self.measures = 0;
    }

    /// Stop the clock; any ramp collapses to its target
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.measures = 0;
        self.tempo_ramp = None;
    }

    /// Count one measure; drops the ramp once it has finished
    pub fn advance(&mut self) {
        if self.tempo_ramp.as_ref().is_some_and(|r| r.is_complete()) {
            self.tempo_ramp = None;
        }
        if self.is_running() {
            self.measures += 1;
        }
    }
}

impl Default for MeasureClock {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_duration_law() {
        assert_eq!(beat_duration(120.0), Duration::from_millis(500));
        assert_eq!(beat_duration(60.0), Duration::from_secs(1));
        assert_eq!(beat_duration(240.0), Duration::from_millis(250));
        assert_eq!(beat_duration_ms(120.0), 500.0);
        assert_eq!(beat_duration_ms(90.0), 60_000.0 / 90.0);
    }

    #[test]
    fn test_clock_creation() {
        let clock = MeasureClock::new(120.0);
        assert_eq!(clock.bpm(), 120.0);
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.measures(), 0);
        assert_eq!(clock.measure_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_clock_start_stop() {
        let mut clock = MeasureClock::default();
        clock.start();
        assert!(clock.is_running());
        clock.advance();
        clock.advance();
        assert_eq!(clock.measures(), 2);

        clock.stop();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.measures(), 0);

        // Advancing a stopped clock does not count
        clock.advance();
        assert_eq!(clock.measures(), 0);
    }

    #[test]
    fn test_set_bpm_cancels_ramp() {
        let mut clock = MeasureClock::new(100.0);
        clock.ramp_to(140.0, Duration::from_secs(10));
        clock.set_bpm(90.0);
        assert!(!clock.is_ramping());
        assert_eq!(clock.bpm(), 90.0);
    }

    #[test]
    fn test_zero_ramp_is_immediate() {
        let mut clock = MeasureClock::new(100.0);
        clock.ramp_to(150.0, Duration::ZERO);
        assert_eq!(clock.bpm(), 150.0);
        assert!(!clock.is_ramping());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tempo_ramp() {
        let mut clock = MeasureClock::new(100.0);
        clock.start();
        clock.ramp_to(140.0, Duration::from_millis(1000));
        assert_eq!(clock.target_bpm(), 140.0);
        assert_eq!(clock.bpm(), 100.0);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!((clock.bpm() - 120.0).abs() < 1e-9);
        assert!(clock.is_ramping());

        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(clock.bpm(), 140.0);
        clock.advance();
        assert!(!clock.is_ramping());
        assert_eq!(clock.measure_interval(), beat_duration(140.0) * 4);
    }
}
