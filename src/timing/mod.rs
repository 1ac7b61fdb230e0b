// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the measure clock that paces the progression
//! driver, plus beat-duration helpers.

pub mod clock;

pub use clock::{
    beat_duration, beat_duration_ms, ClockState, MeasureClock, TempoRamp, BEATS_PER_MEASURE, DEFAULT_BPM,
};
