// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! This module provides spelled pitches and intervals, major-scale reference
//! sets, and chord spelling for the tension levels used on the grid.

pub mod chord;
pub mod pitch;
pub mod scale;

use thiserror::Error;

pub use chord::{chord_tones_or_empty, Chord, HarmonicRole, TensionLevel};
pub use pitch::{Interval, Letter, MidiNote, Pitch};
pub use scale::Scale;

/// Errors raised by music-theory and engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarmonyError {
    /// A value outside its allowed range (tension level, tempo, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Text that is not a note name
    #[error("invalid pitch: {0:?}")]
    InvalidPitch(String),
    /// A chord symbol with no known spelling
    #[error("unknown chord: {0}")]
    UnknownChord(String),
}
