// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progression.
//!
//! This module decides which chord plays next. A target is either a cell
//! of the current grid or a synthesized mood chord that lives off the grid;
//! both are played through the [`Playable`] interface.

pub mod driver;
pub mod session;
pub mod voicing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::{ChordCell, GridState, RowType, VerticalFunction};
use crate::music::{chord_tones_or_empty, HarmonyError, Interval, Pitch, Scale};

pub use driver::{Engine, EngineConfig, EngineEvent, PlaySource};
pub use session::{PendingRelease, PlayOutcome, RootChange, Session, TickOutcome};
pub use voicing::Voicing;

/// Slowest accepted tempo
pub const MIN_BPM: f64 = 30.0;
/// Fastest accepted tempo
pub const MAX_BPM: f64 = 300.0;

/// Check a tempo against the accepted range
pub fn validate_bpm(bpm: f64) -> Result<f64, HarmonyError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(HarmonyError::InvalidConfiguration(format!(
            "bpm must be between {} and {}, got {}",
            MIN_BPM, MAX_BPM, bpm
        )))
    }
}

/// Where auto mode moves on every measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutoDirection {
    Up,
    Down,
    #[default]
    Stay,
    Rest,
    Energy,
    Relax,
    Sad,
    Tension,
}

impl AutoDirection {
    pub const ALL: [AutoDirection; 8] = [
        AutoDirection::Up,
        AutoDirection::Down,
        AutoDirection::Stay,
        AutoDirection::Rest,
        AutoDirection::Energy,
        AutoDirection::Relax,
        AutoDirection::Sad,
        AutoDirection::Tension,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AutoDirection::Up => "Up",
            AutoDirection::Down => "Down",
            AutoDirection::Stay => "Stay",
            AutoDirection::Rest => "Rest",
            AutoDirection::Energy => "Energy",
            AutoDirection::Relax => "Relax",
            AutoDirection::Sad => "Sad",
            AutoDirection::Tension => "Tension",
        }
    }
}

impl fmt::Display for AutoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AutoDirection {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutoDirection::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HarmonyError::InvalidConfiguration(format!("unknown direction: {}", s)))
    }
}

/// Auto mode controls, read fresh by the clock on every measure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoModeState {
    pub is_active: bool,
    pub bpm: f64,
    pub direction: AutoDirection,
}

impl Default for AutoModeState {
    fn default() -> Self {
        Self {
            is_active: false,
            bpm: crate::timing::DEFAULT_BPM,
            direction: AutoDirection::Stay,
        }
    }
}

/// Emotional moves away from the current root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    /// Dominant
    Energy,
    /// Subdominant
    Relax,
    /// Relative minor
    Sad,
    /// Tritone substitute
    Tension,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Energy, Mood::Relax, Mood::Sad, Mood::Tension];

    /// Distance from the current root to the mood chord's root
    pub fn interval(self) -> Interval {
        match self {
            Mood::Energy => Interval::PERFECT_FIFTH,
            Mood::Relax => Interval::PERFECT_FOURTH,
            Mood::Sad => -Interval::MINOR_THIRD,
            Mood::Tension => Interval::DIMINISHED_FIFTH,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Mood::Sad => "m",
            _ => "",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Energy => "Bright / Dominant",
            Mood::Relax => "Calm / Subdominant",
            Mood::Sad => "Melancholy / Rel. Minor",
            Mood::Tension => "Anxious / Distant",
        }
    }

    pub fn vertical_function(self) -> VerticalFunction {
        match self {
            Mood::Energy | Mood::Tension => VerticalFunction::Tension,
            Mood::Relax | Mood::Sad => VerticalFunction::Relaxation,
        }
    }

    /// Root the mood leads to from `current_root`
    pub fn target_root(self, current_root: Pitch) -> Pitch {
        current_root.simplify().transpose(self.interval()).simplify()
    }

    /// Build this mood's chord relative to `current_root`
    pub fn chord(self, current_root: Pitch) -> MoodChord {
        MoodChord::new(self, current_root)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Energy => write!(f, "Energy"),
            Mood::Relax => write!(f, "Relax"),
            Mood::Sad => write!(f, "Sad"),
            Mood::Tension => write!(f, "Tension"),
        }
    }
}

/// A chord synthesized off the grid for a mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodChord {
    pub id: String,
    pub mood: Mood,
    pub root: Pitch,
    pub suffix: String,
    pub full_name: String,
    pub intervals: Vec<Pitch>,
    pub vertical_function: VerticalFunction,
    /// Every tone belongs to the major scale of the root it was built from
    pub is_in_key: bool,
}

impl MoodChord {
    pub fn new(mood: Mood, current_root: Pitch) -> Self {
        let root = mood.target_root(current_root);
        let suffix = mood.suffix();
        let intervals = chord_tones_or_empty(root, suffix);
        let is_in_key = Scale::major(current_root.simplify()).contains_all(&intervals);

        Self {
            id: format!("{}-{}", mood, root),
            mood,
            root,
            suffix: suffix.to_string(),
            full_name: format!("{}{}", root, suffix),
            intervals,
            vertical_function: mood.vertical_function(),
            is_in_key,
        }
    }
}

/// Shared shape of anything that can be played
pub trait Playable {
    fn id(&self) -> &str;
    fn root(&self) -> Pitch;
    fn suffix(&self) -> &str;
    fn full_name(&self) -> &str;
    /// Chord tones, root first
    fn tones(&self) -> &[Pitch];
    fn is_in_key(&self) -> bool;
}

impl Playable for ChordCell {
    fn id(&self) -> &str {
        &self.id
    }

    fn root(&self) -> Pitch {
        self.root
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn tones(&self) -> &[Pitch] {
        &self.intervals
    }

    fn is_in_key(&self) -> bool {
        self.is_in_key
    }
}

impl Playable for MoodChord {
    fn id(&self) -> &str {
        &self.id
    }

    fn root(&self) -> Pitch {
        self.root
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn tones(&self) -> &[Pitch] {
        &self.intervals
    }

    fn is_in_key(&self) -> bool {
        self.is_in_key
    }
}

/// The chord chosen for a measure or a press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordTarget {
    Grid(ChordCell),
    Mood(MoodChord),
}

impl ChordTarget {
    fn playable(&self) -> &dyn Playable {
        match self {
            ChordTarget::Grid(cell) => cell,
            ChordTarget::Mood(chord) => chord,
        }
    }
}

impl Playable for ChordTarget {
    fn id(&self) -> &str {
        self.playable().id()
    }

    fn root(&self) -> Pitch {
        self.playable().root()
    }

    fn suffix(&self) -> &str {
        self.playable().suffix()
    }

    fn full_name(&self) -> &str {
        self.playable().full_name()
    }

    fn tones(&self) -> &[Pitch] {
        self.playable().tones()
    }

    fn is_in_key(&self) -> bool {
        self.playable().is_in_key()
    }
}

impl From<ChordCell> for ChordTarget {
    fn from(cell: ChordCell) -> Self {
        ChordTarget::Grid(cell)
    }
}

impl From<MoodChord> for ChordTarget {
    fn from(chord: MoodChord) -> Self {
        ChordTarget::Mood(chord)
    }
}

/// Pick the chord for one measure. `None` means rest.
pub fn select_target(
    direction: AutoDirection,
    grid: &GridState,
    current_root: Pitch,
) -> Option<ChordTarget> {
    let row = match direction {
        AutoDirection::Rest => return None,
        AutoDirection::Up | AutoDirection::Energy => RowType::Up,
        AutoDirection::Down | AutoDirection::Relax => RowType::Down,
        AutoDirection::Stay => RowType::Same,
        AutoDirection::Sad => return Some(Mood::Sad.chord(current_root).into()),
        AutoDirection::Tension => return Some(Mood::Tension.chord(current_root).into()),
    };
    grid.center(row).cloned().map(ChordTarget::Grid)
}
