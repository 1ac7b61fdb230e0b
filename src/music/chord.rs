// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord qualities, tension levels and chord spelling.
//!
//! The suffix table maps a [`TensionLevel`] and a [`HarmonicRole`] to the
//! chord symbol suffix used on the grid. [`Chord::resolve`] turns a root and
//! suffix into spelled chord tones using a fixed dictionary of chord types.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pitch::{Interval, Pitch};
use super::HarmonyError;

/// Chord extension complexity, selectable 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TensionLevel {
    /// Plain triads
    #[default]
    Triad,
    /// Seventh chords
    Seventh,
    /// Ninth chords
    Ninth,
    /// Thirteenths and altered dominants
    Thirteenth,
}

impl TensionLevel {
    pub const ALL: [TensionLevel; 4] = [
        TensionLevel::Triad,
        TensionLevel::Seventh,
        TensionLevel::Ninth,
        TensionLevel::Thirteenth,
    ];

    /// Numeric level (0-3)
    pub fn value(self) -> u8 {
        match self {
            TensionLevel::Triad => 0,
            TensionLevel::Seventh => 1,
            TensionLevel::Ninth => 2,
            TensionLevel::Thirteenth => 3,
        }
    }

    /// Display label for the level
    pub fn label(self) -> &'static str {
        match self {
            TensionLevel::Triad => "Triad (Simple)",
            TensionLevel::Seventh => "7th (Basic)",
            TensionLevel::Ninth => "9th (Urban)",
            TensionLevel::Thirteenth => "13th/Alt (Complex)",
        }
    }

    /// Chord suffix for a harmonic role at this level
    pub fn suffix(self, role: HarmonicRole) -> &'static str {
        SUFFIX_TABLE[self.value() as usize][role.column()]
    }
}

impl TryFrom<u8> for TensionLevel {
    type Error = HarmonyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TensionLevel::Triad),
            1 => Ok(TensionLevel::Seventh),
            2 => Ok(TensionLevel::Ninth),
            3 => Ok(TensionLevel::Thirteenth),
            other => Err(HarmonyError::InvalidConfiguration(format!(
                "tension level must be 0-3, got {}",
                other
            ))),
        }
    }
}

impl From<TensionLevel> for u8 {
    fn from(level: TensionLevel) -> Self {
        level.value()
    }
}

impl fmt::Display for TensionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Harmonic role a chord plays relative to its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmonicRole {
    /// Tonic and subdominant chords
    Major,
    /// Dominant chords
    Dominant,
    Minor,
}

impl HarmonicRole {
    fn column(self) -> usize {
        match self {
            HarmonicRole::Major => 0,
            HarmonicRole::Dominant => 1,
            HarmonicRole::Minor => 2,
        }
    }
}

// Level | Major | Dominant | Minor
const SUFFIX_TABLE: [[&str; 3]; 4] = [
    ["", "", "m"],
    ["M7", "7", "m7"],
    ["M9", "9", "m9"],
    ["M13", "7b9", "m11"],
];

/// A chord quality: canonical suffix, accepted aliases and intervals
struct ChordType {
    suffix: &'static str,
    aliases: &'static [&'static str],
    intervals: &'static [Interval],
}

const TRIAD: [Interval; 3] = [
    Interval::UNISON,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FIFTH,
];

const MINOR_TRIAD: [Interval; 3] = [
    Interval::UNISON,
    Interval::MINOR_THIRD,
    Interval::PERFECT_FIFTH,
];

const CHORD_TYPES: &[ChordType] = &[
    // Major
    ChordType {
        suffix: "",
        aliases: &["M", "maj"],
        intervals: &TRIAD,
    },
    ChordType {
        suffix: "M7",
        aliases: &["maj7", "Maj7", "^7"],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MAJOR_SEVENTH,
        ],
    },
    ChordType {
        suffix: "M9",
        aliases: &["maj9", "^9"],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MAJOR_SEVENTH,
            Interval::MAJOR_NINTH,
        ],
    },
    ChordType {
        suffix: "M13",
        aliases: &["maj13", "Maj13", "^13"],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MAJOR_SEVENTH,
            Interval::MAJOR_NINTH,
            Interval::MAJOR_THIRTEENTH,
        ],
    },
    // Dominant
    ChordType {
        suffix: "7",
        aliases: &["dom"],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
        ],
    },
    ChordType {
        suffix: "9",
        aliases: &[],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
            Interval::MAJOR_NINTH,
        ],
    },
    ChordType {
        suffix: "13",
        aliases: &[],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
            Interval::MAJOR_NINTH,
            Interval::MAJOR_THIRTEENTH,
        ],
    },
    ChordType {
        suffix: "7b9",
        aliases: &[],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
            Interval::MINOR_NINTH,
        ],
    },
    // Minor
    ChordType {
        suffix: "m",
        aliases: &["min", "-"],
        intervals: &MINOR_TRIAD,
    },
    ChordType {
        suffix: "m7",
        aliases: &["min7", "-7"],
        intervals: &[
            Interval::UNISON,
            Interval::MINOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
        ],
    },
    ChordType {
        suffix: "m9",
        aliases: &["-9"],
        intervals: &[
            Interval::UNISON,
            Interval::MINOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
            Interval::MAJOR_NINTH,
        ],
    },
    ChordType {
        suffix: "m11",
        aliases: &["-11"],
        intervals: &[
            Interval::UNISON,
            Interval::MINOR_THIRD,
            Interval::PERFECT_FIFTH,
            Interval::MINOR_SEVENTH,
            Interval::MAJOR_NINTH,
            Interval::PERFECT_ELEVENTH,
        ],
    },
    // Other
    ChordType {
        suffix: "dim",
        aliases: &["o"],
        intervals: &[
            Interval::UNISON,
            Interval::MINOR_THIRD,
            Interval::DIMINISHED_FIFTH,
        ],
    },
    ChordType {
        suffix: "aug",
        aliases: &["+"],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_THIRD,
            Interval::AUGMENTED_FIFTH,
        ],
    },
    ChordType {
        suffix: "sus4",
        aliases: &["sus"],
        intervals: &[
            Interval::UNISON,
            Interval::PERFECT_FOURTH,
            Interval::PERFECT_FIFTH,
        ],
    },
    ChordType {
        suffix: "sus2",
        aliases: &[],
        intervals: &[
            Interval::UNISON,
            Interval::MAJOR_SECOND,
            Interval::PERFECT_FIFTH,
        ],
    },
];

/// Look up the interval list for a chord suffix (canonical or alias)
pub fn chord_intervals(suffix: &str) -> Option<&'static [Interval]> {
    CHORD_TYPES
        .iter()
        .find(|ct| ct.suffix == suffix || ct.aliases.contains(&suffix))
        .map(|ct| ct.intervals)
}

/// A spelled chord: root, suffix and tones in root-first order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    root: Pitch,
    suffix: String,
    tones: Vec<Pitch>,
}

impl Chord {
    /// Spell the chord `root + suffix`.
    ///
    /// Tones keep their spelled form (`F#M7` yields `E#`, not `F`).
    pub fn resolve(root: Pitch, suffix: &str) -> Result<Self, HarmonyError> {
        let intervals = chord_intervals(suffix)
            .ok_or_else(|| HarmonyError::UnknownChord(format!("{}{}", root, suffix)))?;

        Ok(Self {
            root,
            suffix: suffix.to_string(),
            tones: intervals.iter().map(|&i| root.transpose(i)).collect(),
        })
    }

    pub fn root(&self) -> Pitch {
        self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Chord tones, root first
    pub fn tones(&self) -> &[Pitch] {
        &self.tones
    }

    /// Consume the chord and return its tones
    pub fn into_tones(self) -> Vec<Pitch> {
        self.tones
    }

    /// Display name, e.g. `G7`
    pub fn name(&self) -> String {
        format!("{}{}", self.root, self.suffix)
    }
}

/// Spell a chord, degrading to an empty tone list when the suffix is unknown
pub fn chord_tones_or_empty(root: Pitch, suffix: &str) -> Vec<Pitch> {
    match Chord::resolve(root, suffix) {
        Ok(chord) => chord.into_tones(),
        Err(e) => {
            debug!("chord spelling failed, using empty tones: {}", e);
            Vec::new()
        }
    }
}
