// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Major-scale reference sets for diatonic membership checks.

use std::fmt;

use super::pitch::{Interval, Pitch};

/// Intervals of the major scale above its root
const MAJOR_INTERVALS: [Interval; 7] = [
    Interval::UNISON,
    Interval::MAJOR_SECOND,
    Interval::MAJOR_THIRD,
    Interval::PERFECT_FOURTH,
    Interval::PERFECT_FIFTH,
    Interval::MAJOR_SIXTH,
    Interval::MAJOR_SEVENTH,
];

/// A major scale with spelled notes and its pitch-class set
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    root: Pitch,
    notes: Vec<Pitch>,
    /// Bit `n` set when pitch class `n` belongs to the scale
    chroma_mask: u16,
}

impl Scale {
    /// Build the major scale on `root`
    pub fn major(root: Pitch) -> Self {
        let notes: Vec<Pitch> = MAJOR_INTERVALS
            .iter()
            .map(|&interval| root.transpose(interval))
            .collect();
        let chroma_mask = notes
            .iter()
            .fold(0u16, |mask, note| mask | (1 << note.chroma()));

        Self {
            root,
            notes,
            chroma_mask,
        }
    }

    /// Get the notes in this scale
    pub fn notes(&self) -> &[Pitch] {
        &self.notes
    }

    /// Check if a pitch class (0-11) is in this scale
    pub fn contains_chroma(&self, chroma: u8) -> bool {
        chroma < 12 && self.chroma_mask & (1 << chroma) != 0
    }

    /// Check if a note is in this scale, ignoring spelling
    pub fn contains(&self, note: Pitch) -> bool {
        self.contains_chroma(note.chroma())
    }

    /// Check that every note is in this scale.
    ///
    /// An empty slice is never considered diatonic.
    pub fn contains_all(&self, notes: &[Pitch]) -> bool {
        !notes.is_empty() && notes.iter().all(|&note| self.contains(note))
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} major", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    #[test]
    fn test_scale_notes() {
        let c_major = Scale::major(p("C"));
        let names: Vec<String> = c_major.notes().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["C", "D", "E", "F", "G", "A", "B"]);

        let f_sharp = Scale::major(p("F#"));
        let names: Vec<String> = f_sharp.notes().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["F#", "G#", "A#", "B", "C#", "D#", "E#"]);
    }

    #[test]
    fn test_scale_contains_by_chroma() {
        let c_major = Scale::major(p("C"));
        assert!(c_major.contains(p("C")));
        assert!(c_major.contains(p("B#")));
        assert!(!c_major.contains(p("F#")));
        assert!(!c_major.contains(p("Gb")));

        let d_flat = Scale::major(p("Db"));
        assert!(d_flat.contains(p("C#")));
        assert!(d_flat.contains(p("Gb")));
        assert!(d_flat.contains(p("F#")));
    }

    #[test]
    fn test_contains_all() {
        let c_major = Scale::major(p("C"));
        assert!(c_major.contains_all(&[p("C"), p("E"), p("G")]));
        assert!(!c_major.contains_all(&[p("D"), p("F#"), p("A")]));
        assert!(!c_major.contains_all(&[]));
    }

    #[test]
    fn test_scale_display() {
        assert_eq!(Scale::major(p("C")).to_string(), "C major");
        assert_eq!(Scale::major(p("Eb")).to_string(), "Eb major");
    }
}
