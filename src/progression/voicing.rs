// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord voicing: spelled chord tones to MIDI notes.

use crate::music::{MidiNote, Pitch};

/// Octave placement for chord tones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voicing {
    /// Octave of the first (root) tone
    pub root_octave: i8,
    /// Octave of every other tone
    pub upper_octave: i8,
}

impl Voicing {
    pub fn new(root_octave: i8, upper_octave: i8) -> Self {
        Self {
            root_octave,
            upper_octave,
        }
    }

    /// MIDI notes for the tones in order. Tones outside the MIDI range are dropped.
    pub fn voice(&self, tones: &[Pitch]) -> Vec<MidiNote> {
        tones
            .iter()
            .enumerate()
            .filter_map(|(i, tone)| {
                let octave = if i == 0 {
                    self.root_octave
                } else {
                    self.upper_octave
                };
                tone.midi(octave)
            })
            .collect()
    }
}

impl Default for Voicing {
    fn default() -> Self {
        Self::new(3, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tones(names: &[&str]) -> Vec<Pitch> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    #[test]
    fn test_root_below_upper_tones() {
        let voicing = Voicing::default();
        assert_eq!(voicing.voice(&tones(&["C", "E", "G"])), vec![48, 64, 67]);
        assert_eq!(voicing.voice(&tones(&["A", "C", "E"])), vec![57, 60, 64]);
        assert_eq!(voicing.voice(&tones(&["Gb", "Bb", "Db"])), vec![54, 70, 61]);
    }

    #[test]
    fn test_empty_chord() {
        assert!(Voicing::default().voice(&[]).is_empty());
    }

    #[test]
    fn test_out_of_range_dropped() {
        let voicing = Voicing::new(-1, 9);
        // C-1 is 0, G9 is 127, A9 would be 129
        assert_eq!(voicing.voice(&tones(&["C", "G", "A"])), vec![0, 127]);
        assert_eq!(Voicing::new(-1, 4).voice(&tones(&["Cb"])), Vec::<MidiNote>::new());
    }
}
