// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Spelled pitches and intervals.
//!
//! Unlike a bare pitch class, a [`Pitch`] keeps its letter and accidentals so
//! that `Gb` and `F#` display differently while still comparing equal by
//! [`Pitch::chroma`]. Transposition is spelled (letter steps follow the
//! interval number) and [`Pitch::simplify`] brings a spelling back to its
//! canonical form.

use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::HarmonyError;

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Natural note letters in diatonic order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// All letters in diatonic order
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Diatonic index (C = 0 .. B = 6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Letter at a diatonic index, wrapping at the octave
    pub fn from_index(index: i32) -> Self {
        Letter::ALL[index.rem_euclid(7) as usize]
    }

    /// Semitones above C of the natural note
    pub fn semitones(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }
}

/// A spelled interval: diatonic steps plus exact semitone size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    steps: i8,
    semitones: i8,
}

impl Interval {
    pub const UNISON: Interval = Interval::new(0, 0);
    pub const MAJOR_SECOND: Interval = Interval::new(1, 2);
    pub const MINOR_THIRD: Interval = Interval::new(2, 3);
    pub const MAJOR_THIRD: Interval = Interval::new(2, 4);
    pub const PERFECT_FOURTH: Interval = Interval::new(3, 5);
    pub const DIMINISHED_FIFTH: Interval = Interval::new(4, 6);
    pub const PERFECT_FIFTH: Interval = Interval::new(4, 7);
    pub const AUGMENTED_FIFTH: Interval = Interval::new(4, 8);
    pub const MAJOR_SIXTH: Interval = Interval::new(5, 9);
    pub const MINOR_SEVENTH: Interval = Interval::new(6, 10);
    pub const MAJOR_SEVENTH: Interval = Interval::new(6, 11);
    pub const MINOR_NINTH: Interval = Interval::new(8, 13);
    pub const MAJOR_NINTH: Interval = Interval::new(8, 14);
    pub const PERFECT_ELEVENTH: Interval = Interval::new(10, 17);
    pub const MAJOR_THIRTEENTH: Interval = Interval::new(12, 21);

    /// Create an interval from diatonic steps (0 = unison) and semitones
    pub const fn new(steps: i8, semitones: i8) -> Self {
        Self { steps, semitones }
    }

    /// Number of letter steps spanned
    pub fn steps(self) -> i8 {
        self.steps
    }

    /// Size in semitones
    pub fn semitones(self) -> i8 {
        self.semitones
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        Interval::new(-self.steps, -self.semitones)
    }
}

/// A note name: letter plus signed accidental count (positive = sharps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    letter: Letter,
    accidental: i8,
}

const SHARP_SPELLINGS: [Pitch; 12] = [
    Pitch::new(Letter::C, 0),
    Pitch::new(Letter::C, 1),
    Pitch::new(Letter::D, 0),
    Pitch::new(Letter::D, 1),
    Pitch::new(Letter::E, 0),
    Pitch::new(Letter::F, 0),
    Pitch::new(Letter::F, 1),
    Pitch::new(Letter::G, 0),
    Pitch::new(Letter::G, 1),
    Pitch::new(Letter::A, 0),
    Pitch::new(Letter::A, 1),
    Pitch::new(Letter::B, 0),
];

const FLAT_SPELLINGS: [Pitch; 12] = [
    Pitch::new(Letter::C, 0),
    Pitch::new(Letter::D, -1),
    Pitch::new(Letter::D, 0),
    Pitch::new(Letter::E, -1),
    Pitch::new(Letter::E, 0),
    Pitch::new(Letter::F, 0),
    Pitch::new(Letter::G, -1),
    Pitch::new(Letter::G, 0),
    Pitch::new(Letter::A, -1),
    Pitch::new(Letter::A, 0),
    Pitch::new(Letter::B, -1),
    Pitch::new(Letter::B, 0),
];

/// Longest accidental run accepted by the parser
const MAX_ACCIDENTALS: usize = 4;

impl Pitch {
    /// Create a pitch from letter and accidental count
    pub const fn new(letter: Letter, accidental: i8) -> Self {
        Self { letter, accidental }
    }

    /// Natural pitch for a letter
    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, 0)
    }

    pub fn letter(self) -> Letter {
        self.letter
    }

    pub fn accidental(self) -> i8 {
        self.accidental
    }

    /// Pitch class (0-11), independent of spelling
    pub fn chroma(self) -> u8 {
        (self.letter.semitones() + self.accidental as i32).rem_euclid(12) as u8
    }

    /// Spelled transposition.
    ///
    /// The letter moves by the interval's step count; the accidental is
    /// whatever makes the semitone distance exact, kept within -6..=5.
    pub fn transpose(self, interval: Interval) -> Pitch {
        let letter = Letter::from_index(self.letter.index() as i32 + interval.steps() as i32);
        let target =
            self.letter.semitones() + self.accidental as i32 + interval.semitones() as i32;
        let accidental = (target - letter.semitones() + 6).rem_euclid(12) - 6;
        Pitch::new(letter, accidental as i8)
    }

    /// Canonical spelling.
    ///
    /// Naturals are returned unchanged. Sharpened pitches take the sharp name
    /// of their pitch class, flattened pitches the flat name, so `E#` becomes
    /// `F`, `Cb` becomes `B` and `Gb` stays `Gb`.
    pub fn simplify(self) -> Pitch {
        match self.accidental {
            0 => self,
            a if a > 0 => SHARP_SPELLINGS[self.chroma() as usize],
            _ => FLAT_SPELLINGS[self.chroma() as usize],
        }
    }

    /// MIDI note number in the given octave (C4 = 60).
    ///
    /// Spelling matters at octave boundaries: `B#3` is 60 and `Cb4` is 59.
    pub fn midi(self, octave: i8) -> Option<MidiNote> {
        let midi = (octave as i32 + 1) * 12 + self.letter.semitones() + self.accidental as i32;
        if (0..=127).contains(&midi) {
            Some(midi as MidiNote)
        } else {
            None
        }
    }
}

impl FromStr for Pitch {
    type Err = HarmonyError;

    /// Parse a note name such as `C`, `F#`, `Bb` or `Ebb`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .and_then(Letter::from_char)
            .ok_or_else(|| HarmonyError::InvalidPitch(s.to_string()))?;

        let rest = chars.as_str();
        if rest.len() > MAX_ACCIDENTALS {
            return Err(HarmonyError::InvalidPitch(s.to_string()));
        }

        let accidental = if rest.chars().all(|c| c == '#') {
            rest.len() as i8
        } else if rest.chars().all(|c| c == 'b') {
            -(rest.len() as i8)
        } else {
            return Err(HarmonyError::InvalidPitch(s.to_string()));
        };

        Ok(Pitch::new(letter, accidental))
    }
}

impl TryFrom<String> for Pitch {
    type Error = HarmonyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> Self {
        pitch.to_string()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        let mark = if self.accidental > 0 { '#' } else { 'b' };
        for _ in 0..self.accidental.unsigned_abs() {
            write!(f, "{}", mark)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(p("C").to_string(), "C");
        assert_eq!(p("F#").to_string(), "F#");
        assert_eq!(p("Bb").to_string(), "Bb");
        assert_eq!(p("ebb").to_string(), "Ebb");
        assert_eq!(p(" G ").to_string(), "G");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Pitch>().is_err());
        assert!("H".parse::<Pitch>().is_err());
        assert!("C#b".parse::<Pitch>().is_err());
        assert!("C7".parse::<Pitch>().is_err());
        assert!("C#####".parse::<Pitch>().is_err());
    }

    #[test]
    fn test_chroma() {
        assert_eq!(p("C").chroma(), 0);
        assert_eq!(p("B#").chroma(), 0);
        assert_eq!(p("Cb").chroma(), 11);
        assert_eq!(p("Gb").chroma(), p("F#").chroma());
        assert_ne!(p("Gb"), p("F#"));
    }

    #[test]
    fn test_transpose_fifths() {
        assert_eq!(p("C").transpose(Interval::PERFECT_FIFTH), p("G"));
        assert_eq!(p("B").transpose(Interval::PERFECT_FIFTH), p("F#"));
        assert_eq!(p("C").transpose(-Interval::PERFECT_FIFTH), p("F"));
        assert_eq!(p("F").transpose(-Interval::PERFECT_FIFTH), p("Bb"));
        assert_eq!(p("Gb").transpose(-Interval::PERFECT_FIFTH), p("Cb"));
    }

    #[test]
    fn test_transpose_keeps_spelling() {
        assert_eq!(p("C").transpose(-Interval::MINOR_THIRD), p("A"));
        assert_eq!(p("C").transpose(Interval::DIMINISHED_FIFTH), p("Gb"));
        assert_eq!(p("C#").transpose(Interval::MAJOR_SEVENTH), p("B#"));
        assert_eq!(p("A#").transpose(Interval::MAJOR_THIRD), p("C##"));
        assert_eq!(p("G").transpose(Interval::MINOR_NINTH), p("Ab"));
    }

    #[test]
    fn test_simplify() {
        assert_eq!(p("E#").simplify(), p("F"));
        assert_eq!(p("Cb").simplify(), p("B"));
        assert_eq!(p("B#").simplify(), p("C"));
        assert_eq!(p("Gb").simplify(), p("Gb"));
        assert_eq!(p("F#").simplify(), p("F#"));
        assert_eq!(p("C##").simplify(), p("D"));
        assert_eq!(p("Dbb").simplify(), p("C"));
        assert_eq!(p("Ebb").simplify().simplify(), p("Ebb").simplify());
    }

    #[test]
    fn test_midi() {
        assert_eq!(p("C").midi(4), Some(60));
        assert_eq!(p("C").midi(3), Some(48));
        assert_eq!(p("B#").midi(3), Some(60));
        assert_eq!(p("Cb").midi(4), Some(59));
        assert_eq!(p("G").midi(9), Some(127));
        assert_eq!(p("G#").midi(9), None);
        assert_eq!(p("Cb").midi(-1), None);
    }

    #[test]
    fn test_serde_as_string() {
        let yaml = serde_yaml::to_string(&p("Eb")).unwrap();
        assert_eq!(yaml.trim(), "Eb");
        let back: Pitch = serde_yaml::from_str("F#").unwrap();
        assert_eq!(back, p("F#"));
        assert!(serde_yaml::from_str::<Pitch>("X").is_err());
    }
}
