// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! chordpad - harmonic navigation engine.
//!
//! A three-row chord grid laid out on the circle of fifths, and an auto
//! mode that walks it one measure at a time.

pub mod config;
pub mod grid;
pub mod music;
pub mod output;
pub mod progression;
pub mod timing;
