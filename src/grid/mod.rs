// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The chord grid.
//!
//! Three rows of chords share one column range centred on the current root:
//! - Columns step around the circle of fifths
//! - `Up` holds dominants (tension), `Same` the tonic, `Down` subdominants
//! - Every cell knows whether it is diatonic to the current root

pub mod generator;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::music::{HarmonyError, Pitch, TensionLevel};

pub use generator::{generate_grid, horizontal_root};

/// Default number of columns
pub const DEFAULT_GRID_WIDTH: usize = 5;

/// Narrowest accepted grid
pub const MIN_GRID_WIDTH: usize = 1;

/// Widest accepted grid (twelve fifths each side covers every key)
pub const MAX_GRID_WIDTH: usize = 25;

/// Check a grid width against the accepted range
pub fn validate_width(width: usize) -> Result<(), HarmonyError> {
    if (MIN_GRID_WIDTH..=MAX_GRID_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(HarmonyError::InvalidConfiguration(format!(
            "grid width {} outside {}..={}",
            width, MIN_GRID_WIDTH, MAX_GRID_WIDTH
        )))
    }
}

/// Grid row, one per functional direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowType {
    Up,
    Same,
    Down,
}

impl RowType {
    pub const ALL: [RowType; 3] = [RowType::Up, RowType::Same, RowType::Down];

    /// Vertical function carried by every cell in this row
    pub fn vertical_function(self) -> VerticalFunction {
        match self {
            RowType::Up => VerticalFunction::Tension,
            RowType::Same => VerticalFunction::Stability,
            RowType::Down => VerticalFunction::Relaxation,
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowType::Up => write!(f, "Up"),
            RowType::Same => write!(f, "Same"),
            RowType::Down => write!(f, "Down"),
        }
    }
}

/// Functional meaning of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalFunction {
    Tension,
    Stability,
    Relaxation,
}

/// Distance of a column from the centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceType {
    Center,
    Inner,
    Outer,
}

impl DistanceType {
    /// Classify a relative column index
    pub fn from_col(col_index: i32) -> Self {
        match col_index.unsigned_abs() {
            0 => DistanceType::Center,
            1 => DistanceType::Inner,
            _ => DistanceType::Outer,
        }
    }
}

/// One chord on the grid. Built fresh on every generation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordCell {
    /// Deterministic key, e.g. `G-Up-0`
    pub id: String,
    /// Canonical root of the chord
    pub root: Pitch,
    /// Chord quality suffix, e.g. `7`
    pub suffix: String,
    /// Display name, e.g. `G7`
    pub full_name: String,
    /// Chord tones, root first
    pub intervals: Vec<Pitch>,
    pub vertical_function: VerticalFunction,
    pub distance_type: DistanceType,
    /// Every tone belongs to the major scale of the grid root
    pub is_in_key: bool,
    pub row_type: RowType,
    /// Relative column, 0 is the centre
    pub col_index: i32,
}

/// Inputs that fully determine a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    pub current_root: Pitch,
    pub grid_width: usize,
    pub tension_level: TensionLevel,
}

impl GridParams {
    pub fn new(current_root: Pitch, grid_width: usize, tension_level: TensionLevel) -> Self {
        Self {
            current_root,
            grid_width,
            tension_level,
        }
    }

    /// Columns on each side of the centre, capped at `MAX_GRID_WIDTH / 2`
    pub fn half_width(&self) -> usize {
        self.grid_width.min(MAX_GRID_WIDTH) / 2
    }

    /// Total columns actually generated (`2 * half + 1`)
    pub fn column_count(&self) -> usize {
        2 * self.half_width() + 1
    }
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            current_root: Pitch::natural(crate::music::Letter::C),
            grid_width: DEFAULT_GRID_WIDTH,
            tension_level: TensionLevel::Triad,
        }
    }
}

/// Three equal-length rows of cells indexed by the same column range
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GridState {
    pub up: Vec<ChordCell>,
    pub same: Vec<ChordCell>,
    pub down: Vec<ChordCell>,
}

impl GridState {
    fn with_capacity(columns: usize) -> Self {
        Self {
            up: Vec::with_capacity(columns),
            same: Vec::with_capacity(columns),
            down: Vec::with_capacity(columns),
        }
    }

    /// Get a row by type
    pub fn row(&self, row: RowType) -> &[ChordCell] {
        match row {
            RowType::Up => &self.up,
            RowType::Same => &self.same,
            RowType::Down => &self.down,
        }
    }

    /// Number of columns (all rows have the same length)
    pub fn width(&self) -> usize {
        self.same.len()
    }

    /// Get the cell at a relative column
    pub fn cell(&self, row: RowType, col_index: i32) -> Option<&ChordCell> {
        self.row(row).iter().find(|c| c.col_index == col_index)
    }

    /// Get the centre cell of a row
    pub fn center(&self, row: RowType) -> Option<&ChordCell> {
        self.cell(row, 0)
    }

    /// Iterate over every cell, row by row (Up, Same, Down)
    pub fn cells(&self) -> impl Iterator<Item = &ChordCell> {
        self.up.iter().chain(self.same.iter()).chain(self.down.iter())
    }
}
