// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Grid generation.
//!
//! [`generate_grid`] is a pure function of [`GridParams`]: the same inputs
//! always produce the same cells, ids and flags.

use crate::music::{chord_tones_or_empty, HarmonicRole, Interval, Pitch, Scale, TensionLevel};

use super::{ChordCell, DistanceType, GridParams, GridState, RowType};

/// Generate the three-row chord grid for the given parameters.
///
/// Columns run from `-width/2` to `+width/2`. An even width still yields
/// `width/2` columns on each side of the centre. Widths above
/// [`MAX_GRID_WIDTH`](super::MAX_GRID_WIDTH) are capped.
pub fn generate_grid(params: &GridParams) -> GridState {
    let center = params.current_root.simplify();
    let diatonic = Scale::major(center);
    let half = params.half_width();

    let bases = column_roots(center, half);
    let mut grid = GridState::with_capacity(bases.len());

    for (col, base) in (-(half as i32)..).zip(bases) {
        grid.up
            .push(build_cell(base, RowType::Up, col, params.tension_level, &diatonic));
        grid.same
            .push(build_cell(base, RowType::Same, col, params.tension_level, &diatonic));
        grid.down
            .push(build_cell(base, RowType::Down, col, params.tension_level, &diatonic));
    }

    grid
}

/// Base roots for columns `-half..=half`, walked outward from the centre one
/// fifth per column.
fn column_roots(center: Pitch, half: usize) -> Vec<Pitch> {
    let walk = |step: Interval| {
        std::iter::successors(Some(center), move |root: &Pitch| {
            Some(root.transpose(step).simplify())
        })
        .skip(1)
        .take(half)
    };

    let mut roots: Vec<Pitch> = walk(-Interval::PERFECT_FIFTH).collect();
    roots.reverse();
    roots.push(center);
    roots.extend(walk(Interval::PERFECT_FIFTH));
    roots
}

/// Root for a column: `col` perfect fifths away from `center`, up for
/// positive columns and down for negative ones, simplified after every step.
pub fn horizontal_root(center: Pitch, col: i32) -> Pitch {
    let step = if col > 0 {
        Interval::PERFECT_FIFTH
    } else {
        -Interval::PERFECT_FIFTH
    };

    (0..col.unsigned_abs()).fold(center.simplify(), |root, _| root.transpose(step).simplify())
}

fn build_cell(
    base: Pitch,
    row_type: RowType,
    col_index: i32,
    tension: TensionLevel,
    diatonic: &Scale,
) -> ChordCell {
    let (root, suffix) = match row_type {
        RowType::Up => (
            base.transpose(Interval::PERFECT_FIFTH),
            tension.suffix(HarmonicRole::Dominant),
        ),
        RowType::Same => (base, tension.suffix(HarmonicRole::Major)),
        RowType::Down => (
            base.transpose(Interval::PERFECT_FOURTH),
            tension.suffix(HarmonicRole::Major),
        ),
    };
    let root = root.simplify();

    let intervals = chord_tones_or_empty(root, suffix);
    let is_in_key = diatonic.contains_all(&intervals);

    ChordCell {
        id: format!("{}-{}-{}", root, row_type, col_index),
        root,
        suffix: suffix.to_string(),
        full_name: format!("{}{}", root, suffix),
        intervals,
        vertical_function: row_type.vertical_function(),
        distance_type: DistanceType::from_col(col_index),
        is_in_key,
        row_type,
        col_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VerticalFunction;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    fn params(root: &str, width: usize, tension: TensionLevel) -> GridParams {
        GridParams::new(p(root), width, tension)
    }

    fn names(tones: &[Pitch]) -> Vec<String> {
        tones.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_c_major_triads() {
        let grid = generate_grid(&params("C", 5, TensionLevel::Triad));

        let tonic = grid.center(RowType::Same).unwrap();
        assert_eq!(tonic.root, p("C"));
        assert_eq!(tonic.suffix, "");
        assert_eq!(tonic.full_name, "C");
        assert_eq!(names(&tonic.intervals), vec!["C", "E", "G"]);
        assert!(tonic.is_in_key);
        assert_eq!(tonic.distance_type, DistanceType::Center);
        assert_eq!(tonic.id, "C-Same-0");

        let dominant = grid.center(RowType::Up).unwrap();
        assert_eq!(dominant.full_name, "G");
        assert!(dominant.is_in_key);
        assert_eq!(dominant.vertical_function, VerticalFunction::Tension);
        assert_eq!(dominant.id, "G-Up-0");

        let sub = grid.center(RowType::Down).unwrap();
        assert_eq!(sub.full_name, "F");
        assert!(sub.is_in_key);
        assert_eq!(sub.vertical_function, VerticalFunction::Relaxation);
    }

    #[test]
    fn test_c_major_sevenths() {
        let grid = generate_grid(&params("C", 5, TensionLevel::Seventh));
        assert_eq!(grid.center(RowType::Same).unwrap().full_name, "CM7");
        assert_eq!(grid.center(RowType::Up).unwrap().full_name, "G7");
        assert_eq!(grid.center(RowType::Down).unwrap().full_name, "FM7");
        assert_eq!(
            names(&grid.center(RowType::Up).unwrap().intervals),
            vec!["G", "B", "D", "F"]
        );
    }

    #[test]
    fn test_column_roots_follow_fifths() {
        let grid = generate_grid(&params("C", 5, TensionLevel::Triad));
        let roots: Vec<String> = grid.same.iter().map(|c| c.root.to_string()).collect();
        assert_eq!(roots, vec!["Bb", "F", "C", "G", "D"]);

        let cols: Vec<i32> = grid.same.iter().map(|c| c.col_index).collect();
        assert_eq!(cols, vec![-2, -1, 0, 1, 2]);

        // Outer columns leave the key
        assert_eq!(grid.cell(RowType::Up, 2).unwrap().full_name, "A");
        assert!(!grid.cell(RowType::Up, 2).unwrap().is_in_key);
        assert_eq!(grid.cell(RowType::Same, -2).unwrap().full_name, "Bb");
        assert!(!grid.cell(RowType::Same, -2).unwrap().is_in_key);
    }

    #[test]
    fn test_horizontal_root_simplifies_each_step() {
        assert_eq!(horizontal_root(p("C"), 0), p("C"));
        assert_eq!(horizontal_root(p("C"), 6), p("F#"));
        assert_eq!(horizontal_root(p("C"), -6), p("Gb"));
        // Gb down a fifth is Cb, which simplifies to B
        assert_eq!(horizontal_root(p("Gb"), -1), p("B"));
        assert_eq!(horizontal_root(p("E#"), 0), p("F"));
    }

    #[test]
    fn test_column_roots_match_horizontal_root() {
        let grid = generate_grid(&params("Ab", 25, TensionLevel::Triad));
        assert_eq!(grid.width(), 25);
        for cell in &grid.same {
            assert_eq!(cell.root, horizontal_root(p("Ab"), cell.col_index));
        }
    }

    #[test]
    fn test_oversized_width_is_capped() {
        let grid = generate_grid(&params("C", usize::MAX, TensionLevel::Triad));
        assert_eq!(grid.width(), crate::grid::MAX_GRID_WIDTH);
        assert_eq!(grid.same.first().unwrap().col_index, -12);
        assert_eq!(grid.same.last().unwrap().col_index, 12);
    }

    #[test]
    fn test_distance_types() {
        let grid = generate_grid(&params("D", 7, TensionLevel::Triad));
        let distances: Vec<DistanceType> = grid.down.iter().map(|c| c.distance_type).collect();
        use DistanceType::*;
        assert_eq!(distances, vec![Outer, Outer, Inner, Center, Inner, Outer, Outer]);
    }

    #[test]
    fn test_even_width_keeps_centre() {
        let grid = generate_grid(&params("C", 4, TensionLevel::Triad));
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.up.len(), 5);
        assert_eq!(grid.down.len(), 5);
        assert!(grid.center(RowType::Same).is_some());
    }

    #[test]
    fn test_tension_thirteenth() {
        let grid = generate_grid(&params("C", 3, TensionLevel::Thirteenth));
        let up = grid.center(RowType::Up).unwrap();
        assert_eq!(up.full_name, "G7b9");
        assert_eq!(names(&up.intervals), vec!["G", "B", "D", "F", "Ab"]);
        assert!(!up.is_in_key);

        let same = grid.center(RowType::Same).unwrap();
        assert_eq!(same.full_name, "CM13");
        assert!(same.is_in_key);
    }

    #[test]
    fn test_unsimplified_root_is_normalized() {
        let grid = generate_grid(&params("B#", 3, TensionLevel::Triad));
        assert_eq!(grid.center(RowType::Same).unwrap().root, p("C"));
    }

    #[test]
    fn test_flat_key_spelling() {
        let grid = generate_grid(&params("Eb", 3, TensionLevel::Triad));
        let roots: Vec<String> = grid.same.iter().map(|c| c.root.to_string()).collect();
        assert_eq!(roots, vec!["Ab", "Eb", "Bb"]);
        assert!(RowType::ALL
            .iter()
            .all(|&row| grid.center(row).unwrap().is_in_key));
        // The dominant of the dominant (F major) is outside Eb major
        assert!(!grid.cell(RowType::Up, 1).unwrap().is_in_key);
    }
}
