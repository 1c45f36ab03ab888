//! Grid adjacency used by the cost propagation, path walking and labelling code

use std::f64::consts::SQRT_2;

/// Which cells count as adjacent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-sharing neighbours only
    Four,
    /// Edge- and corner-sharing neighbours
    #[default]
    Eight,
}

/// (row offset, col offset, step length in cells), orthogonal first.
const OFFSETS: [(isize, isize, f64); 8] = [
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (1, 0, 1.0),
    (0, -1, 1.0),
    (-1, 1, SQRT_2),
    (1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, -1, SQRT_2),
];

impl Connectivity {
    /// Neighbour offsets `(dr, dc, step)` for this connectivity
    pub fn offsets(&self) -> &'static [(isize, isize, f64)] {
        match self {
            Connectivity::Four => &OFFSETS[..4],
            Connectivity::Eight => &OFFSETS,
        }
    }

    /// In-bounds neighbours of (row, col) on a `rows` x `cols` grid
    pub fn neighbors(&self, row: usize, col: usize, rows: usize, cols: usize) -> Neighbors {
        Neighbors {
            offsets: self.offsets(),
            row,
            col,
            rows,
            cols,
            index: 0,
        }
    }
}

/// Iterator over in-bounds neighbours yielding `(row, col, step)`
#[derive(Debug, Clone)]
pub struct Neighbors {
    offsets: &'static [(isize, isize, f64)],
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
    index: usize,
}

impl Iterator for Neighbors {
    type Item = (usize, usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(dr, dc, step)) = self.offsets.get(self.index) {
            self.index += 1;
            let r = self.row as isize + dr;
            let c = self.col as isize + dc;
            if r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.cols {
                return Some((r as usize, c as usize, step));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_neighbors() {
        assert_eq!(Connectivity::Eight.neighbors(1, 1, 3, 3).count(), 8);
        assert_eq!(Connectivity::Four.neighbors(1, 1, 3, 3).count(), 4);
    }

    #[test]
    fn test_corner_neighbors() {
        let n: Vec<_> = Connectivity::Eight.neighbors(0, 0, 3, 3).collect();
        assert_eq!(n.len(), 3);
        assert!(n.contains(&(1, 1, SQRT_2)));
        assert!(n.contains(&(0, 1, 1.0)));
    }
}
