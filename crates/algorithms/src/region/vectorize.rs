//! Mask to polygon conversion
//!
//! Polygons follow cell edges. Boundary edges of member cells are chained
//! into rings with member cells on the right (screen orientation, rows
//! growing downward). Where member cells meet only at a corner the chain
//! turns left and carries on around the diagonal neighbour, so every
//! 8-connected group of cells is bounded by a single exterior ring that
//! touches itself at those corners. Rings with positive grid-space area are
//! exteriors, the rest are holes assigned to the smallest exterior around them.

use std::collections::HashMap;

use geo::{coord, Area, Contains, Coord, LineString, MultiPolygon, Orient, Point, Polygon};
use geo::orient::Direction;
use travesia_core::Mask;

/// Directed boundary edge between two grid corners (row, col)
#[derive(Debug, Clone, Copy)]
struct Edge {
    from: (usize, usize),
    to: (usize, usize),
}

impl Edge {
    fn direction(&self) -> (isize, isize) {
        (
            self.to.0 as isize - self.from.0 as isize,
            self.to.1 as isize - self.from.1 as isize,
        )
    }
}

/// Member-cell boundary edges, clockwise around each cell on screen.
fn boundary_edges(mask: &Mask) -> Vec<Edge> {
    let inside = |r: isize, c: isize| r >= 0 && c >= 0 && mask.contains_cell(r as usize, c as usize);
    let mut edges = Vec::new();
    for (r, c) in mask.cells() {
        let (ri, ci) = (r as isize, c as isize);
        if !inside(ri - 1, ci) {
            edges.push(Edge { from: (r, c), to: (r, c + 1) });
        }
        if !inside(ri, ci + 1) {
            edges.push(Edge { from: (r, c + 1), to: (r + 1, c + 1) });
        }
        if !inside(ri + 1, ci) {
            edges.push(Edge { from: (r + 1, c + 1), to: (r + 1, c) });
        }
        if !inside(ri, ci - 1) {
            edges.push(Edge { from: (r + 1, c), to: (r, c) });
        }
    }
    edges
}

/// Chain edges into closed rings of corner vertices (first vertex not repeated).
fn chain_rings(edges: &[Edge]) -> Vec<Vec<(usize, usize)>> {
    let mut outgoing: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut ring = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            ring.push(edges[current].from);
            let next = next_edge(edges, &outgoing, current);
            match next {
                Some(n) if n == start => break,
                Some(n) if !used[n] => current = n,
                // Dangling chains only arise from malformed input
                _ => break,
            }
        }
        rings.push(simplify_ring(ring));
    }
    rings
}

/// Successor of `current`; at pinch corners the left turn joins diagonal cells.
fn next_edge(edges: &[Edge], outgoing: &HashMap<(usize, usize), Vec<usize>>, current: usize) -> Option<usize> {
    let candidates = outgoing.get(&edges[current].to)?;
    if candidates.len() == 1 {
        return Some(candidates[0]);
    }
    let (dr, dc) = edges[current].direction();
    let left = (-dc, dr);
    candidates
        .iter()
        .copied()
        .find(|&i| edges[i].direction() == left)
        .or_else(|| candidates.first().copied())
}

/// Drop vertices where the ring continues straight.
fn simplify_ring(ring: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    let n = ring.len();
    if n < 4 {
        return ring;
    }
    let dir = |a: (usize, usize), b: (usize, usize)| {
        (
            (b.0 as isize - a.0 as isize).signum(),
            (b.1 as isize - a.1 as isize).signum(),
        )
    };
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            dir(prev, ring[i]) != dir(ring[i], next)
        })
        .map(|i| ring[i])
        .collect()
}

/// Closed ring in grid space, x = col, y = row.
fn grid_ring(ring: &[(usize, usize)]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(r, c)| coord! { x: c as f64, y: r as f64 })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// A point strictly inside the cell to the left of the ring's first edge.
fn point_left_of(ring: &[(usize, usize)]) -> Point<f64> {
    let (a, b) = (ring[0], ring[1 % ring.len()]);
    let (dr, dc) = (
        (b.0 as f64 - a.0 as f64).signum(),
        (b.1 as f64 - a.1 as f64).signum(),
    );
    // Left of (dr, dc) on screen is (-dc, dr)
    let mid_r = a.0 as f64 + dr * 0.5 - dc * 0.5;
    let mid_c = a.1 as f64 + dc * 0.5 + dr * 0.5;
    Point::new(mid_c, mid_r)
}

/// Polygons covering the member cells of `mask`, in the mask's map coordinates.
///
/// One polygon per 8-connected group of member cells. Exterior rings are
/// counter-clockwise and holes clockwise in map space. An empty mask gives
/// an empty `MultiPolygon`.
pub fn vectorize_mask(mask: &Mask) -> MultiPolygon<f64> {
    let rings = chain_rings(&boundary_edges(mask));

    let mut exteriors: Vec<(Polygon<f64>, f64, Vec<LineString<f64>>)> = Vec::new();
    let mut holes: Vec<(LineString<f64>, Point<f64>)> = Vec::new();
    for ring in rings.iter().filter(|r| r.len() >= 4) {
        let line = grid_ring(ring);
        let area = Polygon::new(line.clone(), vec![]).signed_area();
        if area > 0.0 {
            exteriors.push((Polygon::new(line, vec![]), area, Vec::new()));
        } else {
            holes.push((line, point_left_of(ring)));
        }
    }

    for (hole, inner) in holes {
        let owner = exteriors
            .iter_mut()
            .filter(|(poly, _, _)| poly.contains(&inner))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((_, _, interiors)) = owner {
            interiors.push(hole);
        }
    }

    let transform = *mask.transform();
    let to_map = |ls: LineString<f64>| -> LineString<f64> {
        ls.into_iter()
            .map(|c| {
                let (x, y) = transform.pixel_to_geo_corner(c.x as usize, c.y as usize);
                coord! { x: x, y: y }
            })
            .collect()
    };

    exteriors
        .into_iter()
        .map(|(poly, _, interiors)| {
            let (exterior, _) = poly.into_inner();
            Polygon::new(to_map(exterior), interiors.into_iter().map(to_map).collect())
                .orient(Direction::Default)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use travesia_core::raster::MASK_IN;
    use travesia_core::{GeoTransform, Raster};

    fn mask_from(rows: usize, cols: usize, cells: &[(usize, usize)]) -> Mask {
        let mut m: Mask = Raster::new(rows, cols);
        m.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
        for &(r, c) in cells {
            m.set(r, c, MASK_IN).unwrap();
        }
        m
    }

    #[test]
    fn test_single_cell_square() {
        let mp = vectorize_mask(&mask_from(3, 3, &[(1, 1)]));
        assert_eq!(mp.0.len(), 1);
        let poly = &mp.0[0];
        assert_eq!(poly.exterior().0.len(), 5);
        assert_relative_eq!(poly.signed_area(), 100.0);
    }

    #[test]
    fn test_block_with_hole() {
        let mut cells = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                if (r, c) != (1, 1) {
                    cells.push((r, c));
                }
            }
        }
        let mp = vectorize_mask(&mask_from(3, 3, &cells));
        assert_eq!(mp.0.len(), 1);
        let poly = &mp.0[0];
        assert_eq!(poly.interiors().len(), 1);
        assert_relative_eq!(poly.unsigned_area(), 800.0);
        // straight runs collapse to the four corners
        assert_eq!(poly.exterior().0.len(), 5);
    }

    #[test]
    fn test_diagonal_cells_form_one_group() {
        let mp = vectorize_mask(&mask_from(2, 2, &[(0, 0), (1, 1)]));
        assert_eq!(mp.0.len(), 1);
        assert_relative_eq!(mp.unsigned_area(), 200.0);
        assert!(mp.0[0].interiors().is_empty());

        let anti = vectorize_mask(&mask_from(2, 2, &[(0, 1), (1, 0)]));
        assert_eq!(anti.0.len(), 1);
        assert_relative_eq!(anti.unsigned_area(), 200.0);
    }

    #[test]
    fn test_diagonal_line_is_one_polygon() {
        let cells: Vec<(usize, usize)> = (0..5).map(|i| (i, i)).collect();
        let mp = vectorize_mask(&mask_from(5, 5, &cells));
        assert_eq!(mp.0.len(), 1);
        let poly = &mp.0[0];
        assert!(poly.interiors().is_empty());
        assert_relative_eq!(poly.unsigned_area(), 500.0);
        // four corners per cell; each of the four pinch corners is visited twice
        assert_eq!(poly.exterior().0.len(), 5 * 4 + 1);
    }

    #[test]
    fn test_separate_groups_stay_apart() {
        // Two diagonal pairs with a full empty column between them
        let mp = vectorize_mask(&mask_from(2, 5, &[(0, 0), (1, 1), (0, 4), (1, 3)]));
        assert_eq!(mp.0.len(), 2);
        assert_relative_eq!(mp.unsigned_area(), 400.0);
    }

    #[test]
    fn test_nested_island_in_hole() {
        // 5x5 ring of cells, empty moat, single island in the centre
        let mut cells = Vec::new();
        for r in 0..5 {
            for c in 0..5 {
                if r == 0 || r == 4 || c == 0 || c == 4 || (r, c) == (2, 2) {
                    cells.push((r, c));
                }
            }
        }
        let mp = vectorize_mask(&mask_from(5, 5, &cells));
        assert_eq!(mp.0.len(), 2);
        let holes: usize = mp.0.iter().map(|p| p.interiors().len()).sum();
        assert_eq!(holes, 1);
        assert_relative_eq!(mp.unsigned_area(), 17.0 * 100.0);
    }

    #[test]
    fn test_empty_mask() {
        assert!(vectorize_mask(&mask_from(3, 3, &[])).0.is_empty());
    }
}
