//! Grouping a classed raster into polygons, one feature per distinct cell
//! value. Used to turn the inundation engine's level raster into the
//! vector-mode output.
//!
//! The approach traces every boundary edge between a cell of the target
//! class and a neighbour of a different class (or the raster edge), then
//! chains those edges into closed rings. Each ring's winding direction
//! (clockwise vs counter-clockwise) tells outer boundaries from holes
//! apart, following the ESRI Shapefile convention.

use lahar_common::structures::{Array2D, Point2D};
use std::collections::HashMap;

/// One traced ring: the ring's vertices, in the order walked, plus whether
/// it's an outer boundary (clockwise in the ESRI convention) or a hole.
pub struct Ring {
    pub points: Vec<Point2D>,
    pub is_outer: bool,
}

/// Traces every distinct, non-nodata value in `raster` into one or more
/// rings each, returning a map from cell value to its rings.
///
/// `origin_x`/`origin_y` are the map coordinates of the raster's top-left
/// corner and `cell_size` its (square) pixel width.
pub fn trace_rings_by_value(
    raster: &Array2D<i32>,
    origin_x: f64,
    origin_y: f64,
    cell_size: f64,
) -> HashMap<i32, Vec<Ring>> {
    let rows = raster.rows();
    let columns = raster.columns();

    // Horizontal edges: the boundary segment above and below each cell.
    // Vertical edges: the boundary segment left and right of each cell.
    // Collect, per class value, the set of unit edges that separate a cell
    // of that class from a neighbour of a different class.
    let mut edges_by_value: HashMap<i32, Vec<((i64, i64), (i64, i64))>> = HashMap::new();

    for row in 0..rows {
        for col in 0..columns {
            let v = raster.get_value(row, col);
            if v <= 1 {
                continue; // unclassified background
            }
            let neighbours = [
                (row - 1, col, (row, col), (row, col + 1)), // top edge
                (row + 1, col, (row + 1, col + 1), (row + 1, col)), // bottom edge
                (row, col - 1, (row + 1, col), (row, col)), // left edge
                (row, col + 1, (row, col + 1), (row + 1, col + 1)), // right edge
            ];
            for &(nr, nc, (ar, ac), (br, bc)) in &neighbours {
                let nv = raster.get_value(nr, nc);
                if nv != v {
                    edges_by_value
                        .entry(v)
                        .or_default()
                        .push(((ar as i64, ac as i64), (br as i64, bc as i64)));
                }
            }
        }
    }

    let mut rings_by_value = HashMap::new();
    for (value, edges) in edges_by_value {
        let rings = chain_edges_into_rings(edges, origin_x, origin_y, cell_size);
        rings_by_value.insert(value, rings);
    }
    rings_by_value
}

/// Assembles a bag of directed unit edges (each from a cell-corner grid
/// index to its neighbour) into closed rings by following, from each
/// unvisited edge, the chain of edges sharing its endpoint.
fn chain_edges_into_rings(
    edges: Vec<((i64, i64), (i64, i64))>,
    origin_x: f64,
    origin_y: f64,
    cell_size: f64,
) -> Vec<Ring> {
    let mut by_start: HashMap<(i64, i64), Vec<(i64, i64)>> = HashMap::new();
    for &(a, b) in &edges {
        by_start.entry(a).or_default().push(b);
    }

    let mut rings = Vec::new();
    let mut visited: HashMap<((i64, i64), (i64, i64)), bool> = HashMap::new();

    for &(start, _) in &edges {
        let mut current = start;
        if by_start.get(&current).map(|v| v.is_empty()).unwrap_or(true) {
            continue;
        }

        let mut chain = vec![current];
        loop {
            let next = match by_start.get_mut(&current) {
                Some(candidates) => {
                    let mut picked = None;
                    for (i, cand) in candidates.iter().enumerate() {
                        if !visited.get(&(current, *cand)).copied().unwrap_or(false) {
                            picked = Some(i);
                            break;
                        }
                    }
                    match picked {
                        Some(i) => candidates[i],
                        None => break,
                    }
                }
                None => break,
            };
            visited.insert((current, next), true);
            current = next;
            if current == start {
                break;
            }
            chain.push(current);
        }

        if chain.len() < 3 {
            continue;
        }

        let area2 = signed_area2(&chain);
        let is_outer = area2 < 0.0; // clockwise, in row/column (down-positive) space

        let points: Vec<Point2D> = chain
            .iter()
            .map(|&(r, c)| Point2D::new(origin_x + c as f64 * cell_size, origin_y - r as f64 * cell_size))
            .collect();

        rings.push(Ring { points, is_outer });
    }

    rings
}

fn signed_area2(ring: &[(i64, i64)]) -> f64 {
    let mut sum = 0i64;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        sum += x1 * y2 - x2 * y1;
    }
    sum as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_produces_one_square_ring() {
        let mut raster = Array2D::<i32>::new(3, 3, 1, 0).unwrap();
        raster.set_value(1, 1, 2);
        let rings = trace_rings_by_value(&raster, 0.0, 3.0, 1.0);
        let rings_for_2 = rings.get(&2).unwrap();
        assert_eq!(rings_for_2.len(), 1);
        assert_eq!(rings_for_2[0].points.len(), 4);
        assert!(rings_for_2[0].is_outer);
    }

    #[test]
    fn block_of_cells_produces_single_ring() {
        let mut raster = Array2D::<i32>::new(4, 4, 1, 0).unwrap();
        for r in 1..3 {
            for c in 1..3 {
                raster.set_value(r, c, 3);
            }
        }
        let rings = trace_rings_by_value(&raster, 0.0, 4.0, 1.0);
        let rings_for_3 = rings.get(&3).unwrap();
        assert_eq!(rings_for_3.len(), 1);
        assert_eq!(rings_for_3[0].points.len(), 4);
    }
}
