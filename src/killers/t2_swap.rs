//! T2 swaps: removal of vanishing triangular cells.
//!
//! A vertex-based cell that shrinks to (almost) nothing is replaced by a
//! single node at its centroid. Neighbours are re-stitched in place so their
//! winding is unchanged:
//! ```text
//!      \   /            \   /
//!       \ /              \ /
//!        *                |
//!       / \      ──▶      *
//!   ---*---*---       ---/ \---
//! ```
//! Only triangles are swapped. Larger polygons below the area threshold and
//! triangles whose removal would leave a neighbour with fewer than three
//! nodes are skipped with a warning.

use serde::{Deserialize, Serialize};

use super::CellKiller;
use crate::cell::CellId;
use crate::geometry::MeshError;
use crate::population::{CellPopulation, TopologyError, VertexBasedCellPopulation};
use crate::simulation::SimulationContext;

/// Why a candidate below the threshold was left in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Degenerate, but not a triangle
    NotTriangular { nodes: usize },
    /// Collapsing would degenerate a neighbouring element
    NeighbourWouldDegenerate { neighbour: usize, remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub cell: CellId,
    pub area: f64,
    pub reason: SkipReason,
}

/// Outcome of one maintenance scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct T2SwapReport {
    /// Cells removed, in the order they were swapped
    pub swapped: Vec<CellId>,
    pub skipped: Vec<SkippedCandidate>,
}

impl T2SwapReport {
    pub fn is_empty(&self) -> bool {
        self.swapped.is_empty() && self.skipped.is_empty()
    }
}

/// Performs T2 swaps on every element at or below `threshold`.
///
/// A threshold of zero or less disables swapping.
#[derive(Debug, Clone, PartialEq)]
pub struct T2SwapCellKiller {
    pub threshold: f64,
}

impl T2SwapCellKiller {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn is_enabled(&self) -> bool {
        self.threshold > 0.0
    }

    /// Scan a vertex population once.
    ///
    /// Candidates are processed in ascending cell id. Each one is re-checked
    /// against the mesh left by earlier swaps in the same scan.
    pub fn scan(&self, population: &mut VertexBasedCellPopulation) -> Result<T2SwapReport, TopologyError> {
        let mut report = T2SwapReport::default();
        if !self.is_enabled() {
            return Ok(report);
        }

        let mut candidates: Vec<CellId> = population
            .cells()
            .iter()
            .filter(|c| population.mesh().element_area(c.location_index) <= self.threshold)
            .map(|c| c.id)
            .collect();
        candidates.sort();

        for id in candidates {
            let Some(index) = population.cells().iter().position(|c| c.id == id) else {
                continue;
            };
            let area = population.mesh().element_area(index);
            if area > self.threshold {
                continue;
            }

            let nodes = population.mesh().elements[index].num_nodes();
            if nodes != 3 {
                log::warn!(
                    "Cell {} has area {:.3e} below the T2 threshold but {} nodes, skipping",
                    id,
                    area,
                    nodes
                );
                report.skipped.push(SkippedCandidate {
                    cell: id,
                    area,
                    reason: SkipReason::NotTriangular { nodes },
                });
                continue;
            }

            match population.remove_location(index) {
                Ok(()) => {
                    log::debug!("T2 swap removed cell {} (area {:.3e})", id, area);
                    report.swapped.push(id);
                }
                Err(MeshError::NeighbourWouldDegenerate {
                    neighbour, remaining, ..
                }) => {
                    log::warn!(
                        "T2 swap of cell {} would leave element {} with {} nodes, skipping",
                        id,
                        neighbour,
                        remaining
                    );
                    report.skipped.push(SkippedCandidate {
                        cell: id,
                        area,
                        reason: SkipReason::NeighbourWouldDegenerate { neighbour, remaining },
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(report)
    }
}

impl Default for T2SwapCellKiller {
    fn default() -> Self {
        Self::new(0.001)
    }
}

impl CellKiller for T2SwapCellKiller {
    fn name(&self) -> &str {
        "T2SwapCellKiller"
    }

    /// Swapped cells are removed immediately rather than marked.
    fn check_and_kill(
        &mut self,
        population: &mut CellPopulation,
        _context: &mut SimulationContext,
    ) -> Result<Vec<CellId>, TopologyError> {
        match population.as_vertex_based_mut() {
            Some(vertex) => Ok(self.scan(vertex)?.swapped),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, ProliferativeType};
    use crate::geometry::VertexMesh;
    use glam::DVec2;

    /// A square split into four quads around a small central square, plus
    /// a small quad candidate: used to check non-triangles are skipped.
    fn square_with_small_quad(side: f64) -> VertexBasedCellPopulation {
        let h = side / 2.0;
        let positions = vec![
            DVec2::new(-h, -h),
            DVec2::new(h, -h),
            DVec2::new(h, h),
            DVec2::new(-h, h),
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ];
        let elements = vec![
            vec![0, 1, 2, 3],
            vec![4, 5, 1, 0],
            vec![5, 6, 2, 1],
            vec![6, 7, 3, 2],
            vec![7, 4, 0, 3],
        ];
        let mesh = VertexMesh::new(positions, elements).unwrap();
        let cells = (0..5)
            .map(|i| Cell::new(CellId(i), ProliferativeType::Transit, 0.0))
            .collect();
        VertexBasedCellPopulation::new(mesh, cells).unwrap()
    }

    #[test]
    fn test_non_triangle_is_skipped() {
        let mut population = square_with_small_quad(1e-3);
        let killer = T2SwapCellKiller::new(1e-4);

        let report = killer.scan(&mut population).unwrap();

        assert!(report.swapped.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].cell, CellId(0));
        assert_eq!(report.skipped[0].reason, SkipReason::NotTriangular { nodes: 4 });
        assert_eq!(population.cells().len(), 5);
    }

    #[test]
    fn test_disabled_threshold_is_noop() {
        let mut population = square_with_small_quad(1e-3);
        for threshold in [0.0, -1.0] {
            let report = T2SwapCellKiller::new(threshold).scan(&mut population).unwrap();
            assert!(report.is_empty());
        }
    }

    #[test]
    fn test_triangle_with_triangle_neighbour_is_skipped() {
        // Two triangles sharing an edge: collapsing either leaves the
        // other with two nodes
        let positions = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1e-3, 0.0),
            DVec2::new(0.0, 1e-3),
            DVec2::new(1.0, 1.0),
        ];
        let mesh = VertexMesh::new(positions, vec![vec![0, 1, 2], vec![1, 3, 2]]).unwrap();
        let cells = (0..2)
            .map(|i| Cell::new(CellId(i), ProliferativeType::Transit, 0.0))
            .collect();
        let mut population = VertexBasedCellPopulation::new(mesh, cells).unwrap();

        let report = T2SwapCellKiller::new(1e-4).scan(&mut population).unwrap();
        assert!(report.swapped.is_empty());
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::NeighbourWouldDegenerate { neighbour: 1, remaining: 2 }
        ));
        assert_eq!(population.cells().len(), 2);
    }
}
