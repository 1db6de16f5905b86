//! Boundary conditions on proposed node positions.
//!
//! Conditions run after the position update has been proposed and before it
//! is written back, so they see both the old population and the new
//! positions.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::population::CellPopulation;

/// Constraint applied to proposed node positions.
pub trait BoundaryCondition: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Correct `proposed` in place; indexed like the population's nodes.
    fn apply(&self, population: &CellPopulation, proposed: &mut [DVec2]);

    /// Whether every node of `population` currently satisfies the condition.
    fn verify(&self, population: &CellPopulation) -> bool;
}

/// Nodes may not cross a plane; offenders are projected back onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneBoundaryCondition {
    pub point: DVec2,
    /// Outward normal: the forbidden side
    pub normal: DVec2,
}

impl PlaneBoundaryCondition {
    pub fn new(point: DVec2, normal: DVec2) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    fn signed_distance(&self, x: DVec2) -> f64 {
        (x - self.point).dot(self.normal)
    }
}

impl BoundaryCondition for PlaneBoundaryCondition {
    fn name(&self) -> &str {
        "PlaneBoundaryCondition"
    }

    fn apply(&self, population: &CellPopulation, proposed: &mut [DVec2]) {
        for (node, x) in population.nodes().iter().zip(proposed.iter_mut()) {
            if node.is_fixed {
                continue;
            }
            let d = self.signed_distance(*x);
            if d > 0.0 {
                *x -= d * self.normal;
            }
        }
    }

    fn verify(&self, population: &CellPopulation) -> bool {
        population
            .nodes()
            .iter()
            .all(|n| self.signed_distance(n.position) <= 1e-12)
    }
}

/// Nodes are confined to a disc; offenders are projected onto its rim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularBoundaryCondition {
    pub centre: DVec2,
    pub radius: f64,
}

impl CircularBoundaryCondition {
    pub fn new(centre: DVec2, radius: f64) -> Self {
        Self { centre, radius }
    }
}

impl BoundaryCondition for CircularBoundaryCondition {
    fn name(&self) -> &str {
        "CircularBoundaryCondition"
    }

    fn apply(&self, population: &CellPopulation, proposed: &mut [DVec2]) {
        for (node, x) in population.nodes().iter().zip(proposed.iter_mut()) {
            if node.is_fixed {
                continue;
            }
            let offset = *x - self.centre;
            if offset.length() > self.radius {
                *x = self.centre + self.radius * offset.normalize_or_zero();
            }
        }
    }

    fn verify(&self, population: &CellPopulation) -> bool {
        population
            .nodes()
            .iter()
            .all(|n| n.position.distance(self.centre) <= self.radius + 1e-12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellId, ProliferativeType};
    use crate::population::NodeBasedCellPopulation;

    fn population(positions: Vec<DVec2>) -> CellPopulation {
        let cells = (0..positions.len() as u64)
            .map(|i| Cell::new(CellId(i), ProliferativeType::Transit, 0.0))
            .collect();
        NodeBasedCellPopulation::new(positions, cells, 1.5).unwrap().into()
    }

    #[test]
    fn test_plane_projects_crossing_nodes() {
        let population = population(vec![DVec2::ZERO, DVec2::ZERO]);
        let bc = PlaneBoundaryCondition::new(DVec2::ZERO, DVec2::new(0.0, -2.0));

        // Below y = 0 is forbidden
        let mut proposed = vec![DVec2::new(1.0, -0.5), DVec2::new(2.0, 0.5)];
        bc.apply(&population, &mut proposed);

        assert_eq!(proposed[0], DVec2::new(1.0, 0.0));
        assert_eq!(proposed[1], DVec2::new(2.0, 0.5));
    }

    #[test]
    fn test_circle_projects_onto_rim() {
        let population = population(vec![DVec2::ZERO]);
        let bc = CircularBoundaryCondition::new(DVec2::ZERO, 2.0);

        let mut proposed = vec![DVec2::new(3.0, 4.0)];
        bc.apply(&population, &mut proposed);

        assert!((proposed[0] - DVec2::new(1.2, 1.6)).length() < 1e-12);
        assert!(bc.verify(&population));
    }

    #[test]
    fn test_verify_detects_violation() {
        let population = population(vec![DVec2::new(0.0, -1.0)]);
        let bc = PlaneBoundaryCondition::new(DVec2::ZERO, DVec2::NEG_Y);
        assert!(!bc.verify(&population));
    }
}
