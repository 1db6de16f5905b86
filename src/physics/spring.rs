//! Generalised linear spring between neighbouring cell centres.
//!
//! For two cells at distance d with rest length s and overlap δ = d - s:
//!
//! compressed (δ < 0): F = μ s ln(1 + δ/s)
//! stretched  (δ ≥ 0): F = μ δ exp(-α δ/s)
//!
//! The force acts along the line between the centres; positive values pull
//! the cells together. Pairs further apart than the cut-off do not interact.
//!
//! Reference: Meineke et al., Cell Prolif 2001; Atwell et al., Phys Rev E 2016

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{Force, WarnOnce};
use crate::cell::Cell;
use crate::population::CellPopulation;

/// Spring parameters (cell diameters, hours)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParameters {
    /// Spring constant μ
    pub stiffness: f64,
    /// Decay α of the attractive branch
    pub alpha: f64,
    pub rest_length: f64,
    pub cutoff: f64,
    /// Centre separation right after division
    pub division_separation: f64,
    /// Time over which a new pair's rest length relaxes to `rest_length`
    pub growth_duration: f64,
}

impl Default for SpringParameters {
    fn default() -> Self {
        Self {
            stiffness: 15.0,
            alpha: 5.0,
            rest_length: 1.0,
            cutoff: 1.5,
            division_separation: 0.3,
            growth_duration: 1.0,
        }
    }
}

/// Spring force for centre-based populations.
#[derive(Debug, Default)]
pub struct GeneralisedLinearSpringForce {
    pub params: SpringParameters,
    warned: WarnOnce,
}

impl GeneralisedLinearSpringForce {
    pub fn new(params: SpringParameters) -> Self {
        Self {
            params,
            warned: WarnOnce::default(),
        }
    }

    /// Rest length of the spring between two cells.
    ///
    /// A parent and the daughter it just produced start at the division
    /// separation; the spring relaxes linearly to `rest_length` while both
    /// are younger than the growth duration. Every other pair uses
    /// `rest_length`.
    pub fn rest_length(&self, a: &Cell, b: &Cell, time: f64) -> f64 {
        let p = &self.params;
        let siblings = a.parent == Some(b.id) || b.parent == Some(a.id);
        let (age_a, age_b) = (a.age(time), b.age(time));
        if siblings && p.growth_duration > 0.0 && age_a < p.growth_duration && age_b < p.growth_duration {
            let fraction = (age_a.min(age_b) / p.growth_duration).clamp(0.0, 1.0);
            p.division_separation + (p.rest_length - p.division_separation) * fraction
        } else {
            p.rest_length
        }
    }

    /// Signed force magnitude for a spring of length `distance`.
    pub fn magnitude(&self, distance: f64, rest_length: f64) -> f64 {
        let overlap = distance - rest_length;
        if overlap < 0.0 {
            self.params.stiffness * rest_length * (1.0 + overlap / rest_length).ln()
        } else {
            self.params.stiffness * overlap * (-self.params.alpha * overlap / rest_length).exp()
        }
    }
}

impl Force for GeneralisedLinearSpringForce {
    fn name(&self) -> &str {
        "GeneralisedLinearSpringForce"
    }

    fn add_force_contribution(&self, population: &CellPopulation, time: f64, forces: &mut [DVec2]) {
        let Some(centres) = population.as_centre_based() else {
            self.warned.inapplicable(self.name(), population.kind());
            return;
        };
        let cells = population.cells();
        let nodes = population.nodes();

        for (i, j) in centres.pairs_within(self.params.cutoff) {
            let offset = nodes[j].position - nodes[i].position;
            let distance = offset.length();
            if distance < 1e-12 {
                // Coincident centres have no direction to push along
                continue;
            }
            let unit = offset / distance;
            let rest = self.rest_length(&cells[i], &cells[j], time);
            let force = self.magnitude(distance, rest) * unit;

            forces[i] += force;
            forces[j] -= force;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellId, ProliferativeType};
    use crate::population::NodeBasedCellPopulation;
    use approx::assert_relative_eq;

    fn pair(distance: f64, birth_time: f64) -> CellPopulation {
        let cells = vec![
            Cell::new(CellId(0), ProliferativeType::Transit, birth_time),
            Cell::new(CellId(1), ProliferativeType::Transit, birth_time),
        ];
        NodeBasedCellPopulation::new(vec![DVec2::ZERO, DVec2::new(distance, 0.0)], cells, 1.5)
            .unwrap()
            .into()
    }

    fn forces(force: &GeneralisedLinearSpringForce, population: &CellPopulation, time: f64) -> Vec<DVec2> {
        let mut out = vec![DVec2::ZERO; population.num_nodes()];
        force.add_force_contribution(population, time, &mut out);
        out
    }

    #[test]
    fn test_rest_length_gives_zero_force() {
        let force = GeneralisedLinearSpringForce::default();
        let f = forces(&force, &pair(1.0, -10.0), 0.0);
        assert_relative_eq!(f[0].length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compressed_pair_repels() {
        let force = GeneralisedLinearSpringForce::default();
        let f = forces(&force, &pair(0.8, -10.0), 0.0);

        // 15 * ln(0.8)
        assert_relative_eq!(f[0].x, 15.0 * 0.8_f64.ln(), epsilon = 1e-12);
        assert!(f[0].x < 0.0 && f[1].x > 0.0);
        assert_relative_eq!((f[0] + f[1]).length(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stretched_pair_attracts() {
        let force = GeneralisedLinearSpringForce::default();
        let f = forces(&force, &pair(1.2, -10.0), 0.0);

        let expected = 15.0 * 0.2 * (-5.0_f64 * 0.2).exp();
        assert_relative_eq!(f[0].x, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_beyond_cutoff_no_force() {
        let force = GeneralisedLinearSpringForce::default();
        let f = forces(&force, &pair(1.6, -10.0), 0.0);
        assert_eq!(f, vec![DVec2::ZERO; 2]);
    }

    #[test]
    fn test_newborn_pair_rests_at_division_separation() {
        let force = GeneralisedLinearSpringForce::default();
        let parent = Cell::new(CellId(0), ProliferativeType::Transit, 0.0);
        let mut daughter = Cell::new(CellId(1), ProliferativeType::Transit, 0.0);
        daughter.parent = Some(CellId(0));
        let population: CellPopulation =
            NodeBasedCellPopulation::new(vec![DVec2::ZERO, DVec2::new(0.3, 0.0)], vec![parent, daughter], 1.5)
                .unwrap()
                .into();

        let f = forces(&force, &population, 0.0);
        assert_relative_eq!(f[0].length(), 0.0, epsilon = 1e-12);

        // Halfway through growth the rest length is 0.65
        let cells = population.cells();
        assert_relative_eq!(force.rest_length(&cells[0], &cells[1], 0.5), 0.65, epsilon = 1e-12);
        assert_relative_eq!(force.rest_length(&cells[1], &cells[0], 0.5), 0.65, epsilon = 1e-12);
    }

    #[test]
    fn test_unrelated_young_cells_use_full_rest_length() {
        let force = GeneralisedLinearSpringForce::default();
        let population = pair(0.3, 0.0);
        let cells = population.cells();

        assert_eq!(force.rest_length(&cells[0], &cells[1], 0.5), 1.0);
        let f = forces(&force, &population, 0.5);
        assert!(f[0].x < 0.0, "unrelated cells 0.3 apart are pushed apart");
    }

    #[test]
    fn test_vertex_population_gets_nothing() {
        let mesh = crate::geometry::HoneycombGenerator::new(1, 1).generate().unwrap();
        let cells = vec![Cell::new(CellId(0), ProliferativeType::Transit, 0.0)];
        let population: CellPopulation = crate::population::VertexBasedCellPopulation::new(mesh, cells)
            .unwrap()
            .into();

        let force = GeneralisedLinearSpringForce::default();
        let f = forces(&force, &population, 0.0);
        assert!(f.iter().all(|v| *v == DVec2::ZERO));
    }
}
