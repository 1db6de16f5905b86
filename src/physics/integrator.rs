//! Overdamped position update.
//!
//! Cells move in a viscous medium where inertia is negligible, so node
//! velocity is proportional to force:
//!
//! x(t + dt) = x(t) + dt * F / η
//!
//! with η the population's damping constant. Displacements larger than the
//! configured maximum are clamped for stability and reported.
//!
//! Reference: Fletcher et al., Prog Biophys Mol Biol 2013

use glam::DVec2;

use crate::population::{CellPopulation, TopologyError};

/// Explicit Euler step of the overdamped equation of motion.
#[derive(Debug, Clone)]
pub struct OverdampedIntegrator {
    /// Maximum allowed displacement per step
    pub max_displacement: f64,
}

impl OverdampedIntegrator {
    pub fn new(max_displacement: f64) -> Self {
        Self { max_displacement }
    }

    /// No displacement clamp.
    pub fn unlimited() -> Self {
        Self::new(f64::INFINITY)
    }

    /// Positions after one step, without modifying the population.
    ///
    /// Fixed nodes keep their position.
    pub fn propose(
        &self,
        population: &CellPopulation,
        forces: &[DVec2],
        dt: f64,
    ) -> Result<Vec<DVec2>, TopologyError> {
        let nodes = population.nodes();
        if forces.len() != nodes.len() {
            return Err(TopologyError::NodeCountMismatch {
                expected: nodes.len(),
                actual: forces.len(),
            });
        }

        let damping = population.damping_constant();
        let mut clamped = 0usize;
        let mut largest = 0.0f64;

        let proposed = nodes
            .iter()
            .zip(forces)
            .map(|(node, force)| {
                if node.is_fixed {
                    return node.position;
                }
                let mut displacement = dt * *force / damping;

                // Clamp displacement for stability
                let magnitude = displacement.length();
                if magnitude > self.max_displacement {
                    displacement *= self.max_displacement / magnitude;
                    clamped += 1;
                    largest = largest.max(magnitude);
                }
                node.position + displacement
            })
            .collect();

        if clamped > 0 {
            log::warn!(
                "Clamped displacement of {} nodes (largest {:.3} > {:.3}); consider a smaller timestep",
                clamped,
                largest,
                self.max_displacement
            );
        }
        Ok(proposed)
    }
}

impl Default for OverdampedIntegrator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellId, ProliferativeType};
    use crate::population::NodeBasedCellPopulation;

    fn single(position: DVec2) -> CellPopulation {
        let cells = vec![Cell::new(CellId(0), ProliferativeType::Transit, 0.0)];
        NodeBasedCellPopulation::new(vec![position], cells, 1.5).unwrap().into()
    }

    #[test]
    fn test_displacement_scales_with_damping() {
        let mut population = NodeBasedCellPopulation::new(
            vec![DVec2::ZERO],
            vec![Cell::new(CellId(0), ProliferativeType::Transit, 0.0)],
            1.5,
        )
        .unwrap();
        population.damping_constant = 4.0;
        let population = CellPopulation::from(population);

        let proposed = OverdampedIntegrator::default()
            .propose(&population, &[DVec2::new(1.0, 0.0)], 0.5)
            .unwrap();
        assert_eq!(proposed[0], DVec2::new(0.125, 0.0));
    }

    #[test]
    fn test_large_displacement_is_clamped() {
        let population = single(DVec2::ZERO);
        let proposed = OverdampedIntegrator::new(0.1)
            .propose(&population, &[DVec2::new(0.0, 100.0)], 1.0)
            .unwrap();
        assert!((proposed[0].y - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_force_count_must_match() {
        let population = single(DVec2::ZERO);
        let err = OverdampedIntegrator::default()
            .propose(&population, &[], 1.0)
            .unwrap_err();
        assert!(matches!(err, TopologyError::NodeCountMismatch { expected: 1, actual: 0 }));
    }

    #[test]
    fn test_population_is_not_modified() {
        let population = single(DVec2::new(1.0, 1.0));
        OverdampedIntegrator::default()
            .propose(&population, &[DVec2::ONE], 0.1)
            .unwrap();
        assert_eq!(population.node_positions(), vec![DVec2::new(1.0, 1.0)]);
    }
}
