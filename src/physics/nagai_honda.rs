//! Nagai-Honda vertex model.
//!
//! Tissue energy summed over elements:
//!
//! E = Σ λ (A - A₀)² + Σ β P² + Σ_edges γ l
//!
//! where γ is the cell-cell adhesion for edges shared by two elements and the
//! cell-boundary adhesion for edges on the tissue boundary. The force on a
//! node is -∇E with respect to its position.
//!
//! The target area A₀ of a young cell grows linearly from half its mature
//! value to the mature value over the growth duration.
//!
//! Reference: Nagai & Honda, Phil Mag B 2001; Fletcher et al., Biophys J 2013

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{Force, WarnOnce};
use crate::cell::Cell;
use crate::geometry::polygon;
use crate::population::CellPopulation;

/// Vertex model energy parameters (dimensionless)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NagaiHondaParameters {
    /// Area elasticity λ
    pub deformation_energy: f64,
    /// Perimeter contractility β
    pub membrane_surface_energy: f64,
    pub cell_cell_adhesion_energy: f64,
    pub cell_boundary_adhesion_energy: f64,
    /// Hours for a new cell's target area to reach its mature value
    pub growth_duration: f64,
}

impl Default for NagaiHondaParameters {
    fn default() -> Self {
        Self {
            deformation_energy: 100.0,
            membrane_surface_energy: 10.0,
            cell_cell_adhesion_energy: 1.0,
            cell_boundary_adhesion_energy: 1.0,
            growth_duration: 1.0,
        }
    }
}

/// Energy-gradient force for vertex-based populations.
#[derive(Debug, Default)]
pub struct NagaiHondaForce {
    pub params: NagaiHondaParameters,
    warned: WarnOnce,
}

impl NagaiHondaForce {
    pub fn new(params: NagaiHondaParameters) -> Self {
        Self {
            params,
            warned: WarnOnce::default(),
        }
    }

    /// Current target area of `cell`.
    pub fn target_area(&self, cell: &Cell, time: f64) -> f64 {
        let duration = self.params.growth_duration;
        if duration <= 0.0 {
            return cell.target_area;
        }
        let fraction = (cell.age(time) / duration).clamp(0.0, 1.0);
        cell.target_area * 0.5 * (1.0 + fraction)
    }
}

impl Force for NagaiHondaForce {
    fn name(&self) -> &str {
        "NagaiHondaForce"
    }

    fn add_force_contribution(&self, population: &CellPopulation, time: f64, forces: &mut [DVec2]) {
        let Some(vertex) = population.as_vertex_based() else {
            self.warned.inapplicable(self.name(), population.kind());
            return;
        };
        let mesh = vertex.mesh();
        let p = &self.params;

        for (index, element) in mesh.elements.iter().enumerate() {
            let positions = mesh.element_positions(index);
            let n = positions.len();
            let area = polygon::signed_area(&positions);
            let perimeter = polygon::perimeter(&positions);
            let target = self.target_area(&vertex.cells()[index], time);

            // γ for the edge from local node j to j + 1
            let adhesion: Vec<f64> = element
                .edges()
                .map(|(a, b)| {
                    if mesh.elements_sharing_edge(a, b).len() > 1 {
                        p.cell_cell_adhesion_energy
                    } else {
                        p.cell_boundary_adhesion_energy
                    }
                })
                .collect();

            for (j, &node) in element.nodes.iter().enumerate() {
                let here = positions[j];
                let prev = positions[(j + n - 1) % n];
                let next = positions[(j + 1) % n];

                let area_gradient = polygon::signed_area_gradient(&positions, j);
                let perimeter_gradient = polygon::perimeter_gradient(&positions, j);
                let adhesion_gradient = adhesion[(j + n - 1) % n] * polygon::unit_or_zero(here - prev)
                    + adhesion[j] * polygon::unit_or_zero(here - next);

                let gradient = 2.0 * p.deformation_energy * (area - target) * area_gradient
                    + 2.0 * p.membrane_surface_energy * perimeter * perimeter_gradient
                    + adhesion_gradient;

                forces[node] -= gradient;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellId, ProliferativeType};
    use crate::geometry::{HoneycombGenerator, VertexMesh};
    use crate::population::VertexBasedCellPopulation;
    use approx::assert_relative_eq;

    fn energy(force: &NagaiHondaForce, population: &CellPopulation, time: f64) -> f64 {
        let vertex = population.as_vertex_based().unwrap();
        let mesh = vertex.mesh();
        let p = &force.params;
        let mut total = 0.0;
        for (index, element) in mesh.elements.iter().enumerate() {
            let area = mesh.element_area(index);
            let target = force.target_area(&vertex.cells()[index], time);
            let perimeter = mesh.element_perimeter(index);
            total += p.deformation_energy * (area - target).powi(2);
            total += p.membrane_surface_energy * perimeter * perimeter;
            for (a, b) in element.edges() {
                let gamma = if mesh.elements_sharing_edge(a, b).len() > 1 {
                    p.cell_cell_adhesion_energy
                } else {
                    p.cell_boundary_adhesion_energy
                };
                total += gamma * mesh.nodes[a].position.distance(mesh.nodes[b].position);
            }
        }
        total
    }

    fn population(mesh: VertexMesh, birth_time: f64) -> CellPopulation {
        let cells = (0..mesh.num_elements() as u64)
            .map(|i| Cell::new(CellId(i), ProliferativeType::Transit, birth_time))
            .collect();
        VertexBasedCellPopulation::new(mesh, cells).unwrap().into()
    }

    #[test]
    fn test_force_is_negative_energy_gradient() {
        let mut mesh = HoneycombGenerator::new(2, 2).generate().unwrap();
        // Perturb so the configuration is not symmetric
        mesh.nodes[3].position += DVec2::new(0.05, -0.03);
        let force = NagaiHondaForce::new(NagaiHondaParameters {
            cell_boundary_adhesion_energy: 2.0,
            ..Default::default()
        });
        let population = population(mesh, 0.0);
        let time = 0.4;

        let mut forces = vec![DVec2::ZERO; population.num_nodes()];
        force.add_force_contribution(&population, time, &mut forces);

        let h = 1e-6;
        for node in 0..population.num_nodes() {
            for axis in [DVec2::X, DVec2::Y] {
                let mut plus = population.clone();
                let mut minus = population.clone();
                let mut pp = plus.node_positions();
                pp[node] += h * axis;
                plus.set_node_positions(&pp).unwrap();
                let mut mp = minus.node_positions();
                mp[node] -= h * axis;
                minus.set_node_positions(&mp).unwrap();

                let derivative = (energy(&force, &plus, time) - energy(&force, &minus, time)) / (2.0 * h);
                assert_relative_eq!(forces[node].dot(axis), -derivative, epsilon = 1e-4, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_total_force_vanishes() {
        let mesh = HoneycombGenerator::new(3, 2).generate().unwrap();
        let population = population(mesh, -5.0);
        let mut forces = vec![DVec2::ZERO; population.num_nodes()];
        NagaiHondaForce::default().add_force_contribution(&population, 0.0, &mut forces);

        let total: DVec2 = forces.iter().copied().sum();
        assert!(total.length() < 1e-9, "net force {:?}", total);
    }

    #[test]
    fn test_target_area_growth() {
        let force = NagaiHondaForce::default();
        let cell = Cell::new(CellId(0), ProliferativeType::Transit, 0.0);
        assert_relative_eq!(force.target_area(&cell, 0.0), 0.5);
        assert_relative_eq!(force.target_area(&cell, 0.5), 0.75);
        assert_relative_eq!(force.target_area(&cell, 3.0), 1.0);
    }
}
