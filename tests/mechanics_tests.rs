//! Mechanics tests: force laws, overdamped motion, boundaries and
//! population mutations.
//!
//! Reference behaviour:
//! | Check | Expectation |
//! |-------|-------------|
//! | Centre division at (0,0) with v = (0.5,0) | parent (-0.5,0), daughter (0.5,0) |
//! | Compressed spring pair | pushed apart symmetrically |
//! | Internal vertex forces | sum to zero |
//! | Element division | total area conserved |

use approx::assert_relative_eq;
use cell_population_sim::{
    cell::{Cell, CellId, ProliferativeType},
    config::SimulationParameters,
    geometry::HoneycombGenerator,
    physics::{
        BoundaryCondition, CircularBoundaryCondition, ForceCollection, GeneralisedLinearSpringForce,
        NagaiHondaForce, NagaiHondaParameters, OverdampedIntegrator, PlaneBoundaryCondition,
        SpringParameters,
    },
    population::{CellPopulation, NodeBasedCellPopulation, VertexBasedCellPopulation},
    simulation::Simulation,
};
use glam::DVec2;

fn old_cell(id: u64) -> Cell {
    Cell::new(CellId(id), ProliferativeType::Differentiated, -10.0)
}

fn pair(distance: f64) -> CellPopulation {
    NodeBasedCellPopulation::new(vec![DVec2::ZERO, DVec2::new(distance, 0.0)], vec![old_cell(0), old_cell(1)], 1.5)
        .unwrap()
        .into()
}

fn params(end_time: f64, dt: f64) -> SimulationParameters {
    let mut params = SimulationParameters::default();
    params.time.end_time = end_time;
    params.time.dt = dt;
    params
}

// ============================================================================
// Population mutations
// ============================================================================

#[test]
fn test_centre_division_places_parent_and_daughter() {
    let mut population: CellPopulation =
        NodeBasedCellPopulation::new(vec![DVec2::ZERO], vec![old_cell(0)], 1.5)
            .unwrap()
            .into();

    let id = population.allocate_cell_id();
    let daughter = Cell::new(id, ProliferativeType::Transit, 0.0);
    population.add_cell(daughter, CellId(0), DVec2::new(0.5, 0.0)).unwrap();

    assert_eq!(population.cell_centre(CellId(0)).unwrap(), DVec2::new(-0.5, 0.0));
    assert_eq!(population.cell_centre(id).unwrap(), DVec2::new(0.5, 0.0));
    assert_eq!(population.num_cells(), 2);
    population.check_invariants().unwrap();
}

#[test]
fn test_vertex_division_conserves_area() {
    let mesh = HoneycombGenerator::new(2, 1).generate().unwrap();
    let mut population: CellPopulation = VertexBasedCellPopulation::new(mesh, vec![old_cell(0), old_cell(1)])
        .unwrap()
        .into();

    let id = population.allocate_cell_id();
    population
        .add_cell(Cell::new(id, ProliferativeType::Transit, 0.0), CellId(1), DVec2::ZERO)
        .unwrap();

    assert_eq!(population.num_cells(), 3);
    let total: f64 = population
        .cell_ids()
        .into_iter()
        .map(|id| population.element_area(id).unwrap())
        .sum();
    assert_relative_eq!(total, 2.0, epsilon = 1e-9);
    assert_relative_eq!(
        population.element_area(CellId(1)).unwrap(),
        population.element_area(id).unwrap(),
        epsilon = 1e-9
    );
    assert!(population.neighbours(id).unwrap().contains(&CellId(1)));
    population.check_invariants().unwrap();
}

#[test]
fn test_unknown_parent_rejected() {
    let mut population = pair(1.0);
    let daughter = Cell::new(CellId(5), ProliferativeType::Transit, 0.0);
    assert!(population.add_cell(daughter, CellId(99), DVec2::X).is_err());
    assert_eq!(population.num_cells(), 2);
}

// ============================================================================
// Force laws
// ============================================================================

#[test]
fn test_compressed_pair_pushed_apart_symmetrically() {
    let mut simulation = Simulation::new(pair(0.6), &params(0.1, 0.01)).unwrap();
    simulation.add_force(Box::new(GeneralisedLinearSpringForce::default()));

    assert!(simulation.solve().is_completed());

    let a = simulation.population().cell_centre(CellId(0)).unwrap();
    let b = simulation.population().cell_centre(CellId(1)).unwrap();
    assert!(b.x - a.x > 0.6, "pair should separate, distance {}", b.x - a.x);
    assert!(b.x - a.x < 1.0 + 1e-9, "pair should not overshoot the rest length");
    assert_relative_eq!((a + b).x, 0.6, epsilon = 1e-12);
}

#[test]
fn test_spring_ignores_pairs_beyond_cutoff() {
    let population = pair(2.0);
    let mut forces = ForceCollection::new();
    forces.push(Box::new(GeneralisedLinearSpringForce::new(SpringParameters::default())));

    let total = forces.compute_forces(&population, 0.0);

    assert_eq!(total, vec![DVec2::ZERO; 2]);
}

#[test]
fn test_nagai_honda_internal_forces_balance() {
    let mesh = HoneycombGenerator::new(3, 2).generate().unwrap();
    let cells = (0..6).map(old_cell).collect();
    let population: CellPopulation = VertexBasedCellPopulation::new(mesh, cells).unwrap().into();

    let mut forces = ForceCollection::new();
    forces.push(Box::new(NagaiHondaForce::new(NagaiHondaParameters::default())));
    let total: DVec2 = forces.compute_forces(&population, 0.0).into_iter().sum();

    assert!(total.length() < 1e-9, "net force should vanish, got {:?}", total);
}

#[test]
fn test_force_law_skips_other_representation() {
    let population = pair(0.5);
    let mut forces = ForceCollection::new();
    forces.push(Box::new(NagaiHondaForce::default()));

    assert_eq!(forces.compute_forces(&population, 0.0), vec![DVec2::ZERO; 2]);
}

// ============================================================================
// Integration and boundaries
// ============================================================================

#[test]
fn test_displacement_clamped() {
    let population = pair(1.0);
    let integrator = OverdampedIntegrator::new(0.1);
    let forces = vec![DVec2::new(1000.0, 0.0), DVec2::new(0.0, 0.01)];

    let proposed = integrator.propose(&population, &forces, 1.0).unwrap();

    assert_relative_eq!(proposed[0].x, 0.1, epsilon = 1e-12);
    assert_relative_eq!(proposed[1].y, 0.01, epsilon = 1e-12);
}

#[test]
fn test_force_length_mismatch_rejected() {
    let population = pair(1.0);
    let result = OverdampedIntegrator::default().propose(&population, &[DVec2::ZERO], 0.1);
    assert!(result.is_err());
}

#[test]
fn test_plane_boundary_holds_node() {
    let population: CellPopulation =
        NodeBasedCellPopulation::new(vec![DVec2::ZERO, DVec2::new(0.0, 0.5)], vec![old_cell(0), old_cell(1)], 1.5)
            .unwrap()
            .into();
    let mut simulation = Simulation::new(population, &params(0.5, 0.01)).unwrap();
    simulation.add_force(Box::new(GeneralisedLinearSpringForce::default()));
    simulation.add_boundary_condition(Box::new(PlaneBoundaryCondition::new(DVec2::ZERO, DVec2::NEG_Y)));

    assert!(simulation.solve().is_completed());

    let bottom = simulation.population().cell_centre(CellId(0)).unwrap();
    let top = simulation.population().cell_centre(CellId(1)).unwrap();
    assert!(bottom.y.abs() < 1e-12, "bottom cell held on the plane, y = {}", bottom.y);
    assert!(top.y > 0.5, "top cell pushed away, y = {}", top.y);
}

#[test]
fn test_circular_boundary_projects_onto_rim() {
    let population = pair(1.0);
    let boundary = CircularBoundaryCondition::new(DVec2::ZERO, 0.5);
    let mut proposed = vec![DVec2::new(0.1, 0.0), DVec2::new(2.0, 0.0)];

    boundary.apply(&population, &mut proposed);

    assert_eq!(proposed[0], DVec2::new(0.1, 0.0));
    assert_relative_eq!(proposed[1].x, 0.5, epsilon = 1e-12);
    assert!(!boundary.verify(&population), "the unconstrained pair is outside the disc");
}
