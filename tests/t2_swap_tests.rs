//! T2 swap tests on a vanishing triangle.
//!
//! Fixture: a tiny right triangle of area 1e-9 surrounded by three
//! quadrilaterals that each share one of its edges.

use cell_population_sim::{
    cell::{Cell, CellId, ProliferativeType},
    config::SimulationParameters,
    geometry::VertexMesh,
    killers::{CellKiller, T2SwapCellKiller},
    population::{CellPopulation, VertexBasedCellPopulation},
    simulation::{Simulation, SimulationClock, SimulationContext},
};
use glam::DVec2;

const TRIANGLE_AREA: f64 = 1e-9;

fn tiny_triangle_population() -> VertexBasedCellPopulation {
    let side = (2.0 * TRIANGLE_AREA).sqrt();
    let positions = vec![
        DVec2::new(0.0, 0.0),   // t0
        DVec2::new(side, 0.0),  // t1
        DVec2::new(0.0, side),  // t2
        DVec2::new(-1.0, -1.0), // o0
        DVec2::new(2.0, -1.0),  // o1
        DVec2::new(-1.0, 2.0),  // o2
    ];
    let elements = vec![
        vec![0, 1, 2],
        vec![3, 4, 1, 0],
        vec![4, 5, 2, 1],
        vec![5, 3, 0, 2],
    ];
    let mesh = VertexMesh::new(positions, elements).expect("fixture mesh is valid");
    let cells = (0..4)
        .map(|i| Cell::new(CellId(i), ProliferativeType::Differentiated, 0.0))
        .collect();
    VertexBasedCellPopulation::new(mesh, cells).expect("one cell per element")
}

fn params(t2_threshold: f64, steps: u64) -> SimulationParameters {
    let mut params = SimulationParameters::default();
    params.time.dt = 0.01;
    params.time.end_time = steps as f64 * params.time.dt;
    params.vertex.t2_threshold = t2_threshold;
    params
}

#[test]
fn test_fixture_triangle_is_a_candidate() {
    let population = tiny_triangle_population();
    let area = population.mesh().element_area(0);
    assert!(
        (area - TRIANGLE_AREA).abs() < 1e-15,
        "Triangle area should be 1e-9, got {:e}",
        area
    );
}

#[test]
fn test_single_pass_collapses_triangle_to_centroid() {
    let mut population = tiny_triangle_population();
    let killer = T2SwapCellKiller::new(1e-6);

    let report = killer.scan(&mut population).unwrap();

    assert_eq!(report.swapped, vec![CellId(0)], "exactly the triangle is removed");
    assert!(report.skipped.is_empty());
    assert_eq!(population.cells().len(), 3);
    assert!(population.cells().iter().all(|c| c.id != CellId(0)));

    // Three outer corners plus the merged centroid
    let mesh = population.mesh();
    assert_eq!(mesh.num_nodes(), 4, "3 triangle nodes become 1");
    let centroid = DVec2::splat((2.0 * TRIANGLE_AREA).sqrt() / 3.0);
    let merged = mesh
        .nodes
        .iter()
        .position(|n| (n.position - centroid).length() < 1e-12)
        .expect("a node sits at the old centroid");

    for element in &mesh.elements {
        assert_eq!(element.num_nodes(), 3, "each quad loses one node");
        assert!(
            element.nodes.contains(&merged),
            "every former neighbour references the merged node"
        );
    }

    let total: f64 = (0..mesh.num_elements()).map(|i| mesh.element_area(i)).sum();
    assert!((total - 4.5).abs() < 1e-9, "outer triangle area is kept, got {}", total);
    CellPopulation::from(population).check_invariants().unwrap();
}

#[test]
fn test_second_scan_is_a_no_op() {
    let mut population = tiny_triangle_population();
    let killer = T2SwapCellKiller::new(1e-6);

    killer.scan(&mut population).unwrap();
    let after_first = population.clone();
    let report = killer.scan(&mut population).unwrap();

    assert!(report.is_empty(), "nothing left to swap: {:?}", report);
    assert_eq!(population, after_first);
}

#[test]
fn test_killer_interface_reports_swapped_cells() {
    let mut population: CellPopulation = tiny_triangle_population().into();
    let mut context = SimulationContext::new(SimulationClock::new(0.0, 1.0, 0.1), 0);
    let mut killer = T2SwapCellKiller::new(1e-6);

    let killed = killer.check_and_kill(&mut population, &mut context).unwrap();

    assert_eq!(killed, vec![CellId(0)]);
    assert_eq!(population.num_cells(), 3);
    assert!(population.cell(CellId(0)).is_none());
}

#[test]
fn test_threshold_below_area_leaves_mesh_alone() {
    let mut population = tiny_triangle_population();
    let before = population.clone();

    let report = T2SwapCellKiller::new(1e-10).scan(&mut population).unwrap();

    assert!(report.is_empty());
    assert_eq!(population, before);
}

#[test]
fn test_driver_runs_maintenance_pass() {
    let mut simulation = Simulation::new(tiny_triangle_population().into(), &params(1e-6, 1)).unwrap();

    let report = simulation.step().unwrap();

    assert_eq!(report.t2_swaps, vec![CellId(0)]);
    assert_eq!(simulation.population().num_cells(), 3);
    assert_eq!(simulation.counters().t2_swaps, 1);
}

#[test]
fn test_zero_threshold_keeps_cell_count() {
    let mut simulation = Simulation::new(tiny_triangle_population().into(), &params(0.0, 100)).unwrap();

    let status = simulation.solve();

    assert!(status.is_completed(), "run should complete: {:?}", status);
    assert_eq!(simulation.step_count(), 100);
    assert_eq!(simulation.population().num_cells(), 4);
    assert_eq!(simulation.counters().t2_swaps, 0);
}

// ============================================================================
// Two candidates sharing a node
// ============================================================================

const BOW_TIE_LEG: f64 = 1e-4;

/// Two tiny right triangles meeting at the origin, inside the square
/// [-1, 1]², with the other four cells filling its quadrants.
///
/// The upper-left triangle sits at location 1 with id 5, the lower-right
/// one at location 4 with id 2, so id order and location order disagree.
fn bow_tie_population() -> VertexBasedCellPopulation {
    let e = BOW_TIE_LEG;
    let positions = vec![
        DVec2::new(0.0, 0.0),   // 0 shared corner
        DVec2::new(0.0, e),     // 1
        DVec2::new(-e, 0.0),    // 2
        DVec2::new(0.0, -e),    // 3
        DVec2::new(e, 0.0),     // 4
        DVec2::new(1.0, 0.0),   // 5
        DVec2::new(1.0, 1.0),   // 6
        DVec2::new(0.0, 1.0),   // 7
        DVec2::new(-1.0, 1.0),  // 8
        DVec2::new(-1.0, 0.0),  // 9
        DVec2::new(-1.0, -1.0), // 10
        DVec2::new(0.0, -1.0),  // 11
        DVec2::new(1.0, -1.0),  // 12
    ];
    let elements = vec![
        vec![0, 4, 5, 6, 7, 1],
        vec![0, 1, 2],
        vec![1, 7, 8, 9, 2],
        vec![0, 2, 9, 10, 11, 3],
        vec![0, 3, 4],
        vec![3, 11, 12, 5, 4],
    ];
    let mesh = VertexMesh::new(positions, elements).expect("fixture mesh is valid");
    let cells = [0, 5, 1, 3, 2, 4]
        .into_iter()
        .map(|id| Cell::new(CellId(id), ProliferativeType::Differentiated, 0.0))
        .collect();
    VertexBasedCellPopulation::new(mesh, cells).expect("one cell per element")
}

#[test]
fn test_shared_node_candidates_swap_in_id_order() {
    let mut population = bow_tie_population();
    let killer = T2SwapCellKiller::new(1e-6);

    let report = killer.scan(&mut population).unwrap();

    assert_eq!(report.swapped, vec![CellId(2), CellId(5)], "ascending id, not location");
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);

    let mut ids: Vec<CellId> = population.cells().iter().map(|c| c.id).collect();
    ids.sort();
    assert_eq!(ids, vec![CellId(0), CellId(1), CellId(3), CellId(4)]);

    // Eight square corners and edge midpoints plus one merged node
    let mesh = population.mesh();
    assert_eq!(mesh.num_nodes(), 9);
    for element in &mesh.elements {
        assert_eq!(element.num_nodes(), 4, "quadrant cells end up as quadrilaterals");
    }

    // The lower-right triangle collapses to (e/3, -e/3) first; the second
    // swap sees that node and lands at (-2e/9, 2e/9). The opposite order
    // would end at (2e/9, -2e/9).
    let expected = DVec2::new(-2.0, 2.0) * BOW_TIE_LEG / 9.0;
    assert!(
        mesh.nodes.iter().any(|n| (n.position - expected).length() < 1e-12),
        "no node at {:?}",
        expected
    );

    let total: f64 = (0..mesh.num_elements()).map(|i| mesh.element_area(i)).sum();
    assert!((total - 4.0).abs() < 1e-9, "square area is kept, got {}", total);
    CellPopulation::from(population.clone()).check_invariants().unwrap();

    let rescan = killer.scan(&mut population).unwrap();
    assert!(rescan.is_empty(), "nothing left to swap: {:?}", rescan);
}
