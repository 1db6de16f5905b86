//! Population stepping benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cell_population_sim::cell::{Cell, CellId, ProliferativeType};
use cell_population_sim::config::SimulationParameters;
use cell_population_sim::geometry::HoneycombGenerator;
use cell_population_sim::killers::T2SwapCellKiller;
use cell_population_sim::physics::{ForceCollection, GeneralisedLinearSpringForce, NagaiHondaForce};
use cell_population_sim::population::{CellPopulation, NodeBasedCellPopulation, VertexBasedCellPopulation};
use cell_population_sim::simulation::Simulation;

const COLUMNS: usize = 10;
const ROWS: usize = 10;

fn cells() -> Vec<Cell> {
    (0..(COLUMNS * ROWS) as u64)
        .map(|i| Cell::new(CellId(i), ProliferativeType::Differentiated, -10.0))
        .collect()
}

fn vertex_population() -> VertexBasedCellPopulation {
    let mesh = HoneycombGenerator::new(COLUMNS, ROWS)
        .generate()
        .expect("honeycomb mesh");
    VertexBasedCellPopulation::new(mesh, cells()).expect("vertex population")
}

fn centre_population() -> NodeBasedCellPopulation {
    NodeBasedCellPopulation::honeycomb(COLUMNS, ROWS, cells(), 1.5).expect("centre population")
}

fn bench_nagai_honda_forces(c: &mut Criterion) {
    let population: CellPopulation = vertex_population().into();
    let mut forces = ForceCollection::new();
    forces.push(Box::new(NagaiHondaForce::default()));

    c.bench_function("nagai_honda_forces", |b| {
        b.iter(|| forces.compute_forces(black_box(&population), 0.0))
    });
}

fn bench_spring_forces(c: &mut Criterion) {
    let population: CellPopulation = centre_population().into();
    let mut forces = ForceCollection::new();
    forces.push(Box::new(GeneralisedLinearSpringForce::default()));

    c.bench_function("spring_forces", |b| {
        b.iter(|| forces.compute_forces(black_box(&population), 0.0))
    });
}

fn bench_vertex_step(c: &mut Criterion) {
    let mut params = SimulationParameters::default();
    params.time.dt = 0.005;
    params.time.end_time = 1.0e6;

    let mut simulation =
        Simulation::new(vertex_population().into(), &params).expect("valid parameters");
    simulation.add_force(Box::new(NagaiHondaForce::new(params.mechanics.nagai_honda.clone())));

    c.bench_function("vertex_step", |b| b.iter(|| simulation.step().expect("step")));
}

fn bench_t2_scan(c: &mut Criterion) {
    let population = vertex_population();
    let killer = T2SwapCellKiller::default();

    c.bench_function("t2_scan", |b| {
        b.iter_batched(
            || population.clone(),
            |mut population| killer.scan(&mut population),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_nagai_honda_forces,
    bench_spring_forces,
    bench_vertex_step,
    bench_t2_scan
);
criterion_main!(benches);
