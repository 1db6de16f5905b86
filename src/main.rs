//! Cell population simulator - Entry point
//!
//! Runs a honeycomb tissue patch headless and prints a summary.
//!
//! CLI Usage:
//!   cargo run                          # Vertex-based patch, default parameters
//!   cargo run -- --centre -n 2000      # Centre-based patch, 2000 steps
//!   cargo run -- --params params/ --csv --seed 7

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use cell_population_sim::{
    biochemistry::DeltaNotchOdeSystem,
    cell::{Cell, CellCycleModel, CellId, ProliferativeType},
    config::SimulationParameters,
    export::{export_parameters_json, CsvExporter, JsonSnapshotExporter},
    geometry::HoneycombGenerator,
    physics::{GeneralisedLinearSpringForce, NagaiHondaForce},
    population::{CellPopulation, NodeBasedCellPopulation, VertexBasedCellPopulation},
    simulation::{Simulation, SimulationStatus},
    state::{Checkpoint, PopulationMetrics, PopulationSnapshot},
};

const PATCH_ACROSS: usize = 6;
const PATCH_UP: usize = 6;
const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

/// Parsed command line
struct Options {
    vertex: bool,
    steps: Option<u64>,
    seed: Option<u64>,
    params_dir: Option<PathBuf>,
    csv: bool,
    json: bool,
    delta_notch: bool,
    checkpoint: Option<PathBuf>,
    resume: Option<PathBuf>,
}

/// Parse CLI arguments
fn parse_args() -> Result<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        vertex: true,
        steps: None,
        seed: None,
        params_dir: None,
        csv: false,
        json: false,
        delta_notch: false,
        checkpoint: None,
        resume: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vertex" => options.vertex = true,
            "--centre" | "--center" => options.vertex = false,
            "-n" | "--steps" => {
                i += 1;
                if i < args.len() {
                    options.steps = Some(args[i].parse()?);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    options.seed = Some(args[i].parse()?);
                }
            }
            "--params" => {
                i += 1;
                if i < args.len() {
                    options.params_dir = Some(PathBuf::from(&args[i]));
                }
            }
            "--checkpoint" => {
                i += 1;
                if i < args.len() {
                    options.checkpoint = Some(PathBuf::from(&args[i]));
                }
            }
            "--resume" => {
                i += 1;
                if i < args.len() {
                    options.resume = Some(PathBuf::from(&args[i]));
                }
            }
            "--csv" => options.csv = true,
            "--json" => options.json = true,
            "--delta-notch" => options.delta_notch = true,
            "--help" | "-h" => {
                println!("Cell population simulator");
                println!();
                println!("Usage: cell-population-sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --vertex             Vertex-based honeycomb patch (default)");
                println!("  --centre             Centre-based honeycomb patch");
                println!("  -n, --steps N        Number of steps (default: from end time)");
                println!("  --seed S             Random seed");
                println!("  --params DIR         Load per-section parameter files from DIR");
                println!("  --delta-notch        Attach Delta-Notch signalling to every cell");
                println!("  --csv                Write a CSV time series to the output directory");
                println!("  --json               Write JSON snapshots to the output directory");
                println!("  --checkpoint FILE    Save a checkpoint when the run ends");
                println!("  --resume FILE        Continue from a checkpoint");
                println!("  --help, -h           Show this help");
                std::process::exit(0);
            }
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }

    Ok(options)
}

/// Honeycomb patch with a stem bottom row under transit cells.
///
/// Birth times are spread over one mean cycle by a golden-ratio sequence so
/// divisions do not synchronise. G1 durations are left for the simulation
/// to draw from its own stream.
fn initial_population(vertex: bool, params: &SimulationParameters) -> Result<CellPopulation> {
    let cycle = CellCycleModel::new(params.cell_cycle.clone());
    let fixed_phases = params.cell_cycle.m_duration + params.cell_cycle.s_duration + params.cell_cycle.g2_duration;

    let num_cells = PATCH_ACROSS * PATCH_UP;
    let mut cells = Vec::with_capacity(num_cells);
    for i in 0..num_cells {
        let proliferative_type = if i < PATCH_ACROSS {
            ProliferativeType::Stem
        } else {
            ProliferativeType::Transit
        };
        let mean_cycle = fixed_phases + cycle.mean_g1(proliferative_type);
        let offset = (i as f64 * GOLDEN_RATIO_CONJUGATE).fract() * mean_cycle;
        cells.push(Cell::new(CellId(i as u64), proliferative_type, params.time.start_time - offset));
    }

    let population = if vertex {
        let mesh = HoneycombGenerator::new(PATCH_ACROSS, PATCH_UP).generate()?;
        VertexBasedCellPopulation::new(mesh, cells)?.into()
    } else {
        NodeBasedCellPopulation::honeycomb(PATCH_ACROSS, PATCH_UP, cells, params.mechanics.spring.cutoff)?.into()
    };
    Ok(population)
}

fn print_summary(snapshot: &PopulationSnapshot, elapsed_s: f64) {
    let metrics = PopulationMetrics::from(snapshot);
    println!("\n=== Summary ===");
    println!("Population: {}", snapshot.kind.label());
    println!("Steps: {}  time: {:.3} h", metrics.step, metrics.time);
    println!(
        "Cells: {} (stem {}, transit {}, differentiated {}, mitotic {})",
        metrics.num_cells,
        metrics.stem_cells,
        metrics.transit_cells,
        metrics.differentiated_cells,
        metrics.mitotic_cells
    );
    println!("Nodes: {}", metrics.num_nodes);
    println!("Mean area: {:.4}", metrics.mean_area);
    if let (Some(notch), Some(delta)) = (metrics.mean_ode_0, metrics.mean_ode_1) {
        println!("Mean Notch: {:.4}  mean Delta: {:.4}", notch, delta);
    }
    println!("Wall time: {:.2} s", elapsed_s);
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;

    let mut params = match &options.params_dir {
        Some(dir) => SimulationParameters::load_from_dir(dir),
        None => SimulationParameters::load_or_default("parameters.json"),
    };
    if let Some(seed) = options.seed {
        params.seed = seed;
    }

    let mut simulation = match &options.resume {
        Some(path) => {
            let mut checkpoint = Checkpoint::load(path)?;
            let clock = &mut checkpoint.context.clock;
            clock.end_time = match options.steps {
                Some(steps) => clock.time() + steps as f64 * clock.dt,
                None => params.time.end_time,
            };
            Simulation::restore(checkpoint, &params)?
        }
        None => {
            if let Some(steps) = options.steps {
                params.time.end_time = params.time.start_time + steps as f64 * params.time.dt;
            }
            let population = initial_population(options.vertex, &params)?;
            Simulation::new(population, &params)?
        }
    };

    if simulation.population().as_vertex_based().is_some() {
        simulation.add_force(Box::new(NagaiHondaForce::new(params.mechanics.nagai_honda.clone())));
    } else {
        simulation.add_force(Box::new(GeneralisedLinearSpringForce::new(params.mechanics.spring.clone())));
    }
    if options.delta_notch {
        let system = DeltaNotchOdeSystem::new(params.ode.delta_notch.clone());
        simulation = simulation.with_ode_system(Box::new(system));
    }

    let output_dir = PathBuf::from(&params.output.directory);
    if options.csv || options.json {
        export_parameters_json(&params, &output_dir)?;
    }
    if options.csv {
        simulation.add_observer(Box::new(CsvExporter::new(&output_dir, params.output.interval)?));
    }
    if options.json {
        let dir = output_dir.join("snapshots");
        simulation.add_observer(Box::new(JsonSnapshotExporter::new(dir, params.output.interval)?));
    }

    println!("=== Cell population simulator ===\n");
    println!(
        "{} population, {} cells, {} steps of {} h",
        simulation.population().kind().label(),
        simulation.population().num_cells(),
        simulation.context().clock.total_steps().saturating_sub(simulation.step_count()),
        params.time.dt
    );

    let start = Instant::now();
    let status = simulation.solve();
    let elapsed = start.elapsed().as_secs_f64();

    if let Some(path) = &options.checkpoint {
        simulation.checkpoint().save(path)?;
    }

    print_summary(&simulation.snapshot()?, elapsed);
    let counters = simulation.counters();
    println!(
        "Births: {}  deaths: {}  T2 swaps: {}",
        counters.births, counters.deaths, counters.t2_swaps
    );

    match status {
        SimulationStatus::Completed { .. } => Ok(()),
        SimulationStatus::Aborted { step, time, cause } => {
            bail!("simulation aborted at step {} (t = {:.4}): {}", step, time, cause)
        }
    }
}
