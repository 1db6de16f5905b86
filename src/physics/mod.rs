//! Tissue mechanics.
//!
//! This module implements:
//! - the force-law contract and an additive collection of laws
//! - generalised linear springs between cell centres
//! - the Nagai-Honda vertex energy
//! - overdamped position updates and boundary conditions
//!
//! References:
//! - Springs: Meineke et al., Cell Prolif 2001
//! - Vertex model: Nagai & Honda, Phil Mag B 2001
//! - Overdamped motion: Fletcher et al., Prog Biophys Mol Biol 2013

pub mod boundary;
pub mod integrator;
pub mod nagai_honda;
pub mod spring;

pub use boundary::{BoundaryCondition, CircularBoundaryCondition, PlaneBoundaryCondition};
pub use integrator::OverdampedIntegrator;
pub use nagai_honda::{NagaiHondaForce, NagaiHondaParameters};
pub use spring::{GeneralisedLinearSpringForce, SpringParameters};

use std::sync::atomic::{AtomicBool, Ordering};

use glam::DVec2;

use crate::population::{CellPopulation, PopulationKind};

/// A mechanical force law.
///
/// Implementations add their per-node contribution into `forces`, which is
/// indexed like the population's nodes. Laws are additive and must not
/// depend on the order they are applied in.
pub trait Force: std::fmt::Debug {
    fn name(&self) -> &str;

    fn add_force_contribution(&self, population: &CellPopulation, time: f64, forces: &mut [DVec2]);
}

/// Sum of zero or more force laws.
#[derive(Debug, Default)]
pub struct ForceCollection {
    forces: Vec<Box<dyn Force>>,
}

impl ForceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, force: Box<dyn Force>) {
        log::debug!("Registered force law {}", force.name());
        self.forces.push(force);
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Total force on every node.
    pub fn compute_forces(&self, population: &CellPopulation, time: f64) -> Vec<DVec2> {
        let mut forces = vec![DVec2::ZERO; population.num_nodes()];
        for force in &self.forces {
            force.add_force_contribution(population, time, &mut forces);
        }
        forces
    }
}

/// Remembers whether a law already reported that it does not apply.
#[derive(Debug, Default)]
pub(crate) struct WarnOnce(AtomicBool);

impl WarnOnce {
    pub(crate) fn inapplicable(&self, law: &str, kind: PopulationKind) {
        if !self.0.swap(true, Ordering::Relaxed) {
            log::warn!("{} does not apply to {} populations, contributing nothing", law, kind.label());
        }
    }
}
