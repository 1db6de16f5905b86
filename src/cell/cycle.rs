//! Generation-based cell cycle.
//!
//! Phase is a function of age alone:
//! ```text
//!   0 ── M ── M+G1 ── M+G1+S ── M+G1+S+G2 ──▶ ready to divide
//!      M     G1       S         G2
//! ```
//! G1 is drawn per cell at birth; M, S and G2 are fixed. Stem cells keep
//! generation 0 and produce transit daughters; transit cells advance one
//! generation per division and differentiate past the configured maximum.

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use super::{Cell, CellCyclePhase, CellFlags, CellId, ProliferativeType};
use crate::biochemistry::OdeSystem;

/// How G1 durations are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum G1DurationModel {
    /// Always the stem or transit mean
    Fixed,
    /// Uniform in `[min, max)`, regardless of proliferative type
    Uniform { min: f64, max: f64 },
    /// Normal around the stem or transit mean, clamped at zero
    Normal { sd: f64 },
}

/// ODE gate on division: the named variable must be at least `min_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionThreshold {
    pub variable: String,
    pub min_value: f64,
}

/// Cell cycle parameters (hours)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellCycleParameters {
    pub m_duration: f64,
    pub s_duration: f64,
    pub g2_duration: f64,
    pub stem_g1_duration: f64,
    pub transit_g1_duration: f64,
    pub g1_model: G1DurationModel,
    /// Transit cells whose generation exceeds this become differentiated
    pub max_transit_generations: u32,
    pub division_threshold: Option<DivisionThreshold>,
}

impl Default for CellCycleParameters {
    fn default() -> Self {
        Self {
            m_duration: 1.0,
            s_duration: 5.0,
            g2_duration: 4.0,
            stem_g1_duration: 14.0,
            transit_g1_duration: 2.0,
            g1_model: G1DurationModel::Uniform { min: 1.0, max: 5.0 },
            max_transit_generations: 3,
            division_threshold: None,
        }
    }
}

/// Phase logic, readiness and division bookkeeping for a population.
#[derive(Debug, Clone, Default)]
pub struct CellCycleModel {
    pub params: CellCycleParameters,
}

impl CellCycleModel {
    pub fn new(params: CellCycleParameters) -> Self {
        Self { params }
    }

    /// Expected G1 duration for a cell of the given type.
    pub fn mean_g1(&self, proliferative_type: ProliferativeType) -> f64 {
        match (proliferative_type, &self.params.g1_model) {
            (ProliferativeType::Differentiated, _) => 0.0,
            (_, G1DurationModel::Uniform { min, max }) => 0.5 * (min + max),
            (ProliferativeType::Stem, _) => self.params.stem_g1_duration,
            (ProliferativeType::Transit, _) => self.params.transit_g1_duration,
        }
    }

    /// Draw a G1 duration for a cell of the given type.
    ///
    /// Differentiated cells get 0 without consuming randomness.
    pub fn sample_g1<R: Rng + ?Sized>(&self, proliferative_type: ProliferativeType, rng: &mut R) -> f64 {
        let mean = match proliferative_type {
            ProliferativeType::Stem => self.params.stem_g1_duration,
            ProliferativeType::Transit => self.params.transit_g1_duration,
            ProliferativeType::Differentiated => return 0.0,
        };

        match self.params.g1_model {
            G1DurationModel::Fixed => mean,
            G1DurationModel::Uniform { min, max } => {
                if max > min {
                    Uniform::new(min, max).sample(rng)
                } else {
                    min
                }
            }
            G1DurationModel::Normal { sd } => match Normal::new(mean, sd) {
                Ok(normal) => normal.sample(rng).max(0.0),
                Err(_) => mean,
            },
        }
    }

    /// Draw G1 for `cell` unless it already has one.
    pub fn assign_missing_g1<R: Rng + ?Sized>(&self, cell: &mut Cell, rng: &mut R) {
        if cell.g1_duration.is_none() {
            cell.g1_duration = Some(self.sample_g1(cell.proliferative_type, rng));
        }
    }

    /// Length of a full cycle for `cell`.
    pub fn cycle_duration(&self, cell: &Cell) -> f64 {
        self.params.m_duration + g1_of(cell) + self.params.s_duration + self.params.g2_duration
    }

    /// Set `cell.phase` from its age at `time`.
    pub fn update_phase(&self, cell: &mut Cell, time: f64) {
        if cell.proliferative_type == ProliferativeType::Differentiated {
            cell.phase = CellCyclePhase::G0;
            return;
        }

        let age = cell.age(time);
        let p = &self.params;
        let end_m = p.m_duration;
        let end_g1 = end_m + g1_of(cell);
        let end_s = end_g1 + p.s_duration;

        cell.phase = if age < end_m {
            CellCyclePhase::M
        } else if age < end_g1 {
            CellCyclePhase::G1
        } else if age < end_s {
            CellCyclePhase::S
        } else {
            CellCyclePhase::G2
        };
    }

    /// Whether `cell` should divide at `time`.
    ///
    /// Requires a completed cycle, no ODE failure and, when a division
    /// threshold is configured, the gating ODE variable at or above it.
    pub fn is_ready_to_divide(&self, cell: &Cell, time: f64, ode_system: Option<&dyn OdeSystem>) -> bool {
        if cell.proliferative_type == ProliferativeType::Differentiated || cell.flags.ode_failure {
            return false;
        }
        if cell.age(time) < self.cycle_duration(cell) {
            return false;
        }

        match &self.params.division_threshold {
            None => true,
            Some(threshold) => {
                let index = ode_system.and_then(|system| system.variable_index(&threshold.variable));
                match (index, &cell.ode_state) {
                    (Some(index), Some(state)) => state.get(index) >= threshold.min_value,
                    _ => false,
                }
            }
        }
    }

    /// Reset a dividing parent: new birth time, next generation, fresh G1.
    pub fn reset_for_division<R: Rng + ?Sized>(&self, parent: &mut Cell, time: f64, rng: &mut R) {
        match parent.proliferative_type {
            ProliferativeType::Stem => parent.generation = 0,
            ProliferativeType::Transit => {
                parent.generation += 1;
                if parent.generation > self.params.max_transit_generations {
                    parent.proliferative_type = ProliferativeType::Differentiated;
                }
            }
            ProliferativeType::Differentiated => {}
        }

        parent.birth_time = time;
        parent.g1_duration = Some(self.sample_g1(parent.proliferative_type, rng));
        self.update_phase(parent, time);
    }

    /// Build the daughter of `parent` as it was before division.
    ///
    /// The daughter inherits mutation state, target area and a copy of the
    /// parent's ODE state. Its location index is assigned by the population.
    pub fn create_daughter<R: Rng + ?Sized>(
        &self,
        parent: &Cell,
        id: CellId,
        time: f64,
        rng: &mut R,
    ) -> Cell {
        let (proliferative_type, generation) = match parent.proliferative_type {
            ProliferativeType::Stem => (ProliferativeType::Transit, 1),
            ProliferativeType::Transit | ProliferativeType::Differentiated => {
                let generation = parent.generation + 1;
                if generation > self.params.max_transit_generations {
                    (ProliferativeType::Differentiated, generation)
                } else {
                    (ProliferativeType::Transit, generation)
                }
            }
        };

        let mut daughter = Cell {
            id,
            parent: Some(parent.id),
            phase: CellCyclePhase::M,
            proliferative_type,
            mutation_state: parent.mutation_state,
            birth_time: time,
            generation,
            g1_duration: None,
            ode_state: parent.ode_state.clone(),
            flags: CellFlags::default(),
            location_index: parent.location_index,
            target_area: parent.target_area,
        };
        daughter.g1_duration = Some(self.sample_g1(proliferative_type, rng));
        self.update_phase(&mut daughter, time);
        daughter
    }
}

/// An undrawn G1 counts as zero.
fn g1_of(cell: &Cell) -> f64 {
    cell.g1_duration.unwrap_or(0.0)
}
