//! Cells and their proliferative state.
//!
//! A [`Cell`] is a plain record: identity, cell-cycle bookkeeping, optional
//! ODE state and the index of the spatial element (node or polygon) it
//! occupies. Populations own cells; the lifecycle pass mutates them.

pub mod cycle;

pub use cycle::{CellCycleModel, CellCycleParameters, DivisionThreshold, G1DurationModel};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::biochemistry::OdeState;

/// Unique, stable cell identifier.
///
/// Ids are never reused; a parent keeps its id across division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cell cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellCyclePhase {
    /// Mitosis, the first hours after birth
    M,
    G1,
    S,
    G2,
    /// Quiescent; differentiated cells stay here
    G0,
}

impl CellCyclePhase {
    pub fn label(self) -> &'static str {
        match self {
            CellCyclePhase::M => "M",
            CellCyclePhase::G1 => "G1",
            CellCyclePhase::S => "S",
            CellCyclePhase::G2 => "G2",
            CellCyclePhase::G0 => "G0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProliferativeType {
    Stem,
    Transit,
    Differentiated,
}

/// Labels carried through division. They do not change behaviour here but
/// are reported in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MutationState {
    #[default]
    WildType,
    ApcOneHit,
    ApcTwoHit,
    BetaCateninOneHit,
    Labelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellFlags {
    /// Marked by a killer, removed at the end of the lifecycle pass
    pub dead: bool,
    /// The last ODE advance failed; the cell is not allowed to divide
    pub ode_failure: bool,
}

/// A biological cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub parent: Option<CellId>,
    pub phase: CellCyclePhase,
    pub proliferative_type: ProliferativeType,
    pub mutation_state: MutationState,
    /// Simulation time of the cell's last division (or creation)
    pub birth_time: f64,
    pub generation: u32,
    /// G1 duration in hours; `None` until drawn from the simulation's stream
    pub g1_duration: Option<f64>,
    pub ode_state: Option<OdeState>,
    pub flags: CellFlags,
    /// Index of the node (centre-based) or element (vertex-based)
    pub location_index: usize,
    /// Mature target area used by area-based mechanics
    pub target_area: f64,
}

impl Cell {
    pub fn new(id: CellId, proliferative_type: ProliferativeType, birth_time: f64) -> Self {
        Self {
            id,
            parent: None,
            phase: match proliferative_type {
                ProliferativeType::Differentiated => CellCyclePhase::G0,
                _ => CellCyclePhase::M,
            },
            proliferative_type,
            mutation_state: MutationState::WildType,
            birth_time,
            generation: 0,
            g1_duration: None,
            ode_state: None,
            flags: CellFlags::default(),
            location_index: 0,
            target_area: 1.0,
        }
    }

    pub fn with_g1_duration(mut self, g1_duration: f64) -> Self {
        self.g1_duration = Some(g1_duration);
        self
    }

    pub fn with_ode_state(mut self, state: OdeState) -> Self {
        self.ode_state = Some(state);
        self
    }

    pub fn age(&self, time: f64) -> f64 {
        time - self.birth_time
    }

    pub fn is_dead(&self) -> bool {
        self.flags.dead
    }

    pub fn kill(&mut self) {
        self.flags.dead = true;
    }
}
