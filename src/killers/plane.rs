//! Sloughing of cells past a plane.

use glam::DVec2;

use super::CellKiller;
use crate::cell::CellId;
use crate::population::{CellPopulation, TopologyError};
use crate::simulation::SimulationContext;

/// Kills every cell whose centre lies strictly beyond a plane, e.g. cells
/// pushed off the top of a crypt.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneBasedCellKiller {
    pub point: DVec2,
    /// Points into the killing half-plane
    pub normal: DVec2,
}

impl PlaneBasedCellKiller {
    pub fn new(point: DVec2, normal: DVec2) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }
}

impl CellKiller for PlaneBasedCellKiller {
    fn name(&self) -> &str {
        "PlaneBasedCellKiller"
    }

    fn check_and_kill(
        &mut self,
        population: &mut CellPopulation,
        _context: &mut SimulationContext,
    ) -> Result<Vec<CellId>, TopologyError> {
        let mut beyond = Vec::new();
        for cell in population.cells() {
            if cell.is_dead() {
                continue;
            }
            let centre = population.cell_centre(cell.id)?;
            if (centre - self.point).dot(self.normal) > 0.0 {
                beyond.push(cell.id);
            }
        }

        for &id in &beyond {
            if let Some(cell) = population.cell_mut(id) {
                cell.kill();
            }
        }
        Ok(beyond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, ProliferativeType};
    use crate::population::NodeBasedCellPopulation;
    use crate::simulation::{SimulationClock, SimulationContext};

    #[test]
    fn test_kills_cells_above_plane() {
        let positions = vec![DVec2::new(0.0, 1.0), DVec2::new(0.0, 3.0), DVec2::new(1.0, 2.5)];
        let cells = (0..3)
            .map(|i| Cell::new(CellId(i), ProliferativeType::Transit, 0.0))
            .collect();
        let mut population: CellPopulation = NodeBasedCellPopulation::new(positions, cells, 1.5)
            .unwrap()
            .into();
        let mut context = SimulationContext::new(SimulationClock::new(0.0, 1.0, 0.1), 0);

        let mut killer = PlaneBasedCellKiller::new(DVec2::new(0.0, 2.0), DVec2::Y);
        let killed = killer.check_and_kill(&mut population, &mut context).unwrap();

        assert_eq!(killed, vec![CellId(1), CellId(2)]);
        assert!(!population.cell(CellId(0)).unwrap().is_dead());
        assert_eq!(population.remove_dead_cells().unwrap(), vec![CellId(1), CellId(2)]);
        assert_eq!(population.num_cells(), 1);
    }
}
