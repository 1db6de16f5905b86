//! Mesh nodes shared by both population representations.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A point in the tissue.
///
/// Centre-based populations carry one node per cell; vertex-based populations
/// share nodes between neighbouring polygons. Nodes never own elements, the
/// `containing_elements` set is a back-reference rebuilt after every mesh
/// mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Position in cell diameters
    pub position: DVec2,
    /// Fixed nodes are skipped by the position update
    pub is_fixed: bool,
    /// Lies on an edge owned by a single element (vertex meshes only)
    pub is_boundary: bool,
    /// Indices of the elements this node belongs to
    pub containing_elements: BTreeSet<usize>,
}

impl Node {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            is_fixed: false,
            is_boundary: false,
            containing_elements: BTreeSet::new(),
        }
    }

    pub fn fixed(position: DVec2) -> Self {
        Self {
            is_fixed: true,
            ..Self::new(position)
        }
    }
}
