//! Mutable polygonal vertex mesh.
//!
//! Elements are counter-clockwise lists of node indices. Nodes are shared
//! between neighbouring elements and the node store is kept dense: whenever
//! nodes are released the remaining indices are remapped in every element.
//!
//! Mesh surgery provided here:
//! - element division along an axis through the centroid
//! - element collapse to a single node (used by T2 swaps and cell removal)

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::Node;
use super::polygon;

/// Minimum distance between a division cut node and the ends of its edge.
pub const DIVISION_CUT_CLEARANCE: f64 = 0.015;

/// Structural errors raised by mesh surgery.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("element index {index} out of range (mesh has {count} elements)")]
    ElementOutOfRange { index: usize, count: usize },

    #[error("element {element} references node {node} but the mesh has {count} nodes")]
    InvalidNodeIndex { element: usize, node: usize, count: usize },

    #[error("element {element} has {count} nodes, at least 3 are required")]
    TooFewNodes { element: usize, count: usize },

    #[error("element {element} lists node {node} more than once")]
    RepeatedNode { element: usize, node: usize },

    #[error("division axis crosses {crossings} edges of element {element}, expected exactly 2")]
    DivisionAxis { element: usize, crossings: usize },

    #[error("collapsing element {collapsed} would leave element {neighbour} with {remaining} nodes")]
    NeighbourWouldDegenerate {
        collapsed: usize,
        neighbour: usize,
        remaining: usize,
    },

    #[error("element {element} has negative signed area {area:.3e} (clockwise winding)")]
    ClockwiseElement { element: usize, area: f64 },
}

/// A single polygonal element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Counter-clockwise node indices
    pub nodes: Vec<usize>,
}

impl Element {
    pub fn new(nodes: Vec<usize>) -> Self {
        Self { nodes }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Local position of the directed or reversed edge `(a, b)`, if present.
    ///
    /// Returns the index `j` such that the edge runs between local positions
    /// `j` and `j + 1` (cyclically).
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        let n = self.nodes.len();
        (0..n).find(|&j| {
            let u = self.nodes[j];
            let v = self.nodes[(j + 1) % n];
            (u == a && v == b) || (u == b && v == a)
        })
    }

    /// Cyclic edges as `(from, to)` node index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.nodes.len();
        (0..n).map(move |j| (self.nodes[j], self.nodes[(j + 1) % n]))
    }
}

/// Vertex mesh: shared nodes plus polygonal elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexMesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl VertexMesh {
    /// Build a mesh from raw positions and element node lists.
    ///
    /// Elements given clockwise are reversed so every element ends up
    /// counter-clockwise.
    pub fn new(positions: Vec<DVec2>, element_nodes: Vec<Vec<usize>>) -> Result<Self, MeshError> {
        let nodes = positions.into_iter().map(Node::new).collect();
        let elements = element_nodes.into_iter().map(Element::new).collect();

        let mut mesh = Self { nodes, elements };
        mesh.check_indices()?;

        for index in 0..mesh.elements.len() {
            if mesh.signed_element_area(index) < 0.0 {
                mesh.elements[index].nodes.reverse();
            }
        }

        mesh.refresh_topology();
        mesh.check_consistency()?;
        Ok(mesh)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Positions of the nodes of one element, in element order.
    pub fn element_positions(&self, index: usize) -> Vec<DVec2> {
        self.elements[index]
            .nodes
            .iter()
            .map(|&n| self.nodes[n].position)
            .collect()
    }

    pub fn signed_element_area(&self, index: usize) -> f64 {
        polygon::signed_area(&self.element_positions(index))
    }

    pub fn element_area(&self, index: usize) -> f64 {
        polygon::area(&self.element_positions(index))
    }

    pub fn element_perimeter(&self, index: usize) -> f64 {
        polygon::perimeter(&self.element_positions(index))
    }

    pub fn element_centroid(&self, index: usize) -> DVec2 {
        polygon::centroid(&self.element_positions(index))
    }

    /// Short axis of an element (see [`polygon::short_axis`]).
    pub fn element_short_axis(&self, index: usize) -> DVec2 {
        polygon::short_axis(&self.element_positions(index))
    }

    /// Elements that contain the edge `(a, b)` in either direction.
    pub fn elements_sharing_edge(&self, a: usize, b: usize) -> BTreeSet<usize> {
        self.nodes[a]
            .containing_elements
            .intersection(&self.nodes[b].containing_elements)
            .copied()
            .filter(|&e| self.elements[e].find_edge(a, b).is_some())
            .collect()
    }

    /// Elements sharing at least one edge with element `index`.
    pub fn neighbouring_elements(&self, index: usize) -> BTreeSet<usize> {
        let mut neighbours = BTreeSet::new();
        for (a, b) in self.elements[index].edges() {
            neighbours.extend(self.elements_sharing_edge(a, b));
        }
        neighbours.remove(&index);
        neighbours
    }

    /// Rebuild node back-references and boundary flags.
    ///
    /// Must be called after any change to element node lists.
    pub fn refresh_topology(&mut self) {
        for node in &mut self.nodes {
            node.containing_elements.clear();
            node.is_boundary = false;
        }
        for (e, element) in self.elements.iter().enumerate() {
            for &n in &element.nodes {
                self.nodes[n].containing_elements.insert(e);
            }
        }

        // An edge owned by a single element lies on the tissue boundary
        let mut boundary = Vec::new();
        for element in &self.elements {
            for (a, b) in element.edges() {
                if self.elements_sharing_edge(a, b).len() == 1 {
                    boundary.push(a);
                    boundary.push(b);
                }
            }
        }
        for n in boundary {
            self.nodes[n].is_boundary = true;
        }
    }

    /// Split element `index` along the line through its centroid parallel
    /// to `axis`.
    ///
    /// Two new nodes are created where the line crosses the element boundary,
    /// at least [`DIVISION_CUT_CLEARANCE`] from the ends of the cut edge;
    /// they are also inserted into any neighbour sharing a cut edge. The
    /// original element keeps the side containing its first node, the new
    /// element (returned index, always the last) takes the other side.
    pub fn divide_element_along_axis(&mut self, index: usize, axis: DVec2) -> Result<usize, MeshError> {
        self.check_element_index(index)?;

        let nodes = self.elements[index].nodes.clone();
        let positions = self.element_positions(index);
        let n = nodes.len();
        let centre = polygon::centroid(&positions);

        let side: Vec<f64> = positions.iter().map(|&p| axis.perp_dot(p - centre)).collect();
        let crossings: Vec<usize> = (0..n)
            .filter(|&j| (side[j] >= 0.0) != (side[(j + 1) % n] >= 0.0))
            .collect();

        if crossings.len() != 2 {
            return Err(MeshError::DivisionAxis {
                element: index,
                crossings: crossings.len(),
            });
        }

        // A cut through (or next to) a vertex is moved along its edge so the
        // new node never coincides with an existing one
        let cut_point = |j: usize| {
            let (s0, s1) = (side[j], side[(j + 1) % n]);
            let edge = positions[(j + 1) % n] - positions[j];
            let min_t = (DIVISION_CUT_CLEARANCE / edge.length()).min(0.5);
            let t = (s0 / (s0 - s1)).clamp(min_t, 1.0 - min_t);
            positions[j] + t * edge
        };

        let (k1, k2) = (crossings[0], crossings[1]);
        let new_a = self.nodes.len();
        self.nodes.push(Node::new(cut_point(k1)));
        let new_b = self.nodes.len();
        self.nodes.push(Node::new(cut_point(k2)));

        // Neighbours sharing a cut edge gain the new node between the edge ends
        for (j, new_node) in [(k1, new_a), (k2, new_b)] {
            let (u, v) = (nodes[j], nodes[(j + 1) % n]);
            for e in self.elements_sharing_edge(u, v) {
                if e == index {
                    continue;
                }
                let element = &mut self.elements[e];
                if let Some(pos) = element.find_edge(u, v) {
                    element.nodes.insert(pos + 1, new_node);
                }
            }
        }

        // Walk the cycle: [0..=k1] A [k1+1..=k2] B [k2+1..n)
        let mut daughter = Vec::with_capacity(k2 - k1 + 2);
        daughter.push(new_a);
        daughter.extend_from_slice(&nodes[k1 + 1..=k2]);
        daughter.push(new_b);

        let mut parent = Vec::with_capacity(n - (k2 - k1) + 2);
        parent.extend_from_slice(&nodes[..=k1]);
        parent.push(new_a);
        parent.push(new_b);
        parent.extend_from_slice(&nodes[k2 + 1..]);

        self.elements[index].nodes = parent;
        self.elements.push(Element::new(daughter));
        self.refresh_topology();

        Ok(self.elements.len() - 1)
    }

    /// Collapse element `index` to a single node at its centroid and remove it.
    ///
    /// Every neighbour referencing any of the element's nodes has them
    /// replaced by the new node, in place, so winding is preserved;
    /// consecutive duplicates are merged. Fails without touching the mesh if
    /// a neighbour would be left with fewer than three nodes.
    ///
    /// Returns the index of the merged node, or `None` when no other element
    /// referenced the collapsed nodes (an isolated element).
    pub fn collapse_element(&mut self, index: usize) -> Result<Option<usize>, MeshError> {
        self.check_element_index(index)?;

        let removed: BTreeSet<usize> = self.elements[index].nodes.iter().copied().collect();
        let centre = self.element_centroid(index);
        let merged = self.nodes.len();

        let mut patched = Vec::new();
        for (e, element) in self.elements.iter().enumerate() {
            if e == index || !element.nodes.iter().any(|n| removed.contains(n)) {
                continue;
            }
            let stitched = stitch(&element.nodes, &removed, merged);
            if stitched.len() < 3 {
                return Err(MeshError::NeighbourWouldDegenerate {
                    collapsed: index,
                    neighbour: e,
                    remaining: stitched.len(),
                });
            }
            patched.push((e, stitched));
        }

        let is_fixed = removed.iter().any(|&n| self.nodes[n].is_fixed);
        let mut node = Node::new(centre);
        node.is_fixed = is_fixed;
        self.nodes.push(node);

        for (e, stitched) in patched {
            self.elements[e].nodes = stitched;
        }
        self.elements.remove(index);

        let remap = self.release_unreferenced_nodes();
        self.refresh_topology();
        Ok(remap[merged])
    }

    /// Drop every node that no element references and compact the store.
    ///
    /// Returns the old-to-new index map (`None` for released nodes).
    fn release_unreferenced_nodes(&mut self) -> Vec<Option<usize>> {
        let mut referenced = vec![false; self.nodes.len()];
        for element in &self.elements {
            for &n in &element.nodes {
                referenced[n] = true;
            }
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut kept = Vec::with_capacity(self.nodes.len());
        for (old, node) in std::mem::take(&mut self.nodes).into_iter().enumerate() {
            if referenced[old] {
                remap[old] = Some(kept.len());
                kept.push(node);
            }
        }
        self.nodes = kept;

        for element in &mut self.elements {
            for n in &mut element.nodes {
                // Every index here was marked referenced above
                if let Some(new) = remap[*n] {
                    *n = new;
                }
            }
        }
        remap
    }

    fn check_element_index(&self, index: usize) -> Result<(), MeshError> {
        if index >= self.elements.len() {
            return Err(MeshError::ElementOutOfRange {
                index,
                count: self.elements.len(),
            });
        }
        Ok(())
    }

    fn check_indices(&self) -> Result<(), MeshError> {
        for (e, element) in self.elements.iter().enumerate() {
            if let Some(&bad) = element.nodes.iter().find(|&&n| n >= self.nodes.len()) {
                return Err(MeshError::InvalidNodeIndex {
                    element: e,
                    node: bad,
                    count: self.nodes.len(),
                });
            }
        }
        Ok(())
    }

    /// Verify the structural invariants of the mesh.
    pub fn check_consistency(&self) -> Result<(), MeshError> {
        self.check_indices()?;
        for (e, element) in self.elements.iter().enumerate() {
            if element.nodes.len() < 3 {
                return Err(MeshError::TooFewNodes {
                    element: e,
                    count: element.nodes.len(),
                });
            }
            let mut seen = BTreeSet::new();
            for &n in &element.nodes {
                if !seen.insert(n) {
                    return Err(MeshError::RepeatedNode { element: e, node: n });
                }
            }
            let area = self.signed_element_area(e);
            if area < 0.0 {
                return Err(MeshError::ClockwiseElement { element: e, area });
            }
        }
        Ok(())
    }
}

/// Replace every node in `removed` by `merged`, then merge cyclically
/// consecutive duplicates.
fn stitch(nodes: &[usize], removed: &BTreeSet<usize>, merged: usize) -> Vec<usize> {
    let mut stitched: Vec<usize> = nodes
        .iter()
        .map(|n| if removed.contains(n) { merged } else { *n })
        .collect();
    stitched.dedup();
    while stitched.len() > 1 && stitched.first() == stitched.last() {
        stitched.pop();
    }
    stitched
}
