//! Assembly forest
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Each node
//! has at most one parent; a node's children are replaced as a whole.

use std::fmt;

use pcad_kernel::Location;

use crate::error::{AssemblyError, BuildResult};
use crate::shape::Shape;

/// Index of a node in an [`Assembly`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AssemblyNode {
    pub label: String,
    pub shape: Option<Shape>,
    /// Placement relative to the parent node
    pub location: Location,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl AssemblyNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A forest of labelled, optionally shaped nodes
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    nodes: Vec<AssemblyNode>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a root node at the identity location
    pub fn add_node(&mut self, shape: Option<Shape>, label: impl Into<String>) -> NodeId {
        self.add_node_at(shape, label, Location::IDENTITY)
    }

    pub fn add_node_at(
        &mut self,
        shape: Option<Shape>,
        label: impl Into<String>,
        location: Location,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AssemblyNode {
            label: label.into(),
            shape,
            location,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&AssemblyNode, AssemblyError> {
        self.nodes.get(id.0).ok_or(AssemblyError::NodeNotFound(id))
    }

    pub fn set_location(&mut self, id: NodeId, location: Location) -> Result<(), AssemblyError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(AssemblyError::NodeNotFound(id))?;
        node.location = location;
        Ok(())
    }

    // ============== Structure ==============

    /// Replace a node's children
    ///
    /// Children taken from another parent are detached from it; former
    /// children not in the new list become roots. Nothing changes if any id
    /// is unknown, repeated, or would close a cycle.
    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) -> Result<(), AssemblyError> {
        self.node(id)?;
        for (i, child) in children.iter().enumerate() {
            self.node(*child)?;
            if children[..i].contains(child) {
                return Err(AssemblyError::DuplicateChild(*child));
            }
            if *child == id || self.ancestors(id).contains(child) {
                return Err(AssemblyError::WouldCreateCycle(*child));
            }
        }

        let previous = std::mem::take(&mut self.nodes[id.0].children);
        for old in previous {
            self.nodes[old.0].parent = None;
        }
        for child in &children {
            if let Some(old_parent) = self.nodes[child.0].parent {
                self.nodes[old_parent.0].children.retain(|c| c != child);
            }
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, AssemblyError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], AssemblyError> {
        Ok(&self.node(id)?.children)
    }

    /// Nodes without a parent, in insertion order
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.nodes[id.0].parent.is_none())
            .collect()
    }

    /// Parent, grandparent and so on up to the root
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.nodes.get(id.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.nodes[parent.0].parent;
        }
        ancestors
    }

    /// The node and everything below it, depth-first in child order
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, AssemblyError> {
        self.node(id)?;
        let mut result = Vec::new();
        self.collect_depth_first(id, &mut result);
        Ok(result)
    }

    fn collect_depth_first(&self, id: NodeId, result: &mut Vec<NodeId>) {
        result.push(id);
        for child in &self.nodes[id.0].children {
            self.collect_depth_first(*child, result);
        }
    }

    // ============== Transforms ==============

    /// Location of a node in world space: root location first
    pub fn world_location(&self, id: NodeId) -> Result<Location, AssemblyError> {
        let node = self.node(id)?;
        Ok(self
            .ancestors(id)
            .iter()
            .rev()
            .fold(Location::IDENTITY, |acc, ancestor| {
                acc * self.nodes[ancestor.0].location
            })
            * node.location)
    }

    /// A node's shape placed at its world location
    pub fn world_shape(&self, id: NodeId) -> BuildResult<Option<Shape>> {
        let Some(shape) = &self.node(id)?.shape else {
            return Ok(None);
        };
        let location = self.world_location(id)?;
        Ok(Some(shape.moved(&location)?))
    }
}
