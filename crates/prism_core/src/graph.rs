//! Scene graph arena.
//!
//! Nodes live in a single arena and are addressed by `NodeId` handles, so
//! the same sub-scene can be instanced from many parents without duplicating
//! geometry. Instances hold a handle plus a transform; the arena decides
//! teardown order, so a handle can never dangle. The overall structure is a
//! DAG: building only ever instances already-committed nodes, so no cycle
//! can be formed.

use prism_math::Mat4;

use crate::geometry::Geometry;

/// Handle to a node in a `SceneGraph` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A transformed reference to a child node.
#[derive(Debug, Clone, Copy)]
pub struct Instance {
    pub node: NodeId,
    pub transform: Mat4,
}

#[derive(Debug, Default)]
struct NodeRecord {
    geometries: Vec<Geometry>,
    instances: Vec<Instance>,
    committed: bool,
}

/// Arena of scene nodes.
///
/// A node is mutable until `commit`, immutable after. Only committed nodes
/// may be instanced, which keeps every shared sub-scene finalized before a
/// sibling branch can reference it.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<NodeRecord>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, uncommitted node.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord::default());
        id
    }

    /// Attach a mesh to a node. The node must not be committed yet.
    pub fn attach_geometry(&mut self, node: NodeId, geometry: Geometry) {
        let record = &mut self.nodes[node.0];
        assert!(!record.committed, "attach_geometry on committed node");
        record.geometries.push(geometry);
    }

    /// Instance `child` under `parent` with the given transform.
    ///
    /// The parent must still be mutable and the child already committed.
    pub fn add_instance(&mut self, parent: NodeId, child: NodeId, transform: Mat4) {
        assert!(
            self.nodes[child.0].committed,
            "instancing uncommitted node {}",
            child.0
        );
        let record = &mut self.nodes[parent.0];
        assert!(!record.committed, "add_instance on committed node");
        record.instances.push(Instance {
            node: child,
            transform,
        });
    }

    /// Finalize a node, making it safe to instance and share.
    pub fn commit(&mut self, node: NodeId) {
        self.nodes[node.0].committed = true;
    }

    pub fn is_committed(&self, node: NodeId) -> bool {
        self.nodes[node.0].committed
    }

    pub fn geometries(&self, node: NodeId) -> &[Geometry] {
        &self.nodes[node.0].geometries
    }

    pub fn instances(&self, node: NodeId) -> &[Instance] {
        &self.nodes[node.0].instances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total instance edges across all nodes.
    pub fn instance_count(&self) -> usize {
        self.nodes.iter().map(|n| n.instances.len()).sum()
    }
}
