//! Committed scene: the trace-ready snapshot of a scene graph.
//!
//! `commit` walks the graph once from the root, builds one BVH per
//! geometry-bearing node, and flattens every path to such a node into a
//! world-space instance. The graph stays untouched; the snapshot owns
//! everything it needs.

use std::collections::HashMap;
use std::sync::Arc;

use prism_core::{NodeId, SceneGraph};
use prism_math::{Aabb, Interval, Mat4, Ray};

use crate::bvh::Bvh;
use crate::triangle::Triangle;
use crate::{Hit, T_MIN};

/// A hit against the committed scene, tagged with the prototype that
/// produced it.
#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    pub hit: Hit,
    pub prototype: usize,
}

struct FlatInstance {
    prototype: usize,
    /// Local-to-world.
    transform: Mat4,
    /// World-to-local, precomputed for ray transformation.
    inverse: Mat4,
    /// World-space bounds, precomputed for culling.
    world_bounds: Aabb,
}

/// An immutable, trace-ready scene.
pub struct CommittedScene {
    prototypes: Vec<Arc<Bvh>>,
    instances: Vec<FlatInstance>,
    bounds: Aabb,
}

impl CommittedScene {
    /// Snapshot the graph reachable from `root`.
    ///
    /// Every geometry-bearing node becomes one prototype BVH regardless of
    /// how many paths reach it; each path becomes one flat instance.
    pub fn commit(graph: &SceneGraph, root: NodeId) -> Self {
        let mut builder = SceneBuilder {
            graph,
            prototype_of_node: HashMap::new(),
            prototypes: Vec::new(),
            instances: Vec::new(),
        };
        builder.flatten(root, Mat4::IDENTITY);

        let bounds = builder
            .instances
            .iter()
            .fold(Aabb::EMPTY, |acc, i| Aabb::surrounding(&acc, &i.world_bounds));

        log::info!(
            "committed scene: {} prototypes, {} instances",
            builder.prototypes.len(),
            builder.instances.len()
        );

        Self {
            prototypes: builder.prototypes,
            instances: builder.instances,
            bounds,
        }
    }

    /// Closest intersection along `ray`, or `None` for a miss.
    ///
    /// Instances are culled by world bounds, then the ray is mapped into the
    /// prototype's local space. Directions stay unnormalized through the
    /// mapping, so t values compare directly across instances.
    pub fn intersect(&self, ray: &Ray) -> Option<SceneHit> {
        let mut closest: Option<SceneHit> = None;
        let mut max = f32::INFINITY;

        for instance in &self.instances {
            if !instance.world_bounds.hit(ray, Interval::new(T_MIN, max)) {
                continue;
            }

            let local_ray = ray.transformed(&instance.inverse);
            if let Some(local) = self.prototypes[instance.prototype]
                .hit(&local_ray, Interval::new(T_MIN, max))
            {
                // Same t on both sides of the affine map
                let normal = instance
                    .transform
                    .transform_vector3(local.normal)
                    .normalize();
                max = local.t;
                closest = Some(SceneHit {
                    hit: Hit {
                        t: local.t,
                        point: ray.at(local.t),
                        normal,
                    },
                    prototype: instance.prototype,
                });
            }
        }

        closest
    }

    /// World-space bounds of everything instanced in the scene.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn prototype_count(&self) -> usize {
        self.prototypes.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

struct SceneBuilder<'a> {
    graph: &'a SceneGraph,
    /// Graph node index -> prototype index, so shared nodes build one BVH.
    prototype_of_node: HashMap<usize, usize>,
    prototypes: Vec<Arc<Bvh>>,
    instances: Vec<FlatInstance>,
}

impl SceneBuilder<'_> {
    fn flatten(&mut self, node: NodeId, world: Mat4) {
        assert!(
            self.graph.is_committed(node),
            "committing scene over uncommitted node {}",
            node.index()
        );

        if !self.graph.geometries(node).is_empty() {
            let prototype = self.prototype_for(node);
            let local_bounds = self.prototypes[prototype].bounding_box();
            self.instances.push(FlatInstance {
                prototype,
                transform: world,
                inverse: world.inverse(),
                world_bounds: local_bounds.transformed(&world),
            });
        }

        for instance in self.graph.instances(node) {
            self.flatten(instance.node, world * instance.transform);
        }
    }

    fn prototype_for(&mut self, node: NodeId) -> usize {
        if let Some(&existing) = self.prototype_of_node.get(&node.index()) {
            return existing;
        }

        let mut triangles = Vec::new();
        for geometry in self.graph.geometries(node) {
            for i in 0..geometry.triangle_count() {
                let [v0, v1, v2] = geometry.triangle(i);
                triangles.push(Triangle::new(v0, v1, v2));
            }
        }

        log::debug!(
            "prototype BVH for node {}: {} triangles",
            node.index(),
            triangles.len()
        );

        let index = self.prototypes.len();
        self.prototypes.push(Arc::new(Bvh::build(triangles)));
        self.prototype_of_node.insert(node.index(), index);
        index
    }
}
