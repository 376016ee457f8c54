//! Recursive scene graph construction from a description.
//!
//! The builder walks the description depth-first, turning every node into a
//! committed scene graph node. Repeated sub-scenes are built once: mesh
//! nodes are cached by resolved path, and any node can opt into caching with
//! an explicit identity key. Later references reuse the cached node through
//! a fresh instance edge with its own transform.
//!
//! Transform convention: a node's own transform rides on the edge that
//! references it, composed to the right of any per-instance transform
//! (`per_instance * own` with glam's column-vector matrices, so the own
//! transform applies closest to the node). Keeping the own transform on
//! the referencing edge is what lets a cached node be reused at a
//! different placement per occurrence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use prism_math::Mat4;
use serde_json::Value;

use crate::describe::{classify, parse_instance_entry, Classified, NodeShape};
use crate::error::{BuildError, BuildResult};
use crate::graph::{NodeId, SceneGraph};
use crate::loader::MeshLoader;

/// One record of a binary instance stream: child id plus a column-major
/// matrix. Native byte order, no padding, no header.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct StreamRecord {
    id: u32,
    transform: [f32; 16],
}

const STREAM_RECORD_SIZE: usize = std::mem::size_of::<StreamRecord>();

/// Builds a committed `SceneGraph` from a scene description.
pub struct SceneGraphBuilder<L: MeshLoader> {
    graph: SceneGraph,
    /// Identity key (resolved mesh path, or explicit key) -> built node.
    cache: HashMap<String, NodeId>,
    loader: L,
    root_dir: PathBuf,
}

impl<L: MeshLoader> SceneGraphBuilder<L> {
    /// `root_dir` is the base for resolving relative paths in the
    /// description, normally the description file's own directory.
    pub fn new(loader: L, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph: SceneGraph::new(),
            cache: HashMap::new(),
            loader,
            root_dir: root_dir.into(),
        }
    }

    /// Read and build a description file. The base directory becomes the
    /// file's parent, overriding whatever was passed to `new`.
    pub fn build_file(mut self, path: impl AsRef<Path>) -> BuildResult<(SceneGraph, NodeId)> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BuildError::ResourceNotFound(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            self.root_dir = parent.to_path_buf();
        }

        let description: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        self.build(&description)
    }

    /// Build the whole description, returning the graph and its root node.
    ///
    /// Any error aborts the build; no partial graph escapes.
    pub fn build(mut self, description: &Value) -> BuildResult<(SceneGraph, NodeId)> {
        let root = self.graph.add_node();

        // A bare array is iterated element-wise; anything else is a
        // single child.
        if let Some(items) = description.as_array() {
            for item in items {
                let (child, own) = self.build_node(item)?;
                self.graph.add_instance(root, child, own);
            }
        } else {
            let (child, own) = self.build_node(description)?;
            self.graph.add_instance(root, child, own);
        }

        self.graph.commit(root);
        log::info!(
            "scene graph built: {} nodes, {} instances",
            self.graph.node_count(),
            self.graph.instance_count()
        );
        Ok((self.graph, root))
    }

    /// Build one description node, returning the graph node and the
    /// occurrence's own transform for the caller's instance edge. The own
    /// transform never lands inside the node, so a cached node carries no
    /// trace of the occurrence that first built it.
    fn build_node(&mut self, value: &Value) -> BuildResult<(NodeId, Mat4)> {
        let Classified {
            shape,
            transform,
            key,
        } = classify(value)?;

        // Explicit identity key: skip construction and reuse the node.
        // This occurrence still places the shared node with its own
        // transform.
        if let Some(key) = key {
            if let Some(&cached) = self.cache.get(key) {
                return Ok((cached, transform));
            }
        }

        let node = match shape {
            NodeShape::MeshRef { path } => self.build_mesh_ref(path)?,
            NodeShape::InlineInstanceGroup { objects, instances } => {
                self.build_inline_group(objects, instances)?
            }
            NodeShape::StreamInstanceGroup {
                objects,
                stream_path,
            } => self.build_stream_group(objects, stream_path)?,
            NodeShape::Group { objects } => self.build_plain_group(objects)?,
            NodeShape::List(items) => self.build_plain_group(items)?,
        };

        if let Some(key) = key {
            self.cache.insert(key.to_owned(), node);
        }
        Ok((node, transform))
    }

    /// A mesh reference resolves to the geometry node for its path, built
    /// and cached on first sight.
    fn build_mesh_ref(&mut self, path: &str) -> BuildResult<NodeId> {
        let resolved = self.resolve(path);
        if !resolved.exists() {
            return Err(BuildError::ResourceNotFound(resolved));
        }

        let cache_key = resolved.to_string_lossy().into_owned();
        if let Some(&cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let geometry = self.loader.load(&resolved)?;
        let node = self.graph.add_node();
        self.graph.attach_geometry(node, geometry);
        self.graph.commit(node);
        self.cache.insert(cache_key, node);
        Ok(node)
    }

    /// Build every listed child once, then instance by id.
    fn build_inline_group(&mut self, objects: &[Value], instances: &[Value]) -> BuildResult<NodeId> {
        let children = self.build_children(objects)?;

        let node = self.graph.add_node();
        for entry in instances {
            let (id, transform) = parse_instance_entry(entry)?;
            let &(child, own) =
                children
                    .get(id as usize)
                    .ok_or(BuildError::InvalidReference {
                        id: id as u32,
                        count: children.len(),
                    })?;
            self.graph.add_instance(node, child, transform * own);
        }
        self.graph.commit(node);
        Ok(node)
    }

    /// Build every listed child once, then stream instance records from a
    /// binary side file until end-of-stream.
    fn build_stream_group(&mut self, objects: &[Value], stream_path: &str) -> BuildResult<NodeId> {
        let children = self.build_children(objects)?;

        let resolved = self.resolve(stream_path);
        if !resolved.exists() {
            return Err(BuildError::ResourceNotFound(resolved));
        }
        let mut reader = BufReader::new(File::open(&resolved)?);

        let node = self.graph.add_node();
        let mut count = 0usize;
        while let Some(buf) = read_record(&mut reader)? {
            let record: StreamRecord = bytemuck::pod_read_unaligned(&buf);
            let &(child, own) =
                children
                    .get(record.id as usize)
                    .ok_or(BuildError::InvalidReference {
                        id: record.id,
                        count: children.len(),
                    })?;
            self.graph
                .add_instance(node, child, Mat4::from_cols_array(&record.transform) * own);
            count += 1;
        }
        self.graph.commit(node);

        log::debug!("streamed {} instances from {}", count, resolved.display());
        Ok(node)
    }

    /// No instancing directive: every child instanced exactly once, in order.
    fn build_plain_group(&mut self, objects: &[Value]) -> BuildResult<NodeId> {
        let node = self.graph.add_node();
        for object in objects {
            let (child, own) = self.build_node(object)?;
            self.graph.add_instance(node, child, own);
        }
        self.graph.commit(node);
        Ok(node)
    }

    fn build_children(&mut self, objects: &[Value]) -> BuildResult<Vec<(NodeId, Mat4)>> {
        objects.iter().map(|o| self.build_node(o)).collect()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_relative() {
            self.root_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Read one full record, or `None` at end-of-stream.
///
/// A trailing partial record is deliberately discarded, matching the
/// stream format's "terminated by end-of-stream" contract.
fn read_record(reader: &mut impl Read) -> std::io::Result<Option<[u8; STREAM_RECORD_SIZE]>> {
    let mut buf = [0u8; STREAM_RECORD_SIZE];
    let mut filled = 0;
    while filled < STREAM_RECORD_SIZE {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(None);
        }
        filled += n;
    }
    Ok(Some(buf))
}
