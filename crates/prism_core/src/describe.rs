//! Scene description classification.
//!
//! The textual description is JSON. Instead of probing optional fields all
//! over the builder, a single classification step maps every node to one of
//! five shapes, which the builder then matches exhaustively. Anything that
//! fits no shape is a syntax error carrying the offending fragment.

use prism_math::Mat4;
use serde_json::Value;

use crate::error::{BuildError, BuildResult};

/// The recognized shapes of a description node.
#[derive(Debug)]
pub enum NodeShape<'a> {
    /// `{"path": "mesh.obj", ...}` - a mesh file reference.
    MeshRef { path: &'a str },
    /// `{"objects": [...], "instances": [{"id", "transform"}, ...]}`.
    InlineInstanceGroup {
        objects: &'a [Value],
        instances: &'a [Value],
    },
    /// `{"objects": [...], "instance_file": "records.bin"}`.
    StreamInstanceGroup {
        objects: &'a [Value],
        stream_path: &'a str,
    },
    /// `{"objects": [...]}` - every child instanced exactly once.
    Group { objects: &'a [Value] },
    /// A bare array: an implicit group with no instancing directive.
    List(&'a [Value]),
}

/// A classified node: its shape plus the fields common to all shapes.
#[derive(Debug)]
pub struct Classified<'a> {
    pub shape: NodeShape<'a>,
    /// The node's own transform, identity when absent.
    pub transform: Mat4,
    /// Optional identity key for sub-scene deduplication.
    pub key: Option<&'a str>,
}

/// Classify one description node, or fail with `InvalidSceneSyntax`.
pub fn classify(value: &Value) -> BuildResult<Classified<'_>> {
    if let Some(items) = value.as_array() {
        return Ok(Classified {
            shape: NodeShape::List(items),
            transform: Mat4::IDENTITY,
            key: None,
        });
    }

    let object = match value.as_object() {
        Some(object) => object,
        None => return Err(syntax_error(value)),
    };

    let transform = match object.get("transform") {
        Some(matrix) => parse_mat4(matrix)?,
        None => Mat4::IDENTITY,
    };
    let key = object.get("key").and_then(Value::as_str);

    if let Some(path) = object.get("path").and_then(Value::as_str) {
        return Ok(Classified {
            shape: NodeShape::MeshRef { path },
            transform,
            key,
        });
    }

    if let Some(objects) = object.get("objects").and_then(Value::as_array) {
        let shape = if let Some(instances) = object.get("instances") {
            let instances = instances.as_array().ok_or_else(|| syntax_error(value))?;
            NodeShape::InlineInstanceGroup { objects, instances }
        } else if let Some(stream) = object.get("instance_file") {
            let stream_path = stream.as_str().ok_or_else(|| syntax_error(value))?;
            NodeShape::StreamInstanceGroup {
                objects,
                stream_path,
            }
        } else {
            NodeShape::Group { objects }
        };

        return Ok(Classified {
            shape,
            transform,
            key,
        });
    }

    Err(syntax_error(value))
}

/// Parse an inline instance entry `{"id": n, "transform": [16 floats]}`.
pub fn parse_instance_entry(value: &Value) -> BuildResult<(u64, Mat4)> {
    let entry = value.as_object().ok_or_else(|| syntax_error(value))?;
    let id = entry
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| syntax_error(value))?;
    let transform = parse_mat4(entry.get("transform").ok_or_else(|| syntax_error(value))?)?;
    Ok((id, transform))
}

/// Parse a 16-float column-major matrix.
pub fn parse_mat4(value: &Value) -> BuildResult<Mat4> {
    let items = value
        .as_array()
        .filter(|items| items.len() == 16)
        .ok_or_else(|| syntax_error(value))?;

    let mut cols = [0.0f32; 16];
    for (slot, item) in cols.iter_mut().zip(items) {
        *slot = item.as_f64().ok_or_else(|| syntax_error(value))? as f32;
    }
    Ok(Mat4::from_cols_array(&cols))
}

fn syntax_error(fragment: &Value) -> BuildError {
    BuildError::InvalidSceneSyntax(fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::{Vec3, Vec4};
    use serde_json::json;

    #[test]
    fn test_classify_mesh_ref() {
        let value = json!({"path": "bunny.obj"});
        let classified = classify(&value).unwrap();

        assert!(matches!(
            classified.shape,
            NodeShape::MeshRef { path: "bunny.obj" }
        ));
        assert_eq!(classified.transform, Mat4::IDENTITY);
        assert!(classified.key.is_none());
    }

    #[test]
    fn test_classify_group_variants() {
        let plain = json!({"objects": []});
        assert!(matches!(
            classify(&plain).unwrap().shape,
            NodeShape::Group { .. }
        ));

        let inline = json!({"objects": [], "instances": []});
        assert!(matches!(
            classify(&inline).unwrap().shape,
            NodeShape::InlineInstanceGroup { .. }
        ));

        let stream = json!({"objects": [], "instance_file": "grid.bin"});
        assert!(matches!(
            classify(&stream).unwrap().shape,
            NodeShape::StreamInstanceGroup {
                stream_path: "grid.bin",
                ..
            }
        ));
    }

    #[test]
    fn test_classify_list_and_key() {
        let list = json!([{"path": "a.obj"}]);
        assert!(matches!(classify(&list).unwrap().shape, NodeShape::List(_)));

        let keyed = json!({"key": "tree", "objects": []});
        assert_eq!(classify(&keyed).unwrap().key, Some("tree"));
    }

    #[test]
    fn test_unrecognized_shape_carries_fragment() {
        let value = json!({"nonsense": 42});
        let err = classify(&value).unwrap_err();

        match err {
            BuildError::InvalidSceneSyntax(fragment) => {
                assert!(fragment.contains("nonsense"));
            }
            other => panic!("expected InvalidSceneSyntax, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_mat4_column_major() {
        let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let value = json!(translation.to_cols_array().to_vec());

        let parsed = parse_mat4(&value).unwrap();
        assert_eq!(parsed, translation);
        // Column-major: translation lands in the fourth column
        assert_eq!(parsed.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_parse_mat4_wrong_arity() {
        let value = json!([1.0, 2.0, 3.0]);
        assert!(matches!(
            parse_mat4(&value),
            Err(BuildError::InvalidSceneSyntax(_))
        ));
    }
}
