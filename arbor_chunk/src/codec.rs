// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON encoding and validating decode for [`Node`] documents.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::node::{Node, repeated_name};

const ROOT_PATH: &str = "$";

/// Encode a node (and its subtree) as compact JSON.
pub fn encode(node: &Node) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec(node)?)
}

/// Encode a node as indented JSON, for documents meant to be read by people.
pub fn encode_pretty(node: &Node) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec_pretty(node)?)
}

/// Decode a node document.
///
/// Fails with [`FormatError`] if the bytes are not JSON, if any node is not an
/// object, lacks a string `name`, has a non-array `children`, carries a field
/// of the wrong type, repeats a sibling's name, or breaks the stub invariant.
/// Nesting depth is not limited. A missing `leafCount` is
/// derived from the children; a missing `level` is taken from the depth.
pub fn decode(bytes: &[u8]) -> Result<Node, FormatError> {
    let value = parse_value(bytes)?;
    let node = decode_value(&value);
    release(value);
    node
}

/// Parse JSON of any nesting depth.
///
/// The parser grows its stack on the heap instead of stopping at serde_json's
/// default nesting limit. Hand deep results to [`release`] once done.
pub fn parse_value(bytes: &[u8]) -> Result<Value, FormatError> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    if let Err(err) = de.end() {
        release(value);
        return Err(err.into());
    }
    Ok(value)
}

/// Drop a parsed value without recursing once per nesting level.
pub fn release(value: Value) {
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Array(items) => stack.extend(items),
            Value::Object(fields) => stack.extend(fields.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Decode an already parsed JSON value. See [`decode`].
pub fn decode_value(value: &Value) -> Result<Node, FormatError> {
    let mut stack = vec![Frame::open(value, ROOT_PATH.to_owned(), 0)?];
    let mut root = None;
    while let Some(top) = stack.last_mut() {
        if let Some((index, child)) = top.next_child() {
            let path = format!("{}.children[{index}]", top.path);
            let frame = Frame::open(child, path, top.level.saturating_add(1))?;
            stack.push(frame);
            continue;
        }
        let Some(frame) = stack.pop() else {
            break;
        };
        let node = frame.finish()?;
        match stack.last_mut() {
            Some(parent) => parent.built.push(node),
            None => root = Some(node),
        }
    }
    root.ok_or_else(|| FormatError::NotAnObject {
        path: ROOT_PATH.to_owned(),
    })
}

/// A node whose children are still being decoded.
struct Frame<'a> {
    path: String,
    name: String,
    level: u32,
    is_stub: bool,
    chunk_ref: Option<String>,
    leaf_count: Option<u64>,
    node_count: Option<u64>,
    children: Option<&'a [Value]>,
    built: Vec<Node>,
}

impl<'a> Frame<'a> {
    fn open(value: &'a Value, path: String, default_level: u32) -> Result<Self, FormatError> {
        let Some(obj) = value.as_object() else {
            return Err(FormatError::NotAnObject { path });
        };
        let name = match obj.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(FormatError::InvalidField {
                    path,
                    field: "name",
                    reason: "expected a string".to_owned(),
                });
            }
            None => return Err(FormatError::MissingName { path }),
        };
        let level = match optional_count(obj, &path, "level")? {
            Some(level) => u32::try_from(level).map_err(|_| FormatError::InvalidField {
                path: path.clone(),
                field: "level",
                reason: "out of range".to_owned(),
            })?,
            None => default_level,
        };
        let leaf_count = optional_count(obj, &path, "leafCount")?;
        if leaf_count == Some(0) {
            return Err(FormatError::InvalidField {
                path,
                field: "leafCount",
                reason: "must be at least 1".to_owned(),
            });
        }
        let node_count = optional_count(obj, &path, "nodeCount")?;
        let is_stub = match obj.get("isStub") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(FormatError::InvalidField {
                    path,
                    field: "isStub",
                    reason: "expected a boolean".to_owned(),
                });
            }
        };
        let chunk_ref = match obj.get("chunkRef") {
            None | Some(Value::Null) => None,
            Some(Value::String(chunk_ref)) => Some(chunk_ref.clone()),
            Some(_) => {
                return Err(FormatError::InvalidField {
                    path,
                    field: "chunkRef",
                    reason: "expected a string".to_owned(),
                });
            }
        };
        let children = match obj.get("children") {
            None | Some(Value::Null) => None,
            Some(Value::Array(children)) => Some(children.as_slice()),
            Some(_) => return Err(FormatError::ChildrenNotArray { path }),
        };

        if is_stub {
            if children.is_some() {
                return Err(FormatError::StubInvariant {
                    path,
                    reason: "stub must not carry children",
                });
            }
            if chunk_ref.is_none() {
                return Err(FormatError::StubInvariant {
                    path,
                    reason: "stub must carry a chunkRef",
                });
            }
        } else if chunk_ref.is_some() {
            return Err(FormatError::StubInvariant {
                path,
                reason: "chunkRef is only allowed on stubs",
            });
        }

        let built = Vec::with_capacity(children.map_or(0, <[Value]>::len));
        Ok(Self {
            path,
            name,
            level,
            is_stub,
            chunk_ref,
            leaf_count,
            node_count,
            children,
            built,
        })
    }

    fn next_child(&self) -> Option<(usize, &'a Value)> {
        let index = self.built.len();
        self.children?.get(index).map(|child| (index, child))
    }

    fn finish(self) -> Result<Node, FormatError> {
        if let Some((index, name)) = repeated_name(self.built.iter().map(|c| c.name.as_str())) {
            return Err(FormatError::InvalidField {
                path: format!("{}.children[{index}]", self.path),
                field: "name",
                reason: format!("duplicate sibling name {name:?}"),
            });
        }
        let derived = if self.built.is_empty() {
            1
        } else {
            self.built.iter().map(|c| c.leaf_count).sum()
        };
        let leaf_count = match self.leaf_count {
            Some(declared) if !self.is_stub && declared != derived => {
                return Err(FormatError::InvalidField {
                    path: self.path,
                    field: "leafCount",
                    reason: format!("declared {declared}, children hold {derived}"),
                });
            }
            Some(declared) => declared,
            None => derived,
        };
        Ok(Node {
            name: self.name,
            level: self.level,
            is_stub: self.is_stub,
            chunk_ref: self.chunk_ref,
            leaf_count,
            node_count: self.node_count,
            children: self.children.map(|_| self.built),
        })
    }
}

fn optional_count(
    obj: &Map<String, Value>,
    path: &str,
    field: &'static str,
) -> Result<Option<u64>, FormatError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| FormatError::InvalidField {
            path: path.to_owned(),
            field,
            reason: "expected a non-negative integer".to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Node {
        Node::branch(
            "Life",
            0,
            vec![
                Node::branch(
                    "Eukaryota",
                    1,
                    vec![
                        Node::leaf("Animalia", 2),
                        Node::stub("Plantae", 2, "chunk_00003.json", 310, 402),
                    ],
                ),
                Node::leaf("Archaea", 1),
            ],
        )
    }

    #[test]
    fn round_trip_is_lossless() {
        let tree = tree();
        let compact = encode(&tree).unwrap();
        let pretty = encode_pretty(&tree).unwrap();
        assert_eq!(decode(&compact).unwrap(), tree);
        assert_eq!(decode(&pretty).unwrap(), tree);
    }

    #[test]
    fn stub_shape_on_the_wire() {
        let stub = Node::stub("Plantae", 2, "chunk_00003.json", 310, 402);
        let value: Value = serde_json::from_slice(&encode(&stub).unwrap()).unwrap();
        assert_eq!(value["isStub"], Value::Bool(true));
        assert_eq!(value["chunkRef"], "chunk_00003.json");
        assert_eq!(value["leafCount"], 310);
        assert!(value.get("children").is_none());
    }

    #[test]
    fn missing_fields_are_derived() {
        let doc = br#"{"name":"Life","children":[{"name":"A"},{"name":"B","children":[{"name":"C"},{"name":"D"}]}]}"#;
        let node = decode(doc).unwrap();
        assert_eq!(node.leaf_count, 3);
        assert_eq!(node.children()[1].level, 1);
        assert_eq!(node.children()[1].children()[0].level, 2);
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(
            decode(b"[1,2]"),
            Err(FormatError::NotAnObject {
                path: "$".to_owned()
            })
        );
        let err = decode(br#"{"name":"Life","children":[{"name":"A"},7]}"#).unwrap_err();
        assert_eq!(
            err,
            FormatError::NotAnObject {
                path: "$.children[1]".to_owned()
            }
        );
    }

    #[test]
    fn rejects_missing_name_and_bad_children() {
        let err = decode(br#"{"name":"Life","children":[{"level":1}]}"#).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingName {
                path: "$.children[0]".to_owned()
            }
        );
        let err = decode(br#"{"name":"Life","children":{"A":{}}}"#).unwrap_err();
        assert_eq!(
            err,
            FormatError::ChildrenNotArray {
                path: "$".to_owned()
            }
        );
    }

    #[test]
    fn rejects_stub_invariant_violations() {
        let with_children =
            br#"{"name":"X","isStub":true,"chunkRef":"c.json","children":[]}"#;
        assert!(matches!(
            decode(with_children),
            Err(FormatError::StubInvariant { .. })
        ));
        let without_ref = br#"{"name":"X","isStub":true}"#;
        assert!(matches!(
            decode(without_ref),
            Err(FormatError::StubInvariant { .. })
        ));
        let stray_ref = br#"{"name":"X","chunkRef":"c.json"}"#;
        assert!(matches!(
            decode(stray_ref),
            Err(FormatError::StubInvariant { .. })
        ));
    }

    #[test]
    fn rejects_bad_counts() {
        let negative = br#"{"name":"X","level":-1}"#;
        assert!(matches!(
            decode(negative),
            Err(FormatError::InvalidField { field: "level", .. })
        ));
        let mismatch = br#"{"name":"X","leafCount":5,"children":[{"name":"Y"}]}"#;
        assert!(matches!(
            decode(mismatch),
            Err(FormatError::InvalidField {
                field: "leafCount",
                ..
            })
        ));
    }

    #[test]
    fn rejects_duplicate_sibling_names() {
        let doc = br#"{"name":"Life","children":[{"name":"Incertae sedis"},{"name":"Fungi"},{"name":"Incertae sedis","children":[{"name":"A"}]}]}"#;
        assert_eq!(
            decode(doc),
            Err(FormatError::InvalidField {
                path: "$.children[2]".to_owned(),
                field: "name",
                reason: "duplicate sibling name \"Incertae sedis\"".to_owned(),
            })
        );
        // Cousins may share a name.
        let cousins = br#"{"name":"Life","children":[{"name":"A","children":[{"name":"X"}]},{"name":"B","children":[{"name":"X"}]}]}"#;
        assert!(decode(cousins).is_ok());
    }

    #[test]
    fn deep_chains_decode_without_recursion() {
        let mut value = serde_json::json!({ "name": "leaf" });
        for i in 0..10_000 {
            value = serde_json::json!({ "name": format!("n{i}"), "children": [value] });
        }
        let node = decode_value(&value).unwrap();
        release(value);
        assert_eq!(node.leaf_count, 1);
        assert_eq!(node.census().nodes, 10_001);
    }

    fn chain_text(depth: usize) -> String {
        let mut text = String::new();
        for i in 0..depth {
            text.push_str(&format!(r#"{{"name":"n{i}","children":["#));
        }
        text.push_str(r#"{"name":"leaf"}"#);
        text.push_str(&"]}".repeat(depth));
        text
    }

    #[test]
    fn deep_text_parses_past_the_default_nesting_limit() {
        let node = decode(chain_text(10_000).as_bytes()).unwrap();
        assert_eq!(node.census().nodes, 10_001);
        assert_eq!(node.leaf_count, 1);
        let mut tail = &node;
        while let [child] = tail.children() {
            tail = child;
        }
        assert_eq!(tail.name, "leaf");
        assert_eq!(tail.level, 10_000);
    }

    #[test]
    fn trailing_garbage_is_still_rejected() {
        let doc = format!("{} x", chain_text(300));
        assert!(matches!(decode(doc.as_bytes()), Err(FormatError::Json(_))));
    }
}
