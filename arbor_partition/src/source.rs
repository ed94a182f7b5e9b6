// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source documents, flattened into an arena before partitioning.

use std::collections::HashMap;

use arbor_chunk::{FormatError, Node, NodePath, parse_value, release, repeated_name};
use serde_json::{Map, Value};

use crate::error::{CycleError, PartitionError};

/// Keys of a nested-map document that describe the node rather than name a child.
const METADATA_KEYS: [&str; 4] = ["name", "level", "lazy", "id"];

/// Shape of a source document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceFormat {
    /// Pick from the document's top-level keys.
    #[default]
    Auto,
    /// `{"name": .., "children": [..]}` objects.
    Tree,
    /// `{"Life": {"Animalia": {..}}}`: keys name children; `name`, `level`,
    /// `lazy` and `id` are metadata. Children come out ordered by key.
    Nested,
    /// `{"root": id, "nodes": [{"id", "name", "children": [id, ..]}]}`.
    Adjacency,
}

impl SourceFormat {
    /// Resolve [`SourceFormat::Auto`] against a parsed document.
    pub fn detect(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Tree;
        };
        if obj.contains_key("root") && obj.get("nodes").is_some_and(Value::is_array) {
            Self::Adjacency
        } else if obj.contains_key("children") || !has_child_keys(obj) {
            Self::Tree
        } else {
            Self::Nested
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SourceNode {
    pub(crate) name: String,
    pub(crate) level: u32,
    pub(crate) children: Vec<usize>,
    /// Whether a childless node was written with an explicit empty child list.
    pub(crate) empty_children: bool,
}

/// A fully materialized input tree stored as a preorder arena.
///
/// Index 0 is the root; every node's children have larger indices than the node.
#[derive(Clone, Debug)]
pub struct SourceTree {
    pub(crate) nodes: Vec<SourceNode>,
}

impl SourceTree {
    /// Parse a JSON document in the given format.
    pub fn parse(bytes: &[u8], format: SourceFormat) -> Result<Self, PartitionError> {
        let value = parse_value(bytes)?;
        let tree = Self::from_value(&value, format);
        release(value);
        tree
    }

    /// Convert a parsed document.
    pub fn from_value(value: &Value, format: SourceFormat) -> Result<Self, PartitionError> {
        match format {
            SourceFormat::Auto => Self::from_value(value, SourceFormat::detect(value)),
            SourceFormat::Tree => Ok(from_tree(value)?),
            SourceFormat::Nested => Ok(from_nested(value)?),
            SourceFormat::Adjacency => from_adjacency(value),
        }
    }

    /// Flatten an in-memory tree. Stubs are rejected: the input must be complete.
    pub fn from_node(root: &Node) -> Result<Self, PartitionError> {
        let mut tree = Self { nodes: Vec::new() };
        let mut stack: Vec<(&Node, Option<usize>, String)> = vec![(root, None, "$".to_owned())];
        while let Some((node, parent, path)) = stack.pop() {
            if node.is_stub {
                return Err(FormatError::StubInvariant {
                    path,
                    reason: "partition input must not contain stubs",
                }
                .into());
            }
            let index = tree.push(
                parent,
                node.name.clone(),
                node.level,
                node.children.as_ref().is_some_and(Vec::is_empty),
            );
            let names = node.children().iter().map(|c| c.name.as_str());
            if let Some((i, name)) = repeated_name(names) {
                return Err(duplicate_name(format!("{path}.children[{i}]"), name).into());
            }
            for (i, child) in node.children().iter().enumerate().rev() {
                stack.push((child, Some(index), format!("{path}.children[{i}]")));
            }
        }
        Ok(tree)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty; never true for a successfully built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name of the root node.
    pub fn root_name(&self) -> Option<&str> {
        self.nodes.first().map(|n| n.name.as_str())
    }

    /// Rebuild the tree as [`Node`]s.
    pub fn to_node(&self) -> Option<Node> {
        let mut built: Vec<Option<Node>> = vec![None; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let source = &self.nodes[index];
            let node = if source.children.is_empty() {
                let mut leaf = Node::leaf(source.name.clone(), source.level);
                if source.empty_children {
                    leaf.children = Some(Vec::new());
                }
                leaf
            } else {
                let children = source
                    .children
                    .iter()
                    .map(|&c| built[c].take())
                    .collect::<Option<Vec<_>>>()?;
                Node::branch(source.name.clone(), source.level, children)
            };
            built[index] = Some(node);
        }
        built.first_mut().and_then(Option::take)
    }

    fn push(&mut self, parent: Option<usize>, name: String, level: u32, empty_children: bool) -> usize {
        let index = self.nodes.len();
        self.nodes.push(SourceNode {
            name,
            level,
            children: Vec::new(),
            empty_children,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        index
    }
}

/// Names are path segments; a repeated sibling name would make two nodes one identity.
fn duplicate_name(path: String, name: &str) -> FormatError {
    FormatError::InvalidField {
        path,
        field: "name",
        reason: format!("duplicate sibling name {name:?}"),
    }
}

fn name_of(value: &Value) -> Option<&str> {
    value.get("name").and_then(Value::as_str)
}

fn has_child_keys(obj: &Map<String, Value>) -> bool {
    obj.iter()
        .any(|(key, value)| value.is_object() && !METADATA_KEYS.contains(&key.as_str()))
}

fn level_of(obj: &Map<String, Value>, depth: u32) -> u32 {
    obj.get("level")
        .and_then(Value::as_u64)
        .and_then(|level| u32::try_from(level).ok())
        .unwrap_or(depth)
}

fn from_tree(value: &Value) -> Result<SourceTree, FormatError> {
    let mut tree = SourceTree { nodes: Vec::new() };
    let mut stack: Vec<(&Value, Option<usize>, u32, String)> = vec![(value, None, 0, "$".to_owned())];
    while let Some((value, parent, depth, path)) = stack.pop() {
        let Some(obj) = value.as_object() else {
            return Err(FormatError::NotAnObject { path });
        };
        let Some(name) = obj.get("name").and_then(Value::as_str) else {
            return Err(FormatError::MissingName { path });
        };
        let children = match obj.get("children") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(children)) => children.as_slice(),
            Some(_) => return Err(FormatError::ChildrenNotArray { path }),
        };
        let explicit_empty = matches!(obj.get("children"), Some(Value::Array(c)) if c.is_empty());
        let index = tree.push(parent, name.to_owned(), level_of(obj, depth), explicit_empty);
        // Unnamed children are reported when they are visited.
        if let Some((_, name)) = repeated_name(children.iter().filter_map(name_of)) {
            let i = children
                .iter()
                .enumerate()
                .filter(|(_, child)| name_of(child) == Some(name))
                .nth(1)
                .map_or(0, |(i, _)| i);
            return Err(duplicate_name(format!("{path}.children[{i}]"), name));
        }
        for (i, child) in children.iter().enumerate().rev() {
            stack.push((child, Some(index), depth + 1, format!("{path}.children[{i}]")));
        }
    }
    Ok(tree)
}

fn from_nested(value: &Value) -> Result<SourceTree, FormatError> {
    let Some(top) = value.as_object() else {
        return Err(FormatError::NotAnObject {
            path: "$".to_owned(),
        });
    };
    // Either the document is the root itself, or it wraps a single root key.
    let (root_name, root_obj, root_path) = match top.get("name").and_then(Value::as_str) {
        Some(name) => (name.to_owned(), top, "$".to_owned()),
        None => {
            let mut keys = top
                .iter()
                .filter(|(key, value)| value.is_object() && !METADATA_KEYS.contains(&key.as_str()));
            match (keys.next(), keys.next()) {
                (Some((key, Value::Object(obj))), None) => (key.clone(), obj, format!("$[{key:?}]")),
                _ => {
                    return Err(FormatError::MissingName {
                        path: "$".to_owned(),
                    });
                }
            }
        }
    };

    let mut tree = SourceTree { nodes: Vec::new() };
    let mut stack: Vec<(String, &Map<String, Value>, Option<usize>, u32, String)> =
        vec![(root_name, root_obj, None, 0, root_path)];
    while let Some((name, obj, parent, depth, path)) = stack.pop() {
        let index = tree.push(parent, name, level_of(obj, depth), false);
        let children: Vec<_> = obj
            .iter()
            .filter(|(key, _)| !METADATA_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| value.as_object().map(|child| (key, child)))
            .collect();
        for (key, child) in children.into_iter().rev() {
            stack.push((key.clone(), child, Some(index), depth + 1, format!("{path}[{key:?}]")));
        }
    }
    Ok(tree)
}

fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

enum Visit {
    Enter {
        entry: usize,
        parent: Option<usize>,
        depth: u32,
    },
    Exit {
        entry: usize,
    },
}

fn from_adjacency(value: &Value) -> Result<SourceTree, PartitionError> {
    let invalid = |path: String, field: &'static str, reason: String| FormatError::InvalidField {
        path,
        field,
        reason,
    };
    let Some(obj) = value.as_object() else {
        return Err(FormatError::NotAnObject {
            path: "$".to_owned(),
        }
        .into());
    };
    let Some(entries) = obj.get("nodes").and_then(Value::as_array) else {
        return Err(invalid("$".to_owned(), "nodes", "expected an array".to_owned()).into());
    };
    let Some(root_key) = obj.get("root").and_then(id_key) else {
        return Err(invalid("$".to_owned(), "root", "expected a string or number id".to_owned()).into());
    };

    struct Entry<'a> {
        name: String,
        obj: &'a Map<String, Value>,
        children: Vec<usize>,
    }
    let mut by_id: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut parsed = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let path = format!("$.nodes[{i}]");
        let Some(entry_obj) = entry.as_object() else {
            return Err(FormatError::NotAnObject { path }.into());
        };
        let Some(id) = entry_obj.get("id").and_then(id_key) else {
            return Err(invalid(path, "id", "expected a string or number id".to_owned()).into());
        };
        let name = match entry_obj.get("name") {
            Some(Value::String(name)) => name.clone(),
            None => id.clone(),
            Some(_) => return Err(FormatError::MissingName { path }.into()),
        };
        if by_id.insert(id.clone(), i).is_some() {
            return Err(invalid(path, "id", format!("duplicate id {id:?}")).into());
        }
        parsed.push(Entry {
            name,
            obj: entry_obj,
            children: Vec::new(),
        });
    }
    for (i, entry) in entries.iter().enumerate() {
        let children = match entry.get("children") {
            None | Some(Value::Null) => continue,
            Some(Value::Array(children)) => children,
            Some(_) => {
                return Err(FormatError::ChildrenNotArray {
                    path: format!("$.nodes[{i}]"),
                }
                .into());
            }
        };
        for (j, child) in children.iter().enumerate() {
            let resolved = id_key(child).and_then(|key| by_id.get(&key).copied());
            let Some(resolved) = resolved else {
                return Err(invalid(
                    format!("$.nodes[{i}].children[{j}]"),
                    "children",
                    format!("unknown node id {child}"),
                )
                .into());
            };
            parsed[i].children.push(resolved);
        }
        let names = parsed[i].children.iter().map(|&c| parsed[c].name.as_str());
        if let Some((j, name)) = repeated_name(names) {
            return Err(duplicate_name(format!("$.nodes[{i}].children[{j}]"), name).into());
        }
    }
    let Some(&root) = by_id.get(&root_key) else {
        return Err(invalid("$".to_owned(), "root", format!("unknown node id {root_key:?}")).into());
    };

    let mut tree = SourceTree { nodes: Vec::new() };
    let mut visited = vec![false; parsed.len()];
    let mut on_path = vec![false; parsed.len()];
    let mut names: Vec<String> = Vec::new();
    let mut stack = vec![Visit::Enter {
        entry: root,
        parent: None,
        depth: 0,
    }];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter {
                entry,
                parent,
                depth,
            } => {
                let source = &parsed[entry];
                if on_path[entry] {
                    let mut path = names.clone();
                    path.push(source.name.clone());
                    return Err(CycleError {
                        path: NodePath::new(path),
                    }
                    .into());
                }
                if visited[entry] {
                    return Err(invalid(
                        format!("$.nodes[{entry}]"),
                        "children",
                        format!("{:?} has more than one parent", source.name),
                    )
                    .into());
                }
                visited[entry] = true;
                on_path[entry] = true;
                names.push(source.name.clone());
                let explicit_empty =
                    matches!(source.obj.get("children"), Some(Value::Array(c)) if c.is_empty());
                let index = tree.push(
                    parent,
                    source.name.clone(),
                    level_of(source.obj, depth),
                    explicit_empty,
                );
                stack.push(Visit::Exit { entry });
                for &child in source.children.iter().rev() {
                    stack.push(Visit::Enter {
                        entry: child,
                        parent: Some(index),
                        depth: depth + 1,
                    });
                }
            }
            Visit::Exit { entry } => {
                on_path[entry] = false;
                names.pop();
            }
        }
    }
    Ok(tree)
}
