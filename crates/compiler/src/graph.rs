//! Node graph model
//!
//! A node graph is the serialized form of a node tree: named nodes of a
//! given kind, each with string properties and default values for its input
//! sockets, plus links between output and input sockets.
//!
//! Two node kinds are special. The single [`OUTPUT_NODE`] declares the
//! outputs of the compiled function through its `sockets` list; the
//! optional [`INPUT_NODE`] declares its inputs the same way. All other
//! nodes take their sockets from the function their kind builds.
//!
//! ```json
//! {
//!   "name": "add",
//!   "nodes": [
//!     { "name": "In", "kind": "fn_FunctionInputNode",
//!       "sockets": [{ "name": "a", "type": "Float" }, { "name": "b", "type": "Float" }] },
//!     { "name": "Add", "kind": "fn_FloatMathNode", "properties": { "operation": "add" } },
//!     { "name": "Out", "kind": "fn_FunctionOutputNode",
//!       "sockets": [{ "name": "result", "type": "Float" }] }
//!   ],
//!   "links": [
//!     { "from": { "node": "In", "socket": "a" }, "to": { "node": "Add", "socket": "a" } },
//!     { "from": { "node": "In", "socket": "b" }, "to": { "node": "Add", "socket": "b" } },
//!     { "from": { "node": "Add", "socket": "result" }, "to": { "node": "Out", "socket": "result" } }
//!   ]
//! }
//! ```

use crate::error::LoadError;
use nodefn_core::{SharedList, TypeKind, Value, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const INPUT_NODE: &str = "fn_FunctionInputNode";
pub const OUTPUT_NODE: &str = "fn_FunctionOutputNode";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGraph {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Declared sockets of the interface nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sockets: Vec<SocketDecl>,
    /// Values for input sockets that have no incoming link
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, Literal>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
            sockets: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_socket(mut self, name: impl Into<String>, data_type: TypeKind) -> Self {
        self.sockets.push(SocketDecl {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn with_default(mut self, socket: impl Into<String>, value: Literal) -> Self {
        self.defaults.insert(socket.into(), value);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: String,
    pub socket: String,
}

impl SocketRef {
    pub fn new(node: impl Into<String>, socket: impl Into<String>) -> Self {
        SocketRef {
            node: node.into(),
            socket: socket.into(),
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.socket)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: SocketRef,
    pub to: SocketRef,
}

impl Link {
    pub fn new(from: SocketRef, to: SocketRef) -> Self {
        Link { from, to }
    }
}

/// Untyped literal from a graph or command line; typed by its socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    Array(Vec<Literal>),
}

impl Literal {
    pub fn vector(x: f64, y: f64, z: f64) -> Self {
        Literal::Array(vec![
            Literal::Number(x),
            Literal::Number(y),
            Literal::Number(z),
        ])
    }

    /// Convert to a value of `kind`; `None` if the shape does not fit
    pub fn to_value(&self, kind: TypeKind) -> Option<Value> {
        match kind {
            TypeKind::Float => self.as_float().map(Value::Float),
            TypeKind::Int32 => self.as_int().map(Value::Int32),
            TypeKind::FVec3 => self.as_vector().map(Value::FVec3),
            TypeKind::FloatList => self
                .elements(Literal::as_float)
                .map(|v| Value::FloatList(SharedList::from_vec(v))),
            TypeKind::Int32List => self
                .elements(Literal::as_int)
                .map(|v| Value::Int32List(SharedList::from_vec(v))),
            TypeKind::FVec3List => self
                .elements(Literal::as_vector)
                .map(|v| Value::FVec3List(SharedList::from_vec(v))),
        }
    }

    fn as_float(&self) -> Option<f32> {
        match self {
            Literal::Number(n) => Some(*n as f32),
            Literal::Array(_) => None,
        }
    }

    fn as_int(&self) -> Option<i32> {
        match self {
            Literal::Number(n) if n.fract() == 0.0 => {
                let n = *n;
                if n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
                    Some(n as i32)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn as_vector(&self) -> Option<Vector> {
        match self {
            Literal::Array(items) if items.len() == 3 => Some(Vector::new(
                items[0].as_float()?,
                items[1].as_float()?,
                items[2].as_float()?,
            )),
            _ => None,
        }
    }

    fn elements<T>(&self, convert: fn(&Literal) -> Option<T>) -> Option<Vec<T>> {
        match self {
            Literal::Array(items) => items.iter().map(convert).collect(),
            Literal::Number(_) => None,
        }
    }
}

impl NodeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        NodeGraph {
            name: name.into(),
            ..NodeGraph::default()
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a link given `"node.socket"`-style endpoints
    pub fn with_link(mut self, from: (&str, &str), to: (&str, &str)) -> Self {
        self.links.push(Link::new(
            SocketRef::new(from.0, from.1),
            SocketRef::new(to.0, to.1),
        ));
        self
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a `.json` or `.toml` graph file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => NodeGraph::from_json(&text),
            Some("toml") => NodeGraph::from_toml(&text),
            _ => Err(LoadError::UnsupportedExtension(path.to_path_buf())),
        }
    }
}
