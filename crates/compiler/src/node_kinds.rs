//! Node kind registry
//!
//! Maps a node's kind id to a builder that produces the function
//! implementing it. The function's signature defines the node's sockets:
//! input parameters are its input sockets and output parameters its output
//! sockets, matched by name.
//!
//! | Kind                        | Property    | Values                                   |
//! |-----------------------------|-------------|------------------------------------------|
//! | `fn_FloatMathNode`          | `operation` | add (default), subtract, multiply, ...   |
//! | `fn_IntMathNode`            | `operation` | as above                                 |
//! | `fn_VectorMathNode`         | `operation` | add (default), subtract, multiply, cross |
//! | `fn_CombineVectorNode`      |             |                                          |
//! | `fn_SeparateVectorNode`     |             |                                          |
//! | `fn_VectorDistanceNode`     |             |                                          |
//! | `fn_AppendToListNode`       | `data_type` | Float (default), Int32, FVec3            |
//! | `fn_ListLengthNode`         | `data_type` | as above                                 |
//! | `fn_GetListElementNode`     | `data_type` | as above                                 |
//! | `fn_CombineListsNode`       | `data_type` | as above                                 |
//! | `fn_ObjectTransformsNode`   | `object`    | object name (default empty)              |

use crate::error::CompileError;
use crate::graph::Node;
use nodefn_core::builtins::{self, ListOp, MathOp, ObjectSource, VectorOp};
use nodefn_core::{SharedFunction, TypeKind, TypeRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// What a node builder may use besides the node itself
pub struct BuildContext<'a> {
    pub types: &'a TypeRegistry,
    pub objects: &'a Arc<dyn ObjectSource>,
}

pub type NodeBuilder = fn(&Node, &BuildContext<'_>) -> Result<SharedFunction, CompileError>;

#[derive(Clone)]
pub struct NodeRegistry {
    builders: HashMap<String, NodeBuilder>,
    aliases: HashMap<String, String>,
}

impl NodeRegistry {
    /// Registry without any node kinds
    pub fn empty() -> Self {
        NodeRegistry {
            builders: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registry with the built-in node kinds
    pub fn new() -> Self {
        let mut registry = NodeRegistry::empty();
        registry.register("fn_FloatMathNode", float_math_node);
        registry.register("fn_IntMathNode", int_math_node);
        registry.register("fn_VectorMathNode", vector_math_node);
        registry.register("fn_CombineVectorNode", |_, ctx| {
            Ok(builtins::combine_vector(ctx.types))
        });
        registry.register("fn_SeparateVectorNode", |_, ctx| {
            Ok(builtins::separate_vector(ctx.types))
        });
        registry.register("fn_VectorDistanceNode", |_, ctx| {
            Ok(builtins::vector_distance(ctx.types))
        });
        registry.register("fn_AppendToListNode", |node, ctx| {
            list_node(node, ctx, ListOp::Append)
        });
        registry.register("fn_ListLengthNode", |node, ctx| {
            list_node(node, ctx, ListOp::Length)
        });
        registry.register("fn_GetListElementNode", |node, ctx| {
            list_node(node, ctx, ListOp::GetElement)
        });
        registry.register("fn_CombineListsNode", |node, ctx| {
            list_node(node, ctx, ListOp::Combine)
        });
        registry.register("fn_ObjectTransformsNode", object_transforms_node);
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, builder: NodeBuilder) {
        self.builders.insert(kind.into(), builder);
    }

    /// Make `alias` resolve to `kind`; the target is looked up when used
    pub fn alias(&mut self, alias: impl Into<String>, kind: impl Into<String>) {
        self.aliases.insert(alias.into(), kind.into());
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.resolve(kind).is_some()
    }

    fn resolve(&self, kind: &str) -> Option<NodeBuilder> {
        self.builders.get(kind).copied().or_else(|| {
            self.aliases
                .get(kind)
                .and_then(|target| self.builders.get(target).copied())
        })
    }

    /// Registered kind ids, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the function implementing `node`
    pub fn build(&self, node: &Node, ctx: &BuildContext<'_>) -> Result<SharedFunction, CompileError> {
        let builder = self
            .resolve(&node.kind)
            .ok_or_else(|| CompileError::UnknownNodeKind {
                node: node.name.clone(),
                kind: node.kind.clone(),
            })?;
        builder(node, ctx)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        NodeRegistry::new()
    }
}

/// Parse a property, falling back to `default` when it is absent
fn property<T>(
    node: &Node,
    key: &str,
    default: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, CompileError> {
    let value = node.property(key).unwrap_or(default);
    parse(value).ok_or_else(|| CompileError::InvalidProperty {
        node: node.name.clone(),
        property: key.to_string(),
        value: value.to_string(),
    })
}

fn float_math_node(node: &Node, ctx: &BuildContext<'_>) -> Result<SharedFunction, CompileError> {
    let op = property(node, "operation", "add", MathOp::from_name)?;
    Ok(builtins::float_math(ctx.types, op))
}

fn int_math_node(node: &Node, ctx: &BuildContext<'_>) -> Result<SharedFunction, CompileError> {
    let op = property(node, "operation", "add", MathOp::from_name)?;
    Ok(builtins::int_math(ctx.types, op))
}

fn vector_math_node(node: &Node, ctx: &BuildContext<'_>) -> Result<SharedFunction, CompileError> {
    let op = property(node, "operation", "add", VectorOp::from_name)?;
    Ok(builtins::vector_math(ctx.types, op))
}

fn list_node(node: &Node, ctx: &BuildContext<'_>, op: ListOp) -> Result<SharedFunction, CompileError> {
    let element = property(node, "data_type", "Float", |name| {
        TypeKind::from_name(name).filter(|kind| !kind.is_list())
    })?;
    builtins::list_function(ctx.types, op, element).ok_or_else(|| CompileError::InvalidProperty {
        node: node.name.clone(),
        property: "data_type".to_string(),
        value: element.to_string(),
    })
}

fn object_transforms_node(
    node: &Node,
    ctx: &BuildContext<'_>,
) -> Result<SharedFunction, CompileError> {
    let object = node.property("object").unwrap_or("");
    Ok(builtins::object_transforms(ctx.types, object, Arc::clone(ctx.objects)))
}
