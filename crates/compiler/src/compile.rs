//! Lowering a node graph to a function
//!
//! 1. Check node names and find the interface nodes
//! 2. Resolve every other node to a function through the node registry
//! 3. Validate links against node sockets
//! 4. Reject cycles and order the nodes the output depends on
//! 5. Build the execution plan and mark last uses
//! 6. Wrap the plan in a call body (plus a dependency body if needed)

use crate::body::{GraphCallBody, GraphDependenciesBody};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::graph::{INPUT_NODE, Node, NodeGraph, OUTPUT_NODE, SocketDecl, SocketRef};
use crate::node_kinds::{BuildContext, NodeRegistry};
use crate::order::NodeDependencies;
use crate::plan::{Consumption, ExecutionPlan, Source, Step};
use nodefn_core::builtins::ObjectSource;
use nodefn_core::{Function, Parameter, SharedFunction, Signature, Type, TypeRegistry, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_FUNCTION_NAME: &str = "Node Graph";

/// Compiles node graphs against one type registry
pub struct GraphCompiler<'a> {
    types: &'a TypeRegistry,
    config: CompilerConfig,
    nodes: NodeRegistry,
    objects: Arc<dyn ObjectSource>,
}

impl<'a> GraphCompiler<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        GraphCompiler::with_config(types, CompilerConfig::default())
    }

    /// Compiler using the config's aliases and object table
    pub fn with_config(types: &'a TypeRegistry, config: CompilerConfig) -> Self {
        let mut nodes = NodeRegistry::new();
        for (alias, kind) in &config.aliases {
            nodes.alias(alias.as_str(), kind.as_str());
        }
        let objects: Arc<dyn ObjectSource> = Arc::new(config.static_objects());
        GraphCompiler {
            types,
            config,
            nodes,
            objects,
        }
    }

    /// Replace the object source built from the config
    pub fn with_objects(mut self, objects: Arc<dyn ObjectSource>) -> Self {
        self.objects = objects;
        self
    }

    /// Replace the node registry; config aliases are re-applied
    pub fn with_node_registry(mut self, mut nodes: NodeRegistry) -> Self {
        for (alias, kind) in &self.config.aliases {
            nodes.alias(alias.as_str(), kind.as_str());
        }
        self.nodes = nodes;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    /// Compile, or `None` with the reason logged
    pub fn compile(&self, graph: &NodeGraph) -> Option<SharedFunction> {
        match self.try_compile(graph) {
            Ok(function) => Some(function),
            Err(err) => {
                warn!(graph = %graph.name, error = %err, "node graph compilation failed");
                None
            }
        }
    }

    /// Compile and require the given signature types
    pub fn compile_with_signature(
        &self,
        graph: &NodeGraph,
        inputs: &[Type],
        outputs: &[Type],
    ) -> Option<SharedFunction> {
        match self.try_compile_with_signature(graph, inputs, outputs) {
            Ok(function) => Some(function),
            Err(err) => {
                warn!(graph = %graph.name, error = %err, "node graph compilation failed");
                None
            }
        }
    }

    pub fn try_compile_with_signature(
        &self,
        graph: &NodeGraph,
        inputs: &[Type],
        outputs: &[Type],
    ) -> Result<SharedFunction, CompileError> {
        let function = self.try_compile(graph)?;
        if function.signature().has_types(inputs, outputs) {
            Ok(function)
        } else {
            Err(CompileError::SignatureMismatch {
                found: function.signature().to_string(),
            })
        }
    }

    pub fn try_compile(&self, graph: &NodeGraph) -> Result<SharedFunction, CompileError> {
        debug!(graph = %graph.name, nodes = graph.nodes.len(), links = graph.links.len(), "compiling node graph");

        let index = index_nodes(graph)?;
        let (input_node, output_node) = find_interface_nodes(graph)?;
        let shapes = self.resolve_nodes(graph)?;
        let incoming = link_inputs(graph, &index, &shapes)?;

        let deps = NodeDependencies::build(
            graph.nodes.len(),
            incoming
                .iter()
                .map(|(&(consumer, _), from)| (from.node, consumer)),
        );
        if let Some(cycle) = deps.cycles().first() {
            return Err(CompileError::Cycle(
                cycle.iter().map(|&n| graph.nodes[n].name.clone()).collect(),
            ));
        }

        let order = deps.evaluation_order(output_node);
        if !self.config.allow_unused_nodes {
            let used: HashSet<usize> = order.iter().copied().collect();
            if let Some(unused) = (0..graph.nodes.len())
                .find(|n| !used.contains(n) && Some(*n) != input_node)
            {
                return Err(CompileError::UnusedNode(graph.nodes[unused].name.clone()));
            }
        }

        let mut plan = ExecutionPlan::default();
        let mut step_of: HashMap<usize, usize> = HashMap::new();
        for &node in &order {
            let Some(function) = &shapes[node].function else {
                continue;
            };
            let inputs = self.consumptions(graph, node, &shapes, &incoming, input_node, &step_of)?;
            step_of.insert(node, plan.steps.len());
            plan.steps.push(Step {
                node: graph.nodes[node].name.clone(),
                function: Arc::clone(function),
                inputs,
            });
        }
        plan.outputs = self.consumptions(graph, output_node, &shapes, &incoming, input_node, &step_of)?;
        plan.mark_last_uses();
        debug!(graph = %graph.name, steps = plan.steps.len(), "execution plan:\n{}", plan);

        let inputs = input_node
            .map(|n| parameters(&shapes[n].outputs))
            .unwrap_or_default();
        let signature = Signature::new(inputs, parameters(&shapes[output_node].inputs));
        let name = if graph.name.is_empty() {
            DEFAULT_FUNCTION_NAME.to_string()
        } else {
            graph.name.clone()
        };

        let dependencies = GraphDependenciesBody::for_plan(&plan);
        let mut builder = Function::builder(name, signature).call_body(GraphCallBody::new(plan));
        if let Some(dependencies) = dependencies {
            builder = builder.dependencies_body(dependencies);
        }
        Ok(builder.build())
    }

    /// Sockets of every node: declared for interface nodes, from the
    /// implementing function for the rest
    fn resolve_nodes(&self, graph: &NodeGraph) -> Result<Vec<NodeShape>, CompileError> {
        let ctx = BuildContext {
            types: self.types,
            objects: &self.objects,
        };
        graph
            .nodes
            .iter()
            .map(|node| match node.kind.as_str() {
                INPUT_NODE => Ok(NodeShape {
                    inputs: Vec::new(),
                    outputs: self.declared_sockets(node)?,
                    function: None,
                }),
                OUTPUT_NODE => Ok(NodeShape {
                    inputs: self.declared_sockets(node)?,
                    outputs: Vec::new(),
                    function: None,
                }),
                _ => {
                    let function = self.nodes.build(node, &ctx)?;
                    let signature = function.signature();
                    Ok(NodeShape {
                        inputs: sockets(signature.inputs()),
                        outputs: sockets(signature.outputs()),
                        function: Some(function),
                    })
                }
            })
            .collect()
    }

    fn declared_sockets(&self, node: &Node) -> Result<Vec<(String, Type)>, CompileError> {
        let mut seen = HashSet::new();
        node.sockets
            .iter()
            .map(|SocketDecl { name, data_type }| {
                if !seen.insert(name.as_str()) {
                    return Err(CompileError::DuplicateSocket {
                        node: node.name.clone(),
                        socket: name.clone(),
                    });
                }
                Ok((name.clone(), self.types.get(*data_type)))
            })
            .collect()
    }

    /// Where each input socket of `node` gets its value
    fn consumptions(
        &self,
        graph: &NodeGraph,
        node: usize,
        shapes: &[NodeShape],
        incoming: &HashMap<(usize, usize), LinkSource>,
        input_node: Option<usize>,
        step_of: &HashMap<usize, usize>,
    ) -> Result<Vec<Consumption>, CompileError> {
        let decl = &graph.nodes[node];
        shapes[node]
            .inputs
            .iter()
            .enumerate()
            .map(|(socket, (name, ty))| {
                let source = match incoming.get(&(node, socket)) {
                    Some(from) if Some(from.node) == input_node => Source::FunctionInput(from.output),
                    Some(from) => Source::NodeOutput {
                        // producers come earlier in evaluation order
                        step: step_of[&from.node],
                        output: from.output,
                    },
                    None => match decl.defaults.get(name) {
                        Some(literal) => Source::Constant(literal.to_value(ty.kind()).ok_or_else(
                            || CompileError::InvalidDefault {
                                node: decl.name.clone(),
                                socket: name.clone(),
                                expected: ty.kind(),
                            },
                        )?),
                        None => Source::Constant(Value::default_for(ty.kind())),
                    },
                };
                Ok(Consumption::new(source))
            })
            .collect()
    }
}

struct NodeShape {
    inputs: Vec<(String, Type)>,
    outputs: Vec<(String, Type)>,
    function: Option<SharedFunction>,
}

#[derive(Debug, Clone, Copy)]
struct LinkSource {
    node: usize,
    output: usize,
}

fn sockets(params: &[Parameter]) -> Vec<(String, Type)> {
    params
        .iter()
        .map(|p| (p.name.clone(), p.ty.clone()))
        .collect()
}

fn parameters(sockets: &[(String, Type)]) -> Vec<Parameter> {
    sockets
        .iter()
        .map(|(name, ty)| Parameter::new(name.as_str(), ty))
        .collect()
}

fn index_nodes(graph: &NodeGraph) -> Result<HashMap<&str, usize>, CompileError> {
    let mut index = HashMap::new();
    for (i, node) in graph.nodes.iter().enumerate() {
        if index.insert(node.name.as_str(), i).is_some() {
            return Err(CompileError::DuplicateNode(node.name.clone()));
        }
    }
    Ok(index)
}

fn find_interface_nodes(graph: &NodeGraph) -> Result<(Option<usize>, usize), CompileError> {
    let find = |kind: &str| -> Result<Option<usize>, CompileError> {
        let mut found = graph
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == kind)
            .map(|(i, _)| i);
        let first = found.next();
        if found.next().is_some() {
            return Err(CompileError::MultipleInterfaceNodes(kind.to_string()));
        }
        Ok(first)
    };
    let input = find(INPUT_NODE)?;
    let output = find(OUTPUT_NODE)?.ok_or(CompileError::MissingOutputNode)?;
    Ok((input, output))
}

/// Map `(consumer node, input socket)` to the output feeding it
fn link_inputs(
    graph: &NodeGraph,
    index: &HashMap<&str, usize>,
    shapes: &[NodeShape],
) -> Result<HashMap<(usize, usize), LinkSource>, CompileError> {
    let locate = |socket: &SocketRef, outputs: bool| -> Result<(usize, usize, Type), CompileError> {
        let node = *index
            .get(socket.node.as_str())
            .ok_or_else(|| CompileError::UnknownNode(socket.node.clone()))?;
        let candidates = if outputs {
            &shapes[node].outputs
        } else {
            &shapes[node].inputs
        };
        let position = candidates
            .iter()
            .position(|(name, _)| *name == socket.socket)
            .ok_or_else(|| CompileError::UnknownSocket {
                node: socket.node.clone(),
                socket: socket.socket.clone(),
            })?;
        Ok((node, position, candidates[position].1.clone()))
    };

    let mut incoming = HashMap::new();
    for link in &graph.links {
        let (from_node, from_socket, from_type) = locate(&link.from, true)?;
        let (to_node, to_socket, to_type) = locate(&link.to, false)?;
        if from_type != to_type {
            return Err(CompileError::LinkTypeMismatch {
                from: link.from.to_string(),
                to: link.to.to_string(),
                from_type: from_type.kind(),
                to_type: to_type.kind(),
            });
        }
        let source = LinkSource {
            node: from_node,
            output: from_socket,
        };
        if incoming.insert((to_node, to_socket), source).is_some() {
            return Err(CompileError::MultipleLinks {
                node: link.to.node.clone(),
                socket: link.to.socket.clone(),
            });
        }
    }

    for (i, node) in graph.nodes.iter().enumerate() {
        if let Some(socket) = node
            .defaults
            .keys()
            .find(|name| !shapes[i].inputs.iter().any(|(input, _)| input == *name))
        {
            return Err(CompileError::UnknownSocket {
                node: node.name.clone(),
                socket: socket.clone(),
            });
        }
    }
    Ok(incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Literal;
    use nodefn_core::{SharedList, TypeKind};

    fn add_graph() -> NodeGraph {
        NodeGraph::new("add")
            .with_node(
                Node::new("In", INPUT_NODE)
                    .with_socket("a", TypeKind::Float)
                    .with_socket("b", TypeKind::Float),
            )
            .with_node(Node::new("Add", "fn_FloatMathNode"))
            .with_node(Node::new("Out", OUTPUT_NODE).with_socket("result", TypeKind::Float))
            .with_link(("In", "a"), ("Add", "a"))
            .with_link(("In", "b"), ("Add", "b"))
            .with_link(("Add", "result"), ("Out", "result"))
    }

    #[test]
    fn test_compile_add() {
        let types = TypeRegistry::new();
        let function = GraphCompiler::new(&types).try_compile(&add_graph()).unwrap();
        assert_eq!(function.name(), "add");
        assert_eq!(
            function.signature().to_string(),
            "(a: Float, b: Float) -> (result: Float)"
        );

        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        fn_in.set(0, 3.0f32).unwrap();
        fn_in.set(1, 4.0f32).unwrap();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        assert_eq!(fn_out.get::<f32>(0).unwrap(), 7.0);
    }

    #[test]
    fn test_long_node_chain() {
        // x -> +1 -> +1 -> ... -> Out
        const N: usize = 100_000;
        let mut graph = NodeGraph::new("chain")
            .with_node(Node::new("In", INPUT_NODE).with_socket("x", TypeKind::Float))
            .with_node(Node::new("Out", OUTPUT_NODE).with_socket("result", TypeKind::Float));
        let names: Vec<String> = (0..N).map(|i| format!("Inc{}", i)).collect();
        for name in &names {
            graph = graph.with_node(
                Node::new(name.as_str(), "fn_FloatMathNode").with_default("b", Literal::Number(1.0)),
            );
        }
        graph = graph.with_link(("In", "x"), (names[0].as_str(), "a"));
        for pair in names.windows(2) {
            graph = graph.with_link((pair[0].as_str(), "result"), (pair[1].as_str(), "a"));
        }
        graph = graph.with_link((names[N - 1].as_str(), "result"), ("Out", "result"));

        let types = TypeRegistry::new();
        let function = GraphCompiler::new(&types).try_compile(&graph).unwrap();
        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        fn_in.set(0, 0.5f32).unwrap();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        assert_eq!(fn_out.get::<f32>(0).unwrap(), N as f32 + 0.5);
    }

    #[test]
    fn test_defaults_and_fallback_values() {
        let types = TypeRegistry::new();
        let graph = NodeGraph::new("")
            .with_node(
                Node::new("Scale", "fn_FloatMathNode")
                    .with_property("operation", "multiply")
                    .with_default("a", Literal::Number(2.5)),
            )
            .with_node(Node::new("Out", OUTPUT_NODE).with_socket("value", TypeKind::Float))
            .with_node(
                Node::new("Idle", "fn_IntMathNode").with_default("a", Literal::Number(1.0)),
            )
            .with_link(("Scale", "result"), ("Out", "value"));

        let function = GraphCompiler::new(&types).try_compile(&graph).unwrap();
        assert_eq!(function.name(), "Node Graph");
        assert!(function.signature().inputs().is_empty());

        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        // b was never given: 2.5 * 0
        assert_eq!(fn_out.get::<f32>(0).unwrap(), 0.0);
    }

    #[test]
    fn test_unlinked_output_uses_default() {
        let types = TypeRegistry::new();
        let graph = NodeGraph::new("constant").with_node(
            Node::new("Out", OUTPUT_NODE)
                .with_socket("points", TypeKind::FVec3List)
                .with_default("points", Literal::Array(vec![Literal::vector(1.0, 0.0, 0.0)])),
        );
        let function = GraphCompiler::new(&types).try_compile(&graph).unwrap();
        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        let points = fn_out.get::<SharedList<nodefn_core::Vector>>(0).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_structural_errors() {
        let types = TypeRegistry::new();
        let compiler = GraphCompiler::new(&types);

        let missing_output = NodeGraph::new("g").with_node(Node::new("Add", "fn_FloatMathNode"));
        assert_eq!(
            compiler.try_compile(&missing_output).unwrap_err(),
            CompileError::MissingOutputNode
        );

        let duplicate = add_graph().with_node(Node::new("Add", "fn_IntMathNode"));
        assert_eq!(
            compiler.try_compile(&duplicate).unwrap_err(),
            CompileError::DuplicateNode("Add".to_string())
        );

        let two_outputs = add_graph().with_node(Node::new("Out2", OUTPUT_NODE));
        assert_eq!(
            compiler.try_compile(&two_outputs).unwrap_err(),
            CompileError::MultipleInterfaceNodes(OUTPUT_NODE.to_string())
        );

        let dangling = add_graph().with_link(("Nowhere", "x"), ("Out", "result"));
        assert_eq!(
            compiler.try_compile(&dangling).unwrap_err(),
            CompileError::UnknownNode("Nowhere".to_string())
        );

        let bad_socket = add_graph().with_link(("Add", "sum"), ("Out", "result"));
        assert!(matches!(
            compiler.try_compile(&bad_socket),
            Err(CompileError::UnknownSocket { .. })
        ));

        let twice = add_graph().with_link(("In", "a"), ("Out", "result"));
        assert_eq!(
            compiler.try_compile(&twice).unwrap_err(),
            CompileError::MultipleLinks {
                node: "Out".to_string(),
                socket: "result".to_string(),
            }
        );
    }

    #[test]
    fn test_link_type_mismatch() {
        let types = TypeRegistry::new();
        let graph = NodeGraph::new("g")
            .with_node(Node::new("In", INPUT_NODE).with_socket("n", TypeKind::Int32))
            .with_node(Node::new("Add", "fn_FloatMathNode"))
            .with_node(Node::new("Out", OUTPUT_NODE).with_socket("result", TypeKind::Float))
            .with_link(("In", "n"), ("Add", "a"))
            .with_link(("Add", "result"), ("Out", "result"));
        assert_eq!(
            GraphCompiler::new(&types).try_compile(&graph).unwrap_err(),
            CompileError::LinkTypeMismatch {
                from: "In.n".to_string(),
                to: "Add.a".to_string(),
                from_type: TypeKind::Int32,
                to_type: TypeKind::Float,
            }
        );
    }

    #[test]
    fn test_invalid_default() {
        let types = TypeRegistry::new();
        let compiler = GraphCompiler::new(&types);

        // unused nodes are not planned, so their defaults are not coerced
        let graph = add_graph()
            .with_node(Node::new("Len", "fn_ListLengthNode").with_default("list", Literal::Number(1.0)));
        assert!(compiler.try_compile(&graph).is_ok());

        let graph = NodeGraph::new("g").with_node(
            Node::new("Out", OUTPUT_NODE)
                .with_socket("result", TypeKind::Float)
                .with_default("result", Literal::vector(1.0, 2.0, 3.0)),
        );
        assert_eq!(
            compiler.try_compile(&graph).unwrap_err(),
            CompileError::InvalidDefault {
                node: "Out".to_string(),
                socket: "result".to_string(),
                expected: TypeKind::Float,
            }
        );
    }

    #[test]
    fn test_default_for_unknown_socket() {
        let types = TypeRegistry::new();
        let graph = add_graph().with_node(
            Node::new("Extra", "fn_FloatMathNode").with_default("c", Literal::Number(1.0)),
        );
        assert_eq!(
            GraphCompiler::new(&types).try_compile(&graph).unwrap_err(),
            CompileError::UnknownSocket {
                node: "Extra".to_string(),
                socket: "c".to_string(),
            }
        );
    }

    #[test]
    fn test_unused_nodes_by_config() {
        let types = TypeRegistry::new();
        let graph = add_graph().with_node(Node::new("Idle", "fn_IntMathNode"));
        assert!(GraphCompiler::new(&types).try_compile(&graph).is_ok());

        let strict =
            GraphCompiler::with_config(&types, CompilerConfig::new().with_allow_unused_nodes(false));
        assert_eq!(
            strict.try_compile(&graph).unwrap_err(),
            CompileError::UnusedNode("Idle".to_string())
        );
        // an input node without links is not an unused node
        assert!(strict.try_compile(&add_graph()).is_ok());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let types = TypeRegistry::new();
        let graph = NodeGraph::new("loop")
            .with_node(Node::new("A", "fn_FloatMathNode"))
            .with_node(Node::new("B", "fn_FloatMathNode"))
            .with_node(Node::new("Out", OUTPUT_NODE).with_socket("result", TypeKind::Float))
            .with_link(("A", "result"), ("B", "a"))
            .with_link(("B", "result"), ("A", "a"))
            .with_link(("B", "result"), ("Out", "result"));
        let compiler = GraphCompiler::new(&types);
        assert_eq!(
            compiler.try_compile(&graph).unwrap_err(),
            CompileError::Cycle(vec!["A".to_string(), "B".to_string()])
        );
        assert!(compiler.compile(&graph).is_none());
    }

    #[test]
    fn test_signature_mismatch_is_discarded() {
        let types = TypeRegistry::new();
        let compiler = GraphCompiler::new(&types);
        let float = types.float().clone();
        let int32 = types.int32().clone();

        assert!(
            compiler
                .compile_with_signature(&add_graph(), &[float.clone(), float.clone()], &[float.clone()])
                .is_some()
        );
        assert!(
            compiler
                .compile_with_signature(&add_graph(), &[float.clone(), float.clone()], &[int32.clone()])
                .is_none()
        );
        assert!(matches!(
            compiler.try_compile_with_signature(&add_graph(), &[float], &[int32]),
            Err(CompileError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_config_alias() {
        let types = TypeRegistry::new();
        let mut graph = add_graph();
        graph.nodes[1].kind = "Math".to_string();
        assert!(GraphCompiler::new(&types).compile(&graph).is_none());

        let compiler =
            GraphCompiler::with_config(&types, CompilerConfig::new().with_alias("Math", "fn_FloatMathNode"));
        assert!(compiler.compile(&graph).is_some());
    }
}
