//! Lowering a graph to a flat list of IR chunks.
//!
//! [`IrEmitter`] is what a node sees while compiling. [`Translator`] implements it on top of a
//! history built beforehand, so each map read knows whether an upstream write reaches it and, if
//! not, how its default is supplied.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use sparkfx_api_core::{DefaultMode, QualifiedName, TypeDef, Value};
use thiserror::Error;

use crate::config::TranslatorConfig;
use crate::error::GraphError;
use crate::graph::{Graph, GraphNode};
use crate::history::{build_histories, ParameterMapHistories};
use crate::nodes::{MapGetNode, MapInputNode, MapSetNode};
use crate::schema::TypeTranslator;
use crate::topo::topo_order;
use crate::types::{NodeId, Port, PortId};


/// Index of a chunk in [`CompiledGraph::chunks`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CompiledRef(pub usize);

/// How a map read is satisfied when no earlier write reaches it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadFallback {
    /// Written upstream, or owned by the engine; the map always has it.
    FromMap,
    Literal { value: Value },
    Expression { value: CompiledRef },
    Binding { source: QualifiedName },
    /// Reading before a write is an error at runtime.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapRead {
    pub name: QualifiedName,
    pub ty: TypeDef,
    pub fallback: ReadFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IrChunk {
    MapSource {
        node: NodeId,
    },
    Literal {
        value: Value,
    },
    MapSet {
        node: NodeId,
        source: CompiledRef,
        writes: Vec<(QualifiedName, CompiledRef)>,
    },
    MapGet {
        node: NodeId,
        source: CompiledRef,
        reads: Vec<MapRead>,
    },
    /// One value produced by a preceding `MapGet`.
    MapGetOutput {
        get: CompiledRef,
        index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{node}: {message}")]
pub struct CompileError {
    pub message: String,
    pub node: NodeId,
    pub port: Option<PortId>,
}

/// What a node may ask of the compiler while lowering itself.
pub trait IrEmitter {
    /// Compiled value feeding an input port, or `None` when it cannot be compiled.
    fn compile_port(&mut self, port: &Port) -> Option<CompiledRef>;

    /// Record an error against `node` (and `port`). Compilation carries on.
    fn error(&mut self, message: &str, node: &NodeId, port: Option<PortId>);

    /// Emit one map-get instruction filling `outputs`, one slot per value output.
    fn parameter_map_get(
        &mut self,
        node: &MapGetNode,
        inputs: &[Option<CompiledRef>],
        outputs: &mut [Option<CompiledRef>],
    );
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompiledGraph {
    pub chunks: Vec<IrChunk>,
    pub errors: Vec<CompileError>,
    /// Output port -> chunk producing its value.
    pub port_refs: HashMap<PortId, CompiledRef>,
    pub histories: ParameterMapHistories,
}

impl CompiledGraph {
    pub fn chunk(&self, r: CompiledRef) -> Option<&IrChunk> {
        self.chunks.get(r.0)
    }

    pub fn port_chunk(&self, port: PortId) -> Option<&IrChunk> {
        self.port_refs.get(&port).and_then(|r| self.chunk(*r))
    }

    /// The map-get instruction emitted for `node`, if any.
    pub fn map_get(&self, node: &str) -> Option<&IrChunk> {
        self.chunks
            .iter()
            .find(|c| matches!(c, IrChunk::MapGet { node: n, .. } if n == node))
    }
}

pub struct Translator<'g> {
    graph: &'g Graph,
    config: TranslatorConfig,
    out: CompiledGraph,
}

impl<'g> Translator<'g> {
    pub fn new(graph: &'g Graph, config: TranslatorConfig) -> Self {
        Translator {
            graph,
            config,
            out: CompiledGraph::default(),
        }
    }

    pub fn compile(mut self) -> Result<CompiledGraph, GraphError> {
        self.out.histories = build_histories(self.graph, self.config.history)?;
        let graph = self.graph;
        for id in topo_order(graph)? {
            match graph.node(&id) {
                Some(GraphNode::Input(node)) => self.compile_input(node),
                Some(GraphNode::Set(node)) => self.compile_set(node),
                Some(GraphNode::Get(node)) => self.compile_get(node),
                None => {}
            }
        }
        if !self.out.errors.is_empty() {
            log::warn!("compiled with {} errors", self.out.errors.len());
        }
        Ok(self.out)
    }

    fn push(&mut self, chunk: IrChunk) -> CompiledRef {
        self.out.chunks.push(chunk);
        CompiledRef(self.out.chunks.len() - 1)
    }

    fn literal(&mut self, ty: &TypeDef, text: Option<&str>) -> Option<CompiledRef> {
        let value = text
            .and_then(|text| Value::parse_default_text(ty, text))
            .or_else(|| ty.zero_value())?;
        Some(self.push(IrChunk::Literal { value }))
    }

    fn skipped(&self, enabled: bool) -> bool {
        !enabled && self.config.history.ignore_disabled
    }

    fn compile_input(&mut self, node: &MapInputNode) {
        let Some(map) = node.map_port_id() else {
            return;
        };
        let r = self.push(IrChunk::MapSource {
            node: node.id.clone(),
        });
        self.out.port_refs.insert(map, r);
    }

    fn compile_set(&mut self, node: &MapSetNode) {
        let (Some(source), Some(dest)) = (node.source_port(), node.dest_port()) else {
            return;
        };
        if !source.is_linked() {
            return;
        }
        let Some(source_ref) = self.compile_port(source) else {
            self.error("Error compiling input for param map set node.", &node.id, Some(source.id));
            return;
        };
        // Disabled: the map flows through untouched.
        if self.skipped(node.enabled) {
            self.out.port_refs.insert(dest.id, source_ref);
            return;
        }

        let mut writes = Vec::new();
        for input in node.value_inputs() {
            let Ok(name) = QualifiedName::parse(&input.name) else {
                continue;
            };
            match self.compile_port(input) {
                Some(value) => writes.push((name, value)),
                None => self.error(
                    &format!("Cannot compile the value written to {name}."),
                    &node.id,
                    Some(input.id),
                ),
            }
        }
        let r = self.push(IrChunk::MapSet {
            node: node.id.clone(),
            source: source_ref,
            writes,
        });
        self.out.port_refs.insert(dest.id, r);
    }

    fn compile_get(&mut self, node: &MapGetNode) {
        if self.skipped(node.enabled) {
            return;
        }
        let graph = self.graph;
        let outputs = node.compile(self, &graph.schema);
        for (port, slot) in node.value_outputs().zip(outputs) {
            if let Some(r) = slot {
                self.out.port_refs.insert(port.id, r);
            }
        }
    }

    /// Fallback for a read of `output` whose default pin is `default_pin`.
    fn resolve_fallback(
        &mut self,
        node: &MapGetNode,
        output: &Port,
        name: &QualifiedName,
        default_pin: Option<&Port>,
    ) -> ReadFallback {
        let graph = self.graph;
        let used_default = self
            .out
            .histories
            .read_for_port(output.id)
            .map(|(_, read)| read.used_default)
            .unwrap_or(true);
        if !used_default {
            return ReadFallback::FromMap;
        }
        if let Some(variable) = graph.schema.port_to_variable(output, false) {
            if graph.schema.is_engine_parameter(&variable) {
                return ReadFallback::FromMap;
            }
        }

        let mode = graph.registry.get_default_mode(name).unwrap_or_default();
        match mode {
            DefaultMode::Value => {
                let stored = graph
                    .registry
                    .get_variable(name)
                    .and_then(|v| v.value.clone())
                    .filter(|v| v.matches_type(&output.ty));
                let value = stored.or_else(|| {
                    default_pin
                        .and_then(|p| p.default_value.as_deref())
                        .and_then(|text| Value::parse_default_text(&output.ty, text))
                });
                match value.or_else(|| output.ty.zero_value()) {
                    Some(value) => ReadFallback::Literal { value },
                    None => ReadFallback::FromMap,
                }
            }
            DefaultMode::Custom => {
                let Some(default_pin) = default_pin else {
                    return ReadFallback::FromMap;
                };
                if default_pin.is_linked() {
                    match self.compile_port(default_pin) {
                        Some(value) => ReadFallback::Expression { value },
                        None => {
                            self.error(
                                &format!("Cannot compile the default value of {name}."),
                                &node.id,
                                Some(default_pin.id),
                            );
                            ReadFallback::Fail
                        }
                    }
                } else {
                    default_pin
                        .default_value
                        .as_deref()
                        .and_then(|text| Value::parse_default_text(&output.ty, text))
                        .or_else(|| output.ty.zero_value())
                        .map(|value| ReadFallback::Literal { value })
                        .unwrap_or(ReadFallback::FromMap)
                }
            }
            DefaultMode::Binding => {
                match graph.registry.get_metadata(name).and_then(|m| m.binding.clone()) {
                    Some(source) => ReadFallback::Binding { source },
                    None => {
                        self.error(
                            &format!("{name} is bound but names no source variable."),
                            &node.id,
                            Some(output.id),
                        );
                        ReadFallback::Fail
                    }
                }
            }
            DefaultMode::FailIfPreviouslyNotSet => {
                if self.config.fail_on_unset_reads {
                    self.error(
                        &format!("{name} is read before it was set."),
                        &node.id,
                        Some(output.id),
                    );
                }
                ReadFallback::Fail
            }
        }
    }
}

impl IrEmitter for Translator<'_> {
    fn compile_port(&mut self, port: &Port) -> Option<CompiledRef> {
        if let Some(upstream) = port.linked_to.first() {
            return self.out.port_refs.get(upstream).copied();
        }
        if port.is_output() || port.ty.is_parameter_map() || port.ty.is_data_interface() {
            return None;
        }
        self.literal(&port.ty, port.default_value.as_deref())
    }

    fn error(&mut self, message: &str, node: &NodeId, port: Option<PortId>) {
        log::debug!("compile error on {node}: {message}");
        self.out.errors.push(CompileError {
            message: message.to_string(),
            node: node.clone(),
            port,
        });
    }

    fn parameter_map_get(
        &mut self,
        node: &MapGetNode,
        inputs: &[Option<CompiledRef>],
        outputs: &mut [Option<CompiledRef>],
    ) {
        let Some(source) = inputs.first().copied().flatten() else {
            return;
        };
        let mut reads = Vec::with_capacity(outputs.len());
        // (output slot, read index)
        let mut produced = Vec::with_capacity(outputs.len());
        for (slot, output) in node.value_outputs().enumerate() {
            let Ok(name) = QualifiedName::parse(&output.name) else {
                self.error("Output has an invalid name.", &node.id, Some(output.id));
                continue;
            };
            let default_pin = node.default_pin(output.id);
            let fallback = self.resolve_fallback(node, output, &name, default_pin);
            produced.push((slot, reads.len()));
            reads.push(MapRead {
                name,
                ty: output.ty.clone(),
                fallback,
            });
        }
        let get = self.push(IrChunk::MapGet {
            node: node.id.clone(),
            source,
            reads,
        });
        for (slot, index) in produced {
            if let Some(out) = outputs.get_mut(slot) {
                *out = Some(self.push(IrChunk::MapGetOutput { get, index }));
            }
        }
    }
}

/// Build the histories of `graph` and lower it.
pub fn compile_graph(graph: &Graph, config: TranslatorConfig) -> Result<CompiledGraph, GraphError> {
    Translator::new(graph, config).compile()
}
