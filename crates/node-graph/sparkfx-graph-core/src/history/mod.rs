//! Parameter-map history.
//!
//! A history traversal walks the graph in dataflow order and records, per map instance, which
//! node wrote or read which variable and in what order. Nodes talk to the traversal only through
//! [`ParameterMapHistorySink`]; [`ParameterMapHistoryBuilder`] is the implementation used by the
//! translator.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use sparkfx_api_core::{QualifiedName, TypeDef};

use crate::config::HistoryConfig;
use crate::error::GraphError;
use crate::graph::{Graph, GraphNode};
use crate::topo::topo_order;
use crate::types::{NodeId, Port, PortId};

#[cfg(test)]
mod tests;

/// Callbacks a node makes while taking part in a history traversal.
pub trait ParameterMapHistorySink {
    /// Whether disabled nodes forward their map untouched.
    fn ignore_disabled(&self) -> bool;

    /// Make sure whatever feeds `port` has been visited.
    fn visit_input_port(&mut self, port: &Port, filter_for_compilation: bool);

    /// Map instance the calling node continues from `output`, if one reached it. Call once per
    /// consuming node.
    fn trace_parameter_map_output_port(&mut self, output: PortId) -> Option<usize>;

    /// Open a visitation scope on `instance`. The returned token closes it.
    fn begin_node_visitation(&mut self, instance: usize, node: &NodeId) -> usize;

    fn end_node_visitation(&mut self, instance: usize, token: usize);

    /// Record a read of the variable named by `port`. Returns whether the read falls back to its
    /// default because nothing earlier in `instance` wrote the variable.
    fn handle_variable_read(
        &mut self,
        instance: usize,
        port: &Port,
        mandatory: bool,
        default_pin: Option<&Port>,
        filter_for_compilation: bool,
    ) -> bool;

    /// A disabled node passes `instance` through without reads or writes.
    fn route_parameter_map_around(&mut self, node: &NodeId, instance: Option<usize>);

    /// Start a fresh map instance at `node`.
    fn begin_parameter_map(&mut self, node: &NodeId) -> usize;

    fn register_parameter_map_output(&mut self, output: PortId, instance: usize);

    /// Record a write of the variable named by `port`.
    fn handle_variable_write(&mut self, instance: usize, port: &Port);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableWrite {
    pub name: QualifiedName,
    pub ty: TypeDef,
    pub node: NodeId,
    pub port: PortId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableRead {
    pub name: QualifiedName,
    pub ty: TypeDef,
    pub node: NodeId,
    pub port: PortId,
    pub mandatory: bool,
    pub used_default: bool,
    pub default_pin: Option<PortId>,
}

/// Everything recorded for one map instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterMapHistory {
    pub origin: NodeId,
    /// Instance this one was copied from when a map output fed more than one input.
    #[serde(default)]
    pub forked_from: Option<usize>,
    /// Nodes in the order their visitation scopes opened.
    pub visits: Vec<NodeId>,
    pub writes: Vec<VariableWrite>,
    pub reads: Vec<VariableRead>,
    pub routed_around: Vec<NodeId>,
}

impl ParameterMapHistory {
    pub fn was_written(&self, name: &QualifiedName) -> bool {
        self.writes.iter().any(|w| &w.name == name)
    }

    pub fn reads_of<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a VariableRead> + 'a {
        self.reads.iter().filter(move |r| r.node == node)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterMapHistories {
    pub maps: Vec<ParameterMapHistory>,
    /// Parameter-map output port -> map instance it carries.
    pub port_instances: HashMap<PortId, usize>,
}

impl ParameterMapHistories {
    /// The read recorded for a map get output, searching every instance.
    pub fn read_for_port(&self, port: PortId) -> Option<(usize, &VariableRead)> {
        self.maps.iter().enumerate().find_map(|(instance, map)| {
            map.reads
                .iter()
                .find(|r| r.port == port)
                .map(|read| (instance, read))
        })
    }
}

/// Reference [`ParameterMapHistorySink`] over a [`Graph`].
///
/// The first input traced from a map output continues that output's instance. Every further
/// input gets a fork holding only the writes made before the output was registered, so sibling
/// branches never see each other's writes.
pub struct ParameterMapHistoryBuilder<'g> {
    graph: &'g Graph,
    config: HistoryConfig,
    visited: HashSet<NodeId>,
    scopes: Vec<(usize, NodeId)>,
    /// Map output -> write count of its instance when it was registered.
    published_writes: HashMap<PortId, usize>,
    consumed: HashSet<PortId>,
    histories: ParameterMapHistories,
}

impl<'g> ParameterMapHistoryBuilder<'g> {
    pub fn new(graph: &'g Graph, config: HistoryConfig) -> Self {
        ParameterMapHistoryBuilder {
            graph,
            config,
            visited: HashSet::new(),
            scopes: Vec::new(),
            published_writes: HashMap::new(),
            consumed: HashSet::new(),
            histories: ParameterMapHistories::default(),
        }
    }

    /// Visit every node in dataflow order.
    pub fn build(mut self) -> Result<ParameterMapHistories, GraphError> {
        for id in topo_order(self.graph)? {
            self.visit_node(&id);
        }
        Ok(self.histories)
    }

    fn visit_node(&mut self, id: &NodeId) {
        if !self.visited.insert(id.clone()) {
            return;
        }
        let graph = self.graph;
        let filter = self.config.filter_for_compilation;
        match graph.node(id) {
            Some(GraphNode::Input(node)) => node.build_parameter_map_history(self),
            Some(GraphNode::Set(node)) => node.build_parameter_map_history(self, true, filter),
            Some(GraphNode::Get(node)) => node.build_parameter_map_history(self, true, filter),
            None => log::warn!("history: unknown node '{id}'"),
        }
    }

    fn current_node(&self) -> NodeId {
        self.scopes
            .last()
            .map(|(_, node)| node.clone())
            .unwrap_or_default()
    }

    fn map_mut(&mut self, instance: usize) -> Option<&mut ParameterMapHistory> {
        let map = self.histories.maps.get_mut(instance);
        if map.is_none() {
            log::error!("history: map instance {instance} does not exist");
        }
        map
    }
}

impl ParameterMapHistorySink for ParameterMapHistoryBuilder<'_> {
    fn ignore_disabled(&self) -> bool {
        self.config.ignore_disabled
    }

    fn visit_input_port(&mut self, port: &Port, filter_for_compilation: bool) {
        if filter_for_compilation && (port.flags.hidden || port.flags.default_value_ignored) {
            return;
        }
        let graph = self.graph;
        for upstream in &port.linked_to {
            if let Some(node) = graph.node_of_port(*upstream) {
                self.visit_node(node.id());
            }
        }
    }

    fn trace_parameter_map_output_port(&mut self, output: PortId) -> Option<usize> {
        let instance = self.histories.port_instances.get(&output).copied()?;
        if self.consumed.insert(output) {
            return Some(instance);
        }
        let source = self.histories.maps.get(instance)?;
        let published = self.published_writes.get(&output).copied().unwrap_or(0);
        let fork = ParameterMapHistory {
            origin: source.origin.clone(),
            forked_from: Some(instance),
            writes: source.writes.iter().take(published).cloned().collect(),
            ..ParameterMapHistory::default()
        };
        self.histories.maps.push(fork);
        let forked = self.histories.maps.len() - 1;
        log::debug!("history: output {output} fans out, forked instance {instance} as {forked}");
        Some(forked)
    }

    fn begin_node_visitation(&mut self, instance: usize, node: &NodeId) -> usize {
        if let Some(map) = self.map_mut(instance) {
            map.visits.push(node.clone());
        }
        self.scopes.push((instance, node.clone()));
        self.scopes.len() - 1
    }

    fn end_node_visitation(&mut self, instance: usize, token: usize) {
        match self.scopes.get(token) {
            Some((open, _)) if *open == instance => self.scopes.truncate(token),
            _ => log::error!("history: mismatched end of visitation {token} on instance {instance}"),
        }
    }

    fn handle_variable_read(
        &mut self,
        instance: usize,
        port: &Port,
        mandatory: bool,
        default_pin: Option<&Port>,
        filter_for_compilation: bool,
    ) -> bool {
        let Ok(name) = QualifiedName::parse(&port.name) else {
            log::warn!("history: cannot read unnamed port {}", port.id);
            return true;
        };
        let used_default = !self
            .histories
            .maps
            .get(instance)
            .map(|map| map.was_written(&name))
            .unwrap_or(false);

        if used_default {
            if let Some(default_pin) = default_pin {
                self.visit_input_port(default_pin, filter_for_compilation);
            }
        }

        let node = self.current_node();
        if let Some(map) = self.map_mut(instance) {
            map.reads.push(VariableRead {
                name,
                ty: port.ty.clone(),
                node,
                port: port.id,
                mandatory,
                used_default,
                default_pin: default_pin.map(|p| p.id),
            });
        }
        used_default
    }

    fn route_parameter_map_around(&mut self, node: &NodeId, instance: Option<usize>) {
        let Some(instance) = instance else {
            return;
        };
        if let Some(map) = self.map_mut(instance) {
            map.routed_around.push(node.clone());
        }
    }

    fn begin_parameter_map(&mut self, node: &NodeId) -> usize {
        self.histories.maps.push(ParameterMapHistory {
            origin: node.clone(),
            ..ParameterMapHistory::default()
        });
        self.histories.maps.len() - 1
    }

    fn register_parameter_map_output(&mut self, output: PortId, instance: usize) {
        let writes = self
            .histories
            .maps
            .get(instance)
            .map(|map| map.writes.len())
            .unwrap_or(0);
        self.published_writes.insert(output, writes);
        self.histories.port_instances.insert(output, instance);
    }

    fn handle_variable_write(&mut self, instance: usize, port: &Port) {
        let Ok(name) = QualifiedName::parse(&port.name) else {
            log::warn!("history: cannot write unnamed port {}", port.id);
            return;
        };
        let node = self.current_node();
        if let Some(map) = self.map_mut(instance) {
            map.writes.push(VariableWrite {
                name,
                ty: port.ty.clone(),
                node,
                port: port.id,
            });
        }
    }
}

/// Build the histories of every map in `graph`.
pub fn build_histories(
    graph: &Graph,
    config: HistoryConfig,
) -> Result<ParameterMapHistories, GraphError> {
    ParameterMapHistoryBuilder::new(graph, config).build()
}
