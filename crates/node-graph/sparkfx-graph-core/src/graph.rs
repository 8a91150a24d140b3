//! Graph container: nodes, links, the variable registry and the schema.

use serde::{Deserialize, Serialize};
use sparkfx_api_core::{DefaultMode, QualifiedName, TypeDef};

use crate::error::GraphError;
use crate::nodes::{MapGetNode, MapInputNode, MapSetNode, map_get::SyncReport};
use crate::registry::VariableRegistry;
use crate::schema::{signature, CompileHash, GraphSchema, NodeType, TypeTranslator};
use crate::types::{NodeId, Port, PortId};
use crate::undo::Transactor;

/// What a node needs from its graph while editing: the shared registry and the schema.
pub struct GraphContext<'a> {
    pub registry: &'a mut VariableRegistry,
    pub schema: &'a dyn TypeTranslator,
}

impl<'a> GraphContext<'a> {
    pub fn new(registry: &'a mut VariableRegistry, schema: &'a dyn TypeTranslator) -> Self {
        GraphContext { registry, schema }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphNode {
    Input(MapInputNode),
    Set(MapSetNode),
    Get(MapGetNode),
}

impl GraphNode {
    pub fn id(&self) -> &NodeId {
        match self {
            GraphNode::Input(n) => &n.id,
            GraphNode::Set(n) => &n.id,
            GraphNode::Get(n) => &n.id,
        }
    }

    pub fn ports(&self) -> &[Port] {
        match self {
            GraphNode::Input(n) => n.ports(),
            GraphNode::Set(n) => n.ports(),
            GraphNode::Get(n) => n.ports(),
        }
    }

    fn ports_mut(&mut self) -> &mut [Port] {
        match self {
            GraphNode::Input(n) => n.ports_mut(),
            GraphNode::Set(n) => n.ports_mut(),
            GraphNode::Get(n) => n.ports_mut(),
        }
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports().iter().find(|p| p.id == id)
    }

    fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports_mut().iter_mut().find(|p| p.id == id)
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            GraphNode::Input(n) => n.enabled,
            GraphNode::Set(n) => n.enabled,
            GraphNode::Get(n) => n.enabled,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            GraphNode::Input(_) => NodeType::MapInput,
            GraphNode::Set(_) => NodeType::MapSet,
            GraphNode::Get(_) => NodeType::MapGet,
        }
    }

    /// Display title of the node kind.
    pub fn title(&self) -> &'static str {
        signature(self.node_type()).map(|sig| sig.name).unwrap_or("Node")
    }

    pub fn as_get(&self) -> Option<&MapGetNode> {
        match self {
            GraphNode::Get(n) => Some(n),
            _ => None,
        }
    }
}

impl From<MapInputNode> for GraphNode {
    fn from(node: MapInputNode) -> Self {
        GraphNode::Input(node)
    }
}

impl From<MapSetNode> for GraphNode {
    fn from(node: MapSetNode) -> Self {
        GraphNode::Set(node)
    }
}

impl From<MapGetNode> for GraphNode {
    fn from(node: MapGetNode) -> Self {
        GraphNode::Get(node)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Graph {
    #[serde(default)]
    pub registry: VariableRegistry,
    #[serde(default)]
    pub schema: GraphSchema,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: GraphSchema) -> Self {
        Graph {
            schema,
            ..Self::default()
        }
    }

    /// Deserialize and run the load-time repair pass.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let mut graph: Graph = serde_json::from_str(json)?;
        graph.post_load();
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a node. Variables written by a map set node are registered with the graph.
    pub fn add_node(&mut self, node: impl Into<GraphNode>) -> Result<(), GraphError> {
        let node = node.into();
        if self.node(node.id()).is_some() {
            return Err(GraphError::DuplicateNode(node.id().clone()));
        }
        log::debug!("adding {} node '{}'", node.title(), node.id());
        if let GraphNode::Set(set) = &node {
            for input in set.value_inputs() {
                if let Some(variable) = self.schema.port_to_variable(input, true) {
                    self.registry.add_parameter(variable, false);
                }
            }
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn get_node(&self, id: &str) -> Result<&MapGetNode, GraphError> {
        self.node(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?
            .as_get()
            .ok_or_else(|| GraphError::NotAMapGetNode(id.to_string()))
    }

    /// The node owning `port`, with the port itself.
    pub fn find_port(&self, port: PortId) -> Option<(&GraphNode, &Port)> {
        self.nodes
            .iter()
            .find_map(|node| node.port(port).map(|p| (node, p)))
    }

    pub fn node_of_port(&self, port: PortId) -> Option<&GraphNode> {
        self.find_port(port).map(|(node, _)| node)
    }

    fn port_mut(&mut self, port: PortId) -> Option<&mut Port> {
        self.nodes.iter_mut().find_map(|node| node.port_mut(port))
    }

    /// Link an output to an input. An input carries at most one link; an existing one is
    /// replaced.
    pub fn connect(&mut self, from: PortId, to: PortId) -> Result<(), GraphError> {
        let (from_node, from_port) = self.find_port(from).ok_or(GraphError::UnknownPort(from))?;
        let (to_node, to_port) = self.find_port(to).ok_or(GraphError::UnknownPort(to))?;
        let invalid = |reason: &str| GraphError::InvalidConnection {
            from,
            to,
            reason: reason.to_string(),
        };

        if from_node.id() == to_node.id() {
            return Err(invalid("cannot link a node to itself"));
        }
        if !from_port.is_output() || from_port.is_add_pin() {
            return Err(invalid("source is not a value output"));
        }
        if !to_port.is_input() {
            return Err(invalid("target is not an input"));
        }
        if to_port.flags.not_connectable {
            return Err(invalid("target does not accept links"));
        }
        if from_port.ty != to_port.ty {
            return Err(GraphError::TypeMismatch {
                expected: to_port.ty.clone(),
                actual: from_port.ty.clone(),
            });
        }

        let previous = to_port.linked_to.clone();
        for old in previous {
            self.disconnect(old, to)?;
        }
        if let Some(port) = self.port_mut(from) {
            port.linked_to.push(to);
        }
        if let Some(port) = self.port_mut(to) {
            port.linked_to.push(from);
        }
        Ok(())
    }

    pub fn disconnect(&mut self, from: PortId, to: PortId) -> Result<(), GraphError> {
        if self.find_port(from).is_none() {
            return Err(GraphError::UnknownPort(from));
        }
        if self.find_port(to).is_none() {
            return Err(GraphError::UnknownPort(to));
        }
        if let Some(port) = self.port_mut(from) {
            port.linked_to.retain(|p| *p != to);
        }
        if let Some(port) = self.port_mut(to) {
            port.linked_to.retain(|p| *p != from);
        }
        Ok(())
    }

    /// Run `f` on a map get node with the graph context split off from the node list.
    pub fn with_get_node<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut MapGetNode, &mut GraphContext<'_>) -> R,
    ) -> Result<R, GraphError> {
        let Graph {
            registry,
            schema,
            nodes,
        } = self;
        let node = nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        let GraphNode::Get(node) = node else {
            return Err(GraphError::NotAMapGetNode(id.to_string()));
        };
        let mut ctx = GraphContext::new(registry, &*schema);
        Ok(f(node, &mut ctx))
    }

    pub fn add_output_port(
        &mut self,
        node: &str,
        ty: TypeDef,
        proposed_name: &str,
    ) -> Result<PortId, GraphError> {
        self.with_get_node(node, |get, ctx| get.add_output_port(ty, proposed_name, ctx))?
    }

    pub fn rename_output_port(
        &mut self,
        node: &str,
        port: PortId,
        new_name: &str,
        transactor: &mut dyn Transactor<MapGetNode>,
    ) -> Result<(), GraphError> {
        self.with_get_node(node, |get, ctx| {
            get.rename_output_port(port, new_name, ctx, transactor)
        })?
    }

    /// Remove a port from a map get node, breaking the links of every port that went with it.
    pub fn remove_port(&mut self, node: &str, port: PortId) -> Result<Vec<Port>, GraphError> {
        let removed = self.with_get_node(node, |get, _| {
            if get.is_fixed_pin(port) {
                Err(GraphError::FixedPin(port))
            } else {
                Ok(get.remove_port(port))
            }
        })??;
        if removed.is_empty() {
            return Err(GraphError::UnknownPort(port));
        }
        self.unlink_removed(&removed);
        Ok(removed)
    }

    pub fn remove_dynamic_pin(&mut self, node: &str, port: PortId) -> Result<Vec<Port>, GraphError> {
        let removed = self.with_get_node(node, |get, _| get.remove_dynamic_pin(port))??;
        self.unlink_removed(&removed);
        Ok(removed)
    }

    pub fn purge_orphaned_pins(&mut self) -> Vec<Port> {
        let mut removed = Vec::new();
        for node in &mut self.nodes {
            if let GraphNode::Get(get) = node {
                removed.extend(get.purge_orphaned_pins());
            }
        }
        self.unlink_removed(&removed);
        removed
    }

    fn unlink_removed(&mut self, removed: &[Port]) {
        for port in removed {
            for other in &port.linked_to {
                if let Some(other) = self.port_mut(*other) {
                    other.linked_to.retain(|p| *p != port.id);
                }
            }
        }
    }

    /// Change a variable's default mode and re-synchronize every map get node.
    pub fn set_default_mode(
        &mut self,
        name: &QualifiedName,
        mode: DefaultMode,
    ) -> Result<SyncReport, GraphError> {
        self.registry.set_default_mode(name, mode)?;
        Ok(self.synchronize_default_pins())
    }

    pub fn synchronize_default_pins(&mut self) -> SyncReport {
        let Graph {
            registry,
            schema,
            nodes,
        } = self;
        let mut ctx = GraphContext::new(registry, &*schema);
        let mut report = SyncReport::default();
        for node in nodes.iter_mut() {
            if let GraphNode::Get(get) = node {
                let node_report = get.synchronize_default_pins(&mut ctx);
                report.synchronized += node_report.synchronized;
                report.missing_default_pins
                    .extend(node_report.missing_default_pins);
            }
        }
        report
    }

    /// Repair every map get node after deserialization. Returns the removed stale ports.
    pub fn post_load(&mut self) -> Vec<Port> {
        let mut removed = Vec::new();
        {
            let Graph {
                registry,
                schema,
                nodes,
            } = self;
            let mut ctx = GraphContext::new(registry, &*schema);
            for node in nodes.iter_mut() {
                if let GraphNode::Get(get) = node {
                    removed.extend(get.post_load(&mut ctx));
                }
            }
        }
        if !removed.is_empty() {
            log::info!("post_load removed {} stale pins", removed.len());
        }
        self.unlink_removed(&removed);
        removed
    }

    /// Collection hashes and paths read by all map get nodes, deduplicated across the graph.
    pub fn gather_external_dependency_data(&self) -> (Vec<CompileHash>, Vec<String>) {
        let mut hashes = Vec::new();
        let mut paths = Vec::new();
        for get in self.nodes.iter().filter_map(GraphNode::as_get) {
            get.gather_external_dependency_data(&self.schema, &mut hashes, &mut paths);
        }
        (hashes, paths)
    }

    pub fn pin_hover_text(&self, node: &str, port: PortId) -> Result<String, GraphError> {
        let get = self.get_node(node)?;
        Ok(get.pin_hover_text(port, &self.registry, &self.schema))
    }
}
