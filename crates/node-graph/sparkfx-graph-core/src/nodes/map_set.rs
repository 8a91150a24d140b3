use serde::{Deserialize, Serialize};
use sparkfx_api_core::{QualifiedName, TypeDef};

use crate::error::GraphError;
use crate::history::ParameterMapHistorySink;
use crate::types::{NodeId, Port, PortId};

pub const SOURCE_PIN_NAME: &str = "Source";
pub const DEST_PIN_NAME: &str = "Dest";

/// Writes its value inputs into the map flowing from `Source` to `Dest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapSetNode {
    pub id: NodeId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    ports: Vec<Port>,
}

fn default_enabled() -> bool {
    true
}

impl MapSetNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        MapSetNode {
            id: id.into(),
            enabled: true,
            ports: vec![
                Port::input(SOURCE_PIN_NAME, TypeDef::ParameterMap),
                Port::output(DEST_PIN_NAME, TypeDef::ParameterMap),
            ],
        }
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub(crate) fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    pub fn source_port(&self) -> Option<&Port> {
        self.ports.iter().find(|p| p.is_input())
    }

    pub fn dest_port(&self) -> Option<&Port> {
        self.ports.iter().find(|p| p.is_output())
    }

    /// Inputs after `Source`, one per written variable.
    pub fn value_inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_input()).skip(1)
    }

    /// Add a write of `name`. The name must be a fully qualified variable name.
    pub fn add_value_input(&mut self, name: &str, ty: TypeDef) -> Result<PortId, GraphError> {
        let qualified = QualifiedName::parse(name).map_err(|err| GraphError::InvalidPinName {
            reason: err.to_string(),
        })?;
        if !qualified.has_namespace() {
            return Err(GraphError::InvalidPinName {
                reason: format!("'{name}' has no namespace"),
            });
        }
        if self.value_inputs().any(|p| p.name == name) {
            return Err(GraphError::NameCollision {
                name: name.to_string(),
                reason: "This node already writes that variable.".to_string(),
            });
        }
        let port = Port::input(qualified.to_string(), ty);
        let id = port.id;
        let at = self
            .ports
            .iter()
            .position(|p| p.is_output())
            .unwrap_or(self.ports.len());
        self.ports.insert(at, port);
        Ok(id)
    }

    pub fn build_parameter_map_history(
        &self,
        sink: &mut dyn ParameterMapHistorySink,
        recursive: bool,
        filter_for_compilation: bool,
    ) {
        let Some(source) = self.source_port() else {
            return;
        };
        if recursive {
            sink.visit_input_port(source, filter_for_compilation);
        }
        let instance = source
            .linked_to
            .first()
            .and_then(|output| sink.trace_parameter_map_output_port(*output));

        if !self.enabled && sink.ignore_disabled() {
            sink.route_parameter_map_around(&self.id, instance);
            if let (Some(instance), Some(dest)) = (instance, self.dest_port()) {
                sink.register_parameter_map_output(dest.id, instance);
            }
            return;
        }

        let Some(instance) = instance else {
            return;
        };
        let token = sink.begin_node_visitation(instance, &self.id);
        for input in self.value_inputs() {
            if recursive {
                sink.visit_input_port(input, filter_for_compilation);
            }
            sink.handle_variable_write(instance, input);
        }
        sink.end_node_visitation(instance, token);
        if let Some(dest) = self.dest_port() {
            sink.register_parameter_map_output(dest.id, instance);
        }
    }
}
