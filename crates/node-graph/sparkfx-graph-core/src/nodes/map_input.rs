use serde::{Deserialize, Serialize};
use sparkfx_api_core::TypeDef;

use crate::history::ParameterMapHistorySink;
use crate::types::{NodeId, Port, PortId};

pub const MAP_PIN_NAME: &str = "Map";

/// Entry point of a parameter map. Every input node starts a new map instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapInputNode {
    pub id: NodeId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ports")]
    ports: Vec<Port>,
}

fn default_enabled() -> bool {
    true
}

fn default_ports() -> Vec<Port> {
    vec![Port::output(MAP_PIN_NAME, TypeDef::ParameterMap)]
}

impl MapInputNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        MapInputNode {
            id: id.into(),
            enabled: true,
            ports: default_ports(),
        }
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub(crate) fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    pub fn map_port(&self) -> Option<&Port> {
        self.ports.iter().find(|p| p.is_output() && p.ty.is_parameter_map())
    }

    pub fn map_port_id(&self) -> Option<PortId> {
        self.map_port().map(|p| p.id)
    }

    pub fn build_parameter_map_history(&self, sink: &mut dyn ParameterMapHistorySink) {
        let Some(output) = self.map_port() else {
            return;
        };
        let instance = sink.begin_parameter_map(&self.id);
        sink.register_parameter_map_output(output.id, instance);
    }
}
