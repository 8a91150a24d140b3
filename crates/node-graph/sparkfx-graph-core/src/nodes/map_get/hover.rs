//! Editor tooltips for the node's pins.

use super::{MapGetNode, SOURCE_PIN_NAME};
use crate::registry::VariableRegistry;
use crate::schema::{signature, NodeType, TypeTranslator};
use crate::types::{PortId, ADD_PIN_NAME};

/// Documentation of one of the map get node's fixed pins.
fn fixed_pin_doc(pin: &str) -> String {
    signature(NodeType::MapGet)
        .and_then(|sig| {
            sig.inputs
                .iter()
                .chain(&sig.outputs)
                .find(|port| port.id == pin)
                .map(|port| port.doc.to_string())
        })
        .unwrap_or_default()
}

impl MapGetNode {
    /// Editor tooltip for one of this node's pins. Empty when there is nothing to say.
    pub fn pin_hover_text(
        &self,
        id: PortId,
        registry: &VariableRegistry,
        schema: &dyn TypeTranslator,
    ) -> String {
        let Some(port) = self.port(id) else {
            return String::new();
        };
        if port.is_add_pin() {
            return fixed_pin_doc(ADD_PIN_NAME);
        }
        if port.is_input() {
            if self.source_port().map(|p| p.id) == Some(id) {
                return fixed_pin_doc(SOURCE_PIN_NAME);
            }
            return match self.output_for_default(id) {
                Some(output) => format!(
                    "Default value for \"{}\" if no other module has set it previously in the stack.\nPlease edit this value by selecting in the parameters panel and editing in the details panel.",
                    output.name
                ),
                None => String::new(),
            };
        }

        let Some(variable) = schema.port_to_variable(port, false) else {
            return String::new();
        };
        match registry.get_metadata(&variable.name) {
            Some(metadata) => format!(
                "Name: {} \nType: {}\nDescription: {}",
                variable.name, variable.ty, metadata.description
            ),
            None => String::new(),
        }
    }
}
