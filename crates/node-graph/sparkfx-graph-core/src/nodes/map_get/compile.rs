//! Lowering to IR.

use super::MapGetNode;
use crate::schema::TypeTranslator;
use crate::translator::{CompiledRef, IrEmitter};

pub const SOURCE_COMPILE_ERROR: &str = "Error compiling input for param map get node.";

impl MapGetNode {
    /// Lower the node. Returns one slot per value output, in port order; `None` means unresolved.
    ///
    /// Only the source input is compiled here. Default pins get a `None` placeholder and are
    /// resolved inside the map-get instruction itself.
    pub fn compile(
        &self,
        emitter: &mut dyn IrEmitter,
        schema: &dyn TypeTranslator,
    ) -> Vec<Option<CompiledRef>> {
        let mut outputs = vec![None; self.value_outputs().count()];
        let Some(source) = self.source_port() else {
            return outputs;
        };
        if !source.is_linked() {
            return outputs;
        }

        let mut inputs = Vec::new();
        for (index, port) in self.input_ports().enumerate() {
            if !schema.port_kind(&port.ty).is_compilable() {
                continue;
            }
            if index == 0 {
                let compiled = emitter.compile_port(port);
                if compiled.is_none() {
                    emitter.error(SOURCE_COMPILE_ERROR, &self.id, Some(port.id));
                }
                inputs.push(compiled);
            } else {
                inputs.push(None);
            }
        }

        emitter.parameter_map_get(self, &inputs, &mut outputs);
        outputs
    }
}
