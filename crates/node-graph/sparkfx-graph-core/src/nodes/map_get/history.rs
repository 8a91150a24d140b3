//! Parameter-map history participation.

use super::MapGetNode;
use crate::history::ParameterMapHistorySink;

impl MapGetNode {
    /// Record this node's reads against the map instance feeding `Source`.
    ///
    /// With `recursive`, upstream nodes are visited first and each read carries its default pin so
    /// the sink can follow the fallback. A disconnected source records nothing.
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

        let upstream = source.linked_to.first().copied();
        if !self.enabled && sink.ignore_disabled() {
            let instance = upstream.and_then(|output| sink.trace_parameter_map_output_port(output));
            sink.route_parameter_map_around(&self.id, instance);
            return;
        }

        let Some(upstream) = upstream else {
            return;
        };
        let Some(instance) = sink.trace_parameter_map_output_port(upstream) else {
            log::debug!("node {}: source map is not traced, skipping reads", self.id);
            return;
        };

        let token = sink.begin_node_visitation(instance, &self.id);
        for output in self.value_outputs() {
            let default_pin = if recursive {
                self.default_pin(output.id)
            } else {
                None
            };
            sink.handle_variable_read(instance, output, true, default_pin, filter_for_compilation);
        }
        sink.end_node_visitation(instance, token);
    }
}
