//! External dependency reporting for build-cache invalidation.

use sparkfx_api_core::namespaces;

use super::MapGetNode;
use crate::schema::{CompileHash, TypeTranslator};

impl MapGetNode {
    /// Append the compile hash and path of every parameter collection read by an output. Each
    /// collection is reported once regardless of how many outputs reference it.
    pub fn gather_external_dependency_data(
        &self,
        schema: &dyn TypeTranslator,
        hashes: &mut Vec<CompileHash>,
        paths: &mut Vec<String>,
    ) {
        let prefix = format!("{}.", namespaces::PARAMETER_COLLECTION);
        for output in self.output_ports().filter(|p| !p.is_add_pin()) {
            if !output.name.starts_with(&prefix) {
                continue;
            }
            let Some(variable) = schema.port_to_variable(output, false) else {
                continue;
            };
            let Some(collection) = schema.parameter_collection_for(&variable) else {
                log::warn!(
                    "node {}: no parameter collection found for {}",
                    self.id,
                    variable.name
                );
                continue;
            };
            let hash = collection.compile_hash();
            if !hashes.contains(&hash) {
                hashes.push(hash);
            }
            if !paths.contains(&collection.path) {
                paths.push(collection.path.clone());
            }
        }
    }
}
