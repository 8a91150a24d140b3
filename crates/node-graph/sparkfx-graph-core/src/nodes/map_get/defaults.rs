//! Output↔default pin pairing and default-pin synchronization.

use hashbrown::HashSet;
use sparkfx_api_core::{namespaces, DefaultMode, QualifiedName, TypeDef};

use super::{MapGetNode, SOURCE_PIN_NAME};
use crate::graph::GraphContext;
use crate::types::{Port, PortId};

/// Outcome of a [`MapGetNode::synchronize_default_pins`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synchronized: usize,
    /// Live outputs found without a default pin. Always a data bug; the pass skips them.
    pub missing_default_pins: Vec<PortId>,
}

impl MapGetNode {
    /// The default pin paired with `output`, if both the mapping entry and the port exist.
    pub fn default_pin_id(&self, output: PortId) -> Option<PortId> {
        let default = *self.output_to_default.get(&output)?;
        self.port(default).filter(|p| p.is_input()).map(|p| p.id)
    }

    pub fn default_pin(&self, output: PortId) -> Option<&Port> {
        self.default_pin_id(output).and_then(|id| self.port(id))
    }

    /// The output paired with `default`, if both the mapping entry and the port exist.
    pub fn output_for_default(&self, default: PortId) -> Option<&Port> {
        let output = self
            .output_to_default
            .iter()
            .find(|(_, d)| **d == default)
            .map(|(o, _)| *o)?;
        self.port(output).filter(|p| p.is_output())
    }

    /// Build the default pin for `output` and record the pairing. `None` when `output` is not a
    /// port of this node.
    pub fn create_default_pin(
        &mut self,
        output: PortId,
        ctx: &mut GraphContext<'_>,
    ) -> Option<PortId> {
        let mut output_port = self.port(output)?.clone();
        let mut default_port = Port::input("", output_port.ty.clone());

        // Output names must carry a namespace.
        if let Ok(name) = QualifiedName::parse(&output_port.name) {
            if !name.has_namespace() {
                output_port.name = name.with_namespace(namespaces::LOCAL).to_string();
            }
        }

        // Read only until the registry says the default is custom.
        default_port.flags.not_connectable = true;
        default_port.flags.default_value_read_only = true;

        let needs_value = !output_port.ty.is_data_interface();
        let variable = ctx.schema.port_to_variable(&output_port, needs_value);
        if let Some(variable) = &variable {
            if let Some(text) = ctx.schema.try_default_value_text(variable) {
                default_port.default_value = Some(text.clone());
                default_port.autogenerated_default = Some(text);
            }

            // A variable already in use keeps its configured value.
            let configured = ctx
                .registry
                .get_default_mode(&variable.name)
                .zip(ctx.registry.get_variable(&variable.name));
            if let Some((DefaultMode::Value, existing)) = configured {
                if needs_value && existing.is_data_allocated() {
                    default_port.default_value =
                        existing.value.as_ref().map(|v| v.to_default_text());
                }
            }
        }

        if !output_port.id.is_valid() {
            output_port.id = PortId::new();
        }
        let output_id = output_port.id;
        if let Some(slot) = self.port_mut(output) {
            *slot = output_port;
        }

        let default_id = self.push_input(default_port);
        self.output_to_default.insert(output_id, default_id);
        log::debug!(
            "node {}: created default pin {} for output {}",
            self.id,
            default_id,
            output_id
        );

        self.synchronize_default_pin(default_id, ctx);
        Some(default_id)
    }

    /// Re-derive a default pin's visibility and editability from the registry.
    pub fn synchronize_default_pin(&mut self, default: PortId, ctx: &mut GraphContext<'_>) {
        match self.port(default) {
            Some(port) if !port.flags.orphaned => {}
            _ => return,
        }
        let Some(output) = self.output_for_default(default) else {
            log::error!(
                "node {}: there should always be an output pin for every default pin we synchronize (default {})",
                self.id,
                default
            );
            return;
        };

        let output_name = output.name.clone();
        let variable = ctx.schema.port_to_variable(output, true);
        let is_engine = variable
            .as_ref()
            .map(|v| ctx.schema.is_engine_parameter(v))
            .unwrap_or(false);
        let mode = variable
            .as_ref()
            .and_then(|v| ctx.registry.get_default_mode(&v.name));

        let Some(port) = self.port_mut(default) else {
            return;
        };
        if is_engine {
            port.flags.default_value_ignored = true;
            port.flags.not_connectable = true;
            port.flags.hidden = true;
            port.tooltip = Some(format!(
                "Default value for {output_name}. Disabled for Engine Parameters."
            ));
        } else {
            port.flags.default_value_ignored = false;
            port.flags.hidden = false;
            port.tooltip = Some(format!(
                "Default value for {output_name} if no other module has set it previously in the stack."
            ));
        }

        match mode {
            Some(DefaultMode::Value) => {
                port.flags.not_connectable = true;
                port.flags.default_value_read_only = true;
            }
            Some(DefaultMode::Custom) => {
                port.flags.not_connectable = false;
                port.flags.default_value_read_only = false;
            }
            Some(DefaultMode::Binding) | Some(DefaultMode::FailIfPreviouslyNotSet) => {
                port.flags.hidden = true;
            }
            None => {}
        }
    }

    /// Re-synchronize the default pin of every live output.
    pub fn synchronize_default_pins(&mut self, ctx: &mut GraphContext<'_>) -> SyncReport {
        let outputs: Vec<PortId> = self.value_outputs().map(|p| p.id).collect();
        let mut report = SyncReport::default();
        for output in outputs {
            match self.default_pin_id(output) {
                Some(default) => {
                    self.synchronize_default_pin(default, ctx);
                    report.synchronized += 1;
                }
                None => {
                    log::error!(
                        "node {}: there should always be an input pin for every output pin, even if hidden (output {})",
                        self.id,
                        output
                    );
                    report.missing_default_pins.push(output);
                }
            }
        }
        report
    }

    /// Repair pass run after deserialization: restore the fixed pins, create missing default pins,
    /// synchronize existing ones and drop inputs that are neither the source nor a paired default.
    /// Running it twice yields the same node. Returns the removed ports.
    pub fn post_load(&mut self, ctx: &mut GraphContext<'_>) -> Vec<Port> {
        self.begin_load();
        if !self
            .input_ports()
            .next()
            .map(MapGetNode::is_parameter_map_pin)
            .unwrap_or(false)
        {
            let source = Port::input(SOURCE_PIN_NAME, TypeDef::ParameterMap);
            self.ports.insert(0, source);
        }
        if self.add_pin().is_none() {
            self.ports.push(Port::add_pin());
        }

        // Entries whose ports both vanished cannot be repaired.
        let ids: HashSet<PortId> = self.ports.iter().map(|p| p.id).collect();
        self.output_to_default
            .retain(|o, d| ids.contains(o) || ids.contains(d));

        let outputs: Vec<PortId> = self.value_outputs().map(|p| p.id).collect();
        let mut correct: HashSet<PortId> = HashSet::new();
        for output in outputs {
            let default = match self.default_pin_id(output) {
                Some(default) => {
                    self.synchronize_default_pin(default, ctx);
                    Some(default)
                }
                None => {
                    // A stale entry would shadow the new pairing in reverse lookups.
                    self.output_to_default.remove(&output);
                    self.create_default_pin(output, ctx)
                }
            };
            if let Some(default) = default {
                correct.insert(default);
            }
        }

        let stale: Vec<PortId> = self
            .input_ports()
            .skip(1)
            .filter(|p| !p.flags.orphaned && !correct.contains(&p.id))
            .map(|p| p.id)
            .collect();
        let mut removed = Vec::new();
        for id in stale {
            log::warn!("node {}: removing stale default pin {}", self.id, id);
            removed.extend(self.remove_port(id));
        }
        self.end_load();
        removed
    }

    pub fn on_pin_renamed(&mut self, id: PortId, old_name: &str, ctx: &mut GraphContext<'_>) {
        log::debug!("node {}: pin {} renamed from {}", self.id, id, old_name);
        if !self.is_loading() {
            if let Some(variable) = self
                .port(id)
                .and_then(|p| ctx.schema.port_to_variable(p, false))
            {
                ctx.registry.add_parameter(variable, false);
            }
        }
        if let Some(default) = self.default_pin_id(id) {
            self.synchronize_default_pin(default, ctx);
        }
        self.requires_synchronization = true;
    }

    /// Bookkeeping after `removed` left the port list. Returns ports removed as a consequence.
    pub(crate) fn on_pin_removed(&mut self, removed: &Port) -> Vec<Port> {
        let mut cascaded = Vec::new();
        if let Some(default) = self.output_to_default.remove(&removed.id) {
            if !removed.flags.orphaned && self.port(default).is_some() {
                cascaded.extend(self.remove_port(default));
            }
        }
        let paired_output = self
            .output_to_default
            .iter()
            .find(|(_, d)| **d == removed.id)
            .map(|(o, _)| *o);
        if let Some(output) = paired_output {
            self.output_to_default.remove(&output);
        }
        cascaded
    }

    /// Namespace, disambiguate, pair and register a freshly created output.
    pub fn on_new_typed_pin_added(&mut self, id: PortId, ctx: &mut GraphContext<'_>) {
        let Some(port) = self.port(id) else {
            return;
        };
        let is_output = port.is_output();

        if is_output {
            // The friendly name is what the user typed.
            let requested = port.display_name().to_string();
            match QualifiedName::parse(&requested) {
                Ok(mut name) => {
                    if !name.has_namespace() {
                        name = name.with_namespace(namespaces::MODULE);
                    }
                    let siblings: Vec<QualifiedName> = self
                        .output_ports()
                        .filter(|p| p.id != id)
                        .filter_map(|p| QualifiedName::parse(&p.name).ok())
                        .collect();
                    let unique = name.make_unique(&siblings).to_string();
                    if let Some(port) = self.port_mut(id) {
                        port.name = unique.clone();
                        port.friendly_name = Some(unique);
                    }
                }
                Err(err) => {
                    log::warn!("node {}: new pin {} has an invalid name: {}", self.id, id, err);
                }
            }

            if self.default_pin_id(id).is_none() {
                self.create_default_pin(id, ctx);
            }
        }

        if self.is_loading() {
            return;
        }

        if let Some(variable) = self
            .port(id)
            .and_then(|p| ctx.schema.port_to_variable(p, false))
        {
            let name = variable.name.to_string();
            ctx.registry.add_parameter(variable, false);
            if let Some(port) = self.port_mut(id) {
                port.name = name;
            }
        }

        if is_output {
            self.pending_rename = Some(id);
        }
    }

    /// Flag an output and its default pin as orphaned. The pairing is kept so the pair can be
    /// restored or purged later.
    pub fn orphan_output_port(&mut self, output: PortId) -> bool {
        if !self.can_modify_pin(output) {
            return false;
        }
        let default = self.default_pin_id(output);
        for id in std::iter::once(output).chain(default) {
            if let Some(port) = self.port_mut(id) {
                port.flags.orphaned = true;
            }
        }
        if self.pending_rename == Some(output) {
            self.pending_rename = None;
        }
        true
    }

    /// Record the identity pair of two orphaned pins (used when an undo brings them back).
    pub fn add_orphaned_pin_pair(&mut self, output: PortId, default: PortId) {
        let (Some(o), Some(d)) = (self.port(output), self.port(default)) else {
            return;
        };
        if !(o.flags.orphaned && d.flags.orphaned && o.id.is_valid() && d.id.is_valid()) {
            log::warn!(
                "node {}: orphaned pin pair ({}, {}) is not fully orphaned",
                self.id,
                output,
                default
            );
        }
        self.output_to_default.insert(output, default);
    }

    /// Bring an orphaned pair back to life and re-synchronize it.
    pub fn restore_orphaned_pin_pair(&mut self, output: PortId, ctx: &mut GraphContext<'_>) -> bool {
        let Some(default) = self.output_to_default.get(&output).copied() else {
            return false;
        };
        if self.port(output).is_none() || self.port(default).is_none() {
            return false;
        }
        for id in [output, default] {
            if let Some(port) = self.port_mut(id) {
                port.flags.orphaned = false;
            }
        }
        self.synchronize_default_pin(default, ctx);
        true
    }

    /// Permanently remove orphaned ports that no longer carry links. Returns the removed ports.
    pub fn purge_orphaned_pins(&mut self) -> Vec<Port> {
        let orphans: Vec<PortId> = self
            .ports
            .iter()
            .filter(|p| p.flags.orphaned && !p.is_linked())
            .map(|p| p.id)
            .collect();
        let mut removed = Vec::new();
        for id in orphans {
            removed.extend(self.remove_port(id));
        }
        removed
    }
}
