//! Port list, naming rules and rename commits.

use sparkfx_api_core::{QualifiedName, TypeDef};

use super::{MapGetNode, SOURCE_PIN_NAME};
use crate::error::GraphError;
use crate::graph::GraphContext;
use crate::registry::VariableRegistry;
use crate::schema::TypeTranslator;
use crate::types::{Port, PortId};
use crate::undo::Transactor;

const EXISTS_WITH_DIFFERENT_TYPE: &str =
    "This variable already exists with a different type. Choose another name.";

impl MapGetNode {
    pub fn allocate_default_pins(&mut self) {
        self.pending_rename = None;
        self.ports
            .push(Port::input(SOURCE_PIN_NAME, TypeDef::ParameterMap));
        self.ports.push(Port::add_pin());
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    pub(crate) fn index_of(&self, id: PortId) -> Option<usize> {
        self.ports.iter().position(|p| p.id == id)
    }

    pub fn input_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_input())
    }

    pub fn output_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_output())
    }

    /// Input 0: the parameter map the values are read from.
    pub fn source_port(&self) -> Option<&Port> {
        self.input_ports().next()
    }

    /// Outputs that carry a value: not the add pin, not orphaned.
    pub fn value_outputs(&self) -> impl Iterator<Item = &Port> {
        self.output_ports()
            .filter(|p| !p.is_add_pin() && !p.flags.orphaned)
    }

    pub fn add_pin(&self) -> Option<&Port> {
        self.output_ports().find(|p| p.is_add_pin())
    }

    pub fn is_parameter_map_pin(port: &Port) -> bool {
        port.ty.is_parameter_map()
    }

    /// New outputs go in front of the add pin so it stays last.
    pub(crate) fn insert_output(&mut self, port: Port) -> PortId {
        let id = port.id;
        let at = self
            .ports
            .iter()
            .position(|p| p.is_add_pin())
            .unwrap_or(self.ports.len());
        self.ports.insert(at, port);
        id
    }

    pub(crate) fn push_input(&mut self, port: Port) -> PortId {
        let id = port.id;
        self.ports.push(port);
        id
    }

    /// Create a typed output named after `proposed_name` and run the new-pin bookkeeping
    /// (namespacing, sibling disambiguation, default pin, registry entry).
    pub fn add_output_port(
        &mut self,
        ty: TypeDef,
        proposed_name: &str,
        ctx: &mut GraphContext<'_>,
    ) -> Result<PortId, GraphError> {
        QualifiedName::parse(proposed_name).map_err(|err| GraphError::InvalidPinName {
            reason: err.to_string(),
        })?;
        let mut port = Port::output(proposed_name, ty);
        port.friendly_name = Some(proposed_name.to_string());
        let id = self.insert_output(port);
        self.on_new_typed_pin_added(id, ctx);
        Ok(id)
    }

    /// The `Source` input and the add pin. They live as long as the node.
    pub fn is_fixed_pin(&self, id: PortId) -> bool {
        self.source_port().map(|p| p.id) == Some(id)
            || self.add_pin().map(|p| p.id) == Some(id)
    }

    /// Remove a port and everything that goes with it. Returns every removed port (the requested
    /// one first) so the caller can break links on the other side. Fixed pins are never removed.
    pub fn remove_port(&mut self, id: PortId) -> Vec<Port> {
        if self.is_fixed_pin(id) {
            log::warn!("node {}: refusing to remove fixed pin {}", self.id, id);
            return Vec::new();
        }
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let removed = self.ports.remove(index);
        if self.pending_rename == Some(id) {
            self.pending_rename = None;
        }
        let cascaded = self.on_pin_removed(&removed);
        let mut out = Vec::with_capacity(1 + cascaded.len());
        out.push(removed);
        out.extend(cascaded);
        out
    }

    /// User-driven removal of a value output together with its default pin.
    pub fn remove_dynamic_pin(&mut self, id: PortId) -> Result<Vec<Port>, GraphError> {
        if !self.can_modify_pin(id) {
            return Err(GraphError::NotAnOutput(id));
        }
        let mut removed = Vec::new();
        if let Some(default_id) = self.default_pin_id(id) {
            removed.extend(self.remove_port(default_id));
        }
        removed.extend(self.remove_port(id));
        Ok(removed)
    }

    pub fn can_modify_pin(&self, id: PortId) -> bool {
        self.port(id)
            .map(|p| p.is_output() && !p.is_add_pin())
            .unwrap_or(false)
    }

    pub fn is_pin_name_editable(&self, id: PortId) -> bool {
        self.port(id)
            .map(|p| p.ty.is_valid() && p.is_output() && !p.is_add_pin() && !p.flags.orphaned)
            .unwrap_or(false)
    }

    /// Only the port just created through the add pin opens in rename mode, and never for engine
    /// constants.
    pub fn is_pin_name_editable_upon_creation(
        &self,
        id: PortId,
        schema: &dyn TypeTranslator,
    ) -> bool {
        if self.pending_rename != Some(id) {
            return false;
        }
        match self.port(id) {
            Some(port) if port.is_output() => schema
                .port_to_variable(port, false)
                .map(|var| !schema.is_engine_parameter(&var))
                .unwrap_or(true),
            _ => false,
        }
    }

    /// Check a proposed name without applying it.
    pub fn verify_editable_pin_name(
        &self,
        name: &str,
        id: PortId,
        registry: &VariableRegistry,
    ) -> Result<(), GraphError> {
        let port = self.port(id).ok_or(GraphError::UnknownPort(id))?;
        if name.trim().is_empty() && port.is_output() {
            return Err(GraphError::InvalidPinName {
                reason: "Invalid pin name".to_string(),
            });
        }
        let qualified = QualifiedName::parse(name).map_err(|err| GraphError::InvalidPinName {
            reason: err.to_string(),
        })?;
        match registry.get_variable(&qualified) {
            // Referencing an existing parameter of the same type is allowed.
            Some(existing) if existing.ty != port.ty => Err(GraphError::NameCollision {
                name: name.to_string(),
                reason: EXISTS_WITH_DIFFERENT_TYPE.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Verify and commit a rename of a live value output.
    ///
    /// The transaction snapshots this node only. The registry entry made for the new name stays
    /// after an undo, like the entry of an added pin does.
    pub fn rename_output_port(
        &mut self,
        id: PortId,
        new_name: &str,
        ctx: &mut GraphContext<'_>,
        transactor: &mut dyn Transactor<MapGetNode>,
    ) -> Result<(), GraphError> {
        if !self.is_pin_name_editable(id) {
            return Err(match self.port(id) {
                Some(_) => GraphError::NotAnOutput(id),
                None => GraphError::UnknownPort(id),
            });
        }
        self.verify_editable_pin_name(new_name, id, ctx.registry)?;
        if self.commit_pin_name(id, new_name, false, ctx, transactor) {
            Ok(())
        } else {
            Err(GraphError::NotAnOutput(id))
        }
    }

    /// Apply an already verified name. Returns `false` when the port is not a live value output of
    /// this node or the name does not parse.
    pub fn commit_pin_name(
        &mut self,
        id: PortId,
        name: &str,
        suppress_events: bool,
        ctx: &mut GraphContext<'_>,
        transactor: &mut dyn Transactor<MapGetNode>,
    ) -> bool {
        if self.pending_rename == Some(id) {
            self.pending_rename = None;
        }
        let Some(port) = self.port(id) else {
            return false;
        };
        if !port.is_output() || port.is_add_pin() || port.flags.orphaned {
            return false;
        }
        if port.name == name {
            return true;
        }
        if QualifiedName::parse(name).is_err() {
            return false;
        }

        transactor.begin("Renamed pin", self);
        let Some(port) = self.port_mut(id) else {
            return false;
        };
        let old_name = std::mem::replace(&mut port.name, name.to_string());
        port.friendly_name = Some(name.to_string());

        if !suppress_events {
            self.on_pin_renamed(id, &old_name, ctx);
        }
        true
    }

    pub fn cancel_pin_name(&mut self, id: PortId) -> bool {
        if self.pending_rename == Some(id) {
            self.pending_rename = None;
        }
        true
    }
}
