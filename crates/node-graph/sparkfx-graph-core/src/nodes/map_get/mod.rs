//! The parameter-map get node.
//!
//! A map get node reads named, typed values out of the parameter map wired into its `Source`
//! input. Every value output is paired with a hidden-or-visible *default pin* (an input of the
//! same type) that supplies the fallback when nothing upstream wrote the variable. The submodules
//! split the node's responsibilities:
//!
//! - [`ports`] owns the port list, naming rules and rename commits.
//! - [`defaults`] keeps the output↔default pairing and default-pin flags in sync with the
//!   [`VariableRegistry`](crate::registry::VariableRegistry).
//! - [`history`] takes part in the parameter-map history traversal.
//! - [`compile`] lowers the node through an [`IrEmitter`](crate::translator::IrEmitter).
//! - [`dependencies`] reports shared parameter collections for cache invalidation.
//! - [`hover`] builds editor tooltips.
//!
//! The pairing is keyed by [`PortId`], never by position, so it survives reorders, renames and
//! undo.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Port, PortId};

pub mod compile;
pub mod defaults;
pub mod dependencies;
pub mod history;
pub mod hover;
pub mod ports;

pub use defaults::SyncReport;

#[cfg(test)]
mod tests;

pub const SOURCE_PIN_NAME: &str = "Source";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Ready,
    /// Being deserialized or initialized; new pins are not registered or offered for rename.
    Loading,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapGetNode {
    pub id: NodeId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    ports: Vec<Port>,
    /// Output port id -> paired default input port id.
    #[serde(default)]
    output_to_default: HashMap<PortId, PortId>,
    #[serde(skip)]
    pending_rename: Option<PortId>,
    #[serde(skip)]
    load_state: LoadState,
    #[serde(skip)]
    requires_synchronization: bool,
}

fn default_enabled() -> bool {
    true
}

impl MapGetNode {
    /// A new node with its `Source` input and the output add pin.
    pub fn new(id: impl Into<NodeId>) -> Self {
        let mut node = MapGetNode {
            id: id.into(),
            enabled: true,
            ports: Vec::new(),
            output_to_default: HashMap::new(),
            pending_rename: None,
            load_state: LoadState::Ready,
            requires_synchronization: false,
        };
        node.allocate_default_pins();
        node
    }

    pub fn output_to_default(&self) -> &HashMap<PortId, PortId> {
        &self.output_to_default
    }

    pub fn pending_rename(&self) -> Option<PortId> {
        self.pending_rename
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn begin_load(&mut self) {
        self.load_state = LoadState::Loading;
    }

    pub fn end_load(&mut self) {
        self.load_state = LoadState::Ready;
    }

    /// Set by renames; cleared by whoever pushes the node's changes to dependents.
    pub fn requires_synchronization(&self) -> bool {
        self.requires_synchronization
    }

    pub fn clear_requires_synchronization(&mut self) {
        self.requires_synchronization = false;
    }
}
