use serde::{Deserialize, Serialize};
use sparkfx_api_core::TypeDef;
use std::fmt;
use uuid::Uuid;

pub type NodeId = String;

pub const ADD_PIN_NAME: &str = "Add";

/// Stable port identity. Generated once, persisted with the graph and never reused, so it
/// survives renames and reorders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PortId(pub Uuid);

impl PortId {
    pub fn new() -> Self {
        PortId(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        PortId(Uuid::nil())
    }

    /// Legacy data may carry nil ids; those are replaced before being mapped.
    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }
}

impl Default for PortId {
    fn default() -> Self {
        PortId::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PortFlags {
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub not_connectable: bool,
    #[serde(default)]
    pub default_value_read_only: bool,
    #[serde(default)]
    pub default_value_ignored: bool,
    #[serde(default)]
    pub orphaned: bool,
    #[serde(default)]
    pub add_pin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Port {
    #[serde(default)]
    pub id: PortId,
    pub direction: Direction,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub ty: TypeDef,
    #[serde(default)]
    pub flags: PortFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Literal produced when the pin was created, used to detect user edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autogenerated_default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub linked_to: Vec<PortId>,
}

impl Port {
    pub fn new(direction: Direction, name: impl Into<String>, ty: TypeDef) -> Self {
        Port {
            id: PortId::new(),
            direction,
            name: name.into(),
            friendly_name: None,
            ty,
            flags: PortFlags::default(),
            default_value: None,
            autogenerated_default: None,
            tooltip: None,
            linked_to: Vec::new(),
        }
    }

    pub fn input(name: impl Into<String>, ty: TypeDef) -> Self {
        Port::new(Direction::Input, name, ty)
    }

    pub fn output(name: impl Into<String>, ty: TypeDef) -> Self {
        Port::new(Direction::Output, name, ty)
    }

    /// Sentinel output that the editor renders as "add a new value".
    pub fn add_pin() -> Self {
        let mut port = Port::output(ADD_PIN_NAME, TypeDef::Wildcard);
        port.flags.add_pin = true;
        port
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    pub fn is_add_pin(&self) -> bool {
        self.flags.add_pin
    }

    pub fn is_linked(&self) -> bool {
        !self.linked_to.is_empty()
    }

    /// Name shown in the editor: the friendly name when set, else the port name.
    pub fn display_name(&self) -> &str {
        match &self.friendly_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}
