//! Variables stored in a graph's parameter registry.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{QualifiedName, TypeDef, Value};

/// A typed name, optionally carrying an allocated literal value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    pub name: QualifiedName,
    pub ty: TypeDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Variable {
    pub fn new(name: QualifiedName, ty: TypeDef) -> Self {
        Self {
            name,
            ty,
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// True when a literal value of the variable's own type is present.
    pub fn is_data_allocated(&self) -> bool {
        self.value
            .as_ref()
            .map(|v| v.matches_type(&self.ty))
            .unwrap_or(false)
    }
}

/// Policy governing how a variable's fallback value is supplied when nothing upstream wrote it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefaultMode {
    /// Literal value edited in the parameters panel.
    #[default]
    Value,
    /// Computed by whatever is wired into the default pin.
    Custom,
    /// Read from another (bound) variable.
    Binding,
    /// Reading before any write is an error.
    FailIfPreviouslyNotSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VariableMetadata {
    #[serde(default)]
    pub description: String,
    /// Source variable for [`DefaultMode::Binding`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<QualifiedName>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl VariableMetadata {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Registry entry: the variable plus its default policy and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptVariable {
    pub variable: Variable,
    #[serde(default)]
    pub default_mode: DefaultMode,
    #[serde(default)]
    pub metadata: VariableMetadata,
    #[serde(default)]
    pub is_static_switch: bool,
}

impl ScriptVariable {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            default_mode: DefaultMode::default(),
            metadata: VariableMetadata::default(),
            is_static_switch: false,
        }
    }
}
