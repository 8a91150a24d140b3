//! Graph-wide variable registry.
//!
//! The registry is owned by the [`Graph`](crate::graph::Graph) and shared by every node through an
//! explicitly passed [`GraphContext`](crate::graph::GraphContext). Additions are visible to the
//! next query immediately.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use sparkfx_api_core::{
    DefaultMode, QualifiedName, ScriptVariable, Value, Variable, VariableMetadata,
};

use crate::error::GraphError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableRegistry {
    #[serde(default)]
    variables: HashMap<QualifiedName, ScriptVariable>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_variable(&self, name: &QualifiedName) -> Option<&Variable> {
        self.variables.get(name).map(|entry| &entry.variable)
    }

    pub fn get_script_variable(&self, name: &QualifiedName) -> Option<&ScriptVariable> {
        self.variables.get(name)
    }

    pub fn get_default_mode(&self, name: &QualifiedName) -> Option<DefaultMode> {
        self.variables.get(name).map(|entry| entry.default_mode)
    }

    pub fn get_metadata(&self, name: &QualifiedName) -> Option<&VariableMetadata> {
        self.variables.get(name).map(|entry| &entry.metadata)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.variables.contains_key(name)
    }

    /// Register `variable` unless a variable of that name already exists. Returns `true` when the
    /// registry changed.
    pub fn add_parameter(&mut self, variable: Variable, is_static_switch: bool) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }
        log::debug!("registering parameter {} ({})", variable.name, variable.ty);
        let mut entry = ScriptVariable::new(variable);
        entry.is_static_switch = is_static_switch;
        self.variables.insert(entry.variable.name.clone(), entry);
        true
    }

    /// Insert or replace a fully described entry.
    pub fn insert(&mut self, entry: ScriptVariable) -> Option<ScriptVariable> {
        self.variables.insert(entry.variable.name.clone(), entry)
    }

    pub fn set_default_mode(
        &mut self,
        name: &QualifiedName,
        mode: DefaultMode,
    ) -> Result<(), GraphError> {
        let entry = self
            .variables
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownVariable(name.clone()))?;
        entry.default_mode = mode;
        Ok(())
    }

    /// Store the literal used by [`DefaultMode::Value`]. The value must match the variable type.
    pub fn set_default_value(&mut self, name: &QualifiedName, value: Value) -> Result<(), GraphError> {
        let entry = self
            .variables
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownVariable(name.clone()))?;
        if !value.matches_type(&entry.variable.ty) {
            return Err(GraphError::TypeMismatch {
                expected: entry.variable.ty.clone(),
                actual: value.type_def(),
            });
        }
        entry.variable.value = Some(value);
        Ok(())
    }

    pub fn set_metadata(
        &mut self,
        name: &QualifiedName,
        metadata: VariableMetadata,
    ) -> Result<(), GraphError> {
        let entry = self
            .variables
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownVariable(name.clone()))?;
        entry.metadata = metadata;
        Ok(())
    }

    pub fn remove(&mut self, name: &QualifiedName) -> Option<ScriptVariable> {
        self.variables.remove(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptVariable> {
        self.variables.values()
    }
}
