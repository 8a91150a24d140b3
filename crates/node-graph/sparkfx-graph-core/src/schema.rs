//! Type/schema translation and the node signature registry.
//!
//! [`TypeTranslator`] is the seam through which nodes turn ports into typed variables, pick
//! literal defaults and find shared parameter collections. [`GraphSchema`] is the implementation
//! stored on every [`Graph`](crate::graph::Graph).

use serde::{Deserialize, Serialize};
use sparkfx_api_core::{namespaces, QualifiedName, TypeDef, Value, Variable};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::Port;

/// Editor pin category a type maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Type,
    StaticType,
    Enum,
    StaticEnum,
    Class,
    Wildcard,
}

impl PortKind {
    /// Kinds that carry a value the compiler can lower.
    pub fn is_compilable(&self) -> bool {
        matches!(
            self,
            PortKind::Type | PortKind::StaticType | PortKind::Enum | PortKind::StaticEnum
        )
    }
}

/// Content hash of a shared parameter collection, used for build-cache invalidation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompileHash(pub u64);

impl fmt::Display for CompileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A named set of variables shared by many graphs, addressed as `NPC.<namespace>.<name>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterCollection {
    pub path: String,
    pub namespace: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl ParameterCollection {
    pub fn new(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            variables: Vec::new(),
        }
    }

    pub fn with_variable(mut self, name: &str, ty: TypeDef) -> Self {
        let name = QualifiedName::new(
            vec![
                namespaces::PARAMETER_COLLECTION.to_string(),
                self.namespace.clone(),
            ],
            name,
        );
        self.variables.push(Variable::new(name, ty));
        self
    }

    /// True when `name` is addressed into this collection.
    pub fn owns(&self, name: &QualifiedName) -> bool {
        name.namespaces.len() == 2
            && name.is_in_namespace(namespaces::PARAMETER_COLLECTION)
            && name.namespaces[1] == self.namespace
    }

    /// Stable hash of the collection's path and declared variables. Variables are sorted first so
    /// declaration order does not change the hash.
    pub fn compile_hash(&self) -> CompileHash {
        let mut entries: Vec<(String, String)> = self
            .variables
            .iter()
            .map(|v| (v.name.to_string(), v.ty.to_string()))
            .collect();
        entries.sort();
        let mut hasher = DefaultHasher::new();
        self.path.hash(&mut hasher);
        self.namespace.hash(&mut hasher);
        entries.hash(&mut hasher);
        CompileHash(hasher.finish())
    }
}

pub trait TypeTranslator {
    fn port_kind(&self, ty: &TypeDef) -> PortKind;

    /// Interpret a port as a variable. `None` when the port name is not a valid qualified name.
    /// With `needs_value`, the variable carries the port's literal (or the type's zero value).
    fn port_to_variable(&self, port: &Port, needs_value: bool) -> Option<Variable>;

    /// Literal text for a default pin, when the type has a literal form.
    fn try_default_value_text(&self, variable: &Variable) -> Option<String>;

    /// Engine-owned parameters are written by the runtime; their default pins are disabled.
    fn is_engine_parameter(&self, variable: &Variable) -> bool;

    fn parameter_collection_for(&self, variable: &Variable) -> Option<&ParameterCollection>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSchema {
    #[serde(default)]
    pub collections: Vec<ParameterCollection>,
}

impl GraphSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: ParameterCollection) -> Self {
        self.collections.push(collection);
        self
    }
}

impl TypeTranslator for GraphSchema {
    fn port_kind(&self, ty: &TypeDef) -> PortKind {
        match ty {
            TypeDef::StaticBool | TypeDef::StaticInt => PortKind::StaticType,
            TypeDef::Enum(_) => PortKind::Enum,
            TypeDef::StaticEnum(_) => PortKind::StaticEnum,
            TypeDef::DataInterface(_) => PortKind::Class,
            TypeDef::Wildcard => PortKind::Wildcard,
            TypeDef::Float
            | TypeDef::Int
            | TypeDef::Bool
            | TypeDef::Vec2
            | TypeDef::Vec3
            | TypeDef::Vec4
            | TypeDef::Color
            | TypeDef::Quat
            | TypeDef::ParameterMap => PortKind::Type,
        }
    }

    fn port_to_variable(&self, port: &Port, needs_value: bool) -> Option<Variable> {
        let name = QualifiedName::parse(&port.name).ok()?;
        let mut variable = Variable::new(name, port.ty.clone());
        if needs_value {
            variable.value = port
                .default_value
                .as_deref()
                .and_then(|text| Value::parse_default_text(&port.ty, text))
                .or_else(|| port.ty.zero_value());
        }
        Some(variable)
    }

    fn try_default_value_text(&self, variable: &Variable) -> Option<String> {
        variable
            .value
            .clone()
            .filter(|v| v.matches_type(&variable.ty))
            .or_else(|| variable.ty.zero_value())
            .map(|v| v.to_default_text())
    }

    fn is_engine_parameter(&self, variable: &Variable) -> bool {
        variable.name.is_in_namespace(namespaces::ENGINE)
    }

    fn parameter_collection_for(&self, variable: &Variable) -> Option<&ParameterCollection> {
        self.collections.iter().find(|c| c.owns(&variable.name))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    MapInput,
    MapSet,
    MapGet,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub doc: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSignature {
    pub type_id: NodeType,
    pub name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

/// Static description of the node kinds, used for titles and hover text.
pub fn registry() -> Vec<NodeSignature> {
    vec![
        NodeSignature {
            type_id: NodeType::MapInput,
            name: "Input Map",
            category: "Parameter Map",
            inputs: vec![],
            outputs: vec![PortSpec {
                id: "Map",
                label: "Map",
                doc: "A fresh parameter map entering the graph.",
            }],
        },
        NodeSignature {
            type_id: NodeType::MapSet,
            name: "Map Set",
            category: "Parameter Map",
            inputs: vec![PortSpec {
                id: "Source",
                label: "Source",
                doc: "The parameter map the values are written into.",
            }],
            outputs: vec![PortSpec {
                id: "Dest",
                label: "Dest",
                doc: "The parameter map after the writes.",
            }],
        },
        NodeSignature {
            type_id: NodeType::MapGet,
            name: "Map Get",
            category: "Parameter Map",
            inputs: vec![PortSpec {
                id: "Source",
                label: "Source",
                doc: "The source parameter map where we pull the values from.",
            }],
            outputs: vec![PortSpec {
                id: "Add",
                label: "Add",
                doc: "Request a new variable from the parameter map.",
            }],
        },
    ]
}

pub fn signature(type_id: NodeType) -> Option<NodeSignature> {
    registry().into_iter().find(|sig| sig.type_id == type_id)
}
