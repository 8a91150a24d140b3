//! Type definitions carried by ports and variables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Value;

/// The TypeDef expresses the value type of a port or variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "id", content = "data")]
pub enum TypeDef {
    // Primitives
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Color,
    Quat,

    /// Compile-time constants, resolved before lowering.
    StaticBool,
    StaticInt,

    /// Named enumeration; values are entry indices.
    Enum(String),
    StaticEnum(String),

    /// The parameter map itself.
    ParameterMap,

    /// Opaque object reference (e.g. a curve or mesh sampler); carries no literal value.
    DataInterface(String),

    /// Untyped placeholder used by add pins.
    Wildcard,
}

impl TypeDef {
    pub fn is_data_interface(&self) -> bool {
        matches!(self, TypeDef::DataInterface(_))
    }

    pub fn is_parameter_map(&self) -> bool {
        matches!(self, TypeDef::ParameterMap)
    }

    pub fn is_static(&self) -> bool {
        matches!(
            self,
            TypeDef::StaticBool | TypeDef::StaticInt | TypeDef::StaticEnum(_)
        )
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeDef::Enum(_) | TypeDef::StaticEnum(_))
    }

    /// Zero value used to seed literal defaults. `None` for types without a literal form.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            TypeDef::Float => Some(Value::Float(0.0)),
            TypeDef::Int | TypeDef::StaticInt => Some(Value::Int(0)),
            TypeDef::Bool | TypeDef::StaticBool => Some(Value::Bool(false)),
            TypeDef::Vec2 => Some(Value::Vec2([0.0; 2])),
            TypeDef::Vec3 => Some(Value::Vec3([0.0; 3])),
            TypeDef::Vec4 => Some(Value::Vec4([0.0; 4])),
            TypeDef::Color => Some(Value::Color([1.0; 4])),
            TypeDef::Quat => Some(Value::Quat([0.0, 0.0, 0.0, 1.0])),
            TypeDef::Enum(name) | TypeDef::StaticEnum(name) => Some(Value::Enum(name.clone(), 0)),
            TypeDef::ParameterMap | TypeDef::DataInterface(_) | TypeDef::Wildcard => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, TypeDef::Wildcard)
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDef::Float => f.write_str("float"),
            TypeDef::Int => f.write_str("int32"),
            TypeDef::Bool => f.write_str("bool"),
            TypeDef::Vec2 => f.write_str("vector2"),
            TypeDef::Vec3 => f.write_str("vector"),
            TypeDef::Vec4 => f.write_str("vector4"),
            TypeDef::Color => f.write_str("color"),
            TypeDef::Quat => f.write_str("quat"),
            TypeDef::StaticBool => f.write_str("static bool"),
            TypeDef::StaticInt => f.write_str("static int32"),
            TypeDef::Enum(name) => f.write_str(name),
            TypeDef::StaticEnum(name) => write!(f, "static {name}"),
            TypeDef::ParameterMap => f.write_str("parameter map"),
            TypeDef::DataInterface(name) => f.write_str(name),
            TypeDef::Wildcard => f.write_str("wildcard"),
        }
    }
}
