//! Value: literal instances that conform to a TypeDef.
//! All numeric types use f32, integers i32.
//!
//! Default pins store their literal as text. The text form is comma separated components using
//! Rust's float debug formatting, e.g. `1.0,2.0,3.0` for a vector or `true` for a bool.

use serde::{Deserialize, Serialize};

use crate::TypeDef;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Signed integer (also static ints)
    Int(i32),

    /// Boolean (also static bools)
    Bool(bool),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// RGBA color (linear by convention)
    Color([f32; 4]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// Enum type name and entry index
    Enum(String, i32),
}

impl Value {
    /// Dynamic (non-static) type of this literal.
    pub fn type_def(&self) -> TypeDef {
        match self {
            Value::Float(_) => TypeDef::Float,
            Value::Int(_) => TypeDef::Int,
            Value::Bool(_) => TypeDef::Bool,
            Value::Vec2(_) => TypeDef::Vec2,
            Value::Vec3(_) => TypeDef::Vec3,
            Value::Vec4(_) => TypeDef::Vec4,
            Value::Color(_) => TypeDef::Color,
            Value::Quat(_) => TypeDef::Quat,
            Value::Enum(name, _) => TypeDef::Enum(name.clone()),
        }
    }

    /// Whether this literal can be stored in a port or variable of type `ty`.
    pub fn matches_type(&self, ty: &TypeDef) -> bool {
        match (self, ty) {
            (Value::Float(_), TypeDef::Float) => true,
            (Value::Int(_), TypeDef::Int | TypeDef::StaticInt) => true,
            (Value::Bool(_), TypeDef::Bool | TypeDef::StaticBool) => true,
            (Value::Vec2(_), TypeDef::Vec2) => true,
            (Value::Vec3(_), TypeDef::Vec3) => true,
            (Value::Vec4(_), TypeDef::Vec4) => true,
            (Value::Color(_), TypeDef::Color) => true,
            (Value::Quat(_), TypeDef::Quat) => true,
            (Value::Enum(name, _), TypeDef::Enum(ty_name) | TypeDef::StaticEnum(ty_name)) => {
                name == ty_name
            }
            _ => false,
        }
    }

    /// Render the literal in default-pin text form.
    pub fn to_default_text(&self) -> String {
        fn join(components: &[f32]) -> String {
            components
                .iter()
                .map(|c| format!("{c:?}"))
                .collect::<Vec<_>>()
                .join(",")
        }
        match self {
            Value::Float(v) => format!("{v:?}"),
            Value::Int(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Vec2(v) => join(v),
            Value::Vec3(v) => join(v),
            Value::Vec4(v) | Value::Color(v) | Value::Quat(v) => join(v),
            Value::Enum(_, index) => index.to_string(),
        }
    }

    /// Parse default-pin text for a port of type `ty`. Returns `None` when the text does not
    /// describe a value of that type.
    pub fn parse_default_text(ty: &TypeDef, text: &str) -> Option<Value> {
        fn floats<const N: usize>(text: &str) -> Option<[f32; N]> {
            let parts: Vec<&str> = text.split(',').map(str::trim).collect();
            if parts.len() != N {
                return None;
            }
            let mut out = [0.0f32; N];
            for (slot, part) in out.iter_mut().zip(parts) {
                *slot = part.parse().ok()?;
            }
            Some(out)
        }
        let text = text.trim();
        match ty {
            TypeDef::Float => text.parse().ok().map(Value::Float),
            TypeDef::Int | TypeDef::StaticInt => text.parse().ok().map(Value::Int),
            TypeDef::Bool | TypeDef::StaticBool => text.parse().ok().map(Value::Bool),
            TypeDef::Vec2 => floats::<2>(text).map(Value::Vec2),
            TypeDef::Vec3 => floats::<3>(text).map(Value::Vec3),
            TypeDef::Vec4 => floats::<4>(text).map(Value::Vec4),
            TypeDef::Color => floats::<4>(text).map(Value::Color),
            TypeDef::Quat => floats::<4>(text).map(Value::Quat),
            TypeDef::Enum(name) | TypeDef::StaticEnum(name) => {
                text.parse().ok().map(|index| Value::Enum(name.clone(), index))
            }
            TypeDef::ParameterMap | TypeDef::DataInterface(_) | TypeDef::Wildcard => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }
}
