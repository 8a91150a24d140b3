//! sparkfx-api-core: naming, type and value vocabulary shared by sparkfx graph crates

pub mod qualified_name;
pub mod type_def;
pub mod value;
pub mod variable;

pub use qualified_name::{namespaces, QualifiedName, QualifiedNameError};
pub use type_def::TypeDef;
pub use value::Value;
pub use variable::{DefaultMode, ScriptVariable, Variable, VariableMetadata};
