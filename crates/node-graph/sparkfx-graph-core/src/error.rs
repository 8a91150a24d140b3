use sparkfx_api_core::{QualifiedName, TypeDef};
use thiserror::Error;

use crate::types::{NodeId, PortId};

/// Errors produced by graph edits. An edit that returns an error has not been applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid pin name: {reason}")]
    InvalidPinName { reason: String },
    #[error("cannot use name '{name}': {reason}")]
    NameCollision { name: String, reason: String },
    #[error("unknown port {0}")]
    UnknownPort(PortId),
    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),
    #[error("node '{0}' already exists")]
    DuplicateNode(NodeId),
    #[error("node '{0}' is not a parameter map get node")]
    NotAMapGetNode(NodeId),
    #[error("unknown variable '{0}'")]
    UnknownVariable(QualifiedName),
    #[error("port {0} is not an editable output")]
    NotAnOutput(PortId),
    #[error("port {0} is a fixed pin and cannot be removed")]
    FixedPin(PortId),
    #[error("cannot connect {from} to {to}: {reason}")]
    InvalidConnection {
        from: PortId,
        to: PortId,
        reason: String,
    },
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: TypeDef, actual: TypeDef },
    #[error("cycle detected in graph")]
    Cycle,
    #[error("graph json: {0}")]
    Json(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Json(err.to_string())
    }
}
