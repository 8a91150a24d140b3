//! QualifiedName parsing and formatting.
//!
//! Grammar (simple, engine-agnostic):
//!   namespace.namespace....name
//! - '.' separates segments
//! - every segment before the last is a namespace, the last one is the variable name
//!   Examples:
//!   "Module.Foo" -> namespaces=["Module"], name="Foo"
//!   "NPC.Wind.Strength" -> namespaces=["NPC","Wind"], name="Strength"
//!   "Foo" -> namespaces=[], name="Foo"
//!
//! Names are compared segment-wise; two names are equal when every segment matches.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known leading namespaces.
pub mod namespaces {
    pub const MODULE: &str = "Module";
    pub const LOCAL: &str = "Local";
    pub const ENGINE: &str = "Engine";
    pub const USER: &str = "User";
    pub const SYSTEM: &str = "System";
    pub const EMITTER: &str = "Emitter";
    pub const PARTICLES: &str = "Particles";
    pub const TRANSIENT: &str = "Transient";
    /// Shared parameter collections.
    pub const PARAMETER_COLLECTION: &str = "NPC";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualifiedNameError {
    #[error("empty name")]
    Empty,
    #[error("invalid qualified name '{0}': empty segment")]
    EmptySegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Namespace segments preceding the name (may be empty)
    pub namespaces: Vec<String>,
    /// Variable name (last segment)
    pub name: String,
}

impl QualifiedName {
    /// Construct a QualifiedName from components.
    pub fn new(namespaces: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            namespaces,
            name: name.into(),
        }
    }

    /// Parse a name string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, QualifiedNameError> {
        if s.trim().is_empty() {
            return Err(QualifiedNameError::Empty);
        }
        let mut parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|seg| seg.trim().is_empty()) {
            return Err(QualifiedNameError::EmptySegment(s.to_string()));
        }
        // split always yields at least one element
        let name = parts.pop().unwrap_or_default();
        Ok(QualifiedName {
            namespaces: parts.into_iter().map(str::to_string).collect(),
            name: name.to_string(),
        })
    }

    /// Iterate over all namespace segments.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|s| s.as_str())
    }

    /// Return the leading namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespaces.first().map(|s| s.as_str())
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespaces.is_empty()
    }

    /// True when the leading namespace equals `namespace`.
    pub fn is_in_namespace(&self, namespace: &str) -> bool {
        self.namespace() == Some(namespace)
    }

    /// Return the last segment of the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix `namespace` in front of the existing segments.
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let mut namespaces = Vec::with_capacity(self.namespaces.len() + 1);
        namespaces.push(namespace.to_string());
        namespaces.extend(self.namespaces.iter().cloned());
        QualifiedName::new(namespaces, self.name.clone())
    }

    /// Return a name not contained in `taken`, appending `_1`, `_2`, ... to the last segment
    /// until it is free.
    pub fn make_unique<'a>(&self, taken: impl IntoIterator<Item = &'a QualifiedName>) -> Self {
        let taken: Vec<&QualifiedName> = taken.into_iter().collect();
        if !taken.contains(&self) {
            return self.clone();
        }
        let mut suffix = 1usize;
        loop {
            let candidate =
                QualifiedName::new(self.namespaces.clone(), format!("{}_{}", self.name, suffix));
            if !taken.contains(&&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            f.write_str(ns)?;
            f.write_str(".")?;
        }
        f.write_str(&self.name)
    }
}

impl FromStr for QualifiedName {
    type Err = QualifiedNameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualifiedName::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for QualifiedName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D>(deserializer: D) -> Result<QualifiedName, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QualifiedName::parse(&s).map_err(de::Error::custom)
    }
}
