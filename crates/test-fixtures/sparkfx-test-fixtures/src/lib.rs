use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Result<Manifest, String>> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).map_err(|err| format!("fixtures manifest should parse: {err}"))
});

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "node-graphs")]
    node_graphs: HashMap<String, NodeGraphEntry>,
}

#[derive(Debug, Deserialize)]
struct NodeGraphEntry {
    graph: String,
    /// Facts the graph must satisfy once loaded.
    #[serde(default)]
    expected: Option<String>,
}

fn manifest() -> Result<&'static Manifest> {
    (*MANIFEST).as_ref().map_err(|err| anyhow!("{err}"))
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod node_graphs {
    use super::*;

    fn entry(name: &str) -> Result<&'static NodeGraphEntry> {
        lookup(&manifest()?.node_graphs, "node graph", name)
    }

    pub fn keys() -> Result<Vec<String>> {
        let mut keys: Vec<String> = manifest()?.node_graphs.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn graph_json(name: &str) -> Result<String> {
        read_to_string(&entry(name)?.graph)
    }

    pub fn graph<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(&entry(name)?.graph)
    }

    pub fn expected<T: DeserializeOwned>(name: &str) -> Result<Option<T>> {
        match &entry(name)?.expected {
            Some(expected) => super::load_json(expected).map(Some),
            None => Ok(None),
        }
    }

    pub fn graph_path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(&entry(name)?.graph))
    }
}
