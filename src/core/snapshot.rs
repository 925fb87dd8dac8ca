//! Variable snapshot export
//!
//! Reads the document's local variables and collections and serializes them
//! into the JSON artifact that gets published. The serializer is driven by
//! the structs below: keys come out in declaration order and keyed maps are
//! `BTreeMap`s, so the same document state always produces the same bytes.
//! Publishing relies on that to skip commits when nothing changed.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Read-only access to the host document's variables
pub trait VariableSource: Send + Sync {
    /// All local variables, in document order
    fn local_variables(&self) -> Result<Vec<Variable>>;

    /// All local variable collections, in document order
    fn local_collections(&self) -> Result<Vec<VariableCollection>>;

    /// Current selection in the document, `null` when the host has none
    fn selection(&self) -> Result<Value> {
        Ok(Value::Null)
    }
}

/// The value type a variable resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedType {
    Boolean,
    Float,
    String,
    Color,
}

/// RGBA colour with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

/// Reference to another variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableAlias {
    /// Always `VARIABLE_ALIAS`
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Value of a variable in one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Alias(VariableAlias),
    Color(Rgba),
    Boolean(bool),
    Float(f64),
    String(String),
}

/// A single design variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub key: String,
    pub variable_collection_id: String,
    pub resolved_type: ResolvedType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden_from_publishing: bool,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub code_syntax: BTreeMap<String, String>,
    #[serde(default)]
    pub values_by_mode: BTreeMap<String, VariableValue>,
}

/// A mode of a collection (e.g. "Light", "Dark")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub mode_id: String,
    pub name: String,
}

/// A group of variables sharing the same modes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub default_mode_id: String,
    #[serde(default)]
    pub hidden_from_publishing: bool,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub variable_ids: Vec<String>,
}

/// Exported variable data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub variables: Vec<Variable>,
    pub variable_collections: Vec<VariableCollection>,
}

impl Snapshot {
    /// Canonical JSON rendering (two-space indent, fixed key order)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds snapshots from a variable source
pub struct SnapshotExporter;

impl SnapshotExporter {
    /// Export the current state of the source
    ///
    /// Variables pointing at a collection that is not part of the local set
    /// are dropped.
    pub fn export(source: &dyn VariableSource) -> Result<Snapshot> {
        let variable_collections = source.local_collections()?;
        let known: HashSet<&str> = variable_collections
            .iter()
            .map(|c| c.id.as_str())
            .collect();

        let all = source.local_variables()?;
        let total = all.len();
        let variables: Vec<Variable> = all
            .into_iter()
            .filter(|v| known.contains(v.variable_collection_id.as_str()))
            .collect();

        if variables.len() != total {
            debug!(
                dropped = total - variables.len(),
                "skipped variables referencing unknown collections"
            );
        }

        Ok(Snapshot {
            variables,
            variable_collections,
        })
    }

    /// Export and render in one step
    pub fn export_json(source: &dyn VariableSource) -> Result<String> {
        Self::export(source)?.to_json()
    }
}
