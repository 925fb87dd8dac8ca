//! Host document access
//!
//! The design tool hands figsync its document as a JSON file:
//!
//! ```json
//! {
//!   "variables": [...],
//!   "variableCollections": [...],
//!   "selection": [...],
//!   "pluginData": { "profiles": "[...]" }
//! }
//! ```
//!
//! `DocumentFile` is both the read-only variable source for snapshots and the
//! shared storage tier: plugin data lives inside the document, so the profile
//! travels with it. Writes only touch `pluginData` and keep every other key.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::snapshot::{Variable, VariableCollection, VariableSource};
use crate::core::storage::StorageTier;
use crate::error::{FigsyncError, Result};

const PLUGIN_DATA_KEY: &str = "pluginData";
const VARIABLES_KEY: &str = "variables";
const COLLECTIONS_KEY: &str = "variableCollections";
const SELECTION_KEY: &str = "selection";

/// A host document stored as JSON on disk
pub struct DocumentFile {
    path: PathBuf,
    /// Serializes read-modify-write cycles on plugin data; readers rely on
    /// the atomic replace in `write_root` instead
    write_lock: Mutex<()>,
}

impl DocumentFile {
    /// Open a document. The file does not need to exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document_error(&self, reason: impl ToString) -> FigsyncError {
        FigsyncError::Document {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn read_root(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "document missing, treating as empty");
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.document_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&contents).map_err(|e| self.document_error(e))? {
            Value::Object(map) => Ok(map),
            _ => Err(self.document_error("top level is not a JSON object")),
        }
    }

    /// Replace the document in one rename, so readers see either the old or
    /// the new contents and never a partly written file
    fn write_root(&self, root: Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let contents = serde_json::to_string_pretty(&Value::Object(root))?;
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| self.document_error(e.error))?;
        Ok(())
    }

    fn read_array<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.read_root()?.remove(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| self.document_error(format!("invalid '{}': {}", key, e))),
        }
    }

    fn update_plugin_data<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| FigsyncError::Storage("document lock poisoned".into()))?;

        let mut root = self.read_root()?;
        let entry = root
            .entry(PLUGIN_DATA_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(data) = entry {
            update(data);
        }

        self.write_root(root)
    }
}

impl VariableSource for DocumentFile {
    fn local_variables(&self) -> Result<Vec<Variable>> {
        self.read_array(VARIABLES_KEY)
    }

    fn local_collections(&self) -> Result<Vec<VariableCollection>> {
        self.read_array(COLLECTIONS_KEY)
    }

    fn selection(&self) -> Result<Value> {
        Ok(self
            .read_root()?
            .remove(SELECTION_KEY)
            .unwrap_or(Value::Null))
    }
}

impl StorageTier for DocumentFile {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .read_root()?
            .remove(PLUGIN_DATA_KEY)
            .and_then(|data| match data {
                Value::Object(mut map) => map.remove(key),
                _ => None,
            });

        // Plugin data is string-only; an empty string means unset
        Ok(match value {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update_plugin_data(|data| {
            data.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.update_plugin_data(|data| {
            data.remove(key);
        })
    }
}
