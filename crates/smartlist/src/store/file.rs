//! JSON documents on disk, one file per key.
//!
//! Layout: `<root>/<namespace>/<key>.json`. Writes go to a temp file that
//! is then renamed over the target.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{validate_key, DocumentStore};
use crate::error::Result;

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
        validate_key(namespace)?;
        Ok(self.root.join(namespace))
    }

    fn document_path(&self, namespace: &str, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self
            .namespace_dir(namespace)?
            .join(format!("{key}.{DOCUMENT_EXTENSION}")))
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        let path = self.document_path(namespace, key)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn put(&self, namespace: &str, key: &str, document: Value) -> Result<()> {
        let path = self.document_path(namespace, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&document)?)?;
        fs::rename(&tmp_path, &path)?;

        log::debug!("wrote document {}", path.display());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let path = self.document_path(namespace, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let dir = self.namespace_dir(namespace)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
