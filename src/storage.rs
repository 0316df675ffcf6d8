use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_STORAGE_KEY: &str = "workouts";

/// One serialized blob under one key. A save replaces the whole blob.
pub trait BlobStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, blob: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    key: String,
}

impl MemoryStore {
    pub fn new(key: &str) -> Self {
        Self {
            entries: HashMap::new(),
            key: key.to_string(),
        }
    }

    pub fn with_blob(key: &str, blob: &str) -> Self {
        let mut store = Self::new(key);
        store.entries.insert(key.to_string(), blob.to_string());
        store
    }
}

impl BlobStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.entries.get(&self.key).cloned())
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        self.entries.insert(self.key.clone(), blob.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.remove(&self.key);
        Ok(())
    }
}

/// Stores the blob as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{key}.json")),
        }
    }

    /// Use `path` as is.
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("creating dir: {}", dir.display()))?;

        // Write next to the target and rename over it, so readers only ever
        // see the previous or the new blob.
        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(blob.as_bytes())
            .context("writing workouts blob")?;
        tmp.as_file().sync_all().context("syncing workouts blob")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), bytes = blob.len(), "saved workouts");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}
