//! Asset management system
//!
//! Raw bytes reach the engine through a [`ResourceProvider`]; the loaders in
//! this module turn them into the payloads held by the shared resource caches.
//! Only [`FileResourceProvider`] touches the filesystem.

pub mod binary_reader;
pub mod pmd_loader;
pub mod shader_loader;
pub mod texture_loader;

pub use binary_reader::{MemoryReader, ReadError};
pub use pmd_loader::{PmdError, PmdLoader};
pub use shader_loader::ShaderLoader;
pub use texture_loader::TextureLoader;

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Source of named byte buffers
pub trait ResourceProvider {
    /// Read the whole resource called `name`
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError>;

    /// Whether `name` can be read
    fn has(&self, name: &str) -> bool {
        self.read(name).is_ok()
    }
}

/// Provider serving buffers registered in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryResourceProvider {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryResourceProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a buffer
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), data.into());
    }

    /// Builder form of [`Self::insert`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Drop a registered buffer
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.entries.remove(name)
    }
}

impl ResourceProvider for MemoryResourceProvider {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Provider reading files relative to a list of search paths
#[derive(Debug, Default, Clone)]
pub struct FileResourceProvider {
    search_paths: Vec<PathBuf>,
}

impl FileResourceProvider {
    /// Create a provider searching `search_paths` in order
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a search path
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        // Try each search path, then the name as given
        self.search_paths
            .iter()
            .map(|base| base.join(name))
            .find(|candidate| candidate.is_file())
            .or_else(|| {
                let direct = PathBuf::from(name);
                direct.is_file().then_some(direct)
            })
    }
}

impl ResourceProvider for FileResourceProvider {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        log::debug!("Reading resource '{}' from {:?}", name, path);
        Ok(std::fs::read(path)?)
    }

    fn has(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed geometry file
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] PmdError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
