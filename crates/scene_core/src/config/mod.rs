//! Configuration system
//!
//! Cache capacities are read once at startup from TOML or RON files through
//! the [`Config`] trait and handed to [`crate::scene::SceneContext`].

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Limits for one shared resource cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of distinct live resources
    pub capacity: usize,

    /// Keep unreferenced resources loaded until their slot is needed
    pub keep_unused: bool,
}

impl CacheConfig {
    /// Cache limited to `capacity` entries, releasing resources as soon as
    /// they become unreferenced
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            keep_unused: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

/// Configuration for the three resource caches of a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Geometry (mesh shared data) cache
    pub meshes: CacheConfig,

    /// Shader cache
    pub shaders: CacheConfig,

    /// Texture cache
    pub textures: CacheConfig,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            meshes: CacheConfig::with_capacity(64),
            shaders: CacheConfig::with_capacity(32),
            textures: CacheConfig::with_capacity(128),
        }
    }
}

impl Config for ResourceConfig {}
