//! Reference-counted shared resources
//!
//! [`SharedResources`] owns every loaded payload of one type, keyed by name,
//! and hands out [`Proxy`] handles. Cloning a proxy bumps the entry's
//! reference count, dropping it decrements the count, and the entry is
//! released through its [`ResourceLoader`] once nobody references it.

pub mod proxy;
pub mod shared_resources;

pub use proxy::Proxy;
pub use shared_resources::{ResourceLoader, SharedResources};

use crate::assets::AssetError;
use thiserror::Error;

/// Shared resource errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Resources are keyed by name; an empty name never resolves
    #[error("Resource name is empty")]
    EmptyName,

    /// Every slot is referenced and no new resource may be created
    #[error("{kind} cache is full: {capacity} resources are referenced")]
    CapacityExceeded {
        /// Payload type of the cache
        kind: &'static str,
        /// Configured capacity
        capacity: usize,
    },

    /// The loader could not produce the resource
    #[error("Failed to load '{name}': {source}")]
    LoadFailed {
        /// Requested resource name
        name: String,
        /// Underlying asset error
        #[source]
        source: AssetError,
    },
}
