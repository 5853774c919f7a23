//! Backend implementations for the render module
//!
//! GPU backends live with the application shell. The crate ships a recording
//! backend for headless runs and tests.

/// Backend that records every call as a [`recording::RenderCommand`]
pub mod recording;

pub use recording::{RecordingBackend, RenderCommand, TrackedState};
