//! Foundation module - Core utilities and types
//!
//! Small building blocks shared by the resource, render and scene layers:
//! - Math aliases and the instance transform
//! - Slot arena aliases backing the shared resource caches
//! - Logging setup

pub mod math;
pub mod collections;
pub mod logging;
