//! Logging utilities
//!
//! The crate logs through the `log` facade. Applications (and tests that want
//! output) install a subscriber through [`init`] or [`try_init`].

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
///
/// Panics if a logger is already installed; use [`try_init`] from tests.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already installed logger
pub fn try_init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
