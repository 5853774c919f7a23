//! Slot arena types backing the shared resource caches

pub use slotmap::{SlotMap, DefaultKey};

/// Generational arena; a removed slot's key never aliases its successor
pub type SlotArena<T> = SlotMap<DefaultKey, T>;

/// Key into a [`SlotArena`]
pub type SlotKey = DefaultKey;
