//! Cheap, copyable handle to a shared resource
//!
//! A proxy either points at a [`SharedResources`](super::SharedResources)
//! entry or wraps a standalone value. A default proxy is invalid; access goes
//! through [`Proxy::get`], which returns `None` instead of a sentinel.

use super::shared_resources::{release_slot, CacheInner};
use crate::foundation::collections::SlotKey;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

enum Backing<T> {
    /// Value not owned by any cache
    Local(Rc<T>),
    /// Entry of a shared resource cache
    Cached {
        cache: Weak<RefCell<CacheInner<T>>>,
        key: SlotKey,
        name: Rc<str>,
        payload: Rc<T>,
    },
}

/// Reference-counted handle to a resource
pub struct Proxy<T> {
    backing: Option<Backing<T>>,
}

impl<T> Proxy<T> {
    /// Wrap a standalone value
    pub fn new(value: T) -> Self {
        Self {
            backing: Some(Backing::Local(Rc::new(value))),
        }
    }

    /// Handle pointing at nothing
    pub fn invalid() -> Self {
        Self { backing: None }
    }

    pub(crate) fn cached(
        cache: Weak<RefCell<CacheInner<T>>>,
        key: SlotKey,
        name: Rc<str>,
        payload: Rc<T>,
    ) -> Self {
        Self {
            backing: Some(Backing::Cached { cache, key, name, payload }),
        }
    }

    /// Whether the backing data is live
    pub fn is_valid(&self) -> bool {
        match &self.backing {
            None => false,
            Some(Backing::Local(_)) => true,
            Some(Backing::Cached { cache, .. }) => cache.strong_count() > 0,
        }
    }

    /// Borrow the resource, `None` when the proxy is invalid
    pub fn get(&self) -> Option<&T> {
        if !self.is_valid() {
            return None;
        }

        match self.backing.as_ref()? {
            Backing::Local(value) => Some(value),
            Backing::Cached { payload, .. } => Some(payload),
        }
    }

    /// Cache key of the resource, `None` for standalone values
    pub fn name(&self) -> Option<&str> {
        match &self.backing {
            Some(Backing::Cached { name, .. }) if self.is_valid() => Some(name),
            _ => None,
        }
    }

    /// Number of live references to the backing data
    pub fn ref_count(&self) -> usize {
        match &self.backing {
            None => 0,
            Some(Backing::Local(value)) => Rc::strong_count(value),
            Some(Backing::Cached { cache, key, .. }) => cache
                .upgrade()
                .and_then(|cache| {
                    let inner = cache.try_borrow().ok()?;
                    inner.entry(*key).map(|entry| entry.ref_count)
                })
                .unwrap_or(0),
        }
    }

    /// Release the reference and reset to invalid
    pub fn free(&mut self) {
        match self.backing.take() {
            Some(Backing::Cached { cache, key, payload, .. }) => {
                // The cache must hold the last payload reference to release it
                drop(payload);
                if let Some(cache) = cache.upgrade() {
                    release_slot(&cache, key);
                }
            }
            Some(Backing::Local(_)) | None => {}
        }
    }

    pub(crate) fn belongs_to(&self, cache: &Rc<RefCell<CacheInner<T>>>) -> bool {
        match &self.backing {
            Some(Backing::Cached { cache: weak, .. }) => std::ptr::eq(weak.as_ptr(), Rc::as_ptr(cache)),
            _ => false,
        }
    }
}

impl<T> Default for Proxy<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        match &self.backing {
            None => Self::invalid(),
            Some(Backing::Local(value)) => Self {
                backing: Some(Backing::Local(Rc::clone(value))),
            },
            Some(Backing::Cached { cache, key, name, payload }) => {
                let retained = cache
                    .upgrade()
                    .and_then(|strong| strong.try_borrow_mut().ok().map(|mut inner| inner.retain(*key)))
                    .unwrap_or(false);

                if retained {
                    Self::cached(Weak::clone(cache), *key, Rc::clone(name), Rc::clone(payload))
                } else {
                    Self::invalid()
                }
            }
        }
    }
}

impl<T> Drop for Proxy<T> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<T> PartialEq for Proxy<T> {
    /// Identity comparison: two proxies are equal when they share backing data
    fn eq(&self, other: &Self) -> bool {
        match (&self.backing, &other.backing) {
            (None, None) => true,
            (Some(Backing::Local(a)), Some(Backing::Local(b))) => Rc::ptr_eq(a, b),
            (
                Some(Backing::Cached { cache: a, key: ka, .. }),
                Some(Backing::Cached { cache: b, key: kb, .. }),
            ) => Weak::ptr_eq(a, b) && ka == kb,
            _ => false,
        }
    }
}

impl<T> Eq for Proxy<T> {}

impl<T> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backing {
            None => f.write_str("Proxy(invalid)"),
            Some(Backing::Local(_)) => f.write_str("Proxy(local)"),
            Some(Backing::Cached { name, .. }) => {
                if self.is_valid() {
                    write!(f, "Proxy({name:?})")
                } else {
                    write!(f, "Proxy({name:?}, expired)")
                }
            }
        }
    }
}

impl<T> From<T> for Proxy<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
