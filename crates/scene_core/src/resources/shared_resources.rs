//! Name-keyed cache of reference-counted resources
//!
//! Entries live in a generational slot arena. The cache is the only place that
//! creates or destroys entries; [`Proxy`] handles adjust the reference count of
//! the entry they point at and release it through the owning cache when the
//! count drops to zero.
//!
//! Capacity bounds the number of distinct live entries. It is not an LRU:
//! referenced entries are never evicted, and a request at capacity fails
//! unless `keep_unused` retained an unreferenced entry that can be recycled.

use super::{Proxy, ResourceError};
use crate::assets::AssetError;
use crate::config::CacheConfig;
use crate::foundation::collections::{SlotArena, SlotKey};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Type-specific fill/release callbacks of a [`SharedResources`] cache
pub trait ResourceLoader<T> {
    /// Produce the resource called `name`
    fn fill(&mut self, name: &str) -> Result<T, AssetError>;

    /// Dispose of a resource that left the cache
    fn release(&mut self, name: &str, resource: T) {
        log::trace!("Releasing resource '{}'", name);
        drop(resource);
    }
}

impl<T, F> ResourceLoader<T> for F
where
    F: FnMut(&str) -> Result<T, AssetError>,
{
    fn fill(&mut self, name: &str) -> Result<T, AssetError> {
        self(name)
    }
}

pub(crate) struct Entry<T> {
    pub(crate) name: Rc<str>,
    pub(crate) ref_count: usize,
    pub(crate) payload: Rc<T>,
}

/// An entry removed from the arena, released once no borrow is held
pub(crate) struct Evicted<T> {
    name: Rc<str>,
    payload: Rc<T>,
    loader: Rc<RefCell<dyn ResourceLoader<T>>>,
    kind: &'static str,
}

impl<T> Evicted<T> {
    fn finish(self) {
        let Self { name, payload, loader, kind } = self;

        let Ok(resource) = Rc::try_unwrap(payload) else {
            log::warn!("{} '{}' evicted while its payload is still shared", kind, name);
            return;
        };

        match loader.try_borrow_mut() {
            Ok(mut loader) => loader.release(&name, resource),
            Err(_) => log::warn!("{} loader busy, dropping '{}' without release callback", kind, name),
        }
        log::debug!("Released {} '{}'", kind, name);
    }
}

pub(crate) struct CacheInner<T> {
    kind: &'static str,
    config: CacheConfig,
    entries: SlotArena<Entry<T>>,
    names: HashMap<Rc<str>, SlotKey>,
    loader: Rc<RefCell<dyn ResourceLoader<T>>>,
}

impl<T> CacheInner<T> {
    pub(crate) fn entry(&self, key: SlotKey) -> Option<&Entry<T>> {
        self.entries.get(key)
    }

    pub(crate) fn retain(&mut self, key: SlotKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.ref_count += 1;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: SlotKey) -> Option<Evicted<T>> {
        let entry = self.entries.remove(key)?;
        self.names.remove(&entry.name);
        Some(Evicted {
            name: entry.name,
            payload: entry.payload,
            loader: Rc::clone(&self.loader),
            kind: self.kind,
        })
    }
}

/// Drop one reference to `key`, releasing the entry when it was the last
pub(crate) fn release_slot<T>(cache: &RefCell<CacheInner<T>>, key: SlotKey) {
    let evicted = {
        let Ok(mut inner) = cache.try_borrow_mut() else {
            log::error!("Shared resource released while its cache is borrowed; reference leaked");
            return;
        };

        let keep_unused = inner.config.keep_unused;
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };

        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count > 0 || keep_unused {
            return;
        }

        inner.remove(key)
    };

    if let Some(evicted) = evicted {
        evicted.finish();
    }
}

/// Cache of named, reference-counted resources of type `T`
pub struct SharedResources<T: 'static> {
    inner: Rc<RefCell<CacheInner<T>>>,
}

impl<T: 'static> SharedResources<T> {
    /// Create a cache that fills entries through `loader`
    pub fn new(config: CacheConfig, loader: impl ResourceLoader<T> + 'static) -> Self {
        let kind = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("resource");
        let loader: Rc<RefCell<dyn ResourceLoader<T>>> = Rc::new(RefCell::new(loader));

        log::info!(
            "Creating {} cache (capacity {}, keep_unused {})",
            kind, config.capacity, config.keep_unused
        );

        Self {
            inner: Rc::new(RefCell::new(CacheInner {
                kind,
                config,
                entries: SlotArena::new(),
                names: HashMap::new(),
                loader,
            })),
        }
    }

    /// Acquire `name`, loading it on first use
    ///
    /// Returns an invalid proxy when the resource cannot be provided; callers
    /// skip whatever depended on it.
    pub fn acquire(&self, name: &str) -> Proxy<T> {
        match self.try_acquire(name) {
            Ok(proxy) => proxy,
            Err(err) => {
                log::warn!("{}", err);
                Proxy::default()
            }
        }
    }

    /// Acquire `name`, reporting why it is unavailable
    pub fn try_acquire(&self, name: &str) -> Result<Proxy<T>, ResourceError> {
        if name.is_empty() {
            return Err(ResourceError::EmptyName);
        }

        if let Some(proxy) = self.retain_existing(name) {
            return Ok(proxy);
        }

        // Only check here; a failed fill must leave retained entries alone
        self.check_room()?;

        let loader = Rc::clone(&self.inner.borrow().loader);
        let filled = match loader.try_borrow_mut() {
            Ok(mut loader) => loader.fill(name),
            Err(_) => Err(AssetError::InvalidData(format!(
                "recursive load of '{name}' through its own cache"
            ))),
        };
        let payload = filled.map_err(|source| ResourceError::LoadFailed {
            name: name.to_string(),
            source,
        })?;

        // The loader may have pulled in the same name while filling
        if let Some(proxy) = self.retain_existing(name) {
            return Ok(proxy);
        }

        if let Err(err) = self.make_room() {
            if let Ok(mut loader) = loader.try_borrow_mut() {
                loader.release(name, payload);
            }
            return Err(err);
        }

        let mut inner = self.inner.borrow_mut();
        let name: Rc<str> = Rc::from(name);
        let payload = Rc::new(payload);
        let key = inner.entries.insert(Entry {
            name: Rc::clone(&name),
            ref_count: 1,
            payload: Rc::clone(&payload),
        });
        inner.names.insert(Rc::clone(&name), key);
        log::debug!("Loaded {} '{}' ({} live)", inner.kind, name, inner.entries.len());

        Ok(Proxy::cached(Rc::downgrade(&self.inner), key, name, payload))
    }

    /// Give a proxy back to the cache
    ///
    /// Equivalent to dropping it; the proxy is consumed so it cannot be
    /// released twice.
    pub fn release(&self, proxy: Proxy<T>) {
        if proxy.is_valid() && !proxy.belongs_to(&self.inner) {
            log::warn!("Releasing a proxy owned by another {} cache", self.kind());
        }
        drop(proxy);
    }

    /// Current reference count of `name`, zero when not cached
    pub fn ref_count(&self, name: &str) -> usize {
        let inner = self.inner.borrow();
        inner
            .names
            .get(name)
            .and_then(|&key| inner.entries.get(key))
            .map_or(0, |entry| entry.ref_count)
    }

    /// Whether an entry called `name` is cached
    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().names.contains_key(name)
    }

    /// Number of cached entries, referenced or retained
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries
    pub fn capacity(&self) -> usize {
        self.inner.borrow().config.capacity
    }

    /// Names of cached entries
    pub fn names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .entries
            .values()
            .map(|entry| entry.name.to_string())
            .collect()
    }

    /// Payload type name used in log messages
    pub fn kind(&self) -> &'static str {
        self.inner.borrow().kind
    }

    /// Release every unreferenced entry kept by `keep_unused`
    pub fn free_unused(&self) -> usize {
        let evicted: Vec<_> = {
            let mut inner = self.inner.borrow_mut();
            let unused: Vec<_> = inner
                .entries
                .iter()
                .filter(|(_, entry)| entry.ref_count == 0)
                .map(|(key, _)| key)
                .collect();
            unused.into_iter().filter_map(|key| inner.remove(key)).collect()
        };

        let count = evicted.len();
        evicted.into_iter().for_each(Evicted::finish);
        count
    }

    fn retain_existing(&self, name: &str) -> Option<Proxy<T>> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.names.get(name)?;
        if !inner.retain(key) {
            return None;
        }

        let entry = inner.entries.get(key)?;
        Some(Proxy::cached(
            Rc::downgrade(&self.inner),
            key,
            Rc::clone(&entry.name),
            Rc::clone(&entry.payload),
        ))
    }

    fn check_room(&self) -> Result<(), ResourceError> {
        let inner = self.inner.borrow();
        let full = inner.entries.len() >= inner.config.capacity;
        let recyclable = inner.config.keep_unused && inner.entries.values().any(|entry| entry.ref_count == 0);
        if full && !recyclable {
            return Err(ResourceError::CapacityExceeded {
                kind: inner.kind,
                capacity: inner.config.capacity,
            });
        }
        Ok(())
    }

    fn make_room(&self) -> Result<(), ResourceError> {
        let evicted = {
            let mut inner = self.inner.borrow_mut();
            if inner.entries.len() < inner.config.capacity {
                return Ok(());
            }

            let unused = if inner.config.keep_unused {
                inner
                    .entries
                    .iter()
                    .find(|(_, entry)| entry.ref_count == 0)
                    .map(|(key, _)| key)
            } else {
                None
            };

            match unused.and_then(|key| inner.remove(key)) {
                Some(evicted) => evicted,
                None => {
                    return Err(ResourceError::CapacityExceeded {
                        kind: inner.kind,
                        capacity: inner.config.capacity,
                    })
                }
            }
        };

        log::debug!("Recycling slot of unused {} '{}'", evicted.kind, evicted.name);
        evicted.finish();
        Ok(())
    }
}

impl<T: 'static> Drop for SharedResources<T> {
    fn drop(&mut self) {
        let drained: Vec<_> = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                return;
            };
            inner.names.clear();
            let keys: Vec<_> = inner.entries.keys().collect();
            keys.into_iter()
                .filter_map(|key| {
                    let referenced = inner.entries.get(key).map_or(0, |entry| entry.ref_count);
                    inner.remove(key).map(|evicted| (referenced, evicted))
                })
                .collect()
        };

        for (referenced, evicted) in drained {
            if referenced > 0 {
                log::warn!(
                    "{} cache dropped while '{}' still has {} reference(s)",
                    evicted.kind, evicted.name, referenced
                );
            }
            evicted.finish();
        }
    }
}

impl<T: 'static> std::fmt::Debug for SharedResources<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SharedResources")
            .field("kind", &inner.kind)
            .field("config", &inner.config)
            .field("len", &inner.entries.len())
            .finish()
    }
}
