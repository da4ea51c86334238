//! Pooled scratch buffers for assembling candidate sets.
//!
//! Resolution unions the matches found under every candidate scope into one
//! buffer. Under bulk resolution (find-all-references over tens of thousands
//! of keys) those buffers are checked out and returned constantly, so they are
//! recycled through a [`BufferPool`].
//!
//! A checkout is a scoped acquisition: [`PooledBuffer`] returns its buffer to
//! the pool when dropped, on every exit path including `?` propagation of a
//! malformed-key error. Retention is bounded by [`PoolConfig`].
//!
//! The pool only affects allocation behavior. A disabled pool (every checkout
//! is a fresh `Vec`) produces the same resolution results.

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::graph::EntityId;

static GLOBAL_POOL: OnceLock<BufferPool> = OnceLock::new();

/// Buffers up to this length are deduplicated by scanning; longer ones keep a
/// hash index.
pub(crate) const LINEAR_SCAN_LIMIT: usize = 16;

// ============================================================================
// Configuration
// ============================================================================

/// Retention limits for a [`BufferPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Recycle buffers. When false every checkout allocates.
    pub enabled: bool,
    /// Maximum number of idle buffers kept.
    pub max_retained: usize,
    /// Buffers that grew beyond this capacity are dropped instead of kept.
    pub max_buffer_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            enabled: true,
            max_retained: 64,
            max_buffer_capacity: 1024,
        }
    }
}

impl PoolConfig {
    /// Configuration that never recycles buffers.
    pub fn disabled() -> Self {
        PoolConfig {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the maximum number of idle buffers.
    pub fn with_max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = max_retained;
        self
    }

    /// Set the capacity above which returned buffers are discarded.
    pub fn with_max_buffer_capacity(mut self, capacity: usize) -> Self {
        self.max_buffer_capacity = capacity;
        self
    }
}

// ============================================================================
// Pool
// ============================================================================

/// Lock-protected pool of `Vec<EntityId>` buffers.
#[derive(Debug)]
pub struct BufferPool {
    config: PoolConfig,
    free: Mutex<Vec<Vec<EntityId>>>,
    outstanding: AtomicUsize,
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(PoolConfig::default())
    }
}

impl BufferPool {
    /// Create a pool with the given limits.
    pub fn new(config: PoolConfig) -> Self {
        BufferPool {
            config,
            free: Mutex::new(Vec::new()),
            outstanding: AtomicUsize::new(0),
        }
    }

    /// The process-wide pool used when no pool is configured explicitly.
    pub fn global() -> &'static BufferPool {
        GLOBAL_POOL.get_or_init(BufferPool::default)
    }

    /// The pool's limits.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check out an empty buffer. It returns to the pool when dropped.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buffer = if self.config.enabled {
            self.lock_free().pop().unwrap_or_default()
        } else {
            Vec::new()
        };
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        PooledBuffer {
            pool: self,
            buffer,
            seen: HashSet::new(),
            indexed: 0,
        }
    }

    /// Number of buffers currently checked out.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Number of idle buffers held for reuse.
    pub fn retained(&self) -> usize {
        self.lock_free().len()
    }

    fn give_back(&self, mut buffer: Vec<EntityId>) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        if !self.config.enabled || buffer.capacity() > self.config.max_buffer_capacity {
            return;
        }
        buffer.clear();
        let mut free = self.lock_free();
        if free.len() < self.config.max_retained {
            free.push(buffer);
        }
    }

    // Returned buffers are always cleared, so a poisoned lock holds no
    // partially written state.
    fn lock_free(&self) -> MutexGuard<'_, Vec<Vec<EntityId>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Guard
// ============================================================================

/// A buffer checked out of a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buffer: Vec<EntityId>,
    /// Ids of `buffer[..indexed]`, built once the buffer outgrows scanning.
    seen: HashSet<EntityId>,
    indexed: usize,
}

impl PooledBuffer<'_> {
    /// Append `id` unless the buffer already holds it.
    ///
    /// Preserves first-insertion order. Ids appended through `DerefMut` are
    /// picked up on the next call; other edits made that way are not.
    pub fn push_unique(&mut self, id: EntityId) {
        if self.buffer.len() < LINEAR_SCAN_LIMIT {
            if !self.buffer.contains(&id) {
                self.buffer.push(id);
            }
            return;
        }

        if self.indexed > self.buffer.len() {
            self.seen.clear();
            self.indexed = 0;
        }
        self.seen.extend(self.buffer[self.indexed..].iter().copied());
        if self.seen.insert(id) {
            self.buffer.push(id);
        }
        self.indexed = self.buffer.len();
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<EntityId>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.pool.give_back(buffer);
    }
}
