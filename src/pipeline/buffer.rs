//! Byte buffer views and pooling
//!
//! Transports hand payloads around as views into larger arrays so that
//! framing bytes and message bytes can share one allocation. The pool
//! keeps those arrays out of the allocator's way on hot paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A read window `[offset, offset + len)` over an owned backing array.
///
/// The window is not validated at construction; [`as_slice`](Self::as_slice)
/// reports an ill-fitting window as `None` so the caller can fault with
/// context instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    backing: Vec<u8>,
    offset: usize,
    len: usize,
}

impl ByteBuffer {
    pub fn new(backing: Vec<u8>, offset: usize, len: usize) -> Self {
        Self {
            backing,
            offset,
            len,
        }
    }

    /// A view covering the whole array.
    pub fn from_vec(backing: Vec<u8>) -> Self {
        let len = backing.len();
        Self {
            backing,
            offset: 0,
            len,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The entire backing array, framing bytes included.
    pub fn backing(&self) -> &[u8] {
        &self.backing
    }

    /// The viewed bytes, or `None` when the window falls outside the
    /// backing array.
    pub fn as_slice(&self) -> Option<&[u8]> {
        let end = self.offset.checked_add(self.len)?;
        self.backing.get(self.offset..end)
    }

    /// Give up the view and recover the backing array, typically to hand
    /// it back to a pool.
    pub fn into_backing(self) -> Vec<u8> {
        self.backing
    }
}

/// Source of reusable byte arrays.
///
/// `acquire` returns an array of at least `size` bytes, possibly more
/// (pooled classes round up); callers carry the intended length
/// separately and never trust the array's physical size.
pub trait BufferPool: Send + Sync {
    fn acquire(&self, size: usize) -> Vec<u8>;
    fn release(&self, buf: Vec<u8>);
}

const MIN_CLASS: usize = 256;
const MAX_CLASS: usize = 1 << 20;
const NUM_CLASSES: usize = 13;
const DEFAULT_MAX_PER_CLASS: usize = 32;

/// Pool counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Arrays handed out by fresh allocation
    pub allocated: u64,
    /// Arrays handed out from a free list
    pub reused: u64,
    /// Arrays accepted back into a free list
    pub released: u64,
    /// Arrays dropped on release (full class, odd size, or oversize)
    pub discarded: u64,
}

#[derive(Default)]
struct PoolCounters {
    allocated: AtomicU64,
    reused: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

/// Thread-safe pool with power-of-two size classes from 256 B to 1 MiB.
///
/// Each class keeps a bounded free list; requests above the largest class
/// are served by plain allocation and dropped on release. Recycled arrays
/// keep their previous contents, so consumers must respect declared
/// lengths rather than reading to the end of the array.
pub struct SizeClassPool {
    free: Vec<Mutex<Vec<Vec<u8>>>>,
    max_per_class: usize,
    counters: PoolCounters,
}

impl SizeClassPool {
    pub fn new() -> Self {
        Self::with_max_per_class(DEFAULT_MAX_PER_CLASS)
    }

    /// Cap the number of retained arrays per size class.
    pub fn with_max_per_class(max_per_class: usize) -> Self {
        Self {
            free: (0..NUM_CLASSES).map(|_| Mutex::new(Vec::new())).collect(),
            max_per_class,
            counters: PoolCounters::default(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.counters.allocated.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            released: self.counters.released.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }

    fn free_list(&self, idx: usize) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        self.free[idx].lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SizeClassPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool for SizeClassPool {
    fn acquire(&self, size: usize) -> Vec<u8> {
        let Some(idx) = class_index(size) else {
            // Above the largest class, not worth retaining
            self.counters.allocated.fetch_add(1, Ordering::Relaxed);
            return vec![0u8; size];
        };

        let recycled = self.free_list(idx).pop();
        match recycled {
            Some(buf) => {
                self.counters.reused.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.counters.allocated.fetch_add(1, Ordering::Relaxed);
                vec![0u8; class_size(idx)]
            }
        }
    }

    fn release(&self, buf: Vec<u8>) {
        let Some(idx) = exact_class_index(buf.len()) else {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let mut free = self.free_list(idx);
        if free.len() < self.max_per_class {
            free.push(buf);
            self.counters.released.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Class serving `size`, rounding up; `None` above the largest class.
fn class_index(size: usize) -> Option<usize> {
    if size > MAX_CLASS {
        return None;
    }
    let rounded = size.max(MIN_CLASS).next_power_of_two();
    Some((rounded.trailing_zeros() - MIN_CLASS.trailing_zeros()) as usize)
}

/// Class an array of exactly `len` bytes belongs to, if any.
fn exact_class_index(len: usize) -> Option<usize> {
    if (MIN_CLASS..=MAX_CLASS).contains(&len) && len.is_power_of_two() {
        Some((len.trailing_zeros() - MIN_CLASS.trailing_zeros()) as usize)
    } else {
        None
    }
}

fn class_size(idx: usize) -> usize {
    MIN_CLASS << idx
}
