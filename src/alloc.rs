//! Allocation hooks for the codec engine and the buffers exchanged with it.
//!
//! An [`Allocator`] is an explicit value handed to each handle; there is no
//! process-wide allocator state. Every [`Block`] remembers the free callback of
//! the binding that produced it, so rebinding an allocator never routes a block
//! to the wrong free function.

use std::{
    alloc::{self, Layout},
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// Allocation callback: returns a zeroed buffer of exactly the requested
/// length, or `None` when the memory is not available.
pub type AllocFn = Arc<dyn Fn(usize) -> Option<Vec<u8>> + Send + Sync>;

/// Free callback: receives back every buffer produced by the paired
/// [`AllocFn`].
pub type FreeFn = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

fn default_alloc(size: usize) -> Option<Vec<u8>> {
    if size == 0 {
        return Some(Vec::new());
    }
    let layout = Layout::array::<u8>(size).ok()?;
    // SAFETY: `layout` has a non-zero size. The buffer is zeroed, so all `size`
    // bytes are initialised, and it was allocated by the global allocator with
    // the layout `Vec<u8>` uses for that capacity.
    unsafe {
        let ptr = alloc::alloc_zeroed(layout);
        if ptr.is_null() {
            return None;
        }
        Some(Vec::from_raw_parts(ptr, size, size))
    }
}

fn default_free(buf: Vec<u8>) {
    drop(buf);
}

fn default_alloc_fn() -> AllocFn {
    Arc::new(default_alloc)
}

fn default_free_fn() -> FreeFn {
    Arc::new(default_free)
}

/// A pair of allocate/free callbacks.
#[derive(Clone)]
pub struct Allocator {
    alloc: AllocFn,
    free: FreeFn,
    custom: bool,
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("custom", &self.custom)
            .finish_non_exhaustive()
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// An allocator bound to the process allocator.
    pub fn new() -> Self {
        Self {
            alloc: default_alloc_fn(),
            free: default_free_fn(),
            custom: false,
        }
    }

    /// An allocator bound to the given callbacks.
    pub fn with_callbacks<A, F>(alloc: A, free: F) -> Self
    where
        A: Fn(usize) -> Option<Vec<u8>> + Send + Sync + 'static,
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        let mut allocator = Self::new();
        allocator.init(Some(Arc::new(alloc)), Some(Arc::new(free)));
        allocator
    }

    /// Rebind the callbacks.
    ///
    /// A missing callback binds the process default. Each call replaces the
    /// previous bindings entirely; blocks already handed out keep the free
    /// callback they were allocated with.
    pub fn init(&mut self, alloc: Option<AllocFn>, free: Option<FreeFn>) {
        self.custom = alloc.is_some() || free.is_some();
        self.alloc = alloc.unwrap_or_else(default_alloc_fn);
        self.free = free.unwrap_or_else(default_free_fn);
    }

    /// Whether any custom callback is bound.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Allocate a zeroed block of `size` bytes.
    ///
    /// Returns `None` when the allocation callback fails or hands back a
    /// buffer shorter than requested (that buffer is passed to the free
    /// callback straight away).
    pub fn alloc(&self, size: usize) -> Option<Block> {
        let mut data = (self.alloc)(size)?;
        if data.len() < size {
            tracing::debug!(requested = size, got = data.len(), "allocator returned a short block");
            (self.free)(data);
            return None;
        }
        data.truncate(size);
        Some(Block {
            data,
            free: Arc::clone(&self.free),
        })
    }
}

/// A buffer obtained from an [`Allocator`], returned to it on drop.
pub struct Block {
    data: Vec<u8>,
    free: FreeFn,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl Deref for Block {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Block {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for Block {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        (self.free)(std::mem::take(&mut self.data));
    }
}
