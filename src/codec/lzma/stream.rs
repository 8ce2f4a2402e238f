use std::{
    collections::HashMap,
    ffi::c_void,
    fmt, io, mem,
    panic::{self, AssertUnwindSafe},
    ptr::{self, NonNull},
};

use liblzma_sys::{
    lzma_allocator, lzma_code, lzma_end, lzma_filter, lzma_lzma_preset, lzma_options_lzma,
    lzma_raw_decoder, lzma_raw_encoder, lzma_ret, lzma_stream, LZMA_BUF_ERROR, LZMA_DATA_ERROR,
    LZMA_FILTER_LZMA1, LZMA_FINISH, LZMA_MEM_ERROR, LZMA_OK, LZMA_OPTIONS_ERROR, LZMA_RUN,
    LZMA_STREAM_END, LZMA_VLI_UNKNOWN,
};

use crate::alloc::{Allocator, Block};

// liblzma expects malloc alignment; blocks only guarantee byte alignment.
const ENGINE_ALIGN: usize = 16;

#[derive(Clone, Copy, Debug)]
pub(super) enum Action {
    Run,
    Finish,
}

/// LZMA1 properties for a raw filter chain: the preset first, then explicit
/// overrides.
pub(super) fn lzma1_options(
    preset: u32,
    dict_size: u32,
    lc: u8,
    lp: u8,
    pb: u8,
) -> io::Result<lzma_options_lzma> {
    let mut options: lzma_options_lzma = unsafe { mem::zeroed() };
    if unsafe { lzma_lzma_preset(&mut options, preset) } != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported preset {preset}"),
        ));
    }
    options.dict_size = dict_size;
    options.lc = u32::from(lc);
    options.lp = u32::from(lp);
    options.pb = u32::from(pb);
    Ok(options)
}

/// Every allocation liblzma makes for one stream, backed by blocks from an
/// [`Allocator`] and keyed by the address handed to the engine.
struct EngineHeap {
    raw: lzma_allocator,
    allocator: Allocator,
    blocks: HashMap<usize, Block>,
}

impl EngineHeap {
    fn alloc(&mut self, len: usize) -> *mut c_void {
        let Some(padded) = len.max(1).checked_add(ENGINE_ALIGN - 1) else {
            return ptr::null_mut();
        };
        let Some(mut block) = self.allocator.alloc(padded) else {
            tracing::debug!(len, "engine allocation refused");
            return ptr::null_mut();
        };
        let offset = block.as_ptr().align_offset(ENGINE_ALIGN);
        if offset >= ENGINE_ALIGN {
            return ptr::null_mut();
        }
        let addr = block[offset..].as_mut_ptr();
        self.blocks.insert(addr as usize, block);
        addr.cast()
    }

    fn free(&mut self, addr: *mut c_void) {
        self.blocks.remove(&(addr as usize));
    }
}

extern "C" fn engine_alloc(opaque: *mut c_void, nmemb: usize, size: usize) -> *mut c_void {
    let Some(len) = nmemb.checked_mul(size) else {
        return ptr::null_mut();
    };
    // SAFETY: `opaque` is the heap installed by `RawStream::new`, which outlives
    // every liblzma call on the stream.
    let heap = unsafe { &mut *opaque.cast::<EngineHeap>() };
    panic::catch_unwind(AssertUnwindSafe(|| heap.alloc(len))).unwrap_or(ptr::null_mut())
}

extern "C" fn engine_free(opaque: *mut c_void, addr: *mut c_void) {
    if addr.is_null() {
        return;
    }
    // SAFETY: as in `engine_alloc`.
    let heap = unsafe { &mut *opaque.cast::<EngineHeap>() };
    let _ = panic::catch_unwind(AssertUnwindSafe(|| heap.free(addr)));
}

fn engine_error(ret: lzma_ret) -> io::Error {
    match ret {
        LZMA_MEM_ERROR => io::ErrorKind::OutOfMemory.into(),
        LZMA_OPTIONS_ERROR => {
            io::Error::new(io::ErrorKind::InvalidInput, "unsupported lzma options")
        }
        LZMA_DATA_ERROR => io::Error::new(io::ErrorKind::InvalidData, "corrupt lzma data"),
        LZMA_BUF_ERROR => io::Error::other("lzma stream made no progress"),
        ret => io::Error::other(format!("liblzma error {ret}")),
    }
}

/// A raw LZMA1 `lzma_stream` whose memory comes from an [`Allocator`].
pub(super) struct RawStream {
    stream: lzma_stream,
    heap: NonNull<EngineHeap>,
}

impl fmt::Debug for RawStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStream")
            .field("total_in", &self.stream.total_in)
            .field("total_out", &self.stream.total_out)
            .finish_non_exhaustive()
    }
}

impl RawStream {
    pub(super) fn encoder(
        options: &mut lzma_options_lzma,
        allocator: &Allocator,
    ) -> io::Result<Self> {
        let filters = lzma1_chain(options);
        Self::new(allocator, |stream| unsafe {
            lzma_raw_encoder(stream, filters.as_ptr())
        })
    }

    pub(super) fn decoder(
        options: &mut lzma_options_lzma,
        allocator: &Allocator,
    ) -> io::Result<Self> {
        let filters = lzma1_chain(options);
        Self::new(allocator, |stream| unsafe {
            lzma_raw_decoder(stream, filters.as_ptr())
        })
    }

    fn new(
        allocator: &Allocator,
        init: impl FnOnce(*mut lzma_stream) -> lzma_ret,
    ) -> io::Result<Self> {
        let heap = NonNull::from(Box::leak(Box::new(EngineHeap {
            raw: lzma_allocator {
                alloc: Some(engine_alloc),
                free: Some(engine_free),
                opaque: ptr::null_mut(),
            },
            allocator: allocator.clone(),
            blocks: HashMap::new(),
        })));

        let mut stream: lzma_stream = unsafe { mem::zeroed() };
        unsafe {
            (*heap.as_ptr()).raw.opaque = heap.as_ptr().cast();
            stream.allocator = ptr::addr_of!((*heap.as_ptr()).raw);
        }

        // Built before init so a failed init still releases the heap.
        let mut raw = Self { stream, heap };
        match init(ptr::addr_of_mut!(raw.stream)) {
            LZMA_OK => Ok(raw),
            ret => Err(engine_error(ret)),
        }
    }

    pub(super) fn total_in(&self) -> u64 {
        self.stream.total_in
    }

    pub(super) fn total_out(&self) -> u64 {
        self.stream.total_out
    }

    /// Run the engine once. Returns `true` once the end of the stream was
    /// reached.
    pub(super) fn process(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        action: Action,
    ) -> io::Result<bool> {
        self.stream.next_in = input.as_ptr();
        self.stream.avail_in = input.len();
        self.stream.next_out = output.as_mut_ptr();
        self.stream.avail_out = output.len();

        let action = match action {
            Action::Run => LZMA_RUN,
            Action::Finish => LZMA_FINISH,
        };
        match unsafe { lzma_code(&mut self.stream, action) } {
            LZMA_OK => Ok(false),
            LZMA_STREAM_END => Ok(true),
            ret => Err(engine_error(ret)),
        }
    }
}

impl Drop for RawStream {
    fn drop(&mut self) {
        unsafe {
            lzma_end(&mut self.stream);
            drop(Box::from_raw(self.heap.as_ptr()));
        }
    }
}

fn lzma1_chain(options: &mut lzma_options_lzma) -> [lzma_filter; 2] {
    [
        lzma_filter {
            id: LZMA_FILTER_LZMA1,
            options: (options as *mut lzma_options_lzma).cast(),
        },
        lzma_filter {
            id: LZMA_VLI_UNKNOWN,
            options: ptr::null_mut(),
        },
    ]
}
