#![allow(unused)] // Different tests use a different subset of functions

use lzma_alone::{
    AllocFn, Allocator, CompressOptions, Compressor, Decompressor, FreeFn, Result, Sink, Source,
};
use proptest_derive::Arbitrary;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Plain data split into the chunks a source hands out one read at a time.
#[derive(Arbitrary, Debug)]
pub struct InputStream(Vec<Vec<u8>>);

impl InputStream {
    pub fn source(&self) -> Chunks {
        // An empty read means end of input, so empty chunks are dropped.
        Chunks {
            chunks: self.0.iter().filter(|c| !c.is_empty()).cloned().collect(),
            next: 0,
            offset: 0,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.iter().flatten().cloned().collect()
    }
}

impl From<Vec<Vec<u8>>> for InputStream {
    fn from(input: Vec<Vec<u8>>) -> InputStream {
        InputStream(input)
    }
}

/// Hands out the given chunks, never more than the caller asked for.
#[derive(Debug)]
pub struct Chunks {
    chunks: Vec<Vec<u8>>,
    next: usize,
    offset: usize,
}

impl Chunks {
    pub fn fixed(data: &[u8], size: usize) -> Self {
        InputStream(data.chunks(size).map(Vec::from).collect()).source()
    }
}

impl Source for Chunks {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.chunks.get(self.next) else {
            return Ok(0);
        };
        let n = buf.len().min(chunk.len() - self.offset);
        buf[..n].copy_from_slice(&chunk[self.offset..self.offset + n]);
        self.offset += n;
        if self.offset == chunk.len() {
            self.next += 1;
            self.offset = 0;
        }
        Ok(n)
    }
}

/// Yields `data`, then fails instead of reporting end of input.
#[derive(Debug)]
pub struct FailingSource<'a>(pub &'a [u8]);

impl Source for FailingSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "source failed"));
        }
        let n = buf.len().min(self.0.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}

/// How a [`Recorder`] answers a given write call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Misbehave {
    Never,
    ShortOnCall(usize),
    FailOnCall(usize),
}

/// Records every write call it receives.
#[derive(Debug)]
pub struct Recorder {
    pub writes: Vec<Vec<u8>>,
    misbehave: Misbehave,
}

impl Recorder {
    pub fn new() -> Self {
        Self::misbehaving(Misbehave::Never)
    }

    pub fn misbehaving(misbehave: Misbehave) -> Self {
        Self {
            writes: Vec::new(),
            misbehave,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.writes.iter().flatten().cloned().collect()
    }
}

impl Sink for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let call = self.writes.len();
        self.writes.push(buf.to_vec());
        match self.misbehave {
            Misbehave::ShortOnCall(n) if n == call => Ok(buf.len() - 1),
            Misbehave::FailOnCall(n) if n == call => {
                Err(io::Error::new(io::ErrorKind::Other, "sink failed"))
            }
            _ => Ok(buf.len()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Counts {
    pub allocs: AtomicUsize,
    pub frees: AtomicUsize,
    pub live_bytes: AtomicUsize,
    pub peak_bytes: AtomicUsize,
}

impl Counts {
    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes.load(Ordering::SeqCst)
    }
}

/// An allocator that counts its calls and refuses to hand out more than
/// `budget` blocks.
pub fn counting_allocator(budget: usize) -> (Allocator, Arc<Counts>) {
    let counts = Arc::new(Counts::default());
    let a = Arc::clone(&counts);
    let f = Arc::clone(&counts);
    let alloc: AllocFn = Arc::new(move |size: usize| {
        if a.allocs.load(Ordering::SeqCst) >= budget {
            return None;
        }
        a.allocs.fetch_add(1, Ordering::SeqCst);
        let live = a.live_bytes.fetch_add(size, Ordering::SeqCst) + size;
        a.peak_bytes.fetch_max(live, Ordering::SeqCst);
        Some(vec![0; size])
    });
    let free: FreeFn = Arc::new(move |block: Vec<u8>| {
        f.frees.fetch_add(1, Ordering::SeqCst);
        f.live_bytes.fetch_sub(block.len(), Ordering::SeqCst);
    });
    let mut allocator = Allocator::new();
    allocator.init(Some(alloc), Some(free));
    (allocator, counts)
}

/// Incompressible bytes, reproducible from `seed`.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0; len];
    StdRng::seed_from_u64(seed).fill(&mut data[..]);
    data
}

/// Text-like bytes that compress well.
pub fn repetitive_bytes(len: usize) -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

/// Options that keep encoder and decoder memory small.
pub fn small_options() -> CompressOptions {
    CompressOptions::default().dict_size(1 << 16)
}

pub fn compress_with(options: CompressOptions, source: &mut impl Source) -> Vec<u8> {
    let mut compressor = Compressor::default();
    compressor.configure(options).unwrap();
    let mut out = Vec::new();
    compressor.run(source, &mut out).unwrap();
    out
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_with(small_options(), &mut &data[..])
}

pub fn decompress_from(source: &mut impl Source) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    Decompressor::default().run(source, &mut out)?;
    Ok(out)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_from(&mut &data[..])
}
