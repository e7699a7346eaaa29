//! Chunked dispatch over flat pixel ranges.
//!
//! Every pass in this crate is expressed as "do something to each chunk of a
//! flat index range" plus, for reductions, "merge per-worker accumulators".
//! With the `parallel` feature the chunks run on the rayon pool; without it
//! the same closures run in order on the calling thread.
//!
//! Chunk boundaries are multiples of [`CHUNK_PIXELS`] so that every chunk
//! except the last starts on a vector boundary for any supported lane width.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pixels per work item.
pub const CHUNK_PIXELS: usize = 16 * 1024;

/// Folds every chunk of `data` into a per-worker accumulator, then merges.
///
/// `fold` receives the accumulator, the chunk's offset into `data` and the
/// chunk itself.
#[cfg(feature = "parallel")]
pub fn fold_chunks<T, A, I, F, R>(data: &[T], chunk: usize, identity: I, fold: F, reduce: R) -> A
where
    T: Sync,
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, usize, &[T]) -> A + Sync + Send,
    R: Fn(A, A) -> A + Sync + Send,
{
    data.par_chunks(chunk)
        .enumerate()
        .fold(&identity, |acc, (i, c)| fold(acc, i * chunk, c))
        .reduce(&identity, reduce)
}

/// Folds every chunk of `data` into a per-worker accumulator (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn fold_chunks<T, A, I, F, R>(data: &[T], chunk: usize, identity: I, fold: F, _reduce: R) -> A
where
    I: Fn() -> A,
    F: Fn(A, usize, &[T]) -> A,
    R: Fn(A, A) -> A,
{
    data.chunks(chunk)
        .enumerate()
        .fold(identity(), |acc, (i, c)| fold(acc, i * chunk, c))
}

/// Like [`fold_chunks`], but hands out disjoint mutable chunks of `data`.
#[cfg(feature = "parallel")]
pub fn fold_chunks_mut<T, A, I, F, R>(data: &mut [T], chunk: usize, identity: I, fold: F, reduce: R) -> A
where
    T: Send,
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, usize, &mut [T]) -> A + Sync + Send,
    R: Fn(A, A) -> A + Sync + Send,
{
    data.par_chunks_mut(chunk)
        .enumerate()
        .fold(&identity, |acc, (i, c)| fold(acc, i * chunk, c))
        .reduce(&identity, reduce)
}

/// Like [`fold_chunks`], but hands out disjoint mutable chunks of `data` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn fold_chunks_mut<T, A, I, F, R>(data: &mut [T], chunk: usize, identity: I, fold: F, _reduce: R) -> A
where
    I: Fn() -> A,
    F: Fn(A, usize, &mut [T]) -> A,
    R: Fn(A, A) -> A,
{
    data.chunks_mut(chunk)
        .enumerate()
        .fold(identity(), |acc, (i, c)| fold(acc, i * chunk, c))
}

/// Calls `f(offset, chunk)` for disjoint mutable chunks of `data`.
#[cfg(feature = "parallel")]
pub fn for_each_chunk_mut<T, F>(data: &mut [T], chunk: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    data.par_chunks_mut(chunk)
        .enumerate()
        .for_each(|(i, c)| f(i * chunk, c));
}

/// Calls `f(offset, chunk)` for disjoint mutable chunks of `data` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn for_each_chunk_mut<T, F>(data: &mut [T], chunk: usize, f: F)
where
    F: Fn(usize, &mut [T]),
{
    for (i, c) in data.chunks_mut(chunk).enumerate() {
        f(i * chunk, c);
    }
}

/// Calls `f(y, row)` for every storage row of a `width`-wide buffer.
pub fn for_each_row_mut<T, F>(data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if width == 0 {
        return;
    }
    for_each_chunk_mut(data, width, |offset, row| f(offset / width, row));
}

/// Chunk length for `len` pixels: [`CHUNK_PIXELS`], or the whole range when
/// it is smaller. Never zero.
#[inline]
pub fn chunk_len(len: usize) -> usize {
    len.clamp(1, CHUNK_PIXELS)
}
