//! Methods for storing, selecting, and summarising genotype call data at the scale of
//! whole-genome variant datasets.
//!
//! The central type is the [`gt::Genotypes`] array, a dense matrix of allele calls
//! over variants, samples, and ploidy. Statistics over the array are calculated
//! blockwise along the variant axis through the [`exec::BlockSource`] seam, so the
//! same code serves both in-memory arrays and out-of-core stores, with results that
//! do not depend on the block size or backend.

#![warn(missing_docs)]

pub mod count;
pub mod error;
pub mod exec;
pub mod gt;
pub mod reader;
pub mod stat;

pub use error::{Error, Result};

/// Sets the number of threads to use for parallelization.
///
/// This is a thin wrapper around [`rayon::ThreadPoolBuilder`] to save users from having to
/// import `rayon` to control parallelism. The meaning of the `threads` parameter here derives
/// from [`rayon::ThreadPoolBuilder::num_threads`], see it's documentation for details.
pub fn set_threads(threads: usize) -> std::result::Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
}
