//! Chunked execution over the variant axis.
//!
//! Every whole-dataset computation in this crate is written as a per-block kernel plus
//! a combine step, and driven by a [`BlockSource`]: a capability that can fold a
//! closure over contiguous blocks of variants. The in-memory backend
//! ([`Genotypes`]) serves borrowed views with no block concept of its own; the
//! store-backed backend ([`Chunked`](store::Chunked)) materializes one block at a
//! time from an external chunked store, so datasets larger than memory stream through
//! the same kernels. Any computation expressible this way produces bit-identical
//! results regardless of backend and block size.
//!
//! Blocks are processed one at a time in variant-axis order; combining is associative,
//! so the same kernels can also be dispatched over
//! [`par_iter_blocks`](crate::gt::GenotypesView::par_iter_blocks) where an in-memory
//! array is available.

use crate::{
    error::Result,
    gt::{Blocks, Genotypes, GenotypesView},
};

pub mod store;

/// The block size used when neither the caller nor the backend has a preference.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// A caller-side choice of block size for chunked execution.
///
/// Block size never affects results, only memory use and locality; it is passed
/// explicitly at the call site rather than kept as process-wide state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BlockSize {
    /// Use the backend's natural block size where it has one,
    /// [`DEFAULT_BLOCK_SIZE`] otherwise.
    #[default]
    Auto,
    /// Use a fixed number of variants per block.
    Fixed(usize),
}

impl BlockSize {
    pub(crate) fn resolve(self, natural: Option<usize>) -> usize {
        match self {
            Self::Auto => natural.unwrap_or(DEFAULT_BLOCK_SIZE),
            Self::Fixed(size) => size.max(1),
        }
    }
}

/// A source of genotype data that can be processed in blocks along the variant axis.
///
/// This is the seam between in-memory and out-of-core execution: callers write their
/// computation once against this trait and do not need to know which backend is
/// active.
pub trait BlockSource {
    /// Returns the number of variants.
    fn n_variants(&self) -> usize;

    /// Returns the number of samples.
    fn n_samples(&self) -> usize;

    /// Returns the ploidy.
    fn ploidy(&self) -> usize;

    /// Returns the backend's preferred block size, if it has one.
    ///
    /// This is a performance hint only; it never affects results.
    fn natural_block_size(&self) -> Option<usize>;

    /// Folds a closure over contiguous blocks of variants, in axis order.
    ///
    /// The closure sees each block exactly once, as a view; blocks cover the variant
    /// axis without gaps or overlap. Errors abort the fold with no partial result.
    fn try_fold_blocks<B, F>(&self, block_size: BlockSize, init: B, f: F) -> Result<B>
    where
        F: FnMut(B, GenotypesView<'_>) -> Result<B>;
}

impl<T> BlockSource for &T
where
    T: BlockSource + ?Sized,
{
    fn n_variants(&self) -> usize {
        T::n_variants(self)
    }

    fn n_samples(&self) -> usize {
        T::n_samples(self)
    }

    fn ploidy(&self) -> usize {
        T::ploidy(self)
    }

    fn natural_block_size(&self) -> Option<usize> {
        T::natural_block_size(self)
    }

    fn try_fold_blocks<B, F>(&self, block_size: BlockSize, init: B, f: F) -> Result<B>
    where
        F: FnMut(B, GenotypesView<'_>) -> Result<B>,
    {
        T::try_fold_blocks(self, block_size, init, f)
    }
}

impl BlockSource for Genotypes {
    fn n_variants(&self) -> usize {
        Genotypes::n_variants(self)
    }

    fn n_samples(&self) -> usize {
        Genotypes::n_samples(self)
    }

    fn ploidy(&self) -> usize {
        Genotypes::ploidy(self)
    }

    fn natural_block_size(&self) -> Option<usize> {
        None
    }

    fn try_fold_blocks<B, F>(&self, block_size: BlockSize, init: B, mut f: F) -> Result<B>
    where
        F: FnMut(B, GenotypesView<'_>) -> Result<B>,
    {
        let size = block_size.resolve(self.natural_block_size());
        log::debug!(
            "folding {} variants in-memory in blocks of {size}",
            self.n_variants()
        );

        self.view()
            .iter_blocks(Blocks::Size(size))
            .try_fold(init, |acc, block| f(acc, block))
    }
}

/// Runs a kernel over every block of a source and folds the partial results.
///
/// The `kernel` maps one block to a partial result; `combine` folds two partials into
/// one. `combine` must be associative, in which case the result is identical to
/// running the kernel once over the whole dataset, for any block size. Returns `None`
/// for an empty variant axis.
///
/// # Examples
///
/// ```
/// use gtstats::{exec::{map_reduce, BlockSize}, genotypes};
/// let g = genotypes![
///     [[0, 1], [1, 1]],
///     [[0, 0], [0, 1]],
///     [[1, 1], [1, 1]],
/// ];
/// // Count het calls over the whole dataset, two variants at a time.
/// let hets = map_reduce(
///     &g,
///     BlockSize::Fixed(2),
///     |block| {
///         Ok((0..block.n_variants())
///             .flat_map(|v| block.iter_variant_calls(v))
///             .filter(|call| call.is_het())
///             .count())
///     },
///     |a, b| a + b,
/// )
/// .unwrap();
/// assert_eq!(hets, Some(2));
/// ```
pub fn map_reduce<S, T, K, C>(
    source: &S,
    block_size: BlockSize,
    mut kernel: K,
    mut combine: C,
) -> Result<Option<T>>
where
    S: BlockSource + ?Sized,
    K: FnMut(GenotypesView<'_>) -> Result<T>,
    C: FnMut(T, T) -> T,
{
    source.try_fold_blocks(block_size, None, |acc: Option<T>, block| {
        let partial = kernel(block)?;

        Ok(Some(match acc {
            Some(acc) => combine(acc, partial),
            None => partial,
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::genotypes;

    #[test]
    fn resolve_block_size() {
        assert_eq!(BlockSize::Auto.resolve(None), DEFAULT_BLOCK_SIZE);
        assert_eq!(BlockSize::Auto.resolve(Some(128)), 128);
        assert_eq!(BlockSize::Fixed(16).resolve(Some(128)), 16);
        assert_eq!(BlockSize::Fixed(0).resolve(None), 1);
    }

    #[test]
    fn fold_covers_axis_in_order() {
        let g = genotypes![
            [[0], [0]],
            [[1], [1]],
            [[2], [2]],
            [[3], [3]],
            [[4], [4]],
        ];

        let firsts = g
            .try_fold_blocks(BlockSize::Fixed(2), Vec::new(), |mut acc, block| {
                acc.push(block.as_slice()[0]);
                Ok(acc)
            })
            .unwrap();

        assert_eq!(firsts, vec![0, 2, 4]);
    }

    #[test]
    fn map_reduce_is_partition_invariant() {
        let g = genotypes![
            [[0, 1], [1, 1]],
            [[0, 0], [-1, -1]],
            [[1, 1], [0, 1]],
        ];

        let kernel = |block: GenotypesView| {
            Ok(block.as_slice().iter().filter(|&&x| x == 1).count())
        };

        let whole = map_reduce(&g, BlockSize::Fixed(3), kernel, |a, b| a + b).unwrap();
        for size in 1..4 {
            let split = map_reduce(&g, BlockSize::Fixed(size), kernel, |a, b| a + b).unwrap();
            assert_eq!(split, whole);
        }
    }

    #[test]
    fn map_reduce_empty_axis() {
        let g = crate::gt::Genotypes::empty(2, 2);
        let result = map_reduce(&g, BlockSize::Auto, |_| Ok(1usize), |a, b| a + b).unwrap();
        assert_eq!(result, None);
    }
}
