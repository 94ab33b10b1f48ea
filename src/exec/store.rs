//! The external chunked block-store collaborator.
//!
//! On-disk chunked storage (compression, codecs, persistence) is not implemented here;
//! the core consumes any store that can hand back rectangular blocks of genotype data
//! for a requested variant range. [`Chunked`] wraps such a store as a
//! [`BlockSource`], making out-of-core datasets a drop-in replacement for in-memory
//! arrays in every blockwise computation.

use std::io;

use crate::{
    error::{Error, Result},
    gt::{Genotypes, GenotypesView},
};

use super::{BlockSize, BlockSource};

/// An external store of genotype data, readable in rectangular blocks.
///
/// Implementations must guarantee that repeated reads of the same range return
/// identical data; the core may re-read ranges and never writes back. Reads of
/// disjoint ranges may happen concurrently.
pub trait BlockStore {
    /// Returns the number of variants held by the store.
    fn n_variants(&self) -> usize;

    /// Returns the number of samples held by the store.
    fn n_samples(&self) -> usize;

    /// Returns the ploidy of the stored calls.
    fn ploidy(&self) -> usize;

    /// Returns the store's natural block size in variants.
    ///
    /// Readers perform best when requesting ranges aligned to this size.
    fn natural_block_size(&self) -> usize;

    /// Reads the calls of the half-open variant range `start..end`.
    ///
    /// The returned buffer must hold exactly `(end - start) * samples * ploidy`
    /// values in variant-major order.
    fn get_block(&self, start: usize, end: usize) -> io::Result<Vec<i8>>;
}

impl<T> BlockStore for &T
where
    T: BlockStore + ?Sized,
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

    fn natural_block_size(&self) -> usize {
        T::natural_block_size(self)
    }

    fn get_block(&self, start: usize, end: usize) -> io::Result<Vec<i8>> {
        T::get_block(self, start, end)
    }
}

/// A chunked genotype array backed by an external [`BlockStore`].
///
/// Blocks are materialized on demand, handed to the per-block closure, and discarded;
/// at most one block is held in memory per fold. Block materialization is the only
/// point at which I/O happens.
#[derive(Clone, Debug)]
pub struct Chunked<S> {
    store: S,
}

impl<S> Chunked<S>
where
    S: BlockStore,
{
    /// Returns a new chunked array over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn get(&self) -> &S {
        &self.store
    }

    /// Returns the underlying store, consuming `self`.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Materializes the variant range `start..end` as an owned array.
    ///
    /// Fails if the store misbehaves, including returning a block of the wrong length.
    pub fn fetch(&self, start: usize, end: usize) -> Result<Genotypes> {
        let samples = self.store.n_samples();
        let ploidy = self.store.ploidy();
        let expected = (end - start) * samples * ploidy;

        let values = self
            .store
            .get_block(start, end)
            .map_err(|source| Error::Store { source })?;

        if values.len() != expected {
            return Err(Error::BlockShape {
                start,
                end,
                expected,
                found: values.len(),
            });
        }

        Ok(Genotypes::new_unchecked(values, samples, ploidy))
    }
}

impl<S> BlockSource for Chunked<S>
where
    S: BlockStore,
{
    fn n_variants(&self) -> usize {
        self.store.n_variants()
    }

    fn n_samples(&self) -> usize {
        self.store.n_samples()
    }

    fn ploidy(&self) -> usize {
        self.store.ploidy()
    }

    fn natural_block_size(&self) -> Option<usize> {
        Some(self.store.natural_block_size().max(1))
    }

    fn try_fold_blocks<B, F>(&self, block_size: BlockSize, init: B, mut f: F) -> Result<B>
    where
        F: FnMut(B, GenotypesView<'_>) -> Result<B>,
    {
        let variants = self.n_variants();
        let size = block_size.resolve(self.natural_block_size());
        log::debug!("folding {variants} variants from store in blocks of {size}");

        let mut acc = init;
        let mut start = 0;
        while start < variants {
            let end = (start + size).min(variants);
            let block = self.fetch(start, end)?;
            acc = f(acc, block.view())?;
            start = end;
        }

        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use crate::{
        count::allele_counts,
        genotypes,
        gt::Genotypes,
    };

    /// An in-memory store for tests, tracking how many block reads it serves.
    struct MemStore {
        genotypes: Genotypes,
        natural: usize,
        reads: Cell<usize>,
        fail_after: Option<usize>,
    }

    impl MemStore {
        fn new(genotypes: Genotypes, natural: usize) -> Self {
            Self {
                genotypes,
                natural,
                reads: Cell::new(0),
                fail_after: None,
            }
        }
    }

    impl BlockStore for MemStore {
        fn n_variants(&self) -> usize {
            self.genotypes.n_variants()
        }

        fn n_samples(&self) -> usize {
            self.genotypes.n_samples()
        }

        fn ploidy(&self) -> usize {
            self.genotypes.ploidy()
        }

        fn natural_block_size(&self) -> usize {
            self.natural
        }

        fn get_block(&self, start: usize, end: usize) -> io::Result<Vec<i8>> {
            self.reads.set(self.reads.get() + 1);
            if matches!(self.fail_after, Some(max) if self.reads.get() > max) {
                return Err(io::Error::new(io::ErrorKind::Other, "store failure"));
            }

            let width = self.genotypes.n_samples() * self.genotypes.ploidy();
            Ok(self.genotypes.as_slice()[start * width..end * width].to_vec())
        }
    }

    fn example() -> Genotypes {
        genotypes![
            [[0, 0], [0, 1], [1, 1]],
            [[0, 0], [0, 0], [0, 0]],
            [[0, 1], [-1, -1], [1, 1]],
            [[0, 0], [0, 1], [0, 1]],
        ]
    }

    #[test]
    fn store_backed_counts_match_in_memory() {
        let g = example();
        let in_memory = allele_counts(&g, None, BlockSize::Auto).unwrap();

        for natural in 1..=5 {
            let chunked = Chunked::new(MemStore::new(g.clone(), natural));
            let streamed = allele_counts(&chunked, None, BlockSize::Auto).unwrap();
            assert_eq!(streamed, in_memory);
        }
    }

    #[test]
    fn auto_prefers_natural_block_size() {
        let chunked = Chunked::new(MemStore::new(example(), 2));

        let mut sizes = Vec::new();
        chunked
            .try_fold_blocks(BlockSize::Auto, (), |(), block| {
                sizes.push(block.n_variants());
                Ok(())
            })
            .unwrap();

        assert_eq!(sizes, vec![2, 2]);
        // One read per materialized block.
        assert_eq!(chunked.get().reads.get(), 2);
    }

    #[test]
    fn fixed_overrides_natural_block_size() {
        let chunked = Chunked::new(MemStore::new(example(), 2));

        let mut sizes = Vec::new();
        chunked
            .try_fold_blocks(BlockSize::Fixed(3), (), |(), block| {
                sizes.push(block.n_variants());
                Ok(())
            })
            .unwrap();

        assert_eq!(sizes, vec![3, 1]);
    }

    #[test]
    fn short_block_is_a_structural_error() {
        struct ShortStore;

        impl BlockStore for ShortStore {
            fn n_variants(&self) -> usize {
                4
            }
            fn n_samples(&self) -> usize {
                2
            }
            fn ploidy(&self) -> usize {
                2
            }
            fn natural_block_size(&self) -> usize {
                4
            }
            fn get_block(&self, _: usize, _: usize) -> io::Result<Vec<i8>> {
                Ok(vec![0; 3])
            }
        }

        let err = Chunked::new(ShortStore).fetch(0, 4).unwrap_err();
        assert!(matches!(err, Error::BlockShape { expected: 16, found: 3, .. }));
    }

    #[test]
    fn store_failure_aborts_fold() {
        let mut store = MemStore::new(example(), 1);
        store.fail_after = Some(2);
        let chunked = Chunked::new(store);

        let err = allele_counts_with_failing(&chunked);
        assert!(matches!(err, Error::Store { .. }));
    }

    fn allele_counts_with_failing(chunked: &Chunked<MemStore>) -> Error {
        allele_counts(chunked, None, BlockSize::Fixed(1)).unwrap_err()
    }
}
