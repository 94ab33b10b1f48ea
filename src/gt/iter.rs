use std::iter::FusedIterator;

use rayon::iter::{
    plumbing::{bridge, Consumer, Producer, ProducerCallback, UnindexedConsumer},
    IndexedParallelIterator, ParallelIterator,
};

use super::GenotypesView;

/// A specification for how to split the variant axis into blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Blocks {
    /// Splits the variant axis into a fixed number of blocks.
    ///
    /// If the number of blocks `b` does not evenly divide the number of variants `n`,
    /// then the first `n mod b` blocks will have one more variant than the rest.
    /// More blocks than variants are clamped to one variant per block.
    Number(usize),
    /// Splits the variant axis into blocks of a fixed size.
    ///
    /// If the block size `m` does not evenly divide the number of variants `n`,
    /// then the last block will contain `n mod m` variants. Block sizes larger than
    /// the variant axis yield a single block.
    Size(usize),
}

impl Blocks {
    pub(crate) fn to_spec(self, variants: usize) -> BlockSpec {
        match self {
            Self::Number(number) => BlockSpec::number(number, variants),
            Self::Size(size) => BlockSpec::size(size, variants),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Inner {
    Number {
        /// The block size for blocks not receiving an extra variant
        block_size: usize,
        /// The number of leading blocks that receive an extra variant
        rem: usize,
    },
    Size {
        /// The block size for all blocks except (possibly) the last
        block_size: usize,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BlockSpec {
    inner: Inner,
    variants: usize,
}

impl BlockSpec {
    /// Returns the number of blocks that will be created.
    pub(crate) fn blocks(&self) -> usize {
        let variants = self.variants;

        match self.inner {
            Inner::Number { block_size, rem } => {
                if variants == 0 {
                    0
                } else {
                    (variants - rem) / block_size
                }
            }
            Inner::Size { block_size } => {
                variants / block_size + usize::from(variants % block_size != 0)
            }
        }
    }

    /// Returns the offset in variants of the block with the given index.
    pub(crate) fn block_offset(&self, index: usize) -> usize {
        match self.inner {
            Inner::Number { block_size, rem } => block_size * index + rem.min(index),
            Inner::Size { block_size } => block_size * index,
        }
    }

    /// Returns the size in variants of the block with the given index.
    pub(crate) fn block_size(&self, index: usize) -> usize {
        let variants = self.variants;

        match self.inner {
            Inner::Number { block_size, rem } => block_size + usize::from(index < rem),
            Inner::Size { block_size } => {
                if (index + 1) * block_size <= variants {
                    block_size
                } else {
                    variants % block_size
                }
            }
        }
    }

    #[cfg(test)]
    fn iter_block_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.blocks()).map(|i| self.block_size(i))
    }

    fn new(inner: Inner, variants: usize) -> Self {
        Self { inner, variants }
    }

    /// Creates a block specification from a number of blocks, clamped to the axis length.
    fn number(blocks: usize, variants: usize) -> Self {
        let blocks = blocks.clamp(1, variants.max(1));

        let inner = Inner::Number {
            block_size: if variants == 0 { 1 } else { variants / blocks },
            rem: if variants == 0 { 0 } else { variants % blocks },
        };

        Self::new(inner, variants)
    }

    /// Creates a block specification from a block size, clamped to the axis length.
    fn size(block_size: usize, variants: usize) -> Self {
        let inner = Inner::Size {
            block_size: block_size.clamp(1, variants.max(1)),
        };

        Self::new(inner, variants)
    }

    /// Splits the block specification at the given block index.
    fn split(&self, index: usize) -> (Self, Self) {
        let (hd_inner, tl_inner) = match self.inner {
            Inner::Number { block_size, rem } => (
                Inner::Number {
                    block_size,
                    rem: rem.min(index),
                },
                Inner::Number {
                    block_size,
                    rem: rem.saturating_sub(index),
                },
            ),
            inner @ Inner::Size { .. } => (inner, inner),
        };

        let hd_variants = self.block_offset(index);
        let tl_variants = self.variants.saturating_sub(hd_variants);

        (
            Self::new(hd_inner, hd_variants),
            Self::new(tl_inner, tl_variants),
        )
    }
}

/// An iterator over contiguous blocks of variants in a genotype array.
///
/// Created by [`GenotypesView::iter_blocks`].
#[derive(Debug)]
pub struct BlockIter<'a> {
    genotypes: GenotypesView<'a>,
    spec: BlockSpec,
    current: usize,
    max: usize,
}

impl<'a> BlockIter<'a> {
    pub(super) fn new(genotypes: GenotypesView<'a>, spec: BlockSpec) -> Self {
        Self {
            genotypes,
            spec,
            current: 0,
            max: spec.blocks(),
        }
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = GenotypesView<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        (self.current < self.max).then(|| {
            let start = self.spec.block_offset(self.current);
            let size = self.spec.block_size(self.current);
            self.current += 1;

            self.genotypes.block(start, size)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl<'a> ExactSizeIterator for BlockIter<'a> {
    fn len(&self) -> usize {
        self.max - self.current
    }
}

impl<'a> DoubleEndedIterator for BlockIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        (self.max > self.current).then(|| {
            let start = self.spec.block_offset(self.max - 1);
            let size = self.spec.block_size(self.max - 1);
            self.max -= 1;

            self.genotypes.block(start, size)
        })
    }
}

impl<'a> FusedIterator for BlockIter<'a> {}

/// A parallel iterator over contiguous blocks of variants in a genotype array.
///
/// Created by [`GenotypesView::par_iter_blocks`].
#[derive(Debug)]
pub struct ParBlockIter<'a> {
    genotypes: GenotypesView<'a>,
    spec: BlockSpec,
}

impl<'a> ParBlockIter<'a> {
    pub(super) fn new(genotypes: GenotypesView<'a>, spec: BlockSpec) -> Self {
        Self { genotypes, spec }
    }
}

impl<'a> ParallelIterator for ParBlockIter<'a> {
    type Item = GenotypesView<'a>;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        bridge(self, consumer)
    }

    fn opt_len(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<'a> IndexedParallelIterator for ParBlockIter<'a> {
    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: Consumer<Self::Item>,
    {
        bridge(self, consumer)
    }

    fn len(&self) -> usize {
        self.spec.blocks()
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: ProducerCallback<Self::Item>,
    {
        callback.callback(BlockProducer {
            genotypes: self.genotypes,
            spec: self.spec,
        })
    }
}

struct BlockProducer<'a> {
    genotypes: GenotypesView<'a>,
    spec: BlockSpec,
}

impl<'a> Producer for BlockProducer<'a> {
    type Item = GenotypesView<'a>;
    type IntoIter = BlockIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        BlockIter::new(self.genotypes, self.spec)
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        let offset = self.spec.block_offset(index);
        let (hd, tl) = self.genotypes.split(offset);
        let (hd_spec, tl_spec) = self.spec.split(index);

        (
            Self {
                genotypes: hd,
                spec: hd_spec,
            },
            Self {
                genotypes: tl,
                spec: tl_spec,
            },
        )
    }
}
