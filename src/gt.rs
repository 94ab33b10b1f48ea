//! Genotype calls and the genotype array model.
//!
//! A genotype array stores one integer allele call per allele copy per sample per
//! variant, in a flat buffer ordered variant-major: all calls for the first variant,
//! then all calls for the second, and so on. Within a variant, samples are contiguous,
//! and within a sample, the `ploidy` allele copies are contiguous. Allele `0` is the
//! reference, `1..` are alternates, and any negative value is a missing call, canonically
//! [`MISSING`]. This follows the canonical representation of genotype data as a
//! `(variants, samples, ploidy)` array of small signed integers.
//!
//! The owned type is [`Genotypes`]; [`GenotypesView`] borrows a contiguous range of
//! variants, which may be the full array or a single block of it.

use crate::error::{Error, Result};

mod call;
pub use call::Call;

mod iter;
pub use iter::{BlockIter, Blocks, ParBlockIter};

mod select;
pub use select::Selection;

/// The canonical missing-call sentinel.
pub const MISSING: i8 = -1;

/// Encodes an allele index, or a missing call, into its stored representation.
///
/// # Examples
///
/// ```
/// use gtstats::gt::{decode, encode, MISSING};
/// assert_eq!(encode(Some(2)), 2);
/// assert_eq!(encode(None), MISSING);
/// assert_eq!(decode(encode(None)), None);
/// ```
#[inline]
pub fn encode(allele: Option<u8>) -> i8 {
    match allele {
        Some(allele) => allele as i8,
        None => MISSING,
    }
}

/// Decodes a stored call into an allele index, or `None` if the call is missing.
///
/// Any negative value decodes as missing.
#[inline]
pub fn decode(call: i8) -> Option<u8> {
    (call >= 0).then_some(call as u8)
}

/// Creates an owned genotype array from nested call literals.
///
/// The outer level lists variants, the middle level samples, and the inner level the
/// allele copies of one call. All variants must have the same number of samples, and
/// all calls the same ploidy. This is mainly intended for readability in doc-tests
/// and unit tests.
///
/// # Examples
///
/// ```
/// use gtstats::genotypes;
/// let g = genotypes![
///     [[0, 0], [0, 1]],
///     [[0, 2], [-1, -1]],
/// ];
/// assert_eq!(g.n_variants(), 2);
/// assert_eq!(g.n_samples(), 2);
/// assert_eq!(g.ploidy(), 2);
/// ```
#[macro_export]
macro_rules! genotypes {
    ($([$([$($a:expr),+ $(,)?]),+ $(,)?]),+ $(,)?) => {{
        let variants: Vec<Vec<Vec<i8>>> = vec![$(vec![$(vec![$($a as i8),+]),+]),+];
        let samples = variants[0].len();
        let ploidy = variants[0][0].len();
        assert!(
            variants
                .iter()
                .all(|v| v.len() == samples && v.iter().all(|c| c.len() == ploidy)),
            "genotype literal is not rectangular",
        );
        let values: Vec<i8> = variants.into_iter().flatten().flatten().collect();
        $crate::gt::Genotypes::new(values, samples, ploidy).unwrap()
    }};
}

macro_rules! impl_shared_genotype_methods {
    () => {
        /// Returns the calls as a flat, variant-major slice.
        ///
        /// See the [module](crate::gt) documentation for the storage order.
        pub fn as_slice(&self) -> &[i8] {
            &self.values
        }

        /// Returns the number of variants.
        #[inline]
        pub fn n_variants(&self) -> usize {
            match self.width() {
                0 => 0,
                width => self.values.len() / width,
            }
        }

        /// Returns the number of samples.
        #[inline]
        pub fn n_samples(&self) -> usize {
            self.samples
        }

        /// Returns the ploidy.
        #[inline]
        pub fn ploidy(&self) -> usize {
            self.ploidy
        }

        /// Returns the number of values per variant.
        #[inline]
        pub(crate) fn width(&self) -> usize {
            self.samples * self.ploidy
        }

        /// Returns the call of one sample at one variant.
        ///
        /// # Panics
        ///
        /// Panics if `variant` or `sample` are out of bounds.
        pub fn call(&self, variant: usize, sample: usize) -> Call {
            assert!(sample < self.samples, "sample index out of bounds");
            let offset = variant * self.width() + sample * self.ploidy;

            Call::new_unchecked(&self.values[offset..][..self.ploidy])
        }

        /// Returns the raw calls of one variant across all samples.
        ///
        /// # Panics
        ///
        /// Panics if `variant` is out of bounds.
        pub fn variant_slice(&self, variant: usize) -> &[i8] {
            let width = self.width();

            &self.values[variant * width..][..width]
        }

        /// Returns an iterator over the calls of one variant across all samples.
        pub fn iter_variant_calls(&self, variant: usize) -> impl Iterator<Item = Call> {
            self.variant_slice(variant).chunks_exact(self.ploidy).map(Call::new_unchecked)
        }

        /// Returns the alternate-allele dosage matrix.
        ///
        /// The result has one value per variant per sample in variant-major order:
        /// the number of non-reference allele copies in the call, or [`MISSING`] where
        /// any copy of the call is missing.
        ///
        /// # Examples
        ///
        /// ```
        /// use gtstats::genotypes;
        /// let g = genotypes![
        ///     [[0, 0], [0, 1], [1, 1]],
        ///     [[0, 2], [-1, -1], [2, 2]],
        /// ];
        /// assert_eq!(g.to_n_alt(), vec![0, 1, 2, 1, -1, 2]);
        /// ```
        pub fn to_n_alt(&self) -> Vec<i8> {
            self.values
                .chunks_exact(self.ploidy)
                .map(|copies| match Call::new_unchecked(copies).n_alt() {
                    Some(n) => n as i8,
                    None => MISSING,
                })
                .collect()
        }
    };
}

/// An owned genotype array of shape `(variants, samples, ploidy)`.
///
/// All variants share the same sample set and ordering. The array owns its encoded
/// data; selections and derived arrays are independently owned, never aliases into it.
///
/// # Examples
///
/// ```
/// use gtstats::genotypes;
/// let g = genotypes![
///     [[0, 0], [0, 1]],
///     [[0, 1], [1, 1]],
///     [[0, 2], [-1, -1]],
/// ];
/// assert_eq!(g.n_variants(), 3);
/// assert!(g.view().call(2, 1).is_missing());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genotypes {
    values: Vec<i8>,
    samples: usize,
    ploidy: usize,
}

impl Genotypes {
    /// Returns a new genotype array over a flat, variant-major buffer.
    ///
    /// The buffer length must be a multiple of `samples * ploidy`, and `ploidy` must
    /// be at least 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtstats::gt::Genotypes;
    /// let g = Genotypes::new(vec![0, 0, 0, 1, 1, 1, 0, 0], 2, 2).unwrap();
    /// assert_eq!(g.n_variants(), 2);
    ///
    /// assert!(Genotypes::new(vec![0, 0, 0], 2, 2).is_err());
    /// ```
    pub fn new(values: Vec<i8>, samples: usize, ploidy: usize) -> Result<Self> {
        let width = samples * ploidy;

        if ploidy == 0 || width == 0 && !values.is_empty() || width > 0 && values.len() % width != 0
        {
            Err(Error::GenotypeShape {
                len: values.len(),
                samples,
                ploidy,
            })
        } else {
            Ok(Self::new_unchecked(values, samples, ploidy))
        }
    }

    pub(crate) fn new_unchecked(values: Vec<i8>, samples: usize, ploidy: usize) -> Self {
        Self {
            values,
            samples,
            ploidy,
        }
    }

    /// Returns an empty array with the given sample dimensions, ready to be extended.
    pub fn empty(samples: usize, ploidy: usize) -> Self {
        Self::new_unchecked(Vec::new(), samples, ploidy)
    }

    /// Appends the variants of another array with the same sample dimensions.
    pub fn append(&mut self, other: &Genotypes) -> Result<()> {
        if self.samples != other.samples || self.ploidy != other.ploidy {
            return Err(Error::ShapeMismatch {
                left: self.width(),
                right: other.width(),
            });
        }

        self.values.extend_from_slice(&other.values);
        Ok(())
    }

    /// Returns a view of the entire array.
    pub fn view(&self) -> GenotypesView {
        GenotypesView {
            values: &self.values,
            samples: self.samples,
            ploidy: self.ploidy,
        }
    }

    impl_shared_genotype_methods! {}
}

impl AsGenotypesView for Genotypes {
    #[inline]
    fn as_genotypes_view(&self) -> GenotypesView {
        self.view()
    }
}

/// A view of a contiguous range of variants in a genotype array.
///
/// This may or may not be the entire array; it is the type blocks are presented as
/// during chunked execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenotypesView<'a> {
    values: &'a [i8],
    samples: usize,
    ploidy: usize,
}

impl<'a> GenotypesView<'a> {
    /// Returns a new view over a flat, variant-major buffer.
    ///
    /// The buffer length must be a multiple of `samples * ploidy`. See
    /// [`Genotypes::new`] for the owned equivalent.
    pub fn new(values: &'a [i8], samples: usize, ploidy: usize) -> Result<Self> {
        let width = samples * ploidy;

        if ploidy == 0 || width == 0 && !values.is_empty() || width > 0 && values.len() % width != 0
        {
            Err(Error::GenotypeShape {
                len: values.len(),
                samples,
                ploidy,
            })
        } else {
            Ok(Self {
                values,
                samples,
                ploidy,
            })
        }
    }

    /// Returns a single block of variants.
    ///
    /// # Panics
    ///
    /// Panics if `start + size` exceeds the number of variants.
    pub(crate) fn block(&self, start: usize, size: usize) -> Self {
        let width = self.width();

        Self {
            values: &self.values[width * start..][..width * size],
            samples: self.samples,
            ploidy: self.ploidy,
        }
    }

    /// Returns two views by splitting the variant axis at `variant`.
    ///
    /// # Panics
    ///
    /// Panics if `variant` is out of bounds.
    pub fn split(&self, variant: usize) -> (Self, Self) {
        let (hd, tl) = self.values.split_at(variant * self.width());

        (
            Self {
                values: hd,
                samples: self.samples,
                ploidy: self.ploidy,
            },
            Self {
                values: tl,
                samples: self.samples,
                ploidy: self.ploidy,
            },
        )
    }

    /// Returns an iterator over blocks of variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtstats::{genotypes, gt::Blocks};
    /// let g = genotypes![
    ///     [[0, 0]],
    ///     [[0, 1]],
    ///     [[1, 1]],
    /// ];
    /// let mut iter = g.view().iter_blocks(Blocks::Size(2));
    /// assert_eq!(iter.next().unwrap().n_variants(), 2);
    /// assert_eq!(iter.next().unwrap().n_variants(), 1);
    /// assert!(iter.next().is_none());
    /// ```
    pub fn iter_blocks(&self, blocks: Blocks) -> BlockIter<'a> {
        BlockIter::new(*self, blocks.to_spec(self.n_variants()))
    }

    /// Returns a parallel iterator over blocks of variants.
    ///
    /// This is the parallel version of [`GenotypesView::iter_blocks`]; blocks are
    /// emitted in deterministic axis order when collected.
    pub fn par_iter_blocks(&self, blocks: Blocks) -> ParBlockIter<'a> {
        ParBlockIter::new(*self, blocks.to_spec(self.n_variants()))
    }

    /// Returns a new owned copy of the viewed variants.
    pub fn to_owned(&self) -> Genotypes {
        Genotypes::new_unchecked(self.values.to_vec(), self.samples, self.ploidy)
    }

    impl_shared_genotype_methods! {}
}

impl<'a> AsGenotypesView for GenotypesView<'a> {
    #[inline]
    fn as_genotypes_view(&self) -> GenotypesView {
        *self
    }
}

/// A type that can be cheaply converted to a genotype view.
pub trait AsGenotypesView {
    /// Returns a genotype view of `self`.
    fn as_genotypes_view(&self) -> GenotypesView;
}

impl<T> AsGenotypesView for &T
where
    T: AsGenotypesView,
{
    #[inline]
    fn as_genotypes_view(&self) -> GenotypesView {
        T::as_genotypes_view(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for allele in 0..=127u8 {
            assert_eq!(decode(encode(Some(allele))), Some(allele));
        }
        assert_eq!(decode(encode(None)), None);
        // Any negative value decodes as missing.
        assert_eq!(decode(-2), None);
    }

    #[test]
    fn new_rejects_ragged_buffer() {
        assert!(Genotypes::new(vec![0; 7], 2, 2).is_err());
        assert!(Genotypes::new(vec![0; 8], 2, 2).is_ok());
        assert!(Genotypes::new(vec![0; 4], 4, 1).is_ok());
        assert!(Genotypes::new(vec![0; 4], 2, 0).is_err());
    }

    #[test]
    fn shape_accessors() {
        let g = genotypes![
            [[0, 0, 0], [0, 0, 1]],
            [[0, 1, 1], [1, 1, 1]],
        ];
        assert_eq!(g.n_variants(), 2);
        assert_eq!(g.n_samples(), 2);
        assert_eq!(g.ploidy(), 3);
        assert_eq!(g.view().variant_slice(1), &[0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn append_checks_shape() {
        let mut g = Genotypes::empty(2, 2);
        g.append(&genotypes![[[0, 0], [0, 1]]]).unwrap();
        g.append(&genotypes![[[1, 1], [1, 1]]]).unwrap();
        assert_eq!(g.n_variants(), 2);

        assert!(g.append(&genotypes![[[0], [1]]]).is_err());
    }

    #[test]
    fn haploid_arrays() {
        let g = genotypes![
            [[0], [1], [-1]],
            [[1], [1], [0]],
        ];
        assert_eq!(g.ploidy(), 1);
        assert!(g.view().call(0, 2).is_missing());
        assert!(g.view().call(1, 0).is_hom_alt());
    }
}
