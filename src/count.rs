//! Allele counting and the derived counts and frequencies arrays.
//!
//! The counting kernel reduces a block of genotype calls to per-variant, per-allele
//! copy counts. The allele dimension is fixed by the caller from a whole-dataset scan
//! (see [`max_allele`]), so per-block outputs concatenate without realignment, which is
//! what makes counting safe to run blockwise in any partition.

use std::ops::{Add, AddAssign};

use crate::{
    error::{Error, Result},
    exec::{BlockSize, BlockSource},
    gt::{AsGenotypesView, Selection},
};

/// A derived array of per-variant, per-allele copy counts.
///
/// In addition to the counts, the array carries a per-variant tally of missing allele
/// copies, so that `counts + missing = ploidy * samples` holds for every variant when
/// no sample selection is applied. Counts are independently owned results, never
/// aliases into the genotype array they were derived from.
///
/// # Examples
///
/// ```
/// use gtstats::{count::AlleleCounts, genotypes};
/// let g = genotypes![
///     [[0, 0], [0, 1], [1, 1]],
///     [[0, 1], [-1, -1], [1, 1]],
/// ];
/// let ac = AlleleCounts::from_genotypes(&g, 2, None).unwrap();
/// assert_eq!(ac.counts(0), &[3, 3]);
/// assert_eq!(ac.counts(1), &[1, 3]);
/// assert_eq!(ac.missing_copies(1), 2);
/// assert_eq!(ac.allele_number(1), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlleleCounts {
    counts: Vec<u32>,
    missing: Vec<u32>,
    alleles: usize,
}

impl AlleleCounts {
    /// Returns a zero-initialised counts array.
    pub fn zeros(variants: usize, alleles: usize) -> Self {
        Self {
            counts: vec![0; variants * alleles],
            missing: vec![0; variants],
            alleles,
        }
    }

    /// Returns an empty counts array over the given allele dimension, ready to be
    /// extended with [`AlleleCounts::append`].
    pub fn empty(alleles: usize) -> Self {
        Self::zeros(0, alleles)
    }

    /// Counts allele copies in a block of genotype calls.
    ///
    /// This is the per-block counting kernel. `alleles` is the allele dimension of the
    /// output and must cover the maximum allele index of the *entire* dataset, not just
    /// this block; an allele at or above it is an error, not a silent truncation.
    /// When a sample mask is given, only the samples where the mask is `true`
    /// contribute; the mask must have one entry per sample.
    ///
    /// Counting is pure accumulation, so the result does not depend on the order in
    /// which calls are visited.
    pub fn from_genotypes<G>(genotypes: G, alleles: usize, samples: Option<&[bool]>) -> Result<Self>
    where
        G: AsGenotypesView,
    {
        let view = genotypes.as_genotypes_view();

        if let Some(mask) = samples {
            if mask.len() != view.n_samples() {
                return Err(Error::MaskLength {
                    expected: view.n_samples(),
                    found: mask.len(),
                });
            }
        }

        let mut out = Self::zeros(view.n_variants(), alleles);

        for variant in 0..view.n_variants() {
            let row = &mut out.counts[variant * alleles..][..alleles];

            for (sample, call) in view.iter_variant_calls(variant).enumerate() {
                if let Some(mask) = samples {
                    if !mask[sample] {
                        continue;
                    }
                }

                for &copy in call.as_slice() {
                    match crate::gt::decode(copy) {
                        Some(allele) if (allele as usize) < alleles => {
                            row[allele as usize] += 1;
                        }
                        Some(allele) => {
                            return Err(Error::AlleleOutOfRange { allele, alleles });
                        }
                        None => out.missing[variant] += 1,
                    }
                }
            }
        }

        Ok(out)
    }

    /// Returns the number of variants.
    #[inline]
    pub fn n_variants(&self) -> usize {
        self.missing.len()
    }

    /// Returns the allele dimension.
    #[inline]
    pub fn n_alleles(&self) -> usize {
        self.alleles
    }

    /// Returns the per-allele counts of one variant.
    ///
    /// # Panics
    ///
    /// Panics if `variant` is out of bounds.
    pub fn counts(&self, variant: usize) -> &[u32] {
        &self.counts[variant * self.alleles..][..self.alleles]
    }

    /// Returns the count of one allele at one variant.
    pub fn count(&self, variant: usize, allele: usize) -> u32 {
        self.counts(variant)[allele]
    }

    /// Returns the number of missing allele copies at one variant.
    pub fn missing_copies(&self, variant: usize) -> u32 {
        self.missing[variant]
    }

    /// Returns the allele number of one variant: the total number of called copies.
    pub fn allele_number(&self, variant: usize) -> u32 {
        self.counts(variant).iter().sum()
    }

    /// Returns the highest allele index observed at one variant, if any copy was called.
    pub fn max_allele(&self, variant: usize) -> Option<u8> {
        self.counts(variant)
            .iter()
            .rposition(|&count| count > 0)
            .map(|allele| allele as u8)
    }

    /// Returns the number of distinct alleles observed at one variant.
    pub fn allelism(&self, variant: usize) -> usize {
        self.counts(variant)
            .iter()
            .filter(|&&count| count > 0)
            .count()
    }

    /// Returns `true` if more than one allele is observed at the variant.
    pub fn is_segregating(&self, variant: usize) -> bool {
        self.allelism(variant) > 1
    }

    /// Returns the frequency of one allele at one variant.
    ///
    /// `None` when the allele number is zero, i.e. no copies were called; the
    /// frequency is undefined there, not zero.
    pub fn frequency(&self, variant: usize, allele: usize) -> Option<f64> {
        match self.allele_number(variant) {
            0 => None,
            an => Some(f64::from(self.count(variant, allele)) / f64::from(an)),
        }
    }

    /// Returns the derived frequencies array.
    ///
    /// Variants with zero called copies get NaN-marked rows, see
    /// [`AlleleFrequencies::is_defined`].
    pub fn to_frequencies(&self) -> AlleleFrequencies {
        let mut values = Vec::with_capacity(self.counts.len());

        for variant in 0..self.n_variants() {
            match self.allele_number(variant) {
                0 => values.extend(std::iter::repeat(f64::NAN).take(self.alleles)),
                an => values.extend(
                    self.counts(variant)
                        .iter()
                        .map(|&count| f64::from(count) / f64::from(an)),
                ),
            }
        }

        AlleleFrequencies {
            values,
            alleles: self.alleles,
        }
    }

    /// Appends the variants of another counts array with the same allele dimension.
    ///
    /// This is the combine step for blockwise counting: concatenation along the
    /// variant axis.
    pub fn append(&mut self, other: &AlleleCounts) -> Result<()> {
        if self.alleles != other.alleles {
            return Err(Error::ShapeMismatch {
                left: self.alleles,
                right: other.alleles,
            });
        }

        self.counts.extend_from_slice(&other.counts);
        self.missing.extend_from_slice(&other.missing);
        Ok(())
    }

    /// Adds another counts array elementwise, pooling two sample subsets.
    ///
    /// Both arrays must have the same variant and allele dimensions.
    pub fn pool(&mut self, other: &AlleleCounts) -> Result<()> {
        if self.n_variants() != other.n_variants() {
            return Err(Error::ShapeMismatch {
                left: self.n_variants(),
                right: other.n_variants(),
            });
        }
        if self.alleles != other.alleles {
            return Err(Error::ShapeMismatch {
                left: self.alleles,
                right: other.alleles,
            });
        }

        for (lhs, rhs) in self.counts.iter_mut().zip(&other.counts) {
            *lhs += rhs;
        }
        for (lhs, rhs) in self.missing.iter_mut().zip(&other.missing) {
            *lhs += rhs;
        }
        Ok(())
    }

    /// Returns `true` if no copies were called at any variant.
    pub fn is_empty_population(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Returns a new counts array containing the selected variants.
    ///
    /// Applying the same selection used on the source genotype array keeps counts
    /// row-aligned with it.
    pub fn select_variants(&self, selection: &Selection) -> Result<Self> {
        let indices = selection.resolve(self.n_variants())?;

        let mut out = Self::empty(self.alleles);
        for i in &indices {
            out.counts.extend_from_slice(self.counts(*i));
        }
        out.missing.extend(indices.into_iter().map(|i| self.missing[i]));

        Ok(out)
    }
}

impl AddAssign<&AlleleCounts> for AlleleCounts {
    /// Pools another counts array elementwise.
    ///
    /// This is the operator form of [`AlleleCounts::pool`]; it panics where `pool`
    /// returns a shape error.
    fn add_assign(&mut self, rhs: &AlleleCounts) {
        assert_eq!(self.n_variants(), rhs.n_variants());
        assert_eq!(self.alleles, rhs.alleles);

        for (lhs, rhs) in self.counts.iter_mut().zip(&rhs.counts) {
            *lhs += rhs;
        }
        for (lhs, rhs) in self.missing.iter_mut().zip(&rhs.missing) {
            *lhs += rhs;
        }
    }
}

impl AddAssign<AlleleCounts> for AlleleCounts {
    #[inline]
    fn add_assign(&mut self, rhs: AlleleCounts) {
        self.add_assign(&rhs);
    }
}

impl Add<&AlleleCounts> for AlleleCounts {
    type Output = AlleleCounts;

    #[inline]
    fn add(mut self, rhs: &AlleleCounts) -> Self::Output {
        self += rhs;
        self
    }
}

impl Add<AlleleCounts> for AlleleCounts {
    type Output = AlleleCounts;

    #[inline]
    fn add(mut self, rhs: AlleleCounts) -> Self::Output {
        self += &rhs;
        self
    }
}

/// A derived array of per-variant allele frequencies.
///
/// Rows of variants where no copies were called are marked missing: every value in
/// such a row is NaN, and [`AlleleFrequencies::is_defined`] distinguishes them from
/// rows holding a valid zero.
#[derive(Clone, Debug, PartialEq)]
pub struct AlleleFrequencies {
    values: Vec<f64>,
    alleles: usize,
}

impl AlleleFrequencies {
    /// Returns the number of variants.
    #[inline]
    pub fn n_variants(&self) -> usize {
        match self.alleles {
            0 => 0,
            alleles => self.values.len() / alleles,
        }
    }

    /// Returns the allele dimension.
    #[inline]
    pub fn n_alleles(&self) -> usize {
        self.alleles
    }

    /// Returns the per-allele frequencies of one variant, NaN-marked where undefined.
    pub fn row(&self, variant: usize) -> &[f64] {
        &self.values[variant * self.alleles..][..self.alleles]
    }

    /// Returns the frequency of one allele at one variant, or `None` where undefined.
    pub fn frequency(&self, variant: usize, allele: usize) -> Option<f64> {
        let value = self.row(variant)[allele];

        (!value.is_nan()).then_some(value)
    }

    /// Returns `true` if the frequencies at the variant are defined.
    pub fn is_defined(&self, variant: usize) -> bool {
        !self.row(variant)[0].is_nan()
    }
}

/// Returns the highest allele index in the dataset, scanning blockwise.
///
/// `None` if every call in the dataset is missing (or the dataset is empty).
pub fn max_allele<S>(source: &S, block_size: BlockSize) -> Result<Option<u8>>
where
    S: BlockSource + ?Sized,
{
    source.try_fold_blocks(block_size, None, |max: Option<u8>, block| {
        let block_max = block
            .as_slice()
            .iter()
            .filter_map(|&copy| crate::gt::decode(copy))
            .max();

        Ok(max.max(block_max))
    })
}

/// Counts allele copies over a whole dataset, scanning blockwise.
///
/// The allele dimension is determined by a first blockwise pass over the dataset
/// ([`max_allele`]), the result is identical for any block size and for the
/// in-memory and store-backed backends. To supply the allele dimension directly, see
/// [`allele_counts_with`].
pub fn allele_counts<S>(
    source: &S,
    samples: Option<&[bool]>,
    block_size: BlockSize,
) -> Result<AlleleCounts>
where
    S: BlockSource + ?Sized,
{
    let alleles = match max_allele(source, block_size)? {
        Some(max) => usize::from(max) + 1,
        None => 1,
    };

    allele_counts_with(source, alleles, samples, block_size)
}

/// Counts allele copies over a whole dataset with a fixed allele dimension.
pub fn allele_counts_with<S>(
    source: &S,
    alleles: usize,
    samples: Option<&[bool]>,
    block_size: BlockSize,
) -> Result<AlleleCounts>
where
    S: BlockSource + ?Sized,
{
    source.try_fold_blocks(block_size, AlleleCounts::empty(alleles), |mut acc, block| {
        let partial = AlleleCounts::from_genotypes(block, alleles, samples)?;
        acc.append(&partial)?;
        Ok(acc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::genotypes;

    fn example() -> crate::gt::Genotypes {
        genotypes![
            [[0, 0], [0, 1], [1, 1]],
            [[0, 0], [0, 0], [0, 0]],
            [[0, 1], [-1, -1], [1, 1]],
            [[0, 0], [0, 1], [0, 1]],
        ]
    }

    #[test]
    fn counts_match_reference_scenario() {
        let ac = AlleleCounts::from_genotypes(example(), 2, None).unwrap();

        // Variant 0 (0/0, 0/1, 1/1) holds three copies of allele 1.
        let alt: Vec<u32> = (0..4).map(|v| ac.count(v, 1)).collect();
        assert_eq!(alt, vec![3, 0, 3, 2]);

        let an: Vec<u32> = (0..4).map(|v| ac.allele_number(v)).collect();
        assert_eq!(an, vec![6, 6, 4, 6]);
    }

    #[test]
    fn masked_counts_match_reference_scenario() {
        let g = example();
        let mask = [true, false, true];
        let ac = AlleleCounts::from_genotypes(&g, 2, Some(&mask)).unwrap();

        let alt: Vec<u32> = (0..4).map(|v| ac.count(v, 1)).collect();
        assert_eq!(alt, vec![2, 0, 3, 1]);

        let masked = g.select_samples(&crate::gt::Selection::Mask(&mask)).unwrap();
        let recounted = AlleleCounts::from_genotypes(&masked, 2, None).unwrap();
        assert_eq!(ac, recounted);
    }

    #[test]
    fn conservation_of_copies() {
        let g = example();
        let total = (g.n_samples() * g.ploidy()) as u32;
        let ac = AlleleCounts::from_genotypes(&g, 2, None).unwrap();

        for v in 0..ac.n_variants() {
            assert_eq!(ac.allele_number(v) + ac.missing_copies(v), total);
        }
    }

    #[test]
    fn partially_missing_copies_still_count() {
        let g = genotypes![[[1, -1], [0, 0]]];
        let ac = AlleleCounts::from_genotypes(&g, 2, None).unwrap();

        assert_eq!(ac.counts(0), &[2, 1]);
        assert_eq!(ac.missing_copies(0), 1);
    }

    #[test]
    fn allele_out_of_range_is_an_error() {
        let g = genotypes![[[0, 2]]];
        let err = AlleleCounts::from_genotypes(&g, 2, None).unwrap_err();
        assert!(matches!(
            err,
            Error::AlleleOutOfRange { allele: 2, alleles: 2 }
        ));
    }

    #[test]
    fn derived_queries() {
        let g = genotypes![
            [[0, 0], [0, 2]],
            [[-1, -1], [-1, -1]],
            [[1, 1], [1, 1]],
        ];
        let ac = AlleleCounts::from_genotypes(&g, 3, None).unwrap();

        assert_eq!(ac.max_allele(0), Some(2));
        assert_eq!(ac.max_allele(1), None);
        assert_eq!(ac.allelism(0), 2);
        assert!(ac.is_segregating(0));
        assert!(!ac.is_segregating(2));
        assert_eq!(ac.frequency(0, 0), Some(0.75));
        assert_eq!(ac.frequency(1, 0), None);
    }

    #[test]
    fn frequencies_mark_undefined_rows() {
        let g = genotypes![
            [[0, 1], [1, 1]],
            [[-1, -1], [-1, -1]],
        ];
        let af = AlleleCounts::from_genotypes(&g, 2, None)
            .unwrap()
            .to_frequencies();

        assert!(af.is_defined(0));
        assert_eq!(af.frequency(0, 1), Some(0.75));
        assert!(!af.is_defined(1));
        assert_eq!(af.frequency(1, 0), None);
        assert!(af.row(1).iter().all(|x| x.is_nan()));
    }

    #[test]
    fn blockwise_counts_are_partition_invariant() {
        let g = example();

        let whole = allele_counts(&g, None, BlockSize::Fixed(4)).unwrap();
        let split = allele_counts(&g, None, BlockSize::Fixed(1)).unwrap();
        let uneven = allele_counts(&g, None, BlockSize::Fixed(3)).unwrap();

        assert_eq!(whole, split);
        assert_eq!(whole, uneven);

        let alt: Vec<u32> = (0..4).map(|v| whole.count(v, 1)).collect();
        assert_eq!(alt, vec![3, 0, 3, 2]);
    }

    #[test]
    fn pool_adds_subpopulations() {
        let g = example();
        let left = AlleleCounts::from_genotypes(&g, 2, Some(&[true, true, false])).unwrap();
        let right = AlleleCounts::from_genotypes(&g, 2, Some(&[false, false, true])).unwrap();
        let all = AlleleCounts::from_genotypes(&g, 2, None).unwrap();

        let mut pooled = left;
        pooled.pool(&right).unwrap();
        assert_eq!(pooled, all);
    }

    #[test]
    fn select_variants_stays_aligned() {
        let g = example();
        let ac = AlleleCounts::from_genotypes(&g, 2, None).unwrap();

        let sel = Selection::Indices(&[2, 0]);
        let sub_g = g.select_variants(&sel).unwrap();
        let sub_ac = ac.select_variants(&sel).unwrap();
        let recounted = AlleleCounts::from_genotypes(&sub_g, 2, None).unwrap();

        assert_eq!(sub_ac, recounted);
    }
}
