//! Selection and filtering along the variant and sample axes.
//!
//! A [`Selection`] is a transient description of a subset (or reordering) of one axis.
//! Applying it never mutates the source array: it produces a new, independently owned
//! array. Applying the same selection to a genotype array and to any row-aligned
//! companion (positions, annotations, derived counts) preserves row correspondence.

use crate::error::{Error, Result};

use super::{Genotypes, GenotypesView};

/// A subset or reordering of one axis, given as a boolean mask or explicit indices.
///
/// A mask must have exactly the length of the axis it selects along. Indices must be
/// in range, but need not be sorted or unique: out-of-order indices reorder rows, and
/// duplicate indices replicate them.
///
/// # Examples
///
/// ```
/// use gtstats::{genotypes, gt::Selection};
/// let g = genotypes![
///     [[0, 0], [0, 1]],
///     [[1, 1], [0, 0]],
///     [[0, 1], [1, 1]],
/// ];
/// let sub = g.select_variants(&Selection::Mask(&[true, false, true])).unwrap();
/// assert_eq!(sub.n_variants(), 2);
/// assert_eq!(sub.as_slice(), &[0, 0, 0, 1, 0, 1, 1, 1]);
///
/// // Indices may reorder and replicate.
/// let sub = g.select_variants(&Selection::Indices(&[2, 0, 0])).unwrap();
/// assert_eq!(sub.as_slice(), &[0, 1, 1, 1, 0, 0, 0, 1, 0, 0, 0, 1]);
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Selection<'a> {
    /// Keep the rows where the mask is `true`, in axis order.
    Mask(&'a [bool]),
    /// Keep the rows at the given indices, in the given order.
    Indices(&'a [usize]),
}

impl<'a> Selection<'a> {
    /// Resolves the selection against an axis of the given length.
    ///
    /// Returns the selected indices in output order. Fails if a mask has the wrong
    /// length or an index is out of range.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>> {
        match *self {
            Self::Mask(mask) => {
                if mask.len() != len {
                    return Err(Error::MaskLength {
                        expected: len,
                        found: mask.len(),
                    });
                }

                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
            Self::Indices(indices) => {
                if let Some(&index) = indices.iter().find(|&&index| index >= len) {
                    return Err(Error::IndexOutOfRange { index, len });
                }

                Ok(indices.to_vec())
            }
        }
    }

    /// Applies the selection to a row-aligned companion slice.
    ///
    /// Selecting variants from a genotype array and applying the same selection to a
    /// companion slice (e.g. genomic positions) keeps row `i` of both outputs
    /// describing the same variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtstats::gt::Selection;
    /// let positions: Vec<u64> = vec![100, 250, 300, 420];
    /// let sel = Selection::Indices(&[3, 1]);
    /// assert_eq!(sel.apply_slice(&positions).unwrap(), vec![420, 250]);
    /// ```
    pub fn apply_slice<T: Clone>(&self, values: &[T]) -> Result<Vec<T>> {
        let indices = self.resolve(values.len())?;

        Ok(indices.into_iter().map(|i| values[i].clone()).collect())
    }
}

impl Genotypes {
    /// Returns a new array containing the selected variants.
    pub fn select_variants(&self, selection: &Selection) -> Result<Self> {
        self.view().select_variants(selection)
    }

    /// Returns a new array containing the selected samples.
    pub fn select_samples(&self, selection: &Selection) -> Result<Self> {
        self.view().select_samples(selection)
    }

    /// Returns a new array containing the selected variants and samples, in one pass.
    pub fn select(&self, variants: &Selection, samples: &Selection) -> Result<Self> {
        self.view().select(variants, samples)
    }
}

impl<'a> GenotypesView<'a> {
    /// Returns a new owned array containing the selected variants.
    pub fn select_variants(&self, selection: &Selection) -> Result<Genotypes> {
        let indices = selection.resolve(self.n_variants())?;
        let width = self.width();

        let mut values = Vec::with_capacity(indices.len() * width);
        for i in indices {
            values.extend_from_slice(self.variant_slice(i));
        }

        Ok(Genotypes::new_unchecked(
            values,
            self.n_samples(),
            self.ploidy(),
        ))
    }

    /// Returns a new owned array containing the selected samples.
    pub fn select_samples(&self, selection: &Selection) -> Result<Genotypes> {
        let indices = selection.resolve(self.n_samples())?;

        Ok(self.gather(0..self.n_variants(), &indices))
    }

    /// Returns a new owned array containing the selected variants and samples.
    ///
    /// Equivalent to selecting variants and then samples, but the data is copied once.
    pub fn select(&self, variants: &Selection, samples: &Selection) -> Result<Genotypes> {
        let variant_indices = variants.resolve(self.n_variants())?;
        let sample_indices = samples.resolve(self.n_samples())?;

        Ok(self.gather(variant_indices.into_iter(), &sample_indices))
    }

    fn gather<I>(&self, variants: I, samples: &[usize]) -> Genotypes
    where
        I: IntoIterator<Item = usize>,
        I::IntoIter: ExactSizeIterator,
    {
        let ploidy = self.ploidy();
        let variants = variants.into_iter();

        let mut values = Vec::with_capacity(variants.len() * samples.len() * ploidy);
        for v in variants {
            let row = self.variant_slice(v);
            for &s in samples {
                values.extend_from_slice(&row[s * ploidy..][..ploidy]);
            }
        }

        Genotypes::new_unchecked(values, samples.len(), ploidy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::genotypes;

    fn example() -> Genotypes {
        genotypes![
            [[0, 0], [0, 1], [1, 1]],
            [[0, 0], [0, 0], [0, 0]],
            [[0, 1], [-1, -1], [1, 1]],
            [[0, 0], [0, 1], [0, 1]],
        ]
    }

    #[test]
    fn mask_wrong_length_fails() {
        let g = example();
        let err = g
            .select_variants(&Selection::Mask(&[true, false]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MaskLength {
                expected: 4,
                found: 2
            }
        ));
    }

    #[test]
    fn index_out_of_range_fails() {
        let g = example();
        let err = g.select_samples(&Selection::Indices(&[0, 3])).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn select_samples_keeps_variant_axis() {
        let g = example();
        let sub = g.select_samples(&Selection::Indices(&[0, 2])).unwrap();
        assert_eq!(sub.n_variants(), 4);
        assert_eq!(sub.n_samples(), 2);
        assert_eq!(
            sub.as_slice(),
            &[0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1]
        );
    }

    #[test]
    fn compound_matches_sequential_selection() {
        let g = example();
        let variants = Selection::Mask(&[true, false, true, true]);
        let samples = Selection::Indices(&[2, 0]);

        let compound = g.select(&variants, &samples).unwrap();
        let sequential = g
            .select_variants(&variants)
            .unwrap()
            .select_samples(&samples)
            .unwrap();

        assert_eq!(compound, sequential);
    }

    #[test]
    fn companion_correspondence() {
        let g = example();
        let positions: Vec<u64> = vec![100, 250, 300, 420];
        let sel = Selection::Indices(&[3, 1, 1]);

        let sub = g.select_variants(&sel).unwrap();
        let sub_positions = sel.apply_slice(&positions).unwrap();

        assert_eq!(sub_positions, vec![420, 250, 250]);
        for (i, &orig) in [3usize, 1, 1].iter().enumerate() {
            assert_eq!(sub.view().variant_slice(i), g.view().variant_slice(orig));
        }
    }

    #[test]
    fn empty_selection_yields_empty_array() {
        let g = example();
        let sub = g.select_variants(&Selection::Indices(&[])).unwrap();
        assert_eq!(sub.n_variants(), 0);
        assert_eq!(sub.n_samples(), 3);
    }
}
