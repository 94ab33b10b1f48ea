use std::fmt;

use super::{decode, MISSING};

/// A single genotype call: the allele copies of one sample at one variant.
///
/// A call borrows a ploidy-length slice of the underlying genotype array. A call with
/// some copies missing and some present is *not* considered called (and therefore
/// neither het nor hom), but its present copies still contribute to allele counts via
/// [`Call::called_copies`].
///
/// # Examples
///
/// ```
/// use gtstats::genotypes;
/// let g = genotypes![
///     [[0, 0], [0, 1]],
///     [[1, 1], [-1, -1]],
/// ];
/// let view = g.view();
/// assert!(view.call(0, 0).is_hom_ref());
/// assert!(view.call(0, 1).is_het());
/// assert!(view.call(1, 0).is_hom_alt());
/// assert!(view.call(1, 1).is_missing());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Call<'a> {
    copies: &'a [i8],
}

impl<'a> Call<'a> {
    pub(crate) fn new_unchecked(copies: &'a [i8]) -> Self {
        Self { copies }
    }

    /// Returns the raw allele copies of the call.
    pub fn as_slice(&self) -> &'a [i8] {
        self.copies
    }

    /// Returns the ploidy of the call.
    #[inline]
    pub fn ploidy(&self) -> usize {
        self.copies.len()
    }

    /// Returns the decoded allele copies that are present in the call.
    ///
    /// Missing copies are skipped, so a partially missing call still yields its
    /// present copies. This is the iterator driving allele counting.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtstats::genotypes;
    /// let g = genotypes![[[0, -1]]];
    /// let view = g.view();
    /// let call = view.call(0, 0);
    /// assert!(call.is_missing());
    /// assert_eq!(call.called_copies().collect::<Vec<_>>(), vec![0]);
    /// ```
    pub fn called_copies(&self) -> impl Iterator<Item = u8> + 'a {
        self.copies.iter().filter_map(|&copy| decode(copy))
    }

    /// Returns `true` if all allele copies in the call are present.
    #[inline]
    pub fn is_called(&self) -> bool {
        self.copies.iter().all(|&copy| copy >= 0)
    }

    /// Returns `true` if any allele copy in the call is missing.
    #[inline]
    pub fn is_missing(&self) -> bool {
        !self.is_called()
    }

    /// Returns `true` if all allele copies in the call are missing.
    #[inline]
    pub fn is_fully_missing(&self) -> bool {
        self.copies.iter().all(|&copy| copy < 0)
    }

    /// Returns `true` if the call is fully present and all copies carry the same allele.
    pub fn is_hom(&self) -> bool {
        match self.copies.split_first() {
            Some((&first, rest)) => first >= 0 && rest.iter().all(|&copy| copy == first),
            None => false,
        }
    }

    /// Returns `true` if the call is fully present and its copies differ.
    ///
    /// A partially missing call is never het, even if its present copies differ.
    pub fn is_het(&self) -> bool {
        self.is_called()
            && match self.copies.split_first() {
                Some((&first, rest)) => rest.iter().any(|&copy| copy != first),
                None => false,
            }
    }

    /// Returns `true` if the call is homozygous for the reference allele.
    pub fn is_hom_ref(&self) -> bool {
        self.copies.iter().all(|&copy| copy == 0)
    }

    /// Returns `true` if the call is homozygous for any alternate allele.
    pub fn is_hom_alt(&self) -> bool {
        match self.copies.split_first() {
            Some((&first, rest)) => first > 0 && rest.iter().all(|&copy| copy == first),
            None => false,
        }
    }

    /// Returns the number of non-reference allele copies, or `None` if any copy is missing.
    ///
    /// This is the per-call dosage transform used for linkage disequilibrium.
    pub fn n_alt(&self) -> Option<u8> {
        self.is_called()
            .then(|| self.copies.iter().filter(|&&copy| copy > 0).count() as u8)
    }
}

impl fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Call").field(&self.copies).finish()
    }
}

impl fmt::Display for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &copy in self.copies {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            if copy < 0 {
                f.write_str(".")?;
            } else {
                write!(f, "{copy}")?;
            }
        }
        Ok(())
    }
}
