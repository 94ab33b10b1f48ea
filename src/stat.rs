//! Population-genetic summary statistics.
//!
//! Per-variant statistics are calculated blockwise over a [`BlockSource`] and
//! concatenated, so results do not depend on the block size or backend. Ratios that
//! are undefined at a site (for lack of called data) are marked NaN in positional
//! outputs; downstream reductions skip such sites.

use crate::{
    count::{AlleleCounts, AlleleFrequencies},
    error::{Error, Result},
    exec::{BlockSize, BlockSource},
};

pub mod admix;
pub mod fst;
pub mod ld;
pub mod window;

/// Calculates the observed heterozygosity of each variant.
///
/// The observed heterozygosity is the fraction of heterozygous calls among the fully
/// called calls at the variant, optionally restricted to the samples flagged `true` in
/// `samples`. Variants with no fully called calls are NaN.
pub fn heterozygosity_observed<S>(
    source: &S,
    samples: Option<&[bool]>,
    block_size: BlockSize,
) -> Result<Vec<f64>>
where
    S: BlockSource,
{
    if let Some(mask) = samples {
        if mask.len() != source.n_samples() {
            return Err(Error::MaskLength {
                expected: source.n_samples(),
                found: mask.len(),
            });
        }
    }

    source.try_fold_blocks(
        block_size,
        Vec::with_capacity(source.n_variants()),
        |mut het, block| {
            for variant in 0..block.n_variants() {
                let mut called = 0usize;
                let mut hets = 0usize;

                for (sample, call) in block.iter_variant_calls(variant).enumerate() {
                    if let Some(mask) = samples {
                        if !mask[sample] {
                            continue;
                        }
                    }

                    if call.is_called() {
                        called += 1;
                        hets += usize::from(call.is_het());
                    }
                }

                het.push(if called > 0 {
                    hets as f64 / called as f64
                } else {
                    f64::NAN
                });
            }

            Ok(het)
        },
    )
}

/// Calculates the expected heterozygosity of each variant.
///
/// The expected heterozygosity under random mating is `1 - Σ pᵢ²` over the allele
/// frequencies `pᵢ` of the variant. Variants with undefined frequencies are NaN.
pub fn heterozygosity_expected(frequencies: &AlleleFrequencies) -> Vec<f64> {
    (0..frequencies.n_variants())
        .map(|variant| {
            let hom: f64 = frequencies.row(variant).iter().map(|p| p * p).sum();
            1.0 - hom
        })
        .collect()
}

/// Calculates the mean number of pairwise differences at each variant.
///
/// This is the probability that two distinct allele copies drawn without replacement
/// at the variant differ, `(an² - Σ cᵢ²) / (an (an - 1))` over the allele counts `cᵢ`
/// and allele number `an`. Variants with fewer than two called copies are NaN.
pub fn mean_pairwise_difference(counts: &AlleleCounts) -> Vec<f64> {
    (0..counts.n_variants())
        .map(|variant| {
            let an = f64::from(counts.allele_number(variant));
            if an < 2.0 {
                return f64::NAN;
            }

            let hom: f64 = counts
                .counts(variant)
                .iter()
                .map(|&c| f64::from(c) * f64::from(c))
                .sum();

            (an * an - hom) / (an * (an - 1.0))
        })
        .collect()
}

/// Calculates a chi-squared test statistic against Hardy-Weinberg equilibrium for each
/// variant.
///
/// Only calls involving alleles 0 and 1 enter the test; each variant's fully called
/// hom-ref, het, and hom-alt calls are compared against their expectation under the
/// allele frequency at the variant. Variants where the expectation degenerates (no
/// calls, or a fixed allele) are NaN. Errors if the source is not diploid.
pub fn hardy_weinberg<S>(source: &S, block_size: BlockSize) -> Result<Vec<f64>>
where
    S: BlockSource,
{
    if source.ploidy() != 2 {
        return Err(Error::Ploidy {
            expected: 2,
            found: source.ploidy(),
        });
    }

    source.try_fold_blocks(
        block_size,
        Vec::with_capacity(source.n_variants()),
        |mut chi2, block| {
            for variant in 0..block.n_variants() {
                let mut hom_ref = 0usize;
                let mut het = 0usize;
                let mut hom_alt = 0usize;

                for call in block.iter_variant_calls(variant) {
                    match call.as_slice() {
                        [0, 0] => hom_ref += 1,
                        [1, 1] => hom_alt += 1,
                        [0, 1] | [1, 0] => het += 1,
                        _ => (),
                    }
                }

                chi2.push(hardy_weinberg_statistic(hom_ref, het, hom_alt));
            }

            Ok(chi2)
        },
    )
}

fn hardy_weinberg_statistic(hom_ref: usize, het: usize, hom_alt: usize) -> f64 {
    let n = (hom_ref + het + hom_alt) as f64;
    if n == 0.0 {
        return f64::NAN;
    }

    let p = (2.0 * hom_ref as f64 + het as f64) / (2.0 * n);
    let q = 1.0 - p;

    let expected = [n * p * p, 2.0 * n * p * q, n * q * q];
    if expected.iter().any(|&e| e == 0.0) {
        return f64::NAN;
    }

    [hom_ref as f64, het as f64, hom_alt as f64]
        .iter()
        .zip(expected.iter())
        .map(|(obs, exp)| (obs - exp) * (obs - exp) / exp)
        .sum()
}
