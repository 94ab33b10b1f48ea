//! Admixture statistics: Patterson's f-statistics with block-jackknife errors.
//!
//! The f-statistics are exposed per-variant as estimator components; genome-wide
//! estimates are formed as ratios of block sums, with standard errors from a
//! delete-one block jackknife. Variants where a component is undefined carry NaN and
//! are skipped by the block sums.

use crate::{
    count::AlleleCounts,
    error::{Error, Result},
};

/// A blockwise estimate of a ratio statistic with its jackknife error.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockwiseEstimate {
    /// The genome-wide estimate, as the ratio of summed components.
    pub estimate: f64,
    /// The delete-one block jackknife standard error.
    pub standard_error: f64,
    /// The estimate divided by its standard error, NaN when the jackknife spread
    /// is zero.
    pub z_score: f64,
    /// The delete-one estimates, one per block.
    pub per_block: Vec<f64>,
}

/// Calculates the unbiased within-population heterozygosity estimate at each variant.
///
/// This is `c₀ c₁ / (an (an - 1))` over the two allele counts, the probability that
/// two copies drawn without replacement differ. Variants with fewer than two called
/// copies are NaN. Errors if the counts cover more than two alleles.
pub fn h_hat(counts: &AlleleCounts) -> Result<Vec<f64>> {
    check_biallelic(counts)?;

    Ok((0..counts.n_variants())
        .map(|variant| {
            let an = f64::from(counts.allele_number(variant));
            if an < 2.0 {
                return f64::NAN;
            }

            let c0 = f64::from(counts.count(variant, 0));
            let c1 = f64::from(alt_count(counts, variant));
            c0 * c1 / (an * (an - 1.0))
        })
        .collect())
}

/// Calculates Patterson's f2 at each variant.
///
/// `f2(A, B) = (a - b)² - hᴬ/nᴬ - hᴮ/nᴮ` over the allele-1 frequencies `a`, `b`, the
/// heterozygosity estimates `h`, and the allele numbers `n`. Variants undefined in
/// either population are NaN.
pub fn patterson_f2(aca: &AlleleCounts, acb: &AlleleCounts) -> Result<Vec<f64>> {
    check_shapes(&[aca, acb])?;

    let ha = h_hat(aca)?;
    let hb = h_hat(acb)?;

    Ok((0..aca.n_variants())
        .map(|variant| {
            let (a, na) = frequency(aca, variant);
            let (b, nb) = frequency(acb, variant);
            let diff = a - b;
            diff * diff - ha[variant] / na - hb[variant] / nb
        })
        .collect())
}

/// Calculates per-variant components of Patterson's f3(C; A, B).
///
/// Returns the unnormalised numerator `T = (c - a)(c - b) - hᶜ/nᶜ` and the
/// normalisation `B = 2 hᶜ`, where `c` is the allele-1 frequency in the test
/// population `C`. A significantly negative ratio of sums is evidence that `C` is
/// admixed between sources related to `A` and `B`. Variants undefined in any
/// population are NaN in both components.
pub fn patterson_f3(
    acc: &AlleleCounts,
    aca: &AlleleCounts,
    acb: &AlleleCounts,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_shapes(&[acc, aca, acb])?;

    let hc = h_hat(acc)?;

    let mut num = Vec::with_capacity(acc.n_variants());
    let mut den = Vec::with_capacity(acc.n_variants());

    for variant in 0..acc.n_variants() {
        let (c, nc) = frequency(acc, variant);
        let (a, _) = frequency(aca, variant);
        let (b, _) = frequency(acb, variant);

        num.push((c - a) * (c - b) - hc[variant] / nc);
        den.push(2.0 * hc[variant]);
    }

    Ok((num, den))
}

/// Calculates per-variant components of Patterson's D (the ABBA-BABA statistic).
///
/// Returns the numerator `(a - b)(c - d)` and denominator
/// `(a + b - 2ab)(c + d - 2cd)` over the allele-1 frequencies of the four
/// populations. A ratio of sums significantly different from zero is evidence of gene
/// flow. Variants undefined in any population are NaN in both components.
pub fn patterson_d(
    aca: &AlleleCounts,
    acb: &AlleleCounts,
    acc: &AlleleCounts,
    acd: &AlleleCounts,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_shapes(&[aca, acb, acc, acd])?;
    for counts in [aca, acb, acc, acd] {
        check_biallelic(counts)?;
    }

    let mut num = Vec::with_capacity(aca.n_variants());
    let mut den = Vec::with_capacity(aca.n_variants());

    for variant in 0..aca.n_variants() {
        let (a, _) = frequency(aca, variant);
        let (b, _) = frequency(acb, variant);
        let (c, _) = frequency(acc, variant);
        let (d, _) = frequency(acd, variant);

        num.push((a - b) * (c - d));
        den.push((a + b - 2.0 * a * b) * (c + d - 2.0 * c * d));
    }

    Ok((num, den))
}

/// Allele-1 frequency and allele number at the variant; a frequency of NaN marks an
/// uncalled variant.
fn frequency(counts: &AlleleCounts, variant: usize) -> (f64, f64) {
    let an = f64::from(counts.allele_number(variant));
    if an == 0.0 {
        (f64::NAN, an)
    } else {
        (f64::from(alt_count(counts, variant)) / an, an)
    }
}

fn alt_count(counts: &AlleleCounts, variant: usize) -> u32 {
    if counts.n_alleles() > 1 {
        counts.count(variant, 1)
    } else {
        0
    }
}

fn check_biallelic(counts: &AlleleCounts) -> Result<()> {
    if counts.n_alleles() > 2 {
        Err(Error::NotBiallelic {
            alleles: counts.n_alleles(),
        })
    } else {
        Ok(())
    }
}

fn check_shapes(populations: &[&AlleleCounts]) -> Result<()> {
    for pair in populations.windows(2) {
        if pair[0].n_variants() != pair[1].n_variants() {
            return Err(Error::ShapeMismatch {
                left: pair[0].n_variants(),
                right: pair[1].n_variants(),
            });
        }
    }
    Ok(())
}

/// Sums values in full, non-overlapping blocks of `size` variants.
///
/// Undefined values are skipped within each block, and the trailing partial block is
/// dropped, so every block sum covers the same stretch of the variant axis.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn moving_sum(values: &[f64], size: usize) -> Vec<f64> {
    assert!(size > 0, "cannot sum over zero-sized blocks");

    values
        .chunks_exact(size)
        .map(|block| block.iter().filter(|v| !v.is_nan()).sum())
        .collect()
}

/// Estimates a ratio statistic from per-block component sums with a delete-one
/// jackknife.
///
/// The estimate is the ratio of the total sums; each delete-one value re-forms the
/// ratio with one block left out, and the spread of those values gives the standard
/// error. Errors if the component vectors differ in length or fewer than two blocks
/// are given.
pub fn jackknife_ratio(num: &[f64], den: &[f64]) -> Result<BlockwiseEstimate> {
    if num.len() != den.len() {
        return Err(Error::ShapeMismatch {
            left: num.len(),
            right: den.len(),
        });
    }
    if num.len() < 2 {
        return Err(Error::InsufficientBlocks { found: num.len() });
    }

    let num_sum: f64 = num.iter().sum();
    let den_sum: f64 = den.iter().sum();
    let estimate = num_sum / den_sum;

    let per_block: Vec<f64> = num
        .iter()
        .zip(den.iter())
        .map(|(n, d)| (num_sum - n) / (den_sum - d))
        .collect();

    let m = per_block.len() as f64;
    let mean = per_block.iter().sum::<f64>() / m;
    let variance = per_block
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        * (m - 1.0)
        / m;
    let standard_error = variance.sqrt();
    let z_score = if standard_error == 0.0 {
        f64::NAN
    } else {
        estimate / standard_error
    };

    Ok(BlockwiseEstimate {
        estimate,
        standard_error,
        z_score,
        per_block,
    })
}

/// Estimates Patterson's f3(C; A, B) with block-jackknife errors.
///
/// Per-variant components are summed in full blocks of `block_size` variants, and the
/// ratio of sums is jackknifed over the blocks.
pub fn blockwise_f3(
    acc: &AlleleCounts,
    aca: &AlleleCounts,
    acb: &AlleleCounts,
    block_size: usize,
) -> Result<BlockwiseEstimate> {
    let (num, den) = patterson_f3(acc, aca, acb)?;
    jackknife_ratio(&moving_sum(&num, block_size), &moving_sum(&den, block_size))
}

/// Estimates Patterson's D with block-jackknife errors.
///
/// Per-variant components are summed in full blocks of `block_size` variants, and the
/// ratio of sums is jackknifed over the blocks.
pub fn blockwise_d(
    aca: &AlleleCounts,
    acb: &AlleleCounts,
    acc: &AlleleCounts,
    acd: &AlleleCounts,
    block_size: usize,
) -> Result<BlockwiseEstimate> {
    let (num, den) = patterson_d(aca, acb, acc, acd)?;
    jackknife_ratio(&moving_sum(&num, block_size), &moving_sum(&den, block_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    use crate::{count::allele_counts_with, exec::BlockSize, genotypes, gt::Genotypes};

    fn counts(g: Genotypes) -> AlleleCounts {
        allele_counts_with(&g, 2, None, BlockSize::Auto).unwrap()
    }

    #[test]
    fn h_hat_matches_hand_calculation() {
        let ac = counts(genotypes![
            [[0, 0], [0, 1], [1, 1]],
            [[0, 0], [0, 0], [0, 0]],
            [[0, -1], [-1, -1], [-1, -1]],
        ]);

        let h = h_hat(&ac).unwrap();

        // counts [3, 3], an = 6: 9 / 30.
        assert_abs_diff_eq!(h[0], 0.3);
        assert_abs_diff_eq!(h[1], 0.0);
        assert!(h[2].is_nan());
    }

    #[test]
    fn h_hat_rejects_multiallelic_counts() {
        let g = genotypes![[[0, 2], [1, 2]]];
        let ac = allele_counts_with(&g, 3, None, BlockSize::Auto).unwrap();

        assert!(matches!(
            h_hat(&ac).unwrap_err(),
            Error::NotBiallelic { alleles: 3 }
        ));
    }

    #[test]
    fn f2_is_zero_for_identical_populations() {
        let aca = counts(genotypes![[[0, 0], [0, 1]], [[0, 1], [1, 1]]]);
        let acb = counts(genotypes![[[0, 0], [0, 1]], [[0, 1], [1, 1]]]);

        let f2 = patterson_f2(&aca, &acb).unwrap();

        // The frequency difference is zero and the corrections cancel in expectation;
        // here the point values are just minus twice the correction.
        for (variant, value) in f2.iter().enumerate() {
            let (_, n) = frequency(&aca, variant);
            let h = h_hat(&aca).unwrap()[variant];
            assert_abs_diff_eq!(*value, -2.0 * h / n);
        }
    }

    #[test]
    fn f3_components_for_fixed_differences() {
        // C fixed for 0, A fixed for 0, B fixed for 1: (c-a)(c-b) = 0 * -1 = 0,
        // and the test population has no heterozygosity.
        let acc = counts(genotypes![[[0, 0], [0, 0]]]);
        let aca = counts(genotypes![[[0, 0], [0, 0]]]);
        let acb = counts(genotypes![[[1, 1], [1, 1]]]);

        let (num, den) = patterson_f3(&acc, &aca, &acb).unwrap();
        assert_abs_diff_eq!(num[0], 0.0);
        assert_abs_diff_eq!(den[0], 0.0);
    }

    #[test]
    fn d_components_for_abba_site() {
        // a = 0, b = 1, c = 1, d = 0: num = (0-1)(1-0) = -1, den = 1.
        let aca = counts(genotypes![[[0, 0], [0, 0]]]);
        let acb = counts(genotypes![[[1, 1], [1, 1]]]);
        let acc = counts(genotypes![[[1, 1], [1, 1]]]);
        let acd = counts(genotypes![[[0, 0], [0, 0]]]);

        let (num, den) = patterson_d(&aca, &acb, &acc, &acd).unwrap();
        assert_abs_diff_eq!(num[0], -1.0);
        assert_abs_diff_eq!(den[0], 1.0);
    }

    #[test]
    fn moving_sum_skips_nan_and_drops_partial_block() {
        let values = [1.0, f64::NAN, 2.0, 3.0, 4.0];
        assert_eq!(moving_sum(&values, 2), vec![1.0, 5.0]);
    }

    #[test]
    fn jackknife_of_constant_blocks_has_zero_error() {
        let num = [2.0, 2.0, 2.0, 2.0];
        let den = [4.0, 4.0, 4.0, 4.0];

        let estimate = jackknife_ratio(&num, &den).unwrap();

        assert_abs_diff_eq!(estimate.estimate, 0.5);
        assert_abs_diff_eq!(estimate.standard_error, 0.0);
        // No spread: the z-score is undefined rather than infinite.
        assert!(estimate.z_score.is_nan());
        assert!(estimate.per_block.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn jackknife_requires_two_blocks() {
        assert!(matches!(
            jackknife_ratio(&[1.0], &[2.0]).unwrap_err(),
            Error::InsufficientBlocks { found: 1 }
        ));
    }

    #[test]
    fn blockwise_d_detects_consistent_excess() {
        // Every site is an ABBA site, so D = -1 in every block with zero spread.
        let aca = counts(genotypes![[[0, 0]], [[0, 0]], [[0, 0]], [[0, 0]]]);
        let acb = counts(genotypes![[[1, 1]], [[1, 1]], [[1, 1]], [[1, 1]]]);
        let acc = counts(genotypes![[[1, 1]], [[1, 1]], [[1, 1]], [[1, 1]]]);
        let acd = counts(genotypes![[[0, 0]], [[0, 0]], [[0, 0]], [[0, 0]]]);

        let estimate = blockwise_d(&aca, &acb, &acc, &acd, 2).unwrap();
        assert_abs_diff_eq!(estimate.estimate, -1.0);
        assert_abs_diff_eq!(estimate.standard_error, 0.0);
    }
}
