//! Population differentiation statistics.
//!
//! Fst estimators are exposed as per-variant (numerator, denominator) component pairs
//! rather than as per-variant ratios: summary estimates over regions are formed as the
//! ratio of summed components, which weights variants by their information content and
//! is far better behaved than averaging per-variant ratios. Sites where an estimator
//! is undefined carry NaN in both components and are skipped by the summaries.

use crate::{
    count::AlleleCounts,
    error::{Error, Result},
};

use super::window::{check_sorted, tile, Window};

/// Calculates per-variant Hudson Fst components between two populations.
///
/// Works on biallelic variants, using the frequency of allele 1 in each population.
/// Returns the numerator and denominator vectors, aligned with the variant axis.
/// Variants where either population has fewer than two called copies are NaN in both
/// components.
///
/// Errors if the two count arrays differ in shape, if either covers more than two
/// alleles, or if either population is empty at every variant.
pub fn hudson_fst(
    first: &AlleleCounts,
    second: &AlleleCounts,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if first.n_variants() != second.n_variants() {
        return Err(Error::ShapeMismatch {
            left: first.n_variants(),
            right: second.n_variants(),
        });
    }

    for counts in [first, second] {
        if counts.n_alleles() > 2 {
            return Err(Error::NotBiallelic {
                alleles: counts.n_alleles(),
            });
        }

        if counts.is_empty_population() {
            return Err(Error::InsufficientPopulations { found: 1 });
        }
    }

    let variants = first.n_variants();
    let mut num = Vec::with_capacity(variants);
    let mut den = Vec::with_capacity(variants);

    for variant in 0..variants {
        let n1 = f64::from(first.allele_number(variant));
        let n2 = f64::from(second.allele_number(variant));

        if n1 < 2.0 || n2 < 2.0 {
            num.push(f64::NAN);
            den.push(f64::NAN);
            continue;
        }

        let p1 = f64::from(alt_count(first, variant)) / n1;
        let p2 = f64::from(alt_count(second, variant)) / n2;

        let diff = p1 - p2;
        num.push(
            diff * diff - p1 * (1.0 - p1) / (n1 - 1.0) - p2 * (1.0 - p2) / (n2 - 1.0),
        );
        den.push(p1 * (1.0 - p2) + p2 * (1.0 - p1));
    }

    Ok((num, den))
}

fn alt_count(counts: &AlleleCounts, variant: usize) -> u32 {
    if counts.n_alleles() > 1 {
        counts.count(variant, 1)
    } else {
        0
    }
}

/// Calculates per-variant Nei-style Fst components over two or more populations.
///
/// The numerator is the total heterozygosity of the pooled populations minus the mean
/// within-population heterozygosity; the denominator is the total heterozygosity.
/// Variants where any population has no called copies are NaN in both components.
///
/// Errors if fewer than two non-empty populations are given, or if their shapes
/// differ.
pub fn nei_fst(populations: &[&AlleleCounts]) -> Result<(Vec<f64>, Vec<f64>)> {
    let non_empty = populations
        .iter()
        .filter(|counts| !counts.is_empty_population())
        .count();
    let (first, rest) = match populations {
        [first, rest @ ..] if !rest.is_empty() && non_empty >= 2 => (first, rest),
        _ => return Err(Error::InsufficientPopulations { found: non_empty }),
    };

    let mut pooled = AlleleCounts::zeros(first.n_variants(), first.n_alleles());
    pooled.pool(first)?;
    for counts in rest {
        pooled.pool(counts)?;
    }

    let variants = first.n_variants();
    let mut num = Vec::with_capacity(variants);
    let mut den = Vec::with_capacity(variants);

    for variant in 0..variants {
        let within: Option<f64> = populations
            .iter()
            .map(|counts| heterozygosity(counts, variant))
            .sum::<Option<f64>>()
            .map(|sum| sum / populations.len() as f64);

        match (heterozygosity(&pooled, variant), within) {
            (Some(total), Some(within)) => {
                num.push(total - within);
                den.push(total);
            }
            _ => {
                num.push(f64::NAN);
                den.push(f64::NAN);
            }
        }
    }

    Ok((num, den))
}

/// Expected heterozygosity at a variant, `None` if no copies were called.
fn heterozygosity(counts: &AlleleCounts, variant: usize) -> Option<f64> {
    let an = f64::from(counts.allele_number(variant));
    if an == 0.0 {
        return None;
    }

    let hom: f64 = counts
        .counts(variant)
        .iter()
        .map(|&c| {
            let p = f64::from(c) / an;
            p * p
        })
        .sum();

    Some(1.0 - hom)
}

/// Summarises Fst components into a single estimate by the ratio of sums.
///
/// Variants undefined in either component are skipped. NaN if no variant is defined
/// or the summed denominator is zero.
pub fn average_fst(num: &[f64], den: &[f64]) -> f64 {
    let (num_sum, den_sum) = component_sums(num, den);
    num_sum / den_sum
}

/// Summarises Fst components in tiling windows of `size` coordinates.
///
/// Each window's estimate is the ratio of its summed components, skipping undefined
/// variants; windows with no defined variants (or a zero summed denominator) are NaN.
/// Returns the estimates, the windows, and the number of variants per window.
pub fn windowed_fst(
    positions: &[u64],
    num: &[f64],
    den: &[f64],
    size: u64,
) -> Result<(Vec<f64>, Vec<Window>, Vec<usize>)> {
    if num.len() != den.len() {
        return Err(Error::ShapeMismatch {
            left: num.len(),
            right: den.len(),
        });
    }
    if positions.len() != num.len() {
        return Err(Error::ShapeMismatch {
            left: positions.len(),
            right: num.len(),
        });
    }
    check_sorted(positions)?;

    let windows = match (positions.first(), positions.last()) {
        (Some(&first), Some(&last)) => tile(first, last.saturating_add(1), size),
        _ => Vec::new(),
    };

    let mut estimates = Vec::with_capacity(windows.len());
    let mut counts = Vec::with_capacity(windows.len());

    let mut lower = 0;
    for (index, window) in windows.iter().enumerate() {
        let upper = if index + 1 == windows.len() {
            num.len()
        } else {
            lower + positions[lower..].partition_point(|&p| p < window.stop())
        };

        estimates.push(average_fst(&num[lower..upper], &den[lower..upper]));
        counts.push(upper - lower);
        lower = upper;
    }

    Ok((estimates, windows, counts))
}

fn component_sums(num: &[f64], den: &[f64]) -> (f64, f64) {
    num.iter()
        .zip(den.iter())
        .filter(|(n, d)| !n.is_nan() && !d.is_nan())
        .fold((0.0, 0.0), |(ns, ds), (n, d)| (ns + n, ds + d))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    use crate::{
        count::allele_counts_with,
        exec::BlockSize,
        genotypes,
    };

    /// Counts with the allele dimension pinned to two, so populations fixed for
    /// different alleles stay comparable.
    fn counts(g: crate::gt::Genotypes) -> AlleleCounts {
        allele_counts_with(&g, 2, None, BlockSize::Auto).unwrap()
    }

    #[test]
    fn hudson_fixed_difference_is_one() {
        let pop1 = counts(genotypes![[[0, 0], [0, 0]]]);
        let pop2 = counts(genotypes![[[1, 1], [1, 1]]]);

        let (num, den) = hudson_fst(&pop1, &pop2).unwrap();
        assert_abs_diff_eq!(num[0] / den[0], 1.0);
    }

    #[test]
    fn hudson_identical_populations_center_on_zero() {
        let pop1 = counts(genotypes![[[0, 0], [0, 1]], [[0, 1], [1, 1]]]);
        let pop2 = counts(genotypes![[[0, 0], [0, 1]], [[0, 1], [1, 1]]]);

        let (num, den) = hudson_fst(&pop1, &pop2).unwrap();

        // Same frequencies: the numerator is minus the sampling correction.
        for (n, d) in num.iter().zip(den.iter()) {
            assert!(n / d < 0.0);
        }
    }

    #[test]
    fn hudson_marks_underpowered_variants_undefined() {
        let pop1 = counts(genotypes![[[0, -1], [-1, -1]], [[0, 0], [0, 1]]]);
        let pop2 = counts(genotypes![[[1, 1], [1, 1]], [[1, 1], [1, 1]]]);

        let (num, den) = hudson_fst(&pop1, &pop2).unwrap();
        assert!(num[0].is_nan() && den[0].is_nan());
        assert!(!num[1].is_nan() && !den[1].is_nan());
    }

    #[test]
    fn hudson_rejects_empty_population() {
        let pop1 = counts(genotypes![[[-1, -1], [-1, -1]]]);
        let pop2 = counts(genotypes![[[1, 1], [1, 1]]]);

        let err = hudson_fst(&pop1, &pop2).unwrap_err();
        assert!(matches!(err, Error::InsufficientPopulations { found: 1 }));
    }

    #[test]
    fn hudson_rejects_shape_mismatch() {
        let pop1 = counts(genotypes![[[0, 0]], [[0, 1]]]);
        let pop2 = counts(genotypes![[[1, 1]]]);

        assert!(matches!(
            hudson_fst(&pop1, &pop2).unwrap_err(),
            Error::ShapeMismatch { left: 2, right: 1 }
        ));
    }

    #[test]
    fn nei_requires_two_populations() {
        let pop = counts(genotypes![[[0, 1], [0, 1]]]);
        assert!(matches!(
            nei_fst(&[&pop]).unwrap_err(),
            Error::InsufficientPopulations { found: 1 }
        ));
    }

    #[test]
    fn nei_fixed_difference_is_one() {
        let pop1 = counts(genotypes![[[0, 0], [0, 0]]]);
        let pop2 = counts(genotypes![[[1, 1], [1, 1]]]);

        let (num, den) = nei_fst(&[&pop1, &pop2]).unwrap();
        assert_abs_diff_eq!(num[0] / den[0], 1.0);
    }

    #[test]
    fn nei_identical_populations_are_zero() {
        let pop1 = counts(genotypes![[[0, 0], [0, 1]]]);
        let pop2 = counts(genotypes![[[0, 0], [0, 1]]]);

        let (num, den) = nei_fst(&[&pop1, &pop2]).unwrap();
        assert_abs_diff_eq!(num[0] / den[0], 0.0);
    }

    #[test]
    fn windowed_fst_is_ratio_of_sums() {
        let positions = [0, 5, 10, 15];
        let num = [1.0, 2.0, f64::NAN, 4.0];
        let den = [2.0, 2.0, f64::NAN, 8.0];

        let (fst, windows, counts) = windowed_fst(&positions, &num, &den, 10).unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(counts, vec![2, 2]);
        assert_abs_diff_eq!(fst[0], 3.0 / 4.0);
        // The undefined variant is skipped within its window.
        assert_abs_diff_eq!(fst[1], 4.0 / 8.0);
    }

    #[test]
    fn average_is_nan_without_defined_variants() {
        assert!(average_fst(&[f64::NAN], &[f64::NAN]).is_nan());
        assert!(average_fst(&[], &[]).is_nan());
    }
}
