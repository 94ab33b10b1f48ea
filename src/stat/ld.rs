//! Linkage disequilibrium statistics.
//!
//! Rogers and Huff's composite LD estimate works directly on unphased data: each call
//! is reduced to its alternate-allele dosage, and LD between two variants is the
//! Pearson correlation of their dosage vectors. Variant pairs are laid out in
//! condensed form, row by row over the upper triangle.

use rayon::prelude::*;

use crate::gt::{AsGenotypesView, MISSING};

/// Calculates Rogers-Huff r between all pairs of variants.
///
/// Genotype calls are reduced to alternate-allele dosages, with partially missing
/// calls treated as missing; each pair is correlated over the samples where both
/// variants are called. Pairs with fewer than two such samples, or where either
/// variant is invariant across them, are NaN.
///
/// The result is condensed: for `n` variants it holds `n (n - 1) / 2` values, pair
/// `(i, j)` with `i < j` appearing in row-major upper-triangle order. The computation
/// is parallelised over rows and is deterministic.
pub fn rogers_huff_r<G>(genotypes: G) -> Vec<f64>
where
    G: AsGenotypesView,
{
    let view = genotypes.as_genotypes_view();
    let n = view.n_variants();
    let samples = view.n_samples();

    let dosages = view.to_n_alt();
    let row = |variant: usize| &dosages[variant * samples..(variant + 1) * samples];

    (0..n)
        .into_par_iter()
        .map(|i| {
            (i + 1..n)
                .map(|j| dosage_correlation(row(i), row(j)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Calculates squared Rogers-Huff r between all pairs of variants.
///
/// See [`rogers_huff_r`]; undefined pairs stay NaN.
pub fn rogers_huff_r2<G>(genotypes: G) -> Vec<f64>
where
    G: AsGenotypesView,
{
    let mut r = rogers_huff_r(genotypes);
    r.iter_mut().for_each(|v| *v *= *v);
    r
}

/// Returns the condensed index of the pair `(i, j)` with `i < j` among `n` variants.
pub fn condensed_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i < j && j < n);
    i * n - i * (i + 1) / 2 + (j - i - 1)
}

/// Pearson correlation of two dosage vectors over their pairwise-complete samples.
fn dosage_correlation(x: &[i8], y: &[i8]) -> f64 {
    let mut n = 0usize;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    let mut sum_xy = 0.0;

    for (&a, &b) in x.iter().zip(y.iter()) {
        if a == MISSING || b == MISSING {
            continue;
        }

        let (a, b) = (f64::from(a), f64::from(b));
        n += 1;
        sum_x += a;
        sum_y += b;
        sum_xx += a * a;
        sum_yy += b * b;
        sum_xy += a * b;
    }

    if n < 2 {
        return f64::NAN;
    }

    let n = n as f64;
    let cov = sum_xy - sum_x * sum_y / n;
    let var_x = sum_xx - sum_x * sum_x / n;
    let var_y = sum_yy - sum_y * sum_y / n;

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x * var_y).sqrt()
}
