//! Windowed reduction of per-variant statistics over genomic coordinates.

use crate::error::{Error, Result};

/// A half-open genomic interval `[start, stop)`.
///
/// A variant at coordinate `p` belongs to the window iff `start <= p < stop`, so a
/// variant sitting exactly on a window boundary belongs to the window starting there,
/// never to the one ending there.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    start: u64,
    stop: u64,
}

impl Window {
    /// Returns a new window spanning `[start, stop)`.
    pub fn new(start: u64, stop: u64) -> Self {
        Self { start, stop }
    }

    /// Returns the lower, inclusive bound of the window.
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the upper, exclusive bound of the window.
    #[inline]
    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Returns the number of coordinates spanned by the window.
    #[inline]
    pub fn span(&self) -> u64 {
        self.stop - self.start
    }

    /// Returns `true` if the coordinate falls within the window.
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position < self.stop
    }
}

/// Tiles `[start, stop)` with contiguous, non-overlapping windows of `size` coordinates.
///
/// The final window is truncated at `stop` where the span is not a multiple of `size`.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn tile(start: u64, stop: u64, size: u64) -> Vec<Window> {
    assert!(size > 0, "cannot tile with zero-sized windows");

    let mut windows = Vec::new();
    let mut lower = start;
    while lower < stop {
        let upper = lower.saturating_add(size).min(stop);
        windows.push(Window::new(lower, upper));
        lower = upper;
    }
    windows
}

/// Checks that coordinates are sorted in non-decreasing order.
///
/// Errors with the index of the first offending coordinate otherwise.
pub(crate) fn check_sorted(positions: &[u64]) -> Result<()> {
    match positions.windows(2).position(|pair| pair[0] > pair[1]) {
        Some(index) => Err(Error::NonMonotonicPositions { index: index + 1 }),
        None => Ok(()),
    }
}

/// Reduces per-variant values over tiling windows of `size` coordinates.
///
/// The tiling starts at the first coordinate and ends just past the last, so every
/// variant falls in exactly one window. For each window, `reduce` is handed the slice
/// of values whose variants fall inside it; empty windows are handed an empty slice,
/// never skipped. Returns the reduced values, the windows, and the number of variants
/// in each window, all aligned index-for-index.
///
/// `positions` must be sorted and aligned with `values` on the variant axis.
pub fn windowed_statistic<F>(
    positions: &[u64],
    values: &[f64],
    size: u64,
    mut reduce: F,
) -> Result<(Vec<f64>, Vec<Window>, Vec<usize>)>
where
    F: FnMut(&Window, &[f64]) -> f64,
{
    if positions.len() != values.len() {
        return Err(Error::ShapeMismatch {
            left: positions.len(),
            right: values.len(),
        });
    }
    check_sorted(positions)?;

    let windows = match (positions.first(), positions.last()) {
        (Some(&first), Some(&last)) => tile(first, last.saturating_add(1), size),
        _ => Vec::new(),
    };

    let mut reduced = Vec::with_capacity(windows.len());
    let mut counts = Vec::with_capacity(windows.len());

    let mut lower = 0;
    for (index, window) in windows.iter().enumerate() {
        // Coordinates are sorted, so each window covers a contiguous run of variants.
        // The final window takes everything left, so a coordinate saturating the
        // window bound at the top of the range still lands in a window.
        let upper = if index + 1 == windows.len() {
            positions.len()
        } else {
            lower + positions[lower..].partition_point(|&p| p < window.stop())
        };

        reduced.push(reduce(window, &values[lower..upper]));
        counts.push(upper - lower);
        lower = upper;
    }

    Ok((reduced, windows, counts))
}

/// Calculates nucleotide diversity in tiling windows of `size` coordinates.
///
/// `diffs` holds the per-variant mean pairwise differences (see
/// [`mean_pairwise_difference`](crate::stat::mean_pairwise_difference)), with undefined
/// sites marked NaN. Each window's diversity is the sum of its defined values divided
/// by the window span in coordinates; undefined sites are skipped, and a window with
/// no variants at all has diversity zero.
pub fn windowed_diversity(
    positions: &[u64],
    diffs: &[f64],
    size: u64,
) -> Result<(Vec<f64>, Vec<Window>, Vec<usize>)> {
    windowed_statistic(positions, diffs, size, |window, values| {
        let sum: f64 = values.iter().filter(|v| !v.is_nan()).sum();
        sum / window.span() as f64
    })
}
