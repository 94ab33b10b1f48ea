//! Error types shared across the crate.
//!
//! Structural problems (incompatible shapes, invalid selections, too few populations,
//! unsorted coordinates) abort an operation with an [`Error`] and produce no partial
//! result. Per-element undefined values, such as frequencies at variants where no
//! copies were called, are never errors: they are carried in-band as missing markers
//! in the output arrays, see e.g. [`AlleleFrequencies`](crate::count::AlleleFrequencies).

use std::io;

use thiserror::Error;

/// The error type for all fallible operations in the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A genotype buffer does not evenly divide into calls of the stated shape.
    #[error("buffer of {len} values does not fit {samples} samples with ploidy {ploidy}")]
    GenotypeShape {
        /// Length of the provided buffer.
        len: usize,
        /// Number of samples requested.
        samples: usize,
        /// Ploidy requested.
        ploidy: usize,
    },

    /// Arrays presented for a joint operation disagree on an axis length.
    #[error("array axes differ ({left} vs. {right})")]
    ShapeMismatch {
        /// Axis length of the first array.
        left: usize,
        /// Axis length of the other array.
        right: usize,
    },

    /// A selection mask does not match the length of the axis it selects along.
    #[error("selection mask has length {found}, expected axis length {expected}")]
    MaskLength {
        /// Length of the axis being selected along.
        expected: usize,
        /// Length of the provided mask.
        found: usize,
    },

    /// A selection index is out of range for the axis it selects along.
    #[error("selection index {index} out of range for axis of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the axis being selected along.
        len: usize,
    },

    /// An allele call exceeds the allele dimension of the counts array.
    #[error("allele {allele} out of range for counts array over {alleles} alleles")]
    AlleleOutOfRange {
        /// The observed allele index.
        allele: u8,
        /// The allele dimension of the counts array.
        alleles: usize,
    },

    /// A statistic restricted to biallelic data was given wider allele counts.
    #[error("statistic requires biallelic allele counts (got {alleles} alleles)")]
    NotBiallelic {
        /// The allele dimension of the provided counts.
        alleles: usize,
    },

    /// A differentiation statistic received fewer than two non-empty populations.
    #[error("differentiation requires at least two non-empty populations (got {found})")]
    InsufficientPopulations {
        /// Number of non-empty populations provided.
        found: usize,
    },

    /// A jackknife received too few blocks to estimate a spread.
    #[error("jackknife requires at least two blocks (got {found})")]
    InsufficientBlocks {
        /// Number of blocks provided.
        found: usize,
    },

    /// Genomic positions handed to a windowed statistic are not sorted.
    #[error("positions are not monotonically non-decreasing at index {index}")]
    NonMonotonicPositions {
        /// Index of the first out-of-order position.
        index: usize,
    },

    /// A statistic received data of an unsupported ploidy.
    #[error("statistic requires ploidy {expected} (got {found})")]
    Ploidy {
        /// Required ploidy.
        expected: usize,
        /// Ploidy of the provided data.
        found: usize,
    },

    /// A variant record disagrees with the established sample/ploidy shape.
    #[error("record {index} carries {found} allele calls, expected {expected}")]
    RecordShape {
        /// Index of the offending record in read order.
        index: usize,
        /// Expected number of calls per record.
        expected: usize,
        /// Number of calls found.
        found: usize,
    },

    /// A block store returned a block of unexpected length.
    #[error("store block {start}..{end} has {found} values, expected {expected}")]
    BlockShape {
        /// Start of the requested variant range.
        start: usize,
        /// End of the requested variant range.
        end: usize,
        /// Expected number of values.
        expected: usize,
        /// Number of values returned.
        found: usize,
    },

    /// A block store failed while materializing a block.
    #[error("could not read block from store")]
    Store {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A variant-record reader failed while producing a record.
    #[error("could not read variant record")]
    Read {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A specialized result type for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
