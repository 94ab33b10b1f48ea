//! The variant-record reader collaborator.
//!
//! Parsing of variant-call file formats lives outside the core; the core consumes any
//! reader that can produce a lazy, finite, forward-only sequence of variant records,
//! one per call to [`ReadVariant::read_variant`]. Each record maps one-to-one onto a
//! row of the genotype array, in read order. A reader is exhausted once consumed;
//! there is no rewinding.

use std::io;

use crate::{
    error::{Error, Result},
    gt::Genotypes,
};

/// The status of a read operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadStatus {
    /// A record was read.
    Read,
    /// The reader is exhausted; the record buffer was not touched.
    Done,
}

impl ReadStatus {
    /// Returns `true` if the reader is exhausted.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns `true` if a record was read.
    #[inline]
    pub fn is_not_done(&self) -> bool {
        !self.is_done()
    }
}

/// A single variant record: one row of genotype data and its metadata.
///
/// The genomic `position` is metadata carried alongside the array; selection and
/// blockwise execution always operate on the 0-based array index, never on the
/// coordinate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantRecord {
    position: u64,
    alleles: Vec<String>,
    calls: Vec<i8>,
}

impl VariantRecord {
    /// Returns a new record.
    pub fn new(position: u64, alleles: Vec<String>, calls: Vec<i8>) -> Self {
        Self {
            position,
            alleles,
            calls,
        }
    }

    /// Returns the genomic coordinate of the variant.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the allele sequences of the variant, reference first.
    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    /// Returns the encoded allele calls, sample-major.
    pub fn calls(&self) -> &[i8] {
        &self.calls
    }

    /// Replaces the record contents, for readers filling the buffer in place.
    pub fn set(&mut self, position: u64, alleles: Vec<String>, calls: Vec<i8>) {
        self.position = position;
        self.alleles = alleles;
        self.calls = calls;
    }
}

/// A type that can read variant records from a source.
pub trait ReadVariant {
    /// Reads a single record into the provided buffer.
    ///
    /// Returns [`ReadStatus::Done`] when the sequence is exhausted, leaving the buffer
    /// untouched.
    fn read_variant(&mut self, record: &mut VariantRecord) -> io::Result<ReadStatus>;
}

impl<T> ReadVariant for &mut T
where
    T: ReadVariant,
{
    fn read_variant(&mut self, record: &mut VariantRecord) -> io::Result<ReadStatus> {
        T::read_variant(*self, record)
    }
}

impl Genotypes {
    /// Creates a genotype array by draining a variant-record reader.
    ///
    /// The number of samples is inferred from the first record, which must hold a
    /// whole number of calls of the given `ploidy`; every following record must have
    /// the same number of calls. Returns the array together with the genomic
    /// coordinates of its variants, aligned index-for-index with the variant axis.
    ///
    /// An exhausted reader yields an empty array with zero samples.
    pub fn from_reader<R>(mut reader: R, ploidy: usize) -> Result<(Self, Vec<u64>)>
    where
        R: ReadVariant,
    {
        let mut record = VariantRecord::default();
        let mut positions = Vec::new();

        let read = |reader: &mut R, record: &mut VariantRecord| {
            reader
                .read_variant(record)
                .map_err(|source| Error::Read { source })
        };

        if read(&mut reader, &mut record)?.is_done() {
            return Ok((Self::empty(0, ploidy), positions));
        }

        let width = record.calls.len();
        if ploidy == 0 || width % ploidy != 0 {
            return Err(Error::RecordShape {
                index: 0,
                expected: ploidy,
                found: width,
            });
        }
        let samples = width / ploidy;

        let mut values = Vec::from(record.calls());
        positions.push(record.position());

        let mut index = 1;
        while read(&mut reader, &mut record)?.is_not_done() {
            if record.calls.len() != width {
                return Err(Error::RecordShape {
                    index,
                    expected: width,
                    found: record.calls.len(),
                });
            }

            values.extend_from_slice(record.calls());
            positions.push(record.position());
            index += 1;
        }

        Ok((Self::new_unchecked(values, samples, ploidy), positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A reader over pre-built records, consumed front to back.
    struct VecReader {
        records: std::vec::IntoIter<VariantRecord>,
    }

    impl VecReader {
        fn new(records: Vec<VariantRecord>) -> Self {
            Self {
                records: records.into_iter(),
            }
        }
    }

    impl ReadVariant for VecReader {
        fn read_variant(&mut self, record: &mut VariantRecord) -> io::Result<ReadStatus> {
            match self.records.next() {
                Some(next) => {
                    *record = next;
                    Ok(ReadStatus::Read)
                }
                None => Ok(ReadStatus::Done),
            }
        }
    }

    fn record(position: u64, calls: &[i8]) -> VariantRecord {
        VariantRecord::new(
            position,
            vec!["A".to_string(), "T".to_string()],
            calls.to_vec(),
        )
    }

    #[test]
    fn records_map_to_rows_in_order() {
        let reader = VecReader::new(vec![
            record(100, &[0, 0, 0, 1]),
            record(250, &[1, 1, -1, -1]),
            record(300, &[0, 1, 1, 1]),
        ]);

        let (g, positions) = Genotypes::from_reader(reader, 2).unwrap();

        assert_eq!(g.n_variants(), 3);
        assert_eq!(g.n_samples(), 2);
        assert_eq!(positions, vec![100, 250, 300]);
        assert_eq!(g.view().variant_slice(1), &[1, 1, -1, -1]);
    }

    #[test]
    fn ragged_record_fails_with_index() {
        let reader = VecReader::new(vec![
            record(100, &[0, 0, 0, 1]),
            record(250, &[1, 1]),
        ]);

        let err = Genotypes::from_reader(reader, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::RecordShape {
                index: 1,
                expected: 4,
                found: 2
            }
        ));
    }

    #[test]
    fn first_record_must_fit_ploidy() {
        let reader = VecReader::new(vec![record(100, &[0, 0, 0])]);
        assert!(Genotypes::from_reader(reader, 2).is_err());
    }

    #[test]
    fn empty_reader_yields_empty_array() {
        let (g, positions) = Genotypes::from_reader(VecReader::new(Vec::new()), 2).unwrap();
        assert_eq!(g.n_variants(), 0);
        assert!(positions.is_empty());
    }

    #[test]
    fn read_failure_is_reported() {
        struct FailingReader;

        impl ReadVariant for FailingReader {
            fn read_variant(&mut self, _: &mut VariantRecord) -> io::Result<ReadStatus> {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"))
            }
        }

        let err = Genotypes::from_reader(FailingReader, 2).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
