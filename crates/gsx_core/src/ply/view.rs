//! Bounds-checked access to fixed-stride binary records.

use super::error::{DecodeError, DecodeResult};
use super::schema::Endianness;

/// A dense block of `count` records of `stride` bytes each.
#[derive(Clone, Copy, Debug)]
pub struct RecordView<'a> {
    bytes: &'a [u8],
    stride: usize,
    count: usize,
    endianness: Endianness,
}

impl<'a> RecordView<'a> {
    /// Wrap `bytes`, failing with `TruncatedData` if they cannot hold
    /// `count` records.
    pub fn new(
        bytes: &'a [u8],
        stride: usize,
        count: usize,
        endianness: Endianness,
    ) -> DecodeResult<Self> {
        let expected = stride.checked_mul(count).ok_or(DecodeError::TruncatedData {
            expected: usize::MAX,
            available: bytes.len(),
        })?;
        if expected > bytes.len() {
            return Err(DecodeError::TruncatedData {
                expected,
                available: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            stride,
            count,
            endianness,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The `index`-th record.
    pub fn record(&self, index: usize) -> DecodeResult<Record<'a>> {
        let start = index.checked_mul(self.stride);
        let end = start.and_then(|s| s.checked_add(self.stride));
        let bytes = match (start, end) {
            (Some(start), Some(end)) if index < self.count => self.bytes.get(start..end),
            _ => None,
        };
        bytes
            .map(|bytes| Record {
                bytes,
                endianness: self.endianness,
            })
            .ok_or(DecodeError::TruncatedData {
                expected: end.unwrap_or(usize::MAX),
                available: self.bytes.len(),
            })
    }
}

/// One record's bytes.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    bytes: &'a [u8],
    endianness: Endianness,
}

impl Record<'_> {
    /// Read the 32-bit float at `offset` bytes into the record.
    #[inline]
    pub fn f32_at(&self, offset: usize) -> DecodeResult<f32> {
        let raw: [u8; 4] = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .ok_or(DecodeError::TruncatedData {
                expected: offset.saturating_add(4),
                available: self.bytes.len(),
            })?;
        Ok(match self.endianness {
            Endianness::Little => f32::from_le_bytes(raw),
            Endianness::Big => f32::from_be_bytes(raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_record_access() {
        let bytes = le_floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let view = RecordView::new(&bytes, 8, 3, Endianness::Little).unwrap();

        assert_eq!(view.len(), 3);
        assert_eq!(view.record(0).unwrap().f32_at(0).unwrap(), 1.0);
        assert_eq!(view.record(1).unwrap().f32_at(4).unwrap(), 4.0);
        assert_eq!(view.record(2).unwrap().f32_at(0).unwrap(), 5.0);
    }

    #[test]
    fn test_big_endian() {
        let bytes: Vec<u8> = [0.25f32, -8.0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let view = RecordView::new(&bytes, 8, 1, Endianness::Big).unwrap();
        let record = view.record(0).unwrap();
        assert_eq!(record.f32_at(0).unwrap(), 0.25);
        assert_eq!(record.f32_at(4).unwrap(), -8.0);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let bytes = le_floats(&[1.0, 2.0, 3.0]);
        let err = RecordView::new(&bytes, 8, 2, Endianness::Little).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedData {
                expected: 16,
                available: 12
            }
        ));
    }

    #[test]
    fn test_out_of_range_access() {
        let bytes = le_floats(&[1.0, 2.0]);
        let view = RecordView::new(&bytes, 8, 1, Endianness::Little).unwrap();

        assert!(view.record(1).is_err());
        assert!(view.record(usize::MAX).is_err());
        assert!(view.record(0).unwrap().f32_at(6).is_err());
        assert!(view.record(0).unwrap().f32_at(usize::MAX).is_err());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let bytes = le_floats(&[1.0, 2.0, 3.0]);
        let view = RecordView::new(&bytes, 4, 2, Endianness::Little).unwrap();
        assert!(view.record(2).is_err());
    }
}
