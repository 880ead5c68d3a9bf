//! Length-prefixed little-endian encoding for tagged messages.
//!
//! Wire format conventions:
//! - Scalars are LE fixed width (`u32` counts, `u64` ids and totals).
//! - Homogeneous vectors are a `u32` element count followed by the raw
//!   element bytes (`bytemuck` Pod cast).
//! - A bitset is its `u64` bit length followed by its word vector.
//!
//! `WireBuf` appends, `WireReader` consumes; a receiver drains multi-record
//! messages by looping while [`WireReader::remaining`] is non-zero.

use bytemuck::Pod;
use thiserror::Error;

use crate::util::DynamicBitset;

/// Decode-side failures. Truncation indicates a corrupt or foreign message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended before a field could be read.
    #[error("message truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the field required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// A vector count prefix exceeds `u32::MAX` elements on encode.
    #[error("vector of {count} elements exceeds the u32 count prefix")]
    CountOverflow {
        /// Offending element count.
        count: usize,
    },
}

/// Growable send-side buffer.
#[derive(Debug, Default, Clone)]
pub struct WireBuf {
    bytes: Vec<u8>,
}

impl WireBuf {
    /// Fresh empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when nothing has been encoded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the buffer, yielding the raw bytes for the transport.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Append a `u32`.
    #[inline]
    pub fn put_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Append a `u64`.
    #[inline]
    pub fn put_u64(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Append a Pod vector: `u32` count, then the element bytes.
    pub fn put_pod_slice<T: Pod>(&mut self, v: &[T]) {
        let count = u32::try_from(v.len())
            .unwrap_or_else(|_| panic!("vector of {} elements exceeds wire count", v.len()));
        self.put_u32(count);
        self.bytes.extend_from_slice(bytemuck::cast_slice(v));
    }

    /// Append a bitset: `u64` bit length, then its word vector.
    pub fn put_bitset(&mut self, bs: &DynamicBitset) {
        self.put_u64(bs.len() as u64);
        self.put_pod_slice(&bs.words());
    }
}

/// Consuming reader over a received message.
#[derive(Debug)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Wrap a received byte buffer.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let s = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    /// Read a `u32`.
    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes(b.try_into().expect("4-byte slice")))
    }

    /// Read a `u64`.
    pub fn get_u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().expect("8-byte slice")))
    }

    /// Read a Pod vector written by [`WireBuf::put_pod_slice`].
    pub fn get_pod_vec<T: Pod>(&mut self) -> Result<Vec<T>, WireError> {
        let count = self.get_u32()? as usize;
        let bytes = self.take(count * std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }

    /// Read a bitset written by [`WireBuf::put_bitset`].
    pub fn get_bitset(&mut self) -> Result<DynamicBitset, WireError> {
        let num_bits = self.get_u64()? as usize;
        let words: Vec<u64> = self.get_pod_vec()?;
        if words.len() != num_bits.div_ceil(64) {
            return Err(WireError::Truncated {
                needed: num_bits.div_ceil(64) * 8,
                available: words.len() * 8,
            });
        }
        Ok(DynamicBitset::from_words(num_bits, &words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let mut b = WireBuf::new();
        b.put_u32(7);
        b.put_u64(u64::MAX - 1);
        let bytes = b.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.get_u32().unwrap(), 7);
        assert_eq!(r.get_u64().unwrap(), u64::MAX - 1);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn pod_vec_roundtrip() {
        let mut b = WireBuf::new();
        b.put_pod_slice(&[1u64, 2, 3]);
        b.put_pod_slice::<u32>(&[]);
        let bytes = b.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.get_pod_vec::<u64>().unwrap(), vec![1, 2, 3]);
        assert_eq!(r.get_pod_vec::<u32>().unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn bitset_roundtrip() {
        let bs = DynamicBitset::new(77);
        bs.set(0);
        bs.set(76);
        let mut b = WireBuf::new();
        b.put_bitset(&bs);
        let bytes = b.into_bytes();
        let got = WireReader::new(&bytes).get_bitset().unwrap();
        assert_eq!(got.len(), 77);
        assert!(got.test(0) && got.test(76));
        assert_eq!(got.count_ones(), 2);
    }

    #[test]
    fn truncated_read_errors() {
        let mut b = WireBuf::new();
        b.put_u32(3);
        let bytes = b.into_bytes();
        let mut r = WireReader::new(&bytes);
        let err = r.get_u64().unwrap_err();
        assert!(matches!(err, WireError::Truncated { needed: 8, available: 4 }));
    }

    #[test]
    fn multi_record_drain() {
        let mut b = WireBuf::new();
        for src in [4u64, 9u64] {
            b.put_u64(src);
            b.put_pod_slice(&[src + 1, src + 2]);
        }
        let bytes = b.into_bytes();
        let mut r = WireReader::new(&bytes);
        let mut seen = Vec::new();
        while r.remaining() > 0 {
            let src = r.get_u64().unwrap();
            let dsts: Vec<u64> = r.get_pod_vec().unwrap();
            seen.push((src, dsts));
        }
        assert_eq!(seen, vec![(4, vec![5, 6]), (9, vec![10, 11])]);
    }
}
