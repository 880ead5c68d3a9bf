//! Fixed-length concurrent bitset.
//!
//! Phase-1 edge inspection sets incoming-edge bits from many rayon workers
//! at once, so the word array is atomic; `set` and `union_with` take
//! `&self`. Word order is little-endian on the wire (bit `i` lives in word
//! `i / 64` at bit `i % 64`).

use std::sync::atomic::{AtomicU64, Ordering};

/// A bitset of fixed bit length with concurrent `set`.
#[derive(Debug, Default)]
pub struct DynamicBitset {
    num_bits: usize,
    words: Vec<AtomicU64>,
}

impl DynamicBitset {
    /// Create an all-zero bitset covering `num_bits` bits.
    pub fn new(num_bits: usize) -> Self {
        let n_words = num_bits.div_ceil(64);
        let mut words = Vec::with_capacity(n_words);
        words.resize_with(n_words, || AtomicU64::new(0));
        Self { num_bits, words }
    }

    /// Rebuild a bitset from a word snapshot received off the wire.
    pub fn from_words(num_bits: usize, snapshot: &[u64]) -> Self {
        assert_eq!(snapshot.len(), num_bits.div_ceil(64), "word count mismatch");
        Self {
            num_bits,
            words: snapshot.iter().map(|&w| AtomicU64::new(w)).collect(),
        }
    }

    /// Bit length.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_bits
    }

    /// True when the bitset covers zero bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Set bit `i`. Safe to call from multiple threads.
    #[inline]
    pub fn set(&self, i: usize) {
        debug_assert!(i < self.num_bits, "bit {i} out of range {}", self.num_bits);
        self.words[i / 64].fetch_or(1 << (i % 64), Ordering::Relaxed);
    }

    /// Read bit `i`.
    #[inline]
    pub fn test(&self, i: usize) -> bool {
        debug_assert!(i < self.num_bits, "bit {i} out of range {}", self.num_bits);
        self.words[i / 64].load(Ordering::Relaxed) & (1 << (i % 64)) != 0
    }

    /// OR-merge `other` into `self`. Both must have the same bit length.
    pub fn union_with(&self, other: &DynamicBitset) {
        assert_eq!(self.num_bits, other.num_bits, "bitset length mismatch");
        for (w, o) in self.words.iter().zip(&other.words) {
            w.fetch_or(o.load(Ordering::Relaxed), Ordering::Relaxed);
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Snapshot of the word array, for serialisation.
    pub fn words(&self) -> Vec<u64> {
        self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test() {
        let bs = DynamicBitset::new(130);
        bs.set(0);
        bs.set(63);
        bs.set(64);
        bs.set(129);
        assert!(bs.test(0) && bs.test(63) && bs.test(64) && bs.test(129));
        assert!(!bs.test(1) && !bs.test(128));
        assert_eq!(bs.count_ones(), 4);
    }

    #[test]
    fn union_merges() {
        let a = DynamicBitset::new(100);
        let b = DynamicBitset::new(100);
        a.set(3);
        b.set(99);
        a.union_with(&b);
        assert!(a.test(3) && a.test(99));
        assert_eq!(a.count_ones(), 2);
        assert_eq!(b.count_ones(), 1);
    }

    #[test]
    fn word_roundtrip() {
        let a = DynamicBitset::new(70);
        a.set(1);
        a.set(69);
        let b = DynamicBitset::from_words(70, &a.words());
        assert!(b.test(1) && b.test(69));
        assert_eq!(b.count_ones(), 2);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn union_rejects_mismatched_lengths() {
        DynamicBitset::new(10).union_with(&DynamicBitset::new(11));
    }

    #[test]
    fn concurrent_set() {
        let bs = std::sync::Arc::new(DynamicBitset::new(1024));
        std::thread::scope(|s| {
            for t in 0..4 {
                let bs = &bs;
                s.spawn(move || {
                    for i in (t..1024).step_by(4) {
                        bs.set(i);
                    }
                });
            }
        });
        assert_eq!(bs.count_ones(), 1024);
    }
}
