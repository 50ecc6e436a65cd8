// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::io::Read;

use super::FilterBuilder;
use crate::error::Error;
use crate::hash::hash_member;

/// A Bloom filter for probabilistic set membership testing.
///
/// Provides membership queries with:
/// - No false negatives (added members always check `true`)
/// - A false positive rate bounded by the target rate once `entries` members are added
/// - Fixed space, decided at construction
///
/// Members are arbitrary byte sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Expected number of distinct members
    pub(super) entries: u32,
    /// Target false positive probability
    pub(super) error_rate: f64,
    /// Total number of bits in the filter (m)
    pub(super) num_bits: u64,
    /// Number of probes per member (k)
    pub(super) num_hashes: u32,
    /// Bit array, `ceil(num_bits / 8)` bytes, LSB-first within each byte
    pub(super) bits: Box<[u8]>,
}

impl Filter {
    /// Returns a builder for a filter holding `entries` members at `error_rate`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blossom::bloom::Filter;
    ///
    /// let seed = vec![0u8; 1199];
    /// let filter = Filter::builder(1000, 0.01).data(&seed).build().unwrap();
    /// assert!(filter.is_empty());
    /// ```
    pub fn builder<'a>(entries: u32, error_rate: f64) -> FilterBuilder<'a> {
        FilterBuilder::new(entries, error_rate)
    }

    /// Creates an empty filter.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidParameters` if `entries` is 0 or `error_rate` is not in
    /// (0.0, 1.0), and with `AllocationFailure` if the bit array cannot be allocated.
    pub fn new(entries: u32, error_rate: f64) -> Result<Self, Error> {
        FilterBuilder::new(entries, error_rate).build()
    }

    /// Creates a filter whose bit array is a copy of `data`.
    ///
    /// # Errors
    ///
    /// As [`new()`](Self::new), plus `LengthMismatch` if `data` is not exactly
    /// [`num_bytes()`](Self::num_bytes) long.
    pub fn with_data(entries: u32, error_rate: f64, data: &[u8]) -> Result<Self, Error> {
        FilterBuilder::new(entries, error_rate).data(data).build()
    }

    /// Creates a filter whose bit array is read from `reader`.
    ///
    /// # Errors
    ///
    /// As [`with_data()`](Self::with_data), plus `UnsupportedBuffer` if the reader fails.
    pub fn from_reader<R: Read>(entries: u32, error_rate: f64, reader: R) -> Result<Self, Error> {
        FilterBuilder::new(entries, error_rate).build_from_reader(reader)
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Tests whether a member is possibly in the set.
    ///
    /// Returns:
    /// - `true`: the member was **possibly** added (or false positive)
    /// - `false`: the member was **definitely not** added
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::Filter;
    /// let mut filter = Filter::new(1000, 0.01).unwrap();
    /// filter.add("alice");
    ///
    /// assert!(filter.check("alice"));
    /// ```
    pub fn check(&self, member: impl AsRef<[u8]>) -> bool {
        let (h1, h2) = hash_member(member.as_ref());
        self.check_bits(h1, h2)
    }

    /// Tests and adds a member in a single operation.
    ///
    /// Returns whether the member was possibly present before this call.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::Filter;
    /// let mut filter = Filter::new(100, 0.01).unwrap();
    ///
    /// assert!(!filter.check_and_add(b"apple"));
    /// assert!(filter.check_and_add(b"apple"));
    /// ```
    pub fn check_and_add(&mut self, member: impl AsRef<[u8]>) -> bool {
        let (h1, h2) = hash_member(member.as_ref());
        let was_present = self.check_bits(h1, h2);
        self.set_bits(h1, h2);
        was_present
    }

    // ========================================================================
    // Update Operations
    // ========================================================================

    /// Adds a member to the filter.
    ///
    /// After this, `check(member)` always returns `true`.
    pub fn add(&mut self, member: impl AsRef<[u8]>) {
        let (h1, h2) = hash_member(member.as_ref());
        self.set_bits(h1, h2);
    }

    /// Clears all bits, keeping the parameters.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }

    /// Merges another filter into this one via bitwise OR.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidParameters` if the filters differ in bit or hash count.
    /// This filter is left untouched in that case.
    pub fn union(&mut self, other: &Filter) -> Result<(), Error> {
        if !self.is_compatible(other) {
            return Err(
                Error::invalid_parameters("cannot union incompatible bloom filters")
                    .with_context("num_bits", self.num_bits)
                    .with_context("other_num_bits", other.num_bits)
                    .with_context("num_hashes", self.num_hashes)
                    .with_context("other_num_hashes", other.num_hashes),
            );
        }

        for (byte, other_byte) in self.bits.iter_mut().zip(other.bits.iter()) {
            *byte |= *other_byte;
        }
        Ok(())
    }

    // ========================================================================
    // Statistics and Properties
    // ========================================================================

    /// Expected number of distinct members the filter was sized for.
    pub fn entries(&self) -> u32 {
        self.entries
    }

    /// Target false positive rate the filter was sized for.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Total number of bits in the filter.
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Number of probes per member.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Length of the bit array in bytes.
    pub fn num_bytes(&self) -> usize {
        self.bits.len()
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&byte| byte == 0)
    }

    /// Returns the number of bits set to 1.
    ///
    /// Counted on demand: the array may be written through
    /// [`as_bytes_mut()`](Self::as_bytes_mut).
    pub fn bits_set(&self) -> u64 {
        self.bits.iter().map(|byte| u64::from(byte.count_ones())).sum()
    }

    /// Returns the fraction of bits set.
    pub fn load_factor(&self) -> f64 {
        self.bits_set() as f64 / self.num_bits as f64
    }

    /// Estimates the current false positive probability.
    ///
    /// Based on `load^k`, the chance that all k probes of a fresh member land on
    /// set bits. This is approximate and assumes uniform bit distribution.
    pub fn estimated_fpp(&self) -> f64 {
        self.load_factor().powi(self.num_hashes as i32)
    }

    /// Checks if two filters can be merged.
    pub fn is_compatible(&self, other: &Filter) -> bool {
        self.num_bits == other.num_bits && self.num_hashes == other.num_hashes
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Read-only view of the bit array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Writable view of the bit array.
    ///
    /// The length is fixed; only contents can change. Writing arbitrary bytes
    /// may introduce false negatives for members added before.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Checks if all k bits are set for the given hash values.
    fn check_bits(&self, h1: u64, h2: u64) -> bool {
        (0..self.num_hashes).all(|i| self.get_bit(self.compute_bit_index(h1, h2, i)))
    }

    /// Sets all k bits for the given hash values.
    fn set_bits(&mut self, h1: u64, h2: u64) {
        for i in 0..self.num_hashes {
            let bit_index = self.compute_bit_index(h1, h2, i);
            self.set_bit(bit_index);
        }
    }

    /// Computes a bit index using double hashing (Kirsch-Mitzenmacher).
    /// Formula: (h1 + i * h2) mod num_bits
    fn compute_bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        let hash = h1.wrapping_add(u64::from(i).wrapping_mul(h2));
        hash % self.num_bits
    }

    fn get_bit(&self, bit_index: u64) -> bool {
        let byte_index = (bit_index / 8) as usize;
        let mask = 1u8 << (bit_index % 8);
        (self.bits[byte_index] & mask) != 0
    }

    fn set_bit(&mut self, bit_index: u64) {
        let byte_index = (bit_index / 8) as usize;
        let mask = 1u8 << (bit_index % 8);
        self.bits[byte_index] |= mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new() {
        let filter = Filter::new(1000, 0.01).unwrap();
        assert_eq!(filter.entries(), 1000);
        assert_eq!(filter.error_rate(), 0.01);
        assert_eq!(filter.num_bits(), 9586);
        assert_eq!(filter.num_hashes(), 7);
        assert_eq!(filter.num_bytes(), 1199);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_add_and_check() {
        let mut filter = Filter::new(100, 0.01).unwrap();

        assert!(!filter.check("apple"));
        filter.add("apple");
        assert!(filter.check("apple"));
        assert!(filter.check(b"apple"));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_add_sets_at_most_k_bits() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        filter.add(b"one member");
        let set = filter.bits_set();
        assert!(set >= 1 && set <= u64::from(filter.num_hashes()));
    }

    #[test]
    fn test_check_and_add() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        assert!(!filter.check_and_add(42_u64.to_le_bytes()));
        assert!(filter.check_and_add(42_u64.to_le_bytes()));
    }

    #[test]
    fn test_reset() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        filter.add("test");
        assert!(!filter.is_empty());

        filter.reset();
        assert!(filter.is_empty());
        assert!(!filter.check("test"));
        assert_eq!(filter.num_bytes(), FilterBuilder::num_bytes(filter.num_bits()) as usize);
    }

    #[test]
    fn test_single_bit_filter() {
        let mut filter = Filter::new(1, 0.99).unwrap();
        assert_eq!(filter.num_bits(), 1);
        assert_eq!(filter.num_hashes(), 1);
        filter.add("anything");
        assert_eq!(filter.as_bytes(), &[0x01]);
        assert!(filter.check("something else"));
    }

    #[test]
    fn test_union() {
        let mut f1 = Filter::new(100, 0.01).unwrap();
        let mut f2 = Filter::new(100, 0.01).unwrap();

        f1.add("a");
        f2.add("b");

        f1.union(&f2).unwrap();
        assert!(f1.check("a"));
        assert!(f1.check("b"));
    }

    #[test]
    fn test_union_incompatible() {
        let mut f1 = Filter::new(100, 0.01).unwrap();
        f1.add("a");
        let before = f1.clone();
        let f2 = Filter::new(100, 0.001).unwrap();

        let err = f1.union(&f2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
        assert_eq!(f1, before);
    }

    #[test]
    fn test_statistics() {
        let mut filter = Filter::new(1000, 0.01).unwrap();
        assert_eq!(filter.bits_set(), 0);
        assert_eq!(filter.load_factor(), 0.0);
        assert_eq!(filter.estimated_fpp(), 0.0);

        filter.add("test");
        assert!(filter.bits_set() > 0);
        assert!(filter.load_factor() > 0.0);
        assert!(filter.estimated_fpp() > 0.0);
    }

    #[test]
    fn test_writable_view() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        let len = filter.num_bytes();
        filter.as_bytes_mut().fill(0xff);
        assert_eq!(filter.num_bytes(), len);
        assert!(filter.check("whatever"));
        assert_eq!(filter.bits_set(), len as u64 * 8);
    }

    #[test]
    fn test_probe_addressing_is_lsb_first() {
        let filter = Filter::new(10, 0.1).unwrap();
        let mut probe = filter.clone();
        probe.set_bit(0);
        probe.set_bit(9);
        assert_eq!(probe.as_bytes()[0], 0b0000_0001);
        assert_eq!(probe.as_bytes()[1], 0b0000_0010);
        assert!(probe.get_bit(9));
        assert!(!probe.get_bit(8));
    }
}
