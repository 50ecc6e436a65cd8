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

use std::io;
use std::io::Read;

use tracing::debug;

use super::Filter;
use crate::error::Error;

/// The fewest bits a filter can hold.
pub const MIN_NUM_BITS: u64 = 1;
/// The fewest probes a member can map to.
pub const MIN_NUM_HASHES: u32 = 1;

/// Builder for creating [`Filter`] instances.
///
/// The builder carries the two construction parameters, the expected number of
/// distinct entries and the target false positive rate, plus an optional seed
/// buffer. Nothing is validated until [`build()`](Self::build), which derives the
/// bit and hash counts and allocates the bit array.
#[derive(Debug, Clone)]
pub struct FilterBuilder<'a> {
    entries: u32,
    error_rate: f64,
    data: Option<&'a [u8]>,
}

impl<'a> FilterBuilder<'a> {
    /// Creates a builder for a filter sized to hold `entries` members at `error_rate`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::FilterBuilder;
    /// let filter = FilterBuilder::new(1000, 0.01).build().unwrap();
    /// assert_eq!(filter.num_bytes(), 1199);
    /// ```
    pub fn new(entries: u32, error_rate: f64) -> Self {
        FilterBuilder {
            entries,
            error_rate,
            data: None,
        }
    }

    /// Seeds the bit array with a copy of `data` instead of zeroes.
    ///
    /// `data` must be exactly as long as the derived byte length, otherwise
    /// [`build()`](Self::build) fails with
    /// [`LengthMismatch`](crate::error::ErrorKind::LengthMismatch).
    pub fn data(mut self, data: &'a [u8]) -> Self {
        self.data = Some(data);
        self
    }

    /// Builds the filter.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if `entries` is 0 or `error_rate` is not in (0.0, 1.0)
    /// - `AllocationFailure` if the bit array cannot be allocated
    /// - `LengthMismatch` if seed data was given with the wrong length
    pub fn build(self) -> Result<Filter, Error> {
        let params = Params::derive(self.entries, self.error_rate)?;
        let mut bits = allocate(params.num_bytes)?;
        match self.data {
            Some(data) => {
                if data.len() != params.num_bytes {
                    return Err(Error::length_mismatch(params.num_bytes, data.len()));
                }
                bits.extend_from_slice(data);
            }
            None => bits.resize(params.num_bytes, 0),
        }
        Ok(params.into_filter(self.entries, self.error_rate, bits))
    }

    /// Builds the filter, seeding the bit array from `reader`.
    ///
    /// The reader must yield exactly the derived byte length and then end.
    ///
    /// # Errors
    ///
    /// As [`build()`](Self::build), plus `UnsupportedBuffer` if reading fails.
    /// Any seed previously set with [`data()`](Self::data) is ignored.
    pub fn build_from_reader<R: Read>(self, reader: R) -> Result<Filter, Error> {
        let params = Params::derive(self.entries, self.error_rate)?;
        let mut bits = allocate(params.num_bytes + 1)?;

        // one extra byte detects readers that run past the array
        let limit = params.num_bytes as u64 + 1;
        let read = reader
            .take(limit)
            .read_to_end(&mut bits)
            .map_err(read_failure)?;
        if read != params.num_bytes {
            return Err(Error::length_mismatch(params.num_bytes, read));
        }
        Ok(params.into_filter(self.entries, self.error_rate, bits))
    }

    /// Suggests the number of bits for `entries` members at `error_rate`.
    ///
    /// Formula: `m = ceil(-n * ln(p) / (ln(2)^2))`, at least [`MIN_NUM_BITS`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::FilterBuilder;
    /// assert_eq!(FilterBuilder::suggest_num_bits(1000, 0.01), 9586);
    /// ```
    pub fn suggest_num_bits(entries: u32, error_rate: f64) -> u64 {
        let n = f64::from(entries);
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;

        let bits = (-n * error_rate.ln() / ln2_squared).ceil();
        (bits as u64).max(MIN_NUM_BITS)
    }

    /// Suggests the number of probes given the entries and bit count.
    ///
    /// Formula: `k = round((m / n) * ln(2))`, at least [`MIN_NUM_HASHES`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::FilterBuilder;
    /// assert_eq!(FilterBuilder::suggest_num_hashes(1000, 9586), 7);
    /// ```
    pub fn suggest_num_hashes(entries: u32, num_bits: u64) -> u32 {
        let m = num_bits as f64;
        let n = f64::from(entries);

        let k = (m / n * std::f64::consts::LN_2).round();
        (k as u32).max(MIN_NUM_HASHES)
    }

    /// Number of bytes needed to hold `num_bits` bits.
    pub fn num_bytes(num_bits: u64) -> u64 {
        num_bits.div_ceil(8)
    }
}

/// Structural parameters derived from `(entries, error_rate)`.
struct Params {
    num_bits: u64,
    num_hashes: u32,
    num_bytes: usize,
}

impl Params {
    fn derive(entries: u32, error_rate: f64) -> Result<Params, Error> {
        if entries == 0 {
            return Err(Error::invalid_parameters("entries must be greater than 0")
                .with_context("entries", entries));
        }
        // written this way round so that NaN is rejected too
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::invalid_parameters(
                "error rate must be between 0.0 and 1.0 (exclusive)",
            )
            .with_context("error_rate", error_rate));
        }

        let num_bits = FilterBuilder::suggest_num_bits(entries, error_rate);
        let num_hashes = FilterBuilder::suggest_num_hashes(entries, num_bits);
        let num_bytes = FilterBuilder::num_bytes(num_bits);
        let num_bytes =
            usize::try_from(num_bytes).map_err(|_| Error::allocation_failure(num_bytes))?;

        debug!(
            entries,
            error_rate,
            num_bits,
            num_hashes,
            num_bytes,
            "derived bloom filter parameters"
        );

        Ok(Params {
            num_bits,
            num_hashes,
            num_bytes,
        })
    }

    fn into_filter(self, entries: u32, error_rate: f64, bits: Vec<u8>) -> Filter {
        debug_assert_eq!(bits.len(), self.num_bytes);
        Filter {
            entries,
            error_rate,
            num_bits: self.num_bits,
            num_hashes: self.num_hashes,
            bits: bits.into_boxed_slice(),
        }
    }
}

/// Returns an empty vector able to hold `num_bytes` bytes without reallocating.
fn allocate(num_bytes: usize) -> Result<Vec<u8>, Error> {
    let mut bits = Vec::new();
    bits.try_reserve_exact(num_bytes)
        .map_err(|err| Error::allocation_failure(num_bytes as u64).set_source(err))?;
    Ok(bits)
}

fn read_failure(err: io::Error) -> Error {
    Error::unsupported_buffer("could not read seed data from the provided source")
        .with_context("io_kind", err.kind())
        .set_source(err)
}
