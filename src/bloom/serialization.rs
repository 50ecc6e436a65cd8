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

use tracing::debug;
use tracing::warn;

use super::Filter;
use super::FilterBuilder;
use crate::codec::FilterBytes;
use crate::codec::FilterSlice;
use crate::error::Error;

/// Size of the fixed header: checksum, error rate reciprocal, entries.
pub const HEADER_SIZE: usize = 8;
/// Smallest buffer [`Filter::load`] accepts: a header and one payload byte.
pub const MIN_SERIALIZED_SIZE: usize = HEADER_SIZE + 1;

/// A filter's parameters and bit array, exported without framing or checksum.
///
/// Unlike [`Filter::dump`], the error rate is kept exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFilter<'a> {
    /// Expected number of distinct members.
    pub entries: u32,
    /// Target false positive rate.
    pub error_rate: f64,
    /// The bit array.
    pub data: &'a [u8],
}

/// Computes the 16-bit checksum stored in the header.
///
/// This is the CRC-32 (IEEE) of `payload` folded in half by XOR. It detects
/// corruption in transit and is not an integrity guarantee against tampering.
pub fn checksum16(payload: &[u8]) -> u16 {
    let crc = crc32fast::hash(payload);
    ((crc & 0xffff) ^ (crc >> 16)) as u16
}

/// Encodes an error rate as the nearest integer reciprocal, saturated to `[1, 65535]`.
pub fn encode_error_rate(error_rate: f64) -> u16 {
    let reciprocal = (1.0 / error_rate).round();
    reciprocal.clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Decodes an error rate reciprocal read from a header.
pub fn decode_error_rate(reciprocal: u16) -> Result<f64, Error> {
    if reciprocal == 0 {
        return Err(Error::invalid_parameters("error rate reciprocal must not be 0"));
    }
    Ok(1.0 / f64::from(reciprocal))
}

impl Filter {
    /// Serializes the filter into a checksummed, big-endian framed buffer.
    ///
    /// | offset | size | field |
    /// |--------|------|-------|
    /// | 0 | 2 | checksum of the payload |
    /// | 2 | 2 | `round(1 / error_rate)` |
    /// | 4 | 4 | entries |
    /// | 8 | n | bit array |
    ///
    /// The error rate is stored lossily. Loading re-derives the bit count from
    /// the decoded rate, so the result only loads back as the same filter when
    /// [`is_wire_exact()`](Self::is_wire_exact) holds (e.g. for `0.01` or `0.001`).
    ///
    /// # Examples
    ///
    /// ```
    /// # use blossom::bloom::Filter;
    /// let mut filter = Filter::new(1000, 0.01).unwrap();
    /// filter.add("alice");
    ///
    /// let bytes = filter.dump();
    /// let restored = Filter::load(&bytes).unwrap();
    /// assert!(restored.check("alice"));
    /// assert_eq!(restored.as_bytes(), filter.as_bytes());
    /// ```
    pub fn dump(&self) -> Vec<u8> {
        if !self.is_wire_exact() {
            warn!(
                entries = self.entries,
                error_rate = self.error_rate,
                "error rate does not survive the wire encoding; the dump will not load back identically"
            );
        }

        let mut bytes = FilterBytes::with_capacity(HEADER_SIZE + self.bits.len());
        bytes.write_u16_be(checksum16(&self.bits));
        bytes.write_u16_be(encode_error_rate(self.error_rate));
        bytes.write_u32_be(self.entries);
        bytes.write(&self.bits);
        bytes.into_bytes()
    }

    /// Deserializes a filter produced by [`dump()`](Self::dump).
    ///
    /// # Errors
    ///
    /// - `TruncatedInput` if `bytes` is shorter than [`MIN_SERIALIZED_SIZE`]
    /// - `ChecksumMismatch` if the payload does not match the header checksum
    /// - `InvalidParameters` if the header holds parameters no filter can have
    /// - `LengthMismatch` if the payload length disagrees with the header parameters
    pub fn load(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < MIN_SERIALIZED_SIZE {
            warn!(len = bytes.len(), "rejected truncated bloom filter");
            return Err(Error::truncated_input(MIN_SERIALIZED_SIZE, bytes.len()));
        }

        let truncated = |_| Error::truncated_input(MIN_SERIALIZED_SIZE, bytes.len());
        let mut cursor = FilterSlice::new(bytes);
        let checksum = cursor.read_u16_be().map_err(truncated)?;
        let reciprocal = cursor.read_u16_be().map_err(truncated)?;
        let entries = cursor.read_u32_be().map_err(truncated)?;
        let payload = cursor.remaining();

        let actual = checksum16(payload);
        if actual != checksum {
            warn!(
                expected = checksum,
                actual,
                "rejected bloom filter with corrupted payload"
            );
            return Err(Error::checksum_mismatch(checksum, actual));
        }

        let error_rate = decode_error_rate(reciprocal)?;
        let filter = Filter::with_data(entries, error_rate, payload)?;
        debug!(
            entries,
            error_rate,
            num_bytes = payload.len(),
            "loaded bloom filter"
        );
        Ok(filter)
    }

    /// Exports the parameters and a read-only view of the bit array, without
    /// framing, checksum or precision loss.
    pub fn dump_raw(&self) -> RawFilter<'_> {
        RawFilter {
            entries: self.entries,
            error_rate: self.error_rate,
            data: &self.bits,
        }
    }

    /// Rebuilds a filter from a [`RawFilter`] export.
    ///
    /// # Errors
    ///
    /// As [`Filter::with_data`].
    pub fn from_raw(raw: RawFilter<'_>) -> Result<Self, Error> {
        Filter::with_data(raw.entries, raw.error_rate, raw.data)
    }

    /// Returns whether [`load()`](Self::load) of this filter's dump re-derives
    /// the same bit count.
    pub fn is_wire_exact(&self) -> bool {
        match decode_error_rate(encode_error_rate(self.error_rate)) {
            Ok(error_rate) if error_rate < 1.0 => {
                FilterBuilder::suggest_num_bits(self.entries, error_rate) == self.num_bits
            }
            _ => false,
        }
    }
}
