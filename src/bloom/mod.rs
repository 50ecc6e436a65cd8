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

//! Bloom filter for probabilistic set membership testing, with a checksummed
//! wire format.
//!
//! A Bloom filter answers "possibly present" or "definitely absent". False positive
//! matches are possible, false negatives are not.
//!
//! # Usage
//!
//! ```rust
//! use blossom::bloom::Filter;
//!
//! // Sized for 1000 members with a 1% false positive rate
//! let mut filter = Filter::new(1000, 0.01).unwrap();
//!
//! filter.add("alice");
//! filter.add(b"\x00\x01");
//!
//! assert!(filter.check("alice"));
//! assert!(filter.check(b"\x00\x01"));
//!
//! println!("Size: {} bits in {} bytes", filter.num_bits(), filter.num_bytes());
//! println!("Est. FPP: {:.4}%", filter.estimated_fpp() * 100.0);
//! ```
//!
//! # Sizing
//!
//! The bit count is `m = ceil(-n * ln(p) / ln(2)^2)` and the probe count is
//! `k = round(m / n * ln(2))`, both at least 1. Two filters built from the same
//! `(entries, error_rate)` always have the same shape.
//!
//! # Persistence
//!
//! [`Filter::dump`] produces an 8-byte big-endian header followed by the raw bit
//! array, and [`Filter::load`] validates and restores it:
//!
//! ```rust
//! # use blossom::bloom::Filter;
//! let mut filter = Filter::new(1000, 0.01).unwrap();
//! filter.add("alice");
//!
//! let bytes = filter.dump();
//! let restored = Filter::load(&bytes).unwrap();
//! assert_eq!(restored, filter);
//! ```
//!
//! The header stores the error rate as a 16-bit reciprocal. For exact transfer
//! inside a process, use [`Filter::dump_raw`] and [`Filter::from_raw`].
//!
//! # Implementation Details
//!
//! - MurmurHash3 x64/128 supplies both base hashes in one pass
//! - Probes use double hashing (Kirsch-Mitzenmacher): `(h1 + i * h2) mod m`
//! - Bits are packed LSB-first into bytes
//! - The checksum is CRC-32 folded to 16 bits
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"
//! - Kirsch and Mitzenmacher (2008). "Less Hashing, Same Performance: Building a Better Bloom
//!   Filter"

mod builder;
mod filter;
mod serialization;

pub use self::builder::FilterBuilder;
pub use self::builder::MIN_NUM_BITS;
pub use self::builder::MIN_NUM_HASHES;
pub use self::filter::Filter;
pub use self::serialization::HEADER_SIZE;
pub use self::serialization::MIN_SERIALIZED_SIZE;
pub use self::serialization::RawFilter;
pub use self::serialization::checksum16;
pub use self::serialization::decode_error_rate;
pub use self::serialization::encode_error_rate;
