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

use blossom::bloom::Filter;
use blossom::bloom::HEADER_SIZE;
use blossom::bloom::MIN_SERIALIZED_SIZE;
use blossom::error::ErrorKind;
use proptest::collection::vec;
use proptest::prelude::*;

// Reciprocal error rates survive the wire encoding exactly.
fn wire_exact_params() -> impl Strategy<Value = (u32, f64)> {
    (1u32..=2000, 2u16..=u16::MAX).prop_map(|(entries, r)| (entries, 1.0 / f64::from(r)))
}

fn members() -> impl Strategy<Value = Vec<Vec<u8>>> {
    vec(vec(any::<u8>(), 0..32), 0..64)
}

proptest! {
    #[test]
    fn prop_no_false_negatives(
        entries in 1u32..5000,
        error_rate in 0.0001f64..0.5,
        members in members(),
    ) {
        let mut filter = Filter::new(entries, error_rate).unwrap();
        for member in &members {
            filter.add(member);
            prop_assert!(filter.check(member));
        }
        for member in &members {
            prop_assert!(filter.check(member));
        }
    }

    #[test]
    fn prop_deterministic_sizing(entries in 1u32..1_000_000, error_rate in 1e-6f64..0.999) {
        let f1 = Filter::new(entries, error_rate).unwrap();
        let f2 = Filter::new(entries, error_rate).unwrap();
        prop_assert_eq!(f1.num_bits(), f2.num_bits());
        prop_assert_eq!(f1.num_hashes(), f2.num_hashes());
        prop_assert_eq!(f1.num_bytes() as u64, f1.num_bits().div_ceil(8));
        prop_assert!(f1.num_hashes() >= 1);
    }

    #[test]
    fn prop_round_trip_identity((entries, error_rate) in wire_exact_params(), members in members()) {
        let mut filter = Filter::new(entries, error_rate).unwrap();
        for member in &members {
            filter.add(member);
        }
        prop_assert!(filter.is_wire_exact());

        let restored = Filter::load(&filter.dump()).unwrap();
        prop_assert_eq!(restored.as_bytes(), filter.as_bytes());
        prop_assert_eq!(restored.entries(), entries);
        prop_assert_eq!(restored.num_hashes(), filter.num_hashes());
        for member in &members {
            prop_assert!(restored.check(member));
        }
    }

    #[test]
    fn prop_single_bit_flip_detected(
        (entries, error_rate) in wire_exact_params(),
        members in members(),
        bit in any::<prop::sample::Index>(),
    ) {
        let mut filter = Filter::new(entries, error_rate).unwrap();
        for member in &members {
            filter.add(member);
        }

        let mut bytes = filter.dump();
        let bit = bit.index((bytes.len() - HEADER_SIZE) * 8);
        bytes[HEADER_SIZE + bit / 8] ^= 1 << (bit % 8);
        let err = Filter::load(&bytes).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn prop_truncation_rejected(bytes in vec(any::<u8>(), 0..MIN_SERIALIZED_SIZE)) {
        let err = Filter::load(&bytes).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn prop_length_mismatch_rejected(entries in 1u32..5000, error_rate in 0.001f64..0.5, delta in 1usize..16, longer in any::<bool>()) {
        let expected = Filter::new(entries, error_rate).unwrap().num_bytes();
        let len = if longer { expected + delta } else { expected.saturating_sub(delta) };
        let data = vec![0u8; len];
        let err = Filter::with_data(entries, error_rate, &data).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }
}
