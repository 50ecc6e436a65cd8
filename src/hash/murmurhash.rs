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

use super::DEFAULT_SEED;

/// Hashes a member into the two base values used for double hashing.
///
/// Both halves come from a single MurmurHash3 x64/128 evaluation, so the
/// cost is independent of the number of probes.
#[inline]
pub(crate) fn hash_member(member: &[u8]) -> (u64, u64) {
    mur3::murmurhash3_x64_128(member, DEFAULT_SEED)
}
