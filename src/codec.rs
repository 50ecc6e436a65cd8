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

//! Big-endian byte framing shared by the wire codec.

use std::io;
use std::io::Cursor;

use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::ReadBytesExt;

pub(crate) struct FilterBytes {
    bytes: Vec<u8>,
}

impl FilterBytes {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u16_be(&mut self, n: u16) {
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_u32_be(&mut self, n: u32) {
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, n);
        self.write(&buf);
    }
}

pub(crate) struct FilterSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl<'a> FilterSlice<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        FilterSlice {
            slice: Cursor::new(slice),
        }
    }

    pub fn read_u16_be(&mut self) -> io::Result<u16> {
        self.slice.read_u16::<BigEndian>()
    }

    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        self.slice.read_u32::<BigEndian>()
    }

    /// Returns the unread tail of the underlying slice without advancing.
    pub fn remaining(&self) -> &'a [u8] {
        let inner: &'a [u8] = *self.slice.get_ref();
        let pos = (self.slice.position() as usize).min(inner.len());
        &inner[pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_is_network_order() {
        let mut bytes = FilterBytes::with_capacity(6);
        bytes.write_u16_be(0x0102);
        bytes.write_u32_be(0x0304_0506);
        assert_eq!(bytes.into_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_read_tracks_remaining() {
        let data = [0x00, 0x64, 0x00, 0x00, 0x03, 0xe8, 0xaa];
        let mut slice = FilterSlice::new(&data);
        assert_eq!(slice.read_u16_be().unwrap(), 100);
        assert_eq!(slice.read_u32_be().unwrap(), 1000);
        assert_eq!(slice.remaining(), &[0xaa]);
        assert!(slice.read_u16_be().is_err());
    }
}
