// Copyright ⓒ 2024-2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed width big endian integers, strings and nullable bytes.

pub mod reserve;

use bytes::{Buf as _, BufMut as _, Bytes, BytesMut};

use crate::{Error, Result};

const NULL_LENGTH: i16 = -1;

/// Appends protocol primitives to a growable buffer.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Writer {
    encoded: BytesMut,
}

impl Writer {
    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    pub fn put_i8(&mut self, value: i8) {
        self.encoded.put_i8(value);
    }

    pub fn put_i16(&mut self, value: i16) {
        self.encoded.put_i16(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.encoded.put_i32(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.encoded.put_i64(value);
    }

    /// The `i32` element count that precedes an array.
    pub fn put_length(&mut self, length: usize) -> Result<()> {
        i32::try_from(length)
            .map(|length| self.put_i32(length))
            .map_err(Into::into)
    }

    /// An `i16` length followed by the UTF-8 bytes of `value`.
    ///
    /// The length must fit in an `i16`, otherwise [`Error::TryFromInt`]
    /// is returned and nothing is written.
    pub fn put_string(&mut self, value: &str) -> Result<()> {
        let length = i16::try_from(value.len())?;
        self.put_i16(length);
        self.encoded.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn put_nullable_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => {
                self.put_i16(NULL_LENGTH);
                Ok(())
            }

            Some(value) => self.put_string(value),
        }
    }

    /// An `i32` length followed by the bytes, or a length of `-1` for null.
    pub fn put_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            None => self.put_i32(i32::from(NULL_LENGTH)),

            Some(value) => {
                let length = i32::try_from(value.len())?;
                self.put_i32(length);
                self.encoded.put_slice(value);
            }
        }

        Ok(())
    }

    pub fn freeze(self) -> Bytes {
        self.encoded.freeze()
    }
}

/// Reads protocol primitives, failing with [`Error::Eof`] when fewer bytes
/// remain than a read requires.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Reader {
    encoded: Bytes,
}

impl From<Bytes> for Reader {
    fn from(encoded: Bytes) -> Self {
        Self { encoded }
    }
}

impl Reader {
    pub fn new(encoded: impl Into<Bytes>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.encoded.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.encoded.has_remaining()
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        self.encoded.try_get_i8().map_err(Into::into)
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        self.encoded.try_get_i16().map_err(Into::into)
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        self.encoded.try_get_i32().map_err(Into::into)
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.encoded.try_get_i64().map_err(Into::into)
    }

    /// An `i32` length that must not be negative.
    pub fn get_length(&mut self) -> Result<usize> {
        self.get_i32().and_then(|length| {
            usize::try_from(length).map_err(|_| Error::InvalidLength(length))
        })
    }

    pub fn get_string(&mut self) -> Result<String> {
        self.get_nullable_string()
            .and_then(|value| value.ok_or(Error::InvalidLength(i32::from(NULL_LENGTH))))
    }

    pub fn get_nullable_string(&mut self) -> Result<Option<String>> {
        let length = self.get_i16()?;

        if length == NULL_LENGTH {
            return Ok(None);
        }

        let length =
            usize::try_from(length).map_err(|_| Error::InvalidLength(i32::from(length)))?;

        self.take(length)
            .and_then(|encoded| String::from_utf8(encoded.to_vec()).map_err(Into::into))
            .map(Some)
    }

    pub fn get_bytes(&mut self) -> Result<Option<Bytes>> {
        let length = self.get_i32()?;

        if length == i32::from(NULL_LENGTH) {
            return Ok(None);
        }

        usize::try_from(length)
            .map_err(|_| Error::InvalidLength(length))
            .and_then(|length| self.take(length))
            .map(Some)
    }

    /// Split off the next `length` bytes into their own reader.
    pub fn split_to(&mut self, length: usize) -> Result<Reader> {
        self.take(length).map(Reader::from)
    }

    fn take(&mut self, length: usize) -> Result<Bytes> {
        if self.encoded.len() < length {
            Err(Error::Eof {
                requested: length,
                available: self.encoded.len(),
            })
        } else {
            Ok(self.encoded.split_to(length))
        }
    }
}
