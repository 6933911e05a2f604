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

//! Message format v0 records.
//!
//! ```text
//! int32 checksum | int8 format version | int8 flags | bytes key | bytes value
//! ```
//!
//! A record set is a run of records, each tagged with an offset and
//! prefixed with its length. See [`set`].

pub mod set;

use bytes::Bytes;
use crc::{CRC_32_ISO_HDLC, Crc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Context as _, Decode, Encode, Reason, Result,
    primitive::{Reader, Writer, reserve::Width},
};

const CHECKSUM: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Record {
    pub checksum: i32,
    pub format_version: i8,
    pub flags: i8,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

impl Record {
    #[must_use]
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn key(&self) -> Option<Bytes> {
        self.key.clone()
    }

    pub fn value(&self) -> Option<Bytes> {
        self.value.clone()
    }

    /// Whether the checksum matches the CRC-32 of the fields that follow it.
    pub fn is_valid_checksum(&self) -> Result<bool> {
        checksum(
            self.format_version,
            self.flags,
            self.key.as_deref(),
            self.value.as_deref(),
        )
        .map(|computed| computed == self.checksum)
    }
}

fn checksum(
    format_version: i8,
    flags: i8,
    key: Option<&[u8]>,
    value: Option<&[u8]>,
) -> Result<i32> {
    let mut writer = Writer::default();
    writer.put_i8(format_version);
    writer.put_i8(flags);
    writer.put_bytes(key)?;
    writer.put_bytes(value)?;

    Ok(i32::from_be_bytes(
        CHECKSUM.checksum(&writer.freeze()).to_be_bytes(),
    ))
}

impl Encode for Record {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_i32(self.checksum);
        writer.put_i8(self.format_version);
        writer.put_i8(self.flags);
        writer.put_bytes(self.key.as_deref())?;
        writer.put_bytes(self.value.as_deref())
    }
}

impl Decode for Record {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let checksum = reader.get_i32().context(Reason::MessageChecksum)?;
        let format_version = reader.get_i8().context(Reason::MessageFormatVersion)?;
        let flags = reader.get_i8().context(Reason::MessageFlags)?;
        let key = reader.get_bytes().context(Reason::MessageKey)?;
        let value = reader.get_bytes().context(Reason::MessageValue)?;

        if reader.has_remaining() {
            debug!(checksum, ignored = reader.remaining());
        }

        Ok(Self {
            checksum,
            format_version,
            flags,
            key,
            value,
        })
    }
}

/// Builds a [`Record`] with a computed checksum.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Builder {
    format_version: i8,
    flags: i8,
    key: Option<Bytes>,
    value: Option<Bytes>,
}

impl Builder {
    #[must_use]
    pub fn format_version(self, format_version: i8) -> Self {
        Self {
            format_version,
            ..self
        }
    }

    #[must_use]
    pub fn flags(self, flags: i8) -> Self {
        Self { flags, ..self }
    }

    #[must_use]
    pub fn key(self, key: Option<Bytes>) -> Self {
        Self { key, ..self }
    }

    #[must_use]
    pub fn value(self, value: Option<Bytes>) -> Self {
        Self { value, ..self }
    }

    pub fn build(self) -> Result<Record> {
        checksum(
            self.format_version,
            self.flags,
            self.key.as_deref(),
            self.value.as_deref(),
        )
        .map(|checksum| Record {
            checksum,
            format_version: self.format_version,
            flags: self.flags,
            key: self.key,
            value: self.value,
        })
    }
}

/// A record together with its offset in the log.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct OffsetRecord {
    pub offset: i64,
    pub record: Record,
}

impl OffsetRecord {
    pub fn new(offset: i64, record: Record) -> Self {
        Self { offset, record }
    }
}

impl From<Record> for OffsetRecord {
    fn from(record: Record) -> Self {
        Self::new(0, record)
    }
}

impl Encode for OffsetRecord {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_i64(self.offset);
        writer
            .length_prefixed(Width::Four, |writer| self.record.encode(writer))
            .map(|_| ())
    }
}
