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

//! Record sets: `(int64 offset | int32 length | record)*`.
//!
//! A broker may stop writing a record set part way through a record when a
//! fetch reaches its byte limit. Decoding returns the complete records that
//! precede the first incomplete one and drops the rest.

use tracing::{debug, instrument};

use super::{OffsetRecord, Record};
use crate::{
    Context as _, Decode as _, Encode as _, Error, Reason, Result,
    primitive::{Reader, Writer, reserve::Width},
};

/// The offset and length that precede every record.
pub const ENTRY_OVERHEAD: usize = size_of::<i64>() + size_of::<i32>();

/// Decode a record set of declared `length` from `reader`.
///
/// The reader is advanced past the set, or to its end when the set was cut
/// short. A record whose length is negative, or whose fields cannot be read
/// from the bytes its length covers, is an error.
#[instrument(skip_all)]
pub fn decode(reader: &mut Reader, length: usize) -> Result<Vec<OffsetRecord>> {
    let available = reader.remaining();

    if available < length {
        debug!(length, available);
    }

    let mut budget = reader.split_to(length.min(available))?;
    let mut records = Vec::new();

    while budget.remaining() >= ENTRY_OVERHEAD {
        let offset = budget.get_i64()?;

        let record_length = budget.get_i32().and_then(|record_length| {
            usize::try_from(record_length)
                .map_err(|_| Error::InvalidLength(record_length))
                .context(Reason::MessageLength)
        })?;

        if budget.remaining() < record_length {
            debug!(offset, record_length, discarded = budget.remaining());
            break;
        }

        let record = Record::decode(&mut budget.split_to(record_length)?)?;
        records.push(OffsetRecord { offset, record });
    }

    if budget.has_remaining() && budget.remaining() < ENTRY_OVERHEAD {
        debug!(discarded = budget.remaining());
    }

    debug!(records = records.len());

    Ok(records)
}

/// Encode `records` behind an `int32` length, returning that length.
pub fn encode(writer: &mut Writer, records: &[OffsetRecord]) -> Result<usize> {
    writer.length_prefixed(Width::Four, |writer| {
        records.iter().try_for_each(|record| record.encode(writer))
    })
}
