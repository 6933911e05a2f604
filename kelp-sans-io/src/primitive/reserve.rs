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

//! Length slots that are written before their content is known.
//!
//! A [`Reservation`] is taken at the current end of a [`Writer`], the
//! content is appended, and the reservation is then committed with the
//! number of bytes written since the end of the slot.

use tracing::debug;

use super::Writer;
use crate::Result;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Width {
    Two,
    Four,
    Eight,
}

impl Width {
    /// The number of bytes in a slot of this width.
    pub fn size(&self) -> usize {
        match self {
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// A zero filled slot that must later be [committed](Writer::commit).
#[must_use]
#[derive(Debug, Eq, PartialEq)]
pub struct Reservation {
    position: usize,
    width: Width,
}

impl Reservation {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn width(&self) -> Width {
        self.width
    }
}

impl Writer {
    pub fn reserve(&mut self, width: Width) -> Reservation {
        let position = self.len();
        self.encoded.resize(position + width.size(), 0);
        Reservation { position, width }
    }

    /// Patch the slot with the bytes written after it, returning that length.
    pub fn commit(&mut self, reservation: Reservation) -> Result<usize> {
        let Reservation { position, width } = reservation;
        let start = position + width.size();
        let length = self.len().saturating_sub(start);

        let slot = &mut self.encoded[position..start];

        match width {
            Width::Two => slot.copy_from_slice(&i16::try_from(length)?.to_be_bytes()),
            Width::Four => slot.copy_from_slice(&i32::try_from(length)?.to_be_bytes()),
            Width::Eight => slot.copy_from_slice(&i64::try_from(length)?.to_be_bytes()),
        }

        debug!(position, ?width, length);

        Ok(length)
    }

    /// Encode `f` behind a length slot of `width`.
    pub fn length_prefixed<F>(&mut self, width: Width, f: F) -> Result<usize>
    where
        F: FnOnce(&mut Writer) -> Result<()>,
    {
        let reservation = self.reserve(width);
        f(self).and_then(|()| self.commit(reservation))
    }
}
