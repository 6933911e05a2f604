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

//! Size prefixed frames carrying a request or response header.
//!
//! ```text
//! request:  int32 size | int16 api key | int16 api version | int32 correlation id | string client id | body
//! response: int32 size | int32 correlation id | body
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    Context as _, Encode, Error, Reason, Request, Response, Result,
    primitive::{Reader, Writer, reserve::Width},
};

/// A Kafka API request or response header.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Header {
    Request {
        api_key: i16,
        api_version: i16,

        /// Echoed back in the header of the response.
        correlation_id: i32,
        client_id: Option<String>,
    },

    Response {
        correlation_id: i32,
    },
}

impl Header {
    pub fn correlation_id(&self) -> i32 {
        match self {
            Self::Request { correlation_id, .. } | Self::Response { correlation_id } => {
                *correlation_id
            }
        }
    }
}

impl Encode for Header {
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        match self {
            Self::Request {
                api_key,
                api_version,
                correlation_id,
                client_id,
            } => {
                writer.put_i16(*api_key);
                writer.put_i16(*api_version);
                writer.put_i32(*correlation_id);
                writer.put_nullable_string(client_id.as_deref())
            }

            Self::Response { correlation_id } => {
                writer.put_i32(*correlation_id);
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Frame<T> {
    /// The number of bytes following the size, as read by a decode.
    ///
    /// Encoding ignores this field and writes the length of the encoded
    /// header and body instead.
    pub size: i32,
    pub header: Header,
    pub body: T,
}

impl<T> Encode for Frame<T>
where
    T: Encode,
{
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer
            .length_prefixed(Width::Four, |writer| {
                self.header
                    .encode(writer)
                    .and_then(|()| self.body.encode(writer))
            })
            .map(|size| debug!(size))
    }
}

impl<T> Frame<T> {
    pub fn correlation_id(&self) -> i32 {
        self.header.correlation_id()
    }

    pub fn client_id(&self) -> Option<&str> {
        if let Header::Request { client_id, .. } = &self.header {
            client_id.as_deref()
        } else {
            None
        }
    }

    /// Split the next frame from `reader`, returning its size and content.
    fn split(reader: &mut Reader) -> Result<(i32, Reader)> {
        let size = reader.get_i32().context(Reason::FrameSize)?;

        usize::try_from(size)
            .map_err(|_| Error::InvalidLength(size))
            .and_then(|length| reader.split_to(length))
            .context(Reason::FrameSize)
            .map(|frame| (size, frame))
    }

    fn remainder(frame: &Reader) {
        if frame.has_remaining() {
            debug!(ignored = frame.remaining());
        }
    }
}

impl<T> Frame<T>
where
    T: Request,
{
    /// Serialize `body` into a request frame.
    #[instrument(skip_all)]
    pub fn request(correlation_id: i32, client_id: Option<&str>, body: T) -> Result<Bytes> {
        Frame {
            size: 0,
            header: Header::Request {
                api_key: T::KEY,
                api_version: T::VERSION,
                correlation_id,
                client_id: client_id.map(ToOwned::to_owned),
            },
            body,
        }
        .to_bytes()
        .inspect(|encoded| debug!(api_name = T::NAME, correlation_id, len = encoded.len()))
    }

    /// Deserialize a request frame, which must carry the api key of `T`.
    #[instrument(skip_all)]
    pub fn request_from_bytes(encoded: impl Into<Bytes>) -> Result<Self> {
        let mut reader = Reader::new(encoded);
        let (size, mut frame) = Self::split(&mut reader)?;

        let api_key = frame.get_i16().context(Reason::FrameApiKey)?;
        if api_key != T::KEY {
            return Err(Error::UnexpectedApiKey {
                expected: T::KEY,
                found: api_key,
            });
        }

        let api_version = frame.get_i16().context(Reason::FrameApiVersion)?;
        if api_version != T::VERSION {
            debug!(api_name = T::NAME, api_version);
        }

        let correlation_id = frame.get_i32().context(Reason::FrameCorrelationId)?;
        let client_id = frame
            .get_nullable_string()
            .context(Reason::FrameClientId)?;

        let body = T::decode(&mut frame)?;
        Self::remainder(&frame);

        debug!(api_name = T::NAME, size, correlation_id, ?client_id);

        Ok(Self {
            size,
            header: Header::Request {
                api_key,
                api_version,
                correlation_id,
                client_id,
            },
            body,
        })
    }
}

impl<T> Frame<T>
where
    T: Response,
{
    /// Serialize `body` into a response frame.
    #[instrument(skip_all)]
    pub fn response(correlation_id: i32, body: T) -> Result<Bytes> {
        Frame {
            size: 0,
            header: Header::Response { correlation_id },
            body,
        }
        .to_bytes()
        .inspect(|encoded| debug!(api_name = T::NAME, correlation_id, len = encoded.len()))
    }

    /// Deserialize a response frame, the body being exactly the rest of the frame.
    #[instrument(skip_all)]
    pub fn response_from_bytes(encoded: impl Into<Bytes>) -> Result<Self> {
        let mut reader = Reader::new(encoded);
        let (size, mut frame) = Self::split(&mut reader)?;

        let correlation_id = frame.get_i32().context(Reason::FrameCorrelationId)?;

        let body = T::decode(&mut frame)?;
        Self::remainder(&frame);

        debug!(api_name = T::NAME, size, correlation_id);

        Ok(Self {
            size,
            header: Header::Response { correlation_id },
            body,
        })
    }
}
