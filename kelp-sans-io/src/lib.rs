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
//
//! A Kafka (message format v0) Fetch and Produce codec that performs no I/O
//! (it operates only on bytes).
//!
//! ## Design
//!
//! Requests are populated by the caller, encoded through a [`Writer`] and
//! handed to a transport. Responses arrive as a complete buffer and are
//! decoded through a [`Reader`]. Every decode failure names the field that
//! could not be read (a [`Reason`]), with one deliberate exception: the
//! record set inside a fetch response may be cut short by the broker, so a
//! trailing incomplete record is dropped rather than reported.
//!
//! Some useful starting points:
//!
//! - **Fetching** - [`FetchRequest`], [`FetchResponse`] and [`Message`].
//! - **Producing** - [`ProduceRequest`], [`ProduceResponse`] and [`record::Record`].
//! - **Framing** - [`Frame`] and [`Header`].
//!
//! ## Examples
//!
//! Encoding a [`FetchRequest`]:
//!
//! ```
//! # use kelp_sans_io::Error;
//! # fn main() -> Result<(), Error> {
//! use kelp_sans_io::{Encode as _, FetchRequest};
//!
//! let encoded = FetchRequest::default()
//!     .max_wait_time(1_000)
//!     .min_bytes(4)
//!     .fetch("logs", 1, 123_456_789, 1_024)
//!     .to_bytes()?;
//!
//! assert_eq!(42, encoded.len());
//! # Ok(())
//! # }
//! ```
//!
//! Decoding a [`FetchResponse`] and flattening it into messages:
//!
//! ```
//! # use kelp_sans_io::Error;
//! # fn main() -> Result<(), Error> {
//! use kelp_sans_io::{Decode as _, ErrorCode, FetchResponse};
//!
//! let encoded = vec![
//!     0, 0, 0, 1, 0, 4, 108, 111, 103, 115, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 3,
//!     232, 0, 0, 0, 30, 0, 0, 0, 0, 0, 0, 3, 232, 0, 0, 0, 18, 0, 0, 4, 0, 0, 0, 255, 255, 255,
//!     255, 0, 0, 0, 4, 170, 170, 170, 170,
//! ];
//!
//! let response = FetchResponse::from_bytes(encoded)?;
//! assert_eq!(ErrorCode::None, response.topics["logs"][&1].error);
//!
//! let messages = response.messages();
//! assert_eq!(1, messages.len());
//! assert_eq!(1_000, messages[0].offset);
//! assert_eq!(None, messages[0].key);
//! # Ok(())
//! # }
//! ```

pub mod fetch;
pub mod frame;
pub mod primitive;
pub mod produce;
pub mod record;

use bytes::{Bytes, TryGetError};
pub use fetch::{FetchRequest, FetchResponse, Message};
pub use frame::{Frame, Header};
pub use primitive::{Reader, Writer};
pub use produce::{ProduceRequest, ProduceResponse};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    io, num,
    process::{ExitCode, Termination},
    str, string,
    sync::Arc,
};

pub trait ApiKey {
    const KEY: i16;
}

pub trait ApiName {
    const NAME: &'static str;
}

pub trait ApiVersion {
    const VERSION: i16;
}

/// All Kafka API requests implement this trait
pub trait Request:
    ApiKey + ApiName + ApiVersion + Clone + fmt::Debug + Decode + Default + Encode + Send + Sync + 'static
{
    type Response: Response;
}

/// All Kafka API responses implement this trait
pub trait Response:
    ApiKey + ApiName + ApiVersion + Clone + fmt::Debug + Decode + Default + Encode + Send + Sync + 'static
{
    type Request: Request;
}

pub trait Encode {
    fn encode(&self, writer: &mut Writer) -> Result<()>;

    fn to_bytes(&self) -> Result<Bytes> {
        let mut writer = Writer::default();
        self.encode(&mut writer).map(|()| writer.freeze())
    }
}

pub trait Decode: Sized {
    fn decode(reader: &mut Reader) -> Result<Self>;

    fn from_bytes(encoded: impl Into<Bytes>) -> Result<Self> {
        Self::decode(&mut Reader::new(encoded))
    }
}

/// The field that was being read when a decode failed.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Reason {
    BlocksLength,
    BlockTopic,
    FetchResponseDataLength,
    FetchResponseDataPartition,
    FetchResponseDataErrorCode,
    FetchResponseDataHighwaterMarkOffset,
    MessageSetLength,

    MessageLength,
    MessageChecksum,
    MessageFormatVersion,
    MessageFlags,
    MessageKey,
    MessageValue,

    FetchRequestReplicaId,
    FetchRequestMaxWaitTime,
    FetchRequestMinBytes,
    FetchRequestTopicsLength,
    FetchRequestTopic,
    FetchRequestPartitionsLength,
    FetchRequestPartition,
    FetchRequestOffset,
    FetchRequestMaxBytes,

    ProduceTopicsLength,
    ProduceTopic,
    ProducePartitionsLength,
    ProducePartition,
    ProduceErrorCode,
    ProduceOffset,

    ProduceRequestRequiredAcks,
    ProduceRequestTimeout,
    ProduceRequestTopicsLength,
    ProduceRequestTopic,
    ProduceRequestPartitionsLength,
    ProduceRequestPartition,
    ProduceRequestMessageSetLength,

    FrameSize,
    FrameApiKey,
    FrameApiVersion,
    FrameCorrelationId,
    FrameClientId,
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlocksLength => "invalid blocks length",
            Self::BlockTopic => "invalid block topic",
            Self::FetchResponseDataLength => "invalid fetch response data length",
            Self::FetchResponseDataPartition => "invalid fetch response data partition",
            Self::FetchResponseDataErrorCode => "invalid fetch response data error code",
            Self::FetchResponseDataHighwaterMarkOffset => {
                "invalid fetch response data highwater mark offset"
            }
            Self::MessageSetLength => "invalid message set length",

            Self::MessageLength => "invalid message length",
            Self::MessageChecksum => "invalid message checksum",
            Self::MessageFormatVersion => "invalid message format version",
            Self::MessageFlags => "invalid message flags",
            Self::MessageKey => "invalid message key",
            Self::MessageValue => "invalid message value",

            Self::FetchRequestReplicaId => "invalid fetch request replica id",
            Self::FetchRequestMaxWaitTime => "invalid fetch request max wait time",
            Self::FetchRequestMinBytes => "invalid fetch request min bytes",
            Self::FetchRequestTopicsLength => "invalid fetch request topics length",
            Self::FetchRequestTopic => "invalid fetch request topic",
            Self::FetchRequestPartitionsLength => "invalid fetch request partitions length",
            Self::FetchRequestPartition => "invalid fetch request partition",
            Self::FetchRequestOffset => "invalid fetch request offset",
            Self::FetchRequestMaxBytes => "invalid fetch request max bytes",

            Self::ProduceTopicsLength => "invalid produce topics length",
            Self::ProduceTopic => "invalid produce topic",
            Self::ProducePartitionsLength => "invalid produce partitions length",
            Self::ProducePartition => "invalid produce partition",
            Self::ProduceErrorCode => "invalid produce error code",
            Self::ProduceOffset => "invalid produce offset",

            Self::ProduceRequestRequiredAcks => "invalid produce request required acks",
            Self::ProduceRequestTimeout => "invalid produce request timeout",
            Self::ProduceRequestTopicsLength => "invalid produce request topics length",
            Self::ProduceRequestTopic => "invalid produce request topic",
            Self::ProduceRequestPartitionsLength => "invalid produce request partitions length",
            Self::ProduceRequestPartition => "invalid produce request partition",
            Self::ProduceRequestMessageSetLength => "invalid produce request message set length",

            Self::FrameSize => "invalid frame size",
            Self::FrameApiKey => "invalid api key",
            Self::FrameApiVersion => "invalid api version",
            Self::FrameCorrelationId => "invalid correlation id",
            Self::FrameClientId => "invalid client id",
        })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    Decoding { reason: Reason, source: Box<Error> },
    Eof { requested: usize, available: usize },
    FromUtf8(string::FromUtf8Error),
    InvalidLength(i32),
    Io(Arc<io::Error>),
    Message(String),
    TryFromInt(#[from] num::TryFromIntError),
    UnexpectedApiKey { expected: i16, found: i16 },
    Utf8(str::Utf8Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decoding { reason, source } => write!(f, "{reason}: {source}"),
            Error::Message(e) => f.write_str(e),
            e => write!(f, "{e:?}"),
        }
    }
}

impl Error {
    /// The field being decoded when this error occurred.
    pub fn reason(&self) -> Option<Reason> {
        if let Self::Decoding { reason, .. } = self {
            Some(*reason)
        } else {
            None
        }
    }

    /// Whether the buffer ran out before a field could be read.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::Eof { .. } => true,
            Self::Decoding { source, .. } => source.is_eof(),
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<TryGetError> for Error {
    fn from(value: TryGetError) -> Self {
        Self::Eof {
            requested: value.requested,
            available: value.available,
        }
    }
}

impl From<str::Utf8Error> for Error {
    fn from(value: str::Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl From<string::FromUtf8Error> for Error {
    fn from(value: string::FromUtf8Error) -> Self {
        Self::FromUtf8(value)
    }
}

/// Attach the [`Reason`] for a structural decode failure.
pub(crate) trait Context<T> {
    fn context(self, reason: Reason) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn context(self, reason: Reason) -> Result<T> {
        self.map_err(|source| Error::Decoding {
            reason,
            source: Box::new(source),
        })
    }
}

#[non_exhaustive]
#[derive(
    Clone, Copy, Default, Deserialize, Eq, Hash, Debug, Ord, PartialEq, PartialOrd, Serialize,
)]
/// Kafka API response error codes.
pub enum ErrorCode {
    UnknownServerError,
    #[default]
    None,
    OffsetOutOfRange,
    CorruptMessage,
    UnknownTopicOrPartition,
    InvalidFetchSize,
    LeaderNotAvailable,
    NotLeaderOrFollower,
    RequestTimedOut,
    BrokerNotAvailable,
    ReplicaNotAvailable,
    MessageTooLarge,
    StaleControllerEpoch,
    OffsetMetadataTooLarge,
    NetworkException,
    CoordinatorLoadInProgress,
    CoordinatorNotAvailable,
    NotCoordinator,
    InvalidTopicException,
    RecordListTooLarge,
    NotEnoughReplicas,
    NotEnoughReplicasAfterAppend,
    InvalidRequiredAcks,
    IllegalGeneration,

    /// A code that is not in this table, kept verbatim.
    Unrecognized(i16),
}

impl ErrorCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Termination for ErrorCode {
    fn report(self) -> ExitCode {
        if let Self::None = self {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

impl From<i16> for ErrorCode {
    fn from(value: i16) -> Self {
        match value {
            -1 => Self::UnknownServerError,
            0 => Self::None,
            1 => Self::OffsetOutOfRange,
            2 => Self::CorruptMessage,
            3 => Self::UnknownTopicOrPartition,
            4 => Self::InvalidFetchSize,
            5 => Self::LeaderNotAvailable,
            6 => Self::NotLeaderOrFollower,
            7 => Self::RequestTimedOut,
            8 => Self::BrokerNotAvailable,
            9 => Self::ReplicaNotAvailable,
            10 => Self::MessageTooLarge,
            11 => Self::StaleControllerEpoch,
            12 => Self::OffsetMetadataTooLarge,
            13 => Self::NetworkException,
            14 => Self::CoordinatorLoadInProgress,
            15 => Self::CoordinatorNotAvailable,
            16 => Self::NotCoordinator,
            17 => Self::InvalidTopicException,
            18 => Self::RecordListTooLarge,
            19 => Self::NotEnoughReplicas,
            20 => Self::NotEnoughReplicasAfterAppend,
            21 => Self::InvalidRequiredAcks,
            22 => Self::IllegalGeneration,
            otherwise => Self::Unrecognized(otherwise),
        }
    }
}

impl From<ErrorCode> for i16 {
    fn from(value: ErrorCode) -> Self {
        match value {
            ErrorCode::UnknownServerError => -1,
            ErrorCode::None => 0,
            ErrorCode::OffsetOutOfRange => 1,
            ErrorCode::CorruptMessage => 2,
            ErrorCode::UnknownTopicOrPartition => 3,
            ErrorCode::InvalidFetchSize => 4,
            ErrorCode::LeaderNotAvailable => 5,
            ErrorCode::NotLeaderOrFollower => 6,
            ErrorCode::RequestTimedOut => 7,
            ErrorCode::BrokerNotAvailable => 8,
            ErrorCode::ReplicaNotAvailable => 9,
            ErrorCode::MessageTooLarge => 10,
            ErrorCode::StaleControllerEpoch => 11,
            ErrorCode::OffsetMetadataTooLarge => 12,
            ErrorCode::NetworkException => 13,
            ErrorCode::CoordinatorLoadInProgress => 14,
            ErrorCode::CoordinatorNotAvailable => 15,
            ErrorCode::NotCoordinator => 16,
            ErrorCode::InvalidTopicException => 17,
            ErrorCode::RecordListTooLarge => 18,
            ErrorCode::NotEnoughReplicas => 19,
            ErrorCode::NotEnoughReplicasAfterAppend => 20,
            ErrorCode::InvalidRequiredAcks => 21,
            ErrorCode::IllegalGeneration => 22,
            ErrorCode::Unrecognized(code) => code,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownServerError => f.write_str(
                "The server experienced an unexpected error when processing the request.",
            ),
            Self::None => f.write_str("No error."),
            Self::OffsetOutOfRange => f.write_str(
                "The requested offset is not within the range of offsets maintained by the server.",
            ),
            Self::CorruptMessage => f.write_str(
                "This message has failed its CRC checksum, exceeds the valid size, or is \
                 otherwise corrupt.",
            ),
            Self::UnknownTopicOrPartition => {
                f.write_str("This server does not host this topic-partition.")
            }
            Self::InvalidFetchSize => f.write_str("The requested fetch size is invalid."),
            Self::LeaderNotAvailable => f.write_str(
                "There is no leader for this topic-partition as we are in the middle of a \
                 leadership election.",
            ),
            Self::NotLeaderOrFollower => {
                f.write_str("This server is not the leader for that topic-partition.")
            }
            Self::RequestTimedOut => f.write_str("The request timed out."),
            Self::BrokerNotAvailable => f.write_str("The broker is not available."),
            Self::ReplicaNotAvailable => f.write_str(
                "The replica is not available for the requested topic-partition.",
            ),
            Self::MessageTooLarge => f.write_str(
                "The request included a message larger than the max message size the server will \
                 accept.",
            ),
            Self::StaleControllerEpoch => f.write_str("The controller moved to another broker."),
            Self::OffsetMetadataTooLarge => {
                f.write_str("The metadata field of the offset request was too large.")
            }
            Self::NetworkException => {
                f.write_str("The server disconnected before a response was received.")
            }
            Self::CoordinatorLoadInProgress => {
                f.write_str("The coordinator is loading and hence can't process requests.")
            }
            Self::CoordinatorNotAvailable => f.write_str("The coordinator is not available."),
            Self::NotCoordinator => f.write_str("This is not the correct coordinator."),
            Self::InvalidTopicException => {
                f.write_str("The request attempted to perform an operation on an invalid topic.")
            }
            Self::RecordListTooLarge => f.write_str(
                "The request included message batch larger than the configured segment size on \
                 the server.",
            ),
            Self::NotEnoughReplicas => f.write_str(
                "Messages are rejected since there are fewer in-sync replicas than required.",
            ),
            Self::NotEnoughReplicasAfterAppend => f.write_str(
                "Messages are written to the log, but to fewer in-sync replicas than required.",
            ),
            Self::InvalidRequiredAcks => {
                f.write_str("Produce request specified an invalid value for required acks.")
            }
            Self::IllegalGeneration => f.write_str("Specified group generation id is not valid."),
            Self::Unrecognized(code) => write!(f, "Unrecognized error code: {code}."),
        }
    }
}
