// Copyright ⓒ 2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::path::PathBuf;

use crate::Result;
use bytes::Bytes;
use clap::{Args, Subcommand};
use kelp_sans_io::{ErrorCode, FetchRequest, Frame, ProduceRequest, record::Record};
use tracing::debug;

#[derive(Args, Clone, Debug)]
pub(super) struct Header {
    #[arg(long, env = "KELP_CORRELATION_ID", default_value = "0")]
    correlation_id: i32,

    #[arg(long, env = "KELP_CLIENT_ID")]
    client_id: Option<String>,

    /// Write the frame here rather than stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub(super) enum Command {
    Fetch {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        partition: i32,

        #[arg(long, default_value = "0")]
        fetch_offset: i64,

        #[arg(long, default_value = "1048576")]
        max_bytes: i32,

        #[arg(long, default_value = "5000")]
        max_wait_time_ms: i32,

        #[arg(long, default_value = "1")]
        min_bytes: i32,

        #[command(flatten)]
        header: Header,
    },

    Produce {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        partition: i32,

        #[arg(long)]
        key: Option<String>,

        /// One record is produced for each value
        #[arg(long, required = true)]
        value: Vec<String>,

        #[arg(long, default_value = "1")]
        required_acks: i16,

        #[arg(long, default_value = "1500")]
        timeout_ms: i32,

        #[command(flatten)]
        header: Header,
    },
}

impl Command {
    fn header(&self) -> &Header {
        match self {
            Self::Fetch { header, .. } | Self::Produce { header, .. } => header,
        }
    }

    fn frame(&self) -> Result<Bytes> {
        let encoded = match self {
            Self::Fetch {
                topic,
                partition,
                fetch_offset,
                max_bytes,
                max_wait_time_ms,
                min_bytes,
                header,
            } => Frame::request(
                header.correlation_id,
                header.client_id.as_deref(),
                FetchRequest::default()
                    .max_wait_time(*max_wait_time_ms)
                    .min_bytes(*min_bytes)
                    .fetch(topic.as_str(), *partition, *fetch_offset, *max_bytes),
            ),

            Self::Produce {
                topic,
                partition,
                key,
                value,
                required_acks,
                timeout_ms,
                header,
            } => value
                .iter()
                .try_fold(
                    ProduceRequest::default()
                        .required_acks(*required_acks)
                        .timeout(*timeout_ms),
                    |request, value| {
                        Record::builder()
                            .key(key.clone().map(Bytes::from))
                            .value(Some(Bytes::from(value.clone())))
                            .build()
                            .map(|record| request.produce(topic.as_str(), *partition, record))
                    },
                )
                .and_then(|request| {
                    Frame::request(header.correlation_id, header.client_id.as_deref(), request)
                }),
        };

        encoded.map_err(Into::into)
    }

    pub(super) async fn main(self) -> Result<ErrorCode> {
        let encoded = self.frame()?;
        debug!(len = encoded.len());

        crate::write(self.header().output.as_deref(), &encoded[..])
            .await
            .map(|()| ErrorCode::None)
    }
}
