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
use clap::Subcommand;
use kelp_sans_io::{ErrorCode, FetchResponse, Frame, ProduceResponse};
use serde_json::json;
use tracing::debug;

#[derive(Clone, Debug, Subcommand)]
pub(super) enum Command {
    /// One line per message, records cut short by the broker are dropped
    Fetch {
        /// Read the frame from here rather than stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// One line per partition status
    Produce {
        /// Read the frame from here rather than stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn lossy(bytes: Option<&Bytes>) -> Option<String> {
    bytes.map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

impl Command {
    fn input(&self) -> Option<&PathBuf> {
        match self {
            Self::Fetch { input } | Self::Produce { input } => input.as_ref(),
        }
    }

    fn lines(&self, encoded: Bytes) -> Result<(Vec<String>, ErrorCode)> {
        match self {
            Self::Fetch { .. } => {
                let frame = Frame::<FetchResponse>::response_from_bytes(encoded)?;
                debug!(correlation_id = frame.correlation_id());

                frame
                    .body
                    .messages()
                    .iter()
                    .map(|message| {
                        serde_json::to_string(&json!({
                            "topic": message.topic,
                            "partition": message.partition,
                            "offset": message.offset,
                            "key": lossy(message.key.as_ref()),
                            "value": lossy(message.value.as_ref()),
                        }))
                        .map_err(Into::into)
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(|lines| (lines, frame.body.error()))
            }

            Self::Produce { .. } => {
                let frame = Frame::<ProduceResponse>::response_from_bytes(encoded)?;
                debug!(correlation_id = frame.correlation_id());

                frame
                    .body
                    .topics
                    .iter()
                    .flat_map(|(topic, partitions)| {
                        partitions.iter().map(move |(partition, status)| {
                            serde_json::to_string(&json!({
                                "topic": topic,
                                "partition": partition,
                                "error": status.error.to_string(),
                                "offset": status.offset,
                            }))
                            .map_err(Into::into)
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(|lines| (lines, frame.body.error()))
            }
        }
    }

    pub(super) async fn main(self) -> Result<ErrorCode> {
        let encoded = crate::read(self.input().map(PathBuf::as_path)).await?;
        debug!(len = encoded.len());

        let (lines, error_code) = self.lines(encoded)?;

        let mut output = lines.join("\n");
        if !output.is_empty() {
            output.push('\n');
        }

        crate::write(None, output.as_bytes())
            .await
            .map(|()| error_code)
    }
}
