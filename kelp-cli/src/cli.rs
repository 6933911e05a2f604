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

use std::process;

use crate::Result;
use clap::{Parser, Subcommand};
use kelp_sans_io::ErrorCode;
use tracing::debug;

mod decode;
mod encode;

#[derive(Clone, Debug, Parser)]
#[command(name = "kelp", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Write a framed Fetch or Produce v0 request
    Encode {
        #[command(subcommand)]
        command: encode::Command,
    },

    /// Read a framed Fetch or Produce v0 response, printing JSON lines
    Decode {
        #[command(subcommand)]
        command: decode::Command,
    },
}

impl Cli {
    pub async fn main() -> Result<ErrorCode> {
        debug!(pid = process::id());

        let cli = Cli::parse();

        match cli.command {
            Command::Encode { command } => command
                .main()
                .await
                .inspect(|result| debug!(?result))
                .inspect_err(|err| debug!(?err)),

            Command::Decode { command } => command
                .main()
                .await
                .inspect(|result| debug!(?result))
                .inspect_err(|err| debug!(?err)),
        }
    }
}
