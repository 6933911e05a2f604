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

use std::{fmt, io, path::Path, result};

use bytes::Bytes;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

mod cli;

pub use cli::Cli;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    DotEnv(#[from] dotenv::Error),
    Io(#[from] io::Error),
    Json(#[from] serde_json::Error),
    SansIo(#[from] kelp_sans_io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;

/// Read all of `input`, or stdin when there is no input.
async fn read(input: Option<&Path>) -> Result<Bytes> {
    if let Some(input) = input {
        tokio::fs::read(input).await.map(Bytes::from).map_err(Into::into)
    } else {
        let mut encoded = Vec::new();
        _ = tokio::io::stdin().read_to_end(&mut encoded).await?;
        Ok(Bytes::from(encoded))
    }
}

/// Write `encoded` to `output`, or stdout when there is no output.
async fn write(output: Option<&Path>, encoded: &[u8]) -> Result<()> {
    if let Some(output) = output {
        tokio::fs::write(output, encoded).await.map_err(Into::into)
    } else {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(encoded).await?;
        stdout.flush().await.map_err(Into::into)
    }
}
