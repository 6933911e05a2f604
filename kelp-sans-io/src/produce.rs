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

//! Produce v0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    ApiKey, ApiName, ApiVersion, Context as _, Decode, Encode, ErrorCode, Reason, Request,
    Response, Result,
    primitive::{Reader, Writer},
    record::{OffsetRecord, Record, set},
};

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ProduceRequest {
    pub required_acks: i16,
    pub timeout: i32,
    pub topics: BTreeMap<String, BTreeMap<i32, Vec<OffsetRecord>>>,
}

impl ApiKey for ProduceRequest {
    const KEY: i16 = 0;
}

impl ApiName for ProduceRequest {
    const NAME: &'static str = "Produce";
}

impl ApiVersion for ProduceRequest {
    const VERSION: i16 = 0;
}

impl Request for ProduceRequest {
    type Response = ProduceResponse;
}

impl ProduceRequest {
    #[must_use]
    pub fn required_acks(self, required_acks: i16) -> Self {
        Self {
            required_acks,
            ..self
        }
    }

    #[must_use]
    pub fn timeout(self, timeout: i32) -> Self {
        Self { timeout, ..self }
    }

    #[must_use]
    pub fn produce(mut self, topic: impl Into<String>, partition: i32, record: Record) -> Self {
        self.add(topic, partition, record);
        self
    }

    /// Append `record` to the records for `partition`.
    ///
    /// The broker assigns offsets, the offset sent with each record is `0`.
    pub fn add(&mut self, topic: impl Into<String>, partition: i32, record: Record) {
        self.topics
            .entry(topic.into())
            .or_default()
            .entry(partition)
            .or_default()
            .push(OffsetRecord::from(record));
    }
}

impl Encode for ProduceRequest {
    #[instrument(skip_all)]
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_i16(self.required_acks);
        writer.put_i32(self.timeout);

        writer.put_length(self.topics.len())?;
        for (topic, partitions) in &self.topics {
            writer.put_string(topic)?;

            writer.put_length(partitions.len())?;
            for (partition, records) in partitions {
                writer.put_i32(*partition);

                let length = set::encode(writer, records)?;
                debug!(%topic, partition, records = records.len(), length);
            }
        }

        Ok(())
    }
}

impl Decode for ProduceRequest {
    #[instrument(skip_all)]
    fn decode(reader: &mut Reader) -> Result<Self> {
        let required_acks = reader
            .get_i16()
            .context(Reason::ProduceRequestRequiredAcks)?;
        let timeout = reader.get_i32().context(Reason::ProduceRequestTimeout)?;

        let mut topics = BTreeMap::<String, BTreeMap<i32, Vec<OffsetRecord>>>::new();

        for _ in 0..reader
            .get_i32()
            .context(Reason::ProduceRequestTopicsLength)?
        {
            let topic = reader.get_string().context(Reason::ProduceRequestTopic)?;
            let partitions = topics.entry(topic.clone()).or_default();

            for _ in 0..reader
                .get_i32()
                .context(Reason::ProduceRequestPartitionsLength)?
            {
                let partition = reader.get_i32().context(Reason::ProduceRequestPartition)?;

                let length = reader
                    .get_length()
                    .context(Reason::ProduceRequestMessageSetLength)?;
                let records = set::decode(reader, length)?;

                debug!(%topic, partition, length, records = records.len());

                partitions.entry(partition).or_default().extend(records);
            }
        }

        Ok(Self {
            required_acks,
            timeout,
            topics,
        })
    }
}

/// The outcome of producing to one partition.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct PartitionStatus {
    pub error: ErrorCode,
    pub offset: i64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ProduceResponse {
    pub topics: BTreeMap<String, BTreeMap<i32, PartitionStatus>>,
}

impl ApiKey for ProduceResponse {
    const KEY: i16 = ProduceRequest::KEY;
}

impl ApiName for ProduceResponse {
    const NAME: &'static str = ProduceRequest::NAME;
}

impl ApiVersion for ProduceResponse {
    const VERSION: i16 = ProduceRequest::VERSION;
}

impl Response for ProduceResponse {
    type Request = ProduceRequest;
}

impl ProduceResponse {
    #[must_use]
    pub fn status(
        mut self,
        topic: impl Into<String>,
        partition: i32,
        status: PartitionStatus,
    ) -> Self {
        _ = self
            .topics
            .entry(topic.into())
            .or_default()
            .insert(partition, status);
        self
    }

    /// The first partition error, in topic then partition order.
    pub fn error(&self) -> ErrorCode {
        self.topics
            .values()
            .flat_map(BTreeMap::values)
            .map(|status| status.error)
            .find(|error| !error.is_ok())
            .unwrap_or_default()
    }
}

impl Encode for ProduceResponse {
    #[instrument(skip_all)]
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_length(self.topics.len())?;

        for (topic, partitions) in &self.topics {
            writer.put_string(topic)?;

            writer.put_length(partitions.len())?;
            for (partition, status) in partitions {
                writer.put_i32(*partition);
                writer.put_i16(status.error.into());
                writer.put_i64(status.offset);
            }
        }

        Ok(())
    }
}

impl Decode for ProduceResponse {
    #[instrument(skip_all)]
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut topics = BTreeMap::<String, BTreeMap<i32, PartitionStatus>>::new();

        for _ in 0..reader.get_i32().context(Reason::ProduceTopicsLength)? {
            let topic = reader.get_string().context(Reason::ProduceTopic)?;
            let partitions = topics.entry(topic.clone()).or_default();

            for _ in 0..reader.get_i32().context(Reason::ProducePartitionsLength)? {
                let partition = reader.get_i32().context(Reason::ProducePartition)?;

                let error = reader
                    .get_i16()
                    .map(ErrorCode::from)
                    .context(Reason::ProduceErrorCode)?;

                let offset = reader.get_i64().context(Reason::ProduceOffset)?;

                debug!(%topic, partition, ?error, offset);

                _ = partitions.insert(partition, PartitionStatus { error, offset });
            }
        }

        Ok(Self { topics })
    }
}
