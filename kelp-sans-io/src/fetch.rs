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

//! Fetch v0.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    ApiKey, ApiName, ApiVersion, Context as _, Decode, Encode, ErrorCode, Reason, Request,
    Response, Result,
    primitive::{Reader, Writer},
    record::{OffsetRecord, set},
};

/// Fetch requests are always sent by a consumer, never a follower.
pub const REPLICA_ID: i32 = -1;

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FetchPartition {
    pub partition: i32,
    pub fetch_offset: i64,
    pub max_bytes: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FetchRequest {
    pub max_wait_time: i32,
    pub min_bytes: i32,
    pub topics: BTreeMap<String, Vec<FetchPartition>>,
}

impl ApiKey for FetchRequest {
    const KEY: i16 = 1;
}

impl ApiName for FetchRequest {
    const NAME: &'static str = "Fetch";
}

impl ApiVersion for FetchRequest {
    const VERSION: i16 = 0;
}

impl Request for FetchRequest {
    type Response = FetchResponse;
}

impl FetchRequest {
    #[must_use]
    pub fn max_wait_time(self, max_wait_time: i32) -> Self {
        Self {
            max_wait_time,
            ..self
        }
    }

    #[must_use]
    pub fn min_bytes(self, min_bytes: i32) -> Self {
        Self { min_bytes, ..self }
    }

    #[must_use]
    pub fn fetch(
        mut self,
        topic: impl Into<String>,
        partition: i32,
        fetch_offset: i64,
        max_bytes: i32,
    ) -> Self {
        self.add(topic, partition, fetch_offset, max_bytes);
        self
    }

    /// Append a fetch of `partition` from `fetch_offset`.
    pub fn add(
        &mut self,
        topic: impl Into<String>,
        partition: i32,
        fetch_offset: i64,
        max_bytes: i32,
    ) {
        self.topics
            .entry(topic.into())
            .or_default()
            .push(FetchPartition {
                partition,
                fetch_offset,
                max_bytes,
            });
    }
}

impl Encode for FetchRequest {
    #[instrument(skip_all)]
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_i32(REPLICA_ID);
        writer.put_i32(self.max_wait_time);
        writer.put_i32(self.min_bytes);

        writer.put_length(self.topics.len())?;
        for (topic, partitions) in &self.topics {
            writer.put_string(topic)?;

            writer.put_length(partitions.len())?;
            for fetch in partitions {
                debug!(%topic, ?fetch);

                writer.put_i32(fetch.partition);
                writer.put_i64(fetch.fetch_offset);
                writer.put_i32(fetch.max_bytes);
            }
        }

        Ok(())
    }
}

impl Decode for FetchRequest {
    #[instrument(skip_all)]
    fn decode(reader: &mut Reader) -> Result<Self> {
        let replica_id = reader.get_i32().context(Reason::FetchRequestReplicaId)?;
        if replica_id != REPLICA_ID {
            debug!(replica_id);
        }

        let max_wait_time = reader.get_i32().context(Reason::FetchRequestMaxWaitTime)?;
        let min_bytes = reader.get_i32().context(Reason::FetchRequestMinBytes)?;

        let mut topics = BTreeMap::<String, Vec<FetchPartition>>::new();

        for _ in 0..reader.get_i32().context(Reason::FetchRequestTopicsLength)? {
            let topic = reader.get_string().context(Reason::FetchRequestTopic)?;
            let partitions = topics.entry(topic).or_default();

            for _ in 0..reader
                .get_i32()
                .context(Reason::FetchRequestPartitionsLength)?
            {
                let partition = reader.get_i32().context(Reason::FetchRequestPartition)?;
                let fetch_offset = reader.get_i64().context(Reason::FetchRequestOffset)?;
                let max_bytes = reader.get_i32().context(Reason::FetchRequestMaxBytes)?;

                partitions.push(FetchPartition {
                    partition,
                    fetch_offset,
                    max_bytes,
                });
            }
        }

        Ok(Self {
            max_wait_time,
            min_bytes,
            topics,
        })
    }
}

/// The outcome of fetching one partition.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PartitionData {
    pub error: ErrorCode,
    pub high_watermark_offset: i64,
    pub records: Vec<OffsetRecord>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FetchResponse {
    pub topics: BTreeMap<String, BTreeMap<i32, PartitionData>>,
}

impl ApiKey for FetchResponse {
    const KEY: i16 = FetchRequest::KEY;
}

impl ApiName for FetchResponse {
    const NAME: &'static str = FetchRequest::NAME;
}

impl ApiVersion for FetchResponse {
    const VERSION: i16 = FetchRequest::VERSION;
}

impl Response for FetchResponse {
    type Request = FetchRequest;
}

/// A record as delivered to a consumer.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

impl FetchResponse {
    #[must_use]
    pub fn partition(
        mut self,
        topic: impl Into<String>,
        partition: i32,
        data: PartitionData,
    ) -> Self {
        _ = self
            .topics
            .entry(topic.into())
            .or_default()
            .insert(partition, data);
        self
    }

    pub fn partition_data(&self, topic: &str, partition: i32) -> Option<&PartitionData> {
        self.topics
            .get(topic)
            .and_then(|partitions| partitions.get(&partition))
    }

    /// One message per record, in record set order within each partition.
    pub fn messages(&self) -> Vec<Message> {
        self.topics
            .iter()
            .flat_map(|(topic, partitions)| {
                partitions.iter().flat_map(move |(partition, data)| {
                    data.records.iter().map(move |offset_record| Message {
                        topic: topic.clone(),
                        partition: *partition,
                        offset: offset_record.offset,
                        key: offset_record.record.key(),
                        value: offset_record.record.value(),
                    })
                })
            })
            .collect()
    }

    /// The first partition error, in topic then partition order.
    pub fn error(&self) -> ErrorCode {
        self.topics
            .values()
            .flat_map(BTreeMap::values)
            .map(|data| data.error)
            .find(|error| !error.is_ok())
            .unwrap_or_default()
    }
}

impl Encode for FetchResponse {
    #[instrument(skip_all)]
    fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.put_length(self.topics.len())?;

        for (topic, partitions) in &self.topics {
            writer.put_string(topic)?;

            writer.put_length(partitions.len())?;
            for (partition, data) in partitions {
                writer.put_i32(*partition);
                writer.put_i16(data.error.into());
                writer.put_i64(data.high_watermark_offset);

                let length = set::encode(writer, &data.records)?;
                debug!(%topic, partition, records = data.records.len(), length);
            }
        }

        Ok(())
    }
}

impl Decode for FetchResponse {
    #[instrument(skip_all)]
    fn decode(reader: &mut Reader) -> Result<Self> {
        let mut topics = BTreeMap::<String, BTreeMap<i32, PartitionData>>::new();

        for _ in 0..reader.get_i32().context(Reason::BlocksLength)? {
            let topic = reader.get_string().context(Reason::BlockTopic)?;
            let partitions = topics.entry(topic.clone()).or_default();

            for _ in 0..reader.get_i32().context(Reason::FetchResponseDataLength)? {
                let partition = reader
                    .get_i32()
                    .context(Reason::FetchResponseDataPartition)?;

                let error = reader
                    .get_i16()
                    .map(ErrorCode::from)
                    .context(Reason::FetchResponseDataErrorCode)?;

                let high_watermark_offset = reader
                    .get_i64()
                    .context(Reason::FetchResponseDataHighwaterMarkOffset)?;

                let length = reader.get_length().context(Reason::MessageSetLength)?;
                let records = set::decode(reader, length)?;

                debug!(
                    %topic,
                    partition,
                    ?error,
                    high_watermark_offset,
                    length,
                    records = records.len()
                );

                _ = partitions.insert(
                    partition,
                    PartitionData {
                        error,
                        high_watermark_offset,
                        records,
                    },
                );
            }
        }

        Ok(Self { topics })
    }
}
