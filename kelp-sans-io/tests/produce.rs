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

use bytes::Bytes;
use common::init_tracing;
use kelp_sans_io::{
    Decode as _, Encode as _, ErrorCode, Frame, ProduceRequest, ProduceResponse, Reason, Result,
    produce::PartitionStatus,
    record::{OffsetRecord, Record},
};
use pretty_assertions::assert_eq;

pub mod common;

/// acks 1, timeout 1500, "logs" partition 1 with one record (key "k", value "v").
static SINGLE_REQUEST: [u8; 56] = [
    0x00, 0x01, 0x00, 0x00, 0x05, 0xdc, 0x00, 0x00, 0x00, 0x01, 0x00, 0x04, 0x6c, 0x6f, 0x67, 0x73,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x1c, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x1f, 0xec, 0xd7, 0x0a, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x6b, 0x00, 0x00, 0x00, 0x01, 0x76,
];

/// "logs" partition 1, no error, assigned offset 1000.
static SINGLE_RESPONSE: [u8; 28] = [
    0x00, 0x00, 0x00, 0x01, 0x00, 0x04, 0x6c, 0x6f, 0x67, 0x73, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xe8,
];

fn key_value(key: &'static [u8], value: &'static [u8]) -> Result<Record> {
    Record::builder()
        .key(Some(Bytes::from_static(key)))
        .value(Some(Bytes::from_static(value)))
        .build()
}

#[test]
fn single_request() -> Result<()> {
    let _guard = init_tracing()?;

    let request = ProduceRequest::default()
        .required_acks(1)
        .timeout(1_500)
        .produce("logs", 1, key_value(b"k", b"v")?);

    assert_eq!(&SINGLE_REQUEST[..], &request.to_bytes()?[..]);

    let decoded = ProduceRequest::from_bytes(&SINGLE_REQUEST[..])?;
    assert_eq!(request, decoded);
    assert_eq!(535_615_242, decoded.topics["logs"][&1][0].record.checksum);
    Ok(())
}

#[test]
fn empty_request_round_trip() -> Result<()> {
    let _guard = init_tracing()?;

    let request = ProduceRequest::default();
    assert_eq!(request, ProduceRequest::from_bytes(request.to_bytes()?)?);
    Ok(())
}

#[test]
fn multi_request_round_trip() -> Result<()> {
    let _guard = init_tracing()?;

    let mut request = ProduceRequest::default().required_acks(-1).timeout(30_000);
    request.add("abc", 0, key_value(b"a", b"one")?);
    request.add("abc", 0, key_value(b"b", b"two")?);
    request.add("abc", 2, Record::builder().build()?);
    request.add(
        "def",
        1,
        Record::builder()
            .value(Some(Bytes::from_static(b"tombstone?")))
            .build()?,
    );

    let decoded = ProduceRequest::from_bytes(request.to_bytes()?)?;
    assert_eq!(request, decoded);

    let abc = &decoded.topics["abc"];
    assert_eq!(
        vec![Some(Bytes::from_static(b"one")), Some(Bytes::from_static(b"two"))],
        abc[&0]
            .iter()
            .map(|offset_record| offset_record.record.value())
            .collect::<Vec<_>>()
    );
    assert_eq!(None, abc[&2][0].record.key);
    Ok(())
}

#[test]
fn request_record_offsets_are_kept() -> Result<()> {
    let _guard = init_tracing()?;

    let mut request = ProduceRequest::default();
    _ = request
        .topics
        .entry(String::from("logs"))
        .or_default()
        .insert(
            0,
            vec![
                OffsetRecord::new(5, key_value(b"k", b"v")?),
                OffsetRecord::new(6, key_value(b"k", b"w")?),
            ],
        );

    let decoded = ProduceRequest::from_bytes(request.to_bytes()?)?;
    assert_eq!(
        vec![5, 6],
        decoded.topics["logs"][&0]
            .iter()
            .map(|offset_record| offset_record.offset)
            .collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn request_missing_fields() -> Result<()> {
    let _guard = init_tracing()?;

    for (length, reason) in [
        (1, Reason::ProduceRequestRequiredAcks),
        (2, Reason::ProduceRequestTimeout),
        (6, Reason::ProduceRequestTopicsLength),
        (10, Reason::ProduceRequestTopic),
        (16, Reason::ProduceRequestPartitionsLength),
        (20, Reason::ProduceRequestPartition),
        (24, Reason::ProduceRequestMessageSetLength),
    ] {
        let error = ProduceRequest::from_bytes(&SINGLE_REQUEST[..length]).unwrap_err();
        assert_eq!(Some(reason), error.reason(), "length: {length}");
    }

    Ok(())
}

#[test]
fn single_response() -> Result<()> {
    let _guard = init_tracing()?;

    let response = ProduceResponse::from_bytes(&SINGLE_RESPONSE[..])?;

    assert_eq!(
        PartitionStatus {
            error: ErrorCode::None,
            offset: 1_000,
        },
        response.topics["logs"][&1]
    );
    assert_eq!(ErrorCode::None, response.error());

    assert_eq!(&SINGLE_RESPONSE[..], &response.to_bytes()?[..]);
    Ok(())
}

#[test]
fn response_missing_fields() -> Result<()> {
    let _guard = init_tracing()?;

    for (range, reason) in [
        (0..4, Reason::ProduceTopicsLength),
        (4..10, Reason::ProduceTopic),
        (10..14, Reason::ProducePartitionsLength),
        (14..18, Reason::ProducePartition),
        (18..20, Reason::ProduceErrorCode),
        (20..28, Reason::ProduceOffset),
    ] {
        for length in range {
            let error = ProduceResponse::from_bytes(&SINGLE_RESPONSE[..length]).unwrap_err();
            assert_eq!(Some(reason), error.reason(), "length: {length}");
            assert!(error.is_eof(), "length: {length}");
        }
    }

    Ok(())
}

#[test]
fn response_with_partition_errors() -> Result<()> {
    let _guard = init_tracing()?;

    let response = ProduceResponse::default()
        .status(
            "abc",
            0,
            PartitionStatus {
                error: ErrorCode::None,
                offset: 32,
            },
        )
        .status(
            "abc",
            1,
            PartitionStatus {
                error: ErrorCode::MessageTooLarge,
                offset: -1,
            },
        )
        .status(
            "def",
            0,
            PartitionStatus {
                error: ErrorCode::Unrecognized(99),
                offset: -1,
            },
        );

    let decoded = ProduceResponse::from_bytes(response.to_bytes()?)?;
    assert_eq!(response, decoded);
    assert_eq!(ErrorCode::MessageTooLarge, decoded.error());
    Ok(())
}

#[test]
fn framed_round_trip() -> Result<()> {
    let _guard = init_tracing()?;

    let request = ProduceRequest::default()
        .required_acks(1)
        .timeout(1_500)
        .produce("logs", 1, key_value(b"k", b"v")?);

    let encoded = Frame::request(3, None, request.clone())?;
    assert_eq!(&SINGLE_REQUEST[..], &encoded[14..]);

    let frame = Frame::<ProduceRequest>::request_from_bytes(encoded)?;
    assert_eq!(request, frame.body);
    assert_eq!(3, frame.correlation_id());

    let encoded = Frame::response(3, ProduceResponse::from_bytes(&SINGLE_RESPONSE[..])?)?;
    assert_eq!(&SINGLE_RESPONSE[..], &encoded[8..]);

    let frame = Frame::<ProduceResponse>::response_from_bytes(encoded)?;
    assert_eq!(1_000, frame.body.topics["logs"][&1].offset);
    Ok(())
}
