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
    Error, FetchRequest, FetchResponse, Frame, Header, ProduceResponse, Reason, Result,
};
use pretty_assertions::assert_eq;

pub mod common;

fn with_size(content: &[u8]) -> Bytes {
    let mut encoded = i32::try_from(content.len())
        .expect("frame size")
        .to_be_bytes()
        .to_vec();
    encoded.extend_from_slice(content);
    Bytes::from(encoded)
}

#[test]
fn request_header() -> Result<()> {
    let _guard = init_tracing()?;

    let encoded = Frame::request(
        -7,
        Some("console-consumer"),
        FetchRequest::default().fetch("t", 0, 0, 1),
    )?;

    let frame = Frame::<FetchRequest>::request_from_bytes(encoded.clone())?;
    assert_eq!(
        Header::Request {
            api_key: 1,
            api_version: 0,
            correlation_id: -7,
            client_id: Some(String::from("console-consumer")),
        },
        frame.header
    );
    assert_eq!(
        usize::try_from(frame.size).expect("frame size"),
        encoded.len() - 4
    );
    Ok(())
}

#[test]
fn request_header_missing_fields() -> Result<()> {
    let _guard = init_tracing()?;

    let encoded = Frame::request(1, Some("kelp"), FetchRequest::default())?;
    let content = encoded.slice(4..);

    for (length, reason) in [
        (1, Reason::FrameApiKey),
        (2, Reason::FrameApiVersion),
        (4, Reason::FrameCorrelationId),
        (8, Reason::FrameClientId),
        (12, Reason::FrameClientId),
        (14, Reason::FetchRequestReplicaId),
    ] {
        let error =
            Frame::<FetchRequest>::request_from_bytes(with_size(&content[..length])).unwrap_err();
        assert_eq!(Some(reason), error.reason(), "length: {length}");
    }

    Ok(())
}

#[test]
fn response_frame_size() -> Result<()> {
    let _guard = init_tracing()?;

    for encoded in [
        Bytes::from_static(&[0, 0]),
        Bytes::from_static(&[0, 0, 0, 8, 0, 0, 0, 1]),
        Bytes::from_static(&[0xff, 0xff, 0xff, 0xfc, 0, 0, 0, 1]),
    ] {
        let error = Frame::<ProduceResponse>::response_from_bytes(encoded.clone()).unwrap_err();
        assert_eq!(Some(Reason::FrameSize), error.reason(), "{encoded:?}");
    }

    Ok(())
}

#[test]
fn response_missing_correlation_id() -> Result<()> {
    let _guard = init_tracing()?;

    let error =
        Frame::<FetchResponse>::response_from_bytes(with_size(&[0, 0, 1])).unwrap_err();
    assert_eq!(Some(Reason::FrameCorrelationId), error.reason());
    Ok(())
}

#[test]
fn response_body_is_bounded_by_frame() -> Result<()> {
    let _guard = init_tracing()?;

    // a frame of just the correlation id, followed by bytes of the next frame
    let mut encoded = with_size(&[0, 0, 0, 9]).to_vec();
    encoded.extend_from_slice(&[0, 0, 0, 1]);

    let error = Frame::<ProduceResponse>::response_from_bytes(encoded).unwrap_err();
    assert_eq!(Some(Reason::ProduceTopicsLength), error.reason());
    Ok(())
}

#[test]
fn request_for_another_api() -> Result<()> {
    let _guard = init_tracing()?;

    let encoded = Frame::request(1, None, FetchRequest::default())?;

    assert!(matches!(
        Frame::<kelp_sans_io::ProduceRequest>::request_from_bytes(encoded),
        Err(Error::UnexpectedApiKey {
            expected: 0,
            found: 1
        })
    ));
    Ok(())
}
