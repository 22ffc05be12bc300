//! Record framing for the control channel
//!
//! A record is one JSON document. Writers terminate it with a newline; readers
//! do not rely on that and stop as soon as one complete value has been parsed,
//! so peers that write a bare document and close are understood too.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ControlError, Result};

/// Largest record accepted from a peer
pub const MAX_RECORD_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

/// Encode a value as a single newline-terminated record
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode exactly one record; trailing whitespace is allowed, anything else is not
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(ControlError::RecordTooLarge {
            size: bytes.len(),
            max: MAX_RECORD_SIZE,
        });
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one record and flush it
pub async fn write_record<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = encode(value)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read until one complete record has arrived and decode it.
///
/// Bytes after the first value are discarded: a connection carries a single
/// exchange.
pub async fn read_record<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(if buf.iter().all(u8::is_ascii_whitespace) {
                ControlError::ConnectionClosed
            } else {
                ControlError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-record",
                ))
            });
        }

        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_RECORD_SIZE {
            return Err(ControlError::RecordTooLarge {
                size: buf.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        if let Some(value) = parse_first(&buf)? {
            return Ok(value);
        }
    }
}

/// Parse the first value in `buf`, or `None` if it is still incomplete
fn parse_first<T: DeserializeOwned>(buf: &[u8]) -> Result<Option<T>> {
    let mut stream = serde_json::Deserializer::from_slice(buf).into_iter::<T>();
    match stream.next() {
        Some(Ok(value)) => Ok(Some(value)),
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::{Request, Response};
    use serde_json::json;

    #[test]
    fn test_encode_is_newline_terminated() {
        let bytes = encode(&Request::set_asl(false)).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_request_round_trip() {
        for request in [
            Request::get_status(),
            Request::set_asl(true),
            Request::set_camera(1),
            Request::with_argument("set_sensitivity", 0.75),
            Request::with_argument("set_profile", "gaming"),
        ] {
            let decoded: Request = decode(&encode(&request).unwrap()).unwrap();
            assert_eq!(decoded, request);
        }
    }

    #[test]
    fn test_response_round_trip() {
        let mut data = serde_json::Map::new();
        data.insert("is_processing".into(), json!(true));
        data.insert("fps".into(), json!(24.5));
        data.insert("camera".into(), json!("/dev/video0"));

        for response in [
            Response::ok(),
            Response::ok_with_data(data),
            Response::error("Unknown command: jump"),
        ] {
            let decoded: Response = decode(&encode(&response).unwrap()).unwrap();
            assert_eq!(decoded, response);
        }
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode::<Response>(b"{\"status\": ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let err = decode::<Response>(b"{\"status\":\"maybe\"}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let err = decode::<Response>(b"{\"status\":\"ok\"} trailing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_read_record_split_across_reads() {
        let (mut client, mut server) = tokio::io::duplex(8);
        let writer = tokio::spawn(async move {
            write_record(&mut client, &Request::set_camera(3)).await.unwrap();
        });

        let request: Request = read_record(&mut server).await.unwrap();
        assert_eq!(request, Request::set_camera(3));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_record_without_newline() {
        let mut input: &[u8] = br#"{"status":"ok","data":{"fps":30}}"#;
        let response: Response = read_record(&mut input).await.unwrap();
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_read_record_eof() {
        let mut empty: &[u8] = b"";
        let err = read_record::<_, Response>(&mut empty).await.unwrap_err();
        assert!(matches!(err, ControlError::ConnectionClosed));
        assert_eq!(err.kind(), ErrorKind::Io);

        let mut partial: &[u8] = br#"{"status":"#;
        let err = read_record::<_, Response>(&mut partial).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_read_record_garbage() {
        let mut garbage: &[u8] = b"not json at all\n";
        let err = read_record::<_, Response>(&mut garbage).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_read_record_too_large() {
        let huge = vec![b' '; MAX_RECORD_SIZE + 1];
        let mut input: &[u8] = &huge;
        let err = read_record::<_, Response>(&mut input).await.unwrap_err();
        assert!(matches!(err, ControlError::RecordTooLarge { .. }));
    }
}
