//! `Content-Length` framing of JSON-RPC messages over byte streams.

use crate::core::{Error, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTENT_LENGTH: &str = "Content-Length:";

/// Read one framed message. Returns `Ok(None)` on a clean end of stream.
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<Value>> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            if content_length.is_none() {
                return Ok(None);
            }
            return Err(Error::Protocol(
                "stream ended inside message headers".to_string(),
            ));
        }

        if line == "\r\n" || line == "\n" {
            break;
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if let Some(value) = trimmed.strip_prefix(CONTENT_LENGTH) {
            let parsed = value.trim().parse::<usize>().map_err(|_| {
                Error::Protocol(format!("invalid Content-Length header: {}", value.trim()))
            })?;
            content_length = Some(parsed);
        }
    }

    let Some(length) = content_length else {
        return Err(Error::Protocol("missing Content-Length header".to_string()));
    };

    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body).await?;
    let payload = serde_json::from_slice::<Value>(&body)?;
    Ok(Some(payload))
}

pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, payload: &Value) -> Result<()> {
    let bytes = serde_json::to_vec(payload)?;
    let header = format!("{} {}\r\n\r\n", CONTENT_LENGTH, bytes.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
