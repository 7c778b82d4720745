//! TCP fallback for truncated UDP answers (RFC 1035 §4.2.2, RFC 7766).
//!
//! Every exchange opens its own connection and drops it when done.

use ferrous_resolver_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Sends one length-prefixed query and reads one length-prefixed answer.
/// `timeout` bounds the whole exchange, connect included.
pub async fn exchange(
    message_bytes: &[u8],
    server: SocketAddr,
    timeout: Duration,
) -> Result<Vec<u8>, DomainError> {
    let response = tokio::time::timeout(timeout, async {
        let mut stream = TcpStream::connect(server).await.map_err(|e| {
            DomainError::IoError(format!("Connection refused by TCP server {}: {}", server, e))
        })?;
        stream.set_nodelay(true).map_err(|e| {
            DomainError::IoError(format!("Failed to set TCP_NODELAY on {}: {}", server, e))
        })?;

        send_with_length_prefix(&mut stream, message_bytes).await?;
        debug!(server = %server, message_len = message_bytes.len(), "TCP query sent");

        read_with_length_prefix(&mut stream).await
    })
    .await
    .map_err(|_| DomainError::Timeout {
        server: format!("tcp://{}", server),
    })??;

    debug!(server = %server, response_len = response.len(), "TCP response received");
    Ok(response)
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        DomainError::Encoding(format!(
            "message of {} bytes does not fit a TCP length prefix",
            message_bytes.len()
        ))
    })?;

    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write length prefix: {}", e)))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to flush stream: {}", e)))?;

    Ok(())
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to read response length: {}", e)))?;

    let response_len = usize::from(u16::from_be_bytes(len_buf));
    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await.map_err(|e| {
        DomainError::TruncatedMessage(format!(
            "TCP response body shorter than its {}-byte prefix: {}",
            response_len, e
        ))
    })?;

    Ok(response)
}
