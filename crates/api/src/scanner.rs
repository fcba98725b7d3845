//! Virus scanning for uploads.
//!
//! [`ClamdScanner`] talks to a clamd daemon over TCP using the `INSTREAM`
//! command. Every failure to get an answer becomes
//! [`ScanVerdict::Unavailable`], which callers treat as a rejection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tourdesk_core::documents::ScanVerdict;

/// Bytes sent per `INSTREAM` chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on the daemon's reply.
const MAX_REPLY_BYTES: u64 = 4096;

const SCAN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("clamd connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("clamd did not answer within {0:?}")]
    Timeout(Duration),

    #[error("unexpected clamd reply: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, bytes: &[u8]) -> ScanVerdict;
}

pub struct ClamdScanner {
    addr: String,
}

impl ClamdScanner {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn instream(&self, bytes: &[u8]) -> Result<String, ScanError> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(b"zINSTREAM\0").await?;
        for chunk in bytes.chunks(CHUNK_SIZE) {
            // Chunk length is a 4-byte big-endian prefix.
            stream.write_all(&(chunk.len() as u32).to_be_bytes()).await?;
            stream.write_all(chunk).await?;
        }
        stream.write_all(&0u32.to_be_bytes()).await?;
        stream.flush().await?;

        let mut reply = Vec::new();
        stream.take(MAX_REPLY_BYTES).read_to_end(&mut reply).await?;
        Ok(String::from_utf8_lossy(&reply)
            .trim_end_matches(['\0', '\n'])
            .to_string())
    }
}

/// Interpret a clamd `INSTREAM` reply such as `stream: OK` or
/// `stream: Eicar-Signature FOUND`.
pub fn parse_reply(reply: &str) -> Result<ScanVerdict, ScanError> {
    let body = reply.strip_prefix("stream:").map(str::trim).unwrap_or(reply.trim());
    if body == "OK" {
        return Ok(ScanVerdict::Clean);
    }
    if let Some(signature) = body.strip_suffix(" FOUND") {
        return Ok(ScanVerdict::Infected {
            signature: signature.trim().to_string(),
        });
    }
    Err(ScanError::Protocol(reply.to_string()))
}

#[async_trait]
impl VirusScanner for ClamdScanner {
    async fn scan(&self, bytes: &[u8]) -> ScanVerdict {
        let result = match tokio::time::timeout(SCAN_TIMEOUT, self.instream(bytes)).await {
            Ok(Ok(reply)) => parse_reply(&reply),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ScanError::Timeout(SCAN_TIMEOUT)),
        };

        result.unwrap_or_else(|e| {
            tracing::error!(addr = %self.addr, error = %e, "Virus scan failed");
            ScanVerdict::Unavailable {
                reason: "virus scanner unavailable".to_string(),
            }
        })
    }
}

/// Used when `VIRUS_SCAN_DISABLED` is set. Nothing is ever reported clean.
pub struct DisabledScanner;

#[async_trait]
impl VirusScanner for DisabledScanner {
    async fn scan(&self, _bytes: &[u8]) -> ScanVerdict {
        ScanVerdict::Unavailable {
            reason: "virus scanning is disabled".to_string(),
        }
    }
}
