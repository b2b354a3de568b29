//! Streaming SHA-256 integrity digests

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use vigil_core::IntegrityHash;
use vigil_storage::{FileSource, SourceError};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Read failed after {bytes_read} bytes: {source}")]
    Read {
        bytes_read: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Hash everything `reader` yields. Returns the digest and the number of bytes hashed.
pub async fn sha256_reader<R>(mut reader: R) -> Result<(IntegrityHash, u64), DigestError>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_read: u64 = 0;

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|source| DigestError::Read { bytes_read, source })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        bytes_read += n as u64;
    }

    let digest: [u8; 32] = hasher.finalize().into();
    Ok((IntegrityHash::from_sha256(&digest), bytes_read))
}

/// Open `source` and hash its full contents
pub async fn sha256_source(source: &dyn FileSource) -> Result<(IntegrityHash, u64), DigestError> {
    let reader = source.open().await?;
    let (hash, bytes_read) = sha256_reader(reader).await?;
    tracing::debug!(
        source = %source.describe(),
        bytes = bytes_read,
        hash = %hash,
        "Computed integrity hash"
    );
    Ok((hash, bytes_read))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_storage::MemorySource;

    #[tokio::test]
    async fn test_known_digest() {
        let (hash, len) = sha256_reader(&b"abc"[..]).await.unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            hash.as_str(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (hash, len) = sha256_reader(&b""[..]).await.unwrap();
        assert_eq!(len, 0);
        assert_eq!(
            hash.hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_multi_chunk_matches_one_shot() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let source = MemorySource::new("big.png", data.clone());
        let (hash, len) = sha256_source(&source).await.unwrap();

        let expected: [u8; 32] = Sha256::digest(&data).into();
        assert_eq!(len, data.len() as u64);
        assert_eq!(hash, IntegrityHash::from_sha256(&expected));
    }

    #[tokio::test]
    async fn test_revoked_source() {
        let source = MemorySource::new("gone.png", vec![1u8, 2, 3]);
        source.revoke();
        let err = sha256_source(&source).await.unwrap_err();
        assert!(matches!(err, DigestError::Source(SourceError::Revoked(_))));
    }
}
