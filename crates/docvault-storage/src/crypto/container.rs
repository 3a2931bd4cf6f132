//! Whole-buffer encryption and the entry point for streaming decryption.

use std::fmt;

use aes::Aes256;
use aes_gcm::AesGcm;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::stream::DecryptStream;
use super::{CryptoError, HEADER_LEN, IV_LEN, TAG_LEN};

/// AES-256-GCM with a 16-byte nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypts buffers into containers and opens containers for reading.
#[derive(Clone)]
pub struct ContainerCipher {
    key: [u8; 32],
}

impl fmt::Debug for ContainerCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerCipher")
            .field("key", &"****")
            .finish()
    }
}

impl ContainerCipher {
    /// Create a cipher for a 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` into a fresh container with a random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm16::new((&self.key).into());
        let nonce = Aes256Gcm16::generate_nonce(&mut OsRng);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut container = Vec::with_capacity(HEADER_LEN + buffer.len());
        container.extend_from_slice(&nonce);
        container.extend_from_slice(&tag);
        container.extend_from_slice(&buffer);
        Ok(container)
    }

    /// Decrypt a complete container held in memory.
    pub fn decrypt(&self, container: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if container.len() < HEADER_LEN {
            return Err(CryptoError::Truncated {
                observed: container.len(),
            });
        }
        let (iv, rest) = container.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let cipher = Aes256Gcm16::new((&self.key).into());
        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(nonce_ref(iv), b"", &mut buffer, tag_ref(tag))
            .map_err(|_| CryptoError::TagMismatch)?;
        Ok(buffer)
    }

    /// Read the container header from `source` and return a stream that
    /// decrypts the remainder as it arrives.
    ///
    /// Plaintext is yielded before the tag can be checked; a mismatch is
    /// reported as a final `InvalidData` error item.
    pub async fn open_stream<S>(&self, mut source: S) -> Result<DecryptStream<S>, CryptoError>
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Unpin,
    {
        let mut header = Vec::with_capacity(HEADER_LEN);
        let mut leftover = Bytes::new();

        while header.len() < HEADER_LEN {
            let Some(chunk) = source.next().await else {
                return Err(CryptoError::Truncated {
                    observed: header.len(),
                });
            };
            let chunk = chunk?;
            let needed = HEADER_LEN - header.len();
            if chunk.len() <= needed {
                header.extend_from_slice(&chunk);
            } else {
                header.extend_from_slice(&chunk[..needed]);
                leftover = chunk.slice(needed..);
            }
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&header[..IV_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&header[IV_LEN..]);

        Ok(DecryptStream::new(source, &self.key, iv, tag, leftover))
    }
}

#[allow(deprecated)]
fn nonce_ref(bytes: &[u8]) -> &GenericArray<u8, <Aes256Gcm16 as AeadCore>::NonceSize> {
    GenericArray::from_slice(bytes)
}

#[allow(deprecated)]
fn tag_ref(bytes: &[u8]) -> &GenericArray<u8, <Aes256Gcm16 as AeadCore>::TagSize> {
    GenericArray::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn cipher() -> ContainerCipher {
        ContainerCipher::new([7u8; 32])
    }

    fn chunked(data: Vec<u8>, size: usize) -> impl Stream<Item = std::io::Result<Bytes>> + Unpin {
        let chunks: Vec<std::io::Result<Bytes>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    async fn drain<S>(stream: S) -> (Vec<u8>, Option<std::io::Error>)
    where
        S: Stream<Item = std::io::Result<Bytes>>,
    {
        futures::pin_mut!(stream);
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(bytes) => out.extend_from_slice(&bytes),
                Err(e) => return (out, Some(e)),
            }
        }
        (out, None)
    }

    #[test]
    fn container_layout_and_length() {
        let plaintext = b"quarterly numbers";
        let container = cipher().encrypt(plaintext).unwrap();
        assert_eq!(container.len(), HEADER_LEN + plaintext.len());
        assert_ne!(&container[HEADER_LEN..], plaintext);
        assert_eq!(cipher().decrypt(&container).unwrap(), plaintext);
    }

    #[test]
    fn fresh_iv_per_container() {
        let a = cipher().encrypt(b"same").unwrap();
        let b = cipher().encrypt(b"same").unwrap();
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let container = cipher().encrypt(b"secret").unwrap();
        let other = ContainerCipher::new([8u8; 32]);
        assert!(matches!(other.decrypt(&container), Err(CryptoError::TagMismatch)));
    }

    #[tokio::test]
    async fn streaming_matches_buffered_for_odd_chunking() {
        let plaintext: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let container = cipher().encrypt(&plaintext).unwrap();

        for size in [1, 7, 16, 33, 4096] {
            let stream = cipher()
                .open_stream(chunked(container.clone(), size))
                .await
                .unwrap();
            let (out, err) = drain(stream).await;
            assert!(err.is_none(), "chunk size {size}");
            assert_eq!(out, plaintext, "chunk size {size}");
        }
    }

    #[tokio::test]
    async fn streaming_empty_plaintext() {
        let container = cipher().encrypt(b"").unwrap();
        assert_eq!(container.len(), HEADER_LEN);
        let stream = cipher().open_stream(chunked(container, 5)).await.unwrap();
        let (out, err) = drain(stream).await;
        assert!(out.is_empty());
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn corrupted_tag_surfaces_as_stream_error() {
        let plaintext = vec![42u8; 1000];
        let mut container = cipher().encrypt(&plaintext).unwrap();
        container[IV_LEN + 3] ^= 0x01;

        let stream = cipher().open_stream(chunked(container, 64)).await.unwrap();
        let (_, err) = drain(stream).await;
        let err = err.expect("tag mismatch must be reported");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn corrupted_ciphertext_surfaces_as_stream_error() {
        let mut container = cipher().encrypt(b"hello, encrypted world").unwrap();
        let last = container.len() - 1;
        container[last] ^= 0x80;

        let stream = cipher().open_stream(chunked(container, 8)).await.unwrap();
        let (_, err) = drain(stream).await;
        assert!(err.is_some());
    }

    #[tokio::test]
    async fn truncated_header_is_rejected_up_front() {
        let container = cipher().encrypt(b"abc").unwrap();
        let result = cipher().open_stream(chunked(container[..20].to_vec(), 6)).await;
        assert!(matches!(result, Err(CryptoError::Truncated { observed: 20 })));
    }
}
