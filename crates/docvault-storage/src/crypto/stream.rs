//! Streaming AES-GCM decryption.
//!
//! GCM is CTR mode plus a GHASH over the ciphertext, so a container can be
//! decrypted chunk by chunk: the keystream is applied as bytes arrive and
//! GHASH absorbs whole 16-byte blocks, buffering any remainder. The tag is
//! checked once the source ends.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use aes::Aes256;
use aes::cipher::{BlockEncrypt, KeyInit as _, KeyIvInit, StreamCipher};
use bytes::Bytes;
use futures::Stream;
use ghash::GHash;
use ghash::universal_hash::{KeyInit as _, UniversalHash};
use pin_project_lite::pin_project;
use subtle::ConstantTimeEq;

use super::{CryptoError, IV_LEN, TAG_LEN};

type Aes256Ctr = ctr::Ctr32BE<Aes256>;

const BLOCK_LEN: usize = 16;

/// CTR keystream plus running GHASH for one container.
struct GcmState {
    keystream: Aes256Ctr,
    ghash: GHash,
    pending: Vec<u8>,
    tag_mask: [u8; BLOCK_LEN],
    expected_tag: [u8; TAG_LEN],
    ciphertext_len: u64,
}

impl GcmState {
    fn new(key: &[u8; 32], iv: [u8; IV_LEN], expected_tag: [u8; TAG_LEN]) -> Self {
        let block_cipher = Aes256::new(key.into());
        let mut h = ghash::Block::default();
        block_cipher.encrypt_block(&mut h);
        let ghash = GHash::new(&h);

        // J0 for a non-96-bit IV: GHASH(IV || 0^64 || bitlen(IV)).
        let mut j0_hash = ghash.clone();
        j0_hash.update_padded(&iv);
        let mut len_block = ghash::Block::default();
        len_block[8..].copy_from_slice(&((IV_LEN as u64) * 8).to_be_bytes());
        j0_hash.update(&[len_block]);
        let j0 = j0_hash.finalize();

        let mut keystream = Aes256Ctr::new(key.into(), &j0);
        let mut tag_mask = [0u8; BLOCK_LEN];
        keystream.apply_keystream(&mut tag_mask);

        Self {
            keystream,
            ghash,
            pending: Vec::with_capacity(BLOCK_LEN),
            tag_mask,
            expected_tag,
            ciphertext_len: 0,
        }
    }

    fn absorb(&mut self, ciphertext: &[u8]) -> Bytes {
        self.ciphertext_len += ciphertext.len() as u64;

        self.pending.extend_from_slice(ciphertext);
        let whole = self.pending.len() - self.pending.len() % BLOCK_LEN;
        if whole > 0 {
            self.ghash.update_padded(&self.pending[..whole]);
            self.pending.drain(..whole);
        }

        let mut plaintext = ciphertext.to_vec();
        self.keystream.apply_keystream(&mut plaintext);
        Bytes::from(plaintext)
    }

    fn verify(&self) -> Result<(), CryptoError> {
        let mut ghash = self.ghash.clone();
        ghash.update_padded(&self.pending);
        let mut len_block = ghash::Block::default();
        len_block[8..].copy_from_slice(&(self.ciphertext_len * 8).to_be_bytes());
        ghash.update(&[len_block]);

        let mut tag = ghash.finalize();
        for (t, m) in tag.iter_mut().zip(self.tag_mask.iter()) {
            *t ^= m;
        }

        if bool::from(tag.as_slice().ct_eq(&self.expected_tag)) {
            Ok(())
        } else {
            Err(CryptoError::TagMismatch)
        }
    }
}

pin_project! {
    /// Plaintext stream over the ciphertext portion of a container.
    ///
    /// Created by [`ContainerCipher::open_stream`](super::ContainerCipher::open_stream).
    pub struct DecryptStream<S> {
        #[pin]
        inner: S,
        state: GcmState,
        head: Option<Bytes>,
        finished: bool,
    }
}

impl<S> DecryptStream<S> {
    pub(super) fn new(
        inner: S,
        key: &[u8; 32],
        iv: [u8; IV_LEN],
        tag: [u8; TAG_LEN],
        head: Bytes,
    ) -> Self {
        Self {
            inner,
            state: GcmState::new(key, iv, tag),
            head: (!head.is_empty()).then_some(head),
            finished: false,
        }
    }
}

impl<S> Stream for DecryptStream<S>
where
    S: Stream<Item = Result<Bytes, std::io::Error>>,
{
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        if let Some(head) = this.head.take() {
            return Poll::Ready(Some(Ok(this.state.absorb(&head))));
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => Poll::Ready(Some(Ok(this.state.absorb(&chunk)))),
            Some(Err(e)) => {
                *this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                *this.finished = true;
                match this.state.verify() {
                    Ok(()) => Poll::Ready(None),
                    Err(e) => Poll::Ready(Some(Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        e,
                    )))),
                }
            }
        }
    }
}
