//! Share link token generation.

use rand::Rng;

/// Number of random bytes behind a share token.
const TOKEN_BYTES: usize = 32;

/// Generates share link tokens.
#[derive(Debug, Clone)]
pub struct LinkService;

impl LinkService {
    /// Creates a new link service.
    pub fn new() -> Self {
        Self
    }

    /// Generates a cryptographically secure random token for share links.
    pub fn generate_token(&self) -> String {
        let mut rng = rand::rng();
        let bytes: [u8; TOKEN_BYTES] = rng.random();
        hex::encode(&bytes)
    }
}

impl Default for LinkService {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase hex encoding.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
