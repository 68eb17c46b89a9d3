// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Nonce generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Characters a generated nonce is drawn from
pub const NONCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generated nonce length
pub const NONCE_LEN: usize = 16;

/// Source of per-run CSP nonces
pub trait NonceSource: Send {
    fn next_nonce(&mut self) -> String;
}

/// Nonces drawn from a random number generator
pub struct RngNonce {
    rng: StdRng,
}

impl RngNonce {
    /// Seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for a seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NonceSource for RngNonce {
    fn next_nonce(&mut self) -> String {
        (0..NONCE_LEN)
            .map(|_| NONCE_ALPHABET[self.rng.gen_range(0..NONCE_ALPHABET.len())] as char)
            .collect()
    }
}

/// Always returns the same nonce
#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

impl NonceSource for FixedNonce {
    fn next_nonce(&mut self) -> String {
        self.0.clone()
    }
}

/// Whether `value` is safe to reuse as a nonce attribute and CSP source
pub fn is_valid_nonce(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}
