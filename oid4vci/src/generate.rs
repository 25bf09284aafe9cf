//! # Generate
//!
//! Generate random strings for use as pre-authorized codes, nonces, and
//! transaction codes.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand_core::{OsRng, RngCore};

const CODE_BYTES: usize = 32;
const NONCE_BYTES: usize = 16;
const TX_CODE_LEN: usize = 6;

/// Generates a pre-authorized code: 32 bytes from the OS random source,
/// base64url-encoded without padding (43 characters).
#[must_use]
pub fn code() -> String {
    random_b64(CODE_BYTES)
}

/// Generates a base64url-encoded random string for `c_nonce`.
#[must_use]
pub fn nonce() -> String {
    random_b64(NONCE_BYTES)
}

/// Generates a numeric transaction code.
#[must_use]
pub fn tx_code() -> String {
    (0..TX_CODE_LEN)
        .map(|_| {
            // rejection sampling keeps the digits uniform
            let mut b = [0u8; 1];
            loop {
                OsRng.fill_bytes(&mut b);
                if b[0] < 250 {
                    return char::from(b'0' + b[0] % 10);
                }
            }
        })
        .collect()
}

fn random_b64(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
