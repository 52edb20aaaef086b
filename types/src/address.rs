//! Account addresses with a `chrt_` prefix.
//!
//! Address format: `chrt_` + base32(account key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(account key).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).
//! Total address length: 5 (prefix) + 52 + 8 = 65 characters.
//!
//! Member accounts and group policy accounts share this format; policy
//! accounts are derived from a sequence number instead of a public key
//! (see [`Address::derive`]).

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Expected length of the encoded part (after the prefix): 52 key + 8 checksum.
const ENCODED_LEN: usize = 60;
/// Number of base32 characters for the account key (256 bits → ceil(256/5) = 52).
const KEY_CHARS: usize = 52;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// An account address, always prefixed with `chrt_`.
///
/// Construction goes through [`Address::parse`] or [`Address::from_key`],
/// so every value of this type is well-formed and carries a valid checksum.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The standard prefix for all addresses.
    pub const PREFIX: &'static str = "chrt_";

    /// Encode a 32-byte account key as an address.
    pub fn from_key(key: &[u8; 32]) -> Self {
        let key_encoded = encode_base32(key);
        let hash = blake2b_256(key);
        let checksum_encoded = encode_base32(&hash[..5]);
        Self(format!("{}{}{}", Self::PREFIX, key_encoded, checksum_encoded))
    }

    /// Derive an address from a domain tag and arbitrary bytes.
    ///
    /// The account key is `Blake2b-256(domain || data)`; group policy accounts
    /// use this with their sequence number.
    pub fn derive(domain: &[u8], data: &[u8]) -> Self {
        Self::from_key(&blake2b_256_multi(&[domain, data]))
    }

    /// Parse and validate an address string (prefix, length, alphabet, checksum).
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        decode_key(raw).ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        Ok(Self(raw.to_string()))
    }

    /// Extract the 32-byte account key.
    pub fn key(&self) -> [u8; 32] {
        // Every constructed address decodes; the zero key is unreachable.
        decode_key(&self.0).unwrap_or([0u8; 32])
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Whether `raw` is a well-formed address with a correct checksum.
pub fn validate_address(raw: &str) -> bool {
    decode_key(raw).is_some()
}

fn decode_key(address: &str) -> Option<[u8; 32]> {
    let encoded = address.strip_prefix(Address::PREFIX)?;
    if encoded.len() != ENCODED_LEN || !encoded.is_ascii() {
        return None;
    }

    let key_encoded = &encoded[..KEY_CHARS];
    let checksum_encoded = &encoded[KEY_CHARS..];

    let key: [u8; 32] = decode_base32_fixed(key_encoded)?;
    let checksum: [u8; 5] = decode_base32_fixed(checksum_encoded)?;

    // Non-zero padding bits would give a second spelling of the same key.
    if encode_base32(&key) != key_encoded {
        return None;
    }

    if checksum != blake2b_256(&key)[..5] {
        return None;
    }
    Some(key)
}

/// Encode a byte slice as base32.
fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let num_chars = total_bits.div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// Decode a base32 string into a fixed-size byte array. Returns `None` on
/// invalid characters or wrong length.
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}..)", &self.0[..self.0.len().min(13)])
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}
