//! SHA-256 digests, lowercase hex.
//!
//! - `sha256_canonical` hashes a value through its canonical JSON bytes, so
//!   key order in the source file does not change the digest.
//! - `sha256_hex` / `sha256_file` hash raw bytes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes;
use crate::{IoError, IoResult};

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

pub fn sha256_file(path: &Path) -> IoResult<String> {
    let mut r = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// First `n` characters of a 64-char lowercase digest.
pub fn short_hex(hex64: &str, n: usize) -> IoResult<String> {
    if hex64.len() != 64 || !hex64.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(IoError::Hash(format!("expected lowercase 64-hex, got {hex64:?}")));
    }
    Ok(hex64[..n.min(64)].to_string())
}

/// Digests of the inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub scenario_sha256: String,
    pub rules_sha256: String,
}

impl InputDigests {
    pub fn compute<S: Serialize, R: Serialize>(scenario: &S, rules: &R) -> IoResult<Self> {
        Ok(Self { scenario_sha256: sha256_canonical(scenario)?, rules_sha256: sha256_canonical(rules)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(short_hex(&h, 12).unwrap(), "ba7816bf8f01");
        assert!(short_hex("ABC", 4).is_err());
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a":1,"b":2})).unwrap();
        assert_eq!(h1, h2);
    }
}
