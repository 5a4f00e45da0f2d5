//! JSON boundary: loaders for scenarios, rules and calibration points,
//! canonical JSON output, SHA-256 digests. Local files only.

#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem errors (open, read, create_dir_all, rename, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// Parse or serialisation errors; `pointer` is `line:column` for parse
    /// errors, `/` otherwise.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Well-formed JSON whose content is out of domain.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        let pointer = if e.line() > 0 {
            format!("{}:{}", e.line(), e.column())
        } else {
            "/".to_string()
        };
        IoError::Json { pointer, msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_calibration_points, load_rules, load_scenario, load_scores};
    pub use crate::{IoError, IoResult};
}
