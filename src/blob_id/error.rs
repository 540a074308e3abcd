//! Decode/craft error kinds for [`super::BlobIdentifier`].
//!
//! This enumeration is exhaustive by design, every way `BlobIdCodec` can
//! fail is listed here, nothing is retried internally, and every error is
//! handed back to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobIdError {
    #[error("invalid base64/hex encoding: {0}")]
    InvalidBase64(String),

    #[error("truncated identifier: fewer bytes than the declared layout requires")]
    TruncatedInput,

    #[error("unknown blob identifier version {0}")]
    UnknownVersion(u16),

    #[error("partition not present in cluster map (prefix {prefix:02x?})")]
    UnknownPartition { prefix: Vec<u8> },

    #[error("bad uuid length: declared {declared}, available {available}")]
    BadUuidLength { declared: i64, available: usize },

    #[error("uuid bytes are not valid utf-8")]
    BadUtf8,

    #[error("craft target must be >= v3, got v{0}")]
    InvalidCraftTarget(u16),
}
