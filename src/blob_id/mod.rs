//! Versioned blob identifier, binary, self-describing name of a stored
//! blob that carries routing metadata and evolves through five coexisting
//! on-disk versions.
//!
//! # On-disk layout (big-endian, version-dependent)
//!
//! ```text
//! V1: [ver:u16][partition...][uuid_len:u32][uuid_utf8...]
//! V2: [ver:u16][0x00:u8][dc:i8][acct:i16][cont:i16][partition...][uuid_len:u32][uuid...]
//! V3: [ver:u16][flags:u8][dc:i8][acct:i16][cont:i16][partition...][uuid_len:u32][uuid...]
//! V4: [ver:u16][flags:u8][dc:i8][acct:i16][cont:i16][partition...][uuid_len:u32][uuid...]
//! V5: [ver:u16][flags:u8][dc:i8][acct:i16][cont:i16][partition...][uuid_len:u32][uuid...]
//! ```
//!
//! `flags` (V3..V5) packs `type` in bit 0 (0=NATIVE, 1=CRAFTED), and for
//! V4/V5 additionally packs `is_encrypted` in bit 1 and, for V5 only,
//! `data_type` in bits 2-3. V2's reserved byte is always `0x00`.
//!
//! Every numeric field is big-endian, and this layout is frozen and
//! never renegotiated once a version ships.
//!
//! The external string form is unpadded base64url of the byte form
//! (RFC 4648 §5). A hex-encoded form is accepted on decode for legacy
//! entry points but never produced.

mod codec;
mod error;

pub use error::BlobIdError;

use crate::partition::PartitionId;
use std::cmp::Ordering;
use uuid::Uuid;

/// Sentinel for `datacenter_id` on V1 identifiers, which carry no
/// datacenter field on the wire.
pub const UNKNOWN_DC: i8 = -1;
/// Sentinel for `account_id` on V1 identifiers.
pub const UNKNOWN_ACCOUNT: i16 = -1;
/// Sentinel for `container_id` on V1 identifiers.
pub const UNKNOWN_CONTAINER: i16 = -1;

/// On-disk version. New variants are never removed, every version that
/// ever shipped must stay decodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Version {
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
}

impl Version {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(Version::V1),
            2 => Some(Version::V2),
            3 => Some(Version::V3),
            4 => Some(Version::V4),
            5 => Some(Version::V5),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Comparison rank used by [`BlobIdentifier`]'s `Ord` impl. V4 and V5
    /// rank alongside V3, see the module doc comment on `compare`.
    fn rank(self) -> u8 {
        match self {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 | Version::V4 | Version::V5 => 3,
        }
    }
}

/// Identifier provenance: generated fresh, or derived from another
/// identifier via [`codec::craft`] with a new account/container binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobIdType {
    Native,
    Crafted,
}

/// Payload kind, present only on V5 identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlobDataType {
    DataChunk = 0,
    Metadata = 1,
    Simple = 2,
}

impl BlobDataType {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => BlobDataType::DataChunk,
            1 => BlobDataType::Metadata,
            2 => BlobDataType::Simple,
            // bit pattern 3 is unassigned; fall back to the canonical default
            // rather than failing a decode over a reserved combination.
            _ => BlobDataType::DataChunk,
        }
    }

    fn to_bits(self) -> u8 {
        self as u8
    }
}

/// An immutable, self-describing blob identifier.
///
/// Produced by [`BlobIdentifier::new`] (fresh UUID), by decoding wire bytes
/// or a string (`BlobIdentifier::from_bytes` / `from_string`), or by
/// [`codec::craft`]. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct BlobIdentifier {
    version: Version,
    id_type: BlobIdType,
    datacenter_id: i8,
    account_id: i16,
    container_id: i16,
    partition: Box<dyn PartitionId>,
    /// Already normalised at construction time: always `false` for
    /// V1/V2/V3, matching the exposed semantics regardless of what a V3
    /// wire payload's flag bit says.
    is_encrypted: bool,
    data_type: Option<BlobDataType>,
    uuid: String,
}

impl BlobIdentifier {
    /// Construct a fresh, natively-generated identifier with a random
    /// (v4) UUID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: Version,
        id_type: BlobIdType,
        datacenter_id: i8,
        account_id: i16,
        container_id: i16,
        partition: Box<dyn PartitionId>,
        is_encrypted: bool,
        data_type: Option<BlobDataType>,
    ) -> Self {
        Self::from_parts(
            version,
            id_type,
            datacenter_id,
            account_id,
            container_id,
            partition,
            is_encrypted,
            data_type,
            Uuid::new_v4().to_string(),
        )
    }

    /// Construct from fully-specified parts (used by decode and craft).
    /// Applies the same per-version normalisation `from_bytes` applies, so
    /// a hand-built identifier never disagrees with one round-tripped
    /// through the wire format.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        version: Version,
        id_type: BlobIdType,
        datacenter_id: i8,
        account_id: i16,
        container_id: i16,
        partition: Box<dyn PartitionId>,
        is_encrypted: bool,
        data_type: Option<BlobDataType>,
        uuid: String,
    ) -> Self {
        let (id_type, datacenter_id, account_id, container_id) = match version {
            Version::V1 => (BlobIdType::Native, UNKNOWN_DC, UNKNOWN_ACCOUNT, UNKNOWN_CONTAINER),
            Version::V2 => (BlobIdType::Native, datacenter_id, account_id, container_id),
            Version::V3 | Version::V4 | Version::V5 => {
                (id_type, datacenter_id, account_id, container_id)
            }
        };
        let is_encrypted = matches!(version, Version::V4 | Version::V5) && is_encrypted;
        let data_type = match version {
            Version::V5 => Some(data_type.unwrap_or(BlobDataType::DataChunk)),
            _ => None,
        };

        Self {
            version,
            id_type,
            datacenter_id,
            account_id,
            container_id,
            partition,
            is_encrypted,
            data_type,
            uuid,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn id_type(&self) -> BlobIdType {
        self.id_type
    }

    pub fn datacenter_id(&self) -> i8 {
        self.datacenter_id
    }

    pub fn account_id(&self) -> i16 {
        self.account_id
    }

    pub fn container_id(&self) -> i16 {
        self.container_id
    }

    pub fn partition(&self) -> &dyn PartitionId {
        self.partition.as_ref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    pub fn data_type(&self) -> Option<BlobDataType> {
        self.data_type
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// True iff `id_type() == Crafted`. V1/V2 are always `false` since
    /// they have no `type` field on the wire.
    pub fn is_crafted(&self) -> bool {
        matches!(self.version, Version::V3 | Version::V4 | Version::V5)
            && self.id_type == BlobIdType::Crafted
    }

    /// V1 has no account/container binding and always matches. V2..V5
    /// match iff both arguments equal the stored fields exactly.
    pub fn is_account_container_match(&self, account: i16, container: i16) -> bool {
        match self.version {
            Version::V1 => true,
            _ => self.account_id == account && self.container_id == container,
        }
    }
}

impl PartialEq for BlobIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BlobIdentifier {}

impl PartialOrd for BlobIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlobIdentifier {
    /// V1 < V2 < V3; V4 and V5 rank alongside V3 but, within that group
    /// (any pair drawn from V3/V4/V5), identifiers compare by UUID
    /// lexicographic order only, the UUID became the primary key once
    /// the scheme stabilised. Within V1 or within V2, comparison is
    /// lexicographic by (partition bytes, uuid).
    fn cmp(&self, other: &Self) -> Ordering {
        let (ra, rb) = (self.version.rank(), other.version.rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        if ra == 3 {
            return self.uuid.cmp(&other.uuid);
        }
        match self.partition.bytes().cmp(other.partition.bytes()) {
            Ordering::Equal => self.uuid.cmp(&other.uuid),
            ord => ord,
        }
    }
}

pub use codec::{
    account_and_container, craft, from_bytes, from_hex_string, from_string, is_crafted,
    is_encrypted, to_bytes, to_string, version_of,
};
