//! Encode/decode/craft for [`super::BlobIdentifier`], see the module doc
//! comment on `blob_id` for the wire layout.

use super::error::BlobIdError;
use super::{BlobDataType, BlobIdType, BlobIdentifier, Version};
use crate::partition::{PartitionDirectory, PartitionError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

const FLAG_CRAFTED: u8 = 0x01;
const FLAG_ENCRYPTED: u8 = 0x02;
const DATA_TYPE_SHIFT: u8 = 2;

// ── Encode ───────────────────────────────────────────────────────────────────

/// Serialise `id` to its big-endian wire bytes.
///
/// Writing into a `Vec<u8>` cannot fail (no I/O), so the `byteorder`/`Write`
/// calls below are `.unwrap()`-ed, the one case in this crate where that's
/// the correct idiom rather than error propagation.
pub fn to_bytes(id: &BlobIdentifier, directory: &dyn PartitionDirectory) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u16::<BigEndian>(id.version().as_u16()).unwrap();

    match id.version() {
        Version::V1 => {}
        Version::V2 => {
            buf.write_u8(0x00).unwrap(); // reserved byte, always zero
            write_header_fields(&mut buf, id);
        }
        Version::V3 | Version::V4 | Version::V5 => {
            buf.write_u8(flags_byte(id)).unwrap();
            write_header_fields(&mut buf, id);
        }
    }

    directory
        .write_partition(id.partition(), &mut buf)
        .expect("writing partition bytes into a Vec<u8> cannot fail");

    let uuid_bytes = id.uuid().as_bytes();
    buf.write_u32::<BigEndian>(uuid_bytes.len() as u32).unwrap();
    buf.extend_from_slice(uuid_bytes);
    buf
}

fn write_header_fields(buf: &mut Vec<u8>, id: &BlobIdentifier) {
    buf.write_i8(id.datacenter_id()).unwrap();
    buf.write_i16::<BigEndian>(id.account_id()).unwrap();
    buf.write_i16::<BigEndian>(id.container_id()).unwrap();
}

fn flags_byte(id: &BlobIdentifier) -> u8 {
    let mut flags = 0u8;
    if id.id_type() == BlobIdType::Crafted {
        flags |= FLAG_CRAFTED;
    }
    if matches!(id.version(), Version::V4 | Version::V5) && id.is_encrypted() {
        flags |= FLAG_ENCRYPTED;
    }
    if id.version() == Version::V5 {
        if let Some(dt) = id.data_type() {
            flags |= dt.to_bits() << DATA_TYPE_SHIFT;
        }
    }
    flags
}

/// Encode `id` to the canonical, unpadded base64url string form.
pub fn to_string(id: &BlobIdentifier, directory: &dyn PartitionDirectory) -> String {
    URL_SAFE_NO_PAD.encode(to_bytes(id, directory))
}

// ── Decode ───────────────────────────────────────────────────────────────────

struct Header {
    version: Version,
    id_type: BlobIdType,
    datacenter_id: i8,
    account_id: i16,
    container_id: i16,
    is_encrypted: bool,
    data_type: Option<BlobDataType>,
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<Header, BlobIdError> {
    let version_u16 = cursor
        .read_u16::<BigEndian>()
        .map_err(|_| BlobIdError::TruncatedInput)?;
    let version = Version::from_u16(version_u16).ok_or(BlobIdError::UnknownVersion(version_u16))?;

    match version {
        Version::V1 => Ok(Header {
            version,
            id_type: BlobIdType::Native,
            datacenter_id: super::UNKNOWN_DC,
            account_id: super::UNKNOWN_ACCOUNT,
            container_id: super::UNKNOWN_CONTAINER,
            is_encrypted: false,
            data_type: None,
        }),
        Version::V2 => {
            let _reserved = cursor.read_u8().map_err(|_| BlobIdError::TruncatedInput)?;
            let (dc, acct, cont) = read_header_fields(cursor)?;
            Ok(Header {
                version,
                id_type: BlobIdType::Native,
                datacenter_id: dc,
                account_id: acct,
                container_id: cont,
                is_encrypted: false,
                data_type: None,
            })
        }
        Version::V3 | Version::V4 | Version::V5 => {
            let flags = cursor.read_u8().map_err(|_| BlobIdError::TruncatedInput)?;
            let (dc, acct, cont) = read_header_fields(cursor)?;
            let id_type = if flags & FLAG_CRAFTED != 0 {
                BlobIdType::Crafted
            } else {
                BlobIdType::Native
            };
            let is_encrypted =
                matches!(version, Version::V4 | Version::V5) && (flags & FLAG_ENCRYPTED != 0);
            let data_type = match version {
                Version::V5 => Some(BlobDataType::from_bits(flags >> DATA_TYPE_SHIFT)),
                _ => None,
            };
            Ok(Header {
                version,
                id_type,
                datacenter_id: dc,
                account_id: acct,
                container_id: cont,
                is_encrypted,
                data_type,
            })
        }
    }
}

fn read_header_fields(cursor: &mut Cursor<&[u8]>) -> Result<(i8, i16, i16), BlobIdError> {
    let dc = cursor.read_i8().map_err(|_| BlobIdError::TruncatedInput)?;
    let acct = cursor
        .read_i16::<BigEndian>()
        .map_err(|_| BlobIdError::TruncatedInput)?;
    let cont = cursor
        .read_i16::<BigEndian>()
        .map_err(|_| BlobIdError::TruncatedInput)?;
    Ok((dc, acct, cont))
}

fn map_partition_error(err: PartitionError) -> BlobIdError {
    match err {
        PartitionError::Truncated | PartitionError::Io(_) => BlobIdError::TruncatedInput,
        PartitionError::UnknownPartition { prefix } => BlobIdError::UnknownPartition { prefix },
    }
}

/// A declared uuid length past this is never a plausible uuid, however
/// much data happens to be sitting in the buffer. Rejecting it up front
/// avoids attempting a multi-gigabyte `Vec` allocation for a clearly
/// bogus or negative-reinterpreted length before `read_exact` ever gets
/// a chance to fail.
const MAX_PLAUSIBLE_UUID_LEN: usize = 1 << 20;

/// Decode from the front of `bytes`, returning the identifier and the
/// number of bytes consumed. Trailing bytes beyond the declared uuid
/// length are left unread, this is the "stream" entry point's tolerant
/// behaviour.
///
/// `reject_uuid_overrun` distinguishes the two entry points' handling of
/// a `uuid_len` that exceeds the bytes actually remaining: the string
/// entry point treats that as `BadUuidLength` (spec.md §4.1 step 4
/// scopes this rejection to the string path); the stream entry point
/// just attempts the read and lets a genuine short read surface as
/// `TruncatedInput`. Both paths still reject a negative or wildly
/// implausible length before ever touching the allocator.
fn decode_prefix(
    bytes: &[u8],
    directory: &dyn PartitionDirectory,
    reject_uuid_overrun: bool,
) -> Result<(BlobIdentifier, usize), BlobIdError> {
    let mut cursor = Cursor::new(bytes);
    let header = read_header(&mut cursor)?;

    let partition = directory
        .read_partition(&mut cursor)
        .map_err(map_partition_error)?;

    let uuid_len = cursor
        .read_i32::<BigEndian>()
        .map_err(|_| BlobIdError::TruncatedInput)?;
    let consumed_so_far = cursor.position() as usize;
    let available = bytes.len().saturating_sub(consumed_so_far);
    if uuid_len < 0 {
        return Err(BlobIdError::BadUuidLength {
            declared: uuid_len as i64,
            available,
        });
    }
    let declared = uuid_len as usize;

    if reject_uuid_overrun && declared > available {
        return Err(BlobIdError::BadUuidLength {
            declared: declared as i64,
            available,
        });
    }
    if !reject_uuid_overrun && declared > MAX_PLAUSIBLE_UUID_LEN {
        return Err(BlobIdError::BadUuidLength {
            declared: declared as i64,
            available,
        });
    }

    let mut uuid_buf = vec![0u8; declared];
    cursor
        .read_exact(&mut uuid_buf)
        .map_err(|_| BlobIdError::TruncatedInput)?;
    let uuid = String::from_utf8(uuid_buf).map_err(|_| BlobIdError::BadUtf8)?;

    let id = BlobIdentifier::from_parts(
        header.version,
        header.id_type,
        header.datacenter_id,
        header.account_id,
        header.container_id,
        partition,
        header.is_encrypted,
        header.data_type,
        uuid,
    );
    Ok((id, cursor.position() as usize))
}

/// Decode `bytes`, tolerating (and discarding) any bytes beyond the
/// declared uuid length, the stream/byte entry point. An over-long
/// `uuid_len` is left to `read_exact` to reject as `TruncatedInput`.
pub fn from_bytes(
    bytes: &[u8],
    directory: &dyn PartitionDirectory,
) -> Result<BlobIdentifier, BlobIdError> {
    decode_prefix(bytes, directory, false).map(|(id, _consumed)| id)
}

fn decode_string_bytes(s: &str) -> Result<Vec<u8>, BlobIdError> {
    URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|e| BlobIdError::InvalidBase64(e.to_string()))
}

fn reject_trailing(id: BlobIdentifier, consumed: usize, total: usize) -> Result<BlobIdentifier, BlobIdError> {
    if consumed != total {
        return Err(BlobIdError::BadUuidLength {
            declared: consumed as i64,
            available: total,
        });
    }
    Ok(id)
}

/// Decode `s`, the canonical unpadded base64url string form, rejecting any
/// trailing bytes beyond the declared uuid length. This is the "string"
/// entry point's strict behaviour.
pub fn from_string(
    s: &str,
    directory: &dyn PartitionDirectory,
) -> Result<BlobIdentifier, BlobIdError> {
    let bytes = decode_string_bytes(s)?;
    let (id, consumed) = decode_prefix(&bytes, directory, true)?;
    reject_trailing(id, consumed, bytes.len())
}

/// Decode `s` as the legacy hex-encoded alternative form. New paths
/// never *produce* this form, but MUST decode it
/// identically to the equivalent base64url string, used only by legacy
/// entry points that still emit hex.
pub fn from_hex_string(
    s: &str,
    directory: &dyn PartitionDirectory,
) -> Result<BlobIdentifier, BlobIdError> {
    let bytes = hex::decode(s).map_err(|e| BlobIdError::InvalidBase64(e.to_string()))?;
    let (id, consumed) = decode_prefix(&bytes, directory, true)?;
    reject_trailing(id, consumed, bytes.len())
}

// ── Field accessors without full decode ─────────────────────────────────────
//
// These read only the fixed-size header prefix (never the partition or
// uuid bytes) directly out of the base64url/hex string, so callers can
// route on version/encryption/account without resolving partitions.

/// Read only `version` out of `id_string`.
pub fn version_of(id_string: &str) -> Result<u16, BlobIdError> {
    let bytes = decode_string_bytes(id_string)?;
    let mut cursor = Cursor::new(bytes.as_slice());
    cursor
        .read_u16::<BigEndian>()
        .map_err(|_| BlobIdError::TruncatedInput)
}

/// `false` for V1/V2/V3; for V4/V5, the flags-byte encrypted bit.
pub fn is_encrypted(id_string: &str) -> Result<bool, BlobIdError> {
    let bytes = decode_string_bytes(id_string)?;
    let mut cursor = Cursor::new(bytes.as_slice());
    let header = read_header(&mut cursor)?;
    Ok(header.is_encrypted)
}

/// `false` below V3; otherwise the flags-byte crafted bit.
pub fn is_crafted(id_string: &str) -> Result<bool, BlobIdError> {
    let bytes = decode_string_bytes(id_string)?;
    let mut cursor = Cursor::new(bytes.as_slice());
    let header = read_header(&mut cursor)?;
    Ok(header.id_type == BlobIdType::Crafted)
}

/// Sentinel `(UNKNOWN_ACCOUNT, UNKNOWN_CONTAINER)` for V1; real fields
/// otherwise.
pub fn account_and_container(id_string: &str) -> Result<(i16, i16), BlobIdError> {
    let bytes = decode_string_bytes(id_string)?;
    let mut cursor = Cursor::new(bytes.as_slice());
    let header = read_header(&mut cursor)?;
    Ok((header.account_id, header.container_id))
}

// ── Crafting ─────────────────────────────────────────────────────────────────

/// Derive a new identifier at `target_version` with `type = CRAFTED`, the
/// supplied account/container, and every other field copied from `input`.
///
/// Fails with [`BlobIdError::InvalidCraftTarget`] if `target_version < 3`
/// Crafting is idempotent: crafting an already-crafted
/// identifier with the same target/account/container reproduces a
/// byte-identical result, since all copied fields are unchanged by the
/// first craft.
pub fn craft(
    input: &BlobIdentifier,
    target_version: Version,
    new_account: i16,
    new_container: i16,
) -> Result<BlobIdentifier, BlobIdError> {
    if target_version.as_u16() < 3 {
        return Err(BlobIdError::InvalidCraftTarget(target_version.as_u16()));
    }

    Ok(BlobIdentifier::from_parts(
        target_version,
        BlobIdType::Crafted,
        input.datacenter_id(),
        new_account,
        new_container,
        input.partition().box_clone(),
        input.is_encrypted(),
        input.data_type(),
        input.uuid().to_string(),
    ))
}
