//! `PartitionDirectory`, the cluster-map collaborator surface.
//!
//! The codec treats a partition identifier as an opaque, self-describing
//! byte blob: it reads exactly as many bytes as `read_partition` consumes
//! and never interprets their contents. Resolving those bytes into a real
//! partition (replica set, capacity, state) is the cluster map's job, not
//! the codec's, not the codec's own concern.

use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartitionError {
    /// The directory has no partition matching the bytes on the stream.
    #[error("partition not found in cluster map (prefix {prefix:02x?})")]
    UnknownPartition { prefix: Vec<u8> },
    /// Fewer bytes remained on the stream than the partition encoding needs.
    #[error("truncated partition identifier")]
    Truncated,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// An opaque, self-describing partition identifier.
///
/// The codec never inspects `bytes()` beyond re-serialising it; ordering
/// and equality of partitions are defined by the directory, not the codec.
pub trait PartitionId: std::fmt::Debug {
    /// The wire bytes previously produced by `write_partition`.
    fn bytes(&self) -> &[u8];

    fn box_clone(&self) -> Box<dyn PartitionId>;
}

impl Clone for Box<dyn PartitionId> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl fmt::Debug for dyn PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionId({:02x?})", self.bytes())
    }
}

impl PartialEq for dyn PartitionId {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

/// Resolves partition identifiers embedded in blob-identifier wire bytes.
///
/// Implementations live with the cluster map; the codec only depends on
/// this trait.
pub trait PartitionDirectory {
    /// Consume a variable number of bytes from `stream` and resolve them to
    /// a partition. Must consume exactly the bytes a matching
    /// `write_partition` call produced, no more, no less.
    fn read_partition(&self, stream: &mut dyn Read) -> Result<Box<dyn PartitionId>, PartitionError>;

    /// Serialise a partition to its self-describing wire form.
    fn write_partition(&self, partition: &dyn PartitionId, out: &mut dyn Write) -> io::Result<()>;
}

// ── In-memory reference implementation ──────────────────────────────────────

/// A trivial opaque partition: a fixed-length byte string, length-prefixed
/// on the wire so the directory can re-read it without guessing a width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaquePartitionId(pub Vec<u8>);

impl PartitionId for OpaquePartitionId {
    fn bytes(&self) -> &[u8] {
        &self.0
    }

    fn box_clone(&self) -> Box<dyn PartitionId> {
        Box::new(self.clone())
    }
}

impl OpaquePartitionId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

/// In-memory partition directory used for tests, the CLI, and as a
/// reference wiring of the `PartitionDirectory` trait, not a real cluster
/// map. Wire form is `[len: u32 LE][bytes...]`; any length and byte
/// sequence round-trips, and "unknown" membership is enforced by an
/// explicit allow-list so `UnknownPartition` is reachable in tests.
#[derive(Debug, Default)]
pub struct InMemoryPartitionDirectory {
    known: std::collections::HashSet<Vec<u8>>,
}

impl InMemoryPartitionDirectory {
    pub fn new() -> Self {
        Self { known: std::collections::HashSet::new() }
    }

    /// Directory that accepts any partition bytes it is asked to read ,
    /// convenient default for codec round-trip tests that don't care about
    /// cluster-map membership.
    pub fn permissive() -> Self {
        Self::new()
    }

    pub fn register(&mut self, partition: &OpaquePartitionId) {
        self.known.insert(partition.0.clone());
    }
}

impl PartitionDirectory for InMemoryPartitionDirectory {
    fn read_partition(&self, stream: &mut dyn Read) -> Result<Box<dyn PartitionId>, PartitionError> {
        use byteorder::{LittleEndian, ReadBytesExt};

        let len = stream.read_u32::<LittleEndian>().map_err(|_| PartitionError::Truncated)?;
        let mut buf = vec![0u8; len as usize];
        stream.read_exact(&mut buf).map_err(|_| PartitionError::Truncated)?;

        if !self.known.is_empty() && !self.known.contains(&buf) {
            return Err(PartitionError::UnknownPartition { prefix: buf });
        }

        Ok(Box::new(OpaquePartitionId(buf)))
    }

    fn write_partition(&self, partition: &dyn PartitionId, out: &mut dyn Write) -> io::Result<()> {
        use byteorder::{LittleEndian, WriteBytesExt};

        let bytes = partition.bytes();
        out.write_u32::<LittleEndian>(bytes.len() as u32)?;
        out.write_all(bytes)
    }
}
