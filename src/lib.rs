//! # blobid-core, versioned blob identifier codec and resource health policy
//!
//! Two independent collaborators extracted from a blob-storage cluster map:
//!
//! - [`blob_id`]: encode/decode/craft a self-describing, versioned blob
//!   identifier, delegating partition resolution to a caller-supplied
//!   [`partition::PartitionDirectory`].
//! - [`health`]: a fixed-backoff failure detector used to mark data nodes
//!   and disks down when errors cluster, and reopen them after a backoff.
//!
//! [`signed_id`] is a small, explicitly non-cryptographic envelope used by
//! callers that need to carry a blob identifier alongside side metadata.

pub mod blob_id;
pub mod clock;
pub mod health;
pub mod partition;
pub mod signed_id;

pub use blob_id::{
    BlobDataType, BlobIdError, BlobIdType, BlobIdentifier, Version, UNKNOWN_ACCOUNT,
    UNKNOWN_CONTAINER, UNKNOWN_DC,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use health::{DataNodeHealth, DiskHealth, HealthPolicy, HealthPolicyConfig, ResourceAvailability};
pub use partition::{
    InMemoryPartitionDirectory, OpaquePartitionId, PartitionDirectory, PartitionError, PartitionId,
};
pub use signed_id::{SignedIdError, SignedIdPayload};
