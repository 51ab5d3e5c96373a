//! The records a Kafka Group Coordinator writes to `__consumer_offsets`.
//!
//! `__consumer_offsets` is a compacted internal topic: the group coordinator persists there
//! the state of every group it manages (members, subscriptions, assignments, epochs and
//! committed offsets), and replays it when it takes over the coordination of a group.
//!
//! This crate turns in-memory snapshots of that state into [`CoordinatorRecord`]s:
//!
//! * [`record_helpers`] has one function per entity and transition, producing either an
//!   upsert (key and value) or a tombstone (key only) for the entity.
//! * [`versioning`] decides the schema version of each value, from the [`MetadataVersion`]
//!   the cluster runs at.
//! * [`canonical`] orders every collection, so that the same state always produces the
//!   same bytes.
//! * [`CoordinatorRecord::to_bytes`] and [`CoordinatorRecord::try_from_bytes`] convert
//!   records to and from the key and value of a log entry.
//!
//! The crate decides neither membership nor assignment: it is handed the outcome of those
//! decisions, and only persists it. It performs no I/O.
//!
//! ```
//! use coordinator_records::{record_helpers, CoordinatorRecord};
//!
//! let record = record_helpers::new_group_epoch_record("my-group", 10);
//! let (key, value) = record.to_bytes().unwrap();
//!
//! let decoded = CoordinatorRecord::try_from_bytes(Some(&key[..]), value.as_deref()).unwrap();
//! assert_eq!(decoded, record);
//! ```
//!
//! # Features
//!
//! * `serde`: derives `Serialize` and `Deserialize` for snapshots, messages and records.
//! * `ts_time`: adds [`time::OffsetDateTime`](https://docs.rs/time) accessors next to
//!   the [`chrono`] ones, for timestamp fields.

pub mod canonical;
mod classic_group;
mod consumer_group;
mod encoding;
mod errors;
mod group_metadata;
mod member;
mod metadata_version;
mod offset_and_metadata;
mod offset_commit;
mod record;
pub mod record_helpers;
mod topic_metadata;
mod utils;
pub mod versioning;

// Inner `mod` are private, so here we export the public types.
pub use classic_group::*;
pub use consumer_group::*;
pub use errors::*;
pub use group_metadata::*;
pub use member::*;
pub use metadata_version::*;
pub use offset_and_metadata::*;
pub use offset_commit::*;
pub use record::{ApiMessageAndVersion, CoordinatorRecord, RecordKey, RecordValue};
pub use topic_metadata::*;
pub use versioning::RecordType;
