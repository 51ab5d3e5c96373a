//! Which schema version each record is written with.
//!
//! Record keys carry a fixed version that doubles as the record type discriminator:
//! readers look at the first 2 bytes of a key to know what they are looking at.
//!
//! Record values of the classic group protocol (and offset commits) evolved together
//! with the cluster protocol: a value must be written with a schema version that every
//! broker of the cluster can read, so it is a function of the negotiated
//! [`MetadataVersion`]. The consumer group (next generation) protocol versions its
//! records on its own, and all of them are currently written at version `0`.
//!
//! Every schema decision lives in the tables of this module: callers never branch on
//! versions themselves.

use std::ops::RangeInclusive;

use crate::metadata_version::MetadataVersion;
use crate::metadata_version::MetadataVersion::*;

/// Types of record written to `__consumer_offsets` by the group coordinator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordType {
    /// Committed offset of a group for a topic partition.
    OffsetCommit,
    /// Classic group state: generation, protocol, leader and members.
    GroupMetadata,
    /// Group epoch of a consumer group.
    ConsumerGroupMetadata,
    /// Metadata of the topics the members of a consumer group subscribe to.
    ConsumerGroupPartitionMetadata,
    /// Subscription of a consumer group member.
    ConsumerGroupMemberMetadata,
    /// Epoch of the target assignment of a consumer group.
    ConsumerGroupTargetAssignmentMetadata,
    /// Target assignment of a consumer group member.
    ConsumerGroupTargetAssignmentMember,
    /// Current assignment (and reconciliation state) of a consumer group member.
    ConsumerGroupCurrentMemberAssignment,
}

impl RecordType {
    /// Every record type.
    pub const VALUES: [RecordType; 8] = [
        RecordType::OffsetCommit,
        RecordType::GroupMetadata,
        RecordType::ConsumerGroupMetadata,
        RecordType::ConsumerGroupPartitionMetadata,
        RecordType::ConsumerGroupMemberMetadata,
        RecordType::ConsumerGroupTargetAssignmentMetadata,
        RecordType::ConsumerGroupTargetAssignmentMember,
        RecordType::ConsumerGroupCurrentMemberAssignment,
    ];

    /// Version written in the key of records of this type.
    pub const fn key_version(&self) -> i16 {
        match self {
            RecordType::OffsetCommit => 1,
            RecordType::GroupMetadata => 2,
            RecordType::ConsumerGroupMetadata => 3,
            RecordType::ConsumerGroupPartitionMetadata => 4,
            RecordType::ConsumerGroupMemberMetadata => 5,
            RecordType::ConsumerGroupTargetAssignmentMetadata => 6,
            RecordType::ConsumerGroupTargetAssignmentMember => 7,
            RecordType::ConsumerGroupCurrentMemberAssignment => 8,
        }
    }

    /// Record type identified by the version found at the start of a key.
    ///
    /// Offset commit keys were written at version `0` by the oldest brokers.
    pub const fn from_key_version(key_version: i16) -> Option<RecordType> {
        match key_version {
            0 | 1 => Some(RecordType::OffsetCommit),
            2 => Some(RecordType::GroupMetadata),
            3 => Some(RecordType::ConsumerGroupMetadata),
            4 => Some(RecordType::ConsumerGroupPartitionMetadata),
            5 => Some(RecordType::ConsumerGroupMemberMetadata),
            6 => Some(RecordType::ConsumerGroupTargetAssignmentMetadata),
            7 => Some(RecordType::ConsumerGroupTargetAssignmentMember),
            8 => Some(RecordType::ConsumerGroupCurrentMemberAssignment),
            _ => None,
        }
    }

    /// Name of the value schema of this record type.
    pub const fn value_name(&self) -> &'static str {
        match self {
            RecordType::OffsetCommit => "OffsetCommitValue",
            RecordType::GroupMetadata => "GroupMetadataValue",
            RecordType::ConsumerGroupMetadata => "ConsumerGroupMetadataValue",
            RecordType::ConsumerGroupPartitionMetadata => "ConsumerGroupPartitionMetadataValue",
            RecordType::ConsumerGroupMemberMetadata => "ConsumerGroupMemberMetadataValue",
            RecordType::ConsumerGroupTargetAssignmentMetadata => "ConsumerGroupTargetAssignmentMetadataValue",
            RecordType::ConsumerGroupTargetAssignmentMember => "ConsumerGroupTargetAssignmentMemberValue",
            RecordType::ConsumerGroupCurrentMemberAssignment => "ConsumerGroupCurrentMemberAssignmentValue",
        }
    }

    /// Value schema versions this crate knows how to write and read.
    pub fn supported_value_versions(&self) -> RangeInclusive<i16> {
        match self {
            RecordType::OffsetCommit => 0..=3,
            RecordType::GroupMetadata => 0..=3,
            RecordType::ConsumerGroupMetadata
            | RecordType::ConsumerGroupPartitionMetadata
            | RecordType::ConsumerGroupMemberMetadata
            | RecordType::ConsumerGroupTargetAssignmentMetadata
            | RecordType::ConsumerGroupTargetAssignmentMember
            | RecordType::ConsumerGroupCurrentMemberAssignment => CONSUMER_GROUP_VALUE_VERSION..=CONSUMER_GROUP_VALUE_VERSION,
        }
    }

    /// Value schema version that records of this type are written with, on a cluster
    /// running at `metadata_version`.
    ///
    /// Overrides that depend on the content of a specific record are applied on top of
    /// this by [`offset_commit_value_version`].
    pub fn value_version(&self, metadata_version: MetadataVersion) -> i16 {
        match self {
            RecordType::OffsetCommit => lookup(OFFSET_COMMIT_VALUE_VERSIONS, metadata_version),
            RecordType::GroupMetadata => lookup(GROUP_METADATA_VALUE_VERSIONS, metadata_version),
            RecordType::ConsumerGroupMetadata
            | RecordType::ConsumerGroupPartitionMetadata
            | RecordType::ConsumerGroupMemberMetadata
            | RecordType::ConsumerGroupTargetAssignmentMetadata
            | RecordType::ConsumerGroupTargetAssignmentMember
            | RecordType::ConsumerGroupCurrentMemberAssignment => CONSUMER_GROUP_VALUE_VERSION,
        }
    }
}

/// Value version of every consumer group (next generation protocol) record.
pub const CONSUMER_GROUP_VALUE_VERSION: i16 = 0;

/// The only offset commit value version that carries an expire timestamp.
pub const OFFSET_COMMIT_VALUE_VERSION_WITH_EXPIRE_TIMESTAMP: i16 = 1;

/// Inclusive range of cluster versions sharing a value schema version.
struct VersionRange {
    from: MetadataVersion,
    to: MetadataVersion,
    value_version: i16,
}

impl VersionRange {
    const fn new(from: MetadataVersion, to: MetadataVersion, value_version: i16) -> Self {
        Self {
            from,
            to,
            value_version,
        }
    }

    fn contains(&self, metadata_version: MetadataVersion) -> bool {
        self.from <= metadata_version && metadata_version <= self.to
    }
}

const GROUP_METADATA_VALUE_VERSIONS: &[VersionRange] = &[
    VersionRange::new(IBP_0_8_0, IBP_0_10_0_IV1, 0),
    VersionRange::new(IBP_0_10_1_IV0, IBP_2_0_IV1, 1),
    VersionRange::new(IBP_2_1_IV0, IBP_2_2_IV1, 2),
    VersionRange::new(IBP_2_3_IV0, MetadataVersion::LATEST, 3),
];

const OFFSET_COMMIT_VALUE_VERSIONS: &[VersionRange] = &[
    VersionRange::new(IBP_0_8_0, IBP_2_0_IV1, 1),
    VersionRange::new(IBP_2_1_IV0, IBP_2_1_IV0, 2),
    VersionRange::new(IBP_2_1_IV1, MetadataVersion::LATEST, 3),
];

fn lookup(table: &[VersionRange], metadata_version: MetadataVersion) -> i16 {
    table
        .iter()
        .find(|range| range.contains(metadata_version))
        .or_else(|| table.last())
        .map_or(0, |range| range.value_version)
}

/// Value version of the classic [`GroupMetadataValue`](crate::GroupMetadataValue).
pub fn group_metadata_value_version(metadata_version: MetadataVersion) -> i16 {
    RecordType::GroupMetadata.value_version(metadata_version)
}

/// Value version of an [`OffsetCommitValue`](crate::OffsetCommitValue).
///
/// An explicit expire timestamp can only be represented by version `1`: when one is
/// present, that version is selected whatever the cluster version.
pub fn offset_commit_value_version(metadata_version: MetadataVersion, has_expire_timestamp: bool) -> i16 {
    if has_expire_timestamp {
        OFFSET_COMMIT_VALUE_VERSION_WITH_EXPIRE_TIMESTAMP
    } else {
        RecordType::OffsetCommit.value_version(metadata_version)
    }
}
