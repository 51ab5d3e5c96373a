use bytes::{BufMut, Bytes, BytesMut};
use bytes_parser::BytesParser;

use crate::consumer_group::{
    ConsumerGroupCurrentMemberAssignmentValue, ConsumerGroupKey, ConsumerGroupMemberKey,
    ConsumerGroupMemberMetadataValue, ConsumerGroupMetadataValue, ConsumerGroupPartitionMetadataValue,
    ConsumerGroupTargetAssignmentMemberValue, ConsumerGroupTargetAssignmentMetadataValue,
};
use crate::errors::CoordinatorRecordError;
use crate::group_metadata::{GroupMetadataKey, GroupMetadataValue};
use crate::offset_commit::{OffsetCommitKey, OffsetCommitValue};
use crate::utils::parse_i16;
use crate::versioning::RecordType;

/// A schema that can be written to, and read from, the bytes of a record.
///
/// The version is not part of the message: it is written in front of it, by the
/// record, and handed back to [`Message::read`] to pick the fields to read.
pub(crate) trait Message: Sized {
    /// Name of the schema, as it appears in errors and logs.
    const NAME: &'static str;

    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError>;

    fn read(parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError>;
}

/// A message, paired with the schema version it is (or will be) written with.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApiMessageAndVersion<M> {
    pub message: M,
    pub version: i16,
}

impl<M> ApiMessageAndVersion<M> {
    pub fn new(message: M, version: i16) -> Self {
        Self { message, version }
    }
}

/// Key of a record: identifies the compaction slot of one logical entity.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordKey {
    OffsetCommit(OffsetCommitKey),
    GroupMetadata(GroupMetadataKey),
    ConsumerGroupMetadata(ConsumerGroupKey),
    ConsumerGroupPartitionMetadata(ConsumerGroupKey),
    ConsumerGroupMemberMetadata(ConsumerGroupMemberKey),
    ConsumerGroupTargetAssignmentMetadata(ConsumerGroupKey),
    ConsumerGroupTargetAssignmentMember(ConsumerGroupMemberKey),
    ConsumerGroupCurrentMemberAssignment(ConsumerGroupMemberKey),
}

impl RecordKey {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordKey::OffsetCommit(_) => RecordType::OffsetCommit,
            RecordKey::GroupMetadata(_) => RecordType::GroupMetadata,
            RecordKey::ConsumerGroupMetadata(_) => RecordType::ConsumerGroupMetadata,
            RecordKey::ConsumerGroupPartitionMetadata(_) => RecordType::ConsumerGroupPartitionMetadata,
            RecordKey::ConsumerGroupMemberMetadata(_) => RecordType::ConsumerGroupMemberMetadata,
            RecordKey::ConsumerGroupTargetAssignmentMetadata(_) => RecordType::ConsumerGroupTargetAssignmentMetadata,
            RecordKey::ConsumerGroupTargetAssignmentMember(_) => RecordType::ConsumerGroupTargetAssignmentMember,
            RecordKey::ConsumerGroupCurrentMemberAssignment(_) => RecordType::ConsumerGroupCurrentMemberAssignment,
        }
    }

    /// Identifier of the group the key belongs to.
    pub fn group_id(&self) -> &str {
        match self {
            RecordKey::OffsetCommit(k) => &k.group,
            RecordKey::GroupMetadata(k) => &k.group,
            RecordKey::ConsumerGroupMetadata(k)
            | RecordKey::ConsumerGroupPartitionMetadata(k)
            | RecordKey::ConsumerGroupTargetAssignmentMetadata(k) => &k.group_id,
            RecordKey::ConsumerGroupMemberMetadata(k)
            | RecordKey::ConsumerGroupTargetAssignmentMember(k)
            | RecordKey::ConsumerGroupCurrentMemberAssignment(k) => &k.group_id,
        }
    }

    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError> {
        match self {
            RecordKey::OffsetCommit(k) => k.write(buf, version),
            RecordKey::GroupMetadata(k) => k.write(buf, version),
            RecordKey::ConsumerGroupMetadata(k)
            | RecordKey::ConsumerGroupPartitionMetadata(k)
            | RecordKey::ConsumerGroupTargetAssignmentMetadata(k) => k.write(buf, version),
            RecordKey::ConsumerGroupMemberMetadata(k)
            | RecordKey::ConsumerGroupTargetAssignmentMember(k)
            | RecordKey::ConsumerGroupCurrentMemberAssignment(k) => k.write(buf, version),
        }
    }

    fn read(record_type: RecordType, parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(match record_type {
            RecordType::OffsetCommit => RecordKey::OffsetCommit(OffsetCommitKey::read(parser, version)?),
            RecordType::GroupMetadata => RecordKey::GroupMetadata(GroupMetadataKey::read(parser, version)?),
            RecordType::ConsumerGroupMetadata => {
                RecordKey::ConsumerGroupMetadata(ConsumerGroupKey::read(parser, version)?)
            },
            RecordType::ConsumerGroupPartitionMetadata => {
                RecordKey::ConsumerGroupPartitionMetadata(ConsumerGroupKey::read(parser, version)?)
            },
            RecordType::ConsumerGroupMemberMetadata => {
                RecordKey::ConsumerGroupMemberMetadata(ConsumerGroupMemberKey::read(parser, version)?)
            },
            RecordType::ConsumerGroupTargetAssignmentMetadata => {
                RecordKey::ConsumerGroupTargetAssignmentMetadata(ConsumerGroupKey::read(parser, version)?)
            },
            RecordType::ConsumerGroupTargetAssignmentMember => {
                RecordKey::ConsumerGroupTargetAssignmentMember(ConsumerGroupMemberKey::read(parser, version)?)
            },
            RecordType::ConsumerGroupCurrentMemberAssignment => {
                RecordKey::ConsumerGroupCurrentMemberAssignment(ConsumerGroupMemberKey::read(parser, version)?)
            },
        })
    }
}

/// Value of a record; absent for tombstones.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordValue {
    OffsetCommit(OffsetCommitValue),
    GroupMetadata(GroupMetadataValue),
    ConsumerGroupMetadata(ConsumerGroupMetadataValue),
    ConsumerGroupPartitionMetadata(ConsumerGroupPartitionMetadataValue),
    ConsumerGroupMemberMetadata(ConsumerGroupMemberMetadataValue),
    ConsumerGroupTargetAssignmentMetadata(ConsumerGroupTargetAssignmentMetadataValue),
    ConsumerGroupTargetAssignmentMember(ConsumerGroupTargetAssignmentMemberValue),
    ConsumerGroupCurrentMemberAssignment(ConsumerGroupCurrentMemberAssignmentValue),
}

impl RecordValue {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordValue::OffsetCommit(_) => RecordType::OffsetCommit,
            RecordValue::GroupMetadata(_) => RecordType::GroupMetadata,
            RecordValue::ConsumerGroupMetadata(_) => RecordType::ConsumerGroupMetadata,
            RecordValue::ConsumerGroupPartitionMetadata(_) => RecordType::ConsumerGroupPartitionMetadata,
            RecordValue::ConsumerGroupMemberMetadata(_) => RecordType::ConsumerGroupMemberMetadata,
            RecordValue::ConsumerGroupTargetAssignmentMetadata(_) => RecordType::ConsumerGroupTargetAssignmentMetadata,
            RecordValue::ConsumerGroupTargetAssignmentMember(_) => RecordType::ConsumerGroupTargetAssignmentMember,
            RecordValue::ConsumerGroupCurrentMemberAssignment(_) => RecordType::ConsumerGroupCurrentMemberAssignment,
        }
    }

    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError> {
        match self {
            RecordValue::OffsetCommit(v) => v.write(buf, version),
            RecordValue::GroupMetadata(v) => v.write(buf, version),
            RecordValue::ConsumerGroupMetadata(v) => v.write(buf, version),
            RecordValue::ConsumerGroupPartitionMetadata(v) => v.write(buf, version),
            RecordValue::ConsumerGroupMemberMetadata(v) => v.write(buf, version),
            RecordValue::ConsumerGroupTargetAssignmentMetadata(v) => v.write(buf, version),
            RecordValue::ConsumerGroupTargetAssignmentMember(v) => v.write(buf, version),
            RecordValue::ConsumerGroupCurrentMemberAssignment(v) => v.write(buf, version),
        }
    }

    fn read(record_type: RecordType, parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(match record_type {
            RecordType::OffsetCommit => RecordValue::OffsetCommit(OffsetCommitValue::read(parser, version)?),
            RecordType::GroupMetadata => RecordValue::GroupMetadata(GroupMetadataValue::read(parser, version)?),
            RecordType::ConsumerGroupMetadata => {
                RecordValue::ConsumerGroupMetadata(ConsumerGroupMetadataValue::read(parser, version)?)
            },
            RecordType::ConsumerGroupPartitionMetadata => {
                RecordValue::ConsumerGroupPartitionMetadata(ConsumerGroupPartitionMetadataValue::read(parser, version)?)
            },
            RecordType::ConsumerGroupMemberMetadata => {
                RecordValue::ConsumerGroupMemberMetadata(ConsumerGroupMemberMetadataValue::read(parser, version)?)
            },
            RecordType::ConsumerGroupTargetAssignmentMetadata => RecordValue::ConsumerGroupTargetAssignmentMetadata(
                ConsumerGroupTargetAssignmentMetadataValue::read(parser, version)?,
            ),
            RecordType::ConsumerGroupTargetAssignmentMember => RecordValue::ConsumerGroupTargetAssignmentMember(
                ConsumerGroupTargetAssignmentMemberValue::read(parser, version)?,
            ),
            RecordType::ConsumerGroupCurrentMemberAssignment => RecordValue::ConsumerGroupCurrentMemberAssignment(
                ConsumerGroupCurrentMemberAssignmentValue::read(parser, version)?,
            ),
        })
    }
}

/// A record of the `__consumer_offsets` log, as written by the group coordinator.
///
/// A record without value is a tombstone: once compaction runs, the entity its key
/// identifies is gone from the log.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorRecord {
    pub key: ApiMessageAndVersion<RecordKey>,
    pub value: Option<ApiMessageAndVersion<RecordValue>>,
}

impl CoordinatorRecord {
    pub fn new(key: ApiMessageAndVersion<RecordKey>, value: ApiMessageAndVersion<RecordValue>) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    pub fn tombstone(key: ApiMessageAndVersion<RecordKey>) -> Self {
        Self { key, value: None }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    pub fn record_type(&self) -> RecordType {
        self.key.message.record_type()
    }

    /// Serializes the record into the key and (unless a tombstone) value of a log entry.
    ///
    /// Both start with the `i16` schema version, followed by the fields of the message.
    ///
    /// # Errors
    ///
    /// * [`CoordinatorRecordError::UnsupportedKeyVersion`] if the key version does not
    ///   identify the type of the key.
    /// * [`CoordinatorRecordError::UnsupportedValueVersion`] if the value version is not
    ///   one of [`RecordType::supported_value_versions`].
    /// * [`CoordinatorRecordError::MismatchedValue`] if the value is of a different type
    ///   than the key.
    /// * [`CoordinatorRecordError::InvalidLength`] if a string, bytes or array field is too
    ///   long for the length prefix of its schema.
    pub fn to_bytes(&self) -> Result<(Bytes, Option<Bytes>), CoordinatorRecordError> {
        let record_type = self.record_type();

        if RecordType::from_key_version(self.key.version) != Some(record_type) {
            return Err(CoordinatorRecordError::UnsupportedKeyVersion(self.key.version));
        }
        let mut key_buf = BytesMut::new();
        key_buf.put_i16(self.key.version);
        self.key.message.write(&mut key_buf, self.key.version)?;

        let value_bytes = match &self.value {
            None => None,
            Some(value) => {
                if value.message.record_type() != record_type {
                    return Err(CoordinatorRecordError::MismatchedValue {
                        key: record_type.value_name(),
                        value: value.message.record_type().value_name(),
                    });
                }
                check_value_version(record_type, value.version)?;

                let mut value_buf = BytesMut::new();
                value_buf.put_i16(value.version);
                value.message.write(&mut value_buf, value.version)?;
                Some(value_buf.freeze())
            },
        };

        Ok((key_buf.freeze(), value_bytes))
    }

    /// Parses the key and value of an entry of the `__consumer_offsets` log.
    ///
    /// **NOTE:** As Kafka messages have key and value both optional, the signature
    /// reflects that. But records of `__consumer_offsets` always have a key: if absent,
    /// the method returns an error. An absent value is a tombstone.
    ///
    /// # Arguments
    ///
    /// * `key` - An [`Option`] of `&[u8]`: when set, it means the source Kafka message has a key.
    /// * `value` - An [`Option`] of `&[u8]`: when set, it means the source Kafka message has
    ///     a value. If `value` is `None`, the source Kafka message is a tombstone.
    pub fn try_from_bytes(key: Option<&[u8]>, value: Option<&[u8]>) -> Result<Self, CoordinatorRecordError> {
        let key_bytes = key.ok_or(CoordinatorRecordError::MessageKeyMissing)?;

        let mut key_parser = BytesParser::from(key_bytes);
        let key_version = parse_i16(&mut key_parser)?;
        let record_type =
            RecordType::from_key_version(key_version).ok_or(CoordinatorRecordError::UnsupportedKeyVersion(key_version))?;
        let key = ApiMessageAndVersion::new(RecordKey::read(record_type, &mut key_parser, key_version)?, key_version);

        let value = match value {
            None => None,
            Some(value_bytes) => {
                let mut value_parser = BytesParser::from(value_bytes);
                let value_version = parse_i16(&mut value_parser)?;
                check_value_version(record_type, value_version)?;
                Some(ApiMessageAndVersion::new(
                    RecordValue::read(record_type, &mut value_parser, value_version)?,
                    value_version,
                ))
            },
        };

        tracing::trace!(
            record_type = ?record_type,
            group_id = key.message.group_id(),
            key_version,
            tombstone = value.is_none(),
            "Decoded coordinator record"
        );

        Ok(Self { key, value })
    }

    /// Same as [`Self::try_from_bytes`], but handling input as [`Option<Vec<u8>>`].
    pub fn try_from_bytes_vec(key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Result<Self, CoordinatorRecordError> {
        Self::try_from_bytes(key.as_deref(), value.as_deref())
    }
}

fn check_value_version(record_type: RecordType, version: i16) -> Result<(), CoordinatorRecordError> {
    if record_type.supported_value_versions().contains(&version) {
        Ok(())
    } else {
        Err(CoordinatorRecordError::UnsupportedValueVersion {
            record: record_type.value_name(),
            version,
        })
    }
}
