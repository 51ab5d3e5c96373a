//! Records of the consumer group (next generation) protocol.
//!
//! Keys use the legacy layout, like every other key on `__consumer_offsets`.
//! Values are all flexible from version `0`: compact encodings, and a tagged fields
//! section closing every struct.

use bytes::{BufMut, BytesMut};
use bytes_parser::BytesParser;
use uuid::Uuid;

use crate::encoding::{
    put_compact_array, put_compact_bytes, put_compact_nullable_str, put_compact_str, put_empty_tagged_fields,
    put_str, put_tagged_fields, put_uuid,
};
use crate::errors::CoordinatorRecordError;
use crate::member::MemberState;
use crate::record::Message;
use crate::utils::{
    parse_compact_array, parse_compact_bytes, parse_compact_nullable_str, parse_compact_str, parse_i32, parse_i8,
    parse_str, parse_tagged_fields, parse_uuid, skip_tagged_fields,
};

/// Tag of [`ConsumerGroupMemberMetadataValue::classic_member_metadata`].
const CLASSIC_MEMBER_METADATA_TAG: u32 = 0;

/// Key of the records describing a consumer group as a whole.
///
/// Used by [`ConsumerGroupMetadataValue`], [`ConsumerGroupPartitionMetadataValue`] and
/// [`ConsumerGroupTargetAssignmentMetadataValue`]: the key version tells them apart.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupKey {
    pub group_id: String,
}

impl Message for ConsumerGroupKey {
    const NAME: &'static str = "ConsumerGroupKey";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.group_id)
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(Self {
            group_id: parse_str(parser)?,
        })
    }
}

/// Key of the records describing one member of a consumer group.
///
/// Used by [`ConsumerGroupMemberMetadataValue`], [`ConsumerGroupTargetAssignmentMemberValue`]
/// and [`ConsumerGroupCurrentMemberAssignmentValue`].
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupMemberKey {
    pub group_id: String,
    pub member_id: String,
}

impl Message for ConsumerGroupMemberKey {
    const NAME: &'static str = "ConsumerGroupMemberKey";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.group_id)?;
        put_str(buf, &self.member_id)
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(Self {
            group_id: parse_str(parser)?,
            member_id: parse_str(parser)?,
        })
    }
}

/// Epoch of a consumer group.
///
/// Bumped every time the group membership or the subscriptions change.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupMetadataValue {
    pub epoch: i32,
}

impl Message for ConsumerGroupMetadataValue {
    const NAME: &'static str = "ConsumerGroupMetadataValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        buf.put_i32(self.epoch);
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let value = Self {
            epoch: parse_i32(parser)?,
        };
        skip_tagged_fields(parser, Self::NAME)?;

        Ok(value)
    }
}

/// Metadata of the topics the members of a consumer group are subscribed to.
///
/// The assignor works off this snapshot: a change of it (e.g. partitions added to a topic)
/// triggers a new target assignment.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupPartitionMetadataValue {
    /// Subscribed topics, ordered by topic identifier.
    pub topics: Vec<SubscribedTopicMetadata>,
}

/// One topic of [`ConsumerGroupPartitionMetadataValue`].
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubscribedTopicMetadata {
    pub topic_id: Uuid,
    pub topic_name: String,

    /// Partition count of the topic.
    ///
    /// This is authoritative even when [`Self::partition_metadata`] is empty, which only
    /// means no rack placement is known.
    pub num_partitions: i32,

    /// Racks hosting the replicas of each partition, ordered by partition.
    pub partition_metadata: Vec<PartitionMetadata>,
}

/// Racks hosting the replicas of one partition.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionMetadata {
    pub partition: i32,
    pub racks: Vec<String>,
}

impl Message for ConsumerGroupPartitionMetadataValue {
    const NAME: &'static str = "ConsumerGroupPartitionMetadataValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_compact_array(buf, &self.topics, |buf, topic| {
            put_uuid(buf, &topic.topic_id);
            put_compact_str(buf, &topic.topic_name)?;
            buf.put_i32(topic.num_partitions);
            put_compact_array(buf, &topic.partition_metadata, |buf, partition| {
                buf.put_i32(partition.partition);
                put_compact_array(buf, &partition.racks, |buf, rack| put_compact_str(buf, rack))?;
                put_empty_tagged_fields(buf);
                Ok(())
            })?;
            put_empty_tagged_fields(buf);
            Ok(())
        })?;
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let topics = parse_compact_array(parser, |parser| {
            let topic = SubscribedTopicMetadata {
                topic_id: parse_uuid(parser)?,
                topic_name: parse_compact_str(parser)?,
                num_partitions: parse_i32(parser)?,
                partition_metadata: parse_compact_array(parser, |parser| {
                    let partition = PartitionMetadata {
                        partition: parse_i32(parser)?,
                        racks: parse_compact_array(parser, parse_compact_str)?,
                    };
                    skip_tagged_fields(parser, "PartitionMetadata")?;
                    Ok(partition)
                })?,
            };
            skip_tagged_fields(parser, "TopicMetadata")?;
            Ok(topic)
        })?;
        skip_tagged_fields(parser, Self::NAME)?;

        Ok(Self { topics })
    }
}

/// Subscription of a consumer group member, and the client it runs in.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupMemberMetadataValue {
    /// Static membership identifier (`group.instance.id`), if any.
    pub instance_id: Option<String>,
    pub rack_id: Option<String>,
    pub client_id: String,
    pub client_host: String,

    /// Subscribed topic names, sorted.
    pub subscribed_topic_names: Vec<String>,
    pub subscribed_topic_regex: Option<String>,

    /// Server side assignor requested by the member, if any.
    pub server_assignor: Option<String>,
    pub rebalance_timeout_ms: i32,

    /// Protocols of a member that joined through the classic protocol.
    ///
    /// Written as a tagged field: absent for members that never used the classic protocol.
    pub classic_member_metadata: Option<ClassicMemberMetadata>,
}

impl Default for ConsumerGroupMemberMetadataValue {
    fn default() -> Self {
        Self {
            instance_id: None,
            rack_id: None,
            client_id: String::default(),
            client_host: String::default(),
            subscribed_topic_names: Vec::new(),
            subscribed_topic_regex: None,
            server_assignor: None,
            rebalance_timeout_ms: -1,
            classic_member_metadata: None,
        }
    }
}

/// Classic protocol metadata of a consumer group member.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassicMemberMetadata {
    pub supported_protocols: Vec<ClassicProtocol>,
}

/// A protocol (e.g. a partition assignor) supported by a classic member, with its metadata.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassicProtocol {
    pub name: String,
    pub metadata: Vec<u8>,
}

impl ClassicMemberMetadata {
    fn write<B: BufMut>(&self, buf: &mut B) -> Result<(), CoordinatorRecordError> {
        put_compact_array(buf, &self.supported_protocols, |buf, protocol| {
            put_compact_str(buf, &protocol.name)?;
            put_compact_bytes(buf, &protocol.metadata)?;
            put_empty_tagged_fields(buf);
            Ok(())
        })?;
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser) -> Result<Self, CoordinatorRecordError> {
        let supported_protocols = parse_compact_array(parser, |parser| {
            let protocol = ClassicProtocol {
                name: parse_compact_str(parser)?,
                metadata: parse_compact_bytes(parser)?,
            };
            skip_tagged_fields(parser, "ClassicProtocol")?;
            Ok(protocol)
        })?;
        skip_tagged_fields(parser, "ClassicMemberMetadata")?;

        Ok(Self { supported_protocols })
    }
}

impl Message for ConsumerGroupMemberMetadataValue {
    const NAME: &'static str = "ConsumerGroupMemberMetadataValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_compact_nullable_str(buf, self.instance_id.as_deref())?;
        put_compact_nullable_str(buf, self.rack_id.as_deref())?;
        put_compact_str(buf, &self.client_id)?;
        put_compact_str(buf, &self.client_host)?;
        put_compact_array(buf, &self.subscribed_topic_names, |buf, name| put_compact_str(buf, name))?;
        put_compact_nullable_str(buf, self.subscribed_topic_regex.as_deref())?;
        put_compact_nullable_str(buf, self.server_assignor.as_deref())?;
        buf.put_i32(self.rebalance_timeout_ms);

        match &self.classic_member_metadata {
            None => {
                put_empty_tagged_fields(buf);
                Ok(())
            },
            Some(classic) => {
                let mut tagged = BytesMut::new();
                classic.write(&mut tagged)?;
                put_tagged_fields(buf, &[(CLASSIC_MEMBER_METADATA_TAG, &tagged[..])])
            },
        }
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let mut value = Self {
            instance_id: parse_compact_nullable_str(parser)?,
            rack_id: parse_compact_nullable_str(parser)?,
            client_id: parse_compact_str(parser)?,
            client_host: parse_compact_str(parser)?,
            subscribed_topic_names: parse_compact_array(parser, parse_compact_str)?,
            subscribed_topic_regex: parse_compact_nullable_str(parser)?,
            server_assignor: parse_compact_nullable_str(parser)?,
            rebalance_timeout_ms: parse_i32(parser)?,
            classic_member_metadata: None,
        };

        for (tag, payload) in parse_tagged_fields(parser)? {
            if tag == CLASSIC_MEMBER_METADATA_TAG {
                let mut classic_parser = BytesParser::from(payload.as_slice());
                value.classic_member_metadata = Some(ClassicMemberMetadata::read(&mut classic_parser)?);
            } else {
                tracing::debug!(tag, struct_name = Self::NAME, "Skipping unknown tagged field");
            }
        }

        Ok(value)
    }
}

/// Epoch of the target assignment of a consumer group.
///
/// The target assignment is fully written (one record per member) before this epoch is
/// bumped to match the group epoch.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupTargetAssignmentMetadataValue {
    pub assignment_epoch: i32,
}

impl Message for ConsumerGroupTargetAssignmentMetadataValue {
    const NAME: &'static str = "ConsumerGroupTargetAssignmentMetadataValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        buf.put_i32(self.assignment_epoch);
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let value = Self {
            assignment_epoch: parse_i32(parser)?,
        };
        skip_tagged_fields(parser, Self::NAME)?;

        Ok(value)
    }
}

/// Partitions of one topic.
///
/// Produced by [`canonical::topic_partitions`](crate::canonical::topic_partitions):
/// partitions are sorted.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicPartitions {
    pub topic_id: Uuid,
    pub partitions: Vec<i32>,
}

fn put_topic_partitions<B: BufMut>(buf: &mut B, topic_partitions: &[TopicPartitions]) -> Result<(), CoordinatorRecordError> {
    put_compact_array(buf, topic_partitions, |buf, tp| {
        put_uuid(buf, &tp.topic_id);
        put_compact_array(buf, &tp.partitions, |buf, partition| {
            buf.put_i32(*partition);
            Ok(())
        })?;
        put_empty_tagged_fields(buf);
        Ok(())
    })
}

fn parse_topic_partitions(parser: &mut BytesParser) -> Result<Vec<TopicPartitions>, CoordinatorRecordError> {
    parse_compact_array(parser, |parser| {
        let tp = TopicPartitions {
            topic_id: parse_uuid(parser)?,
            partitions: parse_compact_array(parser, parse_i32)?,
        };
        skip_tagged_fields(parser, "TopicPartitions")?;
        Ok(tp)
    })
}

/// Partitions the assignor decided a member should own.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupTargetAssignmentMemberValue {
    /// Target partitions, ordered by topic identifier.
    pub topic_partitions: Vec<TopicPartitions>,
}

impl Message for ConsumerGroupTargetAssignmentMemberValue {
    const NAME: &'static str = "ConsumerGroupTargetAssignmentMemberValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_topic_partitions(buf, &self.topic_partitions)?;
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let value = Self {
            topic_partitions: parse_topic_partitions(parser)?,
        };
        skip_tagged_fields(parser, Self::NAME)?;

        Ok(value)
    }
}

/// Where a member is in the reconciliation of its assignment.
///
/// The five fields are always written together: a reader must never see, say, the
/// epoch of a reconciliation step paired with the partitions of another.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupCurrentMemberAssignmentValue {
    pub member_epoch: i32,
    pub previous_member_epoch: i32,
    pub state: MemberState,

    /// Partitions owned by the member, ordered by topic identifier.
    pub assigned_partitions: Vec<TopicPartitions>,

    /// Partitions the member must give up before the group can move on, ordered by topic identifier.
    pub partitions_pending_revocation: Vec<TopicPartitions>,
}

impl Default for ConsumerGroupCurrentMemberAssignmentValue {
    fn default() -> Self {
        Self {
            member_epoch: 0,
            previous_member_epoch: 0,
            state: MemberState::Stable,
            assigned_partitions: Vec::new(),
            partitions_pending_revocation: Vec::new(),
        }
    }
}

impl Message for ConsumerGroupCurrentMemberAssignmentValue {
    const NAME: &'static str = "ConsumerGroupCurrentMemberAssignmentValue";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        buf.put_i32(self.member_epoch);
        buf.put_i32(self.previous_member_epoch);
        buf.put_i8(self.state.value());
        put_topic_partitions(buf, &self.assigned_partitions)?;
        put_topic_partitions(buf, &self.partitions_pending_revocation)?;
        put_empty_tagged_fields(buf);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        let value = Self {
            member_epoch: parse_i32(parser)?,
            previous_member_epoch: parse_i32(parser)?,
            state: MemberState::try_from(parse_i8(parser)?)?,
            assigned_partitions: parse_topic_partitions(parser)?,
            partitions_pending_revocation: parse_topic_partitions(parser)?,
        };
        skip_tagged_fields(parser, Self::NAME)?;

        Ok(value)
    }
}
