//! Record factory: one function per entity and transition.
//!
//! Every function is pure. It reads the snapshot it is handed and returns the record
//! to append, never touching the snapshot or any shared state. Upserts carry a value;
//! tombstones only carry the key of the entity to delete.
//!
//! Schema versions are never chosen here: keys use the version identifying their record
//! type, values the one selected by [`versioning`](crate::versioning).

use std::collections::HashMap;

use crate::canonical;
use crate::classic_group::{ClassicGroup, ClassicGroupMember, Clock};
use crate::consumer_group::{
    ConsumerGroupCurrentMemberAssignmentValue, ConsumerGroupKey, ConsumerGroupMemberKey,
    ConsumerGroupMemberMetadataValue, ConsumerGroupMetadataValue, ConsumerGroupPartitionMetadataValue,
    ConsumerGroupTargetAssignmentMemberValue, ConsumerGroupTargetAssignmentMetadataValue,
};
use crate::errors::CoordinatorRecordError;
use crate::group_metadata::{GroupMetadataKey, GroupMetadataValue, MemberMetadata};
use crate::member::{Assignment, ConsumerGroupMember};
use crate::metadata_version::MetadataVersion;
use crate::offset_and_metadata::OffsetAndMetadata;
use crate::offset_commit::{OffsetCommitKey, OffsetCommitValue};
use crate::record::{ApiMessageAndVersion, CoordinatorRecord, RecordKey, RecordValue};
use crate::topic_metadata::TopicMetadata;
use crate::versioning::{group_metadata_value_version, offset_commit_value_version, CONSUMER_GROUP_VALUE_VERSION};

fn upsert(key: RecordKey, value: RecordValue, value_version: i16) -> CoordinatorRecord {
    let record_type = key.record_type();
    tracing::trace!(record_type = ?record_type, group_id = key.group_id(), value_version, "New record");

    CoordinatorRecord::new(
        ApiMessageAndVersion::new(key, record_type.key_version()),
        ApiMessageAndVersion::new(value, value_version),
    )
}

fn tombstone(key: RecordKey) -> CoordinatorRecord {
    let record_type = key.record_type();
    tracing::trace!(record_type = ?record_type, group_id = key.group_id(), "New tombstone");

    CoordinatorRecord::tombstone(ApiMessageAndVersion::new(key, record_type.key_version()))
}

fn group_key(group_id: &str) -> ConsumerGroupKey {
    ConsumerGroupKey {
        group_id: group_id.to_string(),
    }
}

fn member_key(group_id: &str, member_id: &str) -> ConsumerGroupMemberKey {
    ConsumerGroupMemberKey {
        group_id: group_id.to_string(),
        member_id: member_id.to_string(),
    }
}

/// Subscription of `member`, and the client it runs in.
pub fn new_member_subscription_record(group_id: &str, member: &ConsumerGroupMember) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupMemberMetadata(member_key(group_id, member.member_id())),
        RecordValue::ConsumerGroupMemberMetadata(ConsumerGroupMemberMetadataValue {
            instance_id: member.instance_id().map(String::from),
            rack_id: member.rack_id().map(String::from),
            client_id: member.client_id().to_string(),
            client_host: member.client_host().to_string(),
            subscribed_topic_names: canonical::sorted_strings(member.subscribed_topic_names()),
            subscribed_topic_regex: member.subscribed_topic_regex().map(String::from),
            server_assignor: member.server_assignor_name().map(String::from),
            rebalance_timeout_ms: member.rebalance_timeout_ms(),
            classic_member_metadata: member.classic_member_metadata().cloned(),
        }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_member_subscription_tombstone_record(group_id: &str, member_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupMemberMetadata(member_key(group_id, member_id)))
}

/// Metadata of the topics subscribed by the members of a group, keyed by topic name.
pub fn new_group_subscription_metadata_record(
    group_id: &str,
    metadata_by_topic_name: &HashMap<String, TopicMetadata>,
) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupPartitionMetadata(group_key(group_id)),
        RecordValue::ConsumerGroupPartitionMetadata(ConsumerGroupPartitionMetadataValue {
            topics: canonical::subscribed_topics(metadata_by_topic_name.values()),
        }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_group_subscription_metadata_tombstone_record(group_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupPartitionMetadata(group_key(group_id)))
}

pub fn new_group_epoch_record(group_id: &str, epoch: i32) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupMetadata(group_key(group_id)),
        RecordValue::ConsumerGroupMetadata(ConsumerGroupMetadataValue { epoch }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_group_epoch_tombstone_record(group_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupMetadata(group_key(group_id)))
}

/// Partitions the assignor decided `member_id` should own.
pub fn new_target_assignment_record(group_id: &str, member_id: &str, partitions: &Assignment) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupTargetAssignmentMember(member_key(group_id, member_id)),
        RecordValue::ConsumerGroupTargetAssignmentMember(ConsumerGroupTargetAssignmentMemberValue {
            topic_partitions: canonical::topic_partitions(partitions),
        }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_target_assignment_tombstone_record(group_id: &str, member_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupTargetAssignmentMember(member_key(group_id, member_id)))
}

pub fn new_target_assignment_epoch_record(group_id: &str, assignment_epoch: i32) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupTargetAssignmentMetadata(group_key(group_id)),
        RecordValue::ConsumerGroupTargetAssignmentMetadata(ConsumerGroupTargetAssignmentMetadataValue {
            assignment_epoch,
        }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_target_assignment_epoch_tombstone_record(group_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupTargetAssignmentMetadata(group_key(group_id)))
}

/// Reconciliation state of `member`: its epochs, state and owned or revoking partitions.
pub fn new_current_assignment_record(group_id: &str, member: &ConsumerGroupMember) -> CoordinatorRecord {
    upsert(
        RecordKey::ConsumerGroupCurrentMemberAssignment(member_key(group_id, member.member_id())),
        RecordValue::ConsumerGroupCurrentMemberAssignment(ConsumerGroupCurrentMemberAssignmentValue {
            member_epoch: member.member_epoch(),
            previous_member_epoch: member.previous_member_epoch(),
            state: member.state(),
            assigned_partitions: canonical::topic_partitions(member.assigned_partitions()),
            partitions_pending_revocation: canonical::topic_partitions(member.partitions_pending_revocation()),
        }),
        CONSUMER_GROUP_VALUE_VERSION,
    )
}

pub fn new_current_assignment_tombstone_record(group_id: &str, member_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::ConsumerGroupCurrentMemberAssignment(member_key(group_id, member_id)))
}

fn illegal_group_state(group: &ClassicGroup, member: &ClassicGroupMember, reason: String) -> CoordinatorRecordError {
    tracing::error!(
        group_id = group.group_id(),
        member_id = member.member_id(),
        reason = reason.as_str(),
        "Cannot write metadata of classic group"
    );

    CoordinatorRecordError::IllegalGroupState {
        group_id: group.group_id().to_string(),
        member_id: member.member_id().to_string(),
        reason,
    }
}

/// State of a classic group, with the assignment computed for each member.
///
/// `assignment` maps a member id to the assignment bytes it is going to receive.
///
/// # Errors
///
/// Returns [`CoordinatorRecordError::IllegalGroupState`] if a member has no metadata
/// for the protocol selected by the group, or no entry in `assignment`. An empty group
/// never fails.
pub fn new_group_metadata_record(
    group: &ClassicGroup,
    assignment: &HashMap<String, Vec<u8>>,
    metadata_version: MetadataVersion,
    clock: &impl Clock,
) -> Result<CoordinatorRecord, CoordinatorRecordError> {
    let members = group
        .members()
        .iter()
        .map(|member| -> Result<MemberMetadata, CoordinatorRecordError> {
            let protocol_name = group
                .protocol_name()
                .ok_or_else(|| illegal_group_state(group, member, "no protocol selected for the group".to_string()))?;
            let subscription = member.metadata(protocol_name).ok_or_else(|| {
                illegal_group_state(group, member, format!("no subscription metadata for protocol '{protocol_name}'"))
            })?;
            let member_assignment = assignment
                .get(member.member_id())
                .ok_or_else(|| illegal_group_state(group, member, "no assignment".to_string()))?;

            Ok(MemberMetadata {
                member_id: member.member_id().to_string(),
                group_instance_id: member.group_instance_id().map(String::from),
                client_id: member.client_id().to_string(),
                client_host: member.client_host().to_string(),
                rebalance_timeout: member.rebalance_timeout_ms(),
                session_timeout: member.session_timeout_ms(),
                subscription: subscription.to_vec(),
                assignment: member_assignment.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(upsert(
        RecordKey::GroupMetadata(GroupMetadataKey {
            group: group.group_id().to_string(),
        }),
        RecordValue::GroupMetadata(GroupMetadataValue {
            protocol_type: group.protocol_type().unwrap_or_default().to_string(),
            generation: group.generation_id(),
            protocol: group.protocol_name().map(String::from),
            leader: group.leader_id().map(String::from),
            current_state_timestamp: clock.milliseconds(),
            members,
        }),
        group_metadata_value_version(metadata_version),
    ))
}

/// State of a classic group that has no members left.
///
/// Only the group id of `group` is used: the value is the canonical empty one, which
/// keeps the group around, unlike [`new_group_metadata_tombstone_record`].
pub fn new_empty_group_metadata_record(
    group: &ClassicGroup,
    metadata_version: MetadataVersion,
    clock: &impl Clock,
) -> CoordinatorRecord {
    upsert(
        RecordKey::GroupMetadata(GroupMetadataKey {
            group: group.group_id().to_string(),
        }),
        RecordValue::GroupMetadata(GroupMetadataValue {
            protocol_type: String::default(),
            generation: 0,
            protocol: None,
            leader: None,
            current_state_timestamp: clock.milliseconds(),
            members: Vec::new(),
        }),
        group_metadata_value_version(metadata_version),
    )
}

pub fn new_group_metadata_tombstone_record(group_id: &str) -> CoordinatorRecord {
    tombstone(RecordKey::GroupMetadata(GroupMetadataKey {
        group: group_id.to_string(),
    }))
}

/// Offset committed by `group_id` for a topic partition.
pub fn new_offset_commit_record(
    group_id: &str,
    topic: &str,
    partition: i32,
    offset_and_metadata: &OffsetAndMetadata,
    metadata_version: MetadataVersion,
) -> CoordinatorRecord {
    let has_expire_timestamp = offset_and_metadata.expire_timestamp_ms.is_some();
    let value_version = offset_commit_value_version(metadata_version, has_expire_timestamp);
    if has_expire_timestamp {
        tracing::debug!(
            group_id,
            topic,
            partition,
            value_version,
            %metadata_version,
            "Offset commit carries an expire timestamp: overriding value version"
        );
    }

    upsert(
        RecordKey::OffsetCommit(OffsetCommitKey {
            group: group_id.to_string(),
            topic: topic.to_string(),
            partition,
        }),
        RecordValue::OffsetCommit(OffsetCommitValue {
            offset: offset_and_metadata.committed_offset,
            leader_epoch: offset_and_metadata.leader_epoch.unwrap_or(-1),
            metadata: offset_and_metadata.metadata.clone(),
            commit_timestamp: offset_and_metadata.commit_timestamp_ms,
            expire_timestamp: offset_and_metadata.expire_timestamp_ms.unwrap_or(-1),
        }),
        value_version,
    )
}

pub fn new_offset_commit_tombstone_record(group_id: &str, topic: &str, partition: i32) -> CoordinatorRecord {
    tombstone(RecordKey::OffsetCommit(OffsetCommitKey {
        group: group_id.to_string(),
        topic: topic.to_string(),
        partition,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;
    use uuid::Uuid;

    use super::*;
    use crate::classic_group::{FixedClock, JoinProtocol};
    use crate::consumer_group::{ClassicMemberMetadata, ClassicProtocol, TopicPartitions};
    use crate::member::MemberState;
    use crate::metadata_version::MetadataVersion::*;
    use crate::versioning::RecordType;

    fn assert_round_trips(record: &CoordinatorRecord) {
        let (key, value) = record.to_bytes().unwrap();
        let decoded = CoordinatorRecord::try_from_bytes(Some(&key[..]), value.as_deref()).unwrap();
        assert_eq!(&decoded, record);
    }

    fn mk_topic_partitions(topic_id: Uuid, partitions: &[i32]) -> (Uuid, HashSet<i32>) {
        (topic_id, partitions.iter().copied().collect())
    }

    fn partition_racks(num_partitions: i32) -> HashMap<i32, HashSet<String>> {
        (0..num_partitions)
            .map(|i| (i, HashSet::from([format!("rack{}", i % 4), format!("rack{}", (i + 1) % 4)])))
            .collect()
    }

    #[test]
    fn member_subscription_record() {
        let classic = ClassicMemberMetadata {
            supported_protocols: vec![ClassicProtocol {
                name: "range".to_string(),
                metadata: vec![0x01],
            }],
        };
        let member = ConsumerGroupMember::builder("member-id")
            .instance_id("instance-id")
            .rack_id("rack-id")
            .rebalance_timeout_ms(5000)
            .client_id("client-id")
            .client_host("client-host")
            .subscribed_topic_names(["foo", "zar", "bar"])
            .subscribed_topic_regex("regex")
            .server_assignor_name("range")
            .classic_member_metadata(Some(classic.clone()))
            .build();

        let expected = CoordinatorRecord::new(
            ApiMessageAndVersion::new(
                RecordKey::ConsumerGroupMemberMetadata(ConsumerGroupMemberKey {
                    group_id: "group-id".to_string(),
                    member_id: "member-id".to_string(),
                }),
                5,
            ),
            ApiMessageAndVersion::new(
                RecordValue::ConsumerGroupMemberMetadata(ConsumerGroupMemberMetadataValue {
                    instance_id: Some("instance-id".to_string()),
                    rack_id: Some("rack-id".to_string()),
                    client_id: "client-id".to_string(),
                    client_host: "client-host".to_string(),
                    subscribed_topic_names: vec!["bar".to_string(), "foo".to_string(), "zar".to_string()],
                    subscribed_topic_regex: Some("regex".to_string()),
                    server_assignor: Some("range".to_string()),
                    rebalance_timeout_ms: 5000,
                    classic_member_metadata: Some(classic),
                }),
                0,
            ),
        );

        let record = new_member_subscription_record("group-id", &member);
        assert_eq!(record, expected);
        assert_round_trips(&record);

        // The snapshot keeps the order it was given.
        assert_eq!(member.subscribed_topic_names(), &["foo".to_string(), "zar".to_string(), "bar".to_string()]);
    }

    #[test]
    fn member_subscription_record_without_classic_metadata() {
        let member = ConsumerGroupMember::builder("member-id").build();
        match new_member_subscription_record("group-id", &member).value.map(|v| v.message) {
            Some(RecordValue::ConsumerGroupMemberMetadata(value)) => {
                assert_eq!(value.classic_member_metadata, None);
                assert_eq!(value.rebalance_timeout_ms, -1);
            },
            other => panic!("Returned wrong value: {other:?}"),
        }
    }

    #[rstest]
    #[case(new_member_subscription_tombstone_record("group-id", "member-id"), RecordType::ConsumerGroupMemberMetadata, 5)]
    #[case(new_group_subscription_metadata_tombstone_record("group-id"), RecordType::ConsumerGroupPartitionMetadata, 4)]
    #[case(new_group_epoch_tombstone_record("group-id"), RecordType::ConsumerGroupMetadata, 3)]
    #[case(new_target_assignment_tombstone_record("group-id", "member-id"), RecordType::ConsumerGroupTargetAssignmentMember, 7)]
    #[case(new_target_assignment_epoch_tombstone_record("group-id"), RecordType::ConsumerGroupTargetAssignmentMetadata, 6)]
    #[case(new_current_assignment_tombstone_record("group-id", "member-id"), RecordType::ConsumerGroupCurrentMemberAssignment, 8)]
    #[case(new_group_metadata_tombstone_record("group-id"), RecordType::GroupMetadata, 2)]
    #[case(new_offset_commit_tombstone_record("group-id", "foo", 1), RecordType::OffsetCommit, 1)]
    fn tombstones(#[case] record: CoordinatorRecord, #[case] record_type: RecordType, #[case] key_version: i16) {
        assert!(record.is_tombstone());
        assert_eq!(record.record_type(), record_type);
        assert_eq!(record.key.version, key_version);
        assert_eq!(record.key.message.group_id(), "group-id");

        let (_, value) = record.to_bytes().unwrap();
        assert!(value.is_none());
        assert_round_trips(&record);
    }

    #[test]
    fn member_tombstone_key() {
        assert_eq!(
            new_member_subscription_tombstone_record("group-id", "member-id"),
            CoordinatorRecord::tombstone(ApiMessageAndVersion::new(
                RecordKey::ConsumerGroupMemberMetadata(ConsumerGroupMemberKey {
                    group_id: "group-id".to_string(),
                    member_id: "member-id".to_string(),
                }),
                5,
            ))
        );
    }

    fn member(member_id: &str) -> ConsumerGroupMember {
        ConsumerGroupMember::builder(member_id).subscribed_topic_names(["foo"]).build()
    }

    #[rstest]
    #[case(
        new_member_subscription_record("group-id", &member("member-1")),
        new_member_subscription_tombstone_record("group-id", "member-1")
    )]
    #[case(
        new_group_subscription_metadata_record("group-id", &HashMap::new()),
        new_group_subscription_metadata_tombstone_record("group-id")
    )]
    #[case(new_group_epoch_record("group-id", 10), new_group_epoch_tombstone_record("group-id"))]
    #[case(
        new_target_assignment_record("group-id", "member-2", &HashMap::from([mk_topic_partitions(Uuid::new_v4(), &[0, 1])])),
        new_target_assignment_tombstone_record("group-id", "member-2")
    )]
    #[case(new_target_assignment_epoch_record("group-id", 10), new_target_assignment_epoch_tombstone_record("group-id"))]
    #[case(
        new_current_assignment_record("group-id", &member("member-3")),
        new_current_assignment_tombstone_record("group-id", "member-3")
    )]
    #[case(
        new_empty_group_metadata_record(&ClassicGroup::builder("group-id").build(), MetadataVersion::LATEST, &FixedClock(1234)),
        new_group_metadata_tombstone_record("group-id")
    )]
    #[case(
        new_offset_commit_record("group-id", "foo", 7, &OffsetAndMetadata::new(100, None, "", 1234, None), MetadataVersion::LATEST),
        new_offset_commit_tombstone_record("group-id", "foo", 7)
    )]
    fn tombstone_deletes_its_upsert(#[case] upsert: CoordinatorRecord, #[case] tombstone: CoordinatorRecord) {
        assert!(!upsert.is_tombstone());
        assert!(tombstone.is_tombstone());
        assert_eq!(upsert.key, tombstone.key);

        let (upsert_key, _) = upsert.to_bytes().unwrap();
        let (tombstone_key, _) = tombstone.to_bytes().unwrap();
        assert_eq!(upsert_key, tombstone_key);
    }

    #[test]
    fn tombstones_of_other_entities_differ() {
        assert_ne!(
            new_current_assignment_record("group-id", &member("member-1")).key,
            new_current_assignment_tombstone_record("group-id", "member-2").key
        );
        assert_ne!(
            new_offset_commit_record("group-id", "foo", 1, &OffsetAndMetadata::new(100, None, "", 1234, None), MetadataVersion::LATEST).key,
            new_offset_commit_tombstone_record("group-id", "foo", 2).key
        );
    }

    #[rstest]
    #[case(0)]
    #[case(10)]
    #[case(20)]
    fn group_subscription_metadata_record(#[case] num_partitions: i32) {
        let foo_id = Uuid::from_u128(0xf00);
        let bar_id = Uuid::from_u128(0xba7);
        let metadata = HashMap::from([
            (
                "foo".to_string(),
                TopicMetadata::new(foo_id, "foo", num_partitions, partition_racks(num_partitions)).unwrap(),
            ),
            ("bar".to_string(), TopicMetadata::new(bar_id, "bar", num_partitions, HashMap::new()).unwrap()),
        ]);

        let record = new_group_subscription_metadata_record("group-id", &metadata);
        assert_eq!(record.key.version, 4);
        assert_eq!(record.value.as_ref().map(|v| v.version), Some(0));
        match record.value.as_ref().map(|v| &v.message) {
            Some(RecordValue::ConsumerGroupPartitionMetadata(value)) => {
                // Sorted by topic id.
                assert_eq!(value.topics.len(), 2);
                assert_eq!(value.topics[0].topic_id, bar_id);
                assert_eq!(value.topics[0].num_partitions, num_partitions);
                assert!(value.topics[0].partition_metadata.is_empty());
                assert_eq!(value.topics[1].topic_id, foo_id);
                assert_eq!(value.topics[1].topic_name, "foo");
                assert_eq!(value.topics[1].num_partitions, num_partitions);
                assert_eq!(value.topics[1].partition_metadata.len(), num_partitions as usize);
                for (i, pm) in value.topics[1].partition_metadata.iter().enumerate() {
                    assert_eq!(pm.partition, i as i32);
                    assert!(pm.racks.windows(2).all(|w| w[0] < w[1]));
                }
            },
            other => panic!("Returned wrong value: {other:?}"),
        }
        assert_round_trips(&record);
    }

    #[test]
    fn group_epoch_record() {
        let record = new_group_epoch_record("group-id", 10);
        assert_eq!(
            record,
            CoordinatorRecord::new(
                ApiMessageAndVersion::new(
                    RecordKey::ConsumerGroupMetadata(ConsumerGroupKey {
                        group_id: "group-id".to_string(),
                    }),
                    3,
                ),
                ApiMessageAndVersion::new(
                    RecordValue::ConsumerGroupMetadata(ConsumerGroupMetadataValue { epoch: 10 }),
                    0,
                ),
            )
        );
        assert_round_trips(&record);
    }

    #[test]
    fn target_assignment_record() {
        let topic_1 = Uuid::from_u128(1);
        let topic_2 = Uuid::from_u128(2);
        let partitions = Assignment::from([
            mk_topic_partitions(topic_2, &[24, 22, 23]),
            mk_topic_partitions(topic_1, &[13, 11, 12]),
        ]);

        let record = new_target_assignment_record("group-id", "member-id", &partitions);
        assert_eq!(
            record.value.as_ref().map(|v| &v.message),
            Some(&RecordValue::ConsumerGroupTargetAssignmentMember(ConsumerGroupTargetAssignmentMemberValue {
                topic_partitions: vec![
                    TopicPartitions {
                        topic_id: topic_1,
                        partitions: vec![11, 12, 13],
                    },
                    TopicPartitions {
                        topic_id: topic_2,
                        partitions: vec![22, 23, 24],
                    },
                ],
            }))
        );
        assert_eq!(record.key.version, 7);
        assert_round_trips(&record);
    }

    #[test]
    fn target_assignment_record_is_deterministic() {
        let topics: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
        let forward: Assignment = topics.iter().map(|id| mk_topic_partitions(*id, &[3, 1, 2])).collect();
        let backward: Assignment = topics.iter().rev().map(|id| mk_topic_partitions(*id, &[2, 3, 1])).collect();

        let forward = new_target_assignment_record("group-id", "member-id", &forward).to_bytes().unwrap();
        let backward = new_target_assignment_record("group-id", "member-id", &backward).to_bytes().unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn target_assignment_epoch_record() {
        let record = new_target_assignment_epoch_record("group-id", 10);
        assert_eq!(record.key.version, 6);
        assert_eq!(
            record.value.as_ref().map(|v| &v.message),
            Some(&RecordValue::ConsumerGroupTargetAssignmentMetadata(ConsumerGroupTargetAssignmentMetadataValue {
                assignment_epoch: 10,
            }))
        );
        assert_round_trips(&record);
    }

    #[rstest]
    fn current_assignment_record(
        #[values(
            MemberState::Stable,
            MemberState::UnrevokedPartitions,
            MemberState::UnreleasedPartitions,
            MemberState::Unknown
        )]
        state: MemberState,
    ) {
        let topic_1 = Uuid::from_u128(1);
        let topic_2 = Uuid::from_u128(2);
        let member = ConsumerGroupMember::builder("member-id")
            .state(state)
            .member_epoch(22)
            .previous_member_epoch(21)
            .assigned_partitions(Assignment::from([
                mk_topic_partitions(topic_2, &[23, 21, 22]),
                mk_topic_partitions(topic_1, &[11, 12, 13]),
            ]))
            .partitions_pending_revocation(Assignment::from([
                mk_topic_partitions(topic_1, &[14]),
                mk_topic_partitions(topic_2, &[25, 24]),
            ]))
            .build();

        let record = new_current_assignment_record("group-id", &member);
        assert_eq!(record.key.version, 8);
        assert_eq!(
            record.value.as_ref().map(|v| &v.message),
            Some(&RecordValue::ConsumerGroupCurrentMemberAssignment(ConsumerGroupCurrentMemberAssignmentValue {
                member_epoch: 22,
                previous_member_epoch: 21,
                state,
                assigned_partitions: vec![
                    TopicPartitions {
                        topic_id: topic_1,
                        partitions: vec![11, 12, 13],
                    },
                    TopicPartitions {
                        topic_id: topic_2,
                        partitions: vec![21, 22, 23],
                    },
                ],
                partitions_pending_revocation: vec![
                    TopicPartitions {
                        topic_id: topic_1,
                        partitions: vec![14],
                    },
                    TopicPartitions {
                        topic_id: topic_2,
                        partitions: vec![24, 25],
                    },
                ],
            }))
        );
        assert_round_trips(&record);
    }

    fn classic_member(member_id: &str, protocol_metadata: Option<Vec<u8>>) -> ClassicGroupMember {
        ClassicGroupMember::new(
            member_id,
            Some(format!("{member_id}-instance")),
            "client",
            "host",
            10_000,
            5000,
            vec![JoinProtocol::new("range", protocol_metadata)],
        )
    }

    fn classic_group(members: Vec<ClassicGroupMember>) -> ClassicGroup {
        members
            .into_iter()
            .fold(
                ClassicGroup::builder("group-id")
                    .generation_id(1)
                    .protocol_type("consumer")
                    .protocol_name("range"),
                |builder, member| builder.add_member(member),
            )
            .build()
    }

    #[rstest]
    #[case(IBP_0_10_0_IV1, 0)]
    #[case(IBP_1_1_IV0, 1)]
    #[case(IBP_2_2_IV0, 2)]
    #[case(IBP_3_5_IV2, 3)]
    fn group_metadata_record(#[case] metadata_version: MetadataVersion, #[case] expected_version: i16) {
        let group = classic_group(vec![
            classic_member("member-1", Some(vec![0, 1, 2])),
            classic_member("member-2", Some(vec![1, 2, 3])),
        ]);
        let assignment =
            HashMap::from([("member-1".to_string(), vec![2, 3, 4]), ("member-2".to_string(), vec![3, 4, 5])]);

        let record = new_group_metadata_record(&group, &assignment, metadata_version, &FixedClock(1234)).unwrap();
        assert_eq!(record.key.version, 2);
        assert_eq!(record.value.as_ref().map(|v| v.version), Some(expected_version));

        let expected_value = GroupMetadataValue {
            protocol_type: "consumer".to_string(),
            generation: 1,
            protocol: Some("range".to_string()),
            leader: Some("member-1".to_string()),
            current_state_timestamp: 1234,
            members: vec![
                MemberMetadata {
                    member_id: "member-1".to_string(),
                    group_instance_id: Some("member-1-instance".to_string()),
                    client_id: "client".to_string(),
                    client_host: "host".to_string(),
                    rebalance_timeout: 10_000,
                    session_timeout: 5000,
                    subscription: vec![0, 1, 2],
                    assignment: vec![2, 3, 4],
                },
                MemberMetadata {
                    member_id: "member-2".to_string(),
                    group_instance_id: Some("member-2-instance".to_string()),
                    client_id: "client".to_string(),
                    client_host: "host".to_string(),
                    rebalance_timeout: 10_000,
                    session_timeout: 5000,
                    subscription: vec![1, 2, 3],
                    assignment: vec![3, 4, 5],
                },
            ],
        };
        assert_eq!(record.value.as_ref().map(|v| &v.message), Some(&RecordValue::GroupMetadata(expected_value)));

        if expected_version == 3 {
            assert_round_trips(&record);
        }
    }

    #[test]
    fn group_metadata_record_at_every_cluster_version() {
        let group = classic_group(vec![classic_member("member-1", Some(vec![0]))]);
        let assignment = HashMap::from([("member-1".to_string(), vec![1])]);

        for mv in MetadataVersion::VALUES {
            let record = new_group_metadata_record(&group, &assignment, *mv, &FixedClock(1234)).unwrap();
            let value_version = record.value.as_ref().map(|v| v.version);
            assert_eq!(value_version, Some(group_metadata_value_version(*mv)));

            let (key, value) = record.to_bytes().unwrap();
            let decoded = CoordinatorRecord::try_from_bytes(Some(&key[..]), value.as_deref()).unwrap();
            assert_eq!(decoded.key, record.key);
            assert_eq!(decoded.value.map(|v| v.version), value_version);
        }
    }

    #[test]
    fn group_metadata_record_without_member_metadata() {
        let group = classic_group(vec![
            classic_member("member-1", Some(vec![0, 1, 2])),
            classic_member("member-2", None),
        ]);
        let assignment =
            HashMap::from([("member-1".to_string(), vec![2, 3, 4]), ("member-2".to_string(), vec![3, 4, 5])]);

        match new_group_metadata_record(&group, &assignment, MetadataVersion::LATEST, &FixedClock(1234)) {
            Err(CoordinatorRecordError::IllegalGroupState { group_id, member_id, .. }) => {
                assert_eq!(group_id, "group-id");
                assert_eq!(member_id, "member-2");
            },
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn group_metadata_record_without_member_assignment() {
        let group = classic_group(vec![
            classic_member("member-1", Some(vec![0, 1, 2])),
            classic_member("member-2", Some(vec![1, 2, 3])),
        ]);
        let assignment = HashMap::from([("member-1".to_string(), vec![2, 3, 4])]);

        match new_group_metadata_record(&group, &assignment, MetadataVersion::LATEST, &FixedClock(1234)) {
            Err(CoordinatorRecordError::IllegalGroupState { member_id, .. }) => assert_eq!(member_id, "member-2"),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn group_metadata_record_without_selected_protocol() {
        let group = ClassicGroup::builder("group-id").add_member(classic_member("member-1", Some(vec![0]))).build();
        let assignment = HashMap::from([("member-1".to_string(), vec![1])]);

        assert!(matches!(
            new_group_metadata_record(&group, &assignment, MetadataVersion::LATEST, &FixedClock(1234)),
            Err(CoordinatorRecordError::IllegalGroupState { .. })
        ));
    }

    #[test]
    fn group_metadata_record_of_group_without_members() {
        let group = ClassicGroup::builder("group-id").generation_id(5).build();
        let record = new_group_metadata_record(&group, &HashMap::new(), MetadataVersion::LATEST, &FixedClock(1234));
        assert!(record.is_ok());
    }

    #[rstest]
    fn empty_group_metadata_record(
        #[values(IBP_0_10_0_IV0, IBP_2_0_IV1, IBP_2_1_IV0, IBP_3_5_IV2, MetadataVersion::LATEST)]
        metadata_version: MetadataVersion,
    ) {
        let group = classic_group(vec![classic_member("member-1", Some(vec![0]))]);

        let record = new_empty_group_metadata_record(&group, metadata_version, &FixedClock(1234));
        assert!(!record.is_tombstone());
        assert_eq!(record.key.message.group_id(), "group-id");
        assert_eq!(record.value.as_ref().map(|v| v.version), Some(group_metadata_value_version(metadata_version)));
        assert_eq!(
            record.value.as_ref().map(|v| &v.message),
            Some(&RecordValue::GroupMetadata(GroupMetadataValue {
                protocol_type: String::new(),
                generation: 0,
                protocol: None,
                leader: None,
                current_state_timestamp: 1234,
                members: Vec::new(),
            }))
        );
    }

    #[test]
    fn empty_group_metadata_record_layout() {
        let group = ClassicGroup::builder("g").build();
        let record = new_empty_group_metadata_record(&group, IBP_3_5_IV2, &FixedClock(1234));

        let (key, value) = record.to_bytes().unwrap();
        assert_eq!(&key[..], &[0x00, 0x02, 0x00, 0x01, b'g']);
        let mut expected = vec![0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff];
        expected.extend_from_slice(&1234_i64.to_be_bytes());
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(value.as_deref(), Some(&expected[..]));
        assert_round_trips(&record);
    }

    #[rstest]
    #[case(IBP_1_0_IV0, Some(10), 1, -1)]
    #[case(IBP_2_1_IV0, Some(10), 2, -1)]
    #[case(IBP_2_1_IV1, Some(10), 3, 10)]
    #[case(MetadataVersion::LATEST, Some(10), 3, 10)]
    #[case(MetadataVersion::LATEST, None, 3, -1)]
    fn offset_commit_record(
        #[case] metadata_version: MetadataVersion,
        #[case] leader_epoch: Option<i32>,
        #[case] expected_version: i16,
        #[case] expected_decoded_epoch: i32,
    ) {
        let offset = OffsetAndMetadata::new(100, leader_epoch, "metadata", 1234, None);

        let record = new_offset_commit_record("group-id", "foo", 1, &offset, metadata_version);
        assert_eq!(record.key.version, 1);
        assert_eq!(
            record.key.message,
            RecordKey::OffsetCommit(OffsetCommitKey {
                group: "group-id".to_string(),
                topic: "foo".to_string(),
                partition: 1,
            })
        );
        assert_eq!(record.value.as_ref().map(|v| v.version), Some(expected_version));
        assert_eq!(
            record.value.as_ref().map(|v| &v.message),
            Some(&RecordValue::OffsetCommit(OffsetCommitValue {
                offset: 100,
                leader_epoch: leader_epoch.unwrap_or(-1),
                metadata: "metadata".to_string(),
                commit_timestamp: 1234,
                expire_timestamp: -1,
            }))
        );

        let (key, value) = record.to_bytes().unwrap();
        match CoordinatorRecord::try_from_bytes(Some(&key[..]), value.as_deref()).unwrap().value.map(|v| v.message) {
            Some(RecordValue::OffsetCommit(decoded)) => {
                assert_eq!(decoded.offset, 100);
                assert_eq!(decoded.leader_epoch, expected_decoded_epoch);
                assert_eq!(decoded.metadata, "metadata");
                assert_eq!(decoded.commit_timestamp, 1234);
            },
            other => panic!("Returned wrong value: {other:?}"),
        }
    }

    #[test]
    fn offset_commit_record_with_expire_timestamp() {
        let offset = OffsetAndMetadata::new(100, Some(10), "metadata", 1234, Some(5678));

        for mv in MetadataVersion::VALUES {
            let record = new_offset_commit_record("group-id", "foo", 1, &offset, *mv);
            assert_eq!(record.value.as_ref().map(|v| v.version), Some(1));

            let (key, value) = record.to_bytes().unwrap();
            match CoordinatorRecord::try_from_bytes(Some(&key[..]), value.as_deref()).unwrap().value.map(|v| v.message) {
                Some(RecordValue::OffsetCommit(decoded)) => {
                    assert_eq!(decoded.expire_timestamp, 5678);
                    assert_eq!(decoded.leader_epoch, -1);
                },
                other => panic!("Returned wrong value: {other:?}"),
            }
        }
    }

    #[test]
    fn upserts_leave_snapshots_untouched() {
        let member = ConsumerGroupMember::builder("member-id")
            .subscribed_topic_names(["zar", "foo"])
            .assigned_partitions(Assignment::from([mk_topic_partitions(Uuid::from_u128(1), &[2, 1])]))
            .build();
        let before = member.clone();

        new_member_subscription_record("group-id", &member);
        new_current_assignment_record("group-id", &member);
        assert_eq!(member, before);
    }
}
