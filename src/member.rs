use std::collections::{HashMap, HashSet};
use std::fmt;

use uuid::Uuid;

use crate::consumer_group::ClassicMemberMetadata;
use crate::errors::CoordinatorRecordError;

/// Partitions per topic, as tracked in memory by the group state machine.
///
/// Iteration order is irrelevant: records are built from it through
/// [`canonical::topic_partitions`](crate::canonical::topic_partitions).
pub type Assignment = HashMap<Uuid, HashSet<i32>>;

/// Where a consumer group member is in the reconciliation of its assignment.
///
/// Transitions are decided by the reconciliation engine of the coordinator: this crate
/// only persists the state it is handed.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemberState {
    /// The member owns exactly its target assignment, and nothing is pending revocation.
    #[default]
    Stable,

    /// The member still owns partitions it must revoke before it can move on.
    UnrevokedPartitions,

    /// The member is owed partitions still owned by other members.
    UnreleasedPartitions,

    /// State not known to this version of the coordinator.
    Unknown,
}

impl MemberState {
    /// Value persisted in [`ConsumerGroupCurrentMemberAssignmentValue`](crate::ConsumerGroupCurrentMemberAssignmentValue).
    pub const fn value(&self) -> i8 {
        match self {
            MemberState::Stable => 0,
            MemberState::UnrevokedPartitions => 1,
            MemberState::UnreleasedPartitions => 2,
            MemberState::Unknown => 127,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            MemberState::Stable => "stable",
            MemberState::UnrevokedPartitions => "unrevoked_partitions",
            MemberState::UnreleasedPartitions => "unreleased_partitions",
            MemberState::Unknown => "unknown",
        }
    }
}

impl TryFrom<i8> for MemberState {
    type Error = CoordinatorRecordError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MemberState::Stable),
            1 => Ok(MemberState::UnrevokedPartitions),
            2 => Ok(MemberState::UnreleasedPartitions),
            127 => Ok(MemberState::Unknown),
            _ => Err(CoordinatorRecordError::UnknownMemberState(value)),
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of a consumer group (next generation protocol) member.
///
/// Immutable once built: the group state machine builds a new snapshot on every
/// transition, with [`ConsumerGroupMemberBuilder`], possibly starting from the previous
/// one via [`ConsumerGroupMember::to_builder`].
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsumerGroupMember {
    member_id: String,
    instance_id: Option<String>,
    rack_id: Option<String>,
    rebalance_timeout_ms: i32,
    client_id: String,
    client_host: String,
    subscribed_topic_names: Vec<String>,
    subscribed_topic_regex: Option<String>,
    server_assignor_name: Option<String>,
    classic_member_metadata: Option<ClassicMemberMetadata>,
    state: MemberState,
    member_epoch: i32,
    previous_member_epoch: i32,
    assigned_partitions: Assignment,
    partitions_pending_revocation: Assignment,
}

impl ConsumerGroupMember {
    pub fn builder(member_id: impl Into<String>) -> ConsumerGroupMemberBuilder {
        ConsumerGroupMemberBuilder::new(member_id)
    }

    /// A builder starting from every field of this member.
    pub fn to_builder(&self) -> ConsumerGroupMemberBuilder {
        ConsumerGroupMemberBuilder { member: self.clone() }
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    pub fn rack_id(&self) -> Option<&str> {
        self.rack_id.as_deref()
    }

    pub fn rebalance_timeout_ms(&self) -> i32 {
        self.rebalance_timeout_ms
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_host(&self) -> &str {
        &self.client_host
    }

    /// Subscribed topic names, in the order they were given.
    pub fn subscribed_topic_names(&self) -> &[String] {
        &self.subscribed_topic_names
    }

    pub fn subscribed_topic_regex(&self) -> Option<&str> {
        self.subscribed_topic_regex.as_deref()
    }

    pub fn server_assignor_name(&self) -> Option<&str> {
        self.server_assignor_name.as_deref()
    }

    pub fn classic_member_metadata(&self) -> Option<&ClassicMemberMetadata> {
        self.classic_member_metadata.as_ref()
    }

    /// Whether the member joined through the classic protocol.
    pub fn uses_classic_protocol(&self) -> bool {
        self.classic_member_metadata.is_some()
    }

    pub fn state(&self) -> MemberState {
        self.state
    }

    pub fn member_epoch(&self) -> i32 {
        self.member_epoch
    }

    pub fn previous_member_epoch(&self) -> i32 {
        self.previous_member_epoch
    }

    pub fn assigned_partitions(&self) -> &Assignment {
        &self.assigned_partitions
    }

    pub fn partitions_pending_revocation(&self) -> &Assignment {
        &self.partitions_pending_revocation
    }
}

/// Accumulates the fields of a [`ConsumerGroupMember`], then freezes them with [`Self::build`].
///
/// The member identifier is the only required field, hence taken by [`Self::new`].
#[derive(Debug, Clone)]
pub struct ConsumerGroupMemberBuilder {
    member: ConsumerGroupMember,
}

impl ConsumerGroupMemberBuilder {
    pub fn new(member_id: impl Into<String>) -> Self {
        Self {
            member: ConsumerGroupMember {
                member_id: member_id.into(),
                instance_id: None,
                rack_id: None,
                rebalance_timeout_ms: -1,
                client_id: String::default(),
                client_host: String::default(),
                subscribed_topic_names: Vec::new(),
                subscribed_topic_regex: None,
                server_assignor_name: None,
                classic_member_metadata: None,
                state: MemberState::Stable,
                member_epoch: 0,
                previous_member_epoch: 0,
                assigned_partitions: Assignment::new(),
                partitions_pending_revocation: Assignment::new(),
            },
        }
    }

    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.member.instance_id = Some(instance_id.into());
        self
    }

    pub fn rack_id(mut self, rack_id: impl Into<String>) -> Self {
        self.member.rack_id = Some(rack_id.into());
        self
    }

    pub fn rebalance_timeout_ms(mut self, rebalance_timeout_ms: i32) -> Self {
        self.member.rebalance_timeout_ms = rebalance_timeout_ms;
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.member.client_id = client_id.into();
        self
    }

    pub fn client_host(mut self, client_host: impl Into<String>) -> Self {
        self.member.client_host = client_host.into();
        self
    }

    pub fn subscribed_topic_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.member.subscribed_topic_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn subscribed_topic_regex(mut self, regex: impl Into<String>) -> Self {
        self.member.subscribed_topic_regex = Some(regex.into());
        self
    }

    pub fn server_assignor_name(mut self, name: impl Into<String>) -> Self {
        self.member.server_assignor_name = Some(name.into());
        self
    }

    pub fn classic_member_metadata(mut self, metadata: Option<ClassicMemberMetadata>) -> Self {
        self.member.classic_member_metadata = metadata;
        self
    }

    pub fn state(mut self, state: MemberState) -> Self {
        self.member.state = state;
        self
    }

    pub fn member_epoch(mut self, member_epoch: i32) -> Self {
        self.member.member_epoch = member_epoch;
        self
    }

    pub fn previous_member_epoch(mut self, previous_member_epoch: i32) -> Self {
        self.member.previous_member_epoch = previous_member_epoch;
        self
    }

    pub fn assigned_partitions(mut self, assigned_partitions: Assignment) -> Self {
        self.member.assigned_partitions = assigned_partitions;
        self
    }

    pub fn partitions_pending_revocation(mut self, partitions_pending_revocation: Assignment) -> Self {
        self.member.partitions_pending_revocation = partitions_pending_revocation;
        self
    }

    pub fn build(self) -> ConsumerGroupMember {
        self.member
    }
}
