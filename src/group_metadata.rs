use bytes::BufMut;
use bytes_parser::BytesParser;

use crate::encoding::{put_array_len, put_bytes, put_nullable_str, put_str};
use crate::errors::CoordinatorRecordError;
use crate::record::Message;
use crate::utils::{
    capacity_for, parse_array_len, parse_i32, parse_i64, parse_nullable_str, parse_str, parse_vec_bytes,
};

/// Key of the state of a classic group: one compaction slot per group.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupMetadataKey {
    pub group: String,
}

impl Message for GroupMetadataKey {
    const NAME: &'static str = "GroupMetadataKey";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.group)
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(Self {
            group: parse_str(parser)?,
        })
    }
}

/// Contains the current state of a classic group.
///
/// It is used by the Group Coordinator to track:
///
/// 1. which member is subscribed to what (via the opaque [`MemberMetadata::subscription`])
/// 2. which member is assigned what (via the opaque [`MemberMetadata::assignment`])
///
/// The metadata are divided into 2 classes:
///
/// 1. Membership metadata
///     * Members registered in this group
///     * Current protocol selected for the group (e.g. partition assignment strategy for consumers)
///     * Protocol metadata associated with group members
/// 2. State metadata
///     * Generation ID
///     * Leader ID
///
/// Compared to offset commits, this record is written _relatively infrequently_:
/// once per generation, when members join or leave the group.
///
/// The fields written depend on the value version, which follows the cluster version
/// (see [`group_metadata_value_version`](crate::versioning::group_metadata_value_version)):
///
/// | Version | Adds |
/// |---------|------|
/// | 0       | - |
/// | 1       | [`MemberMetadata::rebalance_timeout`] |
/// | 2       | [`GroupMetadataValue::current_state_timestamp`] |
/// | 3       | [`MemberMetadata::group_instance_id`] |
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupMetadataValue {
    /// The class (type) of [`GroupMetadataValue::protocol`] used by this group.
    ///
    /// Typical values are `consumer` or `connect`; an empty group has an empty protocol type.
    pub protocol_type: String,

    /// Monotonically increasing integer, changes when group members change.
    pub generation: i32,

    /// The protocol of [`GroupMetadataValue::protocol_type`] selected for this group.
    ///
    /// If `protocol_type == consumer`, this is the name of a partition assignor (e.g. `range`).
    /// `None` when no protocol was selected, as in empty groups.
    pub protocol: Option<String>,

    /// Identifier of the member leading the group.
    ///
    /// This corresponds to the [`MemberMetadata::member_id`] of one of the [`Self::members`].
    pub leader: Option<String>,

    /// Milliseconds since the UNIX epoch, of when this state was captured.
    ///
    /// `-1` if the value version does not carry it.
    pub current_state_timestamp: i64,

    /// Members that are part of the group.
    pub members: Vec<MemberMetadata>,
}

impl Default for GroupMetadataValue {
    fn default() -> Self {
        Self {
            protocol_type: String::default(),
            generation: 0,
            protocol: None,
            leader: None,
            current_state_timestamp: -1,
            members: Vec::new(),
        }
    }
}

impl GroupMetadataValue {
    /// [`Self::current_state_timestamp`] as a [`chrono::DateTime`], if the value carries it.
    pub fn current_state_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.current_state_timestamp < 0 {
            return None;
        }
        crate::utils::chrono_datetime(self.current_state_timestamp)
    }

    /// [`Self::current_state_timestamp`] as a [`time::OffsetDateTime`], if the value carries it.
    #[cfg(feature = "ts_time")]
    pub fn current_state_offset_datetime(&self) -> Option<time::OffsetDateTime> {
        if self.current_state_timestamp < 0 {
            return None;
        }
        crate::utils::time_offset_datetime(self.current_state_timestamp)
    }
}

impl Message for GroupMetadataValue {
    const NAME: &'static str = "GroupMetadataValue";

    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.protocol_type)?;
        buf.put_i32(self.generation);
        put_nullable_str(buf, self.protocol.as_deref())?;
        put_nullable_str(buf, self.leader.as_deref())?;
        if version >= 2 {
            buf.put_i64(self.current_state_timestamp);
        }

        put_array_len(buf, self.members.len())?;
        for member in &self.members {
            member.write(buf, version)?;
        }
        Ok(())
    }

    fn read(parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError> {
        let mut value = Self {
            protocol_type: parse_str(parser)?,
            generation: parse_i32(parser)?,
            protocol: parse_nullable_str(parser)?,
            leader: parse_nullable_str(parser)?,
            ..Default::default()
        };

        if version >= 2 {
            value.current_state_timestamp = parse_i64(parser)?;
        }

        let members_len = parse_array_len(parser)?;
        value.members = Vec::with_capacity(capacity_for(members_len));
        for _ in 0..members_len {
            value.members.push(MemberMetadata::read(parser, version)?);
        }

        Ok(value)
    }
}

/// Metadata of a classic group member.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberMetadata {
    pub member_id: String,

    /// Static membership identifier (`group.instance.id`), if any.
    pub group_instance_id: Option<String>,

    /// This corresponds to the client configuration option `client.id`.
    pub client_id: String,

    /// Usually the client IP.
    pub client_host: String,

    /// Maximum time (ms) that the Group Coordinator will wait for member to rejoin when rebalancing.
    pub rebalance_timeout: i32,

    /// The Group Coordinator considers the member "dead" if it receives no heartbeat after this timeout (ms).
    ///
    /// If the container value version is `0`, this is used in place of [`Self::rebalance_timeout`].
    pub session_timeout: i32,

    /// Metadata the member supplied for the protocol selected by the group.
    ///
    /// For `consumer` groups, this is a serialized `ConsumerProtocolSubscription`.
    pub subscription: Vec<u8>,

    /// Assignment the leader computed for this member.
    ///
    /// For `consumer` groups, this is a serialized `ConsumerProtocolAssignment`.
    pub assignment: Vec<u8>,
}

impl MemberMetadata {
    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.member_id)?;
        if version >= 3 {
            put_nullable_str(buf, self.group_instance_id.as_deref())?;
        }
        put_str(buf, &self.client_id)?;
        put_str(buf, &self.client_host)?;
        if version >= 1 {
            buf.put_i32(self.rebalance_timeout);
        }
        buf.put_i32(self.session_timeout);
        put_bytes(buf, &self.subscription)?;
        put_bytes(buf, &self.assignment)
    }

    fn read(parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError> {
        let mut member = Self {
            member_id: parse_str(parser)?,
            ..Default::default()
        };

        if version >= 3 {
            member.group_instance_id = parse_nullable_str(parser)?;
        }

        member.client_id = parse_str(parser)?;

        member.client_host = parse_str(parser)?;

        if version >= 1 {
            member.rebalance_timeout = parse_i32(parser)?;
        }

        member.session_timeout = parse_i32(parser)?;

        member.subscription = parse_vec_bytes(parser)?;

        member.assignment = parse_vec_bytes(parser)?;

        Ok(member)
    }
}
