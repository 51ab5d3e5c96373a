/// Source of the current time, in milliseconds since the UNIX epoch.
///
/// Records capturing "when" a state was reached take their timestamp from a clock
/// supplied by the caller: the coordinator decides what "now" is.
pub trait Clock {
    fn milliseconds(&self) -> i64;
}

/// Wall clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn milliseconds(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock stuck at the given time.
///
/// Useful when replaying state, or in tests.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn milliseconds(&self) -> i64 {
        self.0
    }
}

/// Snapshot of a group using the classic (join/sync) protocol.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassicGroup {
    group_id: String,
    generation_id: i32,
    protocol_type: Option<String>,
    protocol_name: Option<String>,
    leader_id: Option<String>,
    members: Vec<ClassicGroupMember>,
}

impl ClassicGroup {
    pub fn builder(group_id: impl Into<String>) -> ClassicGroupBuilder {
        ClassicGroupBuilder::new(group_id)
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn generation_id(&self) -> i32 {
        self.generation_id
    }

    pub fn protocol_type(&self) -> Option<&str> {
        self.protocol_type.as_deref()
    }

    /// Protocol selected for the current generation, if any.
    pub fn protocol_name(&self) -> Option<&str> {
        self.protocol_name.as_deref()
    }

    pub fn leader_id(&self) -> Option<&str> {
        self.leader_id.as_deref()
    }

    /// Members, in the order they joined.
    pub fn members(&self) -> &[ClassicGroupMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Accumulates the fields of a [`ClassicGroup`], then freezes them with [`Self::build`].
#[derive(Debug, Clone)]
pub struct ClassicGroupBuilder {
    group: ClassicGroup,
}

impl ClassicGroupBuilder {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group: ClassicGroup {
                group_id: group_id.into(),
                generation_id: 0,
                protocol_type: None,
                protocol_name: None,
                leader_id: None,
                members: Vec::new(),
            },
        }
    }

    pub fn generation_id(mut self, generation_id: i32) -> Self {
        self.group.generation_id = generation_id;
        self
    }

    pub fn protocol_type(mut self, protocol_type: impl Into<String>) -> Self {
        self.group.protocol_type = Some(protocol_type.into());
        self
    }

    pub fn protocol_name(mut self, protocol_name: impl Into<String>) -> Self {
        self.group.protocol_name = Some(protocol_name.into());
        self
    }

    pub fn leader_id(mut self, leader_id: impl Into<String>) -> Self {
        self.group.leader_id = Some(leader_id.into());
        self
    }

    /// Adds a member; the first member added becomes the leader, unless one was set.
    pub fn add_member(mut self, member: ClassicGroupMember) -> Self {
        if self.group.leader_id.is_none() {
            self.group.leader_id = Some(member.member_id.clone());
        }
        self.group.members.push(member);
        self
    }

    pub fn build(self) -> ClassicGroup {
        self.group
    }
}

/// A protocol offered by a classic member when joining, with its metadata.
///
/// Metadata can be missing when the member state is not fully known (yet).
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinProtocol {
    pub name: String,
    pub metadata: Option<Vec<u8>>,
}

impl JoinProtocol {
    pub fn new(name: impl Into<String>, metadata: Option<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }
}

/// Snapshot of a member of a [`ClassicGroup`].
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassicGroupMember {
    member_id: String,
    group_instance_id: Option<String>,
    client_id: String,
    client_host: String,
    rebalance_timeout_ms: i32,
    session_timeout_ms: i32,
    supported_protocols: Vec<JoinProtocol>,
}

impl ClassicGroupMember {
    pub fn new(
        member_id: impl Into<String>,
        group_instance_id: Option<String>,
        client_id: impl Into<String>,
        client_host: impl Into<String>,
        rebalance_timeout_ms: i32,
        session_timeout_ms: i32,
        supported_protocols: Vec<JoinProtocol>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            group_instance_id,
            client_id: client_id.into(),
            client_host: client_host.into(),
            rebalance_timeout_ms,
            session_timeout_ms,
            supported_protocols,
        }
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn group_instance_id(&self) -> Option<&str> {
        self.group_instance_id.as_deref()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_host(&self) -> &str {
        &self.client_host
    }

    pub fn rebalance_timeout_ms(&self) -> i32 {
        self.rebalance_timeout_ms
    }

    pub fn session_timeout_ms(&self) -> i32 {
        self.session_timeout_ms
    }

    pub fn supported_protocols(&self) -> &[JoinProtocol] {
        &self.supported_protocols
    }

    /// Metadata the member supplied for `protocol_name`.
    ///
    /// `None` if the member does not support the protocol, or supplied no metadata for it.
    pub fn metadata(&self, protocol_name: &str) -> Option<&[u8]> {
        self.supported_protocols
            .iter()
            .find(|protocol| protocol.name == protocol_name)
            .and_then(|protocol| protocol.metadata.as_deref())
    }
}
