/// An offset committed by a group for one partition, as tracked in memory by the coordinator.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetAndMetadata {
    pub committed_offset: i64,

    /// Epoch of the partition leader when the offset was consumed, if known.
    pub leader_epoch: Option<i32>,

    /// Free-form metadata supplied by the client with the commit.
    pub metadata: String,

    /// Milliseconds since the UNIX epoch.
    pub commit_timestamp_ms: i64,

    /// Milliseconds since the UNIX epoch, after which the commit can be expired.
    ///
    /// Only old clients set this explicitly: newer ones leave retention to the broker.
    pub expire_timestamp_ms: Option<i64>,
}

impl OffsetAndMetadata {
    pub fn new(
        committed_offset: i64,
        leader_epoch: Option<i32>,
        metadata: impl Into<String>,
        commit_timestamp_ms: i64,
        expire_timestamp_ms: Option<i64>,
    ) -> Self {
        Self {
            committed_offset,
            leader_epoch,
            metadata: metadata.into(),
            commit_timestamp_ms,
            expire_timestamp_ms,
        }
    }
}
