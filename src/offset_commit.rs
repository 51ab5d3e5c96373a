use bytes::BufMut;
use bytes_parser::BytesParser;

use crate::encoding::put_str;
use crate::errors::CoordinatorRecordError;
use crate::record::Message;
use crate::utils::{parse_i32, parse_i64, parse_str};

/// Key of an offset commit: one compaction slot per group, topic and partition.
///
/// **NOTE:** Key version `0` and `1` share this layout.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetCommitKey {
    pub group: String,
    pub topic: String,
    pub partition: i32,
}

impl Message for OffsetCommitKey {
    const NAME: &'static str = "OffsetCommitKey";

    fn write<B: BufMut>(&self, buf: &mut B, _version: i16) -> Result<(), CoordinatorRecordError> {
        put_str(buf, &self.group)?;
        put_str(buf, &self.topic)?;
        buf.put_i32(self.partition);
        Ok(())
    }

    fn read(parser: &mut BytesParser, _version: i16) -> Result<Self, CoordinatorRecordError> {
        Ok(Self {
            group: parse_str(parser)?,
            topic: parse_str(parser)?,
            partition: parse_i32(parser)?,
        })
    }
}

/// Offset committed by a group for a topic partition.
///
/// Which fields reach the log depends on the value version:
///
/// | Version | Fields |
/// |---------|--------|
/// | 0, 2    | offset, metadata, commit timestamp |
/// | 1       | offset, metadata, commit timestamp, expire timestamp |
/// | 3       | offset, leader epoch, metadata, commit timestamp |
///
/// Fields that a version does not carry are read back as `-1`.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetCommitValue {
    pub offset: i64,

    /// Epoch of the partition leader when the offset was consumed; `-1` when unknown.
    pub leader_epoch: i32,
    pub metadata: String,
    pub commit_timestamp: i64,

    /// Explicit retention deadline of the commit; `-1` when none was requested.
    pub expire_timestamp: i64,
}

impl Default for OffsetCommitValue {
    fn default() -> Self {
        Self {
            offset: 0,
            leader_epoch: -1,
            metadata: String::default(),
            commit_timestamp: 0,
            expire_timestamp: -1,
        }
    }
}

impl OffsetCommitValue {
    /// [`Self::commit_timestamp`] as a [`chrono::DateTime`].
    pub fn commit_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        crate::utils::chrono_datetime(self.commit_timestamp)
    }

    /// [`Self::expire_timestamp`] as a [`chrono::DateTime`], if one was requested.
    pub fn expire_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.expire_timestamp < 0 {
            return None;
        }
        crate::utils::chrono_datetime(self.expire_timestamp)
    }

    /// [`Self::commit_timestamp`] as a [`time::OffsetDateTime`].
    #[cfg(feature = "ts_time")]
    pub fn commit_offset_datetime(&self) -> Option<time::OffsetDateTime> {
        crate::utils::time_offset_datetime(self.commit_timestamp)
    }
}

impl Message for OffsetCommitValue {
    const NAME: &'static str = "OffsetCommitValue";

    fn write<B: BufMut>(&self, buf: &mut B, version: i16) -> Result<(), CoordinatorRecordError> {
        buf.put_i64(self.offset);
        if version >= 3 {
            buf.put_i32(self.leader_epoch);
        }
        put_str(buf, &self.metadata)?;
        buf.put_i64(self.commit_timestamp);
        if version == 1 {
            buf.put_i64(self.expire_timestamp);
        }
        Ok(())
    }

    fn read(parser: &mut BytesParser, version: i16) -> Result<Self, CoordinatorRecordError> {
        let offset = parse_i64(parser)?;

        let leader_epoch = if version >= 3 {
            parse_i32(parser)?
        } else {
            -1
        };

        let metadata = parse_str(parser)?;

        let commit_timestamp = parse_i64(parser)?;

        let expire_timestamp = if version == 1 {
            parse_i64(parser)?
        } else {
            -1
        };

        Ok(Self {
            offset,
            leader_epoch,
            metadata,
            commit_timestamp,
            expire_timestamp,
        })
    }
}
