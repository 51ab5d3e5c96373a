use bytes_parser::BytesParserError;
use thiserror::Error;

#[derive(Error, Debug, Eq, PartialEq)]
pub enum CoordinatorRecordError {
    /// A classic group snapshot handed to the record factory is incomplete.
    ///
    /// This is a programming error in the caller: the enclosing group transition
    /// must fail, and nothing is written to the log.
    #[error("Illegal state for member {member_id} of group {group_id}: {reason}")]
    IllegalGroupState {
        group_id: String,
        member_id: String,
        reason: String,
    },

    /// Topic metadata handed to [`TopicMetadata::new`](crate::TopicMetadata::new) is not valid.
    #[error("Invalid metadata for topic '{topic}': {reason}")]
    InvalidTopicMetadata { topic: String, reason: String },

    #[error("Cannot parse record without its key: unable to determine record type")]
    MessageKeyMissing,

    #[error("Failure while parsing bytes: {0}")]
    ByteParsingError(#[source] BytesParserError),

    #[error("Encountered a not (yet) supported key version: {0}")]
    UnsupportedKeyVersion(i16),

    #[error("Encountered a not (yet) supported value version for {record}: {version}")]
    UnsupportedValueVersion { record: &'static str, version: i16 },

    #[error("Cannot store a {value} under a key of a {key}")]
    MismatchedValue { key: &'static str, value: &'static str },

    #[error("Encountered a malformed length or varint: {0}")]
    InvalidLength(i64),

    #[error("Encountered an unknown member state: {0}")]
    UnknownMemberState(i8),

    #[error("Unknown metadata version: {0}")]
    UnknownMetadataVersion(String),
}
