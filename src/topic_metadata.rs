use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::errors::CoordinatorRecordError;

/// Metadata of a topic some members of a consumer group are subscribed to.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicMetadata {
    id: Uuid,
    name: String,
    num_partitions: i32,
    partition_racks: HashMap<i32, HashSet<String>>,
}

impl TopicMetadata {
    /// Validates and freezes the metadata of a topic.
    ///
    /// `partition_racks` maps a partition to the racks of its replicas. It may be empty
    /// when rack placement is not known, even if the topic has partitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorRecordError::InvalidTopicMetadata`] if the identifier is nil,
    /// the name empty or the partition count negative.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        num_partitions: i32,
        partition_racks: HashMap<i32, HashSet<String>>,
    ) -> Result<Self, CoordinatorRecordError> {
        let name = name.into();

        let invalid = |reason: &str| CoordinatorRecordError::InvalidTopicMetadata {
            topic: name.clone(),
            reason: reason.to_string(),
        };
        if id.is_nil() {
            return Err(invalid("topic id cannot be nil"));
        }
        if name.is_empty() {
            return Err(invalid("topic name cannot be empty"));
        }
        if num_partitions < 0 {
            return Err(invalid("number of partitions cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            num_partitions,
            partition_racks,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_partitions(&self) -> i32 {
        self.num_partitions
    }

    pub fn partition_racks(&self) -> &HashMap<i32, HashSet<String>> {
        &self.partition_racks
    }
}
