//! Deterministic ordering of collections before they are encoded.
//!
//! The same logical state must always produce the same bytes: re-encoding an unchanged
//! assignment must not append a record that differs only by the iteration order of a
//! hash map. Every collection reaching a record goes through here first.

use std::collections::{HashMap, HashSet};

use crate::consumer_group::{PartitionMetadata, SubscribedTopicMetadata, TopicPartitions};
use crate::topic_metadata::TopicMetadata;

/// Strings (topic names, rack ids) sorted lexicographically, without duplicates.
pub fn sorted_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = values.into_iter().map(|value| value.as_ref().to_string()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Partitions per topic, ordered by topic identifier, with each partition list ascending.
pub fn topic_partitions<S>(assignment: &HashMap<uuid::Uuid, HashSet<i32>, S>) -> Vec<TopicPartitions> {
    let mut topic_partitions: Vec<TopicPartitions> = assignment
        .iter()
        .map(|(topic_id, partitions)| {
            let mut partitions: Vec<i32> = partitions.iter().copied().collect();
            partitions.sort_unstable();
            TopicPartitions {
                topic_id: *topic_id,
                partitions,
            }
        })
        .collect();
    topic_partitions.sort_unstable_by_key(|tp| tp.topic_id);
    topic_partitions
}

/// Rack placement of the partitions of a topic, ordered by partition, racks sorted.
///
/// Empty when no rack is known for any partition: readers tell this apart from a topic
/// without partitions through [`TopicMetadata::num_partitions`].
pub fn partition_metadata(topic: &TopicMetadata) -> Vec<PartitionMetadata> {
    let mut partition_metadata: Vec<PartitionMetadata> = topic
        .partition_racks()
        .iter()
        .map(|(partition, racks)| PartitionMetadata {
            partition: *partition,
            racks: sorted_strings(racks),
        })
        .collect();
    partition_metadata.sort_unstable_by_key(|pm| pm.partition);
    partition_metadata
}

/// Metadata of every subscribed topic, ordered by topic identifier.
pub fn subscribed_topics<'a, I>(topics: I) -> Vec<SubscribedTopicMetadata>
where
    I: IntoIterator<Item = &'a TopicMetadata>,
{
    let mut subscribed: Vec<SubscribedTopicMetadata> = topics
        .into_iter()
        .map(|topic| SubscribedTopicMetadata {
            topic_id: topic.id(),
            topic_name: topic.name().to_string(),
            num_partitions: topic.num_partitions(),
            partition_metadata: partition_metadata(topic),
        })
        .collect();
    subscribed.sort_unstable_by_key(|topic| topic.topic_id);
    subscribed
}
