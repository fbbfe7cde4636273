//! Topic resource module - the store's view of one KafkaTopic

use std::collections::BTreeMap;

/// A topic resource as listed from the store
///
/// Only the fields the reconciliation engine reads are kept: the resource
/// identifier, the logical topic name reported by the operator, the labels
/// and the annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicResource {
    /// Resource identifier in the store (`metadata.name`)
    pub name: String,

    /// Logical Kafka topic name (`status.topicName`), absent until the
    /// operator has reconciled the resource
    pub topic_name: Option<String>,

    /// Resource labels
    pub labels: BTreeMap<String, String>,

    /// Resource annotations, absent when the resource has none at all
    pub annotations: Option<BTreeMap<String, String>>,
}

impl TopicResource {
    /// Create a resource with a name and no metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the logical topic name
    pub fn with_topic_name(mut self, topic_name: impl Into<String>) -> Self {
        self.topic_name = Some(topic_name.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a label value
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Look up an annotation value
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let topic = TopicResource::new("orders-cr")
            .with_topic_name("orders")
            .with_label("strimzi.io/cluster", "prod")
            .with_annotation("note", "hello");

        assert_eq!(topic.name, "orders-cr");
        assert_eq!(topic.topic_name.as_deref(), Some("orders"));
        assert_eq!(topic.label("strimzi.io/cluster"), Some("prod"));
        assert_eq!(topic.annotation("note"), Some("hello"));
    }

    #[test]
    fn test_missing_annotations() {
        let topic = TopicResource::new("bare");
        assert!(topic.annotations.is_none());
        assert_eq!(topic.annotation("anything"), None);
        assert_eq!(topic.label("anything"), None);
    }
}
