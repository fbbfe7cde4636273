//! Topic flavor module - which operator owns the KafkaTopic resources

use std::fmt;

/// Operator flavor whose KafkaTopic custom resources are monitored
///
/// Both flavors expose the same resource shape; they only differ in API
/// group and in the prefix used for labels and Prometheus metric labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TopicFlavor {
    /// Strimzi (`kafka.strimzi.io`)
    #[default]
    Strimzi,

    /// IBM Event Streams (`eventstreams.ibm.com`)
    EventStreams,
}

impl TopicFlavor {
    /// Parse a mode setting
    ///
    /// `eventstreams` (any case) selects Event Streams; every other value
    /// falls back to Strimzi.
    ///
    /// # Examples
    ///
    /// ```
    /// use lastused_domain::TopicFlavor;
    ///
    /// assert_eq!(TopicFlavor::from_mode("EventStreams"), TopicFlavor::EventStreams);
    /// assert_eq!(TopicFlavor::from_mode("strimzi"), TopicFlavor::Strimzi);
    /// assert_eq!(TopicFlavor::from_mode("anything"), TopicFlavor::Strimzi);
    /// ```
    pub fn from_mode(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("eventstreams") {
            TopicFlavor::EventStreams
        } else {
            TopicFlavor::Strimzi
        }
    }

    /// Mode name as accepted by [`TopicFlavor::from_mode`]
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicFlavor::Strimzi => "strimzi",
            TopicFlavor::EventStreams => "eventstreams",
        }
    }

    /// API group of the KafkaTopic custom resource
    pub fn api_group(&self) -> &'static str {
        match self {
            TopicFlavor::Strimzi => "kafka.strimzi.io",
            TopicFlavor::EventStreams => "eventstreams.ibm.com",
        }
    }

    /// API version of the KafkaTopic custom resource
    pub fn api_version(&self) -> &'static str {
        "v1beta2"
    }

    /// Plural resource name used in API paths
    pub fn plural(&self) -> &'static str {
        "kafkatopics"
    }

    /// Prefix shared by the flavor's labels
    pub fn label_prefix(&self) -> &'static str {
        match self {
            TopicFlavor::Strimzi => "strimzi.io",
            TopicFlavor::EventStreams => "eventstreams.ibm.com",
        }
    }

    /// Label carrying the owning cluster name on each resource
    pub fn cluster_label(&self) -> String {
        format!("{}/cluster", self.label_prefix())
    }

    /// Prometheus metric label carrying the owning cluster name
    pub fn metrics_cluster_label(&self) -> &'static str {
        match self {
            TopicFlavor::Strimzi => "strimzi_io_cluster",
            TopicFlavor::EventStreams => "eventstreams_ibm_com_cluster",
        }
    }
}

impl fmt::Display for TopicFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
