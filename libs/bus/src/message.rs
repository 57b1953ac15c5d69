//! Bus message record

/// One record on the bus. The value is carried verbatim (for order intake
/// it is the raw HTTP request body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    /// Partition key; records with equal keys are totally ordered.
    pub key: String,
    pub value: String,
    /// Publish time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl Message {
    pub fn new(
        topic: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            value: value.into(),
            timestamp_ms,
        }
    }
}
