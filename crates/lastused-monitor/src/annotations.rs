//! Persisted usage state layout
//!
//! Usage state is stored as three string annotations on each topic resource:
//!
//! | Key | Value |
//! |-----|-------|
//! | `dalelane.co.uk/lastused-bytesin` | decimal bytes-in counter |
//! | `dalelane.co.uk/lastused-bytesout` | decimal bytes-out counter |
//! | `dalelane.co.uk/lastused-timestamp` | epoch milliseconds |

use crate::MonitorError;
use lastused_domain::{Timestamp, TopicResource, UsageState};
use std::collections::BTreeMap;

/// Prefix shared by all usage annotation keys
pub const ANNOTATION_PREFIX: &str = "dalelane.co.uk/lastused-";

/// Bytes-in counter annotation
pub const BYTES_IN_KEY: &str = "dalelane.co.uk/lastused-bytesin";

/// Bytes-out counter annotation
pub const BYTES_OUT_KEY: &str = "dalelane.co.uk/lastused-bytesout";

/// Timestamp annotation
pub const TIMESTAMP_KEY: &str = "dalelane.co.uk/lastused-timestamp";

/// Annotations holding `state`
pub fn encode(state: &UsageState) -> BTreeMap<String, String> {
    BTreeMap::from([
        (BYTES_IN_KEY.to_string(), state.last_bytes_in.to_string()),
        (BYTES_OUT_KEY.to_string(), state.last_bytes_out.to_string()),
        (TIMESTAMP_KEY.to_string(), state.timestamp.as_millis().to_string()),
    ])
}

/// Read the usage state persisted on `resource`
///
/// Returns `Ok(None)` when any of the three annotations is missing, meaning
/// the topic still needs bootstrapping.
///
/// # Errors
///
/// Returns [`MonitorError::MalformedState`] if all three are present but one
/// does not parse.
pub fn decode(topic_name: &str, resource: &TopicResource) -> Result<Option<UsageState>, MonitorError> {
    let (Some(bytes_in), Some(bytes_out), Some(timestamp)) = (
        resource.annotation(BYTES_IN_KEY),
        resource.annotation(BYTES_OUT_KEY),
        resource.annotation(TIMESTAMP_KEY),
    ) else {
        return Ok(None);
    };

    let malformed = |key: &str, value: &str| MonitorError::MalformedState {
        resource: resource.name.clone(),
        key: key.to_string(),
        value: value.to_string(),
    };

    let last_bytes_in = bytes_in
        .parse::<u64>()
        .map_err(|_| malformed(BYTES_IN_KEY, bytes_in))?;
    let last_bytes_out = bytes_out
        .parse::<u64>()
        .map_err(|_| malformed(BYTES_OUT_KEY, bytes_out))?;
    let timestamp =
        Timestamp::parse_millis(timestamp).map_err(|_| malformed(TIMESTAMP_KEY, timestamp))?;

    Ok(Some(UsageState::new(
        topic_name,
        last_bytes_in,
        last_bytes_out,
        timestamp,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(bytes_in: &str, bytes_out: &str, timestamp: &str) -> TopicResource {
        TopicResource::new("orders-cr")
            .with_topic_name("orders")
            .with_annotation(BYTES_IN_KEY, bytes_in)
            .with_annotation(BYTES_OUT_KEY, bytes_out)
            .with_annotation(TIMESTAMP_KEY, timestamp)
    }

    #[test]
    fn test_keys_share_prefix() {
        for key in [BYTES_IN_KEY, BYTES_OUT_KEY, TIMESTAMP_KEY] {
            assert!(key.starts_with(ANNOTATION_PREFIX));
        }
    }

    #[test]
    fn test_encode() {
        let state = UsageState::new("orders", 150, 200, Timestamp::from_nanos(1_700_000_000_123_456_789));
        let annotations = encode(&state);

        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[BYTES_IN_KEY], "150");
        assert_eq!(annotations[BYTES_OUT_KEY], "200");
        assert_eq!(annotations[TIMESTAMP_KEY], "1700000000123");
    }

    #[test]
    fn test_encode_bootstrap() {
        let annotations = encode(&UsageState::bootstrap("orders"));
        assert_eq!(annotations[BYTES_IN_KEY], "0");
        assert_eq!(annotations[BYTES_OUT_KEY], "0");
        assert_eq!(annotations[TIMESTAMP_KEY], "0");
    }

    #[test]
    fn test_decode_complete_record() {
        let state = decode("orders", &annotated("100", "200", "1700000000000"))
            .unwrap()
            .unwrap();
        assert_eq!(
            state,
            UsageState::new("orders", 100, 200, Timestamp::from_millis(1_700_000_000_000))
        );
    }

    #[test]
    fn test_decode_missing_annotations() {
        let bare = TopicResource::new("orders-cr").with_topic_name("orders");
        assert_eq!(decode("orders", &bare).unwrap(), None);

        let partial = TopicResource::new("orders-cr")
            .with_annotation(BYTES_IN_KEY, "100")
            .with_annotation(TIMESTAMP_KEY, "5");
        assert_eq!(decode("orders", &partial).unwrap(), None);
    }

    #[test]
    fn test_decode_malformed_is_fatal() {
        let result = decode("orders", &annotated("100", "lots", "1700000000000"));
        match result {
            Err(MonitorError::MalformedState { resource, key, value }) => {
                assert_eq!(resource, "orders-cr");
                assert_eq!(key, BYTES_OUT_KEY);
                assert_eq!(value, "lots");
            }
            other => panic!("Expected MalformedState, got {:?}", other),
        }

        assert!(decode("orders", &annotated("-1", "0", "0")).is_err());
        assert!(decode("orders", &annotated("1", "0", "2024-01-01")).is_err());
    }

    #[test]
    fn test_decode_padded_values_are_malformed() {
        for (bytes_in, bytes_out, timestamp) in [(" 5", "0", "0"), ("0", "5 ", "0"), ("0", "0", "\t1700000000000")] {
            let result = decode("orders", &annotated(bytes_in, bytes_out, timestamp));
            assert!(matches!(result, Err(MonitorError::MalformedState { .. })));
        }
    }

    #[test]
    fn test_decode_after_encode_truncates_to_millis() {
        let state = UsageState::new("orders", 1, 2, Timestamp::from_nanos(5_000_999_999));
        let mut resource = TopicResource::new("orders-cr");
        resource.annotations = Some(encode(&state));

        let decoded = decode("orders", &resource).unwrap().unwrap();
        assert_eq!(decoded.timestamp, Timestamp::from_millis(5_000));
    }
}
