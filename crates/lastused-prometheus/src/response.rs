//! Instant query response parsing
//!
//! Prometheus answers `/api/v1/query` with
//!
//! ```json
//! {"status": "success",
//!  "data": {"resultType": "vector",
//!           "result": [{"metric": {"topic": "orders", ...},
//!                       "value": [1700000000.123, "4096"]}]}}
//! ```
//!
//! Only series whose cluster and namespace labels match the monitored scope
//! are turned into samples.

use crate::{PrometheusError, SampleScope};
use lastused_domain::{MetricSample, Timestamp};
use serde_json::Value;

/// Parse a query response body into samples for `scope`
///
/// # Errors
///
/// Fails when the body is not JSON, when Prometheus reports an error, when
/// `data.result` is not an array, or when a matching series carries an
/// unreadable value pair.
pub fn parse_response(body: &str, scope: &SampleScope) -> Result<Vec<MetricSample>, PrometheusError> {
    let root: Value = serde_json::from_str(body)?;

    if root.get("status").and_then(Value::as_str) == Some("error") {
        let error_type = root.get("errorType").and_then(Value::as_str).unwrap_or("unknown");
        let error = root.get("error").and_then(Value::as_str).unwrap_or("no details");
        return Err(PrometheusError::Query(format!("{}: {}", error_type, error)));
    }

    let results = root
        .pointer("/data/result")
        .and_then(Value::as_array)
        .ok_or_else(|| PrometheusError::InvalidResponse("Unexpected results".to_string()))?;

    let mut samples = Vec::new();
    for result in results {
        let metric = result.get("metric").unwrap_or(&Value::Null);
        if !scope.matches(|label| metric.get(label).and_then(Value::as_str)) {
            continue;
        }

        let Some(topic) = metric.get("topic").and_then(Value::as_str) else {
            tracing::debug!("skipping series without topic label: {}", metric);
            continue;
        };

        let (timestamp, total_bytes) = parse_value(result.get("value"))
            .map_err(|e| PrometheusError::InvalidResponse(format!("topic {}: {}", topic, e)))?;

        let sample = MetricSample::new(topic, timestamp, total_bytes);
        tracing::debug!("prometheus data {:?}", sample);
        samples.push(sample);
    }

    Ok(samples)
}

/// Read a `[<unix seconds>, "<value>"]` pair
fn parse_value(value: Option<&Value>) -> Result<(Timestamp, u64), String> {
    let pair = value
        .and_then(Value::as_array)
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| "missing [timestamp, value] pair".to_string())?;

    let seconds = match &pair[0] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("invalid sample timestamp {}", pair[0]))?;

    let counter = match &pair[1] {
        Value::String(s) => parse_counter(s),
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(float_counter)),
        _ => None,
    }
    .ok_or_else(|| format!("invalid sample value {}", pair[1]))?;

    Ok((Timestamp::from_fractional_secs(seconds), counter))
}

/// Counters are rendered as integers until they grow large enough for
/// Prometheus to switch to exponent notation (`"1.2345e+10"`).
fn parse_counter(raw: &str) -> Option<u64> {
    raw.parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(float_counter))
}

fn float_counter(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}
