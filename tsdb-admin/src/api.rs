//! Request and response types exchanged with the transport layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsdb_core::{Label, Sample};

/// A series with its samples, as received on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

/// One message of a remote-write stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    #[serde(default)]
    pub timeseries: Vec<TimeSeries>,
}

/// Kind of a wire label matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatcherType {
    Eq,
    Neq,
    Re,
    Nre,
    /// Any value this service does not know
    #[serde(other)]
    Unknown,
}

/// A label predicate as received on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherSpec {
    #[serde(rename = "type")]
    pub kind: MatcherType,
    pub name: String,
    pub value: String,
}

impl MatcherSpec {
    pub fn new<N: Into<String>, V: Into<String>>(kind: MatcherType, name: N, value: V) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub skip_head: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteSeriesRequest {
    #[serde(default)]
    pub min_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub matchers: Vec<MatcherSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_matcher_type_deserializes() {
        let spec: MatcherSpec =
            serde_json::from_value(json!({"type": "FUZZY", "name": "job", "value": "api"}))
                .unwrap();
        assert_eq!(spec.kind, MatcherType::Unknown);

        let spec: MatcherSpec =
            serde_json::from_value(json!({"type": "NRE", "name": "job", "value": "a.*"})).unwrap();
        assert_eq!(spec.kind, MatcherType::Nre);
    }

    #[test]
    fn test_write_request_shape() {
        let req: WriteRequest = serde_json::from_value(json!({
            "timeseries": [{
                "labels": [{"name": "__name__", "value": "up"}],
                "samples": [{"timestamp": 1000, "value": 1.0}]
            }]
        }))
        .unwrap();
        assert_eq!(req.timeseries.len(), 1);
        assert_eq!(req.timeseries[0].samples[0], Sample::new(1000, 1.0));
    }

    #[test]
    fn test_delete_request_times_are_optional() {
        let req: DeleteSeriesRequest = serde_json::from_value(json!({
            "max_time": "2024-01-01T00:00:00Z",
            "matchers": []
        }))
        .unwrap();
        assert!(req.min_time.is_none());
        assert!(req.max_time.is_some());
    }
}
