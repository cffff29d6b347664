//! Decoding of the IP range feeds served by the configured endpoints.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::DecodeError;

/// Key identifying the CloudFront tooling feed.
pub const REGIONAL_EDGE_KEY: &str = "CLOUDFRONT_REGIONAL_EDGE_IP_LIST";

/// Key identifying the AWS IP ranges feed.
pub const PREFIXES_KEY: &str = "prefixes";

/// Service name of CloudFront records in the AWS IP ranges feed.
pub const CLOUDFRONT_SERVICE: &str = "CLOUDFRONT";

/// A decoded feed, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeFeed {
    /// CloudFront tooling feed: named lists of prefixes, e.g.
    /// `{"CLOUDFRONT_GLOBAL_IP_LIST": [..], "CLOUDFRONT_REGIONAL_EDGE_IP_LIST": [..]}`.
    ///
    /// Holds the whole document since every list in it contributes.
    RegionalEdgeLists(Map<String, Value>),

    /// AWS IP ranges feed: the value of its `prefixes` key.
    PrefixRecords(Value),
}

#[derive(Debug, Deserialize)]
struct PrefixRecord {
    service: Option<String>,
    ip_prefix: Option<String>,
}

impl RangeFeed {
    /// Classifies a decoded document, returning `None` if it matches neither known shape.
    pub fn classify(mut doc: Map<String, Value>) -> Option<Self> {
        if is_set(&doc, REGIONAL_EDGE_KEY) {
            Some(Self::RegionalEdgeLists(doc))
        } else if is_set(&doc, PREFIXES_KEY) {
            doc.remove(PREFIXES_KEY).map(Self::PrefixRecords)
        } else {
            None
        }
    }

    /// Extracts IP prefixes in document order.
    pub fn into_prefixes(self) -> Vec<String> {
        match self {
            Self::RegionalEdgeLists(doc) => {
                let mut prefixes = Vec::new();
                for val in doc.into_iter().map(|(_, val)| val) {
                    flatten_into(val, &mut prefixes);
                }
                prefixes
            }

            Self::PrefixRecords(Value::Array(records)) => records
                .into_iter()
                .filter_map(|record| serde_json::from_value::<PrefixRecord>(record).ok())
                .filter(|record| record.service.as_deref() == Some(CLOUDFRONT_SERVICE))
                .filter_map(|record| record.ip_prefix)
                .filter(|prefix| !prefix.is_empty())
                .collect(),

            Self::PrefixRecords(_) => Vec::new(),
        }
    }
}

/// Decodes a response body into a JSON object.
pub fn decode(body: &str) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(DecodeError::NotAMapping),
    }
}

fn is_set(doc: &Map<String, Value>, key: &str) -> bool {
    doc.get(key).is_some_and(|val| !val.is_null())
}

fn flatten_into(val: Value, out: &mut Vec<String>) {
    match val {
        Value::String(prefix) => out.push(prefix),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(map) => {
            for (_, item) in map {
                flatten_into(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
