// src/discovery/endpoints.rs

/// Splits a comma-separated list, keeping input order. Entries are trimmed and empty
/// ones dropped; nothing else is validated, so malformed URLs pass through verbatim.
pub fn split_endpoints(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_endpoints(endpoints: &[String]) -> String {
    endpoints.join(",")
}

/// Serde adapter: `Vec<String>` in memory, a comma-separated string on the wire.
pub mod comma_separated {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::join_endpoints(values))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(super::split_endpoints(&raw))
    }
}
