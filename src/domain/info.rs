use chrono::{DateTime, Utc};
use serde::Serialize;

/// Custom serializer for Option<DateTime<Utc>> -> Option<i64>
fn serialize_timestamp<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match time {
        Some(t) => serializer.serialize_some(&t.timestamp()),
        None => serializer.serialize_none(),
    }
}

/// Counts and timestamp reported for an open branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub subkeys: usize,
    pub values: usize,

    #[serde(serialize_with = "serialize_timestamp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_write: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn last_write_serializes_as_unix_seconds() {
        let info = KeyInfo {
            subkeys: 1,
            values: 2,
            last_write: Utc.timestamp_opt(1_700_000_000, 0).single(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"subkeys":1,"values":2,"last_write":1700000000}"#);

        let bare = KeyInfo { last_write: None, ..info };
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"subkeys":1,"values":2}"#);
    }
}
