use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is propagated as-is.
const MAX_LEN: usize = 128;

/// Correlation id attached to every request span and echoed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh, time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Reuse a caller-supplied id if it is short printable ASCII, else generate one.
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RequestId {
    type Err = InvalidRequestId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_LEN
            && s.bytes().all(|b| b.is_ascii_graphic());
        if valid { Ok(Self(s.to_string())) } else { Err(InvalidRequestId) }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRequestId;

impl fmt::Display for InvalidRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request id must be 1-128 printable ASCII characters")
    }
}

impl std::error::Error for InvalidRequestId {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_uuid_v7() {
        let id = RequestId::generate();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
        assert_ne!(id, RequestId::generate());
    }

    #[test]
    fn caller_ids_are_kept_when_sane() {
        assert_eq!(RequestId::from_header(Some("abc-123")).as_str(), "abc-123");
    }

    #[test]
    fn bad_caller_ids_are_replaced() {
        let long = "x".repeat(MAX_LEN + 1);
        for bad in [Some(""), Some("has space"), Some(long.as_str()), None] {
            let id = RequestId::from_header(bad);
            assert!(Uuid::parse_str(id.as_str()).is_ok(), "{bad:?} was kept");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: RequestId = "req-1".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"req-1\"");
    }
}
