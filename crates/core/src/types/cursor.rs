use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Far-future sentinel so the first fetch returns the newest items.
pub const INITIAL_CURSOR: &str = "2100-01-01T00:00:00Z";

#[derive(Debug, Clone)]
pub struct Cursor {
    raw: String,
    at: DateTime<Utc>,
}

impl Cursor {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let at = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| CoreError::InvalidCursor(trimmed.to_string()))?;
        Ok(Self {
            raw: trimmed.to_string(),
            at,
        })
    }

    pub fn initial() -> Self {
        Self::parse(INITIAL_CURSOR).unwrap_or_else(|_| Self {
            raw: INITIAL_CURSOR.to_string(),
            at: DateTime::<Utc>::MAX_UTC,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::initial()
    }
}

impl TryFrom<&str> for Cursor {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Cursor {}

impl std::hash::Hash for Cursor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Cursor::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_cursor_is_far_future() {
        let initial = Cursor::initial();
        assert_eq!(initial.as_str(), INITIAL_CURSOR);
        let recent = Cursor::parse("2024-05-01T10:00:00Z").unwrap();
        assert!(recent < initial);
    }

    #[test]
    fn parse_keeps_raw_token() {
        let cursor = Cursor::parse(" 2024-05-01T10:00:00.123+02:00 ").unwrap();
        assert_eq!(cursor.as_str(), "2024-05-01T10:00:00.123+02:00");
        assert_eq!(cursor.to_string(), "2024-05-01T10:00:00.123+02:00");
    }

    #[test]
    fn reject_non_timestamp() {
        assert!(Cursor::parse("page-2").is_err());
        assert!(Cursor::parse("").is_err());
    }

    #[test]
    fn ordering_follows_time_not_text() {
        let a = Cursor::parse("2024-05-01T10:00:00+02:00").unwrap();
        let b = Cursor::parse("2024-05-01T09:00:00Z").unwrap();
        assert!(a < b);
    }
}
