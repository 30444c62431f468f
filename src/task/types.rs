//! Task types and remote ↔ local translation.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::StoreError;

/// Opaque identifier assigned by the remote store.
///
/// Kept as a string regardless of the column type so that both `uuid` and
/// `bigint` primary keys round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an id as returned by the store.
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// The id as sent in `id=eq.` filters.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty or whitespace-only id, which no stored row can have.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => TaskId(s),
            RawId::Int(n) => TaskId(n.to_string()),
        })
    }
}

/// A task as held in the in-memory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A row of the remote `tasks` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbTask {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
}

/// Insert payload for a new row. `id` and `created_at` are left to the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewDbTask<'a> {
    pub title: &'a str,
    pub completed: bool,
}

impl<'a> NewDbTask<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            completed: false,
        }
    }
}

impl TryFrom<DbTask> for Task {
    type Error = StoreError;

    fn try_from(row: DbTask) -> Result<Self, Self::Error> {
        if row.id.is_empty() {
            return Err(StoreError::Decode("record has an empty id".to_string()));
        }

        let created_at = parse_timestamp_millis(&row.created_at).ok_or_else(|| {
            StoreError::Decode(format!(
                "record {} has an unreadable created_at: {:?}",
                row.id, row.created_at
            ))
        })?;

        Ok(Task {
            id: row.id,
            title: row.title,
            completed: row.completed,
            created_at,
        })
    }
}

/// Parse a Postgres timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 (`timestamptz` as PostgREST renders it), Postgres text
/// output with a space separator and short `+00` offsets, and offset-less
/// `timestamp` values, which are read as UTC.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    let normalized = raw.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(dt.timestamp_millis());
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, created_at: &str) -> DbTask {
        DbTask {
            id: TaskId::new(id),
            title: "Buy milk".to_string(),
            completed: false,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_row_translates_field_by_field() {
        let task = Task::try_from(row("a1", "2024-03-01T12:00:00.250+00:00")).unwrap();
        assert_eq!(task.id, TaskId::new("a1"));
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.created_at, 1_709_294_400_250);
    }

    #[test]
    fn test_timestamp_variants() {
        let expected = 1_709_294_400_000;
        assert_eq!(parse_timestamp_millis("2024-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp_millis("2024-03-01T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp_millis("2024-03-01 12:00:00+00"), Some(expected));
        assert_eq!(parse_timestamp_millis("2024-03-01T12:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp_millis("2024-03-01T12:00:00.123456"),
            Some(expected + 123)
        );
        assert_eq!(parse_timestamp_millis("yesterday"), None);
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let err = Task::try_from(row("  ", "2024-03-01T12:00:00Z")).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn test_unreadable_timestamp_is_rejected() {
        let err = Task::try_from(row("a1", "not a date")).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn test_integer_ids_are_kept_as_text() {
        let json = r#"{"id": 42, "title": "t", "completed": true, "created_at": "2024-03-01T12:00:00Z"}"#;
        let row: DbTask = serde_json::from_str(json).unwrap();
        assert_eq!(row.id.as_str(), "42");
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task::try_from(row("a1", "2024-03-01T12:00:00Z")).unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["createdAt"], 1_709_294_400_000i64);
        assert_eq!(value["id"], "a1");
    }
}
