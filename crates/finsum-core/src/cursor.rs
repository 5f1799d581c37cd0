//! Change cursor: the opaque checkpoint into the external change feed.
//!
//! The wire format is the five-field semicolon-delimited token used by
//! the record store, in order: format version, change scope kind, scope
//! id, timestamp in ticks, and change sequence number. Timestamps are
//! .NET-style ticks (100 ns units since 0001-01-01 UTC) so tokens stay
//! interchangeable with the upstream store across runs.

use crate::error::{FinsumError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per millisecond (one tick is 100 ns).
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Scope kind for a list-level change cursor. Other kinds (content
/// database, site collection, site) exist upstream but this system only
/// ever checkpoints per list.
pub const SCOPE_KIND_LIST: u32 = 3;

/// Opaque checkpoint marking how much of a change feed has been consumed.
///
/// Cursors for the same `scope_id` are totally ordered by
/// `(timestamp_ticks, sequence_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCursor {
    pub format_version: u32,
    pub scope_kind: u32,
    pub scope_id: String,
    pub timestamp_ticks: i64,
    pub sequence_number: i64,
}

impl ChangeCursor {
    /// Parse the five-field delimited token.
    ///
    /// Fails with `MalformedCursor` unless the string has exactly five
    /// `;`-delimited fields with integer version, scope kind, timestamp,
    /// and sequence.
    pub fn decode(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split(';').collect();
        if fields.len() != 5 {
            return Err(FinsumError::MalformedCursor(format!(
                "expected 5 fields, got {}: {:?}",
                fields.len(),
                value
            )));
        }

        let format_version: u32 = fields[0].parse().map_err(|_| {
            FinsumError::MalformedCursor(format!("non-integer version field: {:?}", fields[0]))
        })?;
        let scope_kind: u32 = fields[1].parse().map_err(|_| {
            FinsumError::MalformedCursor(format!("non-integer scope kind field: {:?}", fields[1]))
        })?;
        let timestamp_ticks: i64 = fields[3].parse().map_err(|_| {
            FinsumError::MalformedCursor(format!("non-integer timestamp field: {:?}", fields[3]))
        })?;
        let sequence_number: i64 = fields[4].parse().map_err(|_| {
            FinsumError::MalformedCursor(format!("non-integer sequence field: {:?}", fields[4]))
        })?;

        Ok(Self {
            format_version,
            scope_kind,
            scope_id: fields[2].to_string(),
            timestamp_ticks,
            sequence_number,
        })
    }

    /// Serialize back to the delimited token. Exact inverse of [`decode`]
    /// for all valid cursors.
    ///
    /// [`decode`]: ChangeCursor::decode
    pub fn encode(&self) -> String {
        format!(
            "{};{};{};{};{}",
            self.format_version,
            self.scope_kind,
            self.scope_id,
            self.timestamp_ticks,
            self.sequence_number
        )
    }

    /// Copy of this cursor moved `epsilon_ms` milliseconds forward.
    ///
    /// Used to step one tick past the last consumed change so it is
    /// excluded from the next fetch.
    pub fn advance(&self, epsilon_ms: i64) -> Self {
        Self {
            timestamp_ticks: self.timestamp_ticks + epsilon_ms * TICKS_PER_MILLISECOND,
            ..self.clone()
        }
    }

    /// Synthesize a first-run cursor at `now - lookback` for a scope with
    /// no stored checkpoint. Sequence starts at -1, below any real change.
    pub fn fallback(scope_id: &str, lookback: Duration, now: DateTime<Utc>) -> Self {
        Self {
            format_version: 1,
            scope_kind: SCOPE_KIND_LIST,
            scope_id: scope_id.to_string(),
            timestamp_ticks: ticks_from_datetime(now - lookback),
            sequence_number: -1,
        }
    }
}

impl fmt::Display for ChangeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Convert a UTC datetime to ticks.
pub fn ticks_from_datetime(dt: DateTime<Utc>) -> i64 {
    UNIX_EPOCH_TICKS + dt.timestamp_micros() * 10
}

/// Convert ticks back to a UTC datetime.
pub fn datetime_from_ticks(ticks: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros((ticks - UNIX_EPOCH_TICKS) / 10)
        .ok_or_else(|| FinsumError::MalformedCursor(format!("timestamp out of range: {}", ticks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ChangeCursor {
        ChangeCursor {
            format_version: 1,
            scope_kind: SCOPE_KIND_LIST,
            scope_id: "7e6e9302-0f3b-4355-9c5d-2a401d15d832".into(),
            timestamp_ticks: 636_972_076_425_190_000,
            sequence_number: 4,
        }
    }

    #[test]
    fn round_trip() {
        let cursor = sample();
        assert_eq!(ChangeCursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn decode_known_token() {
        let cursor =
            ChangeCursor::decode("1;3;7e6e9302-0f3b-4355-9c5d-2a401d15d832;636972076425190000;-1")
                .unwrap();
        assert_eq!(cursor.format_version, 1);
        assert_eq!(cursor.scope_kind, 3);
        assert_eq!(cursor.scope_id, "7e6e9302-0f3b-4355-9c5d-2a401d15d832");
        assert_eq!(cursor.timestamp_ticks, 636_972_076_425_190_000);
        assert_eq!(cursor.sequence_number, -1);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(matches!(
            ChangeCursor::decode("1;3;abc;123"),
            Err(FinsumError::MalformedCursor(_))
        ));
        assert!(matches!(
            ChangeCursor::decode("1;3;abc;123;4;extra"),
            Err(FinsumError::MalformedCursor(_))
        ));
        assert!(matches!(
            ChangeCursor::decode(""),
            Err(FinsumError::MalformedCursor(_))
        ));
    }

    #[test]
    fn rejects_non_integer_fields() {
        assert!(matches!(
            ChangeCursor::decode("1;3;abc;not-a-number;4"),
            Err(FinsumError::MalformedCursor(_))
        ));
        assert!(matches!(
            ChangeCursor::decode("1;3;abc;123;seq"),
            Err(FinsumError::MalformedCursor(_))
        ));
        assert!(matches!(
            ChangeCursor::decode("v1;3;abc;123;4"),
            Err(FinsumError::MalformedCursor(_))
        ));
    }

    #[test]
    fn advance_moves_only_the_timestamp() {
        let cursor = sample();
        let advanced = cursor.advance(1);
        assert_eq!(
            advanced.timestamp_ticks,
            cursor.timestamp_ticks + TICKS_PER_MILLISECOND
        );
        assert_eq!(advanced.scope_id, cursor.scope_id);
        assert_eq!(advanced.sequence_number, cursor.sequence_number);
        assert_eq!(advanced.format_version, cursor.format_version);
    }

    #[test]
    fn fallback_token_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cursor = ChangeCursor::fallback("list-a", Duration::minutes(2), now);
        let expected_ticks = ticks_from_datetime(now - Duration::minutes(2));
        assert_eq!(
            cursor.encode(),
            format!("1;3;list-a;{};-1", expected_ticks)
        );
    }

    #[test]
    fn ticks_datetime_round_trip() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
        assert_eq!(datetime_from_ticks(ticks_from_datetime(now)).unwrap(), now);
    }
}
