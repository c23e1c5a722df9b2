//! Firestore Timestamp type and its tagged wire encoding
//!
//! The bridge can only carry primitives, strings and nested mappings, so
//! timestamps travel as tagged strings of the form `__DATE(<epoch-ms>)`.
//! The native plugin only recognises that exact prefix.

use crate::error::FirestoreError;
use chrono::{DateTime, Utc};

/// Prefix of a tagged timestamp string
pub const DATE_PREFIX: &str = "__DATE(";

/// Closing marker of a tagged timestamp string
pub const DATE_SUFFIX: &str = ")";

/// Smallest representable seconds value, `0001-01-01T00:00:00Z`
pub const MIN_SECONDS: i64 = -62_135_596_800;

/// Largest representable seconds value, `9999-12-31T23:59:59Z`
pub const MAX_SECONDS: i64 = 253_402_300_799;

/// Firestore timestamp
///
/// Always within `0001-01-01` to `9999-12-31` UTC, the range Firestore
/// accepts. Every constructor enforces it, so millisecond and `chrono`
/// conversions never overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: i32,
}

impl Timestamp {
    /// Create a new timestamp
    pub fn new(seconds: i64, nanoseconds: i32) -> Result<Self, FirestoreError> {
        if !(0..1_000_000_000).contains(&nanoseconds) {
            return Err(FirestoreError::InvalidArgument(format!(
                "nanoseconds must be in range [0, 999999999], got {}",
                nanoseconds
            )));
        }
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(FirestoreError::InvalidArgument(format!(
                "seconds must be in range [{}, {}], got {}",
                MIN_SECONDS, MAX_SECONDS, seconds
            )));
        }

        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Get current timestamp
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp(),
            nanoseconds: now.timestamp_subsec_nanos() as i32,
        }
    }

    /// Seconds since the Unix epoch
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Sub-second part in nanoseconds
    pub fn nanoseconds(&self) -> i32 {
        self.nanoseconds
    }

    /// Create from milliseconds since the Unix epoch
    pub fn from_millis(millis: i64) -> Result<Self, FirestoreError> {
        Self::new(
            millis.div_euclid(1_000),
            (millis.rem_euclid(1_000) * 1_000_000) as i32,
        )
    }

    /// Milliseconds since the Unix epoch, truncating sub-millisecond precision
    pub fn to_millis(&self) -> i64 {
        self.seconds * 1_000 + i64::from(self.nanoseconds / 1_000_000)
    }

    /// Convert from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, FirestoreError> {
        Self::new(dt.timestamp(), dt.timestamp_subsec_nanos() as i32)
    }

    /// Convert to DateTime
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // In range by construction
        DateTime::from_timestamp(self.seconds, self.nanoseconds as u32).unwrap_or_default()
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = FirestoreError;

    fn try_from(dt: DateTime<Utc>) -> Result<Self, Self::Error> {
        Self::from_datetime(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.to_datetime()
    }
}

/// Encoder/decoder for `__DATE(<epoch-ms>)` strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTag;

impl DateTag {
    /// The tag prefix
    pub fn prefix(&self) -> &'static str {
        DATE_PREFIX
    }

    /// Encode a timestamp as `__DATE(<epoch-ms>)`
    pub fn encode(&self, timestamp: &Timestamp) -> String {
        format!("{}{}{}", DATE_PREFIX, timestamp.to_millis(), DATE_SUFFIX)
    }

    /// Decode a tagged string
    ///
    /// Returns `None` when `value` is not tagged at all, and an error when it
    /// is tagged but the body is not an in-range integer millisecond count.
    pub fn decode(&self, value: &str) -> Option<Result<Timestamp, FirestoreError>> {
        let body = value.strip_prefix(DATE_PREFIX)?;
        let Some(millis) = body.strip_suffix(DATE_SUFFIX) else {
            return Some(Err(FirestoreError::InvalidData(format!(
                "tagged timestamp {:?} is missing its closing marker",
                value
            ))));
        };
        let millis = match millis.parse::<i64>() {
            Ok(millis) => millis,
            Err(e) => {
                return Some(Err(FirestoreError::InvalidData(format!(
                    "tagged timestamp {:?}: {}",
                    value, e
                ))))
            }
        };
        Some(Timestamp::from_millis(millis))
    }
}
