//! Millisecond timestamp helpers.
//!
//! Documents persist instants as integer Unix milliseconds so that ordering by
//! a timestamp field is numeric in every store adapter.

use time::OffsetDateTime;
use time::error::ComponentRange;

const NANOS_PER_MILLI: i128 = 1_000_000;

pub fn to_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / NANOS_PER_MILLI) as i64
}

pub fn from_millis(millis: i64) -> Result<OffsetDateTime, ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
}

/// Drop sub-millisecond precision so an instant survives a store round trip unchanged.
pub fn truncate_to_millis(instant: OffsetDateTime) -> OffsetDateTime {
    from_millis(to_millis(instant)).unwrap_or(instant)
}

pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::OffsetDateTime;

    pub fn serialize<S>(instant: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(super::to_millis(*instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        super::from_millis(value).map_err(D::Error::custom)
    }
}

pub mod option_millis {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::OffsetDateTime;

    pub fn serialize<S>(instant: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match instant {
            Some(instant) => serializer.serialize_i64(super::to_millis(*instant)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i64>::deserialize(deserializer)?
            .map(|value| super::from_millis(value).map_err(D::Error::custom))
            .transpose()
    }
}
