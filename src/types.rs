//! Shared primitive types: timestamps, amounts and optional term fields
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Monetary amounts are carried as plain floating point values, parsed leniently from text.
pub type Amount = f64;

/// Wire sentinel meaning "this field has not been set yet".
pub const UNDEFINED: &str = "UNDEFINED";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl Serialize for TimeStamp<Utc> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

/// Maps a raw argument onto an optional term: the empty string and the
/// `UNDEFINED` sentinel are "unset".
pub fn field(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.is_empty() || value == UNDEFINED {
        None
    } else {
        Some(value)
    }
}

pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.is_some()
}

/// What a mutating operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Applied,
    /// The request passed every gate but was declined without touching the ledger.
    Skipped { reason: String },
}
