// Payload normalization: raw channel text -> typed `MatchUpdate`.
//
// Payloads are JSON objects using the server's field names (`timeA`,
// `placarA`, `tempoDeJogo`, `dataHoraInicioPartida`, ...). Every field except
// `id` is optional and `null` counts as absent. Malformed payloads come back
// as a `PayloadError`; the caller logs and drops them.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{MatchId, MatchStatus, Stamp};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no usable `id`")]
    MissingId,

    #[error("field `{field}` has an unexpected type or value")]
    InvalidField { field: &'static str },
}

// ---------------------------------------------------------------------------
// MatchUpdate
// ---------------------------------------------------------------------------

/// One normalized update as delivered on a channel.
///
/// `None` / `Stamp::Missing` mean "not supplied"; the store keeps whatever it
/// already knows for those fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpdate {
    pub id: MatchId,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    /// Status claimed by the payload. Informational: the channel decides
    /// the transition.
    pub reported_status: Option<MatchStatus>,
    pub elapsed_minutes: Option<f64>,
    pub started_at: Stamp,
    pub ended_at: Stamp,
}

impl MatchUpdate {
    /// An update carrying only an identifier.
    pub fn new(id: MatchId) -> Self {
        MatchUpdate {
            id,
            team_a: None,
            team_b: None,
            score_a: None,
            score_b: None,
            reported_status: None,
            elapsed_minutes: None,
            started_at: Stamp::Missing,
            ended_at: Stamp::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a raw payload into a `MatchUpdate`.
pub fn parse(raw: &str) -> Result<MatchUpdate, PayloadError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(fields) = value else {
        return Err(PayloadError::NotAnObject);
    };

    let id = fields
        .get("id")
        .and_then(normalize_id)
        .ok_or(PayloadError::MissingId)?;

    let reported_status = match present(&fields, "status") {
        None => None,
        Some(Value::String(s)) => MatchStatus::from_wire(s),
        Some(_) => return Err(PayloadError::InvalidField { field: "status" }),
    };

    Ok(MatchUpdate {
        id,
        team_a: text_field(&fields, "timeA")?,
        team_b: text_field(&fields, "timeB")?,
        score_a: score_field(&fields, "placarA")?,
        score_b: score_field(&fields, "placarB")?,
        reported_status,
        elapsed_minutes: minutes_field(&fields, "tempoDeJogo")?,
        started_at: parse_stamp(fields.get("dataHoraInicioPartida")),
        ended_at: parse_stamp(fields.get("dataHoraEncerramento")),
    })
}

/// Canonicalize a JSON id (string or number) into a `MatchId`.
///
/// Integral numbers render without a fractional part so `10` and `10.0`
/// match the string `"10"`.
pub fn normalize_id(value: &Value) -> Option<MatchId> {
    match value {
        Value::String(s) => MatchId::new(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                MatchId::new(&i.to_string())
            } else if let Some(u) = n.as_u64() {
                MatchId::new(&u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    MatchId::new(&(f as i64).to_string())
                } else {
                    MatchId::new(&n.to_string())
                }
            }
        }
        _ => None,
    }
}

/// Convert a date-like JSON value into a `Stamp`.
///
/// - absent, `null`, `false`, `0` and blank strings are `Missing`;
/// - RFC 3339 strings carry their own offset;
/// - zone-less date-times are read in the local time zone;
/// - bare dates (`2026-02-13`) are UTC midnight;
/// - integers are epoch milliseconds;
/// - arrays are Jackson's `[y, M, d, h, m, s, nanos]` local date-times.
///
/// Anything else is `Invalid`.
pub fn parse_stamp(value: Option<&Value>) -> Stamp {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Stamp::Missing,
        Some(Value::Bool(true)) | Some(Value::Object(_)) => Stamp::Invalid,
        Some(Value::Number(n)) => {
            if n.as_f64() == Some(0.0) {
                return Stamp::Missing;
            }
            n.as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map_or(Stamp::Invalid, Stamp::At)
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Stamp::Missing
            } else {
                parse_stamp_text(s)
            }
        }
        Some(Value::Array(parts)) => parse_stamp_parts(parts),
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_stamp_text(s: &str) -> Stamp {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Stamp::At(at.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_stamp(naive);
        }
    }

    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_opt(0, 0, 0)
            .map_or(Stamp::Invalid, |naive| Stamp::At(naive.and_utc())),
        Err(_) => Stamp::Invalid,
    }
}

fn parse_stamp_parts(parts: &[Value]) -> Stamp {
    if !(3..=7).contains(&parts.len()) {
        return Stamp::Invalid;
    }
    let mut numbers = [0u32; 7];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        match part.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => *slot = n,
            None => return Stamp::Invalid,
        }
    }
    let [year, month, day, hour, minute, second, nanos] = numbers;

    let naive = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos));
    naive.map_or(Stamp::Invalid, local_stamp)
}

fn local_stamp(naive: NaiveDateTime) -> Stamp {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or(Stamp::Invalid, |at| Stamp::At(at.with_timezone(&Utc)))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// The field's value, treating `null` as absent.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn text_field(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, PayloadError> {
    match present(fields, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PayloadError::InvalidField { field: key }),
    }
}

fn score_field(fields: &Map<String, Value>, key: &'static str) -> Result<Option<u32>, PayloadError> {
    match present(fields, key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or(PayloadError::InvalidField { field: key }),
    }
}

fn minutes_field(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<f64>, PayloadError> {
    match present(fields, key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .filter(|m| m.is_finite())
            .map(Some)
            .ok_or(PayloadError::InvalidField { field: key }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
