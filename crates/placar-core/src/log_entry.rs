// Per-match log entries, fetched on demand for the detail panel.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::format::{format_stamp, PLACEHOLDER};
use crate::model::Stamp;
use crate::update::parse_stamp;

/// One entry of a match's event log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "id_text")]
    pub id: String,
    #[serde(rename = "descricao", default, deserialize_with = "text")]
    pub description: String,
    /// Operation kind, e.g. `GOL`, `INICIO`, `ENCERRAMENTO`.
    #[serde(rename = "operacao", default, deserialize_with = "text")]
    pub operation: String,
    #[serde(rename = "minutoPartida", default, deserialize_with = "minute")]
    pub match_minute: Option<u32>,
    #[serde(rename = "dataHora", default, deserialize_with = "stamp")]
    pub timestamp: Stamp,
}

impl LogEntry {
    /// One display line: `37' GOL  Goal for Santos  13/02/2026 10:37`.
    pub fn display_line(&self, date_format: &str) -> String {
        let minute = self
            .match_minute
            .map_or_else(|| PLACEHOLDER.to_string(), |m| format!("{m}'"));
        format!(
            "{:>4} {:<12} {}  {}",
            minute,
            self.operation,
            self.description,
            format_stamp(self.timestamp, date_format)
        )
    }
}

/// Parse a JSON array of log entries.
pub fn parse_log_entries(raw: &str) -> Result<Vec<LogEntry>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Null or non-text values read as empty text.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn minute<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|m| u32::try_from(m).ok()))
}

fn stamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Stamp, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_stamp(Some(&value)))
}
