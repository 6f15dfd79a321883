//! Tracked city records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A tracked city as persisted in the city list file.
///
/// Field names match the on-disk format (`CityCode`, `CityName`, `Temp`,
/// `Status`). `temp` and `status` are the snapshot taken when the city was
/// added and are never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Provider identifier, unique within the store.
    #[serde(rename = "CityCode", default, deserialize_with = "text_from_json")]
    pub city_code: String,

    /// Display name at time of addition.
    #[serde(rename = "CityName", default, deserialize_with = "text_from_json")]
    pub city_name: String,

    /// Last-seen temperature, as text.
    #[serde(rename = "Temp", default, deserialize_with = "text_from_json")]
    pub temp: String,

    /// Last-seen primary condition (e.g. "Clouds").
    #[serde(rename = "Status", default, deserialize_with = "text_from_json")]
    pub status: String,
}

impl City {
    /// Whether this record carries a usable identifier.
    pub fn has_code(&self) -> bool {
        !self.city_code.is_empty()
    }
}

/// A city as resolved by the upstream provider from a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCity {
    pub city_code: String,
    pub city_name: String,
    pub temp: String,
    pub condition: String,
}

impl From<ResolvedCity> for City {
    fn from(resolved: ResolvedCity) -> Self {
        Self {
            city_code: resolved.city_code,
            city_name: resolved.city_name,
            temp: resolved.temp,
            status: resolved.condition,
        }
    }
}

/// Result of adding a city to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub city_code: String,
    pub already_existed: bool,
}

/// Render a scalar JSON value as text.
///
/// Legacy files store `CityCode` and `Temp` as numbers; null, missing or
/// structured values read as empty.
pub fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn text_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(json_text(&value))
}
