use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Primary persisted document, stored under the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedData {
    #[serde(default, deserialize_with = "lenient_day_list")]
    #[schemars(
        with = "Vec<String>",
        description = "Marked days as YYYY-MM-DD strings. Order is irrelevant and duplicates are harmless."
    )]
    pub usa_days: Vec<String>,

    #[serde(default)]
    #[schemars(
        description = "Simulated reference date as an ISO-8601 timestamp (YYYY-MM-DDTHH:mm:ss.sssZ), or null when the real current date is used."
    )]
    pub simulated_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "ISO-8601 timestamp of the save that produced this document.")]
    pub last_saved: Option<String>,
}

/// `null` reads as an empty list; non-string elements are dropped so one bad
/// entry cannot take the rest of the list down with it.
fn lenient_day_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(string_entries(values))
}

fn string_entries(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(key) => Some(key),
            other => {
                warn!("Skipping non-string day entry: {}", other);
                None
            }
        })
        .collect()
}

/// Parses the legacy document: a bare list of YYYY-MM-DD strings under the
/// legacy key. Fails only when the document is not a JSON array.
pub fn parse_legacy_days(raw: &str) -> serde_json::Result<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    Ok(string_entries(values))
}

impl SavedData {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SavedData)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = SavedData::schema_as_json().unwrap();
        assert!(schema_json.contains("usaDays"));
        assert!(schema_json.contains("simulatedDate"));
        assert!(schema_json.contains("lastSaved"));
    }

    #[test]
    fn test_field_names() {
        let data = SavedData {
            usa_days: vec!["2024-01-01".to_string()],
            simulated_date: None,
            last_saved: Some("2024-01-01T12:00:00.000Z".to_string()),
        };

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["usaDays"][0], "2024-01-01");
        assert!(value["simulatedDate"].is_null());
        assert_eq!(value["lastSaved"], "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn test_missing_fields_default() {
        let data: SavedData = serde_json::from_str("{}").unwrap();
        assert!(data.usa_days.is_empty());
        assert_eq!(data.simulated_date, None);
        assert_eq!(data.last_saved, None);

        let data: SavedData = serde_json::from_str(r#"{"usaDays": null}"#).unwrap();
        assert!(data.usa_days.is_empty());
    }

    #[test]
    fn test_non_string_day_entries_are_dropped() {
        let data: SavedData =
            serde_json::from_str(r#"{"usaDays": ["2024-01-01", null, 5, {"a": 1}, "2024-01-02"]}"#)
                .unwrap();
        assert_eq!(data.usa_days, vec!["2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn test_parse_legacy_days() {
        assert_eq!(
            parse_legacy_days(r#"["2022-05-05", null, 5]"#).unwrap(),
            vec!["2022-05-05"]
        );
        assert!(parse_legacy_days(r#"{"a": 1}"#).is_err());
    }
}
