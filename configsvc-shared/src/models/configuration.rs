/// Configuration model
///
/// A configuration belongs to exactly one application and carries an
/// arbitrary JSON-like map. The map is opaque to the service: it is stored
/// as `JSONB` and handed back as written.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE configurations (
///     id VARCHAR(26) PRIMARY KEY,
///     application_id VARCHAR(26) NOT NULL REFERENCES applications(id),
///     name VARCHAR(256) NOT NULL,
///     comments VARCHAR(1024),
///     config JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL,
///     UNIQUE (application_id, name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A JSON-compatible value
///
/// Integers that fit in `i64` stay integers; every other number is a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Object(BTreeMap<String, ConfigValue>),
}

/// String-keyed configuration payload
pub type ConfigMap = BTreeMap<String, ConfigValue>;

impl From<JsonValue> for ConfigValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => ConfigValue::Null,
            JsonValue::Bool(b) => ConfigValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Integer(i),
                None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => ConfigValue::String(s),
            JsonValue::Array(items) => {
                ConfigValue::Array(items.into_iter().map(ConfigValue::from).collect())
            }
            JsonValue::Object(map) => ConfigValue::Object(
                map.into_iter().map(|(k, v)| (k, ConfigValue::from(v))).collect(),
            ),
        }
    }
}

impl From<ConfigValue> for JsonValue {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => JsonValue::Null,
            ConfigValue::Bool(b) => JsonValue::Bool(b),
            ConfigValue::Integer(i) => JsonValue::from(i),
            // Non-finite floats have no JSON form
            ConfigValue::Float(f) => serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ConfigValue::String(s) => JsonValue::String(s),
            ConfigValue::Array(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            ConfigValue::Object(map) => JsonValue::Object(
                map.into_iter().map(|(k, v)| (k, JsonValue::from(v))).collect(),
            ),
        }
    }
}

/// Converts a payload into the JSON object stored in `configurations.config`
pub fn config_to_json(config: ConfigMap) -> JsonValue {
    JsonValue::from(ConfigValue::Object(config))
}

/// Reads a stored JSON document back into a payload
///
/// Anything other than an object (which the service never writes) comes
/// back as an empty map.
pub fn config_from_json(value: JsonValue) -> ConfigMap {
    match ConfigValue::from(value) {
        ConfigValue::Object(map) => map,
        _ => ConfigMap::new(),
    }
}

/// Configuration record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Sortable 26-character identifier, assigned on creation
    pub id: String,

    /// Owning application
    pub application_id: String,

    /// Name, unique within the owning application
    pub name: String,

    /// Free-form comments
    pub comments: Option<String>,

    /// Opaque key-value payload
    pub config: ConfigMap,

    /// When the configuration was created
    pub created_at: DateTime<Utc>,

    /// When the configuration was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConfiguration {
    pub application_id: String,

    pub name: String,

    #[serde(default)]
    pub comments: Option<String>,

    /// Defaults to an empty map
    #[serde(default)]
    pub config: ConfigMap,
}

/// Input for updating a configuration
///
/// Replaces every mutable field: a `None` comment clears the stored one and
/// an omitted payload becomes an empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfiguration {
    pub name: String,

    #[serde(default)]
    pub comments: Option<String>,

    #[serde(default)]
    pub config: ConfigMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_value_accepts_every_json_shape() {
        let input = json!({
            "string_key": "string_value",
            "int_key": 42,
            "float_key": 2.5,
            "bool_key": true,
            "null_key": null,
            "list_key": [1, 2, 3],
            "dict_key": {"nested": "value"}
        });

        let config: ConfigMap = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(config["int_key"], ConfigValue::Integer(42));
        assert_eq!(config["float_key"], ConfigValue::Float(2.5));
        assert_eq!(config["null_key"], ConfigValue::Null);
        assert!(matches!(config["dict_key"], ConfigValue::Object(_)));

        assert_eq!(config_to_json(config), input);
    }

    #[test]
    fn test_config_from_json_matches_serde() {
        let input = json!({"k": "v", "n": [true, {"deep": -1}]});
        let via_serde: ConfigMap = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(config_from_json(input), via_serde);
    }

    #[test]
    fn test_config_from_json_non_object_is_empty() {
        assert!(config_from_json(json!([1, 2])).is_empty());
        assert!(config_from_json(JsonValue::Null).is_empty());
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(JsonValue::from(ConfigValue::Float(f64::INFINITY)), JsonValue::Null);
    }

    #[test]
    fn test_create_configuration_defaults() {
        let input: CreateConfiguration = serde_json::from_value(json!({
            "application_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "name": "cfg-1"
        }))
        .unwrap();

        assert!(input.comments.is_none());
        assert!(input.config.is_empty());
    }

    #[test]
    fn test_update_configuration_replaces_every_field() {
        let update: UpdateConfiguration =
            serde_json::from_value(json!({"name": "cfg-2", "config": {"key": "value"}})).unwrap();

        assert_eq!(update.name, "cfg-2");
        assert!(update.comments.is_none());
        assert_eq!(update.config["key"], ConfigValue::String("value".to_string()));

        let bare: UpdateConfiguration = serde_json::from_value(json!({"name": "cfg-2"})).unwrap();
        assert!(bare.config.is_empty());

        assert!(serde_json::from_value::<UpdateConfiguration>(json!({"config": {}})).is_err());
    }
}
