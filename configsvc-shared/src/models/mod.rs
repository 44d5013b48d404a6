/// Domain models for the config service
///
/// Plain data records exchanged with the repositories. Field constraints
/// (name 1-256 characters, comments up to 1024) are enforced by callers
/// before a record reaches a repository.
///
/// # Models
///
/// - `application`: applications and their create/update inputs
/// - `configuration`: configurations, their JSON-like payload and inputs
///
/// # Example
///
/// ```
/// use configsvc_shared::models::configuration::{ConfigMap, ConfigValue};
///
/// let mut config = ConfigMap::new();
/// config.insert("retries".to_string(), ConfigValue::Integer(3));
/// config.insert("verbose".to_string(), ConfigValue::Bool(true));
///
/// let json = serde_json::to_string(&config).unwrap();
/// assert_eq!(json, r#"{"retries":3,"verbose":true}"#);
/// ```

pub mod application;
pub mod configuration;

/// Maximum length of a `name` field (characters)
pub const NAME_MAX_LENGTH: usize = 256;

/// Maximum length of a `comments` field (characters)
pub const COMMENTS_MAX_LENGTH: usize = 1024;
