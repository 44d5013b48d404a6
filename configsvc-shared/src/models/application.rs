/// Application model
///
/// An application is the top-level record; configurations point at it
/// through `configurations.application_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE applications (
///     id VARCHAR(26) PRIMARY KEY,
///     name VARCHAR(256) NOT NULL UNIQUE,
///     comments VARCHAR(1024),
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Sortable 26-character identifier, assigned on creation
    pub id: String,

    /// Unique application name
    pub name: String,

    /// Free-form comments
    pub comments: Option<String>,

    /// When the application was created
    pub created_at: DateTime<Utc>,

    /// When the application was last modified
    pub updated_at: DateTime<Utc>,
}

/// Application together with the identifiers of its configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationWithConfigs {
    #[serde(flatten)]
    pub application: Application,

    /// Identifiers of every configuration owned by the application
    ///
    /// Empty (never null) when there are none.
    #[serde(default)]
    pub configuration_ids: Vec<String>,
}

/// Input for creating a new application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApplication {
    pub name: String,

    #[serde(default)]
    pub comments: Option<String>,
}

/// Input for updating an application
///
/// Replaces every mutable field: a `None` comment clears the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateApplication {
    pub name: String,

    #[serde(default)]
    pub comments: Option<String>,
}
