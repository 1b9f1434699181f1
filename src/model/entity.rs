//! Entity types recognized within utterances.
//!
//! An entity is either *system* (provided by the NLU platform, e.g.
//! `sys.person`) or *custom* (a user-defined set of values and synonyms,
//! declared in the agent and fed entries through per-locale language files).

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Platform-provided entity kinds.
///
/// Names follow the remote platform's `sys.*` catalogue; [`SystemEntity::platform_name`]
/// returns the exact identifier used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemEntity {
    Any,
    Person,
    GivenName,
    Number,
    Ordinal,
    Percentage,
    Temperature,
    Duration,
    DateTime,
    DatePeriod,
    Location,
    GeoCity,
    Email,
    Url,
    PhoneNumber,
}

impl SystemEntity {
    pub fn platform_name(&self) -> &'static str {
        match self {
            SystemEntity::Any => "sys.any",
            SystemEntity::Person => "sys.person",
            SystemEntity::GivenName => "sys.given-name",
            SystemEntity::Number => "sys.number",
            SystemEntity::Ordinal => "sys.ordinal",
            SystemEntity::Percentage => "sys.percentage",
            SystemEntity::Temperature => "sys.temperature",
            SystemEntity::Duration => "sys.duration",
            SystemEntity::DateTime => "sys.date-time",
            SystemEntity::DatePeriod => "sys.date-period",
            SystemEntity::Location => "sys.location",
            SystemEntity::GeoCity => "sys.geo-city",
            SystemEntity::Email => "sys.email",
            SystemEntity::Url => "sys.url",
            SystemEntity::PhoneNumber => "sys.phone-number",
        }
    }

    pub fn from_platform_name(name: &str) -> Option<Self> {
        let entity = match name {
            "sys.any" => SystemEntity::Any,
            "sys.person" => SystemEntity::Person,
            "sys.given-name" => SystemEntity::GivenName,
            "sys.number" => SystemEntity::Number,
            "sys.ordinal" => SystemEntity::Ordinal,
            "sys.percentage" => SystemEntity::Percentage,
            "sys.temperature" => SystemEntity::Temperature,
            "sys.duration" => SystemEntity::Duration,
            "sys.date-time" => SystemEntity::DateTime,
            "sys.date-period" => SystemEntity::DatePeriod,
            "sys.location" => SystemEntity::Location,
            "sys.geo-city" => SystemEntity::GeoCity,
            "sys.email" => SystemEntity::Email,
            "sys.url" => SystemEntity::Url,
            "sys.phone-number" => SystemEntity::PhoneNumber,
            _ => return None,
        };
        Some(entity)
    }
}

/// Reference to the entity type of an intent parameter.
///
/// Serializes as a plain string: `sys.*` names resolve to system entities,
/// anything else references a custom entity declared in the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityRef {
    System(SystemEntity),
    Custom(String),
}

impl EntityRef {
    pub fn name(&self) -> &str {
        match self {
            EntityRef::System(sys) => sys.platform_name(),
            EntityRef::Custom(name) => name,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, EntityRef::System(_))
    }
}

impl From<EntityRef> for String {
    fn from(entity: EntityRef) -> Self {
        entity.name().to_string()
    }
}

impl TryFrom<String> for EntityRef {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.starts_with("sys.") {
            return SystemEntity::from_platform_name(&value)
                .map(EntityRef::System)
                .ok_or_else(|| {
                    ApiError::ValidationError(format!("Unknown system entity: {}", value))
                });
        }
        if value.is_empty() {
            return Err(ApiError::ValidationError(
                "Entity reference cannot be empty".to_string(),
            ));
        }
        Ok(EntityRef::Custom(value))
    }
}

/// One value of a custom entity, with its synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub value: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl EntityEntry {
    pub fn new(value: impl Into<String>, synonyms: Vec<String>) -> Self {
        Self {
            value: value.into(),
            synonyms,
        }
    }
}

/// A user-defined entity declared in the agent.
///
/// Entries live in per-locale language files; the definition here carries
/// the matching behavior flags only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEntity {
    pub name: String,
    #[serde(default = "default_true")]
    pub use_synonyms: bool,
    #[serde(default)]
    pub regexp_entity: bool,
    #[serde(default)]
    pub automated_expansion: bool,
    #[serde(default)]
    pub fuzzy_matching: bool,
}

fn default_true() -> bool {
    true
}

impl CustomEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_synonyms: true,
            regexp_entity: false,
            automated_expansion: false,
            fuzzy_matching: false,
        }
    }
}
