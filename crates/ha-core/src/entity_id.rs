//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Object id used when a name slugifies to nothing
const FALLBACK_OBJECT_ID: &str = "unnamed_device";

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error(
        "domain contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore or contain double underscores)"
    )]
    InvalidDomainChars,

    #[error(
        "object_id contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore)"
    )]
    InvalidObjectIdChars,
}

/// Represents a Home Assistant entity ID (e.g., "switch.cv_pomp_relay")
///
/// Entity IDs consist of a domain and an object_id separated by a period.
/// Both parts must be lowercase alphanumeric with underscores only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if domain.is_empty() {
            return Err(EntityIdError::EmptyDomain);
        }
        if object_id.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        if !Self::is_valid_domain(&domain) {
            return Err(EntityIdError::InvalidDomainChars);
        }
        if !Self::is_valid_object_id(&object_id) {
            return Err(EntityIdError::InvalidObjectIdChars);
        }

        Ok(Self { domain, object_id })
    }

    /// Generate an entity ID from a human name or suggested object id
    ///
    /// The suggestion is slugified ("Koelkast (92C4A) Relay" becomes
    /// `koelkast_92c4a_relay`). When `is_taken` reports a clash, `_2`, `_3`, ...
    /// are appended until a free ID is found.
    pub fn generate(
        domain: &str,
        suggestion: &str,
        is_taken: impl Fn(&str) -> bool,
    ) -> Result<Self, EntityIdError> {
        let mut object_id = slugify(suggestion);
        if object_id.is_empty() {
            object_id = FALLBACK_OBJECT_ID.to_string();
        }

        let preferred = format!("{}.{}", domain, object_id);
        if !is_taken(&preferred) {
            return Self::new(domain, object_id);
        }

        let mut tries = 2;
        loop {
            let candidate = format!("{}_{}", object_id, tries);
            if !is_taken(&format!("{}.{}", domain, candidate)) {
                return Self::new(domain, candidate);
            }
            tries += 1;
        }
    }

    /// Get the domain part of the entity ID
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Get the object_id part of the entity ID
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Check if an object_id is valid (lowercase alphanumeric + underscore,
    /// cannot start/end with _)
    ///
    /// Matches Python HA regex: `(?!_)[\da-z_]+(?<!_)`
    fn is_valid_object_id(s: &str) -> bool {
        if s.starts_with('_') || s.ends_with('_') {
            return false;
        }
        s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    /// Check if a domain is valid (same as object_id, plus cannot contain __)
    fn is_valid_domain(s: &str) -> bool {
        !s.contains("__") && Self::is_valid_object_id(s)
    }
}

/// Slugify a name into an object id
pub fn slugify(value: &str) -> String {
    slug::slugify(value).replace('-', "_")
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((domain, object_id)) if !object_id.contains('.') => Self::new(domain, object_id),
            _ => Err(EntityIdError::InvalidFormat),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}
