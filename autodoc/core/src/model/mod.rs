use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod references;

pub use references::References;

/// Identifier assigned by the external store.
pub type Id = i64;

/// A catalog row: every lookup collection except persons has this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogEntry {
    pub id: Id,
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default = "active_by_default", deserialize_with = "flag::or_true")
    )]
    pub is_active: bool,
}

impl CatalogEntry {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
        }
    }
}

pub type Car = CatalogEntry;
pub type Color = CatalogEntry;
pub type Role = CatalogEntry;
/// Entry of the works catalog, e.g. "wash" or "polish".
pub type WorkType = CatalogEntry;

/// A person acts both as the responsible person of an assignment and as the
/// executor of individual work items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Person {
    pub id: Id,
    pub full_name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default = "active_by_default", deserialize_with = "flag::or_true")
    )]
    pub is_active: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role_id: Option<Id>,
}

impl Person {
    pub fn new(id: Id, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            is_active: true,
            role_id: None,
        }
    }
}

/// A scheduled visit of a vehicle on a specific date and time.
///
/// The upstream row may embed the referenced car, color and person. Those
/// embedded names take precedence over the reference collections.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub id: Id,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "timestamp::deserialize"))]
    pub date: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vin: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub car_number: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub car_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub color_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub person_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub car: Option<Car>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub color: Option<Color>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub person: Option<Person>,
}

impl Assignment {
    /// Creates a bare assignment with no vehicle details or references.
    pub fn new(id: Id, date: NaiveDateTime) -> Self {
        Self {
            id,
            date,
            vin: None,
            car_number: None,
            car_id: None,
            color_id: None,
            person_id: None,
            description: None,
            car: None,
            color: None,
            person: None,
        }
    }

    /// Calendar day the assignment is bucketed into.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// One unit of work of an assignment, delegated to an (optional) executor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkItem {
    pub id: Id,
    pub work_assignment_id: Id,
    pub work_id: Id,
    #[cfg_attr(feature = "serde", serde(default))]
    pub executor_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "flag::or_false"))]
    pub status: bool,
}

/// Parses an ISO-8601 timestamp as sent by the external store.
///
/// Offset-qualified values are read as the local wall-clock time they carry.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    value
        .parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

#[cfg(feature = "serde")]
fn active_by_default() -> bool {
    true
}

/// Boolean columns the store may send as `null`.
#[cfg(feature = "serde")]
mod flag {
    use serde::{Deserialize, Deserializer};

    pub fn or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }

    pub fn or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
    }
}

#[cfg(feature = "serde")]
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}
