// View Model Tables

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use view_common::{EntityId, Typology};

// ============================================================================
// Entity
// ============================================================================

/// Canonical identity of a primary subject in the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: EntityId,
    pub typology: Typology,
    /// Dataset that produced the entity (e.g., "brownfield-land")
    pub dataset: String,
}

impl Entity {
    pub fn new(entity: EntityId, typology: Typology, dataset: impl Into<String>) -> Self {
        Self {
            entity,
            typology,
            dataset: dataset.into(),
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Entry, start and end dates carried by typed rows and dated joins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dates {
    pub entry_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ============================================================================
// Typed rows
// ============================================================================

/// A category within a category type, e.g. ("owned-by-a-public-authority", "ownership-status")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub entity: Entity,
    /// Natural key, unique together with `type_`
    pub category: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    pub entity: Entity,
    /// Natural key (e.g., "local-authority-district:E06000001")
    pub geography: String,
    /// WKT geometry text, untouched by the build
    pub geometry: Option<String>,
    /// WKT point text
    pub point: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub documentation_url: Option<String>,
    /// Dataset name the geography came from
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub entity: Entity,
    pub policy: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub entity: Entity,
    pub document: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub document_url: Option<String>,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub entity: Entity,
    /// Natural key (e.g., "government-organisation:D1342")
    pub organisation: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub dates: Dates,
}

/// Loose dataset-specific fact attached to a geography
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub field: String,
    pub value: String,
}

impl Metric {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}
