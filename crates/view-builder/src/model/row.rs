// View Model Rows and Joins

use super::tables::{Category, Dates, Document, Geography, Metric, Organisation, Policy};
use serde::{Deserialize, Serialize};
use view_common::EntityId;

// ============================================================================
// Join rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCategory {
    pub policy: EntityId,
    pub category: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyGeography {
    pub policy: EntityId,
    pub geography: EntityId,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOrganisation {
    pub policy: EntityId,
    pub organisation: EntityId,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub policy: EntityId,
    pub document: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCategory {
    pub document: EntityId,
    pub category: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOrganisation {
    pub document: EntityId,
    pub organisation: EntityId,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGeography {
    pub document: EntityId,
    pub geography: EntityId,
    #[serde(flatten)]
    pub dates: Dates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyCategory {
    pub geography: EntityId,
    pub category: EntityId,
}

/// Join owning the metric it introduces; the sink stores the metric first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyMetric {
    pub geography: EntityId,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationGeography {
    pub organisation: EntityId,
    pub geography: EntityId,
    #[serde(flatten)]
    pub dates: Dates,
}

// ============================================================================
// Row
// ============================================================================

/// One row of the pending write set, in the order the sink must persist it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum Row {
    Category(Category),
    Geography(Geography),
    Policy(Policy),
    Document(Document),
    Organisation(Organisation),
    PolicyCategory(PolicyCategory),
    PolicyGeography(PolicyGeography),
    PolicyOrganisation(PolicyOrganisation),
    PolicyDocument(PolicyDocument),
    DocumentCategory(DocumentCategory),
    DocumentOrganisation(DocumentOrganisation),
    DocumentGeography(DocumentGeography),
    GeographyCategory(GeographyCategory),
    GeographyMetric(GeographyMetric),
    OrganisationGeography(OrganisationGeography),
}

/// Table a row lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKind {
    Category,
    Geography,
    Policy,
    Document,
    Organisation,
    PolicyCategory,
    PolicyGeography,
    PolicyOrganisation,
    PolicyDocument,
    DocumentCategory,
    DocumentOrganisation,
    DocumentGeography,
    GeographyCategory,
    GeographyMetric,
    OrganisationGeography,
}

impl RowKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            RowKind::Category => "category",
            RowKind::Geography => "geography",
            RowKind::Policy => "policy",
            RowKind::Document => "document",
            RowKind::Organisation => "organisation",
            RowKind::PolicyCategory => "policy_category",
            RowKind::PolicyGeography => "policy_geography",
            RowKind::PolicyOrganisation => "policy_organisation",
            RowKind::PolicyDocument => "policy_document",
            RowKind::DocumentCategory => "document_category",
            RowKind::DocumentOrganisation => "document_organisation",
            RowKind::DocumentGeography => "document_geography",
            RowKind::GeographyCategory => "geography_category",
            RowKind::GeographyMetric => "geography_metric",
            RowKind::OrganisationGeography => "organisation_geography",
        }
    }
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl Row {
    pub fn kind(&self) -> RowKind {
        match self {
            Row::Category(_) => RowKind::Category,
            Row::Geography(_) => RowKind::Geography,
            Row::Policy(_) => RowKind::Policy,
            Row::Document(_) => RowKind::Document,
            Row::Organisation(_) => RowKind::Organisation,
            Row::PolicyCategory(_) => RowKind::PolicyCategory,
            Row::PolicyGeography(_) => RowKind::PolicyGeography,
            Row::PolicyOrganisation(_) => RowKind::PolicyOrganisation,
            Row::PolicyDocument(_) => RowKind::PolicyDocument,
            Row::DocumentCategory(_) => RowKind::DocumentCategory,
            Row::DocumentOrganisation(_) => RowKind::DocumentOrganisation,
            Row::DocumentGeography(_) => RowKind::DocumentGeography,
            Row::GeographyCategory(_) => RowKind::GeographyCategory,
            Row::GeographyMetric(_) => RowKind::GeographyMetric,
            Row::OrganisationGeography(_) => RowKind::OrganisationGeography,
        }
    }

    /// Whether the row is a join between two typed rows
    pub fn is_join(&self) -> bool {
        !matches!(
            self,
            Row::Category(_)
                | Row::Geography(_)
                | Row::Policy(_)
                | Row::Document(_)
                | Row::Organisation(_)
        )
    }
}
