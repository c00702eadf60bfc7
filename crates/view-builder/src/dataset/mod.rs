//! Dataset mappers
//!
//! Each dataset is mapped by one of a closed set of variants. A [`DatasetModel`] is built from
//! a single normalized record and consumed by [`DatasetModel::to_rows`], which returns the
//! record's typed row followed by its joins.

pub mod brownfield;
pub mod category;
pub mod document;
pub mod geography;
pub mod policy;
pub mod registry;

pub use brownfield::BrownfieldLandModel;
pub use category::CategoryModel;
pub use document::{DocumentLayout, DocumentModel};
pub use geography::GeographyModel;
pub use policy::PolicyModel;
pub use registry::{DatasetRegistry, DatasetRegistryBuilder};

use crate::error::{BuildError, Result};
use crate::model::Row;
use crate::normalizer::NormalizedRecord;
use crate::resolver::Resolver;
use std::fmt;
use view_common::EntityId;

/// Prefix applied to bare geography references in policy and plan documents
pub const LOCAL_AUTHORITY_DISTRICT_PREFIX: &str = "local-authority-district:";

/// Mapper variant a dataset is registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Category,
    Geography,
    Policy,
    Document(DocumentLayout),
    BrownfieldLand,
}

impl DatasetKind {
    /// Build the mapper for one record of `dataset`
    pub fn construct(self, dataset: &str, record: NormalizedRecord) -> DatasetModel {
        match self {
            DatasetKind::Category => DatasetModel::Category(CategoryModel::new(dataset, record)),
            DatasetKind::Geography => {
                DatasetModel::Geography(GeographyModel::new(dataset, record))
            },
            DatasetKind::Policy => DatasetModel::Policy(PolicyModel::new(dataset, record)),
            DatasetKind::Document(layout) => {
                DatasetModel::Document(DocumentModel::new(dataset, layout, record))
            },
            DatasetKind::BrownfieldLand => {
                DatasetModel::BrownfieldLand(BrownfieldLandModel::new(dataset, record))
            },
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Category => f.write_str("category"),
            DatasetKind::Geography => f.write_str("geography"),
            DatasetKind::Policy => f.write_str("policy"),
            DatasetKind::Document(DocumentLayout::PlanDocument) => f.write_str("plan-document"),
            DatasetKind::Document(DocumentLayout::Document) => f.write_str("document"),
            DatasetKind::BrownfieldLand => f.write_str("brownfield-land"),
        }
    }
}

/// Single-use mapper for one record
#[derive(Debug, Clone)]
pub enum DatasetModel {
    Category(CategoryModel),
    Geography(GeographyModel),
    Policy(PolicyModel),
    Document(DocumentModel),
    BrownfieldLand(BrownfieldLandModel),
}

impl DatasetModel {
    pub fn kind(&self) -> DatasetKind {
        match self {
            DatasetModel::Category(_) => DatasetKind::Category,
            DatasetModel::Geography(_) => DatasetKind::Geography,
            DatasetModel::Policy(_) => DatasetKind::Policy,
            DatasetModel::Document(model) => DatasetKind::Document(model.layout()),
            DatasetModel::BrownfieldLand(_) => DatasetKind::BrownfieldLand,
        }
    }

    pub async fn to_rows(self, resolver: &mut Resolver<'_>) -> Result<Vec<Row>> {
        match self {
            DatasetModel::Category(model) => model.to_rows(),
            DatasetModel::Geography(model) => model.to_rows(resolver).await,
            DatasetModel::Policy(model) => model.to_rows(resolver).await,
            DatasetModel::Document(model) => model.to_rows(resolver).await,
            DatasetModel::BrownfieldLand(model) => model.to_rows(resolver).await,
        }
    }
}

/// Natural key of a record: `field` if present, else the field named after the dataset
pub(crate) fn natural_key(record: &NormalizedRecord, dataset: &str, field: &str) -> Result<String> {
    record
        .first_of(&[field, dataset])
        .map(str::to_string)
        .ok_or_else(|| BuildError::validation(format!("missing {field} field")))
}

/// Label naming the row a relationship starts from, used in logs and errors
pub(crate) fn source_row(dataset: &str, key: &str, entity: EntityId) -> String {
    format!("{dataset}:{key} (entity {entity})")
}
