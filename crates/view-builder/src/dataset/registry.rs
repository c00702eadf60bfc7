//! Dataset registry
//!
//! Maps dataset names to mapper variants. The registry is assembled once with
//! [`DatasetRegistryBuilder`] and is immutable afterwards.

use super::{DatasetKind, DatasetModel, DocumentLayout};
use crate::error::{BuildError, Result};
use crate::normalizer::NormalizedRecord;
use std::collections::BTreeMap;

/// Category datasets shipped with the builder
pub const CATEGORY_DATASETS: &[&str] = &[
    "developer-agreement-type",
    "development-plan-type",
    "development-policy-category",
    "document-type",
    "ownership-status",
    "planning-permission-status",
    "planning-permission-type",
    "site-category",
];

/// Geography datasets shipped with the builder
pub const GEOGRAPHY_DATASETS: &[&str] = &[
    "article-4-direction-area",
    "conservation-area",
    "green-belt",
    "local-authority-district",
    "parish",
    "tree-preservation-zone",
    "ward",
];

#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    models: BTreeMap<String, DatasetKind>,
}

impl DatasetRegistry {
    pub fn builder() -> DatasetRegistryBuilder {
        DatasetRegistryBuilder::default()
    }

    /// Every dataset the builder knows how to map
    pub fn standard() -> Self {
        let mut builder = Self::builder();
        for dataset in CATEGORY_DATASETS {
            builder = builder.register(*dataset, DatasetKind::Category);
        }
        for dataset in GEOGRAPHY_DATASETS {
            builder = builder.register(*dataset, DatasetKind::Geography);
        }
        builder
            .register("development-policy", DatasetKind::Policy)
            .register(
                "development-plan-document",
                DatasetKind::Document(DocumentLayout::PlanDocument),
            )
            .register("document", DatasetKind::Document(DocumentLayout::Document))
            .register("brownfield-land", DatasetKind::BrownfieldLand)
            .build()
    }

    /// Variant registered for `dataset`
    pub fn kind(&self, dataset: &str) -> Result<DatasetKind> {
        self.models
            .get(dataset)
            .copied()
            .ok_or_else(|| BuildError::Registry(dataset.to_string()))
    }

    /// Build the mapper for one record of `dataset`
    pub fn construct(&self, dataset: &str, record: NormalizedRecord) -> Result<DatasetModel> {
        Ok(self.kind(dataset)?.construct(dataset, record))
    }

    /// Registered datasets in name order
    pub fn datasets(&self) -> impl Iterator<Item = (&str, DatasetKind)> {
        self.models.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DatasetRegistryBuilder {
    models: BTreeMap<String, DatasetKind>,
}

impl DatasetRegistryBuilder {
    /// Register a dataset name; a later registration of the same name replaces the earlier one
    pub fn register(mut self, dataset: impl Into<String>, kind: DatasetKind) -> Self {
        self.models.insert(dataset.into(), kind);
        self
    }

    pub fn build(self) -> DatasetRegistry {
        DatasetRegistry {
            models: self.models,
        }
    }
}
