// Brownfield land dataset

use super::geography::{geography_row, organisation_join};
use super::{natural_key, source_row};
use crate::error::Result;
use crate::model::{GeographyCategory, GeographyMetric, Metric, Row};
use crate::normalizer::NormalizedRecord;
use crate::resolver::Resolver;
use std::collections::BTreeSet;

/// Fields whose value names a category; the field name is the category type
pub const CATEGORY_FIELDS: [&str; 3] = [
    "planning-permission-type",
    "planning-permission-status",
    "ownership-status",
];

/// Yes/no flags that each stand for a `site-category` category named after the field
pub const SITE_CATEGORY_FIELDS: [&str; 2] = ["deliverable", "hazardous-substances"];

pub const SITE_CATEGORY_TYPE: &str = "site-category";

/// Fields carried over as geography metrics
pub const METRIC_FIELDS: [&str; 3] = ["hectares", "minimum-net-dwellings", "maximum-net-dwellings"];

/// Maps a brownfield site to a geography with its categories and metrics
///
/// Row order: geography, organisation join, category joins, metric joins.
#[derive(Debug, Clone)]
pub struct BrownfieldLandModel {
    dataset: String,
    record: NormalizedRecord,
}

impl BrownfieldLandModel {
    pub fn new(dataset: &str, record: NormalizedRecord) -> Self {
        Self {
            dataset: dataset.to_string(),
            record,
        }
    }

    /// Distinct (category, type) pairs the record refers to, in field order
    pub fn categories(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let derived = CATEGORY_FIELDS.iter().filter_map(|field| {
            self.record
                .field(field)
                .map(|value| (category_slug(value), field.to_string()))
        });
        let flagged = SITE_CATEGORY_FIELDS
            .iter()
            .filter(|field| self.record.field(field).is_some_and(is_set))
            .map(|field| (field.to_string(), SITE_CATEGORY_TYPE.to_string()));

        for pair in derived.chain(flagged) {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    pub fn metrics(&self) -> Vec<Metric> {
        METRIC_FIELDS
            .iter()
            .filter_map(|field| self.record.field(field).map(|value| Metric::new(*field, value)))
            .collect()
    }

    pub async fn to_rows(self, resolver: &mut Resolver<'_>) -> Result<Vec<Row>> {
        let key = natural_key(&self.record, &self.dataset, "site")?;
        let mut geography = geography_row(&self.dataset, key, &self.record);
        if geography.notes.is_none() {
            geography.notes = self.record.text("site-address");
        }
        let site = geography.entity.entity;
        let source = source_row(&self.dataset, &geography.geography, site);

        let organisation =
            organisation_join(&self.dataset, &geography, &self.record, resolver).await?;
        let mut rows = vec![Row::Geography(geography)];
        rows.extend(organisation);

        let mut joined = BTreeSet::new();
        for (category, type_) in self.categories() {
            let Some(found) = resolver.category(&source, &category, &type_).await? else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::GeographyCategory(GeographyCategory {
                    geography: site,
                    category: found.entity.entity,
                }));
            }
        }

        rows.extend(self.metrics().into_iter().map(|metric| {
            Row::GeographyMetric(GeographyMetric {
                geography: site,
                metric,
            })
        }));

        Ok(rows)
    }
}

/// Category key for a free-text value: lower case, spaces as hyphens
fn category_slug(value: &str) -> String {
    value.to_lowercase().replace(' ', "-")
}

fn is_set(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}
