// Geography datasets

use super::{natural_key, source_row};
use crate::error::Result;
use crate::model::{Entity, Geography, OrganisationGeography, Row};
use crate::normalizer::NormalizedRecord;
use crate::resolver::Resolver;
use view_common::Typology;

/// Maps a record of a geography dataset such as `local-authority-district`
///
/// Produces the geography row and, when the record names an organisation, the
/// organisation-geography join.
#[derive(Debug, Clone)]
pub struct GeographyModel {
    dataset: String,
    record: NormalizedRecord,
}

impl GeographyModel {
    pub fn new(dataset: &str, record: NormalizedRecord) -> Self {
        Self {
            dataset: dataset.to_string(),
            record,
        }
    }

    pub async fn to_rows(self, resolver: &mut Resolver<'_>) -> Result<Vec<Row>> {
        let key = natural_key(&self.record, &self.dataset, "geography")?;
        let geography = geography_row(&self.dataset, key, &self.record);

        let mut rows = Vec::with_capacity(2);
        let join = organisation_join(&self.dataset, &geography, &self.record, resolver).await?;
        rows.push(Row::Geography(geography));
        rows.extend(join);
        Ok(rows)
    }
}

/// Geography row for `key`, typed by the dataset it came from
pub(crate) fn geography_row(dataset: &str, key: String, record: &NormalizedRecord) -> Geography {
    Geography {
        entity: Entity::new(record.entity, Typology::Geography, dataset),
        geography: key,
        geometry: record.text("geometry"),
        point: record.text("point"),
        name: record.text("name"),
        notes: record.text("notes"),
        documentation_url: record.text("documentation-url"),
        type_: dataset.to_string(),
        dates: record.dates,
    }
}

/// Join to the organisation named by the record's `organisation` field, if any
pub(crate) async fn organisation_join(
    dataset: &str,
    geography: &Geography,
    record: &NormalizedRecord,
    resolver: &mut Resolver<'_>,
) -> Result<Option<Row>> {
    let Some(key) = record.field("organisation") else {
        return Ok(None);
    };

    let source = source_row(dataset, &geography.geography, geography.entity.entity);
    Ok(resolver.organisation(&source, key).await?.map(|organisation| {
        Row::OrganisationGeography(OrganisationGeography {
            organisation: organisation.entity.entity,
            geography: geography.entity.entity,
            dates: record.dates,
        })
    }))
}
