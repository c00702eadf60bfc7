// Category datasets

use super::natural_key;
use crate::error::Result;
use crate::model::{Category, Entity, Row};
use crate::normalizer::NormalizedRecord;
use view_common::Typology;

/// Maps a record of a category dataset such as `developer-agreement-type`
///
/// The category's type is the dataset name, so every category dataset shares the one
/// `category` table.
#[derive(Debug, Clone)]
pub struct CategoryModel {
    dataset: String,
    record: NormalizedRecord,
}

impl CategoryModel {
    pub fn new(dataset: &str, record: NormalizedRecord) -> Self {
        Self {
            dataset: dataset.to_string(),
            record,
        }
    }

    pub fn to_rows(self) -> Result<Vec<Row>> {
        let category = natural_key(&self.record, &self.dataset, "category")?;
        let record = self.record;

        Ok(vec![Row::Category(Category {
            entity: Entity::new(record.entity, Typology::Category, &self.dataset),
            category,
            type_: self.dataset,
            name: record.text("name"),
            dates: record.dates,
        })])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::record;
    use chrono::NaiveDate;
    use view_common::EntityId;

    #[test]
    fn test_key_defaults_to_dataset_field() {
        let record = record(&[
            ("developer-agreement-type", "AAA"),
            ("name", "BBB"),
            ("entry-date", "2020-10-04"),
            ("start-date", "2020-10-05"),
            ("entity", "1"),
            ("extra_field", "CCC"),
        ]);

        let rows = CategoryModel::new("developer-agreement-type", record)
            .to_rows()
            .unwrap();
        assert_eq!(rows.len(), 1);

        let Row::Category(category) = &rows[0] else {
            panic!("expected a category row, got {:?}", rows[0]);
        };
        assert_eq!(category.category, "AAA");
        assert_eq!(category.type_, "developer-agreement-type");
        assert_eq!(category.name.as_deref(), Some("BBB"));
        assert_eq!(category.entity.entity, EntityId::new(1));
        assert_eq!(category.entity.typology, Typology::Category);
        assert_eq!(category.dates.start_date, NaiveDate::from_ymd_opt(2020, 10, 5));
    }

    #[test]
    fn test_category_field_takes_precedence() {
        let record = record(&[
            ("category", "explicit"),
            ("ownership-status", "fallback"),
            ("entry-date", "2020-10-04"),
            ("entity", "2"),
        ]);

        let rows = CategoryModel::new("ownership-status", record).to_rows().unwrap();
        assert!(matches!(&rows[0], Row::Category(c) if c.category == "explicit"));
    }

    #[test]
    fn test_missing_key_is_validation_error() {
        let record = record(&[("name", "BBB"), ("entry-date", "2020-10-04"), ("entity", "1")]);

        let err = CategoryModel::new("developer-agreement-type", record)
            .to_rows()
            .unwrap_err();
        assert!(err.is_validation());
    }
}
