//! Organisation reference loading
//!
//! Organisations are referenced by most datasets but are not built like them: they arrive as
//! a flat register (`entity`, `organisation`, `name` and optional dates) that is loaded ahead
//! of the dataset builds.

use crate::error::{BuildError, Result};
use crate::model::{Dates, Entity, Organisation, Row};
use crate::normalizer::{
    non_blank, optional_date, END_DATE_FIELD, ENTRY_DATE_FIELD, IDENTITY_FIELD,
    START_DATE_FIELD,
};
use crate::reference::ViewSink;
use crate::source::SourceRecord;
use tracing::info;
use view_common::{EntityId, Typology};

/// Dataset name organisation entities are tagged with
pub const ORGANISATION_DATASET: &str = "organisation";

/// Organisation row for one register entry
pub fn organisation_from_record(record: &SourceRecord) -> Result<Organisation> {
    let entity = non_blank(record, IDENTITY_FIELD)
        .ok_or_else(|| BuildError::validation("missing identity field"))?;
    let entity = entity
        .parse::<EntityId>()
        .map_err(|_| BuildError::validation(format!("invalid identity field: {entity:?}")))?;
    let organisation = non_blank(record, "organisation")
        .ok_or_else(|| BuildError::validation("missing organisation field"))?;

    Ok(Organisation {
        entity: Entity::new(entity, Typology::Organisation, ORGANISATION_DATASET),
        organisation: organisation.to_string(),
        name: non_blank(record, "name").map(str::to_string),
        dates: Dates {
            entry_date: optional_date(record, ENTRY_DATE_FIELD)?,
            start_date: optional_date(record, START_DATE_FIELD)?,
            end_date: optional_date(record, END_DATE_FIELD)?,
        },
    })
}

/// Load every register entry in one commit
pub async fn load_organisations<S, I>(sink: &S, records: I) -> Result<u64>
where
    S: ViewSink,
    I: IntoIterator<Item = Result<SourceRecord>>,
{
    let mut rows = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        let organisation = record
            .and_then(|record| organisation_from_record(&record))
            .map_err(|e| e.at_record(ORGANISATION_DATASET, index + 1))?;
        rows.push(Row::Organisation(organisation));
    }

    let loaded = sink
        .commit(rows)
        .await
        .map_err(|e| e.at_commit(ORGANISATION_DATASET))?;
    info!("Loaded {} organisations", loaded);
    Ok(loaded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::reference::ReferenceStore;
    use crate::source::CsvSource;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    const REGISTER: &str = "\
entity,organisation,name,entry-date,start-date,end-date
600001,government-organisation:D1342,Department for Levelling Up,2021-01-01,,
600002,local-authority-eng:HPL,Hartlepool Borough Council,,2019-04-01,
";

    #[test]
    fn test_organisation_from_record() {
        let record: SourceRecord = [
            ("entity", "600001"),
            ("organisation", "government-organisation:D1342"),
            ("name", "Department for Levelling Up"),
            ("entry-date", "2021-01-01"),
            ("end-date", ""),
        ]
        .into_iter()
        .collect();

        let organisation = organisation_from_record(&record).unwrap();
        assert_eq!(organisation.entity.entity, EntityId::new(600001));
        assert_eq!(organisation.entity.dataset, ORGANISATION_DATASET);
        assert_eq!(organisation.dates.entry_date, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(organisation.dates.end_date, None);
    }

    #[test]
    fn test_missing_organisation_key() {
        let record: SourceRecord = [("entity", "1"), ("name", "x")].into_iter().collect();
        let err = organisation_from_record(&record).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: missing organisation field");
    }

    #[tokio::test]
    async fn test_load_register() {
        let store = MemoryStore::new();
        let source = CsvSource::from_reader(REGISTER.as_bytes()).unwrap();

        assert_eq!(load_organisations(&store, source).await.unwrap(), 2);

        let found = store
            .find_organisation_by_key("local-authority-eng:HPL")
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(found.name.as_deref(), Some("Hartlepool Borough Council"));
        assert_eq!(found.dates.start_date, NaiveDate::from_ymd_opt(2019, 4, 1));
    }

    #[tokio::test]
    async fn test_bad_entry_loads_nothing() {
        let store = MemoryStore::new();
        let register = "entity,organisation,name\n1,org:A,A\n2,org:B,B\nx,org:C,C\n";
        let source = CsvSource::from_reader(register.as_bytes()).unwrap();

        let err = load_organisations(&store, source).await.unwrap_err();
        assert!(err.to_string().contains("at record 3"));
        assert_eq!(store.row_count().await, 0);
    }
}
