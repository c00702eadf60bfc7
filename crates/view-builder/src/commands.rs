//! Command implementations for the `view-builder` binary

use crate::config::{database_url_for, BuildConfig};
use crate::dataset::{DatasetKind, DatasetRegistry};
use crate::error::Result;
use crate::orchestrator::{BuildOptions, BuildResult, ViewBuilder};
use crate::organisation::load_organisations;
use crate::source::CsvSource;
use crate::storage::SqliteViewStore;
use std::path::Path;
use tracing::info;

/// Resolve the database argument against the configured default
pub fn database_url(config: &BuildConfig, database: Option<&str>) -> String {
    database
        .map(database_url_for)
        .unwrap_or_else(|| config.database_url.clone())
}

/// Create the view schema
pub async fn init(database_url: &str) -> Result<()> {
    let store = SqliteViewStore::open(database_url).await?;
    info!("View schema ready in {}", database_url);
    store.close().await;
    Ok(())
}

/// Build one dataset from a CSV file into the view database
pub async fn build(
    config: &BuildConfig,
    registry: &DatasetRegistry,
    dataset: &str,
    input: &Path,
    show_progress: bool,
) -> Result<BuildResult> {
    // Fail on an unknown dataset before touching the input
    registry.kind(dataset)?;

    let total = if show_progress {
        Some(CsvSource::count_rows(input)?)
    } else {
        None
    };

    let store = SqliteViewStore::open(&config.database_url).await?;
    let options = BuildOptions {
        show_progress,
        ..BuildOptions::from(config)
    };
    let builder = ViewBuilder::new(registry, &store, options);

    info!("Reading {} from {}", dataset, input.display());
    let records = CsvSource::open(input)?;
    let result = builder.build(dataset, records, total).await;
    store.close().await;
    result
}

/// Load the organisation register from a CSV file
pub async fn load_organisation_register(config: &BuildConfig, input: &Path) -> Result<u64> {
    let store = SqliteViewStore::open(&config.database_url).await?;
    let records = CsvSource::open(input)?;
    let result = load_organisations(&store, records).await;
    store.close().await;
    result
}

/// Registered datasets with their mapper variant, in name order
pub fn datasets(registry: &DatasetRegistry) -> Vec<(String, DatasetKind)> {
    registry
        .datasets()
        .map(|(name, kind)| (name.to_string(), kind))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::RowKind;
    use std::io::Write;

    #[test]
    fn test_database_url_prefers_argument() {
        let config = BuildConfig::default();
        assert_eq!(database_url(&config, Some("out.db")), "sqlite:out.db");
        assert_eq!(database_url(&config, None), config.database_url);
    }

    #[tokio::test]
    async fn test_unknown_dataset_does_not_read_input() {
        let config = BuildConfig::default();
        let registry = DatasetRegistry::standard();

        // The input path does not exist; the registry error must come first
        let err = build(&config, &registry, "no-such-dataset", Path::new("/nonexistent.csv"), true)
            .await
            .unwrap_err();
        assert!(err.is_registry());
    }

    #[tokio::test]
    async fn test_build_from_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("view.db");
        let config = BuildConfig::default().with_database_url(database_url_for(&db.to_string_lossy()));
        let registry = DatasetRegistry::standard();

        let mut input = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        writeln!(input, "entity,developer-agreement-type,name,entry-date").unwrap();
        writeln!(input, "1,section-106,Section 106,2020-10-04").unwrap();
        writeln!(input, "2,cil,Community Infrastructure Levy,2020-10-04").unwrap();

        init(&config.database_url).await.unwrap();
        let result = build(&config, &registry, "developer-agreement-type", input.path(), true)
            .await
            .unwrap();
        assert_eq!(result.records, 2);
        assert_eq!(result.rows, 2);

        let store = SqliteViewStore::open(&config.database_url).await.unwrap();
        assert_eq!(store.count(RowKind::Category).await.unwrap(), 2);
        store.close().await;
    }

    #[test]
    fn test_datasets_listed_in_name_order() {
        let listed = datasets(&DatasetRegistry::standard());
        let names: Vec<_> = listed.iter().map(|(name, _)| name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"brownfield-land"));
    }
}
