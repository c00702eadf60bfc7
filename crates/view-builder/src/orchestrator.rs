//! Build orchestrator
//!
//! Runs one dataset build: selects the dataset's mapper variant, streams the source records
//! through normalize and map in order, and commits the accumulated rows in one transaction.
//! Any failure abandons the pending rows, so a failed build writes nothing.

use crate::config::BuildConfig;
use crate::dataset::{DatasetKind, DatasetRegistry};
use crate::error::Result;
use crate::model::Row;
use crate::normalizer::normalize;
use crate::progress::BuildProgress;
use crate::reference::{ReferenceStore, ViewSink};
use crate::resolver::Resolver;
use crate::source::SourceRecord;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// Per-build settings
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub allow_broken_relationships: bool,
    /// Records between progress log lines when no total is known
    pub progress_interval: u64,
    /// Draw a progress bar when the record total is known
    pub show_progress: bool,
    /// Date entry dates are checked against; today when unset
    pub build_date: Option<NaiveDate>,
}

impl From<&BuildConfig> for BuildOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            allow_broken_relationships: config.allow_broken_relationships,
            progress_interval: config.progress_interval,
            show_progress: false,
            build_date: None,
        }
    }
}

/// Outcome of a committed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    pub dataset: String,
    pub records: u64,
    pub rows: u64,
    /// Relationships that were not found and tolerated
    pub broken_relationships: usize,
}

pub struct ViewBuilder<'a, S> {
    registry: &'a DatasetRegistry,
    store: &'a S,
    options: BuildOptions,
}

impl<'a, S> ViewBuilder<'a, S>
where
    S: ReferenceStore + ViewSink,
{
    pub fn new(registry: &'a DatasetRegistry, store: &'a S, options: BuildOptions) -> Self {
        Self {
            registry,
            store,
            options,
        }
    }

    /// Build `dataset` from `records` and commit the result
    ///
    /// `total_hint` is the expected record count, used only for progress reporting.
    pub async fn build<I>(
        &self,
        dataset: &str,
        records: I,
        total_hint: Option<u64>,
    ) -> Result<BuildResult>
    where
        I: IntoIterator<Item = Result<SourceRecord>>,
    {
        // Unknown datasets fail before any record is read
        let kind = self.registry.kind(dataset)?;
        let build_date = self
            .options
            .build_date
            .unwrap_or_else(|| Local::now().date_naive());

        info!(
            "Building dataset {} ({} model, allow broken relationships: {})",
            dataset, kind, self.options.allow_broken_relationships
        );

        let mut resolver = Resolver::new(self.store, self.options.allow_broken_relationships);
        let mut progress = BuildProgress::new(
            dataset,
            total_hint,
            self.options.progress_interval,
            self.options.show_progress,
        );
        let mut pending: Vec<Row> = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let rows = match Self::map_record(dataset, kind, record, build_date, &mut resolver).await
            {
                Ok(rows) => rows,
                Err(e) => {
                    progress.abandon();
                    return Err(e.at_record(dataset, index + 1));
                },
            };
            pending.extend(rows);
            progress.record();
        }
        progress.finish();

        let records = progress.processed();
        info!("Mapped {} records of {} into {} rows", records, dataset, pending.len());

        let rows = self
            .store
            .commit(pending)
            .await
            .map_err(|e| e.at_commit(dataset))?;
        let broken_relationships = resolver.broken();

        info!(
            "Built {}: {} records, {} rows committed, {} broken relationships",
            dataset, records, rows, broken_relationships
        );

        Ok(BuildResult {
            dataset: dataset.to_string(),
            records,
            rows,
            broken_relationships,
        })
    }

    async fn map_record(
        dataset: &str,
        kind: DatasetKind,
        record: Result<SourceRecord>,
        build_date: NaiveDate,
        resolver: &mut Resolver<'_>,
    ) -> Result<Vec<Row>> {
        let normalized = normalize(record?, build_date)?;
        debug!("Mapping {} entity {}", dataset, normalized.entity);
        kind.construct(dataset, normalized).to_rows(resolver).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{self, today};
    use crate::storage::MemoryStore;

    fn options(allow_broken: bool) -> BuildOptions {
        BuildOptions {
            allow_broken_relationships: allow_broken,
            progress_interval: 1,
            show_progress: false,
            build_date: Some(today()),
        }
    }

    fn records(rows: &[&[(&str, &str)]]) -> Vec<Result<SourceRecord>> {
        rows.iter()
            .map(|fields| Ok(fields.iter().copied().collect()))
            .collect()
    }

    #[tokio::test]
    async fn test_category_build_commits_all_records() {
        let registry = DatasetRegistry::standard();
        let store = MemoryStore::new();
        let builder = ViewBuilder::new(&registry, &store, options(false));

        let result = builder
            .build(
                "developer-agreement-type",
                records(&[
                    &[("entity", "1"), ("entry-date", "2020-10-04"), ("developer-agreement-type", "s106")],
                    &[("entity", "2"), ("entry-date", "2020-10-04"), ("developer-agreement-type", "cil")],
                ]),
                Some(2),
            )
            .await
            .unwrap();

        assert_eq!(
            result,
            BuildResult {
                dataset: "developer-agreement-type".to_string(),
                records: 2,
                rows: 2,
                broken_relationships: 0,
            }
        );
        assert_eq!(store.row_count().await, 2);
    }

    #[tokio::test]
    async fn test_failed_record_is_located_and_nothing_committed() {
        let registry = DatasetRegistry::standard();
        let store = MemoryStore::new();
        let builder = ViewBuilder::new(&registry, &store, options(false));

        let err = builder
            .build(
                "developer-agreement-type",
                records(&[
                    &[("entity", "1"), ("entry-date", "2020-10-04"), ("developer-agreement-type", "s106")],
                    &[("entity", "2"), ("entry-date", "2030-01-01"), ("developer-agreement-type", "cil")],
                ]),
                None,
            )
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("at record 2"));
        assert_eq!(store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_commit_names_dataset() {
        let registry = DatasetRegistry::standard();
        let store = MemoryStore::new();
        let builder = ViewBuilder::new(&registry, &store, options(false));

        // Both records map cleanly but share a natural key
        let err = builder
            .build(
                "developer-agreement-type",
                records(&[
                    &[("entity", "1"), ("entry-date", "2020-10-04"), ("developer-agreement-type", "cil")],
                    &[("entity", "2"), ("entry-date", "2020-10-04"), ("developer-agreement-type", "cil")],
                ]),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err.root(), crate::error::BuildError::Storage(_)));
        assert!(err
            .to_string()
            .contains("\"developer-agreement-type\" failed at commit"));
        assert_eq!(store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_broken_relationships_are_reported() {
        let registry = DatasetRegistry::standard();
        let store = fixtures::store(vec![]).await;
        let builder = ViewBuilder::new(&registry, &store, options(true));

        let result = builder
            .build(
                "local-authority-district",
                records(&[&[
                    ("entity", "5"),
                    ("entry-date", "2020-10-04"),
                    ("geography", "local-authority-district:E06000001"),
                    ("organisation", "local-authority-eng:HPL"),
                ]]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.rows, 1);
        assert_eq!(result.broken_relationships, 1);
    }

    #[tokio::test]
    async fn test_empty_stream_commits_nothing() {
        let registry = DatasetRegistry::standard();
        let store = MemoryStore::new();
        let builder = ViewBuilder::new(&registry, &store, options(false));

        let result = builder.build("parish", Vec::<Result<SourceRecord>>::new(), Some(0)).await.unwrap();
        assert_eq!(result.records, 0);
        assert_eq!(result.rows, 0);
    }

    #[test]
    fn test_options_from_config() {
        let config = BuildConfig::default().with_allow_broken_relationships(true);
        let options = BuildOptions::from(&config);
        assert!(options.allow_broken_relationships);
        assert_eq!(options.progress_interval, config.progress_interval);
        assert!(options.build_date.is_none());
    }
}
