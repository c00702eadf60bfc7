// Development policy dataset

use super::{natural_key, source_row, LOCAL_AUTHORITY_DISTRICT_PREFIX};
use crate::error::Result;
use crate::model::{Entity, Policy, PolicyCategory, PolicyGeography, PolicyOrganisation, Row};
use crate::normalizer::NormalizedRecord;
use crate::resolver::Resolver;
use std::collections::BTreeSet;
use view_common::Typology;

/// Category type of the entries in `development-policy-categories`
pub const POLICY_CATEGORY_TYPE: &str = "development-policy-category";

/// Maps a `development-policy` record to its policy row and joins
///
/// Joins follow the policy row in field order: categories, organisation, geographies.
#[derive(Debug, Clone)]
pub struct PolicyModel {
    dataset: String,
    record: NormalizedRecord,
}

impl PolicyModel {
    pub fn new(dataset: &str, record: NormalizedRecord) -> Self {
        Self {
            dataset: dataset.to_string(),
            record,
        }
    }

    pub async fn to_rows(self, resolver: &mut Resolver<'_>) -> Result<Vec<Row>> {
        let record = &self.record;
        let key = natural_key(record, &self.dataset, "policy")?;
        let policy = record.entity;
        let source = source_row(&self.dataset, &key, policy);

        let mut rows = vec![Row::Policy(Policy {
            entity: Entity::new(policy, Typology::Policy, &self.dataset),
            policy: key,
            name: record.text("name"),
            description: record.text("description"),
            notes: record.text("notes"),
            dates: record.dates,
        })];

        // Distinct keys can still resolve to the same row; each endpoint is joined once
        let mut joined = BTreeSet::new();
        for category in record.list("development-policy-categories") {
            let Some(found) = resolver.category(&source, category, POLICY_CATEGORY_TYPE).await?
            else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::PolicyCategory(PolicyCategory {
                    policy,
                    category: found.entity.entity,
                }));
            }
        }

        if let Some(organisation) = record.field("organisation") {
            if let Some(found) = resolver.organisation(&source, organisation).await? {
                rows.push(Row::PolicyOrganisation(PolicyOrganisation {
                    policy,
                    organisation: found.entity.entity,
                    dates: record.dates,
                }));
            }
        }

        let mut joined = BTreeSet::new();
        for geography in record.list("geographies") {
            let key = format!("{LOCAL_AUTHORITY_DISTRICT_PREFIX}{geography}");
            let Some(found) = resolver.geography(&source, &key).await? else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::PolicyGeography(PolicyGeography {
                    policy,
                    geography: found.entity.entity,
                    dates: record.dates,
                }));
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{self, count, record};
    use crate::reference::ViewSink;
    use view_common::EntityId;

    fn development_policy() -> NormalizedRecord {
        record(&[
            ("development-policy", "AAA"),
            ("name", "BBB"),
            ("development-policy-categories", "A;B"),
            ("geographies", "A000000;B1111111"),
            ("entry-date", "2020-10-04"),
            ("start-date", "2020-10-05"),
            ("organisation", "government-organisation:CCC"),
            ("entity", "1"),
            ("notes", "ZZZ"),
            ("description", "a description"),
        ])
    }

    async fn reference_store() -> crate::storage::MemoryStore {
        fixtures::store(vec![
            fixtures::organisation(10, "government-organisation:CCC"),
            fixtures::category(20, "A", POLICY_CATEGORY_TYPE),
            fixtures::category(21, "B", POLICY_CATEGORY_TYPE),
            fixtures::geography(30, "local-authority-district:A000000", "local-authority-district"),
            fixtures::geography(31, "local-authority-district:B1111111", "local-authority-district"),
        ])
        .await
    }

    #[tokio::test]
    async fn test_development_policy_rows() {
        let store = reference_store().await;
        let mut resolver = Resolver::new(&store, false);

        let rows = PolicyModel::new("development-policy", development_policy())
            .to_rows(&mut resolver)
            .await
            .unwrap();
        assert_eq!(rows.len(), 6);

        let Row::Policy(policy) = &rows[0] else {
            panic!("expected a policy row, got {:?}", rows[0]);
        };
        assert_eq!(policy.policy, "AAA");
        assert_eq!(policy.name.as_deref(), Some("BBB"));
        assert_eq!(policy.notes.as_deref(), Some("ZZZ"));
        assert_eq!(policy.description.as_deref(), Some("a description"));
        assert_eq!(policy.entity.entity, EntityId::new(1));

        let own = EntityId::new(1);
        assert_eq!(
            count(&rows, |r| matches!(r, Row::PolicyCategory(j) if j.policy == own)),
            2
        );
        assert_eq!(
            count(&rows, |r| matches!(r, Row::PolicyOrganisation(j)
                if j.policy == own && j.organisation == EntityId::new(10))),
            1
        );
        assert_eq!(
            count(&rows, |r| matches!(r, Row::PolicyGeography(j) if j.policy == own)),
            2
        );

        // The row graph is accepted by a sink holding the references
        assert_eq!(store.commit(rows).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_missing_organisation_is_fatal_when_strict() {
        let store = fixtures::store(vec![
            fixtures::category(20, "A", POLICY_CATEGORY_TYPE),
            fixtures::category(21, "B", POLICY_CATEGORY_TYPE),
        ])
        .await;
        let mut resolver = Resolver::new(&store, false);

        let err = PolicyModel::new("development-policy", development_policy())
            .to_rows(&mut resolver)
            .await
            .unwrap_err();
        assert!(err.is_relationship());
        assert!(err.to_string().contains("development-policy:AAA"));
    }

    #[tokio::test]
    async fn test_one_of_three_geographies_unresolved_when_tolerant() {
        let store = fixtures::store(vec![
            fixtures::organisation(10, "government-organisation:CCC"),
            fixtures::category(20, "A", POLICY_CATEGORY_TYPE),
            fixtures::category(21, "B", POLICY_CATEGORY_TYPE),
            fixtures::geography(30, "local-authority-district:A000000", "local-authority-district"),
            fixtures::geography(32, "local-authority-district:C2222222", "local-authority-district"),
        ])
        .await;
        let mut resolver = Resolver::new(&store, true);
        let record = record(&[
            ("development-policy", "AAA"),
            ("development-policy-categories", "A;B"),
            ("geographies", "A000000;B1111111;C2222222"),
            ("organisation", "government-organisation:CCC"),
            ("entry-date", "2020-10-04"),
            ("entity", "1"),
        ]);

        let rows = PolicyModel::new("development-policy", record)
            .to_rows(&mut resolver)
            .await
            .unwrap();

        // Policy, two categories, organisation and two of the three geographies
        assert_eq!(rows.len(), 6);
        assert_eq!(resolver.broken(), 1);
        let geographies: Vec<_> = rows
            .iter()
            .filter_map(|r| match r {
                Row::PolicyGeography(j) => Some(j.geography),
                _ => None,
            })
            .collect();
        assert_eq!(geographies, vec![EntityId::new(30), EntityId::new(32)]);
    }

    #[tokio::test]
    async fn test_missing_reference_names_source_entity() {
        let store = fixtures::store(vec![]).await;
        let mut resolver = Resolver::new(&store, false);

        let err = PolicyModel::new("development-policy", development_policy())
            .to_rows(&mut resolver)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("development-policy:AAA (entity 1)"));
    }

    #[tokio::test]
    async fn test_only_unresolved_joins_omitted_when_tolerant() {
        let store = fixtures::store(vec![
            fixtures::organisation(10, "government-organisation:CCC"),
            fixtures::category(20, "A", POLICY_CATEGORY_TYPE),
            fixtures::geography(30, "local-authority-district:A000000", "local-authority-district"),
        ])
        .await;
        let mut resolver = Resolver::new(&store, true);

        let rows = PolicyModel::new("development-policy", development_policy())
            .to_rows(&mut resolver)
            .await
            .unwrap();

        // Category B and geography B1111111 are missing
        assert_eq!(rows.len(), 4);
        assert_eq!(resolver.broken(), 2);
        assert_eq!(count(&rows, |r| matches!(r, Row::PolicyCategory(_))), 1);
        assert_eq!(count(&rows, |r| matches!(r, Row::PolicyGeography(_))), 1);
    }
}
