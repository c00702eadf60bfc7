//! Relationship resolution
//!
//! Mappers turn natural keys into reference rows through a [`Resolver`]. Every lookup goes
//! through the same broken-relationship policy: a missing reference either fails the build or,
//! when broken relationships are allowed, is logged and counted so the mapper can leave the
//! join out.

use crate::error::{BuildError, Result};
use crate::model::{Category, Geography, Organisation, Policy};
use crate::reference::{EntityRef, Lookup, ReferenceStore};
use tracing::warn;
use view_common::EntityId;

pub struct Resolver<'a> {
    store: &'a dyn ReferenceStore,
    allow_broken: bool,
    broken: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn ReferenceStore, allow_broken: bool) -> Self {
        Self {
            store,
            allow_broken,
            broken: 0,
        }
    }

    /// Relationships tolerated so far
    pub fn broken(&self) -> usize {
        self.broken
    }

    pub async fn organisation(
        &mut self,
        source_row: &str,
        organisation: &str,
    ) -> Result<Option<Organisation>> {
        let lookup = self.store.find_organisation_by_key(organisation).await?;
        self.settle(lookup, source_row, organisation)
    }

    pub async fn category(
        &mut self,
        source_row: &str,
        category: &str,
        type_: &str,
    ) -> Result<Option<Category>> {
        let lookup = self
            .store
            .find_category_by_key_and_type(category, type_)
            .await?;
        self.settle(lookup, source_row, &format!("{type_}:{category}"))
    }

    pub async fn geography(
        &mut self,
        source_row: &str,
        geography: &str,
    ) -> Result<Option<Geography>> {
        let lookup = self.store.find_geography_by_key(geography).await?;
        self.settle(lookup, source_row, geography)
    }

    pub async fn policy(&mut self, source_row: &str, policy: &str) -> Result<Option<Policy>> {
        let lookup = self.store.find_policy_by_key(policy).await?;
        self.settle(lookup, source_row, policy)
    }

    pub async fn entity(&mut self, source_row: &str, entity: EntityId) -> Result<Option<EntityRef>> {
        let lookup = self.store.find_entity_by_id(entity).await?;
        self.settle(lookup, source_row, &entity.to_string())
    }

    /// Apply the policy to a reference that cannot be looked up at all, such as a malformed id
    pub fn unresolved(&mut self, source_row: &str, key: &str) -> Result<()> {
        self.settle(Lookup::<()>::NotFound, source_row, key).map(|_| ())
    }

    fn settle<T>(&mut self, lookup: Lookup<T>, source_row: &str, key: &str) -> Result<Option<T>> {
        match lookup {
            Lookup::Found(row) => Ok(Some(row)),
            Lookup::NotFound if self.allow_broken => {
                warn!("Broken relationship: {} references {:?}, omitting join", source_row, key);
                self.broken += 1;
                Ok(None)
            },
            Lookup::NotFound => Err(BuildError::relationship(source_row, key)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Dates, Entity, Row};
    use crate::reference::ViewSink;
    use crate::storage::MemoryStore;
    use view_common::Typology;

    async fn store_with_organisation() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .commit(vec![Row::Organisation(Organisation {
                entity: Entity::new(EntityId::new(10), Typology::Organisation, "organisation"),
                organisation: "government-organisation:CCC".to_string(),
                name: Some("some organisation".to_string()),
                dates: Dates::default(),
            })])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_found_returns_row() {
        let store = store_with_organisation().await;
        let mut resolver = Resolver::new(&store, false);

        let org = resolver
            .organisation("policy:AAA", "government-organisation:CCC")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(org.entity.entity, EntityId::new(10));
        assert_eq!(resolver.broken(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_fatal_when_strict() {
        let store = store_with_organisation().await;
        let mut resolver = Resolver::new(&store, false);

        let err = resolver
            .organisation("policy:AAA", "government-organisation:ZZZ")
            .await
            .unwrap_err();
        assert!(err.is_relationship());
        assert!(err.to_string().contains("policy:AAA"));
        assert!(err.to_string().contains("government-organisation:ZZZ"));
    }

    #[tokio::test]
    async fn test_not_found_is_counted_when_tolerant() {
        let store = store_with_organisation().await;
        let mut resolver = Resolver::new(&store, true);

        assert!(resolver.geography("policy:AAA", "local-authority-district:X").await.unwrap().is_none());
        assert!(resolver.category("policy:AAA", "A", "development-policy-category").await.unwrap().is_none());
        assert!(resolver.entity("document:AAA", EntityId::new(99)).await.unwrap().is_none());
        assert_eq!(resolver.broken(), 3);
    }

    #[tokio::test]
    async fn test_category_key_includes_type() {
        let store = MemoryStore::new();
        let mut resolver = Resolver::new(&store, false);

        let err = resolver
            .category("site:S1", "deliverable", "site-category")
            .await
            .unwrap_err();
        assert!(matches!(
            err.root(),
            BuildError::Relationship { key, .. } if key == "site-category:deliverable"
        ));
    }

    #[test]
    fn test_unresolved_reference_follows_policy() {
        let store = MemoryStore::new();

        let mut strict = Resolver::new(&store, false);
        let err = strict.unresolved("document:AAA (entity 3)", "abc").unwrap_err();
        assert!(matches!(
            err.root(),
            BuildError::Relationship { source_row, key }
                if source_row == "document:AAA (entity 3)" && key == "abc"
        ));

        let mut tolerant = Resolver::new(&store, true);
        tolerant.unresolved("document:AAA (entity 3)", "abc").unwrap();
        assert_eq!(tolerant.broken(), 1);
    }
}
