//! Reference store and view sink interfaces
//!
//! The build reads reference rows persisted by earlier builds through [`ReferenceStore`] and
//! hands its finished write set to a [`ViewSink`]. Both are implemented by the SQLite view
//! database and by the in-memory store in [`crate::storage`].

use crate::error::Result;
use crate::model::{Category, Entity, Geography, Organisation, Policy, Row};
use async_trait::async_trait;
use view_common::EntityId;

/// Outcome of a natural-key lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(row) => Some(row),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(row: Option<T>) -> Self {
        match row {
            Some(row) => Lookup::Found(row),
            None => Lookup::NotFound,
        }
    }
}

/// An entity with the geographies attached to it, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub entity: Entity,
    pub geographies: Vec<Geography>,
}

impl EntityRef {
    pub fn first_geography(&self) -> Option<&Geography> {
        self.geographies.first()
    }
}

/// Read-only access to persisted reference rows
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn find_organisation_by_key(&self, organisation: &str) -> Result<Lookup<Organisation>>;

    async fn find_category_by_key_and_type(
        &self,
        category: &str,
        type_: &str,
    ) -> Result<Lookup<Category>>;

    async fn find_geography_by_key(&self, geography: &str) -> Result<Lookup<Geography>>;

    async fn find_policy_by_key(&self, policy: &str) -> Result<Lookup<Policy>>;

    async fn find_entity_by_id(&self, entity: EntityId) -> Result<Lookup<EntityRef>>;
}

/// Destination for a build's write set
#[async_trait]
pub trait ViewSink: Send + Sync {
    /// Persist every row in order, or none of them
    ///
    /// Returns the number of rows written.
    async fn commit(&self, rows: Vec<Row>) -> Result<u64>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_from_option() {
        assert_eq!(Lookup::from(Some(3)), Lookup::Found(3));
        assert_eq!(Lookup::<i32>::from(None), Lookup::NotFound);
        assert!(Lookup::Found("x").is_found());
        assert_eq!(Lookup::<i32>::NotFound.into_option(), None);
    }
}
