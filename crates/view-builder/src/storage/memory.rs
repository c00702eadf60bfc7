//! In-memory view store
//!
//! Holds committed rows in process memory and enforces the same identity, uniqueness and
//! join-endpoint rules as the SQLite schema. A commit is applied to a copy of the tables and
//! only swapped in once every row has been accepted.

use crate::error::{BuildError, Result};
use crate::model::{Category, Entity, Geography, Organisation, Policy, Row};
use crate::reference::{EntityRef, Lookup, ReferenceStore, ViewSink};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use view_common::{EntityId, Typology};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default, Clone)]
struct Tables {
    entities: BTreeMap<EntityId, Entity>,
    categories: Vec<Category>,
    geographies: Vec<Geography>,
    policies: Vec<Policy>,
    organisations: Vec<Organisation>,
    /// (table, left endpoint, right endpoint) for joins keyed by their endpoints
    join_keys: BTreeSet<(&'static str, EntityId, EntityId)>,
    rows: Vec<Row>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every committed row, in commit order
    pub async fn rows(&self) -> Vec<Row> {
        self.tables.read().await.rows.clone()
    }

    pub async fn row_count(&self) -> usize {
        self.tables.read().await.rows.len()
    }
}

impl Tables {
    fn insert_entity(&mut self, entity: &Entity) -> Result<()> {
        if self.entities.contains_key(&entity.entity) {
            return Err(BuildError::storage(format!(
                "entity {} already exists",
                entity.entity
            )));
        }
        self.entities.insert(entity.entity, entity.clone());
        Ok(())
    }

    fn require(&self, entity: EntityId, typology: Typology) -> Result<()> {
        match self.entities.get(&entity) {
            Some(found) if found.typology == typology => Ok(()),
            _ => Err(BuildError::storage(format!(
                "join references missing {typology} {entity}"
            ))),
        }
    }

    fn join(
        &mut self,
        table: &'static str,
        left: (EntityId, Typology),
        right: (EntityId, Typology),
    ) -> Result<()> {
        self.require(left.0, left.1)?;
        self.require(right.0, right.1)?;
        if !self.join_keys.insert((table, left.0, right.0)) {
            return Err(BuildError::storage(format!(
                "duplicate {table} join ({}, {})",
                left.0, right.0
            )));
        }
        Ok(())
    }

    fn apply(&mut self, row: &Row) -> Result<()> {
        use Typology::{Category as C, Document as D, Geography as G, Organisation as O, Policy as P};

        match row {
            Row::Category(category) => {
                if self
                    .categories
                    .iter()
                    .any(|c| c.category == category.category && c.type_ == category.type_)
                {
                    return Err(BuildError::storage(format!(
                        "category {:?} of type {:?} already exists",
                        category.category, category.type_
                    )));
                }
                self.insert_entity(&category.entity)?;
                self.categories.push(category.clone());
            },
            Row::Geography(geography) => {
                if self
                    .geographies
                    .iter()
                    .any(|g| g.geography == geography.geography)
                {
                    return Err(BuildError::storage(format!(
                        "geography {:?} already exists",
                        geography.geography
                    )));
                }
                self.insert_entity(&geography.entity)?;
                self.geographies.push(geography.clone());
            },
            Row::Policy(policy) => {
                if self.policies.iter().any(|p| p.policy == policy.policy) {
                    return Err(BuildError::storage(format!(
                        "policy {:?} already exists",
                        policy.policy
                    )));
                }
                self.insert_entity(&policy.entity)?;
                self.policies.push(policy.clone());
            },
            Row::Document(document) => self.insert_entity(&document.entity)?,
            Row::Organisation(organisation) => {
                if self
                    .organisations
                    .iter()
                    .any(|o| o.organisation == organisation.organisation)
                {
                    return Err(BuildError::storage(format!(
                        "organisation {:?} already exists",
                        organisation.organisation
                    )));
                }
                self.insert_entity(&organisation.entity)?;
                self.organisations.push(organisation.clone());
            },
            Row::PolicyCategory(j) => self.join("policy_category", (j.policy, P), (j.category, C))?,
            Row::PolicyGeography(j) => {
                self.join("policy_geography", (j.policy, P), (j.geography, G))?
            },
            Row::PolicyOrganisation(j) => {
                self.join("policy_organisation", (j.policy, P), (j.organisation, O))?
            },
            Row::PolicyDocument(j) => self.join("policy_document", (j.policy, P), (j.document, D))?,
            Row::DocumentCategory(j) => {
                self.join("document_category", (j.document, D), (j.category, C))?
            },
            Row::DocumentOrganisation(j) => {
                self.join("document_organisation", (j.document, D), (j.organisation, O))?
            },
            Row::DocumentGeography(j) => {
                self.join("document_geography", (j.document, D), (j.geography, G))?
            },
            Row::GeographyCategory(j) => {
                self.join("geography_category", (j.geography, G), (j.category, C))?
            },
            // Each metric is a new row, so only the geography endpoint is checked
            Row::GeographyMetric(j) => self.require(j.geography, G)?,
            Row::OrganisationGeography(j) => {
                self.join("organisation_geography", (j.organisation, O), (j.geography, G))?
            },
        }
        self.rows.push(row.clone());
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn find_organisation_by_key(&self, organisation: &str) -> Result<Lookup<Organisation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .organisations
            .iter()
            .find(|o| o.organisation == organisation)
            .cloned()
            .into())
    }

    async fn find_category_by_key_and_type(
        &self,
        category: &str,
        type_: &str,
    ) -> Result<Lookup<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .find(|c| c.category == category && c.type_ == type_)
            .cloned()
            .into())
    }

    async fn find_geography_by_key(&self, geography: &str) -> Result<Lookup<Geography>> {
        let tables = self.tables.read().await;
        Ok(tables
            .geographies
            .iter()
            .find(|g| g.geography == geography)
            .cloned()
            .into())
    }

    async fn find_policy_by_key(&self, policy: &str) -> Result<Lookup<Policy>> {
        let tables = self.tables.read().await;
        Ok(tables
            .policies
            .iter()
            .find(|p| p.policy == policy)
            .cloned()
            .into())
    }

    async fn find_entity_by_id(&self, entity: EntityId) -> Result<Lookup<EntityRef>> {
        let tables = self.tables.read().await;
        Ok(tables
            .entities
            .get(&entity)
            .map(|found| EntityRef {
                entity: found.clone(),
                geographies: tables
                    .geographies
                    .iter()
                    .filter(|g| g.entity.entity == entity)
                    .cloned()
                    .collect(),
            })
            .into())
    }
}

#[async_trait]
impl ViewSink for MemoryStore {
    async fn commit(&self, rows: Vec<Row>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let mut pending = tables.clone();
        for row in &rows {
            pending.apply(row)?;
        }
        *tables = pending;
        Ok(rows.len() as u64)
    }
}
