//! SQLite view database
//!
//! The view schema is embedded from `migrations/` and applied on open. Lookups read from the
//! pool; a commit writes the whole write set inside one transaction, which is rolled back when
//! any insert fails.

use crate::error::{BuildError, Result};
use crate::model::{Category, Dates, Entity, Geography, Organisation, Policy, Row, RowKind};
use crate::reference::{EntityRef, Lookup, ReferenceStore, ViewSink};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};
use view_common::{EntityId, Typology};

/// Default pool size for file-backed databases
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

pub struct SqliteViewStore {
    pool: SqlitePool,
}

impl SqliteViewStore {
    /// Open (creating if needed) a view database and apply the schema
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Opened view database {}", database_url);
        Ok(store)
    }

    /// Private in-memory database, held on a single connection so it survives between queries
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Number of rows currently in the table a row kind lands in
    pub async fn count(&self, kind: RowKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// ============================================================================
// Row records
// ============================================================================

fn entity(entity: i64, typology: &str, dataset: String) -> Result<Entity> {
    Ok(Entity::new(
        EntityId::new(entity),
        typology.parse::<Typology>()?,
        dataset,
    ))
}

#[derive(sqlx::FromRow)]
struct EntityRecord {
    entity: i64,
    typology: String,
    dataset: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRecord {
    entity: i64,
    typology: String,
    dataset: String,
    category: String,
    #[sqlx(rename = "type")]
    type_: String,
    name: Option<String>,
    entry_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = BuildError;

    fn try_from(r: CategoryRecord) -> Result<Self> {
        Ok(Category {
            entity: entity(r.entity, &r.typology, r.dataset)?,
            category: r.category,
            type_: r.type_,
            name: r.name,
            dates: Dates {
                entry_date: r.entry_date,
                start_date: r.start_date,
                end_date: r.end_date,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct GeographyRecord {
    entity: i64,
    typology: String,
    dataset: String,
    geography: String,
    geometry: Option<String>,
    point: Option<String>,
    name: Option<String>,
    notes: Option<String>,
    documentation_url: Option<String>,
    #[sqlx(rename = "type")]
    type_: String,
    entry_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl TryFrom<GeographyRecord> for Geography {
    type Error = BuildError;

    fn try_from(r: GeographyRecord) -> Result<Self> {
        Ok(Geography {
            entity: entity(r.entity, &r.typology, r.dataset)?,
            geography: r.geography,
            geometry: r.geometry,
            point: r.point,
            name: r.name,
            notes: r.notes,
            documentation_url: r.documentation_url,
            type_: r.type_,
            dates: Dates {
                entry_date: r.entry_date,
                start_date: r.start_date,
                end_date: r.end_date,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct PolicyRecord {
    entity: i64,
    typology: String,
    dataset: String,
    policy: String,
    name: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    entry_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl TryFrom<PolicyRecord> for Policy {
    type Error = BuildError;

    fn try_from(r: PolicyRecord) -> Result<Self> {
        Ok(Policy {
            entity: entity(r.entity, &r.typology, r.dataset)?,
            policy: r.policy,
            name: r.name,
            description: r.description,
            notes: r.notes,
            dates: Dates {
                entry_date: r.entry_date,
                start_date: r.start_date,
                end_date: r.end_date,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrganisationRecord {
    entity: i64,
    typology: String,
    dataset: String,
    organisation: String,
    name: Option<String>,
    entry_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl TryFrom<OrganisationRecord> for Organisation {
    type Error = BuildError;

    fn try_from(r: OrganisationRecord) -> Result<Self> {
        Ok(Organisation {
            entity: entity(r.entity, &r.typology, r.dataset)?,
            organisation: r.organisation,
            name: r.name,
            dates: Dates {
                entry_date: r.entry_date,
                start_date: r.start_date,
                end_date: r.end_date,
            },
        })
    }
}

const GEOGRAPHY_COLUMNS: &str = r#"
    g.entity, e.typology, e.dataset, g.geography, g.geometry, g.point, g.name, g.notes,
    g.documentation_url, g.type, g.entry_date, g.start_date, g.end_date
"#;

// ============================================================================
// Lookups
// ============================================================================

#[async_trait]
impl ReferenceStore for SqliteViewStore {
    async fn find_organisation_by_key(&self, organisation: &str) -> Result<Lookup<Organisation>> {
        let record = sqlx::query_as::<_, OrganisationRecord>(
            r#"
            SELECT o.entity, e.typology, e.dataset, o.organisation, o.name,
                   o.entry_date, o.start_date, o.end_date
            FROM organisation o JOIN entity e ON e.entity = o.entity
            WHERE o.organisation = ?1
            "#,
        )
        .bind(organisation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Organisation::try_from).transpose()?.into())
    }

    async fn find_category_by_key_and_type(
        &self,
        category: &str,
        type_: &str,
    ) -> Result<Lookup<Category>> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            r#"
            SELECT c.entity, e.typology, e.dataset, c.category, c.type, c.name,
                   c.entry_date, c.start_date, c.end_date
            FROM category c JOIN entity e ON e.entity = c.entity
            WHERE c.category = ?1 AND c.type = ?2
            "#,
        )
        .bind(category)
        .bind(type_)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Category::try_from).transpose()?.into())
    }

    async fn find_geography_by_key(&self, geography: &str) -> Result<Lookup<Geography>> {
        let sql = format!(
            "SELECT {GEOGRAPHY_COLUMNS} FROM geography g JOIN entity e ON e.entity = g.entity \
             WHERE g.geography = ?1"
        );
        let record = sqlx::query_as::<_, GeographyRecord>(&sql)
            .bind(geography)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Geography::try_from).transpose()?.into())
    }

    async fn find_policy_by_key(&self, policy: &str) -> Result<Lookup<Policy>> {
        let record = sqlx::query_as::<_, PolicyRecord>(
            r#"
            SELECT p.entity, e.typology, e.dataset, p.policy, p.name, p.description, p.notes,
                   p.entry_date, p.start_date, p.end_date
            FROM policy p JOIN entity e ON e.entity = p.entity
            WHERE p.policy = ?1
            "#,
        )
        .bind(policy)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Policy::try_from).transpose()?.into())
    }

    async fn find_entity_by_id(&self, id: EntityId) -> Result<Lookup<EntityRef>> {
        let record = sqlx::query_as::<_, EntityRecord>(
            "SELECT entity, typology, dataset FROM entity WHERE entity = ?1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(Lookup::NotFound);
        };

        let sql = format!(
            "SELECT {GEOGRAPHY_COLUMNS} FROM geography g JOIN entity e ON e.entity = g.entity \
             WHERE g.entity = ?1 ORDER BY g.rowid"
        );
        let geographies = sqlx::query_as::<_, GeographyRecord>(&sql)
            .bind(id.get())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Geography::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Lookup::Found(EntityRef {
            entity: entity(record.entity, &record.typology, record.dataset)?,
            geographies,
        }))
    }
}

// ============================================================================
// Commit
// ============================================================================

#[async_trait]
impl ViewSink for SqliteViewStore {
    async fn commit(&self, rows: Vec<Row>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        for row in &rows {
            insert_row(&mut *tx, row).await?;
        }

        tx.commit().await?;
        debug!("Committed {} rows", rows.len());
        Ok(rows.len() as u64)
    }
}

async fn insert_entity(conn: &mut SqliteConnection, entity: &Entity) -> Result<()> {
    sqlx::query("INSERT INTO entity (entity, typology, dataset) VALUES (?1, ?2, ?3)")
        .bind(entity.entity.get())
        .bind(entity.typology.as_str())
        .bind(&entity.dataset)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Insert a join between two entities, with dates for the join tables that carry them
async fn insert_join(
    conn: &mut SqliteConnection,
    kind: RowKind,
    (left, right): (&str, &str),
    (left_id, right_id): (EntityId, EntityId),
    dates: Option<&Dates>,
) -> Result<()> {
    let table = kind.table_name();
    match dates {
        Some(dates) => {
            let sql = format!(
                "INSERT INTO {table} ({left}, {right}, entry_date, start_date, end_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            );
            sqlx::query(&sql)
                .bind(left_id.get())
                .bind(right_id.get())
                .bind(dates.entry_date)
                .bind(dates.start_date)
                .bind(dates.end_date)
                .execute(&mut *conn)
                .await?;
        },
        None => {
            let sql = format!("INSERT INTO {table} ({left}, {right}) VALUES (?1, ?2)");
            sqlx::query(&sql)
                .bind(left_id.get())
                .bind(right_id.get())
                .execute(&mut *conn)
                .await?;
        },
    }
    Ok(())
}

async fn insert_row(conn: &mut SqliteConnection, row: &Row) -> Result<()> {
    let kind = row.kind();
    match row {
        Row::Category(c) => {
            insert_entity(conn, &c.entity).await?;
            sqlx::query(
                r#"
                INSERT INTO category (entity, category, type, name, entry_date, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(c.entity.entity.get())
            .bind(&c.category)
            .bind(&c.type_)
            .bind(&c.name)
            .bind(c.dates.entry_date)
            .bind(c.dates.start_date)
            .bind(c.dates.end_date)
            .execute(&mut *conn)
            .await?;
        },
        Row::Geography(g) => {
            insert_entity(conn, &g.entity).await?;
            sqlx::query(
                r#"
                INSERT INTO geography (entity, geography, geometry, point, name, notes,
                                       documentation_url, type, entry_date, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(g.entity.entity.get())
            .bind(&g.geography)
            .bind(&g.geometry)
            .bind(&g.point)
            .bind(&g.name)
            .bind(&g.notes)
            .bind(&g.documentation_url)
            .bind(&g.type_)
            .bind(g.dates.entry_date)
            .bind(g.dates.start_date)
            .bind(g.dates.end_date)
            .execute(&mut *conn)
            .await?;
        },
        Row::Policy(p) => {
            insert_entity(conn, &p.entity).await?;
            sqlx::query(
                r#"
                INSERT INTO policy (entity, policy, name, description, notes,
                                    entry_date, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(p.entity.entity.get())
            .bind(&p.policy)
            .bind(&p.name)
            .bind(&p.description)
            .bind(&p.notes)
            .bind(p.dates.entry_date)
            .bind(p.dates.start_date)
            .bind(p.dates.end_date)
            .execute(&mut *conn)
            .await?;
        },
        Row::Document(d) => {
            insert_entity(conn, &d.entity).await?;
            sqlx::query(
                r#"
                INSERT INTO document (entity, document, name, description, notes, document_url,
                                      entry_date, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(d.entity.entity.get())
            .bind(&d.document)
            .bind(&d.name)
            .bind(&d.description)
            .bind(&d.notes)
            .bind(&d.document_url)
            .bind(d.dates.entry_date)
            .bind(d.dates.start_date)
            .bind(d.dates.end_date)
            .execute(&mut *conn)
            .await?;
        },
        Row::Organisation(o) => {
            insert_entity(conn, &o.entity).await?;
            sqlx::query(
                r#"
                INSERT INTO organisation (entity, organisation, name, entry_date, start_date, end_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(o.entity.entity.get())
            .bind(&o.organisation)
            .bind(&o.name)
            .bind(o.dates.entry_date)
            .bind(o.dates.start_date)
            .bind(o.dates.end_date)
            .execute(&mut *conn)
            .await?;
        },
        Row::GeographyMetric(j) => {
            let metric = sqlx::query("INSERT INTO metric (field, value) VALUES (?1, ?2)")
                .bind(&j.metric.field)
                .bind(&j.metric.value)
                .execute(&mut *conn)
                .await?
                .last_insert_rowid();
            sqlx::query("INSERT INTO geography_metric (geography, metric) VALUES (?1, ?2)")
                .bind(j.geography.get())
                .bind(metric)
                .execute(&mut *conn)
                .await?;
        },
        Row::PolicyCategory(j) => {
            insert_join(conn, kind, ("policy", "category"), (j.policy, j.category), None).await?
        },
        Row::PolicyGeography(j) => {
            insert_join(
                conn,
                kind,
                ("policy", "geography"),
                (j.policy, j.geography),
                Some(&j.dates),
            )
            .await?
        },
        Row::PolicyOrganisation(j) => {
            insert_join(
                conn,
                kind,
                ("policy", "organisation"),
                (j.policy, j.organisation),
                Some(&j.dates),
            )
            .await?
        },
        Row::PolicyDocument(j) => {
            insert_join(conn, kind, ("policy", "document"), (j.policy, j.document), None).await?
        },
        Row::DocumentCategory(j) => {
            insert_join(conn, kind, ("document", "category"), (j.document, j.category), None)
                .await?
        },
        Row::DocumentOrganisation(j) => {
            insert_join(
                conn,
                kind,
                ("document", "organisation"),
                (j.document, j.organisation),
                Some(&j.dates),
            )
            .await?
        },
        Row::DocumentGeography(j) => {
            insert_join(
                conn,
                kind,
                ("document", "geography"),
                (j.document, j.geography),
                Some(&j.dates),
            )
            .await?
        },
        Row::GeographyCategory(j) => {
            insert_join(conn, kind, ("geography", "category"), (j.geography, j.category), None)
                .await?
        },
        Row::OrganisationGeography(j) => {
            insert_join(
                conn,
                kind,
                ("organisation", "geography"),
                (j.organisation, j.geography),
                Some(&j.dates),
            )
            .await?
        },
    }
    Ok(())
}
