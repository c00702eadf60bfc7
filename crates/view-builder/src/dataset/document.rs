// Document datasets

use super::{natural_key, source_row, LOCAL_AUTHORITY_DISTRICT_PREFIX};
use crate::error::Result;
use crate::model::{
    Document, DocumentCategory, DocumentGeography, DocumentOrganisation, Entity, PolicyDocument,
    Row,
};
use crate::normalizer::NormalizedRecord;
use crate::resolver::Resolver;
use std::collections::BTreeSet;
use view_common::{EntityId, Typology};

/// Field shape of a document dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentLayout {
    /// `development-plan-document`: plan types, geographies as district references
    PlanDocument,
    /// `document`: document types, geographies as entity ids
    Document,
}

impl DocumentLayout {
    /// Category list fields, plural form first, and the category type they hold
    fn category_fields(self) -> (&'static [&'static str], &'static str) {
        match self {
            DocumentLayout::PlanDocument => (
                &["development-plan-types", "development-plan-type"],
                "development-plan-type",
            ),
            DocumentLayout::Document => (&["document-types", "document-type"], "document-type"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentModel {
    dataset: String,
    layout: DocumentLayout,
    record: NormalizedRecord,
}

impl DocumentModel {
    pub fn new(dataset: &str, layout: DocumentLayout, record: NormalizedRecord) -> Self {
        Self {
            dataset: dataset.to_string(),
            layout,
            record,
        }
    }

    pub fn layout(&self) -> DocumentLayout {
        self.layout
    }

    /// Document row, then category, policy, organisation and geography joins
    ///
    /// Each list joins a given endpoint at most once.
    pub async fn to_rows(self, resolver: &mut Resolver<'_>) -> Result<Vec<Row>> {
        let record = &self.record;
        let key = natural_key(record, &self.dataset, "document")?;
        let document = record.entity;
        let source = source_row(&self.dataset, &key, document);

        let mut rows = vec![Row::Document(Document {
            entity: Entity::new(document, Typology::Document, &self.dataset),
            document: key,
            name: record.text("name"),
            description: record.text("description"),
            notes: record.text("notes"),
            document_url: record.text("document-url"),
            dates: record.dates,
        })];

        let (fields, category_type) = self.layout.category_fields();
        let categories = fields
            .iter()
            .map(|field| record.list(field))
            .find(|list| !list.is_empty())
            .unwrap_or_default();
        let mut joined = BTreeSet::new();
        for category in categories {
            let Some(found) = resolver.category(&source, category, category_type).await? else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::DocumentCategory(DocumentCategory {
                    document,
                    category: found.entity.entity,
                }));
            }
        }

        let mut joined = BTreeSet::new();
        for policy in record.list("development-policies") {
            let Some(found) = resolver.policy(&source, policy).await? else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::PolicyDocument(PolicyDocument {
                    policy: found.entity.entity,
                    document,
                }));
            }
        }

        let mut joined = BTreeSet::new();
        for organisation in record.list("organisations") {
            let Some(found) = resolver.organisation(&source, organisation).await? else {
                continue;
            };
            if joined.insert(found.entity.entity) {
                rows.push(Row::DocumentOrganisation(DocumentOrganisation {
                    document,
                    organisation: found.entity.entity,
                    dates: record.dates,
                }));
            }
        }

        let mut joined = BTreeSet::new();
        for reference in record.list("geographies") {
            let geography = match self.layout {
                DocumentLayout::PlanDocument => {
                    let key = format!("{LOCAL_AUTHORITY_DISTRICT_PREFIX}{reference}");
                    resolver
                        .geography(&source, &key)
                        .await?
                        .map(|found| found.entity.entity)
                },
                DocumentLayout::Document => match reference.parse::<EntityId>() {
                    // An entity with no geography attached yields no join
                    Ok(id) => resolver
                        .entity(&source, id)
                        .await?
                        .and_then(|found| found.first_geography().map(|g| g.entity.entity)),
                    // Not an entity id, so nothing can match it
                    Err(_) => {
                        resolver.unresolved(&source, reference)?;
                        None
                    },
                },
            };

            if let Some(geography) = geography.filter(|id| joined.insert(*id)) {
                rows.push(Row::DocumentGeography(DocumentGeography {
                    document,
                    geography,
                    dates: record.dates,
                }));
            }
        }

        Ok(rows)
    }
}
