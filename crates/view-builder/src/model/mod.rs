//! View model
//!
//! The typed rows a build produces. Every typed row (category, geography, policy, document,
//! organisation) owns exactly one [`Entity`]; join rows refer to both endpoints by entity id,
//! so a join can point at a row created in the same build as easily as at one already stored.

pub mod row;
pub mod tables;

pub use row::{
    DocumentCategory, DocumentGeography, DocumentOrganisation, GeographyCategory,
    GeographyMetric, OrganisationGeography, PolicyCategory, PolicyDocument, PolicyGeography,
    PolicyOrganisation, Row, RowKind,
};
pub use tables::{
    Category, Dates, Document, Entity, Geography, Metric, Organisation, Policy,
};
