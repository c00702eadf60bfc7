//! Identity types shared by the view model

use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric entity identifier assigned upstream by the source store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for EntityId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| CommonError::InvalidEntity(s.to_string()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse kind of a typed view row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Typology {
    Category,
    Geography,
    Policy,
    Document,
    Organisation,
}

impl Typology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Typology::Category => "category",
            Typology::Geography => "geography",
            Typology::Policy => "policy",
            Typology::Document => "document",
            Typology::Organisation => "organisation",
        }
    }
}

impl FromStr for Typology {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Typology::Category),
            "geography" => Ok(Typology::Geography),
            "policy" => Ok(Typology::Policy),
            "document" => Ok(Typology::Document),
            "organisation" => Ok(Typology::Organisation),
            _ => Err(CommonError::UnknownTypology(s.to_string())),
        }
    }
}

impl fmt::Display for Typology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
