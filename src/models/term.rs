//! Term model
//!
//! Categories and tags share one table, told apart by the [`Taxonomy`]
//! discriminator. The same query-boundary rule as contents applies: a term
//! id stored under another taxonomy is not found.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxonomy discriminator for terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    Category,
    PostTag,
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Taxonomy::Category => write!(f, "category"),
            Taxonomy::PostTag => write!(f, "post_tag"),
        }
    }
}

impl FromStr for Taxonomy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category" => Ok(Taxonomy::Category),
            "post_tag" => Ok(Taxonomy::PostTag),
            _ => Err(anyhow::anyhow!("Invalid taxonomy: {}", s)),
        }
    }
}

/// A category or tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: i64,
    pub taxonomy: Taxonomy,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Term {
    pub fn new(taxonomy: Taxonomy, name: String, slug: String, description: String) -> Self {
        Self {
            id: 0,
            taxonomy,
            name,
            slug,
            description,
            created_at: Utc::now(),
        }
    }
}
