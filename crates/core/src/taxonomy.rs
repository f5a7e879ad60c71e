//! Category / subcategory tree and reference-post options.
//!
//! Loaded once per editing session from the content API and treated as
//! read-only afterwards.

use serde::{Deserialize, Serialize};

use crate::slug::SlugIndex;
use crate::types::DbId;

/// A selectable category or subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyOption {
    pub id: DbId,
    pub display_name: String,
    /// Parent category for subcategories; `None` for top-level categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DbId>,
}

/// Another post that can be linked as a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub id: DbId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Option lists for one editing session. Any list may be empty if loading
/// it failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<TaxonomyOption>,
    pub subcategories: Vec<TaxonomyOption>,
    pub references: Vec<ReferenceOption>,
}

impl Taxonomy {
    pub fn category(&self, id: DbId) -> Option<&TaxonomyOption> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn subcategory(&self, id: DbId) -> Option<&TaxonomyOption> {
        self.subcategories.iter().find(|s| s.id == id)
    }

    /// Subcategories whose parent is `category_id`, in API order.
    pub fn subcategories_of(&self, category_id: DbId) -> impl Iterator<Item = &TaxonomyOption> {
        self.subcategories
            .iter()
            .filter(move |s| s.parent_id == Some(category_id))
    }

    /// Whether `subcategory_id` is a known subcategory under `category_id`.
    pub fn belongs_to(&self, subcategory_id: DbId, category_id: DbId) -> bool {
        self.subcategory(subcategory_id)
            .is_some_and(|s| s.parent_id == Some(category_id))
    }

    /// Slugs of every reference post that reported one.
    pub fn slug_index(&self) -> SlugIndex {
        self.references
            .iter()
            .filter_map(|r| r.slug.clone())
            .collect()
    }
}
