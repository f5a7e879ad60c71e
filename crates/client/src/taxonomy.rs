//! Loads category, subcategory, and reference-post options for a session.
//!
//! Each list is fetched independently. A failed fetch is logged and leaves
//! that list empty; malformed entries are dropped one by one.

use serde::de::DeserializeOwned;
use serde_json::Value;

use editorial_core::taxonomy::{ReferenceOption, Taxonomy, TaxonomyOption};
use editorial_core::types::DbId;

use crate::api::{ApiError, ContentApi};
use crate::wire::{CategoryEntry, PostTitleEntry, SubcategoryEntry};

/// Fetch all option lists concurrently. Never fails.
pub async fn load_taxonomy<A: ContentApi>(api: &A, kind: u32) -> Taxonomy {
    let (categories, subcategories, references) = tokio::join!(
        api.list_categories(kind),
        api.list_subcategories(kind),
        api.list_post_titles(),
    );

    let categories = or_empty("categories", categories);
    let subcategories = or_empty("subcategories", subcategories);
    let references = or_empty("references", references);

    let categories: Vec<TaxonomyOption> = decode_entries::<CategoryEntry>("categories", categories)
        .into_iter()
        .filter_map(|c| named("categories", c.id, c.nome, None))
        .collect();

    let category_list_loaded = !categories.is_empty();
    let subcategories: Vec<TaxonomyOption> =
        decode_entries::<SubcategoryEntry>("subcategories", subcategories)
            .into_iter()
            .filter(|s| {
                let known =
                    !category_list_loaded || categories.iter().any(|c| c.id == s.categoria_id);
                if !known {
                    tracing::warn!(
                        id = s.id,
                        category_id = s.categoria_id,
                        "Dropping subcategory with unknown parent category"
                    );
                }
                known
            })
            .filter_map(|s| named("subcategories", s.id, s.nome, Some(s.categoria_id)))
            .collect();

    let references: Vec<ReferenceOption> =
        decode_entries::<PostTitleEntry>("references", references)
            .into_iter()
            .map(|p| ReferenceOption {
                id: p.id,
                title: p.titulo,
                slug: p.slug.filter(|s| !s.is_empty()),
            })
            .collect();

    tracing::debug!(
        categories = categories.len(),
        subcategories = subcategories.len(),
        references = references.len(),
        "Taxonomy loaded"
    );

    Taxonomy {
        categories,
        subcategories,
        references,
    }
}

fn or_empty(list: &'static str, result: Result<Vec<Value>, ApiError>) -> Vec<Value> {
    result.unwrap_or_else(|e| {
        tracing::warn!(list, error = %e, "Failed to load option list, leaving it empty");
        Vec::new()
    })
}

/// Decode each entry on its own, dropping those that do not match `T`.
fn decode_entries<T: DeserializeOwned>(list: &'static str, raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(list, index, error = %e, "Dropping malformed option entry");
                None
            }
        })
        .collect()
}

fn named(
    list: &'static str,
    id: DbId,
    name: String,
    parent_id: Option<DbId>,
) -> Option<TaxonomyOption> {
    let display_name = name.trim().to_string();
    if display_name.is_empty() {
        tracing::warn!(list, id, "Dropping option entry with blank name");
        return None;
    }
    Some(TaxonomyOption {
        id,
        display_name,
        parent_id,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_drops_malformed_entries() {
        let raw = vec![
            json!({"id": 1, "nome": "Notícias"}),
            json!({"nome": "sem id"}),
            json!({"id": "dois", "nome": "id textual"}),
            json!({"id": 3, "nome": "Eventos"}),
        ];
        let decoded = decode_entries::<CategoryEntry>("categories", raw);
        let ids: Vec<DbId> = decoded.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn blank_names_are_dropped() {
        assert!(named("categories", 1, "   ".into(), None).is_none());
        let option = named("categories", 1, " Eventos ".into(), None).unwrap();
        assert_eq!(option.display_name, "Eventos");
    }
}
