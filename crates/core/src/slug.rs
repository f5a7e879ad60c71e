//! Slug normalization, format validation, and uniqueness lookups.
//!
//! A slug is the URL-safe identifier of a post: lowercase ASCII letters,
//! digits, and single inner hyphens.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize free text into a slug.
///
/// Lowercases, decomposes to NFD and drops combining marks (so `ç` becomes
/// `c` and `ã` becomes `a`), replaces every run of non-alphanumeric
/// characters with a single hyphen, and trims leading/trailing hyphens.
///
/// Total and idempotent: empty input yields an empty slug, and normalizing
/// an already-normalized slug returns it unchanged.
///
/// ```
/// use editorial_core::slug::normalize_slug;
///
/// assert_eq!(normalize_slug("Semana do Brincar!"), "semana-do-brincar");
/// assert_eq!(normalize_slug("Educação & Saúde"), "educacao-saude");
/// ```
pub fn normalize_slug(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
    {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !result.is_empty() {
                result.push('-');
            }
            pending_hyphen = false;
            result.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate slug format: non-empty, lowercase ASCII alphanumerics and single
/// inner hyphens only.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(CoreError::Validation(
            "Slug must not start or end with a hyphen or contain consecutive hyphens".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Uniqueness
// ---------------------------------------------------------------------------

/// Slugs already taken by persisted posts.
#[derive(Debug, Clone, Default)]
pub struct SlugIndex {
    slugs: HashSet<String>,
}

impl SlugIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    /// Whether `slug` collides with another post.
    ///
    /// `own_original` is the slug the draft had when it was opened for
    /// editing; a post never collides with itself.
    pub fn is_taken(&self, slug: &str, own_original: Option<&str>) -> bool {
        if own_original == Some(slug) {
            return false;
        }
        self.slugs.contains(slug)
    }
}

impl<S: Into<String>> FromIterator<S> for SlugIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            slugs: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// First free slug of the form `base`, `base-2`, `base-3`, ...
pub fn suggest_unique_slug(base: &str, index: &SlugIndex, own_original: Option<&str>) -> String {
    if !index.is_taken(base, own_original) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !index.is_taken(candidate, own_original))
        .unwrap_or_else(|| base.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(slug: &str) {
        assert!(
            slug.is_empty() || validate_slug(slug).is_ok(),
            "slug {slug:?} is not well formed"
        );
    }

    // -- normalize_slug ------------------------------------------------------

    #[test]
    fn slug_basic_title() {
        assert_eq!(normalize_slug("Semana do Brincar!"), "semana-do-brincar");
    }

    #[test]
    fn slug_strips_diacritics() {
        assert_eq!(normalize_slug("Educação em Saúde"), "educacao-em-saude");
        assert_eq!(normalize_slug("Ação Voluntária"), "acao-voluntaria");
    }

    #[test]
    fn slug_collapses_runs_of_separators() {
        assert_eq!(normalize_slug("foo --- bar__baz"), "foo-bar-baz");
    }

    #[test]
    fn slug_trims_leading_trailing_separators() {
        assert_eq!(normalize_slug("  --hello!!  "), "hello");
    }

    #[test]
    fn slug_keeps_digits() {
        assert_eq!(normalize_slug("Semana do Brincar 2"), "semana-do-brincar-2");
    }

    #[test]
    fn slug_empty_input() {
        assert_eq!(normalize_slug(""), "");
        assert_eq!(normalize_slug("!!! ???"), "");
    }

    #[test]
    fn slug_non_latin_characters_become_separators() {
        assert_eq!(normalize_slug("post 日本 final"), "post-final");
    }

    #[test]
    fn slug_is_idempotent() {
        let inputs = [
            "Semana do Brincar!",
            "  Árvore   de Natal -- 2024 ",
            "ÉÇÃ_ßø",
            "already-a-slug",
            "--",
            "İstanbul",
        ];
        for input in inputs {
            let once = normalize_slug(input);
            assert_eq!(normalize_slug(&once), once, "input {input:?}");
            assert_well_formed(&once);
        }
    }

    // -- validate_slug -------------------------------------------------------

    #[test]
    fn validate_accepts_normalized() {
        assert!(validate_slug("semana-do-brincar-2").is_ok());
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn validate_rejects_uppercase_and_spaces() {
        assert!(validate_slug("Semana").is_err());
        assert!(validate_slug("semana do").is_err());
    }

    #[test]
    fn validate_rejects_bad_hyphens() {
        assert!(validate_slug("-semana").is_err());
        assert!(validate_slug("semana-").is_err());
        assert!(validate_slug("semana--do").is_err());
    }

    // -- SlugIndex -----------------------------------------------------------

    #[test]
    fn index_detects_collision() {
        let index: SlugIndex = ["semana-do-brincar"].into_iter().collect();
        assert!(index.is_taken("semana-do-brincar", None));
        assert!(!index.is_taken("semana-do-brincar-2", None));
    }

    #[test]
    fn index_ignores_own_original_slug() {
        let index: SlugIndex = ["semana-do-brincar"].into_iter().collect();
        assert!(!index.is_taken("semana-do-brincar", Some("semana-do-brincar")));
        assert!(index.is_taken("semana-do-brincar", Some("outro-post")));
    }

    // -- suggest_unique_slug -------------------------------------------------

    #[test]
    fn suggestion_returns_base_when_free() {
        let index = SlugIndex::new();
        assert_eq!(suggest_unique_slug("noticia", &index, None), "noticia");
    }

    #[test]
    fn suggestion_skips_taken_suffixes() {
        let index: SlugIndex = ["noticia", "noticia-2"].into_iter().collect();
        assert_eq!(suggest_unique_slug("noticia", &index, None), "noticia-3");
    }
}
