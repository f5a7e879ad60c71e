//! Field validator for post drafts.
//!
//! Every rule runs independently and the result maps each field to at most
//! one blocking [`FieldError`]. Soft limits are reported separately as
//! [`FieldWarning`]s and never block submission.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::draft::PostDraft;
use crate::slug::{suggest_unique_slug, validate_slug, SlugIndex};
use crate::taxonomy::Taxonomy;

/// Soft limit for the short description (characters).
pub const SHORT_DESCRIPTION_SOFT_LIMIT: usize = 300;

/// Soft limit for image alt text (characters).
pub const ALT_TEXT_SOFT_LIMIT: usize = 250;

/// Soft limit on the number of tags.
pub const MAX_TAGS: usize = 20;

/// Soft limit on a single tag (characters).
pub const MAX_TAG_LENGTH: usize = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Draft fields that can carry a validation error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostField {
    Slug,
    Title,
    ShortDescription,
    Body,
    Category,
    Subcategory,
    Tags,
    Image,
    ImageAlt,
    PublishedAt,
    ScheduledAt,
    Editor,
}

impl PostField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Title => "title",
            Self::ShortDescription => "short_description",
            Self::Body => "body",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Tags => "tags",
            Self::Image => "image",
            Self::ImageAlt => "image_alt",
            Self::PublishedAt => "published_at",
            Self::ScheduledAt => "scheduled_at",
            Self::Editor => "editor",
        }
    }
}

impl fmt::Display for PostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FieldError {
    #[error("required")]
    Required,

    /// Slug collides with another post; `suggestion` is the first free
    /// numbered variant.
    #[error("duplicate")]
    Duplicate { suggestion: String },

    #[error("invalid: {message}")]
    InvalidFormat { message: String },

    #[error("subcategory does not belong to the selected category")]
    UnknownSubcategory,
}

/// A non-blocking observation about one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    pub field: PostField,
    pub message: String,
}

/// Outcome of validating one draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: BTreeMap<PostField, FieldError>,
    pub warnings: Vec<FieldWarning>,
}

impl ValidationReport {
    /// `true` when nothing blocks submission.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: PostField) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    /// One-line summary, e.g. `slug: duplicate; title: required`.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(field, err)| format!("{field}: {err}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn block(&mut self, field: PostField, error: FieldError) {
        self.errors.entry(field).or_insert(error);
    }

    fn warn(&mut self, field: PostField, message: impl Into<String>) {
        self.warnings.push(FieldWarning {
            field,
            message: message.into(),
        });
    }
}

/// External facts the rules need beyond the draft itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Slugs of other persisted posts.
    pub existing_slugs: &'a SlugIndex,
    /// Slug the draft had when opened for editing; excluded from the
    /// uniqueness check.
    pub original_slug: Option<&'a str>,
    /// Loaded option lists. Subcategory membership is only checked when the
    /// subcategory list is non-empty.
    pub taxonomy: Option<&'a Taxonomy>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate every rule against `draft`.
pub fn validate_draft(draft: &PostDraft, ctx: &ValidationContext<'_>) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_slug(draft, ctx, &mut report);
    check_required_text(&mut report, PostField::Title, &draft.title);
    check_required_text(
        &mut report,
        PostField::ShortDescription,
        &draft.short_description,
    );
    if is_blank_markup(&draft.body) {
        report.block(PostField::Body, FieldError::Required);
    }
    check_required_text(&mut report, PostField::Editor, &draft.editor);
    check_required_text(&mut report, PostField::ImageAlt, &draft.image_alt);

    if draft.image.is_none() {
        report.block(PostField::Image, FieldError::Required);
    }
    if draft.published_at.is_none() {
        report.block(PostField::PublishedAt, FieldError::Required);
    }
    check_classification(draft, ctx, &mut report);
    check_soft_limits(draft, &mut report);

    report
}

fn check_required_text(report: &mut ValidationReport, field: PostField, value: &str) {
    if value.trim().is_empty() {
        report.block(field, FieldError::Required);
    }
}

fn check_slug(draft: &PostDraft, ctx: &ValidationContext<'_>, report: &mut ValidationReport) {
    if draft.slug.is_empty() {
        report.block(PostField::Slug, FieldError::Required);
        return;
    }
    if let Err(err) = validate_slug(&draft.slug) {
        report.block(
            PostField::Slug,
            FieldError::InvalidFormat {
                message: err.to_string(),
            },
        );
        return;
    }
    if ctx.existing_slugs.is_taken(&draft.slug, ctx.original_slug) {
        report.block(
            PostField::Slug,
            FieldError::Duplicate {
                suggestion: suggest_unique_slug(
                    &draft.slug,
                    ctx.existing_slugs,
                    ctx.original_slug,
                ),
            },
        );
    }
}

fn check_classification(
    draft: &PostDraft,
    ctx: &ValidationContext<'_>,
    report: &mut ValidationReport,
) {
    let Some(category_id) = draft.category_id else {
        report.block(PostField::Category, FieldError::Required);
        return;
    };
    let (Some(subcategory_id), Some(taxonomy)) = (draft.subcategory_id, ctx.taxonomy) else {
        return;
    };
    if !taxonomy.subcategories.is_empty() && !taxonomy.belongs_to(subcategory_id, category_id) {
        report.block(PostField::Subcategory, FieldError::UnknownSubcategory);
    }
}

fn check_soft_limits(draft: &PostDraft, report: &mut ValidationReport) {
    if draft.short_description.chars().count() > SHORT_DESCRIPTION_SOFT_LIMIT {
        report.warn(
            PostField::ShortDescription,
            format!("Short description is longer than {SHORT_DESCRIPTION_SOFT_LIMIT} characters"),
        );
    }
    if draft.image_alt.chars().count() > ALT_TEXT_SOFT_LIMIT {
        report.warn(
            PostField::ImageAlt,
            format!("Alt text is longer than {ALT_TEXT_SOFT_LIMIT} characters"),
        );
    }
    if draft.tags.len() > MAX_TAGS {
        report.warn(PostField::Tags, format!("More than {MAX_TAGS} tags"));
    }
    if let Some(long) = draft
        .tags
        .iter()
        .find(|t| t.chars().count() > MAX_TAG_LENGTH)
    {
        report.warn(
            PostField::Tags,
            format!("Tag '{long}' is longer than {MAX_TAG_LENGTH} characters"),
        );
    }
    if let (Some(published), Some(scheduled)) = (draft.published_at, draft.scheduled_at) {
        if scheduled <= published {
            report.warn(
                PostField::ScheduledAt,
                "Scheduled publication is not after the publication date",
            );
        }
    }
}

/// Whether rich-text markup has no visible text (e.g. `<p><br></p>`).
fn is_blank_markup(markup: &str) -> bool {
    let mut in_tag = false;
    let mut visible = String::new();
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => visible.push(c),
            _ => {}
        }
    }
    visible.replace("&nbsp;", " ").trim().is_empty()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
