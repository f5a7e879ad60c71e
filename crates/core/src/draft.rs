//! Post draft data and the mutable state of one editing session.
//!
//! [`PostDraft`] is the plain snapshot of every editable field.
//! [`DraftState`] wraps it with the session bookkeeping: whether the slug
//! was edited by hand, which slug the post had when it was opened, and the
//! preview of a locally selected cover image.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::slug::{normalize_slug, SlugIndex};
use crate::tags::TagSet;
use crate::taxonomy::Taxonomy;
use crate::types::{DbId, Timestamp};
use crate::upload::{PreviewHost, PreviewSlot, UploadSource};
use crate::validation::{validate_draft, ValidationContext, ValidationReport};

// ---------------------------------------------------------------------------
// Workflow status
// ---------------------------------------------------------------------------

/// Editorial workflow state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    InReview,
    Published,
}

// ---------------------------------------------------------------------------
// Draft and persisted record
// ---------------------------------------------------------------------------

/// Every editable field of one post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    /// `None` for a post that has never been saved.
    pub id: Option<DbId>,
    pub slug: String,
    pub title: String,
    pub short_description: String,
    /// Rich-text body, opaque to the pipeline.
    pub body: String,
    pub special_blocks: Option<String>,
    /// Free-text source / credit line.
    pub source: Option<String>,
    /// Another post linked as a reference.
    pub reference_post_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub tags: TagSet,
    pub image: Option<UploadSource>,
    pub image_alt: String,
    pub published_at: Option<Timestamp>,
    pub scheduled_at: Option<Timestamp>,
    pub status: WorkflowStatus,
    pub featured: bool,
    /// Responsible editor.
    pub editor: String,
}

/// A post as returned by the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub short_description: String,
    pub body: String,
    pub special_blocks: Option<String>,
    pub source: Option<String>,
    pub reference_post_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub image_alt: String,
    pub published_at: Option<Timestamp>,
    pub scheduled_at: Option<Timestamp>,
    pub status: WorkflowStatus,
    pub featured: bool,
    pub editor: String,
}

impl From<PostRecord> for PostDraft {
    fn from(record: PostRecord) -> Self {
        Self {
            id: Some(record.id),
            slug: record.slug,
            title: record.title,
            short_description: record.short_description,
            body: record.body,
            special_blocks: record.special_blocks,
            source: record.source,
            reference_post_id: record.reference_post_id,
            category_id: record.category_id,
            subcategory_id: record.subcategory_id,
            tags: record.tags.into(),
            image: record
                .image_url
                .as_deref()
                .and_then(UploadSource::from_url),
            image_alt: record.image_alt,
            published_at: record.published_at,
            scheduled_at: record.scheduled_at,
            status: record.status,
            featured: record.featured,
            editor: record.editor,
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Mutable draft for one open editing session.
#[derive(Debug)]
pub struct DraftState {
    draft: PostDraft,
    preview: PreviewSlot,
    slug_touched: bool,
    original_slug: Option<String>,
}

impl DraftState {
    /// Empty state for the "new post" flow.
    pub fn new(preview_host: Arc<dyn PreviewHost>) -> Self {
        Self {
            draft: PostDraft::default(),
            preview: PreviewSlot::new(preview_host),
            slug_touched: false,
            original_slug: None,
        }
    }

    /// Discard everything and start an empty draft.
    pub fn reset(&mut self) {
        self.preview.release();
        self.draft = PostDraft::default();
        self.slug_touched = false;
        self.original_slug = None;
    }

    /// Load a persisted post for editing.
    ///
    /// The slug counts as hand-edited so title changes no longer rewrite it.
    pub fn hydrate(&mut self, record: PostRecord) {
        self.preview.release();
        self.original_slug = Some(record.slug.clone());
        self.slug_touched = !record.slug.is_empty();
        self.draft = record.into();
    }

    pub fn draft(&self) -> &PostDraft {
        &self.draft
    }

    /// Owned copy of the current fields, used for submission.
    pub fn snapshot(&self) -> PostDraft {
        self.draft.clone()
    }

    pub fn original_slug(&self) -> Option<&str> {
        self.original_slug.as_deref()
    }

    pub fn slug_touched(&self) -> bool {
        self.slug_touched
    }

    // -- text fields ---------------------------------------------------------

    /// Set the title. While the slug has not been edited by hand it follows
    /// the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
        if !self.slug_touched {
            self.draft.slug = normalize_slug(&self.draft.title);
        }
    }

    /// Set the slug by hand. Input is normalized; clearing it resumes
    /// deriving the slug from the title on the next title change.
    pub fn set_slug(&mut self, slug: &str) {
        self.draft.slug = normalize_slug(slug);
        self.slug_touched = !self.draft.slug.is_empty();
    }

    pub fn set_short_description(&mut self, text: impl Into<String>) {
        self.draft.short_description = text.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.draft.body = body.into();
    }

    pub fn set_special_blocks(&mut self, blocks: Option<String>) {
        self.draft.special_blocks = blocks.filter(|b| !b.trim().is_empty());
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.draft.source = source.filter(|s| !s.trim().is_empty());
    }

    pub fn set_reference_post(&mut self, post_id: Option<DbId>) {
        self.draft.reference_post_id = post_id;
    }

    pub fn set_editor(&mut self, editor: impl Into<String>) {
        self.draft.editor = editor.into();
    }

    // -- classification ------------------------------------------------------

    /// Change the category, clearing a subcategory that does not belong to
    /// the new one.
    pub fn set_category(&mut self, category_id: Option<DbId>, taxonomy: &Taxonomy) {
        self.draft.category_id = category_id;
        let keep = match (self.draft.subcategory_id, category_id) {
            (Some(sub), Some(cat)) => taxonomy.belongs_to(sub, cat),
            _ => false,
        };
        if !keep {
            self.draft.subcategory_id = None;
        }
    }

    /// Select a subcategory. It must belong to the current category.
    pub fn set_subcategory(
        &mut self,
        subcategory_id: Option<DbId>,
        taxonomy: &Taxonomy,
    ) -> Result<(), CoreError> {
        let Some(sub) = subcategory_id else {
            self.draft.subcategory_id = None;
            return Ok(());
        };
        let Some(cat) = self.draft.category_id else {
            return Err(CoreError::Validation(
                "Select a category before choosing a subcategory".into(),
            ));
        };
        if !taxonomy.belongs_to(sub, cat) {
            return Err(CoreError::Validation(format!(
                "Subcategory {sub} does not belong to category {cat}"
            )));
        }
        self.draft.subcategory_id = Some(sub);
        Ok(())
    }

    /// Add every comma-separated tag in `entry`. Returns how many were new.
    pub fn add_tags(&mut self, entry: &str) -> usize {
        self.draft.tags.add_entry(entry)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.draft.tags.remove(tag)
    }

    // -- media ---------------------------------------------------------------

    /// Replace the cover image. The previous local preview, if any, is
    /// revoked before a new one is created.
    pub fn set_image(&mut self, source: Option<UploadSource>) {
        self.preview.replace(source.as_ref());
        self.draft.image = source;
    }

    pub fn clear_image(&mut self) {
        self.set_image(None);
    }

    pub fn set_image_alt(&mut self, alt: impl Into<String>) {
        self.draft.image_alt = alt.into();
    }

    pub fn image_label(&self) -> Option<&str> {
        self.draft.image.as_ref().map(UploadSource::label)
    }

    /// What to render for the cover image: the local preview reference or
    /// the remote URL.
    pub fn image_preview(&self) -> Option<String> {
        match self.draft.image.as_ref()? {
            UploadSource::File(_) => self.preview.current().map(|id| id.to_string()),
            UploadSource::Url(url) => Some(url.clone()),
        }
    }

    /// Release the local preview when the session ends.
    pub fn release_preview(&mut self) {
        self.preview.release();
    }

    // -- scheduling and flags ------------------------------------------------

    pub fn set_published_at(&mut self, at: Option<Timestamp>) {
        self.draft.published_at = at;
    }

    pub fn set_scheduled_at(&mut self, at: Option<Timestamp>) {
        self.draft.scheduled_at = at;
    }

    pub fn set_status(&mut self, status: WorkflowStatus) {
        self.draft.status = status;
    }

    pub fn set_featured(&mut self, featured: bool) {
        self.draft.featured = featured;
    }

    // -- validation ----------------------------------------------------------

    /// Validate the current fields against `existing_slugs` and `taxonomy`.
    pub fn validate(&self, existing_slugs: &SlugIndex, taxonomy: &Taxonomy) -> ValidationReport {
        let ctx = ValidationContext {
            existing_slugs,
            original_slug: self.original_slug(),
            taxonomy: Some(taxonomy),
        };
        validate_draft(&self.draft, &ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::taxonomy::TaxonomyOption;
    use crate::upload::{CountingPreviewHost, UploadFile};
    use crate::validation::{FieldError, PostField};

    fn option(id: DbId, name: &str, parent_id: Option<DbId>) -> TaxonomyOption {
        TaxonomyOption {
            id,
            display_name: name.into(),
            parent_id,
        }
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            categories: vec![option(1, "Notícias", None), option(2, "Eventos", None)],
            subcategories: vec![
                option(10, "Saúde", Some(1)),
                option(11, "Educação", Some(1)),
                option(20, "Oficinas", Some(2)),
            ],
            references: vec![],
        }
    }

    fn state() -> (DraftState, Arc<CountingPreviewHost>) {
        let host = Arc::new(CountingPreviewHost::new());
        (DraftState::new(host.clone()), host)
    }

    fn local_image(name: &str) -> UploadSource {
        UploadSource::File(UploadFile {
            file_name: name.into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        })
    }

    fn record() -> PostRecord {
        PostRecord {
            id: 42,
            slug: "semana-do-brincar".into(),
            title: "Semana do Brincar".into(),
            short_description: "Atividades para crianças".into(),
            body: "<p>Programação</p>".into(),
            special_blocks: None,
            source: Some("Assessoria".into()),
            reference_post_id: None,
            category_id: Some(2),
            subcategory_id: Some(20),
            tags: vec!["infancia".into(), "infancia".into(), "eventos".into()],
            image_url: Some("https://cdn.example.org/brincar.jpg".into()),
            image_alt: "Crianças brincando".into(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap()),
            scheduled_at: None,
            status: WorkflowStatus::Published,
            featured: true,
            editor: "Ana".into(),
        }
    }

    // -- slug following title ------------------------------------------------

    #[test]
    fn title_drives_slug_until_slug_is_edited() {
        let (mut state, _) = state();
        state.set_title("Semana do Brincar!");
        assert_eq!(state.draft().slug, "semana-do-brincar");
        assert!(!state.slug_touched());

        state.set_slug("Meu Slug");
        assert!(state.slug_touched());
        state.set_title("Outro título");
        assert_eq!(state.draft().slug, "meu-slug");
    }

    #[test]
    fn clearing_slug_resumes_derivation() {
        let (mut state, _) = state();
        state.set_slug("manual");
        state.set_slug("");
        assert!(!state.slug_touched());
        state.set_title("Novo Título");
        assert_eq!(state.draft().slug, "novo-titulo");
    }

    #[test]
    fn duplicate_title_then_retitle_is_accepted() {
        let (mut state, _) = state();
        let existing: SlugIndex = ["semana-do-brincar"].into_iter().collect();
        let taxonomy = taxonomy();

        state.set_title("Semana do Brincar!");
        let report = state.validate(&existing, &taxonomy);
        assert_matches!(report.error(PostField::Slug), Some(FieldError::Duplicate { .. }));

        state.set_title("Semana do Brincar 2");
        assert_eq!(state.draft().slug, "semana-do-brincar-2");
        let report = state.validate(&existing, &taxonomy);
        assert_eq!(report.error(PostField::Slug), None);
    }

    // -- classification ------------------------------------------------------

    #[test]
    fn category_change_clears_incompatible_subcategory() {
        let (mut state, _) = state();
        let taxonomy = taxonomy();
        state.set_category(Some(1), &taxonomy);
        state.set_subcategory(Some(10), &taxonomy).unwrap();

        state.set_category(Some(2), &taxonomy);
        assert_eq!(state.draft().category_id, Some(2));
        assert_eq!(state.draft().subcategory_id, None);
    }

    #[test]
    fn compatible_subcategory_is_retained() {
        let (mut state, _) = state();
        let taxonomy = taxonomy();
        state.set_category(Some(1), &taxonomy);
        state.set_subcategory(Some(11), &taxonomy).unwrap();

        state.set_category(Some(1), &taxonomy);
        assert_eq!(state.draft().subcategory_id, Some(11));
    }

    #[test]
    fn subcategory_from_other_category_is_rejected() {
        let (mut state, _) = state();
        let taxonomy = taxonomy();
        state.set_category(Some(1), &taxonomy);

        assert_matches!(
            state.set_subcategory(Some(20), &taxonomy),
            Err(CoreError::Validation(_))
        );
        assert_eq!(state.draft().subcategory_id, None);
    }

    #[test]
    fn subcategory_requires_category() {
        let (mut state, _) = state();
        assert!(state.set_subcategory(Some(10), &taxonomy()).is_err());
    }

    // -- tags ----------------------------------------------------------------

    #[test]
    fn tags_add_and_remove() {
        let (mut state, _) = state();
        assert_eq!(state.add_tags("saude, saude, educação"), 2);
        assert_eq!(state.draft().tags.as_slice(), ["saude", "educação"]);
        assert!(state.remove_tag("saude"));
        assert_eq!(state.draft().tags.as_slice(), ["educação"]);
    }

    // -- media ---------------------------------------------------------------

    #[test]
    fn replacing_local_image_keeps_one_live_preview() {
        let (mut state, host) = state();
        state.set_image(Some(local_image("a.jpg")));
        let first = state.image_preview().unwrap();
        state.set_image(Some(local_image("b.jpg")));
        let second = state.image_preview().unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("blob:"));
        assert_eq!(host.peak_count(), 1);
        assert_eq!(host.live_count(), 1);
        assert_eq!(state.image_label(), Some("b.jpg"));
    }

    #[test]
    fn clearing_image_revokes_local_preview() {
        let (mut state, host) = state();
        state.set_image(Some(local_image("a.jpg")));
        assert_eq!(host.live_count(), 1);

        state.clear_image();
        assert_eq!(state.draft().image, None);
        assert_eq!(state.image_label(), None);
        assert_eq!(state.image_preview(), None);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.allocated_count(), 1);
    }

    #[test]
    fn switching_local_image_to_url_revokes_preview() {
        let (mut state, host) = state();
        state.set_image(Some(local_image("a.jpg")));
        state.set_image(UploadSource::from_url("https://cdn.example.org/b.jpg"));

        assert_eq!(host.live_count(), 0);
        assert_eq!(
            state.image_preview().as_deref(),
            Some("https://cdn.example.org/b.jpg")
        );
    }

    #[test]
    fn reset_releases_preview_and_fields() {
        let (mut state, host) = state();
        state.set_title("Algo");
        state.set_image(Some(local_image("a.jpg")));
        state.reset();

        assert_eq!(state.draft(), &PostDraft::default());
        assert_eq!(host.live_count(), 0);
    }

    // -- hydrate -------------------------------------------------------------

    #[test]
    fn hydrate_loads_record_and_pins_slug() {
        let (mut state, _) = state();
        state.hydrate(record());

        let draft = state.draft();
        assert_eq!(draft.id, Some(42));
        assert_eq!(draft.tags.as_slice(), ["infancia", "eventos"]);
        assert_eq!(
            draft.image,
            Some(UploadSource::Url("https://cdn.example.org/brincar.jpg".into()))
        );
        assert_eq!(state.original_slug(), Some("semana-do-brincar"));

        state.set_title("Semana do Brincar 2026");
        assert_eq!(state.draft().slug, "semana-do-brincar");
    }

    #[test]
    fn hydrated_post_does_not_collide_with_itself() {
        let (mut state, _) = state();
        state.hydrate(record());
        let existing: SlugIndex = ["semana-do-brincar"].into_iter().collect();

        let report = state.validate(&existing, &taxonomy());
        assert!(report.is_valid(), "{}", report.summary());
    }
}
