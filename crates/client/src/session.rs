//! Editing sessions and the editor that opens, submits, and closes them.
//!
//! Lifecycle: `closed -> open(empty | hydrated) -> [submitting -> open on
//! failure | closed on success]`. Edits are only accepted while a session
//! is open. Each session gets a process-wide generation number when it is
//! opened; a submit result is only applied to the session with the same
//! generation, so a late response can never touch a session that was closed
//! or replaced in the meantime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use editorial_core::draft::{DraftState, PostDraft};
use editorial_core::slug::SlugIndex;
use editorial_core::taxonomy::Taxonomy;
use editorial_core::types::DbId;
use editorial_core::upload::{CountingPreviewHost, PreviewHost};
use editorial_core::validation::{ValidationContext, ValidationReport};

use crate::api::{ApiError, ContentApi, PostSubmission};
use crate::submit::{self, SubmitError};
use crate::taxonomy::load_taxonomy;
use crate::wire::SavedPost;

/// Generations are unique across every [`Editor`] in the process.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// Session-scoped dependencies
// ---------------------------------------------------------------------------

/// User-visible outcome of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved { id: DbId, title: String },
    Failed { message: String },
}

/// Receives notices for the person editing.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Saved { id, title } => tracing::info!(post_id = id, %title, "Post saved"),
            Notice::Failed { message } => tracing::warn!(%message, "Post not saved"),
        }
    }
}

/// Who is editing and where to report outcomes.
#[derive(Clone)]
pub struct SessionContext {
    /// Current user, used as the default responsible editor.
    pub editor: String,
    pub notifier: Arc<dyn Notifier>,
}

impl SessionContext {
    pub fn new(editor: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            editor: editor.into(),
            notifier,
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Whether the session is editable or waiting on a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Open,
    Submitting,
    /// Saved successfully; the caller should close the session.
    Closed { post_id: DbId },
}

/// A submit in flight: the packaged snapshot plus the generation of the
/// session it came from.
#[derive(Debug)]
pub struct SubmitTicket {
    generation: u64,
    submission: PostSubmission,
}

impl SubmitTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn submission(&self) -> &PostSubmission {
        &self.submission
    }
}

/// Response to a [`SubmitTicket`], tagged with the same generation and the
/// title that was sent.
#[derive(Debug)]
pub struct SubmitResult {
    generation: u64,
    title: String,
    outcome: Result<SavedPost, ApiError>,
}

/// One open editing session.
#[derive(Debug)]
pub struct EditingSession {
    generation: u64,
    phase: SessionPhase,
    state: DraftState,
    taxonomy: Taxonomy,
    existing_slugs: SlugIndex,
    context: SessionContext,
}

impl EditingSession {
    fn new(
        generation: u64,
        state: DraftState,
        taxonomy: Taxonomy,
        context: SessionContext,
    ) -> Self {
        let existing_slugs = taxonomy.slug_index();
        Self {
            generation,
            phase: SessionPhase::Open,
            state,
            taxonomy,
            existing_slugs,
            context,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether a submit may be started (drives the submit button).
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn draft(&self) -> &PostDraft {
        self.state.draft()
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Apply one user edit and return the fresh validation report.
    ///
    /// Edits are only accepted while the session is [`SessionPhase::Open`].
    pub fn edit<F>(&mut self, f: F) -> Result<ValidationReport, SubmitError>
    where
        F: FnOnce(&mut DraftState, &Taxonomy),
    {
        self.ensure_open()?;
        f(&mut self.state, &self.taxonomy);
        Ok(self.validate())
    }

    pub fn validate(&self) -> ValidationReport {
        self.state.validate(&self.existing_slugs, &self.taxonomy)
    }

    /// Validate and package the current draft, and mark the session as
    /// submitting. A second call before [`finish_submit`](Self::finish_submit)
    /// is rejected with [`SubmitError::InFlight`].
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitError> {
        self.ensure_open()?;

        let ctx = ValidationContext {
            existing_slugs: &self.existing_slugs,
            original_slug: self.state.original_slug(),
            taxonomy: Some(&self.taxonomy),
        };
        let submission = submit::prepare(self.state.snapshot(), &ctx)?;

        self.phase = SessionPhase::Submitting;
        tracing::debug!(generation = self.generation, "Submit started");
        Ok(SubmitTicket {
            generation: self.generation,
            submission,
        })
    }

    /// Apply a submit result. Results from another generation are ignored.
    ///
    /// On success the session moves to [`SessionPhase::Closed`]; on failure
    /// it goes back to [`SessionPhase::Open`] with the draft untouched.
    pub fn finish_submit(&mut self, result: SubmitResult) -> Result<SavedPost, SubmitError> {
        if result.generation != self.generation || self.phase != SessionPhase::Submitting {
            tracing::debug!(
                result_generation = result.generation,
                session_generation = self.generation,
                "Ignoring stale submit result"
            );
            return Err(SubmitError::Stale);
        }

        match result.outcome {
            Ok(saved) => {
                self.phase = SessionPhase::Closed { post_id: saved.id };
                self.context.notifier.notify(Notice::Saved {
                    id: saved.id,
                    title: result.title,
                });
                Ok(saved)
            }
            Err(e) => {
                self.phase = SessionPhase::Open;
                self.context.notifier.notify(Notice::Failed {
                    message: e.to_string(),
                });
                Err(SubmitError::Api(e))
            }
        }
    }

    fn ensure_open(&self) -> Result<(), SubmitError> {
        match self.phase {
            SessionPhase::Open => Ok(()),
            SessionPhase::Submitting => Err(SubmitError::InFlight),
            SessionPhase::Closed { .. } => Err(SubmitError::SessionClosed),
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Opens editing sessions against a [`ContentApi`] and runs their submits.
pub struct Editor<A> {
    api: A,
    taxonomy_kind: u32,
    preview_host: Arc<dyn PreviewHost>,
}

impl<A: ContentApi> Editor<A> {
    pub fn new(api: A, taxonomy_kind: u32) -> Self {
        Self::with_preview_host(api, taxonomy_kind, Arc::new(CountingPreviewHost::new()))
    }

    pub fn with_preview_host(
        api: A,
        taxonomy_kind: u32,
        preview_host: Arc<dyn PreviewHost>,
    ) -> Self {
        Self {
            api,
            taxonomy_kind,
            preview_host,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn generation(&self) -> u64 {
        NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
    }

    /// Open the "new post" flow with an empty draft.
    pub async fn open_new(&self, context: SessionContext) -> EditingSession {
        let taxonomy = load_taxonomy(&self.api, self.taxonomy_kind).await;
        let mut state = DraftState::new(Arc::clone(&self.preview_host));
        state.reset();
        state.set_editor(context.editor.clone());

        let generation = self.generation();
        tracing::info!(generation, "Opened new post session");
        EditingSession::new(generation, state, taxonomy, context)
    }

    /// Open an existing post for editing.
    ///
    /// Fails if the post cannot be fetched; option lists still degrade to
    /// empty on their own.
    pub async fn open_existing(
        &self,
        post_id: DbId,
        context: SessionContext,
    ) -> Result<EditingSession, ApiError> {
        let (record, taxonomy) = tokio::join!(
            self.api.fetch_post(post_id),
            load_taxonomy(&self.api, self.taxonomy_kind),
        );
        let record = record.inspect_err(|e| {
            tracing::error!(post_id, error = %e, "Failed to load post for editing");
        })?;

        let mut state = DraftState::new(Arc::clone(&self.preview_host));
        state.hydrate(record);
        if state.draft().editor.trim().is_empty() {
            state.set_editor(context.editor.clone());
        }

        let generation = self.generation();
        tracing::info!(generation, post_id, "Opened post for editing");
        Ok(EditingSession::new(generation, state, taxonomy, context))
    }

    /// Send a ticket produced by [`EditingSession::begin_submit`].
    pub async fn send(&self, ticket: SubmitTicket) -> SubmitResult {
        let title = ticket.submission.payload.titulo.clone();
        let outcome = submit::send(&self.api, ticket.submission).await;
        SubmitResult {
            generation: ticket.generation,
            title,
            outcome,
        }
    }

    /// Begin, send, and finish a submit in one call.
    pub async fn submit(&self, session: &mut EditingSession) -> Result<SavedPost, SubmitError> {
        let ticket = session.begin_submit()?;
        let result = self.send(ticket).await;
        session.finish_submit(result)
    }

    /// Dispose a session, releasing its local preview.
    pub fn close(&self, mut session: EditingSession) {
        session.state.release_preview();
        tracing::info!(
            generation = session.generation,
            phase = ?session.phase,
            "Closed editing session"
        );
    }
}
