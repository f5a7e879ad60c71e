//! Pending cover-image sources and local preview lifecycle.
//!
//! An [`UploadSource`] is either a binary the editor picked locally (not yet
//! persisted) or a URL of an asset that is already hosted. Local files get a
//! temporary preview reference from a [`PreviewHost`]; at most one is live at
//! a time and it is revoked as soon as it is superseded.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// An in-memory binary selected by the editor.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where the cover image comes from. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSource {
    File(UploadFile),
    Url(String),
}

impl UploadSource {
    /// Build a source from a typed URL. Blank input clears the source.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        (!url.is_empty()).then(|| Self::Url(url.to_string()))
    }

    /// Display label: the file name or the URL itself.
    pub fn label(&self) -> &str {
        match self {
            Self::File(file) => &file.file_name,
            Self::Url(url) => url,
        }
    }
}

// ---------------------------------------------------------------------------
// Preview handles
// ---------------------------------------------------------------------------

/// Opaque temporary preview reference, rendered as `blob:<uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(Uuid);

impl PreviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Allocates and revokes local preview references.
pub trait PreviewHost: Send + Sync {
    fn allocate(&self, file: &UploadFile) -> PreviewId;
    fn revoke(&self, id: PreviewId);
}

/// A live preview reference. Revoked on drop.
pub struct ActivePreview {
    id: PreviewId,
    host: Arc<dyn PreviewHost>,
}

impl ActivePreview {
    pub fn allocate(host: Arc<dyn PreviewHost>, file: &UploadFile) -> Self {
        let id = host.allocate(file);
        Self { id, host }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl fmt::Debug for ActivePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActivePreview").field(&self.id).finish()
    }
}

impl Drop for ActivePreview {
    fn drop(&mut self) {
        self.host.revoke(self.id);
    }
}

/// Preview host that only tracks which references are live.
///
/// Used outside a browser context, and by tests to assert that no more than
/// one preview is live at once.
#[derive(Debug, Default)]
pub struct CountingPreviewHost {
    live: Mutex<HashSet<PreviewId>>,
    peak: AtomicUsize,
    allocated: AtomicUsize,
}

impl CountingPreviewHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    /// Highest number of simultaneously live references ever observed.
    pub fn peak_count(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn is_live(&self, id: PreviewId) -> bool {
        self.live
            .lock()
            .map(|live| live.contains(&id))
            .unwrap_or(false)
    }
}

impl PreviewHost for CountingPreviewHost {
    fn allocate(&self, _file: &UploadFile) -> PreviewId {
        let id = PreviewId::new();
        if let Ok(mut live) = self.live.lock() {
            live.insert(id);
            self.peak.fetch_max(live.len(), Ordering::SeqCst);
        }
        self.allocated.fetch_add(1, Ordering::SeqCst);
        id
    }

    fn revoke(&self, id: PreviewId) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Keeps the preview for the draft's current image source.
///
/// Holds at most one [`ActivePreview`]; a URL source has none.
pub struct PreviewSlot {
    preview: Option<ActivePreview>,
    host: Arc<dyn PreviewHost>,
}

impl PreviewSlot {
    pub fn new(host: Arc<dyn PreviewHost>) -> Self {
        Self {
            preview: None,
            host,
        }
    }

    /// Track a new image source. Any previous preview is revoked before a
    /// new one is allocated.
    pub fn replace(&mut self, source: Option<&UploadSource>) {
        self.preview = None;
        if let Some(UploadSource::File(file)) = source {
            self.preview = Some(ActivePreview::allocate(Arc::clone(&self.host), file));
        }
    }

    /// Revoke the current preview, if any.
    pub fn release(&mut self) {
        self.preview = None;
    }

    pub fn current(&self) -> Option<PreviewId> {
        self.preview.as_ref().map(ActivePreview::id)
    }
}

impl fmt::Debug for PreviewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewSlot")
            .field("preview", &self.preview)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
