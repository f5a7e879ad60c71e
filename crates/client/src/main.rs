//! `editorial` -- command-line front end for the editorial pipeline.
//!
//! Loads a draft from a JSON file, applies it to an editing session the same
//! way the form would, validates it against the live option lists, and
//! submits it to the content API.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default                     |
//! |----------------------------|----------|-----------------------------|
//! | `CONTENT_API_URL`          | no       | `http://localhost:8000/api` |
//! | `CONTENT_API_TOKEN`        | no       | --                          |
//! | `CONTENT_API_TIMEOUT_SECS` | no       | `30`                        |
//! | `TAXONOMY_KIND`            | no       | `1`                         |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use editorial_client::api::HttpContentApi;
use editorial_client::config::ClientConfig;
use editorial_client::session::{EditingSession, Editor, LogNotifier, SessionContext};
use editorial_client::taxonomy::load_taxonomy;
use editorial_core::draft::{DraftState, WorkflowStatus};
use editorial_core::error::CoreError;
use editorial_core::taxonomy::Taxonomy;
use editorial_core::types::{DbId, Timestamp};
use editorial_core::upload::{UploadFile, UploadSource};

#[derive(Parser)]
#[command(name = "editorial")]
#[command(about = "Validate and publish posts to the content API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a draft and submit it
    Publish(DraftArgs),
    /// Validate a draft without submitting it
    Check(DraftArgs),
    /// Print the category, subcategory, and reference-post lists
    Taxonomy,
}

#[derive(Args)]
struct DraftArgs {
    /// JSON file with the draft fields
    draft: PathBuf,
    /// Local cover image to upload with the post
    #[arg(long)]
    image: Option<PathBuf>,
    /// Edit this existing post instead of creating a new one
    #[arg(long)]
    post_id: Option<DbId>,
    /// Name recorded as the responsible editor when the draft has none
    #[arg(long, default_value = "editorial")]
    editor: String,
}

/// Draft fields as read from disk. Absent fields leave the session's value
/// untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftInput {
    title: Option<String>,
    slug: Option<String>,
    short_description: Option<String>,
    body: Option<String>,
    special_blocks: Option<String>,
    source: Option<String>,
    reference_post_id: Option<DbId>,
    category_id: Option<DbId>,
    subcategory_id: Option<DbId>,
    tags: Option<Vec<String>>,
    image_url: Option<String>,
    image_alt: Option<String>,
    published_at: Option<Timestamp>,
    scheduled_at: Option<Timestamp>,
    status: Option<WorkflowStatus>,
    featured: Option<bool>,
    editor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "editorial_client=info,editorial=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let taxonomy_kind = config.taxonomy_kind;
    let api = HttpContentApi::new(config)?;
    tracing::info!(api_url = %api.config().api_url, "Using content API");
    let editor = Editor::new(api, taxonomy_kind);

    match cli.command {
        Command::Taxonomy => {
            let taxonomy = load_taxonomy(editor.api(), taxonomy_kind).await;
            println!("{}", serde_json::to_string_pretty(&taxonomy)?);
        }
        Command::Check(args) => {
            let session = open_with_draft(&editor, &args).await?;
            let report = session.validate();
            println!("{}", serde_json::to_string_pretty(&report)?);
            editor.close(session);
            if !report.is_valid() {
                anyhow::bail!("Draft is not valid: {}", report.summary());
            }
        }
        Command::Publish(args) => {
            let mut session = open_with_draft(&editor, &args).await?;
            let outcome = editor.submit(&mut session).await;
            editor.close(session);
            let saved = outcome?;
            println!("{}", saved.id);
        }
    }

    Ok(())
}

/// Open a session (new or existing) and apply the draft file and image.
async fn open_with_draft(
    editor: &Editor<HttpContentApi>,
    args: &DraftArgs,
) -> anyhow::Result<EditingSession> {
    let raw = tokio::fs::read_to_string(&args.draft)
        .await
        .with_context(|| format!("Cannot read draft file {}", args.draft.display()))?;
    let input: DraftInput = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid draft file {}", args.draft.display()))?;

    let image = match &args.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let context = SessionContext::new(args.editor.clone(), Arc::new(LogNotifier));
    let mut session = match args.post_id {
        Some(id) => editor.open_existing(id, context).await?,
        None => editor.open_new(context).await,
    };

    let mut applied = Ok(());
    let report = session.edit(|state, taxonomy| {
        applied = apply_draft(state, taxonomy, input);
        if let Some(file) = image {
            state.set_image(Some(UploadSource::File(file)));
        }
    })?;
    applied?;

    for warning in &report.warnings {
        tracing::warn!(field = %warning.field, message = %warning.message, "Draft warning");
    }
    Ok(session)
}

/// Apply each present field through the same setters the form uses.
fn apply_draft(
    state: &mut DraftState,
    taxonomy: &Taxonomy,
    input: DraftInput,
) -> Result<(), CoreError> {
    if let Some(title) = input.title {
        state.set_title(title);
    }
    if let Some(slug) = input.slug {
        state.set_slug(&slug);
    }
    if let Some(text) = input.short_description {
        state.set_short_description(text);
    }
    if let Some(body) = input.body {
        state.set_body(body);
    }
    if input.special_blocks.is_some() {
        state.set_special_blocks(input.special_blocks);
    }
    if input.source.is_some() {
        state.set_source(input.source);
    }
    if input.reference_post_id.is_some() {
        state.set_reference_post(input.reference_post_id);
    }
    if input.category_id.is_some() {
        state.set_category(input.category_id, taxonomy);
    }
    if input.subcategory_id.is_some() {
        state.set_subcategory(input.subcategory_id, taxonomy)?;
    }
    for tag in input.tags.unwrap_or_default() {
        state.add_tags(&tag);
    }
    if let Some(source) = input.image_url.as_deref().and_then(UploadSource::from_url) {
        state.set_image(Some(source));
    }
    if let Some(alt) = input.image_alt {
        state.set_image_alt(alt);
    }
    if input.published_at.is_some() {
        state.set_published_at(input.published_at);
    }
    if input.scheduled_at.is_some() {
        state.set_scheduled_at(input.scheduled_at);
    }
    if let Some(status) = input.status {
        state.set_status(status);
    }
    if let Some(featured) = input.featured {
        state.set_featured(featured);
    }
    if let Some(editor) = input.editor.filter(|e| !e.trim().is_empty()) {
        state.set_editor(editor);
    }
    Ok(())
}

async fn read_image(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(UploadFile {
        content_type: content_type_for(path).to_string(),
        file_name,
        bytes,
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
