//! Persistence submitter: validate, package, and send a draft snapshot.
//!
//! The submitter only reads the snapshot it is given; it never touches the
//! session's draft state.

use editorial_core::draft::PostDraft;
use editorial_core::slug::normalize_slug;
use editorial_core::upload::UploadSource;
use editorial_core::validation::{validate_draft, ValidationContext, ValidationReport};

use crate::api::{ApiError, ContentApi, PostSubmission};
use crate::wire::{PostPayload, SavedPost};

/// Errors from a submit attempt.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The draft still has blocking field errors.
    #[error("Draft has validation errors: {}", .0.summary())]
    Invalid(ValidationReport),

    /// A submit for this session is already pending.
    #[error("A submit is already in flight for this session")]
    InFlight,

    /// The session was already saved and closed.
    #[error("Editing session is closed")]
    SessionClosed,

    /// The result belongs to a session that has since been closed or
    /// reopened.
    #[error("Submit result arrived for a stale session")]
    Stale,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Re-validate `draft`, finalize its slug, and package it for sending.
///
/// A locally picked image becomes the binary part of the submission; an
/// existing URL is carried unchanged in the payload.
pub fn prepare(
    mut draft: PostDraft,
    ctx: &ValidationContext<'_>,
) -> Result<PostSubmission, SubmitError> {
    let report = validate_draft(&draft, ctx);
    if !report.is_valid() {
        return Err(SubmitError::Invalid(report));
    }

    draft.slug = normalize_slug(&draft.slug);

    let (image_url, image) = match draft.image.take() {
        Some(UploadSource::File(file)) => (None, Some(file)),
        Some(UploadSource::Url(url)) => (Some(url), None),
        None => (None, None),
    };

    let payload = PostPayload {
        id: draft.id,
        titulo: draft.title,
        slug: draft.slug,
        descricao_curta: draft.short_description,
        conteudo: draft.body,
        blocos_especiais: draft.special_blocks,
        fonte: draft.source,
        post_referencia_id: draft.reference_post_id,
        categoria_id: draft.category_id,
        subcategoria_id: draft.subcategory_id,
        tags: draft.tags.into(),
        imagem: image_url,
        imagem_alt: draft.image_alt,
        data_publicacao: draft.published_at,
        data_agendada: draft.scheduled_at,
        status: draft.status,
        destaque: draft.featured,
        responsavel: draft.editor,
    };

    Ok(PostSubmission { payload, image })
}

/// Send a packaged submission. The image payload is consumed by the request.
pub async fn send<A: ContentApi>(
    api: &A,
    submission: PostSubmission,
) -> Result<SavedPost, ApiError> {
    let post_id = submission.payload.id;
    let slug = submission.payload.slug.clone();
    let multipart = submission.is_multipart();

    match api.save_post(submission).await {
        Ok(saved) => {
            tracing::info!(
                post_id = saved.id,
                slug = %slug,
                multipart,
                "Post saved"
            );
            Ok(saved)
        }
        Err(e) => {
            tracing::error!(?post_id, slug = %slug, error = %e, "Failed to save post");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use editorial_core::slug::SlugIndex;
    use editorial_core::upload::UploadFile;
    use editorial_core::validation::{FieldError, PostField};

    use super::*;

    fn draft() -> PostDraft {
        let mut draft = PostDraft {
            slug: "mutirao-de-limpeza".into(),
            title: "Mutirão de Limpeza".into(),
            short_description: "Junte-se a nós".into(),
            body: "<p>Sábado às 8h</p>".into(),
            category_id: Some(3),
            image: Some(UploadSource::Url("https://cdn.example.org/mutirao.jpg".into())),
            image_alt: "Voluntários com sacos de lixo".into(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()),
            editor: "Carla".into(),
            ..PostDraft::default()
        };
        draft.tags.add_entry("meio ambiente, voluntariado");
        draft
    }

    fn ctx(index: &SlugIndex) -> ValidationContext<'_> {
        ValidationContext {
            existing_slugs: index,
            original_slug: None,
            taxonomy: None,
        }
    }

    #[test]
    fn url_image_travels_in_payload() {
        let index = SlugIndex::new();
        let submission = prepare(draft(), &ctx(&index)).unwrap();

        assert!(!submission.is_multipart());
        assert_eq!(
            submission.payload.imagem.as_deref(),
            Some("https://cdn.example.org/mutirao.jpg")
        );
        assert_eq!(submission.payload.tags, vec!["meio ambiente", "voluntariado"]);
        assert_eq!(submission.payload.descricao_curta, "Junte-se a nós");
    }

    #[test]
    fn local_image_becomes_binary_part() {
        let index = SlugIndex::new();
        let mut draft = draft();
        draft.image = Some(UploadSource::File(UploadFile {
            file_name: "mutirao.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        }));
        let submission = prepare(draft, &ctx(&index)).unwrap();

        assert!(submission.is_multipart());
        assert!(submission.payload.imagem.is_none());
        assert_eq!(submission.image.unwrap().bytes, vec![1, 2, 3]);
    }

    #[test]
    fn invalid_draft_is_refused() {
        let index = SlugIndex::new();
        let mut draft = draft();
        draft.image = None;
        draft.image_alt.clear();

        let err = prepare(draft, &ctx(&index)).unwrap_err();
        assert_matches!(
            &err,
            SubmitError::Invalid(report)
                if report.error(PostField::Image) == Some(&FieldError::Required)
        );
        assert!(err.to_string().contains("image: required"));
    }

    #[test]
    fn duplicate_slug_is_refused() {
        let index: SlugIndex = ["mutirao-de-limpeza"].into_iter().collect();
        assert_matches!(
            prepare(draft(), &ctx(&index)),
            Err(SubmitError::Invalid(_))
        );
    }
}
