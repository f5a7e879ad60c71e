//! Request and response shapes of the external content API.
//!
//! The API uses Portuguese field names; these DTOs translate to and from the
//! canonical domain types in `editorial_core`.

use serde::{Deserialize, Serialize};

use editorial_core::draft::{PostRecord, WorkflowStatus};
use editorial_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Taxonomy entries
// ---------------------------------------------------------------------------

/// Entry of `GET categoria-list`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub id: DbId,
    pub nome: String,
}

/// Entry of `GET subcategoria-list`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubcategoryEntry {
    pub id: DbId,
    pub nome: String,
    pub categoria_id: DbId,
}

/// Entry of `GET post-titles-list`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostTitleEntry {
    pub id: DbId,
    pub titulo: String,
    #[serde(default)]
    pub slug: Option<String>,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Structured body of `post-create-or-update`.
///
/// When a new image is uploaded it travels as a separate multipart part and
/// `imagem` is `None`; otherwise `imagem` carries the existing URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    pub titulo: String,
    pub slug: String,
    pub descricao_curta: String,
    pub conteudo: String,
    pub blocos_especiais: Option<String>,
    pub fonte: Option<String>,
    pub post_referencia_id: Option<DbId>,
    pub categoria_id: Option<DbId>,
    pub subcategoria_id: Option<DbId>,
    pub tags: Vec<String>,
    pub imagem: Option<String>,
    pub imagem_alt: String,
    pub data_publicacao: Option<Timestamp>,
    pub data_agendada: Option<Timestamp>,
    pub status: WorkflowStatus,
    pub destaque: bool,
    pub responsavel: String,
}

/// Post as returned by `GET post-detail`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRecordWire {
    pub id: DbId,
    pub slug: String,
    pub titulo: String,
    #[serde(default)]
    pub descricao_curta: String,
    #[serde(default)]
    pub conteudo: String,
    #[serde(default)]
    pub blocos_especiais: Option<String>,
    #[serde(default)]
    pub fonte: Option<String>,
    #[serde(default)]
    pub post_referencia_id: Option<DbId>,
    #[serde(default)]
    pub categoria_id: Option<DbId>,
    #[serde(default)]
    pub subcategoria_id: Option<DbId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub imagem: Option<String>,
    #[serde(default)]
    pub imagem_alt: String,
    #[serde(default)]
    pub data_publicacao: Option<Timestamp>,
    #[serde(default)]
    pub data_agendada: Option<Timestamp>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub destaque: bool,
    #[serde(default)]
    pub responsavel: String,
}

impl From<PostRecordWire> for PostRecord {
    fn from(w: PostRecordWire) -> Self {
        Self {
            id: w.id,
            slug: w.slug,
            title: w.titulo,
            short_description: w.descricao_curta,
            body: w.conteudo,
            special_blocks: w.blocos_especiais,
            source: w.fonte,
            reference_post_id: w.post_referencia_id,
            category_id: w.categoria_id,
            subcategory_id: w.subcategoria_id,
            tags: w.tags,
            image_url: w.imagem,
            image_alt: w.imagem_alt,
            published_at: w.data_publicacao,
            scheduled_at: w.data_agendada,
            status: w.status,
            featured: w.destaque,
            editor: w.responsavel,
        }
    }
}

/// `data` of a successful `post-create-or-update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPost {
    pub id: DbId,
    #[serde(default)]
    pub slug: Option<String>,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// `status` is a boolean on some endpoints and a string on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiStatus {
    Flag(bool),
    Text(String),
}

impl ApiStatus {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Flag(ok) => *ok,
            Self::Text(s) => matches!(s.to_ascii_lowercase().as_str(), "success" | "ok"),
        }
    }
}

/// `{status, data | message}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: ApiStatus,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accepts_boolean_and_string_status() {
        let ok: ApiEnvelope<SavedPost> =
            serde_json::from_str(r#"{"status": true, "data": {"id": 7}}"#).unwrap();
        assert!(ok.status.is_success());
        assert_eq!(ok.data.unwrap().id, 7);

        let failed: ApiEnvelope<SavedPost> =
            serde_json::from_str(r#"{"status": "error", "message": "slug em uso"}"#).unwrap();
        assert!(!failed.status.is_success());
        assert!(failed.data.is_none());
        assert_eq!(failed.message.as_deref(), Some("slug em uso"));
    }

    #[test]
    fn record_wire_maps_to_domain_names() {
        let wire: PostRecordWire = serde_json::from_value(serde_json::json!({
            "id": 3,
            "slug": "feira-de-saude",
            "titulo": "Feira de Saúde",
            "descricao_curta": "Atendimento gratuito",
            "imagem": "https://cdn.example.org/feira.jpg",
            "status": "in_review",
            "tags": ["saude"]
        }))
        .unwrap();
        let record = PostRecord::from(wire);

        assert_eq!(record.title, "Feira de Saúde");
        assert_eq!(record.short_description, "Atendimento gratuito");
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.example.org/feira.jpg"));
        assert_eq!(record.status, WorkflowStatus::InReview);
        assert!(!record.featured);
    }

    #[test]
    fn payload_omits_id_for_new_posts() {
        let payload = PostPayload {
            id: None,
            titulo: "T".into(),
            slug: "t".into(),
            descricao_curta: "d".into(),
            conteudo: "c".into(),
            blocos_especiais: None,
            fonte: None,
            post_referencia_id: None,
            categoria_id: Some(1),
            subcategoria_id: None,
            tags: vec![],
            imagem: None,
            imagem_alt: "a".into(),
            data_publicacao: None,
            data_agendada: None,
            status: WorkflowStatus::Draft,
            destaque: false,
            responsavel: "r".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["status"], "draft");
    }
}
