//! HTTP client for the external content API.
//!
//! [`ContentApi`] is the seam the rest of the pipeline depends on;
//! [`HttpContentApi`] implements it with [`reqwest`].

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;

use editorial_core::draft::PostRecord;
use editorial_core::types::DbId;
use editorial_core::upload::UploadFile;

use crate::config::ClientConfig;
use crate::wire::{ApiEnvelope, PostPayload, PostRecordWire, SavedPost};

/// Multipart field carrying the JSON payload when an image is attached.
pub const PAYLOAD_PART: &str = "dados";

/// Multipart field carrying the new cover image.
pub const IMAGE_PART: &str = "imagem";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the content API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status or a failed envelope.
    #[error("Content API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when the API produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            Self::Decode(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A packaged post ready to send: the structured payload plus, when a new
/// image was picked locally, its binary.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSubmission {
    pub payload: PostPayload,
    pub image: Option<UploadFile>,
}

impl PostSubmission {
    pub fn is_update(&self) -> bool {
        self.payload.id.is_some()
    }

    pub fn is_multipart(&self) -> bool {
        self.image.is_some()
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Operations the editorial pipeline needs from the content API.
///
/// List endpoints return raw JSON entries; callers decode and validate them
/// one at a time.
pub trait ContentApi: Send + Sync {
    /// `GET categoria-list?tipo=<kind>`.
    fn list_categories(
        &self,
        kind: u32,
    ) -> impl Future<Output = Result<Vec<Value>, ApiError>> + Send;

    /// `GET subcategoria-list?tipo=<kind>`.
    fn list_subcategories(
        &self,
        kind: u32,
    ) -> impl Future<Output = Result<Vec<Value>, ApiError>> + Send;

    /// `GET post-titles-list`.
    fn list_post_titles(&self) -> impl Future<Output = Result<Vec<Value>, ApiError>> + Send;

    /// `GET post-detail?id=<id>`.
    fn fetch_post(&self, id: DbId) -> impl Future<Output = Result<PostRecord, ApiError>> + Send;

    /// `POST` (new) or `PUT` (existing) `post-create-or-update`.
    fn save_post(
        &self,
        submission: PostSubmission,
    ) -> impl Future<Output = Result<SavedPost, ApiError>> + Send;
}

// ---------------------------------------------------------------------------
// reqwest implementation
// ---------------------------------------------------------------------------

/// [`ContentApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpContentApi {
    /// Build a client with the configured timeout and bearer token.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Decode(format!("Invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, ApiError> {
        let response = self
            .client
            .get(self.config.endpoint(path))
            .query(query)
            .send()
            .await?;
        let body: Value = Self::ensure_success(response).await?.json().await?;
        extract_list(body)
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or an
    /// [`ApiError::Api`] carrying the status and whatever message the body
    /// holds.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (message, details) = match serde_json::from_str::<ApiEnvelope<Value>>(&body) {
            Ok(envelope) => (envelope.message.unwrap_or(body), envelope.details),
            Err(_) => (body, None),
        };
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
            details,
        })
    }

    /// Decode a `{status, data | message}` envelope and return `data`.
    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let response = Self::ensure_success(response).await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        unwrap_envelope(status, envelope)
    }
}

impl ContentApi for HttpContentApi {
    async fn list_categories(&self, kind: u32) -> Result<Vec<Value>, ApiError> {
        self.get_list("categoria-list", &[("tipo", kind.to_string())]).await
    }

    async fn list_subcategories(&self, kind: u32) -> Result<Vec<Value>, ApiError> {
        self.get_list("subcategoria-list", &[("tipo", kind.to_string())]).await
    }

    async fn list_post_titles(&self) -> Result<Vec<Value>, ApiError> {
        self.get_list("post-titles-list", &[]).await
    }

    async fn fetch_post(&self, id: DbId) -> Result<PostRecord, ApiError> {
        let response = self
            .client
            .get(self.config.endpoint("post-detail"))
            .query(&[("id", id)])
            .send()
            .await?;
        let wire: PostRecordWire = Self::parse_envelope(response).await?;
        Ok(wire.into())
    }

    async fn save_post(&self, submission: PostSubmission) -> Result<SavedPost, ApiError> {
        let url = self.config.endpoint("post-create-or-update");
        let request = if submission.is_update() {
            self.client.put(url)
        } else {
            self.client.post(url)
        };

        let request = match submission.image {
            Some(file) => {
                let json = serde_json::to_string(&submission.payload)
                    .map_err(|e| ApiError::Decode(format!("Cannot encode payload: {e}")))?;
                let image = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)?;
                let form = Form::new()
                    .text(PAYLOAD_PART, json)
                    .part(IMAGE_PART, image);
                request.multipart(form)
            }
            None => request.json(&submission.payload),
        };

        let response = request.send().await?;
        Self::parse_envelope(response).await
    }
}

/// Accept either a bare JSON array or an envelope whose `data` is an array.
fn extract_list(body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::Decode("Expected a JSON array of entries".into())),
        },
        _ => Err(ApiError::Decode("Expected a JSON array of entries".into())),
    }
}

fn unwrap_envelope<T>(http_status: u16, envelope: ApiEnvelope<T>) -> Result<T, ApiError> {
    if !envelope.status.is_success() {
        return Err(ApiError::Api {
            status: http_status,
            message: envelope
                .message
                .unwrap_or_else(|| "Request was not successful".to_string()),
            details: envelope.details,
        });
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("Successful response without data".into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn extract_list_accepts_bare_array() {
        let items = extract_list(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn extract_list_accepts_data_envelope() {
        let items = extract_list(json!({"status": true, "data": [{"id": 1}]})).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn extract_list_rejects_other_shapes() {
        assert_matches!(extract_list(json!({"id": 1})), Err(ApiError::Decode(_)));
        assert_matches!(extract_list(json!("oops")), Err(ApiError::Decode(_)));
    }

    #[test]
    fn failed_envelope_becomes_api_error() {
        let envelope: ApiEnvelope<SavedPost> = serde_json::from_value(json!({
            "status": false,
            "message": "Slug já utilizado",
            "details": {"slug": ["duplicado"]}
        }))
        .unwrap();
        let err = unwrap_envelope(200, envelope).unwrap_err();
        assert_matches!(
            &err,
            ApiError::Api { status: 200, message, details: Some(_) }
                if message == "Slug já utilizado"
        );
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn successful_envelope_without_data_is_decode_error() {
        let envelope: ApiEnvelope<SavedPost> =
            serde_json::from_value(json!({"status": "success"})).unwrap();
        assert_matches!(unwrap_envelope(200, envelope), Err(ApiError::Decode(_)));
    }

    #[test]
    fn api_error_display() {
        let err = ApiError::Api {
            status: 422,
            message: "dados inválidos".into(),
            details: None,
        };
        assert_eq!(err.to_string(), "Content API error (422): dados inválidos");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = ApiError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }

    #[test]
    fn client_builds_with_token() {
        let config = ClientConfig {
            api_token: Some("segredo".into()),
            ..ClientConfig::default()
        };
        let api = HttpContentApi::new(config).unwrap();
        assert_eq!(api.config().api_token.as_deref(), Some("segredo"));
    }
}
