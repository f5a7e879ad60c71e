use std::time::Duration;

use validator::Validate;

use editorial_core::error::CoreError;

/// Content API client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, Validate)]
pub struct ClientConfig {
    /// Base URL of the content API; endpoint paths are appended to it.
    #[validate(url)]
    pub api_url: String,
    /// Bearer token sent as `Authorization`, if set.
    pub api_token: Option<String>,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
    /// `tipo` query value selecting the post taxonomy.
    #[validate(range(min = 1))]
    pub taxonomy_kind: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            api_token: None,
            timeout_secs: 30,
            taxonomy_kind: 1,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                     |
    /// |----------------------------|-----------------------------|
    /// | `CONTENT_API_URL`          | `http://localhost:8000/api` |
    /// | `CONTENT_API_TOKEN`        | unset                       |
    /// | `CONTENT_API_TIMEOUT_SECS` | `30`                        |
    /// | `TAXONOMY_KIND`            | `1`                         |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();

        let api_url = std::env::var("CONTENT_API_URL").unwrap_or(defaults.api_url);

        let api_token = std::env::var("CONTENT_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let timeout_secs = parse_var("CONTENT_API_TIMEOUT_SECS", defaults.timeout_secs)?;
        let taxonomy_kind = parse_var("TAXONOMY_KIND", defaults.taxonomy_kind)?;

        Self {
            api_url,
            api_token,
            timeout_secs,
            taxonomy_kind,
        }
        .validated()
    }

    /// Check field constraints, returning the config unchanged if they hold.
    pub fn validated(self) -> Result<Self, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Config(format!("Invalid client config: {e}")))?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, CoreError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Config(format!("{name} must be a valid number"))),
        Err(_) => Ok(default),
    }
}
