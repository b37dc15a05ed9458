use crate::domain::ports::CredentialProvider;
use crate::utils::error::{MailError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// 提前一分鐘視為過期，避免送信途中 token 失效
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Authorized-user token file, as written by Google's installed-app flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl AuthorizedUserToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_SKEW_SECONDS) > now,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Reads `token.json`, refreshes it with the stored refresh token once expired,
/// and writes the refreshed token back to the same file.
pub struct FileTokenProvider {
    path: PathBuf,
    client: Client,
    cached: Mutex<Option<AuthorizedUserToken>>,
}

impl FileTokenProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            client: Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<AuthorizedUserToken> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MailError::CredentialError {
                message: format!(
                    "cannot read token file {}: {}; authorize the account first",
                    self.path.display(),
                    e
                ),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| MailError::CredentialError {
            message: format!("invalid token file {}: {}", self.path.display(), e),
        })
    }

    async fn refresh(&self, token: &mut AuthorizedUserToken) -> Result<()> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            token.refresh_token.as_deref(),
            token.client_id.as_deref(),
            token.client_secret.as_deref(),
        ) else {
            return Err(MailError::CredentialError {
                message: "token expired and cannot be refreshed \
                          (missing refresh_token or client credentials)"
                    .to_string(),
            });
        };

        tracing::info!("🔑 Refreshing mail API token");
        let response = self
            .client
            .post(&token.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::CredentialError {
                message: format!("token refresh failed with {}: {}", status, body),
            });
        }

        let refreshed: RefreshResponse = response.json().await?;
        token.token = Some(refreshed.access_token);
        token.expiry = refreshed
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds));

        let serialized = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.path, serialized).await?;
        tracing::debug!("Refreshed token written to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FileTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        // 刷新失敗時不留快取，下次重新讀檔
        let mut token = match cached.take() {
            Some(token) => token,
            None => self.load().await?,
        };

        if !token.is_fresh(Utc::now()) {
            self.refresh(&mut token).await?;
        }

        let access_token = token.token.clone().ok_or_else(|| MailError::CredentialError {
            message: "token file has no access token".to_string(),
        })?;
        *cached = Some(token);
        Ok(access_token)
    }
}

/// A pre-issued bearer token, e.g. from `MAIL_ACCESS_TOKEN`.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
