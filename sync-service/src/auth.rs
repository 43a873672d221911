use std::fs;
use std::path::{Path, PathBuf};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Result, SyncError};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    result: String,
}

/// Exchanges the long-lived refresh token for a short-lived data access
/// token and caches it for the remainder of the process.
///
/// A failed exchange is never cached; the next call retries. There is no
/// mid-process renewal: process lifetime is assumed shorter than token
/// validity.
pub struct TokenProvider {
    token_path: PathBuf,
    base_url: String,
    http: reqwest::Client,
    cached: Mutex<Option<String>>,
}

impl TokenProvider {
    pub fn new(token_path: PathBuf, base_url: String, http: reqwest::Client) -> Self {
        Self {
            token_path,
            base_url,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Read the refresh token from disk. Called eagerly at startup so a
    /// missing credential fails before any sync work begins.
    pub fn read_refresh_token(&self) -> Result<String> {
        read_refresh_token(&self.token_path)
    }

    /// Current access token, exchanging the refresh token on first use.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let refresh = self.read_refresh_token()?;
        let url = format!("{}/api/token", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {refresh}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, "token exchange rejected");
            return Err(SyncError::AuthFailure { status, body });
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!("data access token refreshed");
        *cached = Some(token.result.clone());
        Ok(token.result)
    }
}

fn read_refresh_token(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|e| SyncError::CredentialMissing {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let token = contents.lines().next().unwrap_or("").trim().to_string();
    if token.is_empty() {
        return Err(SyncError::CredentialMissing {
            path: path.to_path_buf(),
            message: "file is empty".to_string(),
        });
    }
    Ok(token)
}
