//! Earthdata login and temporary S3 credentials for the LAADS bucket.
//!
//! The exchange is two requests: username/password for an Earthdata bearer
//! token, then the token for short-lived AWS keys scoped to `prod-lads`.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use aerosol_common::AerosolError;
use storage::ObjectStorageConfig;

pub const TOKEN_URL: &str = "https://urs.earthdata.nasa.gov/api/users/find_or_create_token";
pub const S3_CREDENTIALS_URL: &str =
    "https://data.laadsdaac.earthdatacloud.nasa.gov/s3credentials";

/// A string that never shows up in logs or `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Earthdata account used to request archive access.
#[derive(Debug, Clone)]
pub struct EarthdataLogin {
    pub username: String,
    pub password: Secret,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Temporary AWS credentials issued by the DAAC.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: Secret,
    pub session_token: Secret,
    pub expiration: String,
}

impl S3Credentials {
    /// Parsed `expiration`; the DAAC reports e.g. `2024-01-01 12:00:00+00:00`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiration.trim();
        DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|t| t.and_utc())
            })
    }

    /// True when the credentials lapse within `margin` of `now`.
    /// Unparseable expirations are treated as non-expiring.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at().is_some_and(|t| t - margin <= now)
    }

    pub fn storage_config(&self) -> ObjectStorageConfig {
        ObjectStorageConfig::with_credentials(
            self.access_key_id.clone(),
            self.secret_access_key.expose(),
            self.session_token.expose(),
        )
    }
}

/// Client for the Earthdata token and S3 credential endpoints.
#[derive(Clone)]
pub struct CredentialClient {
    client: Client,
    token_url: String,
    s3_url: String,
}

impl CredentialClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(TOKEN_URL, S3_CREDENTIALS_URL)
    }

    pub fn with_endpoints(token_url: impl Into<String>, s3_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token_url: token_url.into(),
            s3_url: s3_url.into(),
        })
    }

    /// Exchange an Earthdata login for temporary S3 credentials.
    #[instrument(skip(self, login), fields(username = %login.username))]
    pub async fn fetch(&self, login: &EarthdataLogin) -> Result<S3Credentials> {
        let token = self.bearer_token(login).await?;
        let credentials = self.s3_credentials(&token).await?;

        info!(expiration = %credentials.expiration, "Obtained temporary S3 credentials");
        Ok(credentials)
    }

    async fn bearer_token(&self, login: &EarthdataLogin) -> Result<Secret> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&login.username, Some(login.password.expose()))
            .send()
            .await
            .context("Earthdata token request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(AerosolError::CredentialError(format!(
                "Earthdata token request returned HTTP {}",
                status
            ))
            .into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("Malformed Earthdata token response")?;
        debug!("Obtained Earthdata bearer token");

        Ok(Secret::new(body.access_token))
    }

    async fn s3_credentials(&self, token: &Secret) -> Result<S3Credentials> {
        let response = self
            .client
            .get(&self.s3_url)
            .bearer_auth(token.expose())
            .send()
            .await
            .context("S3 credential request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(AerosolError::CredentialError(format!(
                "S3 credential request returned HTTP {}",
                status
            ))
            .into());
        }

        response
            .json()
            .await
            .context("Malformed S3 credential response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials(expiration: &str) -> S3Credentials {
        serde_json::from_value(serde_json::json!({
            "accessKeyId": "AKIA",
            "secretAccessKey": "secret",
            "sessionToken": "token",
            "expiration": expiration,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_credentials_response() {
        let creds = credentials("2024-01-01 12:00:00+00:00");
        assert_eq!(creds.access_key_id, "AKIA");
        assert_eq!(creds.session_token.expose(), "token");

        let config = creds.storage_config();
        assert_eq!(config.bucket, "prod-lads");
        assert_eq!(config.secret_access_key, "secret");
        assert_eq!(config.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_expiration_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(credentials("2024-01-01 12:00:00+00:00").expires_at(), Some(expected));
        assert_eq!(credentials("2024-01-01T12:00:00Z").expires_at(), Some(expected));
        assert_eq!(credentials("2024-01-01 12:00:00").expires_at(), Some(expected));
        assert_eq!(credentials("soon").expires_at(), None);
    }

    #[test]
    fn test_expires_within_margin() {
        let creds = credentials("2024-01-01 12:00:00+00:00");
        let margin = Duration::minutes(5);

        let early = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 11, 56, 0).unwrap();
        assert!(!creds.expires_within(early, margin));
        assert!(creds.expires_within(late, margin));
        assert!(!credentials("never").expires_within(late, margin));
    }

    #[test]
    fn test_secrets_are_redacted() {
        let login = EarthdataLogin {
            username: "user".into(),
            password: Secret::new("hunter2"),
        };
        let printed = format!("{:?}", login);
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
        assert!(!format!("{:?}", credentials("x")).contains("secret\""));
    }
}
