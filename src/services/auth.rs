use crate::config::{AppleConfig, SpotifyConfig};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Apple's upper bound on the lifetime of a signed client secret or developer token.
const APPLE_TOKEN_LIFETIME_DAYS: i64 = 180;
const APPLE_AUDIENCE: &str = "https://appleid.apple.com";

#[derive(Debug, Serialize, Deserialize)]
pub struct AppleClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// Turns OAuth authorization codes into access tokens and mints Apple's signed JWTs.
pub struct TokenExchange {
    spotify: SpotifyConfig,
    apple: AppleConfig,
    client: Client,
}

impl TokenExchange {
    pub fn new(spotify: SpotifyConfig, apple: AppleConfig, client: Client) -> Self {
        Self {
            spotify,
            apple,
            client,
        }
    }

    pub async fn exchange_spotify_code(&self, code: &str) -> Result<AccessGrant> {
        let url = format!("{}/api/token", self.spotify.accounts_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.spotify.client_id, Some(&self.spotify.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.spotify.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Spotify request failed: {}", e)))?;

        read_token_response(response, "Spotify").await
    }

    pub async fn exchange_apple_code(&self, code: &str) -> Result<AccessGrant> {
        let url = format!("{}/auth/token", self.apple.auth_url);
        let client_secret = self.apple_client_secret()?;

        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.apple.client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.apple.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("Apple request failed: {}", e)))?;

        read_token_response(response, "Apple").await
    }

    /// Client secret for the Sign in with Apple token endpoint.
    pub fn apple_client_secret(&self) -> Result<String> {
        self.sign_apple_claims(Some(APPLE_AUDIENCE), Some(&self.apple.client_id))
    }

    /// Developer token for Apple Music API calls. Minted fresh on every call.
    pub fn apple_developer_token(&self) -> Result<String> {
        self.sign_apple_claims(None, None)
    }

    fn sign_apple_claims(&self, aud: Option<&str>, sub: Option<&str>) -> Result<String> {
        let now = Utc::now();
        let claims = AppleClaims {
            iss: self.apple.team_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(APPLE_TOKEN_LIFETIME_DAYS)).timestamp(),
            aud: aud.map(str::to_string),
            sub: sub.map(str::to_string),
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.apple.key_id.clone());

        let key = EncodingKey::from_ec_pem(self.apple.private_key.as_bytes())?;
        tracing::debug!(
            "Signing Apple JWT for team {} with key {}",
            self.apple.team_id,
            self.apple.key_id
        );

        Ok(encode(&header, &claims, &key)?)
    }
}

async fn read_token_response(response: reqwest::Response, provider: &str) -> Result<AccessGrant> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("{} token endpoint error: {} - {}", provider, status, body);
        return Err(AppError::UpstreamAuth(format!(
            "{} token endpoint returned status: {}",
            provider, status
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        AppError::UpstreamAuth(format!("Failed to parse {} token response: {}", provider, e))
    })?;

    match token.access_token {
        Some(access_token) if !access_token.is_empty() => Ok(AccessGrant {
            access_token,
            expires_in: token.expires_in,
        }),
        _ => Err(AppError::UpstreamAuth(format!(
            "{} token response has no access_token",
            provider
        ))),
    }
}
