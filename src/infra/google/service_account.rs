// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Exchanges a signed JWT for a short-lived OAuth2 access token.
//
// **Setup:**
// 1. Create a service account in Google Cloud Console and enable the Drive
//    and Docs APIs for its project.
// 2. Create a JSON key for it and copy `client_email` and `private_key` into
//    `GOOGLE_CLIENT_EMAIL` / `GOOGLE_PRIVATE_KEY` (newlines may stay escaped
//    as `\n`).
// 3. Share the Drive folder with the service account email as "Viewer".
//
// Tokens are not cached here: every network request asks for a fresh one.
// Responses served from the fetch cache never need a token at all.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::config::ServiceAccountConfig;
use crate::core::site::SiteError;

/// Lifetime requested for each assertion; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Source of bearer tokens for Google API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SiteError>;
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize, PartialEq)]
struct JwtClaims {
    /// Issuer (service account email).
    iss: String,

    /// Space-separated scopes.
    scope: String,

    /// Audience (token endpoint).
    aud: String,

    /// Issued at (Unix timestamp).
    iat: u64,

    /// Expiration (Unix timestamp).
    exp: u64,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountConfig,
    key: EncodingKey,
    client: Client,
}

impl ServiceAccountAuth {
    /// Parses the private key up front so a bad key fails before any request.
    pub fn new(credentials: ServiceAccountConfig, client: Client) -> Result<Self, SiteError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| SiteError::Auth(format!("invalid service account private key: {}", e)))?;

        Ok(Self {
            credentials,
            key,
            client,
        })
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<String, SiteError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SiteError::Auth(e.to_string()))?
            .as_secs();

        let header = Header::new(Algorithm::RS256);
        let jwt = encode(&header, &build_claims(&self.credentials, now), &self.key)
            .map_err(|e| SiteError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| SiteError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SiteError::Auth(format!(
                "token exchange failed ({}): {}",
                status, text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SiteError::Auth(e.to_string()))?;

        tracing::debug!(
            client_email = %self.credentials.client_email,
            "Obtained access token"
        );
        Ok(token_response.access_token)
    }
}

fn build_claims(credentials: &ServiceAccountConfig, now: u64) -> JwtClaims {
    JwtClaims {
        iss: credentials.client_email.clone(),
        scope: credentials.scopes.join(" "),
        aud: credentials.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SiteError> {
        self.fetch_new_token().await
    }
}
