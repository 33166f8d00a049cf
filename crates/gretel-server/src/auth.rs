//! Caller identity verification.
//!
//! The proxy treats the credential as opaque: it is whatever the browser
//! client posted in the request's `auth` field. Verification is an async
//! predicate so the transport layer can swap implementations without touching
//! the pipeline.

use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve true to accept the caller, false to reject with 401.
    async fn is_authenticated(&self, credential: Option<&str>) -> bool;
}

/// Accepts every caller. Used when no identity provider is configured.
pub struct OpenAccess;

#[async_trait]
impl Authenticator for OpenAccess {
    async fn is_authenticated(&self, _credential: Option<&str>) -> bool {
        true
    }
}

/// The credential posted by the browser client: a serialized Google sign-in
/// session.
#[derive(Debug, Deserialize)]
struct GoogleSession {
    #[serde(rename = "clientId")]
    client_id: Option<String>,
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
}

/// Verifies Google id tokens via the tokeninfo endpoint.
///
/// Pinning the audience to our own client id ensures we only accept tokens
/// minted for this application. Any failure along the way resolves to a
/// rejection, never an error.
pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleIdentity {
    const TOKENINFO_URL: &'static str = "https://oauth2.googleapis.com/tokeninfo";

    pub fn new(client_id: String) -> Self {
        Self::with_tokeninfo_url(client_id, Self::TOKENINFO_URL.to_string())
    }

    pub fn with_tokeninfo_url(client_id: String, tokeninfo_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            tokeninfo_url,
        }
    }
}

#[async_trait]
impl Authenticator for GoogleIdentity {
    async fn is_authenticated(&self, credential: Option<&str>) -> bool {
        let Some(raw) = credential else {
            return false;
        };
        let Ok(session) = serde_json::from_str::<GoogleSession>(raw) else {
            return false;
        };
        let (Some(_), Some(token)) = (session.client_id, session.credential) else {
            return false;
        };

        // tokeninfo validates signature and expiry; we additionally check
        // that the token was issued for our application.
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token.as_str())])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<TokenInfo>().await {
                Ok(info) => info.aud == self.client_id,
                Err(_) => false,
            },
            _ => false,
        }
    }
}
