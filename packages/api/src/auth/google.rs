//! # Google identity-token verification
//!
//! Google Sign-In on the device yields an ID token. Before a profile is created
//! or loaded, [`crate::UserRepository::sign_in_with_google`] hands that token to
//! an [`IdentityVerifier`] and works only with the returned [`IdentityClaims`].
//!
//! ## Types
//!
//! - [`IdentityVerifier`]: async seam over "is this token genuine, and who is it for".
//! - [`IdentityClaims`]: the subject (stable provider user id), email and display name.
//! - [`GoogleTokenVerifier`]: production verifier. It calls Google's `tokeninfo`
//!   endpoint, which validates the signature and expiry, and then checks that the
//!   token's audience is this app's OAuth client id.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verified identity behind an ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    /// Provider user id; becomes the profile id.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Async trait for exchanging an identity token for verified claims.
pub trait IdentityVerifier {
    fn verify(&self, id_token: &str) -> impl Future<Output = Result<IdentityClaims, AuthError>>;
}

/// Google `tokeninfo` response. Google encodes booleans as strings here.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
}

/// Verifies Google ID tokens against the `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: Client,
    client_id: String,
    endpoint: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: &str) -> Self {
        Self::with_endpoint(client_id, TOKENINFO_URL)
    }

    pub fn with_endpoint(client_id: &str, endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims, AuthError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::IdentityToken(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::IdentityToken(format!(
                "token rejected ({})",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AuthError::IdentityToken(e.to_string()))?;
        debug!(subject = %info.sub, "tokeninfo verified");
        claims_for(info, &self.client_id)
    }
}

fn claims_for(info: TokenInfo, client_id: &str) -> Result<IdentityClaims, AuthError> {
    if info.aud != client_id {
        return Err(AuthError::IdentityToken(
            "token was issued for another client".into(),
        ));
    }
    // Unverified addresses are dropped rather than trusted.
    let email = match info.email_verified.as_deref() {
        Some("true") => info.email,
        _ => None,
    };
    Ok(IdentityClaims {
        subject: info.sub,
        email,
        name: info.name,
    })
}
