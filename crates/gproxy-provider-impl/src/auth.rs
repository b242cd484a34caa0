//! Google service-account JWT exchange for Vertex AI credentials. The
//! `Provider::api_key` field for a `GeminiVertex` provider holds the service
//! account key JSON verbatim; this module turns that into a bearer token.

use std::time::{SystemTime, UNIX_EPOCH};

use gproxy_common::{ErrorKind, GproxyError};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use wreq::Client;

const TOKEN_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
}

pub fn parse_service_account(api_key_json: &str) -> Result<ServiceAccountKey, GproxyError> {
    serde_json::from_str(api_key_json)
        .map_err(|err| GproxyError::new(ErrorKind::InternalError, format!("invalid vertex service account json: {err}")))
}

#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    sub: String,
    aud: String,
    scope: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges a signed self-issued JWT for a short-lived OAuth access token.
pub async fn fetch_access_token(client: &Client, sa: &ServiceAccountKey) -> Result<String, GproxyError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| GproxyError::internal(err.to_string()))?
        .as_secs() as i64;
    let claims = JwtClaims {
        iss: sa.client_email.clone(),
        sub: sa.client_email.clone(),
        aud: DEFAULT_TOKEN_URI.to_string(),
        scope: TOKEN_SCOPE.to_string(),
        iat: now,
        exp: now + 3600,
    };
    let header = Header {
        alg: Algorithm::RS256,
        ..Header::default()
    };
    let key = EncodingKey::from_rsa_pem(sa.private_key.as_bytes())
        .map_err(|err| GproxyError::internal(format!("bad vertex private key: {err}")))?;
    let jwt = jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|err| GproxyError::internal(format!("jwt signing failed: {err}")))?;

    let response = client
        .post(DEFAULT_TOKEN_URI)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ])
        .send()
        .await
        .map_err(|err| GproxyError::new(ErrorKind::UpstreamNetworkError, err.to_string()))?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| GproxyError::new(ErrorKind::UpstreamNetworkError, err.to_string()))?;
    if !status.is_success() {
        return Err(GproxyError::new(
            ErrorKind::InternalError,
            format!("vertex token exchange failed: {}", String::from_utf8_lossy(&body)),
        ));
    }
    let token: TokenResponse = serde_json::from_slice(&body)
        .map_err(|err| GproxyError::internal(format!("malformed token response: {err}")))?;
    Ok(token.access_token)
}
