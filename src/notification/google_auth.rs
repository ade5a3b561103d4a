//! Service-account authentication for the Google Chat API.
//!
//! The bot credential is a service-account key (JSON). It is exchanged for a
//! short-lived OAuth access token using the JWT bearer grant, and the token
//! is cached until shortly before it expires.

use super::transport::HttpTransport;
use super::NotifyError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const CHAT_BOT_SCOPE: &str = "https://www.googleapis.com/auth/chat.bot";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Mints and caches access tokens from a service-account key.
pub struct ServiceAccountAuth {
    credentials: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(credentials: impl Into<String>) -> Self {
        Self {
            credentials: credentials.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, minting a new one when needed.
    pub async fn access_token(&self, transport: &HttpTransport) -> Result<String, NotifyError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let key: ServiceAccountKey = serde_json::from_str(&self.credentials)
            .map_err(|e| NotifyError::Auth(format!("invalid service account JSON: {}", e)))?;
        let token_url = key.token_uri.as_deref().unwrap_or(TOKEN_URL);
        let assertion = sign_assertion(&key, token_url, Utc::now().timestamp())?;

        debug!(client_email = %key.client_email, "Requesting Google access token");
        let body = transport
            .post_form(
                token_url,
                &[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)],
            )
            .await?;
        let response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| NotifyError::Auth(format!("unexpected token response: {}", e)))?;

        let expires_in = response.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        });
        Ok(response.access_token)
    }
}

fn sign_assertion(key: &ServiceAccountKey, audience: &str, now: i64) -> Result<String, NotifyError> {
    let claims = JwtClaims {
        iss: &key.client_email,
        scope: CHAT_BOT_SCOPE,
        aud: audience,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| NotifyError::Auth(format!("invalid RSA private key: {}", e)))?;
    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| NotifyError::Auth(format!("JWT encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");

    fn credentials(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "client_email": "deploybot@example.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
            "token_uri": token_uri,
        })
        .to_string()
    }

    #[test]
    fn test_assertion_carries_chat_bot_scope() {
        let key: ServiceAccountKey =
            serde_json::from_str(&credentials("https://oauth2.example/token")).unwrap();
        let jwt = sign_assertion(&key, "https://oauth2.example/token", 1_700_000_000).unwrap();

        assert_eq!(jwt.split('.').count(), 3);
        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_audience(&["https://oauth2.example/token"]);
        let decoded = jsonwebtoken::decode::<serde_json::Value>(
            &jwt,
            &jsonwebtoken::DecodingKey::from_secret(b""),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims["scope"], CHAT_BOT_SCOPE);
        assert_eq!(decoded.claims["iss"], "deploybot@example.iam.gserviceaccount.com");
        assert_eq!(decoded.claims["exp"], 1_700_000_000 + TOKEN_LIFETIME_SECS);
    }

    #[tokio::test]
    async fn test_token_is_minted_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "ya29.minted", "expires_in": 3599 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(credentials(&format!("{}/token", server.uri())));
        let transport = HttpTransport::new().unwrap();

        assert_eq!(auth.access_token(&transport).await.unwrap(), "ya29.minted");
        assert_eq!(auth.access_token(&transport).await.unwrap(), "ya29.minted");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "ya29.short", "expires_in": 30 })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(credentials(&format!("{}/token", server.uri())));
        let transport = HttpTransport::new().unwrap();

        // A token inside the expiry margin is never reused.
        auth.access_token(&transport).await.unwrap();
        auth.access_token(&transport).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_an_auth_error() {
        let auth = ServiceAccountAuth::new("xoxb-not-json");
        let transport = HttpTransport::new().unwrap();

        let err = auth.access_token(&transport).await.unwrap_err();
        assert!(matches!(err, NotifyError::Auth(_)));
    }

    #[tokio::test]
    async fn test_rejected_token_request_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(credentials(&format!("{}/token", server.uri())));
        let transport = HttpTransport::new().unwrap();

        let err = auth.access_token(&transport).await.unwrap_err();
        assert!(matches!(err, NotifyError::Status(s) if s.as_u16() == 400));
    }
}
