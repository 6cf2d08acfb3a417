use axum::extract::State;
use axum::{body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Access,
    Refresh,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    #[serde(rename = "userId")]
    pub(crate) user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) nickname: Option<String>,
    pub(crate) kind: TokenKind,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

/// Authenticated principal for the remainder of a request. Built from token
/// claims only, never from storage.
#[derive(Clone, Debug)]
pub(crate) struct Identity {
    pub(crate) user_id: i64,
    pub(crate) email: String,
    pub(crate) nickname: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.sub,
            nickname: claims.nickname.unwrap_or_default(),
        }
    }
}

/// Signs and verifies bearer tokens with a symmetric key. Keys and lifetimes
/// come from configuration; nothing here is process-global.
#[derive(Clone)]
pub(crate) struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

impl TokenCodec {
    pub(crate) fn new(secret: &str, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        let mut validation = Validation::default();
        // tokens expire exactly at `exp`, no grace window
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime: Duration::seconds(access_lifetime_secs),
            refresh_lifetime: Duration::seconds(refresh_lifetime_secs),
            validation,
        }
    }

    pub(crate) fn refresh_lifetime_secs(&self) -> i64 {
        self.refresh_lifetime.num_seconds()
    }

    pub(crate) fn issue_access(
        &self,
        email: &str,
        user_id: i64,
        nickname: &str,
    ) -> Result<String, Error> {
        self.issue(
            email,
            user_id,
            Some(nickname.to_string()),
            TokenKind::Access,
            self.access_lifetime,
        )
    }

    pub(crate) fn issue_refresh(&self, email: &str, user_id: i64) -> Result<String, Error> {
        self.issue(
            email,
            user_id,
            None,
            TokenKind::Refresh,
            self.refresh_lifetime,
        )
    }

    fn issue(
        &self,
        email: &str,
        user_id: i64,
        nickname: Option<String>,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<String, Error> {
        let now = Utc::now();

        let claims = Claims {
            sub: email.to_string(),
            user_id,
            nickname,
            kind,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verifies signature and expiry, then checks the token kind. The
    /// rejection modes stay distinct: `MalformedToken` for garbage,
    /// `InvalidToken` for a bad signature, and `ExpiredToken` for a
    /// well-signed token past its expiry, which is the only one a client can
    /// recover from by refreshing.
    pub(crate) fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, Error> {
        let token_data =
            match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
                Ok(token_data) => token_data,
                Err(e) => {
                    return Err(match e.kind() {
                        jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::ExpiredToken,
                        jsonwebtoken::errors::ErrorKind::InvalidSignature => Error::InvalidToken,
                        jsonwebtoken::errors::ErrorKind::InvalidToken
                        | jsonwebtoken::errors::ErrorKind::Base64(_)
                        | jsonwebtoken::errors::ErrorKind::Json(_)
                        | jsonwebtoken::errors::ErrorKind::Utf8(_) => Error::MalformedToken,
                        _ => Error::InvalidToken,
                    });
                }
            };

        if token_data.claims.kind != kind {
            return Err(Error::WrongTokenKind);
        }

        Ok(token_data.claims)
    }
}

/// Runs once per request ahead of protected handlers. Pulls the bearer token
/// out of the `Authorization` header, verifies it as an access token, and
/// attaches the resulting [`Identity`] to the request extensions. Rejected
/// requests never reach the downstream handler.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or(Error::NoCredentials)?;

    let token = auth_header
        .to_str()?
        .strip_prefix("Bearer ")
        .ok_or(Error::NoCredentials)?;

    let claims = state.auth.verify_access(token)?;

    request.extensions_mut().insert(Identity::from(claims));

    Ok(next.run(request).await)
}

/// Single ownership check used by every mutating path. A mutation proceeds
/// only when the acting identity is the recorded owner of the resource.
pub(crate) fn authorize(acting_user_id: i64, owner_id: i64) -> Result<(), Error> {
    if acting_user_id == owner_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", 3600, 86400)
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();

        let token = codec.issue_access("upc@example.com", 42, "upc").unwrap();
        let claims = codec.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, "upc@example.com");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.nickname.as_deref(), Some("upc"));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_claim_wire_names() {
        let claims = Claims {
            sub: "upc@example.com".to_string(),
            user_id: 7,
            nickname: Some("upc".to_string()),
            kind: TokenKind::Access,
            iat: 0,
            exp: 1,
        };

        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["sub"], "upc@example.com");
        assert_eq!(value["userId"], 7);
        assert_eq!(value["nickname"], "upc");
        assert_eq!(value["kind"], "access");
    }

    #[test]
    fn test_refresh_claims_omit_nickname_key() {
        let claims = Claims {
            sub: "upc@example.com".to_string(),
            user_id: 7,
            nickname: None,
            kind: TokenKind::Refresh,
            iat: 0,
            exp: 1,
        };

        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["kind"], "refresh");
        assert!(value.get("nickname").is_none());
    }

    #[test]
    fn test_user_id_survives_beyond_f64_precision() {
        let codec = codec();
        // would be corrupted by a float round trip
        let id = (1_i64 << 53) + 1;

        let token = codec.issue_access("upc@example.com", id, "upc").unwrap();
        let claims = codec.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.user_id, id);
    }

    #[test]
    fn test_refresh_token_carries_no_nickname() {
        let codec = codec();

        let token = codec.issue_refresh("upc@example.com", 42).unwrap();
        let claims = codec.verify(&token, TokenKind::Refresh).unwrap();

        assert_eq!(claims.nickname, None);
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_expired_token_is_distinguishable() {
        let codec = TokenCodec::new("test-secret", -10, -10);

        let token = codec.issue_access("upc@example.com", 42, "upc").unwrap();

        assert!(matches!(
            codec.verify(&token, TokenKind::Access),
            Err(Error::ExpiredToken)
        ));
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let codec = codec();

        let token = codec.issue_access("upc@example.com", 42, "upc").unwrap();
        let (rest, signature) = token.rsplit_once('.').unwrap();

        let mut bytes = signature.as_bytes().to_vec();
        bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{}.{}", rest, String::from_utf8(bytes).unwrap());

        assert!(matches!(
            codec.verify(&tampered, TokenKind::Access),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();

        assert!(matches!(
            codec.verify("not a token", TokenKind::Access),
            Err(Error::MalformedToken)
        ));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let codec = codec();
        let other = TokenCodec::new("other-secret", 3600, 86400);

        let token = other.issue_access("upc@example.com", 42, "upc").unwrap();

        assert!(matches!(
            codec.verify(&token, TokenKind::Access),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let codec = codec();

        let token = codec.issue_refresh("upc@example.com", 42).unwrap();

        assert!(matches!(
            codec.verify(&token, TokenKind::Access),
            Err(Error::WrongTokenKind)
        ));
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let codec = codec();

        let token = codec.issue_access("upc@example.com", 42, "upc").unwrap();

        assert!(matches!(
            codec.verify(&token, TokenKind::Refresh),
            Err(Error::WrongTokenKind)
        ));
    }

    #[test]
    fn test_authorize_owner() {
        assert!(authorize(42, 42).is_ok());
        assert!(authorize(0, 0).is_ok());
        assert!(authorize(-5, -5).is_ok());
    }

    #[test]
    fn test_authorize_non_owner() {
        assert!(matches!(authorize(42, 43), Err(Error::Forbidden)));
        assert!(matches!(authorize(0, 1), Err(Error::Forbidden)));
        assert!(matches!(authorize(-5, 5), Err(Error::Forbidden)));
    }
}
