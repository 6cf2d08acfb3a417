use sqlx::PgPool;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::core::error::Error;
use crate::types::response;
use crate::types::user::User;
use crate::utils::auth::{Claims, TokenCodec, TokenKind};

/// Login and refresh workflows. Credential records live in the users table;
/// everything token-shaped is delegated to the [`TokenCodec`].
#[derive(Clone, Debug)]
pub(crate) struct AuthController {
    pool: PgPool,
    codec: TokenCodec,
}

impl AuthController {
    pub(crate) fn new(pool: PgPool, codec: TokenCodec) -> Self {
        Self { pool, codec }
    }

    pub(crate) fn refresh_lifetime_secs(&self) -> i64 {
        self.codec.refresh_lifetime_secs()
    }

    /// Verifies the presented password against the stored hash and issues an
    /// access/refresh token pair. An unknown email and a wrong password
    /// produce the same error so the response cannot be used to enumerate
    /// accounts.
    pub(crate) async fn login(&self, email: &str, password: &str) -> Result<response::Login, Error> {
        let user = match sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, nickname FROM users WHERE email = $1;",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        {
            Ok(user) => user,
            Err(sqlx::Error::RowNotFound) => return Err(Error::Unauthenticated),
            Err(e) => return Err(Error::Sql(e)),
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(Error::Unauthenticated);
        }

        let access_token = self.codec.issue_access(&user.email, user.id, &user.nickname)?;
        let refresh_token = self.codec.issue_refresh(&user.email, user.id)?;

        tracing::info!(user_id = user.id, "login succeeded");

        Ok(response::Login {
            access_token,
            refresh_token,
        })
    }

    /// Mints a new access token from a refresh token. The refresh token does
    /// not carry the nickname, so it is re-fetched here; a token for a user
    /// that no longer exists is rejected the same way as a bad credential.
    pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<response::Refresh, Error> {
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh)?;

        let nickname: String = match sqlx::query("SELECT nickname FROM users WHERE id = $1;")
            .bind(claims.user_id)
            .map(|row: PgRow| row.get("nickname"))
            .fetch_one(&self.pool)
            .await
        {
            Ok(nickname) => nickname,
            Err(sqlx::Error::RowNotFound) => return Err(Error::Unauthenticated),
            Err(e) => return Err(Error::Sql(e)),
        };

        let access_token = self
            .codec
            .issue_access(&claims.sub, claims.user_id, &nickname)?;

        Ok(response::Refresh { access_token })
    }

    pub(crate) fn verify_access(&self, token: &str) -> Result<Claims, Error> {
        self.codec.verify(token, TokenKind::Access)
    }
}
