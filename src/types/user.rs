/// Full user record as stored, including the credential hash. Only the
/// authenticator and the user controller ever see this; responses use
/// `types::response::User`.
#[derive(Clone, Debug, sqlx::FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) nickname: String,
}
