use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) database_host: String,
    pub(crate) database_port: u16,
    pub(crate) database_name: String,
    pub(crate) database_user: String,
    pub(crate) database_password: String,
    pub(crate) log_level: String,
    pub(crate) port: u16,
    pub(crate) secret: String,
    /// access token lifetime in seconds
    pub(crate) access_token_lifetime: i64,
    /// refresh token lifetime in seconds
    pub(crate) refresh_token_lifetime: i64,
    pub(crate) upload_dir: String,
}
