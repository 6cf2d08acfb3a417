use axum::BoxError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database migration error: {0}")]
    DatabaseMigration(#[from] sqlx::migrate::MigrateError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Header decode error: {0}")]
    HeaderDecode(#[from] axum::http::header::ToStrError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    // token rejection modes are deliberately distinct internal codes; the
    // client sees a uniform 401 for all of them
    #[error("Malformed token")]
    MalformedToken,
    #[error("Invalid token signature")]
    InvalidToken,
    #[error("Expired token")]
    ExpiredToken,
    #[error("Wrong token kind")]
    WrongTokenKind,
    #[error("No credentials provided")]
    NoCredentials,
    #[error("Invalid email or password")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Invalid nickname")]
    InvalidNickname,
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Post not found")]
    PostNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Image not found")]
    ImageNotFound,
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let (status, message) = match self {
            Error::Sql(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SQL error"),
            Error::Bcrypt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Bcrypt error"),
            Error::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JWT error"),
            Error::HeaderDecode(_) => (StatusCode::BAD_REQUEST, "Invalid header value"),
            Error::Multipart(_) => (StatusCode::BAD_REQUEST, "Invalid multipart body"),
            Error::IO(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error"),
            Error::Serialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error"),
            Error::MalformedToken
            | Error::InvalidToken
            | Error::ExpiredToken
            | Error::WrongTokenKind => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Error::NoCredentials => (StatusCode::UNAUTHORIZED, "No credentials provided"),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            Error::UserAlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            Error::MissingField(_) => (StatusCode::BAD_REQUEST, "Missing field"),
            Error::InvalidEmail => (StatusCode::BAD_REQUEST, "Invalid email"),
            Error::InvalidNickname => (StatusCode::BAD_REQUEST, "Invalid nickname"),
            Error::InvalidPassword(_) => (StatusCode::BAD_REQUEST, "Invalid password"),
            Error::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            Error::PostNotFound => (StatusCode::NOT_FOUND, "Post not found"),
            Error::CommentNotFound => (StatusCode::NOT_FOUND, "Comment not found"),
            Error::ImageNotFound => (StatusCode::NOT_FOUND, "Image not found"),
            Error::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, message).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> (StatusCode, &'static str) {
    tracing::error!("Unhandled error: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
