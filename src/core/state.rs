use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::controllers::auth::AuthController;
use crate::controllers::comment::CommentController;
use crate::controllers::post::PostController;
use crate::controllers::user::UserController;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::utils::auth::TokenCodec;
use crate::utils::upload::ImageStore;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) pool: PgPool,
    pub(crate) auth: AuthController,
    pub(crate) users: UserController,
    pub(crate) posts: PostController,
    pub(crate) comments: CommentController,
}

impl AppState {
    pub(crate) async fn new(database_url: &str, config: &Args) -> Result<Self, ConfigError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let codec = TokenCodec::new(
            &config.secret,
            config.access_token_lifetime,
            config.refresh_token_lifetime,
        );

        let images = ImageStore::new(&config.upload_dir).await?;

        Ok(AppState {
            pool: pool.clone(),
            auth: AuthController::new(pool.clone(), codec),
            users: UserController::new(pool.clone(), images.clone())?,
            posts: PostController::new(pool.clone(), images.clone()),
            comments: CommentController::new(pool),
        })
    }
}
