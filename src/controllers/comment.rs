use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::core::error::Error;
use crate::types::response;
use crate::utils::auth;

#[derive(Clone, Debug)]
pub(crate) struct CommentController {
    pool: PgPool,
}

impl CommentController {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn get_by_post(&self, post_id: i64) -> Result<Vec<response::Comment>, Error> {
        let comments = sqlx::query(
            "SELECT id, post_id, user_id, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY id;",
        )
        .bind(post_id)
        .map(map_comment)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub(crate) async fn create(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<response::Comment, Error> {
        match sqlx::query(
            "INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, $3)
            RETURNING id, post_id, user_id, content, created_at;",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .map(map_comment)
        .fetch_one(&self.pool)
        .await
        {
            Ok(comment) => Ok(comment),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(Error::PostNotFound)
            }
            Err(e) => Err(Error::Sql(e)),
        }
    }

    pub(crate) async fn update(
        &self,
        id: i64,
        acting_user_id: i64,
        content: &str,
    ) -> Result<response::Comment, Error> {
        let owner_id = self.owner(id).await?;

        auth::authorize(acting_user_id, owner_id)?;

        let comment = sqlx::query(
            "UPDATE comments SET content = $1, created_at = now() WHERE id = $2
            RETURNING id, post_id, user_id, content, created_at;",
        )
        .bind(content)
        .bind(id)
        .map(map_comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    pub(crate) async fn delete(&self, id: i64, acting_user_id: i64) -> Result<(), Error> {
        let owner_id = self.owner(id).await?;

        auth::authorize(acting_user_id, owner_id)?;

        sqlx::query("DELETE FROM comments WHERE id = $1;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn owner(&self, id: i64) -> Result<i64, Error> {
        match sqlx::query("SELECT user_id FROM comments WHERE id = $1;")
            .bind(id)
            .map(|row: PgRow| row.get("user_id"))
            .fetch_one(&self.pool)
            .await
        {
            Ok(user_id) => Ok(user_id),
            Err(sqlx::Error::RowNotFound) => Err(Error::CommentNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }
}

fn map_comment(row: PgRow) -> response::Comment {
    response::Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}
