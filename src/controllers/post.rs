use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::core::error::Error;
use crate::types::response;
use crate::utils::auth;
use crate::utils::upload::{ImageKind, ImageStore, UploadedImage};

#[derive(Clone, Debug)]
pub(crate) struct PostController {
    pool: PgPool,
    images: ImageStore,
}

impl PostController {
    pub(crate) fn new(pool: PgPool, images: ImageStore) -> Self {
        Self { pool, images }
    }

    pub(crate) async fn get_all(&self) -> Result<Vec<response::Post>, Error> {
        let posts = sqlx::query(
            "SELECT
                posts.id,
                posts.user_id,
                posts.title,
                posts.content,
                posts.image,
                posts.likes,
                posts.views,
                posts.created_at,
                COUNT(comments.id) AS comment_count
            FROM posts
            LEFT JOIN comments ON comments.post_id = posts.id
            GROUP BY posts.id
            ORDER BY posts.id DESC;",
        )
        .map(map_post)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub(crate) async fn get(&self, id: i64) -> Result<response::Post, Error> {
        match sqlx::query(
            "SELECT
                posts.id,
                posts.user_id,
                posts.title,
                posts.content,
                posts.image,
                posts.likes,
                posts.views,
                posts.created_at,
                COUNT(comments.id) AS comment_count
            FROM posts
            LEFT JOIN comments ON comments.post_id = posts.id
            WHERE posts.id = $1
            GROUP BY posts.id;",
        )
        .bind(id)
        .map(map_post)
        .fetch_one(&self.pool)
        .await
        {
            Ok(post) => Ok(post),
            Err(sqlx::Error::RowNotFound) => Err(Error::PostNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    /// The owner is the verified identity of the request, never anything the
    /// request body claims.
    pub(crate) async fn create(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        image: Option<UploadedImage>,
    ) -> Result<response::Post, Error> {
        let image_name = match image {
            Some(image) => Some(
                self.images
                    .store(ImageKind::Post, &image.file_name, &image.bytes)
                    .await?,
            ),
            None => None,
        };

        let post = sqlx::query(
            "INSERT INTO posts (user_id, title, content, image) VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, content, image, likes, views, created_at, 0::bigint AS comment_count;",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(&image_name)
        .map(map_post)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Replaces title, content, and image. Sending no image removes any
    /// stored one; sending one overwrites the stored file in place when it
    /// exists.
    pub(crate) async fn update(
        &self,
        id: i64,
        acting_user_id: i64,
        title: &str,
        content: &str,
        image: Option<UploadedImage>,
    ) -> Result<response::Post, Error> {
        let current = self.get(id).await?;

        auth::authorize(acting_user_id, current.user_id)?;

        let image_name = match (image, current.image) {
            (Some(image), Some(existing)) => {
                self.images
                    .overwrite(ImageKind::Post, &existing, &image.bytes)
                    .await?;
                Some(existing)
            }
            (Some(image), None) => Some(
                self.images
                    .store(ImageKind::Post, &image.file_name, &image.bytes)
                    .await?,
            ),
            (None, Some(existing)) => {
                self.images.remove(ImageKind::Post, &existing).await?;
                None
            }
            (None, None) => None,
        };

        let post = sqlx::query(
            "UPDATE posts SET title = $1, content = $2, image = $3 WHERE id = $4
            RETURNING id, user_id, title, content, image, likes, views, created_at,
                (SELECT COUNT(*) FROM comments WHERE post_id = $4) AS comment_count;",
        )
        .bind(title)
        .bind(content)
        .bind(&image_name)
        .bind(id)
        .map(map_post)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Removes the post and its comments as one transaction; a failed
    /// ownership check leaves both untouched. The image file goes last, after
    /// the transaction commits.
    pub(crate) async fn delete(&self, id: i64, acting_user_id: i64) -> Result<(), Error> {
        let current = self.get(id).await?;

        auth::authorize(acting_user_id, current.user_id)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1;")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = $1;")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Some(image) = current.image {
            self.images.remove(ImageKind::Post, &image).await?;
        }

        Ok(())
    }

    pub(crate) async fn increment_views(&self, id: i64) -> Result<i32, Error> {
        match sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views;")
            .bind(id)
            .map(|row: PgRow| row.get("views"))
            .fetch_one(&self.pool)
            .await
        {
            Ok(views) => Ok(views),
            Err(sqlx::Error::RowNotFound) => Err(Error::PostNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    pub(crate) async fn load_image(&self, id: i64) -> Result<(Vec<u8>, &'static str), Error> {
        let image = self.get(id).await?.image.ok_or(Error::ImageNotFound)?;

        self.images.load(ImageKind::Post, &image).await
    }
}

fn map_post(row: PgRow) -> response::Post {
    response::Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image"),
        likes: row.get("likes"),
        views: row.get("views"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
    }
}
