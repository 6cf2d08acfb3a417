use regex::Regex;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::core::error::{self, Error};
use crate::types::response;
use crate::utils::auth;
use crate::utils::upload::{ImageKind, ImageStore, UploadedImage};

#[derive(Clone, Debug)]
pub(crate) struct UserController {
    pool: PgPool,
    images: ImageStore,
    email_pattern: Regex,
    nickname_pattern: Regex,
}

impl UserController {
    pub(crate) fn new(pool: PgPool, images: ImageStore) -> Result<Self, error::ConfigError> {
        Ok(Self {
            pool,
            images,
            email_pattern: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
            nickname_pattern: Regex::new(r"^[a-zA-Z0-9_-]{2,20}$")?,
        })
    }

    pub(crate) async fn register(
        &self,
        email: &str,
        password: &str,
        nickname: &str,
        image: Option<UploadedImage>,
    ) -> Result<response::User, Error> {
        if !self.email_pattern.is_match(email) {
            return Err(Error::InvalidEmail);
        }

        if !self.nickname_pattern.is_match(nickname) {
            return Err(Error::InvalidNickname);
        }

        if password.len() < 8 {
            return Err(Error::InvalidPassword(
                "Password must be at least 8 characters".to_owned(),
            ));
        }

        let password_hash = bcrypt::hash(password, 12)?;

        let image_name = match image {
            Some(image) => Some(
                self.images
                    .store(ImageKind::User, &image.file_name, &image.bytes)
                    .await?,
            ),
            None => None,
        };

        let id: i64 = match sqlx::query(
            "INSERT INTO users (email, password_hash, nickname, image) VALUES ($1, $2, $3, $4) RETURNING id;",
        )
        .bind(email)
        .bind(&password_hash)
        .bind(nickname)
        .bind(&image_name)
        .map(|row: PgRow| row.get("id"))
        .fetch_one(&self.pool)
        .await
        {
            Ok(id) => id,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::UserAlreadyExists);
            }
            Err(e) => return Err(Error::Sql(e)),
        };

        Ok(response::User {
            id,
            email: email.into(),
            nickname: nickname.into(),
            image: image_name,
        })
    }

    pub(crate) async fn get_all(&self) -> Result<Vec<response::User>, Error> {
        let users = sqlx::query("SELECT id, email, nickname, image FROM users ORDER BY id;")
            .map(map_user)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub(crate) async fn get(&self, id: i64) -> Result<response::User, Error> {
        match sqlx::query("SELECT id, email, nickname, image FROM users WHERE id = $1;")
            .bind(id)
            .map(map_user)
            .fetch_one(&self.pool)
            .await
        {
            Ok(user) => Ok(user),
            Err(sqlx::Error::RowNotFound) => Err(Error::UserNotFound),
            Err(e) => Err(Error::Sql(e)),
        }
    }

    pub(crate) async fn email_taken(&self, email: &str) -> Result<bool, Error> {
        let taken = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1) AS taken;")
            .bind(email)
            .map(|row: PgRow| row.get("taken"))
            .fetch_one(&self.pool)
            .await?;

        Ok(taken)
    }

    pub(crate) async fn nickname_taken(&self, nickname: &str) -> Result<bool, Error> {
        let taken =
            sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE nickname = $1) AS taken;")
                .bind(nickname)
                .map(|row: PgRow| row.get("taken"))
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }

    pub(crate) async fn update_password(
        &self,
        id: i64,
        acting_user_id: i64,
        new_password: &str,
    ) -> Result<(), Error> {
        auth::authorize(acting_user_id, id)?;

        if new_password.len() < 8 {
            return Err(Error::InvalidPassword(
                "Password must be at least 8 characters".to_owned(),
            ));
        }

        let password_hash = bcrypt::hash(new_password, 12)?;

        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2;")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound);
        }

        Ok(())
    }

    /// Updates nickname and/or profile image. An existing image is
    /// overwritten in place under its recorded name.
    pub(crate) async fn update_profile(
        &self,
        id: i64,
        acting_user_id: i64,
        nickname: Option<&str>,
        image: Option<UploadedImage>,
    ) -> Result<(), Error> {
        auth::authorize(acting_user_id, id)?;

        let current = self.get(id).await?;

        if let Some(nickname) = nickname {
            if !self.nickname_pattern.is_match(nickname) {
                return Err(Error::InvalidNickname);
            }

            match sqlx::query("UPDATE users SET nickname = $1 WHERE id = $2;")
                .bind(nickname)
                .bind(id)
                .execute(&self.pool)
                .await
            {
                Ok(_) => (),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    return Err(Error::UserAlreadyExists);
                }
                Err(e) => return Err(Error::Sql(e)),
            }
        }

        if let Some(image) = image {
            match current.image {
                Some(existing) => {
                    self.images
                        .overwrite(ImageKind::User, &existing, &image.bytes)
                        .await?;
                }
                None => {
                    let image_name = self
                        .images
                        .store(ImageKind::User, &image.file_name, &image.bytes)
                        .await?;

                    sqlx::query("UPDATE users SET image = $1 WHERE id = $2;")
                        .bind(&image_name)
                        .bind(id)
                        .execute(&self.pool)
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Removes the user together with their comments, the comments left by
    /// others on their posts, and their posts, as a single transaction.
    /// Stored images are removed only after the transaction commits.
    pub(crate) async fn delete(&self, id: i64, acting_user_id: i64) -> Result<(), Error> {
        auth::authorize(acting_user_id, id)?;

        let user = self.get(id).await?;

        let mut tx = self.pool.begin().await?;

        let post_images: Vec<String> = sqlx::query(
            "SELECT image FROM posts WHERE user_id = $1 AND image IS NOT NULL;",
        )
        .bind(id)
        .map(|row: PgRow| row.get("image"))
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM comments WHERE user_id = $1 OR post_id IN (SELECT id FROM posts WHERE user_id = $1);",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE user_id = $1;")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1;")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for image in post_images {
            self.images.remove(ImageKind::Post, &image).await?;
        }

        if let Some(image) = user.image {
            self.images.remove(ImageKind::User, &image).await?;
        }

        Ok(())
    }

    pub(crate) async fn load_image(&self, id: i64) -> Result<(Vec<u8>, &'static str), Error> {
        let image = self.get(id).await?.image.ok_or(Error::ImageNotFound)?;

        self.images.load(ImageKind::User, &image).await
    }
}

fn map_user(row: PgRow) -> response::User {
    response::User {
        id: row.get("id"),
        email: row.get("email"),
        nickname: row.get("nickname"),
        image: row.get("image"),
    }
}
