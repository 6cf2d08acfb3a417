use std::path::PathBuf;

use tokio::fs;
use uuid::Uuid;

use crate::core::error::{ConfigError, Error};

#[derive(Clone, Copy, Debug)]
pub(crate) enum ImageKind {
    User,
    Post,
}

impl ImageKind {
    fn dir(self) -> &'static str {
        match self {
            ImageKind::User => "user",
            ImageKind::Post => "post",
        }
    }
}

/// An image as it arrived in a multipart request.
#[derive(Clone, Debug)]
pub(crate) struct UploadedImage {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
}

/// Local-filesystem store for uploaded images, partitioned by resource type.
/// File names are generated here and recorded on the owning row; the
/// original client-supplied name only contributes its extension.
#[derive(Clone, Debug)]
pub(crate) struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub(crate) async fn new(root: &str) -> Result<Self, ConfigError> {
        let root = PathBuf::from(root);

        fs::create_dir_all(root.join(ImageKind::User.dir())).await?;
        fs::create_dir_all(root.join(ImageKind::Post.dir())).await?;

        Ok(Self { root })
    }

    /// Stores a new image and returns its generated file name.
    pub(crate) async fn store(
        &self,
        kind: ImageKind,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let file_name = match extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        self.overwrite(kind, &file_name, bytes).await?;

        Ok(file_name)
    }

    /// Replaces the content of an existing image in place.
    pub(crate) async fn overwrite(
        &self,
        kind: ImageKind,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), Error> {
        fs::write(self.path(kind, file_name), bytes).await?;

        Ok(())
    }

    pub(crate) async fn load(
        &self,
        kind: ImageKind,
        file_name: &str,
    ) -> Result<(Vec<u8>, &'static str), Error> {
        match fs::read(self.path(kind, file_name)).await {
            Ok(bytes) => Ok((bytes, content_type(file_name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ImageNotFound),
            Err(e) => Err(Error::IO(e)),
        }
    }

    pub(crate) async fn remove(&self, kind: ImageKind, file_name: &str) -> Result<(), Error> {
        match fs::remove_file(self.path(kind, file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IO(e)),
        }
    }

    fn path(&self, kind: ImageKind, file_name: &str) -> PathBuf {
        self.root.join(kind.dir()).join(file_name)
    }
}

fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn content_type(name: &str) -> &'static str {
    match extension(name).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("photo.PNG"), Some("PNG"));
        assert_eq!(extension("archive.tar.gz"), Some("gz"));
        assert_eq!(extension("no-extension"), None);
        assert_eq!(extension("trailing-dot."), None);
        assert_eq!(extension("weird.e/xt"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.png"), "image/png");
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("a.bin"), "application/octet-stream");
        assert_eq!(content_type("a"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_store_load_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("forumcore-test-{}", Uuid::new_v4()));
        let store = ImageStore::new(root.to_str().unwrap()).await.unwrap();

        let name = store
            .store(ImageKind::Post, "cat.png", b"not actually a png")
            .await
            .unwrap();
        assert!(name.ends_with(".png"));

        let (bytes, content_type) = store.load(ImageKind::Post, &name).await.unwrap();
        assert_eq!(bytes, b"not actually a png");
        assert_eq!(content_type, "image/png");

        store.remove(ImageKind::Post, &name).await.unwrap();
        assert!(matches!(
            store.load(ImageKind::Post, &name).await,
            Err(Error::ImageNotFound)
        ));

        // removing twice is fine
        store.remove(ImageKind::Post, &name).await.unwrap();

        fs::remove_dir_all(root).await.unwrap();
    }
}
