//! Client-side gallery state.
//!
//! Holds what a user is looking at: the image list, one pending notice, and
//! the image whose comments are open. State only changes from the server's
//! answer; nothing is applied optimistically.

use super::{
    api::{ApiClientError, ImageApi},
    validation::{UploadRejected, validate_upload},
};
use crate::{
    media::{MediaError, MediaHost, UploadFile},
    models::{
        comment::Comment,
        image::{ImageRecord, NewComment, NewImage},
    },
};
use std::path::Path;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStatus {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub status: NoticeStatus,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: NoticeStatus::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: NoticeStatus::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct GalleryView {
    images: Vec<ImageRecord>,
    notice: Option<Notice>,
    inspected: Option<String>,
}

impl GalleryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Replace the list with the server's. On failure the list is kept.
    pub async fn load<A: ImageApi>(&mut self, api: &A) {
        match api.list_images().await {
            Ok(accepted) => self.images = accepted.data,
            Err(err) => {
                error!("fetching images failed: {}", err);
                self.notice = Some(Notice::error(err.to_string()));
            }
        }
    }

    /// Validate, push the bytes to the media host, then record the URL.
    ///
    /// A file that fails validation never reaches `media` or `api`. On success
    /// the new record is appended locally instead of refetching the list.
    pub async fn upload<A: ImageApi, M: MediaHost>(
        &mut self,
        api: &A,
        media: &M,
        file: Option<&UploadFile>,
    ) {
        let file = match file.ok_or(UploadRejected::NoFile).and_then(|f| {
            validate_upload(&f.file_name, f.size())?;
            Ok(f)
        }) {
            Ok(file) => file,
            Err(rejected) => {
                warn!("upload rejected: {:?}", rejected);
                self.notice = Some(Notice::error(rejected.to_string()));
                return;
            }
        };

        match self.upload_validated(api, media, file).await {
            Ok((message, record)) => {
                self.images.push(record);
                self.notice = Some(Notice::success(message));
            }
            Err(err) => {
                error!("upload failed: {}", err);
                self.notice = Some(Notice::error(err.to_string()));
            }
        }
    }

    /// Upload a file from disk. Name and size are checked from the path and its
    /// metadata, so a rejected file is never read.
    pub async fn upload_path<A: ImageApi, M: MediaHost>(
        &mut self,
        api: &A,
        media: &M,
        path: &Path,
    ) {
        let file = match read_checked(path).await {
            Ok(file) => file,
            Err(UploadError::Rejected(rejected)) => {
                warn!("upload rejected: {:?}", rejected);
                self.notice = Some(Notice::error(rejected.to_string()));
                return;
            }
            Err(err) => {
                error!("upload failed: {}", err);
                self.notice = Some(Notice::error(err.to_string()));
                return;
            }
        };
        self.upload(api, media, Some(&file)).await;
    }

    async fn upload_validated<A: ImageApi, M: MediaHost>(
        &self,
        api: &A,
        media: &M,
        file: &UploadFile,
    ) -> Result<(String, ImageRecord), UploadError> {
        let image_url = media.upload(file).await?;
        let accepted = api
            .create_image(NewImage {
                image_url,
                image_id: None,
            })
            .await?;
        Ok((accepted.message, accepted.data))
    }

    /// Append a comment to `image_id`. Blank text is ignored without a request.
    pub async fn add_comment<A: ImageApi>(&mut self, api: &A, image_id: &str, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        let request = NewComment {
            image_id: image_id.to_string(),
            comment: text.to_string(),
        };
        match api.append_comment(request).await {
            Ok(accepted) => {
                if let Some(image) = self.images.iter_mut().find(|i| i.image_id == image_id) {
                    image.comments.push(accepted.data);
                }
            }
            Err(err) => {
                error!("adding comment failed: {}", err);
                self.notice = Some(Notice::error(err.to_string()));
            }
        }
    }

    /// Open the comment panel for an image. Returns false if it is not listed.
    pub fn inspect(&mut self, image_id: &str) -> bool {
        let known = self.images.iter().any(|i| i.image_id == image_id);
        if known {
            self.inspected = Some(image_id.to_string());
        }
        known
    }

    pub fn close_inspector(&mut self) {
        self.inspected = None;
    }

    pub fn inspected(&self) -> Option<&ImageRecord> {
        let id = self.inspected.as_deref()?;
        self.images.iter().find(|i| i.image_id == id)
    }

    /// Comments of the inspected image, newest first.
    pub fn inspected_comments(&self) -> Vec<&Comment> {
        let mut comments: Vec<&Comment> = self
            .inspected()
            .map(|image| image.comments.iter().collect())
            .unwrap_or_default();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }
}

async fn read_checked(path: &Path) -> Result<UploadFile, UploadError> {
    let file_name = UploadFile::name_of(path);
    validate_upload(&file_name, 0)?;
    validate_upload(&file_name, UploadFile::size_of(path).await?)?;
    Ok(UploadFile::read(path).await?)
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejected),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
}
