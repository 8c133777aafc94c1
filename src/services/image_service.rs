//! src/services/image_service.rs
//!
//! ImageService: the three gallery operations (create, list, append comment)
//! over the cached SQLite handle from the persistence gateway. Every write is
//! a single statement, so SQLite's per-statement atomicity is all the
//! coordination these operations need.

use crate::{
    db::gateway::{DatabaseHandle, Gateway, GatewayError},
    models::{
        comment::{Comment, CommentRow},
        image::{ImageRecord, ImageRow, NewComment, NewImage},
    },
};
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("image `{0}` not found")]
    ImageNotFound(String),
    #[error("image `{0}` already exists")]
    DuplicateImageId(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type GalleryResult<T> = Result<T, GalleryError>;

#[derive(Clone)]
pub struct ImageService {
    /// Shared gateway; the same instance backs every request.
    pub gateway: Arc<Gateway>,
}

impl ImageService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    async fn handle(&self) -> GalleryResult<&DatabaseHandle> {
        Ok(self.gateway.connect().await?)
    }

    /// Insert a new image record with no comments.
    ///
    /// A missing `image_id` gets a fresh UUID. A duplicate id is rejected by
    /// the table's UNIQUE constraint and reported as `DuplicateImageId`.
    pub async fn create_image(&self, new: NewImage) -> GalleryResult<ImageRecord> {
        let db = self.handle().await?;
        let image_id = new
            .image_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = Utc::now();

        match sqlx::query("INSERT INTO images (image_id, image_url, created_at) VALUES (?, ?, ?)")
            .bind(&image_id)
            .bind(&new.image_url)
            .bind(created_at)
            .execute(&db.pool)
            .await
        {
            Ok(_) => {
                debug!(image_id = %image_id, "image record created");
                Ok(ImageRecord {
                    image_id,
                    image_url: new.image_url,
                    comments: Vec::new(),
                    created_at,
                })
            }
            Err(err) if is_unique_violation(&err) => Err(GalleryError::DuplicateImageId(image_id)),
            Err(err) => Err(GalleryError::Sqlx(err)),
        }
    }

    /// Every image with its comments, in insertion order. No paging.
    pub async fn list_images(&self) -> GalleryResult<Vec<ImageRecord>> {
        let db = self.handle().await?;

        let images = sqlx::query_as::<_, ImageRow>(
            "SELECT image_id, image_url, created_at FROM images ORDER BY seq ASC",
        )
        .fetch_all(&db.pool)
        .await?;

        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT comment_id, image_id, comment, created_at FROM comments ORDER BY seq ASC",
        )
        .fetch_all(&db.pool)
        .await?;

        let mut comments: HashMap<String, Vec<Comment>> = HashMap::new();
        for row in rows {
            comments
                .entry(row.image_id.clone())
                .or_default()
                .push(row.into());
        }

        let records = images
            .into_iter()
            .map(|row| {
                let own = comments.remove(&row.image_id).unwrap_or_default();
                ImageRecord::from_row(row, own)
            })
            .collect::<Vec<_>>();

        debug!("listed {} images", records.len());
        Ok(records)
    }

    /// Append a comment to an existing image.
    ///
    /// The insert selects the owning row in the same statement; when no image
    /// matches nothing is written and `ImageNotFound` is returned.
    pub async fn append_comment(&self, new: NewComment) -> GalleryResult<Comment> {
        let db = self.handle().await?;
        let comment = Comment {
            comment_id: Uuid::new_v4().to_string(),
            comment: new.comment,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO comments (comment_id, image_id, comment, created_at)
             SELECT ?, image_id, ?, ? FROM images WHERE image_id = ?",
        )
        .bind(&comment.comment_id)
        .bind(&comment.comment)
        .bind(comment.created_at)
        .bind(&new.image_id)
        .execute(&db.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::ImageNotFound(new.image_id));
        }

        debug!(image_id = %new.image_id, comment_id = %comment.comment_id, "comment appended");
        Ok(comment)
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation()
            || db_err.message().to_ascii_lowercase().contains("unique")
    )
}
