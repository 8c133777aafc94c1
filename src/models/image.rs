//! Represents an uploaded image and the comments left on it.

use super::comment::Comment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One image in the gallery.
///
/// The binary lives on the media host; only its URL is stored here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique identifier, never reassigned.
    pub image_id: String,

    /// Public URL returned by the media host.
    pub image_url: String,

    /// Comments in the order they were appended.
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Server time at creation.
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `images` table.
#[derive(FromRow, Debug)]
pub struct ImageRow {
    pub image_id: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn from_row(row: ImageRow, comments: Vec<Comment>) -> Self {
        Self {
            image_id: row.image_id,
            image_url: row.image_url,
            comments,
            created_at: row.created_at,
        }
    }
}

/// Body of a create request. `imageId` may be omitted; the server assigns one.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

/// Body of an append-comment request.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub image_id: String,
    pub comment: String,
}
