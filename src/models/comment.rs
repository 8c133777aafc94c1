//! A free-text annotation attached to one image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single comment, embedded in its owning `ImageRecord`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Stable identifier assigned when the comment is stored.
    pub comment_id: String,

    /// Free text; not validated.
    pub comment: String,

    /// Server time at append.
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `comments` table, carrying the owning image id.
#[derive(FromRow, Debug)]
pub struct CommentRow {
    pub comment_id: String,
    pub image_id: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            comment_id: row.comment_id,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}
