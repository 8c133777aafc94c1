//! Core data models for the image gallery.
//!
//! An `ImageRecord` is one uploaded image plus its embedded, append-only list
//! of `Comment`s. Rows map via `sqlx::FromRow`; the public shapes serialize as
//! camelCase JSON.

pub mod comment;
pub mod image;
pub mod response;
