//! Command-line client for the gallery API.
//!
//! `GalleryView` carries the client state; the `run_*` functions drive it for
//! one CLI invocation and print the result.

pub mod api;
pub mod validation;
pub mod view;

use crate::{
    config::ClientConfig,
    media::cloudinary::CloudinaryHost,
};
use anyhow::{Context, Result, bail};
use api::HttpImageApi;
use std::path::Path;
use view::{GalleryView, Notice, NoticeStatus};

pub async fn run_list(cfg: &ClientConfig) -> Result<()> {
    let api = HttpImageApi::new(&cfg.api_url);
    let mut view = GalleryView::new();
    view.load(&api).await;
    report(&view)?;

    for image in view.images() {
        println!("{}  {}  ({})", image.image_id, image.image_url, image.created_at);
        for comment in &image.comments {
            println!("    [{}] {}", comment.created_at, comment.comment);
        }
    }
    Ok(())
}

pub async fn run_upload(cfg: &ClientConfig, path: &Path) -> Result<()> {
    let media_cfg = cfg
        .media
        .as_ref()
        .context("GALLERY_MEDIA_CLOUD_NAME and GALLERY_MEDIA_UPLOAD_PRESET must be set to upload")?;
    let media = CloudinaryHost::new(&media_cfg.cloud_name, &media_cfg.upload_preset);
    let api = HttpImageApi::new(&cfg.api_url);

    let mut view = GalleryView::new();
    view.upload_path(&api, &media, path).await;
    report(&view)?;

    if let Some(image) = view.images().last() {
        println!("{}  {}", image.image_id, image.image_url);
    }
    Ok(())
}

pub async fn run_comment(cfg: &ClientConfig, image_id: &str, text: &str) -> Result<()> {
    let api = HttpImageApi::new(&cfg.api_url);
    let mut view = GalleryView::new();
    view.load(&api).await;
    report(&view)?;

    if !view.inspect(image_id) {
        bail!("image `{}` not found", image_id);
    }
    if text.trim().is_empty() {
        bail!("comment is empty");
    }

    view.add_comment(&api, image_id, text).await;
    report(&view)?;

    for comment in view.inspected_comments() {
        println!("[{}] {}", comment.created_at, comment.comment);
    }
    Ok(())
}

/// Print a success notice; turn an error notice into the command's error.
fn report(view: &GalleryView) -> Result<()> {
    match view.notice() {
        Some(Notice {
            status: NoticeStatus::Error,
            message,
        }) => bail!("{}", message),
        Some(Notice { message, .. }) => {
            println!("{}", message);
            Ok(())
        }
        None => Ok(()),
    }
}
