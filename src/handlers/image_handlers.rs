//! The gallery's single API entry point.
//!
//! One path serves all three operations; the HTTP method picks which one.
//! Requests are parsed into `ImageRequest` first, so dispatch is an exhaustive
//! match rather than string comparison scattered through the handler.

use crate::{
    errors::AppError,
    models::{
        image::{NewComment, NewImage},
        response::ApiResponse,
    },
    services::image_service::{GalleryError, ImageService},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

pub const IMAGE_HANDLER_PATH: &str = "/api/imageHandler";

const ALLOWED_METHODS: &str = "GET, POST, PATCH";

/// The operations reachable through `IMAGE_HANDLER_PATH`.
#[derive(Debug)]
pub enum ImageRequest {
    Create(NewImage),
    List,
    AppendComment(NewComment),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("method `{0}` not allowed")]
    MethodNotAllowed(Method),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ImageRequest {
    /// POST creates, GET lists, PATCH appends a comment.
    pub fn parse(method: &Method, body: &[u8]) -> Result<Self, RequestError> {
        match method {
            &Method::POST => Ok(Self::Create(parse_body(body)?)),
            &Method::GET => Ok(Self::List),
            &Method::PATCH => Ok(Self::AppendComment(parse_body(body)?)),
            _ => Err(RequestError::MethodNotAllowed(method.clone())),
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, RequestError> {
    serde_json::from_slice(body).map_err(|err| RequestError::InvalidBody(err.to_string()))
}

/// `ANY /api/imageHandler`
pub async fn image_handler(
    State(service): State<ImageService>,
    method: Method,
    body: Bytes,
) -> Response {
    let request = match ImageRequest::parse(&method, &body) {
        Ok(request) => request,
        Err(RequestError::MethodNotAllowed(method)) => {
            debug!(%method, "rejecting unsupported method");
            let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            return response;
        }
        Err(err @ RequestError::InvalidBody(_)) => {
            return AppError::bad_request(err.to_string()).into_response();
        }
    };

    match dispatch(&service, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn dispatch(service: &ImageService, request: ImageRequest) -> Result<Response, AppError> {
    match request {
        ImageRequest::Create(new) => {
            let record = service.create_image(new).await.map_err(|err| match err {
                GalleryError::DuplicateImageId(_) => AppError::conflict(err.to_string()),
                other => {
                    error!("create image failed: {}", other);
                    AppError::internal("Error uploading image")
                }
            })?;
            Ok(Json(ApiResponse::success("Image uploaded successfully", record)).into_response())
        }
        ImageRequest::List => {
            let images = service.list_images().await.map_err(|err| {
                error!("list images failed: {}", err);
                AppError::internal("Error retrieving images").with_data(json!([]))
            })?;
            Ok(Json(ApiResponse::success("Images retrieved successfully", images)).into_response())
        }
        ImageRequest::AppendComment(new) => {
            let comment = service.append_comment(new).await.map_err(|err| match err {
                GalleryError::ImageNotFound(_) => AppError::not_found(err.to_string()),
                other => {
                    error!("append comment failed: {}", other);
                    AppError::internal("Error adding comment")
                }
            })?;
            Ok(Json(ApiResponse::success("Comment added successfully", comment)).into_response())
        }
    }
}
