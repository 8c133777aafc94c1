//! HTTP client for the gallery endpoint.

use crate::models::{
    comment::Comment,
    image::{ImageRecord, NewComment, NewImage},
    response::{ApiResponse, ResponseStatus},
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{message}")]
    Failure { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response carried no data")]
    MissingData,
}

/// A successful call: the server's message and its payload.
#[derive(Debug, Clone)]
pub struct Accepted<T> {
    pub message: String,
    pub data: T,
}

/// The three gallery operations as seen from a client.
pub trait ImageApi {
    fn list_images(
        &self,
    ) -> impl Future<Output = Result<Accepted<Vec<ImageRecord>>, ApiClientError>> + Send;

    fn create_image(
        &self,
        new: NewImage,
    ) -> impl Future<Output = Result<Accepted<ImageRecord>, ApiClientError>> + Send;

    fn append_comment(
        &self,
        new: NewComment,
    ) -> impl Future<Output = Result<Accepted<Comment>, ApiClientError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpImageApi {
    client: Client,
    endpoint: String,
}

impl HttpImageApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Accepted<T>, ApiClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), "gallery api responded");
        decode_envelope(status.as_u16(), &body)
    }
}

impl ImageApi for HttpImageApi {
    async fn list_images(&self) -> Result<Accepted<Vec<ImageRecord>>, ApiClientError> {
        self.send(self.client.get(&self.endpoint)).await
    }

    async fn create_image(&self, new: NewImage) -> Result<Accepted<ImageRecord>, ApiClientError> {
        self.send(self.client.post(&self.endpoint).json(&new)).await
    }

    async fn append_comment(&self, new: NewComment) -> Result<Accepted<Comment>, ApiClientError> {
        self.send(self.client.patch(&self.endpoint).json(&new)).await
    }
}

/// Turn a raw response into `Accepted<T>` or the failure the server reported.
fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<Accepted<T>, ApiClientError> {
    if body.is_empty() {
        return Err(ApiClientError::Failure {
            status,
            message: format!("server returned status {status}"),
        });
    }

    let envelope: ApiResponse<Value> = serde_json::from_slice(body)?;
    if !(200..300).contains(&status) || envelope.status == ResponseStatus::Failure {
        return Err(ApiClientError::Failure {
            status,
            message: envelope.message,
        });
    }

    let data = envelope.data.ok_or(ApiClientError::MissingData)?;
    Ok(Accepted {
        message: envelope.message,
        data: serde_json::from_value(data)?,
    })
}
