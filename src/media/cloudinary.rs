use super::{MediaError, MediaHost, UploadFile};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::{debug, info};

const CLOUDINARY_API_ROOT: &str = "https://api.cloudinary.com/v1_1";

/// Unsigned uploads to a Cloudinary cloud through an upload preset.
#[derive(Clone, Debug)]
pub struct CloudinaryHost {
    client: Client,
    api_root: String,
    cloud_name: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl CloudinaryHost {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_root: CLOUDINARY_API_ROOT.to_string(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
        }
    }

    /// Point at a different API root, e.g. a local stand-in.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_root.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: &UploadFile) -> Result<String, MediaError> {
        let part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("cloud_name", self.cloud_name.clone());

        debug!(file = %file.file_name, size = file.size(), "uploading to media host");
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let url = parse_secure_url(response.json::<UploadResponse>().await?)?;
        info!(file = %file.file_name, "uploaded to {}", url);
        Ok(url)
    }
}

fn parse_secure_url(response: UploadResponse) -> Result<String, MediaError> {
    response
        .secure_url
        .filter(|url| !url.is_empty())
        .ok_or(MediaError::MissingUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Bytes, extract::State, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Option<String>>>;

    /// Serve a fixed answer on `/{cloud}/image/upload`, keeping the last request body.
    async fn stand_in(status: StatusCode, answer: &'static str) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/{cloud}/image/upload",
                post(move |State(seen): State<Captured>, body: Bytes| async move {
                    *seen.lock().unwrap() = Some(String::from_utf8_lossy(&body).into_owned());
                    (status, answer)
                }),
            )
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), captured)
    }

    #[test]
    fn upload_url_includes_cloud_name() {
        let host = CloudinaryHost::new("demo", "preset");
        assert_eq!(
            host.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );

        let local = host.with_api_root("http://127.0.0.1:9000/");
        assert_eq!(local.upload_url(), "http://127.0.0.1:9000/demo/image/upload");
    }

    #[test]
    fn secure_url_is_required() {
        let ok: UploadResponse =
            serde_json::from_str(r#"{"secure_url":"https://res.cloudinary.com/a.jpg","public_id":"a"}"#)
                .unwrap();
        assert_eq!(
            parse_secure_url(ok).unwrap(),
            "https://res.cloudinary.com/a.jpg"
        );

        let missing: UploadResponse = serde_json::from_str(r#"{"public_id":"a"}"#).unwrap();
        assert!(matches!(
            parse_secure_url(missing),
            Err(MediaError::MissingUrl)
        ));
    }

    #[tokio::test]
    async fn upload_posts_file_and_preset_as_multipart() {
        let (root, captured) = stand_in(
            StatusCode::OK,
            r#"{"secure_url":"https://res.cloudinary.com/demo/cat.png"}"#,
        )
        .await;
        let host = CloudinaryHost::new("demo", "unsigned-preset").with_api_root(root);

        let url = host
            .upload(&UploadFile::new("cat.png", b"PNGBYTES".to_vec()))
            .await
            .unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/cat.png");

        let body = captured.lock().unwrap().clone().unwrap();
        assert!(body.contains(r#"name="file""#), "{body}");
        assert!(body.contains(r#"filename="cat.png""#), "{body}");
        assert!(body.contains("PNGBYTES"), "{body}");
        assert!(body.contains("name=\"upload_preset\"\r\n\r\nunsigned-preset"), "{body}");
        assert!(body.contains("name=\"cloud_name\"\r\n\r\ndemo"), "{body}");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (root, _) = stand_in(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"bad preset"}}"#,
        )
        .await;
        let host = CloudinaryHost::new("demo", "wrong").with_api_root(root);

        match host.upload(&UploadFile::new("cat.png", vec![1u8])).await {
            Err(MediaError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("bad preset"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_secure_url_is_an_error() {
        let (root, _) = stand_in(StatusCode::OK, r#"{"public_id":"cat"}"#).await;
        let host = CloudinaryHost::new("demo", "preset").with_api_root(root);

        assert!(matches!(
            host.upload(&UploadFile::new("cat.png", vec![1u8])).await,
            Err(MediaError::MissingUrl)
        ));
    }
}
