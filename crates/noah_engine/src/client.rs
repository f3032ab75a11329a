use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::repair::MetaUpdate;
use crate::upload::{ThumbAttachment, UploadRequest};
use crate::{
    ApiError, ClientSettings, EngineEvent, FailureKind, FilePage, SessionError, TransferError,
    UploadId,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Server calls made by an upload batch.
#[async_trait::async_trait]
pub trait UploadApi: Send + Sync {
    async fn begin_session(&self) -> Result<UploadId, SessionError>;

    async fn upload(
        &self,
        request: UploadRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<(), TransferError>;
}

/// Server calls made by the listing and the repair sweep.
#[async_trait::async_trait]
pub trait LibraryApi: Send + Sync {
    async fn list_files(&self, page: u32, size: u32) -> Result<FilePage, ApiError>;

    /// `Ok(None)` when the lookup service answered but found nothing.
    async fn lookup(&self, code: &str) -> Result<Option<LookupData>, ApiError>;

    async fn fetch_image(&self, url: &str) -> Result<ThumbAttachment, ApiError>;

    async fn update_meta(&self, update: MetaUpdate) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    upload_id: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    success: bool,
    #[serde(default)]
    data: Option<LookupData>,
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn get_bytes(&self, url: reqwest::Url) -> Result<(Option<String>, Bytes), ApiError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok((content_type, body))
    }
}

#[async_trait::async_trait]
impl UploadApi for ReqwestClient {
    async fn begin_session(&self) -> Result<UploadId, SessionError> {
        let url = self.settings.endpoint_url(&self.settings.endpoints.session)?;
        let (_, body) = self.get_bytes(url).await?;
        let parsed: SessionResponse = parse_json(&body)?;
        if parsed.upload_id.trim().is_empty() {
            return Err(SessionError(ApiError::new(
                FailureKind::MalformedResponse,
                "empty upload_id",
            )));
        }
        Ok(UploadId::new(parsed.upload_id))
    }

    async fn upload(
        &self,
        request: UploadRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<(), TransferError> {
        let file_name = request.file.name.clone();
        let fail = |error: ApiError| TransferError::new(file_name.clone(), error);

        let url = self
            .settings
            .endpoint_url(&self.settings.endpoints.upload)
            .map_err(fail)?;
        let file = tokio::fs::File::open(&request.file.path)
            .await
            .map_err(|err| fail(ApiError::new(FailureKind::Io, err.to_string())))?;

        let body = progress_body(
            file,
            file_name.clone(),
            request.file.size,
            self.settings.chunk_size,
            sink,
        );
        let file_part = Part::stream_with_length(body, request.file.size).file_name(file_name.clone());
        let mut form = Form::new()
            .part("files", file_part)
            .text("upload_id", request.upload_id.to_string());
        if let Some(attachments) = request.attachments {
            for tag in attachments.tags {
                form = form.text("tags", tag);
            }
            if let Some(thumb) = attachments.thumb {
                form = form.part("thumb", thumb_part(thumb).map_err(fail)?);
            }
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| fail(map_reqwest_error(err)))?;
        ensure_success(response).map_err(fail)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LibraryApi for ReqwestClient {
    async fn list_files(&self, page: u32, size: u32) -> Result<FilePage, ApiError> {
        let mut url = self.settings.endpoint_url(&self.settings.endpoints.files)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        let (_, body) = self.get_bytes(url).await?;
        parse_json(&body)
    }

    async fn lookup(&self, code: &str) -> Result<Option<LookupData>, ApiError> {
        let mut url = self.settings.endpoint_url(&self.settings.endpoints.lookup)?;
        url.query_pairs_mut()
            .append_pair(&self.settings.endpoints.lookup_param, code);
        let (_, body) = self.get_bytes(url).await?;
        let parsed: LookupResponse = parse_json(&body)?;
        if !parsed.success {
            return Ok(None);
        }
        Ok(parsed.data)
    }

    async fn fetch_image(&self, url: &str) -> Result<ThumbAttachment, ApiError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("thumb.jpg")
            .to_string();
        let (content_type, bytes) = self.get_bytes(parsed).await?;
        let mime = content_type.unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string()
        });
        Ok(ThumbAttachment {
            file_name,
            mime,
            bytes,
        })
    }

    async fn update_meta(&self, update: MetaUpdate) -> Result<(), ApiError> {
        let url = self.settings.endpoint_url(&self.settings.endpoints.meta)?;
        let mut form = Form::new()
            .text("file_hash", update.file_hash)
            .text("file_name", update.file_name);
        if update.tags.is_empty() {
            // The server reads a single empty field as "no tags".
            form = form.text("tags", String::new());
        }
        for tag in update.tags {
            form = form.text("tags", tag);
        }
        if let Some(thumb) = update.thumb {
            form = form.part("thumb", thumb_part(thumb)?);
        }
        let response = self
            .client
            .put(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response)?;
        Ok(())
    }
}

/// Streams the file and reports whole-percent progress as chunks are handed
/// to the transport. Values never decrease and the last one is 100.
fn progress_body(
    file: tokio::fs::File,
    file_name: String,
    total: u64,
    chunk_size: usize,
    sink: Arc<dyn ProgressSink>,
) -> reqwest::Body {
    if total == 0 {
        sink.emit(EngineEvent::UploadProgress {
            file_name: file_name.clone(),
            percent: 100,
        });
    }
    let mut sent: u64 = 0;
    let mut last: Option<u8> = None;
    let stream = ReaderStream::with_capacity(file, chunk_size.max(1)).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            let percent = percent_of(sent, total);
            if last != Some(percent) {
                last = Some(percent);
                sink.emit(EngineEvent::UploadProgress {
                    file_name: file_name.clone(),
                    percent,
                });
            }
        }
        chunk
    });
    reqwest::Body::wrap_stream(stream)
}

pub(crate) fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let rounded = (u128::from(sent) * 100 + u128::from(total / 2)) / u128::from(total);
    rounded.min(100) as u8
}

fn thumb_part(thumb: ThumbAttachment) -> Result<Part, ApiError> {
    Part::stream(reqwest::Body::from(thumb.bytes))
        .file_name(thumb.file_name)
        .mime_str(&thumb.mime)
        .map_err(|err| ApiError::new(FailureKind::MalformedResponse, err.to_string()))
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    Ok(response)
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::new(FailureKind::MalformedResponse, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
