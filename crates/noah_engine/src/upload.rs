use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use noah_logging::{noah_debug, noah_info, noah_warn};

use crate::client::{ProgressSink, UploadApi};
use crate::scheduler::run_bounded;
use crate::{ApiError, EngineEvent, FailureKind, SessionError, TransferError, UploadId};

/// A local file selected for upload. Content is streamed from `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Display name sent to the server; also the progress key.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl UploadFile {
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| io_error(&path, err))?;
        if !metadata.is_file() {
            return Err(ApiError::new(
                FailureKind::Io,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            name: display_name(&path),
            size: metadata.len(),
            path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl ThumbAttachment {
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| io_error(path, err))?;
        Ok(Self {
            file_name: display_name(path),
            mime: mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string(),
            bytes: Bytes::from(bytes),
        })
    }
}

/// Per-file metadata. Only ever sent with single-file batches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachments {
    pub tags: Vec<String>,
    pub thumb: Option<ThumbAttachment>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.thumb.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    files: Vec<UploadFile>,
    attachments: Option<Attachments>,
}

impl UploadBatch {
    /// Attachments are dropped when the batch holds more than one file.
    pub fn new(files: Vec<UploadFile>, attachments: Attachments) -> Self {
        let attachments = if files.len() == 1 && !attachments.is_empty() {
            Some(attachments)
        } else {
            if files.len() > 1 && !attachments.is_empty() {
                noah_debug!(
                    "dropping tags/thumbnail for multi-file batch of {}",
                    files.len()
                );
            }
            None
        };
        Self { files, attachments }
    }

    /// Reads file sizes and the thumbnail from disk. The thumbnail is only
    /// read when it will actually be sent.
    pub async fn from_paths(
        paths: &[PathBuf],
        tags: Vec<String>,
        thumb: Option<&Path>,
    ) -> Result<Self, ApiError> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(UploadFile::from_path(path).await?);
        }
        let thumb = match thumb {
            Some(path) if files.len() == 1 => Some(ThumbAttachment::from_path(path).await?),
            _ => None,
        };
        Ok(Self::new(files, Attachments { tags, thumb }))
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn attachments(&self) -> Option<&Attachments> {
        self.attachments.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_requests(self, upload_id: &UploadId) -> Vec<UploadRequest> {
        let mut attachments = self.attachments;
        self.files
            .into_iter()
            .map(|file| UploadRequest {
                upload_id: upload_id.clone(),
                file,
                attachments: attachments.take(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub upload_id: UploadId,
    pub file: UploadFile,
    pub attachments: Option<Attachments>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub upload_id: UploadId,
    /// One entry per file, in selection order.
    pub results: Vec<Result<(), TransferError>>,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.results.iter().filter(|result| result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.accepted()
    }
}

/// Obtains a fresh upload id, then uploads every file of the batch with at
/// most `limit` transfers in flight.
///
/// A session failure aborts before any transfer. Transfer failures stay in
/// their own slot of the returned report.
pub async fn run_batch(
    api: Arc<dyn UploadApi>,
    batch: UploadBatch,
    limit: usize,
    sink: Arc<dyn ProgressSink>,
) -> Result<BatchReport, SessionError> {
    let upload_id = api.begin_session().await?;
    noah_info!(
        "upload session {} issued for {} file(s)",
        upload_id,
        batch.files().len()
    );
    sink.emit(EngineEvent::SessionStarted {
        upload_id: upload_id.clone(),
    });

    let tasks = batch
        .into_requests(&upload_id)
        .into_iter()
        .enumerate()
        .map(|(index, request)| {
            let api = api.clone();
            let sink = sink.clone();
            move || async move {
                let file_name = request.file.name.clone();
                noah_debug!("dispatching upload #{} {}", index, file_name);
                let result = api.upload(request, sink.clone()).await;
                if let Err(err) = &result {
                    noah_warn!("{}", err);
                }
                sink.emit(EngineEvent::UploadSettled {
                    index,
                    file_name,
                    result: result.clone(),
                });
                result
            }
        });

    let results = run_bounded(tasks, limit).await;
    Ok(BatchReport { upload_id, results })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn io_error(path: &Path, err: std::io::Error) -> ApiError {
    ApiError::new(FailureKind::Io, format!("{}: {}", path.display(), err))
}
