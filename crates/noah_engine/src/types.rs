use std::fmt;

use serde::Deserialize;

use crate::status::ChannelOutcome;

/// Opaque per-batch identifier issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadId(String);

impl UploadId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SessionStarted {
        upload_id: UploadId,
    },
    /// The selected files could not be read; no session was requested.
    BatchRejected(ApiError),
    SessionFailed(SessionError),
    UploadProgress {
        file_name: String,
        percent: u8,
    },
    UploadSettled {
        index: usize,
        file_name: String,
        result: Result<(), TransferError>,
    },
    BatchSettled {
        upload_id: UploadId,
        accepted: usize,
        failed: usize,
    },
    StatusChanged {
        status: String,
    },
    ChannelClosed(ChannelOutcome),
    RepairFinished(RepairSummary),
    FilesListed {
        page: u32,
        result: Result<FilePage, ApiError>,
    },
}

/// One entry of the library listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryItem {
    pub file_hash: String,
    pub file_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilePage {
    #[serde(default)]
    pub items: Vec<LibraryItem>,
    #[serde(default)]
    pub total: u64,
}

/// Result of one bulk repair sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepairSummary {
    pub attempted: usize,
    /// Hashes of the items whose metadata was replaced.
    pub repaired: Vec<String>,
    pub skipped: Vec<LookupSkip>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// The upload token could not be obtained; nothing was uploaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not obtain an upload session: {0}")]
pub struct SessionError(#[from] pub ApiError);

/// One file's transfer failed. Siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("upload of {file_name} failed: {error}")]
pub struct TransferError {
    pub file_name: String,
    #[source]
    pub error: ApiError,
}

impl TransferError {
    pub(crate) fn new(file_name: impl Into<String>, error: ApiError) -> Self {
        Self {
            file_name: file_name.into(),
            error,
        }
    }
}

/// The status channel itself failed, as opposed to reporting a status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status channel failed: {message}")]
pub struct ChannelError {
    pub message: String,
}

impl ChannelError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A repair candidate that was given up on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skipped {file_hash} ({code}): {reason}")]
pub struct LookupSkip {
    pub file_hash: String,
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("lookup reported no match")]
    NotFound,
    #[error("lookup failed: {0}")]
    Lookup(ApiError),
    #[error("thumbnail download failed: {0}")]
    Thumbnail(ApiError),
    #[error("metadata update failed: {0}")]
    Update(ApiError),
}
