use std::path::PathBuf;

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    /// Uses the last path component as the display name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// One row of the library listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub file_hash: String,
    pub file_name: String,
    pub tags: Vec<String>,
}

/// Terminal result reported by the status channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult {
    Completed,
    Failed,
    Duplicate,
    Error(String),
}

/// How an upload batch ended, as far as the page is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed,
    Failed,
    Duplicate,
    ChannelError(String),
    /// No upload id could be obtained.
    SessionFailed(String),
    /// Every transfer of the batch failed.
    NothingAccepted,
}

impl From<ChannelResult> for UploadOutcome {
    fn from(result: ChannelResult) -> Self {
        match result {
            ChannelResult::Completed => UploadOutcome::Completed,
            ChannelResult::Failed => UploadOutcome::Failed,
            ChannelResult::Duplicate => UploadOutcome::Duplicate,
            ChannelResult::Error(message) => UploadOutcome::ChannelError(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairTally {
    pub attempted: usize,
    pub repaired: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked the files of the next batch.
    FilesSelected(Vec<SelectedFile>),
    /// User edited the space separated tag input.
    TagsChanged(String),
    /// User picked (or cleared) the thumbnail image.
    ThumbSelected(Option<PathBuf>),
    /// User submitted the upload form.
    SubmitClicked,
    /// The server issued the batch's upload id.
    SessionStarted { upload_id: String },
    SessionFailed { message: String },
    /// Per-file transfer progress.
    UploadProgress { file_name: String, percent: u8 },
    /// One transfer failed; its siblings carry on.
    UploadFailed { file_name: String, message: String },
    /// Every transfer of the batch settled.
    BatchSettled { accepted: usize, failed: usize },
    /// Non-terminal server-side status, shown verbatim.
    StatusChanged(String),
    /// The status channel closed with the batch's terminal outcome.
    ChannelClosed(ChannelResult),
    ListingLoaded {
        page: u32,
        items: Vec<ListingRow>,
        total: u64,
    },
    ListingFailed { page: u32, message: String },
    PageRequested(u32),
    RepairClicked,
    RepairFinished(RepairTally),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
