use std::fmt;
use std::path::PathBuf;

use crate::{ListingRow, RepairTally};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartUpload {
        files: Vec<PathBuf>,
        tags: Vec<String>,
        thumb: Option<PathBuf>,
    },
    Alert(Notice),
    Navigate(Route),
    StartRepair { items: Vec<ListingRow> },
    RefreshList { page: u32, size: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Upload,
    FileList,
}

/// A one-shot message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoFilesSelected,
    UploadCompleted,
    UploadFailed(String),
    UploadRejected,
    Duplicate,
    NothingAccepted { failed: usize },
    ChannelError(String),
    ListingFailed(String),
    RepairDone(RepairTally),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoFilesSelected => write!(f, "Select at least one file to upload"),
            Notice::UploadCompleted => write!(f, "Upload completed"),
            Notice::UploadFailed(message) => write!(f, "Upload failed: {message}"),
            Notice::UploadRejected => write!(f, "Upload failed on the server"),
            Notice::Duplicate => write!(f, "This file is already in the library"),
            Notice::NothingAccepted { failed } => {
                write!(f, "Upload failed: none of the {failed} file(s) was accepted")
            }
            Notice::ChannelError(message) => write!(f, "Status connection error: {message}"),
            Notice::ListingFailed(message) => write!(f, "Could not load the file list: {message}"),
            Notice::RepairDone(tally) => write!(
                f,
                "Metadata repair done: {} of {} repaired, {} skipped",
                tally.repaired, tally.attempted, tally.skipped
            ),
        }
    }
}
