//! Noah core: pure state machine and view-model helpers for the upload page,
//! the file listing and the repair sweep.
mod effect;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notice, Route};
pub use msg::{ChannelResult, ListingRow, Msg, RepairTally, SelectedFile, UploadOutcome};
pub use progress::ProgressRecord;
pub use state::{AppState, RepairPhase, UploadPhase, DEFAULT_PAGE_SIZE};
pub use update::{parse_tags, update};
pub use view_model::{AppViewModel, FileRowView};
