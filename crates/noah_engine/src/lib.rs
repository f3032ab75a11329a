//! Noah engine: upload orchestration, status correlation and metadata repair.
mod client;
mod engine;
mod repair;
mod scheduler;
mod settings;
mod status;
mod types;
mod upload;

pub use client::{
    ChannelProgressSink, LibraryApi, LookupData, ProgressSink, ReqwestClient, UploadApi,
};
pub use engine::EngineHandle;
pub use repair::{external_id, repair_code, run_repair, CandidateItem, MetaUpdate};
pub use scheduler::run_bounded;
pub use settings::{ClientSettings, Endpoints};
pub use status::{
    watch_status, ChannelOutcome, ChannelState, StatusChannel, StatusChannelHandle, StatusEvent,
};
pub use types::{
    ApiError, ChannelError, EngineEvent, FailureKind, FilePage, LibraryItem, LookupSkip,
    RepairSummary, SkipReason, SessionError, TransferError, UploadId,
};
pub use upload::{
    run_batch, Attachments, BatchReport, ThumbAttachment, UploadBatch, UploadFile, UploadRequest,
};
