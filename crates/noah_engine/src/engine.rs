use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use noah_logging::{noah_error, noah_info};

use crate::client::{ChannelProgressSink, LibraryApi, ProgressSink, ReqwestClient, UploadApi};
use crate::repair::{run_repair, CandidateItem};
use crate::status::{ChannelOutcome, StatusChannel};
use crate::upload::{run_batch, UploadBatch};
use crate::{ApiError, ChannelError, ClientSettings, EngineEvent, FailureKind};

enum EngineCommand {
    Upload {
        files: Vec<PathBuf>,
        tags: Vec<String>,
        thumb: Option<PathBuf>,
    },
    StartBatch { batch: UploadBatch },
    Repair { items: Vec<CandidateItem> },
    ListFiles { page: u32, size: u32 },
}

/// Owns a background runtime that executes engine commands and reports
/// back through [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let client = Arc::new(ReqwestClient::new(settings.clone())?);
        Self::with_api(settings, client.clone(), client)
    }

    pub fn with_api(
        settings: ClientSettings,
        uploads: Arc<dyn UploadApi>,
        library: Arc<dyn LibraryApi>,
    ) -> Result<Self, ApiError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| ApiError::new(FailureKind::Io, format!("tokio runtime: {err}")))?;
        let settings = Arc::new(settings);

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let context = CommandContext {
                    settings: settings.clone(),
                    uploads: uploads.clone(),
                    library: library.clone(),
                    event_tx: event_tx.clone(),
                };
                runtime.spawn(async move {
                    handle_command(context, command).await;
                });
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    /// Reads the given files and uploads them as one batch.
    pub fn start_upload(&self, files: Vec<PathBuf>, tags: Vec<String>, thumb: Option<PathBuf>) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Upload { files, tags, thumb });
    }

    pub fn start_batch(&self, batch: UploadBatch) {
        let _ = self.cmd_tx.send(EngineCommand::StartBatch { batch });
    }

    pub fn repair(&self, items: Vec<CandidateItem>) {
        let _ = self.cmd_tx.send(EngineCommand::Repair { items });
    }

    pub fn list_files(&self, page: u32, size: u32) {
        let _ = self.cmd_tx.send(EngineCommand::ListFiles { page, size });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct CommandContext {
    settings: Arc<ClientSettings>,
    uploads: Arc<dyn UploadApi>,
    library: Arc<dyn LibraryApi>,
    event_tx: mpsc::Sender<EngineEvent>,
}

async fn handle_command(context: CommandContext, command: EngineCommand) {
    let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(context.event_tx.clone()));
    match command {
        EngineCommand::Upload { files, tags, thumb } => {
            match UploadBatch::from_paths(&files, tags, thumb.as_deref()).await {
                Ok(batch) => upload_batch(&context, batch, sink).await,
                Err(err) => {
                    noah_error!("cannot prepare upload: {}", err);
                    sink.emit(EngineEvent::BatchRejected(err));
                }
            }
        }
        EngineCommand::StartBatch { batch } => upload_batch(&context, batch, sink).await,
        EngineCommand::Repair { items } => {
            let summary = run_repair(context.library.as_ref(), &items).await;
            sink.emit(EngineEvent::RepairFinished(summary));
        }
        EngineCommand::ListFiles { page, size } => {
            let result = context.library.list_files(page, size).await;
            if let Err(err) = &result {
                noah_error!("listing page {} failed: {}", page, err);
            }
            sink.emit(EngineEvent::FilesListed { page, result });
        }
    }
}

/// Runs the transfers of one batch and then follows its status channel
/// until the terminal outcome.
async fn upload_batch(context: &CommandContext, batch: UploadBatch, sink: Arc<dyn ProgressSink>) {
    let limit = context.settings.upload_concurrency;
    let report = match run_batch(context.uploads.clone(), batch, limit, sink.clone()).await {
        Ok(report) => report,
        Err(err) => {
            noah_error!("{}", err);
            sink.emit(EngineEvent::SessionFailed(err));
            return;
        }
    };

    let accepted = report.accepted();
    sink.emit(EngineEvent::BatchSettled {
        upload_id: report.upload_id.clone(),
        accepted,
        failed: report.failed(),
    });
    // The server only learns the id from accepted uploads.
    if accepted == 0 {
        noah_error!("no file of batch {} was accepted", report.upload_id);
        return;
    }

    let outcome = match context.settings.status_url(&report.upload_id) {
        Ok(url) => StatusChannel::open(url, sink.clone()).closed().await,
        Err(err) => ChannelOutcome::ChannelError(ChannelError::new(err.to_string())),
    };
    noah_info!("batch {} finished: {:?}", report.upload_id, outcome);
    sink.emit(EngineEvent::ChannelClosed(outcome));
}
