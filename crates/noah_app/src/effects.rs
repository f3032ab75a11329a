use std::time::Duration;

use noah_core::{ChannelResult, Effect, ListingRow, Msg, RepairTally};
use noah_engine::{
    ApiError, CandidateItem, ChannelOutcome, ClientSettings, EngineEvent, EngineHandle,
};
use noah_logging::{noah_debug, noah_info};

use crate::render;

/// Carries out effects on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let engine = EngineHandle::new(settings)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartUpload { files, tags, thumb } => {
                    noah_info!(
                        "StartUpload files={} tags={} thumb={}",
                        files.len(),
                        tags.len(),
                        thumb.is_some()
                    );
                    self.engine.start_upload(files, tags, thumb);
                }
                Effect::Alert(notice) => render::print_notice(&notice),
                Effect::Navigate(route) => {
                    noah_debug!("navigate to {:?}", route);
                }
                Effect::StartRepair { items } => {
                    noah_info!("StartRepair over {} listed file(s)", items.len());
                    self.engine
                        .repair(items.into_iter().map(candidate).collect());
                }
                Effect::RefreshList { page, size } => {
                    self.engine.list_files(page, size);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that matters to the
    /// state machine.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(map_event(event).unwrap_or(Msg::NoOp))
    }
}

fn candidate(row: ListingRow) -> CandidateItem {
    CandidateItem {
        file_hash: row.file_hash,
        file_name: row.file_name,
        tags: row.tags,
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::SessionStarted { upload_id } => Msg::SessionStarted {
            upload_id: upload_id.to_string(),
        },
        EngineEvent::BatchRejected(err) => Msg::SessionFailed {
            message: err.to_string(),
        },
        EngineEvent::SessionFailed(err) => Msg::SessionFailed {
            message: err.0.to_string(),
        },
        EngineEvent::UploadProgress { file_name, percent } => {
            Msg::UploadProgress { file_name, percent }
        }
        EngineEvent::UploadSettled { result: Ok(()), .. } => return None,
        EngineEvent::UploadSettled {
            file_name,
            result: Err(err),
            ..
        } => Msg::UploadFailed {
            file_name,
            message: err.error.to_string(),
        },
        EngineEvent::BatchSettled {
            accepted, failed, ..
        } => Msg::BatchSettled { accepted, failed },
        EngineEvent::StatusChanged { status } => Msg::StatusChanged(status),
        EngineEvent::ChannelClosed(outcome) => Msg::ChannelClosed(match outcome {
            ChannelOutcome::Completed => ChannelResult::Completed,
            ChannelOutcome::Failed => ChannelResult::Failed,
            ChannelOutcome::Duplicate => ChannelResult::Duplicate,
            ChannelOutcome::ChannelError(err) => ChannelResult::Error(err.message),
        }),
        EngineEvent::RepairFinished(summary) => Msg::RepairFinished(RepairTally {
            attempted: summary.attempted,
            repaired: summary.repaired.len(),
            skipped: summary.skipped.len(),
        }),
        EngineEvent::FilesListed {
            page,
            result: Ok(listing),
        } => Msg::ListingLoaded {
            page,
            total: listing.total,
            items: listing
                .items
                .into_iter()
                .map(|item| ListingRow {
                    file_hash: item.file_hash,
                    file_name: item.file_name,
                    tags: item.tags,
                })
                .collect(),
        },
        EngineEvent::FilesListed {
            page,
            result: Err(err),
        } => Msg::ListingFailed {
            page,
            message: err.to_string(),
        },
    };
    Some(msg)
}
