use crate::{
    AppState, ChannelResult, Effect, Msg, Notice, RepairPhase, Route, UploadOutcome, UploadPhase,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSelected(files) => {
            if state.upload_phase().is_busy() {
                return (state, Vec::new());
            }
            state.select_files(files);
            Vec::new()
        }
        Msg::TagsChanged(tags) => {
            state.set_tags_input(tags);
            Vec::new()
        }
        Msg::ThumbSelected(thumb) => {
            state.set_thumb(thumb);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::SessionStarted { upload_id } => {
            if *state.upload_phase() == UploadPhase::RequestingSession {
                state.session_started(upload_id);
            }
            Vec::new()
        }
        Msg::SessionFailed { message } => {
            if *state.upload_phase() != UploadPhase::RequestingSession {
                return (state, Vec::new());
            }
            state.finish_upload(UploadOutcome::SessionFailed(message.clone()));
            vec![Effect::Alert(Notice::UploadFailed(message))]
        }
        Msg::UploadProgress { file_name, percent } => {
            if *state.upload_phase() == UploadPhase::Uploading {
                state.set_progress(&file_name, percent);
            }
            Vec::new()
        }
        Msg::UploadFailed { file_name, .. } => {
            if *state.upload_phase() == UploadPhase::Uploading {
                state.record_failed_file(file_name);
            }
            Vec::new()
        }
        Msg::BatchSettled { accepted, failed } => {
            if *state.upload_phase() != UploadPhase::Uploading {
                return (state, Vec::new());
            }
            if accepted == 0 {
                state.finish_upload(UploadOutcome::NothingAccepted);
                vec![Effect::Alert(Notice::NothingAccepted { failed })]
            } else {
                state.await_outcome();
                Vec::new()
            }
        }
        Msg::StatusChanged(status) => {
            if matches!(
                state.upload_phase(),
                UploadPhase::Uploading | UploadPhase::AwaitingOutcome
            ) {
                state.set_status(status);
            }
            Vec::new()
        }
        Msg::ChannelClosed(result) => close_channel(&mut state, result),
        Msg::ListingLoaded { page, items, total } => {
            // Responses for a page the user already left are stale.
            if page == state.page() {
                state.set_listing(items, total);
            }
            Vec::new()
        }
        Msg::ListingFailed { page, message } => {
            if page != state.page() {
                return (state, Vec::new());
            }
            state.set_listing_error(message.clone());
            vec![Effect::Alert(Notice::ListingFailed(message))]
        }
        Msg::PageRequested(page) => {
            state.set_page(page);
            vec![Effect::RefreshList {
                page: state.page(),
                size: state.page_size(),
            }]
        }
        Msg::RepairClicked => {
            if state.repair_phase() == RepairPhase::Running {
                return (state, Vec::new());
            }
            state.set_repair(RepairPhase::Running);
            vec![Effect::StartRepair {
                items: state.listing().to_vec(),
            }]
        }
        Msg::RepairFinished(tally) => {
            if state.repair_phase() != RepairPhase::Running {
                return (state, Vec::new());
            }
            state.set_repair(RepairPhase::Done(tally));
            vec![
                Effect::Alert(Notice::RepairDone(tally)),
                Effect::RefreshList {
                    page: state.page(),
                    size: state.page_size(),
                },
            ]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.upload_phase().is_busy() {
        return Vec::new();
    }
    if state.files().is_empty() {
        return vec![Effect::Alert(Notice::NoFilesSelected)];
    }

    let single = state.files().len() == 1;
    let (tags, thumb) = if single {
        (parse_tags(state.tags_input()), state.thumb().cloned())
    } else {
        (Vec::new(), None)
    };
    let files = state
        .files()
        .iter()
        .map(|file| file.path.clone())
        .collect();

    state.begin_upload();
    vec![Effect::StartUpload { files, tags, thumb }]
}

fn close_channel(state: &mut AppState, result: ChannelResult) -> Vec<Effect> {
    // A closed channel is final; later closes are ignored.
    if !matches!(
        state.upload_phase(),
        UploadPhase::Uploading | UploadPhase::AwaitingOutcome
    ) {
        return Vec::new();
    }

    state.finish_upload(UploadOutcome::from(result.clone()));
    match result {
        ChannelResult::Completed => {
            state.navigate(Route::FileList);
            vec![
                Effect::Alert(Notice::UploadCompleted),
                Effect::Navigate(Route::FileList),
                Effect::RefreshList {
                    page: state.page(),
                    size: state.page_size(),
                },
            ]
        }
        ChannelResult::Failed => vec![Effect::Alert(Notice::UploadRejected)],
        ChannelResult::Duplicate => vec![Effect::Alert(Notice::Duplicate)],
        ChannelResult::Error(message) => vec![Effect::Alert(Notice::ChannelError(message))],
    }
}

/// Splits the tag input on whitespace, dropping empty entries.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(ToOwned::to_owned).collect()
}
