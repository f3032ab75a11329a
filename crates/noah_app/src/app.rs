use std::process::ExitCode;
use std::time::Duration;

use noah_core::{update, AppState, Msg, Route, SelectedFile, UploadOutcome, UploadPhase};
use noah_logging::noah_info;

use crate::cli::Command;
use crate::effects::EffectRunner;
use crate::render;

/// Render/coalescing interval.
const TICK: Duration = Duration::from_millis(75);

/// What the current invocation is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Uploading,
    ListingAfterUpload,
    ListingBeforeRepair,
    Repairing,
    ListingAfterRepair,
    Listing,
}

pub struct App {
    state: AppState,
    runner: EffectRunner,
    screen: Route,
    stage: Stage,
    last_frame: Vec<String>,
}

impl App {
    pub fn new(runner: EffectRunner, page_size: u32, command: &Command) -> Self {
        let (screen, stage) = match command {
            Command::Upload { .. } => (Route::Upload, Stage::Uploading),
            Command::Repair { .. } => (Route::FileList, Stage::ListingBeforeRepair),
            Command::List { .. } => (Route::FileList, Stage::Listing),
        };
        Self {
            state: AppState::with_page_size(page_size),
            runner,
            screen,
            stage,
            last_frame: Vec::new(),
        }
    }

    /// Drives the state machine until the command is done.
    pub fn run(mut self, command: Command) -> ExitCode {
        for msg in initial_msgs(command) {
            self.dispatch(msg);
        }
        self.render();

        loop {
            let msg = self.runner.next_msg(TICK).unwrap_or(Msg::Tick);
            let exit = self.step(msg);
            if let Some(code) = exit {
                self.render();
                return code;
            }
        }
    }

    fn step(&mut self, msg: Msg) -> Option<ExitCode> {
        let is_tick = msg == Msg::Tick;
        let listing_done = matches!(msg, Msg::ListingLoaded { .. } | Msg::ListingFailed { .. });
        let listing_ok = matches!(msg, Msg::ListingLoaded { .. });
        let repair_done = matches!(msg, Msg::RepairFinished(_));
        self.dispatch(msg);

        if is_tick && self.state.consume_dirty() {
            self.render();
        }

        match self.stage {
            Stage::Uploading => match self.state.upload_phase().clone() {
                UploadPhase::Finished(UploadOutcome::Completed) => {
                    self.switch_screen(Route::FileList);
                    self.stage = Stage::ListingAfterUpload;
                    None
                }
                UploadPhase::Finished(outcome) => {
                    noah_info!("upload ended: {:?}", outcome);
                    Some(ExitCode::FAILURE)
                }
                _ => None,
            },
            // The upload already succeeded; the listing is informational.
            Stage::ListingAfterUpload if listing_done => Some(ExitCode::SUCCESS),
            Stage::ListingBeforeRepair if listing_ok => {
                self.stage = Stage::Repairing;
                self.dispatch(Msg::RepairClicked);
                None
            }
            Stage::ListingBeforeRepair if listing_done => Some(ExitCode::FAILURE),
            Stage::Repairing if repair_done => {
                self.stage = Stage::ListingAfterRepair;
                None
            }
            Stage::ListingAfterRepair | Stage::Listing if listing_done => Some(if listing_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }),
            _ => None,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    fn switch_screen(&mut self, screen: Route) {
        self.render();
        self.screen = screen;
        self.last_frame.clear();
    }

    fn render(&mut self) {
        let frame = render::render(&self.state.view(), self.screen);
        if frame != self.last_frame {
            for line in &frame {
                println!("{line}");
            }
            self.last_frame = frame;
        }
    }
}

fn initial_msgs(command: Command) -> Vec<Msg> {
    match command {
        Command::Upload { files, tags, thumb } => vec![
            Msg::FilesSelected(files.into_iter().map(SelectedFile::from_path).collect()),
            Msg::TagsChanged(tags),
            Msg::ThumbSelected(thumb),
            Msg::SubmitClicked,
        ],
        Command::Repair { page, .. } | Command::List { page, .. } => {
            vec![Msg::PageRequested(page)]
        }
    }
}

/// Page size requested on the command line, else the configured one.
pub fn page_size(command: &Command, configured: u32) -> u32 {
    match command {
        Command::Repair { size: Some(size), .. } | Command::List { size: Some(size), .. } => {
            *size
        }
        _ => configured,
    }
}
