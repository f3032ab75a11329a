use std::path::PathBuf;

use crate::view_model::{AppViewModel, FileRowView};
use crate::{ListingRow, ProgressRecord, RepairTally, Route, SelectedFile, UploadOutcome};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    RequestingSession,
    Uploading,
    /// Transfers settled; waiting on the status channel.
    AwaitingOutcome,
    Finished(UploadOutcome),
}

impl UploadPhase {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            UploadPhase::RequestingSession | UploadPhase::Uploading | UploadPhase::AwaitingOutcome
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairPhase {
    #[default]
    Idle,
    Running,
    Done(RepairTally),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    route: Route,
    files: Vec<SelectedFile>,
    tags_input: String,
    thumb: Option<PathBuf>,
    upload: UploadPhase,
    upload_id: Option<String>,
    progress: ProgressRecord,
    failed_files: Vec<String>,
    status: Option<String>,
    page: u32,
    page_size: u32,
    listing: Vec<ListingRow>,
    total: u64,
    listing_error: Option<String>,
    repair: RepairPhase,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            route: Route::default(),
            files: Vec::new(),
            tags_input: String::new(),
            thumb: None,
            upload: UploadPhase::default(),
            upload_id: None,
            progress: ProgressRecord::default(),
            failed_files: Vec::new(),
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            listing: Vec::new(),
            total: 0,
            listing_error: None,
            repair: RepairPhase::default(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let files = self
            .files
            .iter()
            .map(|file| FileRowView {
                name: file.name.clone(),
                percent: self.progress.get(&file.name),
                failed: self.failed_files.contains(&file.name),
            })
            .collect();
        let page_size = u64::from(self.page_size.max(1));

        AppViewModel {
            route: self.route,
            upload: self.upload.clone(),
            upload_id: self.upload_id.clone(),
            metadata_enabled: self.files.len() <= 1,
            files,
            status: self.status.clone(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total.div_ceil(page_size),
            listing: self.listing.clone(),
            listing_error: self.listing_error.clone(),
            repair: self.repair,
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn upload_phase(&self) -> &UploadPhase {
        &self.upload
    }

    pub fn repair_phase(&self) -> RepairPhase {
        self.repair
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_files(&mut self, files: Vec<SelectedFile>) {
        self.files = files;
        self.failed_files.clear();
        self.progress.clear();
        self.status = None;
        self.upload = UploadPhase::Idle;
        self.mark_dirty();
    }

    pub(crate) fn set_tags_input(&mut self, tags: String) {
        self.tags_input = tags;
        self.mark_dirty();
    }

    pub(crate) fn set_thumb(&mut self, thumb: Option<PathBuf>) {
        self.thumb = thumb;
        self.mark_dirty();
    }

    pub(crate) fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub(crate) fn tags_input(&self) -> &str {
        &self.tags_input
    }

    pub(crate) fn thumb(&self) -> Option<&PathBuf> {
        self.thumb.as_ref()
    }

    pub(crate) fn begin_upload(&mut self) {
        self.upload = UploadPhase::RequestingSession;
        self.upload_id = None;
        self.progress.clear();
        self.failed_files.clear();
        self.status = None;
        self.mark_dirty();
    }

    pub(crate) fn session_started(&mut self, upload_id: String) {
        self.upload = UploadPhase::Uploading;
        self.upload_id = Some(upload_id);
        self.mark_dirty();
    }

    pub(crate) fn set_progress(&mut self, file_name: &str, percent: u8) {
        self.progress.set(file_name, percent);
        self.mark_dirty();
    }

    pub(crate) fn record_failed_file(&mut self, file_name: String) {
        if !self.failed_files.contains(&file_name) {
            self.failed_files.push(file_name);
        }
        self.mark_dirty();
    }

    pub(crate) fn await_outcome(&mut self) {
        self.upload = UploadPhase::AwaitingOutcome;
        self.mark_dirty();
    }

    pub(crate) fn set_status(&mut self, status: String) {
        self.status = Some(status);
        self.mark_dirty();
    }

    /// Terminal transition of a batch. The progress record is cleared here
    /// and nowhere else while a batch is live.
    pub(crate) fn finish_upload(&mut self, outcome: UploadOutcome) {
        self.progress.clear();
        self.upload = UploadPhase::Finished(outcome);
        self.mark_dirty();
    }

    pub(crate) fn navigate(&mut self, route: Route) {
        self.route = route;
        self.mark_dirty();
    }

    pub(crate) fn page(&self) -> u32 {
        self.page
    }

    pub(crate) fn page_size(&self) -> u32 {
        self.page_size
    }

    pub(crate) fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.mark_dirty();
    }

    pub(crate) fn set_listing(&mut self, items: Vec<ListingRow>, total: u64) {
        self.listing = items;
        self.total = total;
        self.listing_error = None;
        self.mark_dirty();
    }

    pub(crate) fn set_listing_error(&mut self, message: String) {
        self.listing_error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn listing(&self) -> &[ListingRow] {
        &self.listing
    }

    pub(crate) fn set_repair(&mut self, phase: RepairPhase) {
        self.repair = phase;
        self.mark_dirty();
    }
}
