use crate::{ListingRow, RepairPhase, Route, UploadPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub upload: UploadPhase,
    pub upload_id: Option<String>,
    /// Tags and thumbnail only apply to single-file batches.
    pub metadata_enabled: bool,
    pub files: Vec<FileRowView>,
    pub status: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub listing: Vec<ListingRow>,
    pub listing_error: Option<String>,
    pub repair: RepairPhase,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub name: String,
    pub percent: u8,
    pub failed: bool,
}
