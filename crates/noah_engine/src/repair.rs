use noah_logging::{noah_info, noah_trace, noah_warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::client::LibraryApi;
use crate::upload::ThumbAttachment;
use crate::{LibraryItem, LookupSkip, RepairSummary, SkipReason};

// ASCII digits only, and the run must end at the last digit.
static EXTERNAL_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(RJ[0-9]{6,8})(?:[^0-9]|$)").expect("external id regex should compile")
});

/// A listed file considered by the repair sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub file_hash: String,
    pub file_name: String,
    pub tags: Vec<String>,
}

impl From<&LibraryItem> for CandidateItem {
    fn from(item: &LibraryItem) -> Self {
        Self {
            file_hash: item.file_hash.clone(),
            file_name: item.file_name.clone(),
            tags: item.tags.clone(),
        }
    }
}

/// Replacement metadata for one file. The display name is carried through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaUpdate {
    pub file_hash: String,
    pub file_name: String,
    pub tags: Vec<String>,
    pub thumb: Option<ThumbAttachment>,
}

/// First external id (`RJ` + 6..=8 digits) in a display name. A longer
/// digit run is not an id at all.
pub fn external_id(name: &str) -> Option<&str> {
    EXTERNAL_ID_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|found| found.as_str())
}

/// The lookup code for an item, if it is eligible for repair: its name
/// carries an external id and it has no tags yet.
pub fn repair_code(item: &CandidateItem) -> Option<&str> {
    if !item.tags.is_empty() {
        return None;
    }
    external_id(&item.file_name)
}

/// Walks `items` in order and repairs every eligible one, strictly one at a
/// time. A failing item is recorded and skipped; the sweep always finishes.
pub async fn run_repair(api: &dyn LibraryApi, items: &[CandidateItem]) -> RepairSummary {
    let mut summary = RepairSummary::default();

    for item in items {
        let Some(code) = repair_code(item) else {
            noah_trace!("not a repair candidate: {}", item.file_name);
            continue;
        };
        summary.attempted += 1;

        match repair_item(api, item, code).await {
            Ok(()) => {
                noah_info!("repaired {} ({})", item.file_name, code);
                summary.repaired.push(item.file_hash.clone());
            }
            Err(reason) => {
                let skip = LookupSkip {
                    file_hash: item.file_hash.clone(),
                    code: code.to_string(),
                    reason,
                };
                noah_warn!("{}", skip);
                summary.skipped.push(skip);
            }
        }
    }

    noah_info!(
        "repair sweep done: {} attempted, {} repaired, {} skipped",
        summary.attempted,
        summary.repaired.len(),
        summary.skipped.len()
    );
    summary
}

async fn repair_item(
    api: &dyn LibraryApi,
    item: &CandidateItem,
    code: &str,
) -> Result<(), SkipReason> {
    let data = api
        .lookup(code)
        .await
        .map_err(SkipReason::Lookup)?
        .ok_or(SkipReason::NotFound)?;

    let thumb = if data.thumbnail.is_empty() {
        None
    } else {
        Some(
            api.fetch_image(&data.thumbnail)
                .await
                .map_err(SkipReason::Thumbnail)?,
        )
    };

    api.update_meta(MetaUpdate {
        file_hash: item.file_hash.clone(),
        file_name: item.file_name.clone(),
        tags: data.tags,
        thumb,
    })
    .await
    .map_err(SkipReason::Update)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, tags: &[&str]) -> CandidateItem {
        CandidateItem {
            file_hash: format!("hash-{name}"),
            file_name: name.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn finds_first_external_id() {
        assert_eq!(external_id("[RJ01169914] title.zip"), Some("RJ01169914"));
        assert_eq!(external_id("RJ123456_and_RJ654321.rar"), Some("RJ123456"));
        assert_eq!(external_id("rj123456.zip"), None);
        assert_eq!(external_id("RJ12345.zip"), None);
        assert_eq!(external_id("holiday.png"), None);
        assert_eq!(external_id("RJ01169914"), Some("RJ01169914"));
    }

    #[test]
    fn longer_digit_runs_are_not_truncated() {
        assert_eq!(external_id("RJ123456789.zip"), None);
        assert_eq!(external_id("RJ011699140 backup.zip"), None);
        assert_eq!(
            external_id("RJ011699140 then RJ654321.zip"),
            Some("RJ654321")
        );
        assert_eq!(repair_code(&item("RJ011699140 backup.zip", &[])), None);
    }

    #[test]
    fn only_ascii_digits_count() {
        assert_eq!(external_id("RJ\u{661}\u{662}\u{663}\u{664}\u{665}\u{666}.zip"), None);
        assert_eq!(external_id("RJ12345\u{666}.zip"), None);
    }

    #[test]
    fn eligibility_needs_id_and_empty_tags() {
        assert_eq!(repair_code(&item("RJ123456.zip", &[])), Some("RJ123456"));
        assert_eq!(repair_code(&item("RJ123456.zip", &["voice"])), None);
        assert_eq!(repair_code(&item("notes.txt", &[])), None);
    }
}
