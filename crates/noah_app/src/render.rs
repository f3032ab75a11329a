use noah_core::{AppViewModel, FileRowView, Notice, RepairPhase, Route, UploadOutcome, UploadPhase};

const BAR_WIDTH: usize = 20;

/// Renders the view model for `screen` as terminal lines.
pub fn render(view: &AppViewModel, screen: Route) -> Vec<String> {
    match screen {
        Route::Upload => render_upload(view),
        Route::FileList => render_listing(view),
    }
}

pub fn print_notice(notice: &Notice) {
    println!("! {notice}");
}

fn render_upload(view: &AppViewModel) -> Vec<String> {
    let phase = match &view.upload {
        UploadPhase::Idle => "idle",
        UploadPhase::RequestingSession => "requesting upload id",
        UploadPhase::Uploading => "uploading",
        UploadPhase::AwaitingOutcome => "waiting for the server",
        UploadPhase::Finished(outcome) => outcome_label(outcome),
    };

    let mut lines = Vec::with_capacity(view.files.len() + 3);
    lines.push(match &view.upload_id {
        Some(id) => format!("Batch {id}: {phase}"),
        None => format!("Batch: {phase}"),
    });
    lines.extend(view.files.iter().map(file_row));
    if !view.metadata_enabled {
        lines.push("(tags and thumbnail are ignored for multi-file batches)".to_string());
    }
    if let Some(status) = &view.status {
        lines.push(format!("Status: {status}"));
    }
    lines
}

fn outcome_label(outcome: &UploadOutcome) -> &'static str {
    match outcome {
        UploadOutcome::Completed => "completed",
        UploadOutcome::Failed => "failed",
        UploadOutcome::Duplicate => "duplicate",
        UploadOutcome::ChannelError(_) => "status connection lost",
        UploadOutcome::SessionFailed(_) => "not started",
        UploadOutcome::NothingAccepted => "nothing accepted",
    }
}

fn file_row(row: &FileRowView) -> String {
    let filled = usize::from(row.percent.min(100)) * BAR_WIDTH / 100;
    let mut line = format!(
        "  {} [{}{}] {:>3}%",
        row.name,
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        row.percent
    );
    if row.failed {
        line.push_str(" failed");
    }
    line
}

fn render_listing(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!(
        "Page {}/{} ({} file(s))",
        view.page,
        view.total_pages.max(1),
        view.total
    )];
    for row in &view.listing {
        let tags = if row.tags.is_empty() {
            "-".to_string()
        } else {
            row.tags.join(", ")
        };
        lines.push(format!("  {}  {}  [{}]", short_hash(&row.file_hash), row.file_name, tags));
    }
    if let Some(error) = &view.listing_error {
        lines.push(format!("Listing error: {error}"));
    }
    match view.repair {
        RepairPhase::Idle => {}
        RepairPhase::Running => lines.push("Repairing metadata...".to_string()),
        RepairPhase::Done(tally) => lines.push(format!(
            "Repair: {} attempted, {} repaired, {} skipped",
            tally.attempted, tally.repaired, tally.skipped
        )),
    }
    lines
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
