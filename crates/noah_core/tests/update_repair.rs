use noah_core::{update, AppState, Effect, ListingRow, Msg, Notice, RepairPhase, RepairTally};
use pretty_assertions::assert_eq;

fn row(hash: &str, name: &str, tags: &[&str]) -> ListingRow {
    ListingRow {
        file_hash: hash.to_string(),
        file_name: name.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    }
}

fn listed(rows: Vec<ListingRow>, total: u64) -> AppState {
    update(
        AppState::new(),
        Msg::ListingLoaded {
            page: 1,
            items: rows,
            total,
        },
    )
    .0
}

#[test]
fn repair_hands_the_current_page_to_the_engine() {
    noah_logging::initialize_for_tests();
    let rows = vec![
        row("a", "[RJ111111] A.zip", &[]),
        row("b", "[RJ222222] B.zip", &["voice"]),
        row("c", "holiday.mp4", &[]),
    ];
    let state = listed(rows.clone(), 3);

    let (state, effects) = update(state, Msg::RepairClicked);

    assert_eq!(effects, vec![Effect::StartRepair { items: rows }]);
    assert_eq!(state.repair_phase(), RepairPhase::Running);

    let (_, effects) = update(state, Msg::RepairClicked);
    assert!(effects.is_empty(), "a running sweep is not restarted");
}

#[test]
fn finished_sweep_notifies_once_and_refreshes_the_listing() {
    noah_logging::initialize_for_tests();
    let state = listed(vec![row("a", "RJ111111.zip", &[])], 1);
    let (state, _) = update(state, Msg::RepairClicked);
    let tally = RepairTally {
        attempted: 1,
        repaired: 0,
        skipped: 1,
    };

    let (state, effects) = update(state, Msg::RepairFinished(tally));

    assert_eq!(
        effects,
        vec![
            Effect::Alert(Notice::RepairDone(tally)),
            Effect::RefreshList { page: 1, size: 10 },
        ]
    );
    assert_eq!(state.repair_phase(), RepairPhase::Done(tally));

    let (_, effects) = update(state, Msg::RepairFinished(tally));
    assert!(effects.is_empty());
}

#[test]
fn paging_requests_the_page_and_drops_stale_results() {
    noah_logging::initialize_for_tests();
    let state = AppState::with_page_size(5);

    let (state, effects) = update(state, Msg::PageRequested(3));
    assert_eq!(effects, vec![Effect::RefreshList { page: 3, size: 5 }]);

    let (state, _) = update(
        state,
        Msg::ListingLoaded {
            page: 2,
            items: vec![row("old", "old.zip", &[])],
            total: 40,
        },
    );
    assert!(state.view().listing.is_empty());

    let (state, _) = update(
        state,
        Msg::ListingLoaded {
            page: 3,
            items: vec![row("new", "new.zip", &[])],
            total: 11,
        },
    );
    let view = state.view();
    assert_eq!(view.listing, vec![row("new", "new.zip", &[])]);
    assert_eq!(view.total_pages, 3);
}

#[test]
fn page_zero_is_clamped_to_the_first_page() {
    let (_, effects) = update(AppState::new(), Msg::PageRequested(0));
    assert_eq!(effects, vec![Effect::RefreshList { page: 1, size: 10 }]);
}

#[test]
fn listing_failure_keeps_the_previous_rows() {
    noah_logging::initialize_for_tests();
    let state = listed(vec![row("a", "a.zip", &[])], 1);

    let (state, effects) = update(
        state,
        Msg::ListingFailed {
            page: 1,
            message: "http status 500".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert(Notice::ListingFailed(
            "http status 500".to_string()
        ))]
    );
    let view = state.view();
    assert_eq!(view.listing.len(), 1);
    assert_eq!(view.listing_error.as_deref(), Some("http status 500"));
}

#[test]
fn notices_read_like_messages() {
    assert_eq!(
        Notice::RepairDone(RepairTally {
            attempted: 3,
            repaired: 2,
            skipped: 1,
        })
        .to_string(),
        "Metadata repair done: 2 of 3 repaired, 1 skipped"
    );
    assert_eq!(
        Notice::Duplicate.to_string(),
        "This file is already in the library"
    );
}
