//! Detection tests: presence, ordering, window admission, and output order,
//! plus the greedy repository-keyed fallback.

mod helpers;

use helpers::{run_event, run_event_no_id, triplet, unrelated_event};
use huludscan_detect::event::WorkflowRunAction::{Completed, Created, Deleted};
use huludscan_detect::{detect, detect_by_repository};

const BASE: i64 = 1_700_000_000_000;

// ---------------------------------------------------------------------------
// Run-id keyed detection
// ---------------------------------------------------------------------------

#[test]
fn empty_input_yields_empty_output() {
    assert!(detect(&[], 60).is_empty());
}

#[test]
fn created_only_is_not_suspicious() {
    let events = vec![run_event(Created, "user1", "org/repo1", 12345, BASE)];
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn incomplete_sequence_is_not_suspicious() {
    let events = vec![
        run_event(Created, "user1", "org/repo1", 12345, BASE),
        run_event(Completed, "user1", "org/repo1", 12345, BASE + 5_000),
    ];
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn triplet_within_window_is_detected() {
    // created at T, completed at T+5s, deleted at T+10s, window 60s
    let events = triplet("malicious-user", "org/target-repo", 12345, BASE, 5_000, 10_000);

    let result = detect(&events, 60);
    assert_eq!(result.len(), 1);

    let activity = &result[0];
    assert_eq!(activity.actor, "malicious-user");
    assert_eq!(activity.repository, "org/target-repo");
    assert_eq!(activity.workflow_run_id, Some(12345));
    assert_eq!(activity.duration_seconds, 10);
    assert!(activity.context_events.is_empty());
}

#[test]
fn span_beyond_window_is_rejected() {
    // created at T, completed at T+30s, deleted at T+65s, window 60s
    let events = triplet("user1", "org/repo1", 12345, BASE, 30_000, 65_000);
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn span_exactly_at_window_boundary_is_admitted() {
    let events = triplet("user1", "org/repo1", 12345, BASE, 30_000, 60_000);
    let result = detect(&events, 60);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].duration_seconds, 60);
}

#[test]
fn out_of_order_stages_are_rejected() {
    // completed before created
    let events = vec![
        run_event(Completed, "user1", "org/repo1", 12345, BASE),
        run_event(Created, "user1", "org/repo1", 12345, BASE + 5_000),
        run_event(Deleted, "user1", "org/repo1", 12345, BASE + 10_000),
    ];
    assert!(detect(&events, 60).is_empty());

    // deleted before completed
    let events = vec![
        run_event(Created, "user1", "org/repo1", 12345, BASE),
        run_event(Deleted, "user1", "org/repo1", 12345, BASE + 5_000),
        run_event(Completed, "user1", "org/repo1", 12345, BASE + 10_000),
    ];
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn input_order_does_not_matter() {
    let mut events = triplet("user1", "org/repo1", 12345, BASE, 5_000, 10_000);
    events.reverse();
    assert_eq!(detect(&events, 60).len(), 1);
}

#[test]
fn unrelated_actions_do_not_suppress_detection() {
    let mut events = triplet("user1", "org/repo1", 12345, BASE, 5_000, 10_000);
    events.insert(1, unrelated_event("repo.access", "user1", BASE + 2_000));
    events.insert(3, unrelated_event("org.update_member", "user1", BASE + 7_000));

    let result = detect(&events, 60);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].workflow_run_id, Some(12345));
}

#[test]
fn events_without_run_id_are_ignored() {
    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", BASE),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 5_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 10_000),
    ];
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn different_run_ids_do_not_cross_match() {
    // created/completed for run 1, deleted for run 2: neither completes
    let events = vec![
        run_event(Created, "user1", "org/repo1", 1, BASE),
        run_event(Completed, "user1", "org/repo1", 1, BASE + 5_000),
        run_event(Deleted, "user1", "org/repo1", 2, BASE + 10_000),
    ];
    assert!(detect(&events, 60).is_empty());
}

#[test]
fn same_actor_two_runs_yield_two_records() {
    let mut events = triplet("user1", "org/repo1", 1, BASE, 5_000, 10_000);
    events.extend(triplet("user1", "org/repo1", 2, BASE + 120_000, 4_000, 9_000));

    let result = detect(&events, 60);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].workflow_run_id, Some(1));
    assert_eq!(result[1].workflow_run_id, Some(2));
}

#[test]
fn two_actors_yield_independent_records() {
    let mut events = triplet("alice", "org/repo1", 1, BASE, 5_000, 10_000);
    events.extend(triplet("bob", "org/repo2", 2, BASE + 1_000, 5_000, 10_000));

    let result = detect(&events, 60);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].actor, "alice");
    assert_eq!(result[1].actor, "bob");
}

#[test]
fn same_run_id_different_actors_are_independent_keys() {
    let mut events = triplet("alice", "org/repo1", 7, BASE, 5_000, 10_000);
    // bob only deleted run 7; his sequence is incomplete
    events.push(run_event(Deleted, "bob", "org/repo1", 7, BASE + 8_000));

    let result = detect(&events, 60);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].actor, "alice");
}

#[test]
fn custom_window_is_respected() {
    let events = triplet("user1", "org/repo1", 1, BASE, 5_000, 10_000);
    assert_eq!(detect(&events, 5).len(), 0);
    assert_eq!(detect(&events, 10).len(), 1);
}

#[test]
fn duplicate_stage_events_follow_last_write_wins() {
    // second created event overwrites the first; the survivor is out of order
    let events = vec![
        run_event(Created, "user1", "org/repo1", 1, BASE),
        run_event(Completed, "user1", "org/repo1", 1, BASE + 5_000),
        run_event(Created, "user1", "org/repo1", 1, BASE + 6_000),
        run_event(Deleted, "user1", "org/repo1", 1, BASE + 10_000),
    ];
    let result = detect(&events, 60);
    assert!(result.is_empty(), "surviving created is after completed");
}

#[test]
fn output_is_sorted_by_created_at() {
    let mut events = triplet("late", "org/r", 1, BASE + 300_000, 5_000, 10_000);
    events.extend(triplet("early", "org/r", 2, BASE, 5_000, 10_000));
    events.extend(triplet("middle", "org/r", 3, BASE + 100_000, 5_000, 10_000));

    let result = detect(&events, 60);
    let actors: Vec<&str> = result.iter().map(|a| a.actor.as_str()).collect();
    assert_eq!(actors, ["early", "middle", "late"]);
    assert!(result.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[test]
fn emitted_records_satisfy_ordering_invariant() {
    let mut events = triplet("a", "org/r", 1, BASE, 0, 0);
    events.extend(triplet("b", "org/r", 2, BASE + 50_000, 20_000, 59_500));

    for activity in detect(&events, 60) {
        assert!(activity.created_at <= activity.completed_at);
        assert!(activity.completed_at <= activity.deleted_at);
        assert!(activity.duration_seconds <= 60);
    }
}

#[test]
fn extreme_timestamps_are_dropped_not_fatal() {
    // timestamps at the integer limits parse as JSON but are outside any
    // representable instant; they must be discarded, never panic the scan
    let events = vec![
        run_event(Created, "user1", "org/repo1", 1, i64::MIN),
        run_event(Completed, "user1", "org/repo1", 1, 0),
        run_event(Deleted, "user1", "org/repo1", 1, i64::MAX),
    ];
    assert!(detect(&events, 60).is_empty());

    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", i64::MIN),
        run_event_no_id(Completed, "user1", "org/repo1", 0),
        run_event_no_id(Deleted, "user1", "org/repo1", i64::MAX),
    ];
    assert!(detect_by_repository(&events, 60).is_empty());
}

#[test]
fn extreme_timestamps_do_not_suppress_valid_sequences() {
    let mut events = triplet("user1", "org/repo1", 1, BASE, 5_000, 10_000);
    events.push(run_event(Deleted, "user1", "org/repo1", 2, i64::MAX));
    events.push(run_event(Created, "user2", "org/repo1", 3, i64::MIN));

    let result = detect(&events, 60);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].workflow_run_id, Some(1));
}

#[test]
fn huge_window_does_not_overflow() {
    let events = triplet("user1", "org/repo1", 1, BASE, 5_000, 10_000);
    assert_eq!(detect(&events, u64::MAX).len(), 1);
    assert_eq!(detect(&events[..], i64::MAX as u64).len(), 1);
}

#[test]
fn duration_rounds_to_nearest_second() {
    let events = triplet("user1", "org/repo1", 1, BASE, 1_000, 9_700);
    let result = detect(&events, 60);
    assert_eq!(result[0].duration_seconds, 10);

    let events = triplet("user1", "org/repo1", 1, BASE, 1_000, 9_400);
    let result = detect(&events, 60);
    assert_eq!(result[0].duration_seconds, 9);
}

// ---------------------------------------------------------------------------
// Repository-keyed fallback
// ---------------------------------------------------------------------------

#[test]
fn fallback_matches_without_run_ids() {
    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", BASE),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 5_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 10_000),
    ];

    let result = detect_by_repository(&events, 60);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].repository, "org/repo1");
    assert_eq!(result[0].workflow_run_id, None);
    assert_eq!(result[0].duration_seconds, 10);
}

#[test]
fn fallback_consumes_each_event_at_most_once() {
    // two created events but only one completed/deleted pair: one match
    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", BASE),
        run_event_no_id(Created, "user1", "org/repo1", BASE + 1_000),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 5_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 10_000),
    ];

    let result = detect_by_repository(&events, 60);
    assert_eq!(result.len(), 1);
}

#[test]
fn fallback_pairs_two_back_to_back_sequences() {
    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", BASE),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 5_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 10_000),
        run_event_no_id(Created, "user1", "org/repo1", BASE + 15_000),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 20_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 25_000),
    ];

    let result = detect_by_repository(&events, 60);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].duration_seconds, 10);
    assert_eq!(result[1].duration_seconds, 10);
}

#[test]
fn fallback_requires_completed_within_window_of_created() {
    let events = vec![
        run_event_no_id(Created, "user1", "org/repo1", BASE),
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 70_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 75_000),
    ];
    assert!(detect_by_repository(&events, 60).is_empty());
}

#[test]
fn fallback_events_without_repo_are_ignored() {
    let mut created = run_event_no_id(Created, "user1", "org/repo1", BASE);
    created.repo = None;
    let events = vec![
        created,
        run_event_no_id(Completed, "user1", "org/repo1", BASE + 5_000),
        run_event_no_id(Deleted, "user1", "org/repo1", BASE + 10_000),
    ];
    assert!(detect_by_repository(&events, 60).is_empty());
}
