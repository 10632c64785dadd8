use super::*;

#[test]
fn first_resolution_wins_and_later_ones_are_conflicts() {
    let signal = OutcomeSignal::new();
    assert_eq!(signal.state(), SignalState::Pending);
    assert_eq!(signal.outcome(), None);

    assert!(signal.resolve(NavigationOutcome::Blocked, 3));
    assert!(!signal.resolve(NavigationOutcome::Succeeded, 4));
    assert!(!signal.resolve(NavigationOutcome::Blocked, 5));

    assert_eq!(
        signal.state(),
        SignalState::Resolved {
            outcome: NavigationOutcome::Blocked,
            at_ms: 3,
        }
    );
    assert_eq!(
        signal.conflicts(),
        vec![NavigationOutcome::Succeeded, NavigationOutcome::Blocked]
    );
}

#[test]
fn clones_share_one_slot() {
    let signal = OutcomeSignal::new();
    let listener_side = signal.clone();
    listener_side.resolve(NavigationOutcome::Succeeded, 0);
    assert!(signal.is_resolved());
    assert_eq!(signal.outcome(), Some(NavigationOutcome::Succeeded));
}

#[test]
fn outcome_event_names_map_both_ways() {
    for outcome in [NavigationOutcome::Succeeded, NavigationOutcome::Blocked] {
        assert_eq!(NavigationOutcome::from_event_type(outcome.event_type()), Some(outcome));
    }
    assert_eq!(NavigationOutcome::from_event_type("click"), None);
}
