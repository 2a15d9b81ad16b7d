use std::sync::Once;

use pagewatch_core::{
    update, Effect, InstanceRef, LoopKind, Msg, OrchestratorState, TargetId, TargetInfo,
    ToggleName, Toggles,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pagewatch_logging::initialize_for_tests);
}

fn target(id: &str, url: &str) -> TargetInfo {
    TargetInfo {
        id: TargetId::new(id),
        url: url.to_string(),
        title: String::new(),
    }
}

fn teams(id: &str) -> TargetInfo {
    target(id, "https://teams.microsoft.com/v2/")
}

fn instance(id: &str, epoch: u64) -> InstanceRef {
    InstanceRef {
        target: TargetId::new(id),
        epoch,
    }
}

fn install(id: &str, epoch: u64, kind: LoopKind) -> Effect {
    Effect::Install {
        instance: instance(id, epoch),
        kind,
    }
}

fn adopted_state(id: &str, toggles: Toggles) -> OrchestratorState {
    let (state, _) = update(OrchestratorState::new(), Msg::Started { toggles });
    let (state, _) = update(state, Msg::TargetsListed(vec![teams(id)]));
    state
}

#[test]
fn startup_without_toggles_scans() {
    init_logging();
    let (state, effects) = update(
        OrchestratorState::new(),
        Msg::Started {
            toggles: Toggles::default(),
        },
    );
    assert_eq!(effects, vec![Effect::ScanTargets]);
    assert!(state.adopted().is_none());
}

#[test]
fn startup_restores_enabled_toggles_before_scanning() {
    init_logging();
    let toggles = Toggles {
        keep_alive: true,
        status_alert: false,
    };
    let (state, effects) = update(OrchestratorState::new(), Msg::Started { toggles });

    assert_eq!(
        effects,
        vec![
            Effect::PersistToggle {
                toggle: ToggleName::KeepAlive,
                enabled: true,
            },
            Effect::ScanTargets,
        ]
    );
    assert!(state.view().keep_alive);
    assert!(!state.view().status_alert);
}

#[test]
fn scan_adopts_first_matching_target() {
    init_logging();
    let (state, _) = update(
        OrchestratorState::new(),
        Msg::Started {
            toggles: Toggles::default(),
        },
    );
    let (state, effects) = update(
        state,
        Msg::TargetsListed(vec![
            target("a", "https://example.com/"),
            teams("b"),
            teams("c"),
        ]),
    );

    assert_eq!(
        effects,
        vec![
            Effect::Attach(instance("b", 1)),
            install("b", 1, LoopKind::Monitor),
        ]
    );
    assert_eq!(state.view().monitoring, Some(TargetId::new("b")));
}

#[test]
fn scan_without_match_is_silent() {
    init_logging();
    let (state, effects) = update(
        OrchestratorState::new(),
        Msg::TargetsListed(vec![target("a", "https://example.com/")]),
    );
    assert!(effects.is_empty());
    assert!(state.adopted().is_none());
}

#[test]
fn adoption_installs_enabled_loops() {
    init_logging();
    let toggles = Toggles {
        keep_alive: true,
        status_alert: true,
    };
    let (state, _) = update(OrchestratorState::new(), Msg::Started { toggles });
    let (_state, effects) = update(state, Msg::TargetsListed(vec![teams("t")]));

    assert_eq!(
        effects,
        vec![
            Effect::Attach(instance("t", 1)),
            install("t", 1, LoopKind::Monitor),
            install("t", 1, LoopKind::KeepAlive),
            install("t", 1, LoopKind::Status),
        ]
    );
}

#[test]
fn late_scan_result_is_ignored_after_adoption() {
    init_logging();
    let state = adopted_state("t", Toggles::default());
    let (state, effects) = update(state, Msg::TargetsListed(vec![teams("other")]));
    assert!(effects.is_empty());
    assert_eq!(state.adopted(), Some(&instance("t", 1)));
}

#[test]
fn activation_probes_adopted_or_scans() {
    init_logging();
    let (_, effects) = update(OrchestratorState::new(), Msg::Activated);
    assert_eq!(effects, vec![Effect::ScanTargets]);

    let state = adopted_state("t", Toggles::default());
    let (_, effects) = update(state, Msg::Activated);
    assert_eq!(effects, vec![Effect::ProbeLiveness(instance("t", 1))]);
}

#[test]
fn failed_liveness_releases_and_rescans() {
    init_logging();
    let state = adopted_state("t", Toggles::default());

    let (state, effects) = update(
        state,
        Msg::LivenessChecked {
            instance: instance("t", 1),
            alive: true,
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::LivenessChecked {
            instance: instance("t", 1),
            alive: false,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Teardown(instance("t", 1)), Effect::ScanTargets]
    );
    assert!(state.adopted().is_none());
}

#[test]
fn stale_liveness_result_is_ignored() {
    init_logging();
    let state = adopted_state("t", Toggles::default());
    let (state, effects) = update(
        state,
        Msg::LivenessChecked {
            instance: instance("t", 99),
            alive: false,
        },
    );
    assert!(effects.is_empty());
    assert!(state.adopted().is_some());
}

#[test]
fn navigation_to_new_tab_moves_adoption() {
    init_logging();
    let toggles = Toggles {
        keep_alive: false,
        status_alert: true,
    };
    let state = adopted_state("old", toggles);

    let (state, effects) = update(state, Msg::NavigationCompleted(teams("new")));
    assert_eq!(
        effects,
        vec![
            Effect::Teardown(instance("old", 1)),
            Effect::Attach(instance("new", 2)),
            install("new", 2, LoopKind::Monitor),
            install("new", 2, LoopKind::Status),
        ]
    );
    assert_eq!(state.view().monitoring, Some(TargetId::new("new")));
}

#[test]
fn navigation_on_adopted_tab_reinstalls_into_same_instance() {
    init_logging();
    let state = adopted_state("t", Toggles::default());
    let (state, effects) = update(state, Msg::NavigationCompleted(teams("t")));
    assert_eq!(effects, vec![install("t", 1, LoopKind::Monitor)]);
    assert_eq!(state.adopted(), Some(&instance("t", 1)));
}

#[test]
fn navigation_away_releases_instance() {
    init_logging();
    let state = adopted_state("t", Toggles::default());

    let (state, effects) = update(
        state,
        Msg::NavigationCompleted(target("other", "https://example.com/")),
    );
    assert!(effects.is_empty());
    assert!(state.adopted().is_some());

    let (state, effects) = update(
        state,
        Msg::NavigationCompleted(target("t", "https://example.com/")),
    );
    assert_eq!(
        effects,
        vec![Effect::Teardown(instance("t", 1)), Effect::ScanTargets]
    );
    assert!(state.adopted().is_none());
}

#[test]
fn closing_adopted_target_releases_it() {
    init_logging();
    let state = adopted_state("t", Toggles::default());
    let (state, effects) = update(state, Msg::TargetClosed(TargetId::new("x")));
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::TargetClosed(TargetId::new("t")));
    assert_eq!(
        effects,
        vec![Effect::Teardown(instance("t", 1)), Effect::ScanTargets]
    );
    assert!(state.adopted().is_none());
}

#[test]
fn toggle_without_instance_only_persists() {
    init_logging();
    let (state, effects) = update(
        OrchestratorState::new(),
        Msg::ToggleRequested {
            toggle: ToggleName::StatusAlert,
            enabled: true,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::PersistToggle {
            toggle: ToggleName::StatusAlert,
            enabled: true,
        }]
    );
    assert!(state.toggles().status_alert);
}

#[test]
fn toggle_off_then_on_stops_and_reinstalls() {
    init_logging();
    let state = adopted_state("t", Toggles::default());

    let (state, effects) = update(
        state,
        Msg::ToggleRequested {
            toggle: ToggleName::KeepAlive,
            enabled: true,
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::PersistToggle {
                toggle: ToggleName::KeepAlive,
                enabled: true,
            },
            install("t", 1, LoopKind::KeepAlive),
        ]
    );

    let (state, effects) = update(
        state,
        Msg::ToggleRequested {
            toggle: ToggleName::KeepAlive,
            enabled: false,
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::PersistToggle {
                toggle: ToggleName::KeepAlive,
                enabled: false,
            },
            Effect::Stop {
                instance: instance("t", 1),
                kind: LoopKind::KeepAlive,
            },
        ]
    );
    assert!(!state.view().keep_alive);

    let (_state, effects) = update(
        state,
        Msg::ToggleRequested {
            toggle: ToggleName::KeepAlive,
            enabled: true,
        },
    );
    assert_eq!(effects.last(), Some(&install("t", 1, LoopKind::KeepAlive)));
}

#[test]
fn shutdown_tears_down_adopted_instance() {
    init_logging();
    let state = adopted_state("t", Toggles::default());
    let (state, effects) = update(state, Msg::Shutdown);
    assert_eq!(effects, vec![Effect::Teardown(instance("t", 1))]);

    let (_state, effects) = update(state, Msg::Shutdown);
    assert!(effects.is_empty());
}
