use std::time::Duration;

use pagewatch_engine::{
    resolve_safe_target, ActionKind, ActionStep, ActivityPlanner, PageSnapshot, SafeTarget,
    SyntheticInput, KEY_RELEASE_DELAY, SCROLL_REVERT_DELAY,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn planner(seed: u64) -> ActivityPlanner<StdRng> {
    ActivityPlanner::new(StdRng::seed_from_u64(seed))
}

fn snapshot(body: &str) -> PageSnapshot {
    PageSnapshot::from_html(format!("<html><body>{body}</body></html>"))
}

#[test]
fn delays_stay_within_the_rearm_window() {
    let mut planner = planner(7);
    for _ in 0..500 {
        let delay = planner.next_delay();
        assert!(delay >= Duration::from_millis(10_000), "{delay:?}");
        assert!(delay < Duration::from_millis(30_000), "{delay:?}");
    }
}

#[test]
fn every_action_kind_gets_picked() {
    let mut planner = planner(11);
    let picked: Vec<ActionKind> = (0..500).map(|_| planner.next_action()).collect();
    for kind in ActionKind::ALL {
        assert!(picked.contains(&kind), "{kind:?} never picked");
    }
}

#[test]
fn empty_delay_range_collapses_to_its_start() {
    let mut planner = ActivityPlanner::with_delay_range(StdRng::seed_from_u64(1), 50..50);
    assert_eq!(planner.next_delay(), Duration::from_millis(50));
}

#[test]
fn scroll_reverts_after_a_short_pause() {
    let steps = planner(1).plan(ActionKind::Scroll, None);
    assert_eq!(
        steps,
        vec![
            ActionStep {
                delay: Duration::ZERO,
                input: SyntheticInput::ScrollBy { dy: 1 },
            },
            ActionStep {
                delay: SCROLL_REVERT_DELAY,
                input: SyntheticInput::ScrollBy { dy: -1 },
            },
        ]
    );
}

#[test]
fn keypress_releases_shift() {
    let steps = planner(1).plan(ActionKind::KeyPress, None);
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps[0].input,
        SyntheticInput::KeyDown {
            key: "Shift",
            code: "ShiftLeft"
        }
    );
    assert_eq!(steps[1].delay, KEY_RELEASE_DELAY);
    assert!(matches!(steps[1].input, SyntheticInput::KeyUp { key: "Shift", .. }));
}

#[test]
fn mouse_moves_stay_near_the_origin() {
    let mut planner = planner(3);
    for _ in 0..100 {
        match planner.plan(ActionKind::MouseMove, None).as_slice() {
            [ActionStep {
                input: SyntheticInput::MouseMove { x, y },
                ..
            }] => assert!(*x < 10 && *y < 10),
            other => panic!("unexpected plan {other:?}"),
        }
    }
}

#[test]
fn safe_targets_prefer_app_bar_then_header() {
    let both = snapshot(r#"<header></header><div data-tid="app-bar-main"></div>"#);
    let header_only = snapshot("<header>Teams</header>");
    let neither = snapshot("<main></main>");

    assert_eq!(resolve_safe_target(&both, false), Some(SafeTarget::AppBar));
    assert_eq!(resolve_safe_target(&header_only, false), Some(SafeTarget::Header));
    assert_eq!(resolve_safe_target(&neither, false), None);
    assert_eq!(resolve_safe_target(&neither, true), Some(SafeTarget::Body));
}

#[test]
fn hover_falls_back_to_body_but_click_is_skipped() {
    let mut planner = planner(5);
    let bare = snapshot("<main></main>");

    assert_eq!(
        planner.plan(ActionKind::Hover, Some(&bare)),
        vec![ActionStep {
            delay: Duration::ZERO,
            input: SyntheticInput::MouseEnter {
                target: SafeTarget::Body
            },
        }]
    );
    assert!(planner.plan(ActionKind::Click, Some(&bare)).is_empty());
    assert!(planner.plan(ActionKind::Click, None).is_empty());
}

#[test]
fn click_lands_inside_the_header() {
    let page = snapshot("<header>Teams</header>");
    assert_eq!(
        planner(9).plan(ActionKind::Click, Some(&page)),
        vec![ActionStep {
            delay: Duration::ZERO,
            input: SyntheticInput::Click {
                target: SafeTarget::Header,
                offset: 5
            },
        }]
    );
}
